//! Client conversations against a scripted server.
//!
//! The mock stream replays canned server bytes and records everything the
//! client writes, so each test can check both the parsed results and the
//! exact commands that went over the wire.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_test::io::Builder;

use mailtap_imap::{
    Client, Error, FetchAttribute, FetchItem, FetchItems, SearchCriteria, SelectOutcome,
    SequenceSet,
};

/// Replays `script` and captures writes into a shared buffer.
struct MockStream {
    script: Cursor<Vec<u8>>,
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    fn new(script: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            script: Cursor::new(script.to_vec()),
            sent: Arc::clone(&sent),
        };
        (stream, sent)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let pos = usize::try_from(self.script.position()).unwrap();
        let data = self.script.get_ref();
        if pos < data.len() {
            let n = (data.len() - pos).min(buf.remaining());
            buf.put_slice(&data[pos..pos + n]);
            self.script.set_position((pos + n) as u64);
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn sent_lines(sent: &Arc<Mutex<Vec<u8>>>) -> Vec<String> {
    String::from_utf8(sent.lock().unwrap().clone())
        .unwrap()
        .split_terminator("\r\n")
        .map(str::to_string)
        .collect()
}

const GREETING: &[u8] = b"* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN] ready\r\n";

#[tokio::test]
async fn test_login_select_search_fetch_logout() {
    let script = [
        GREETING,
        b"A0000 OK [CAPABILITY IMAP4rev1 IDLE] logged in\r\n",
        b"* FLAGS (\\Answered \\Seen)\r\n",
        b"* 3 EXISTS\r\n",
        b"* 0 RECENT\r\n",
        b"* OK [UIDVALIDITY 42] ok\r\n",
        b"A0001 OK [READ-WRITE] SELECT completed\r\n",
        b"* SEARCH 1 3\r\n",
        b"A0002 OK SEARCH completed\r\n",
        b"* 3 FETCH (FLAGS (\\Seen) BODY[HEADER.FIELDS (SUBJECT)] {15}\r\nSubject: hi\r\n\r\n)\r\n",
        b"A0003 OK FETCH completed\r\n",
        b"* BYE bye\r\n",
        b"A0004 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (stream, sent) = MockStream::new(&script);

    let client = Client::from_stream(stream).await.unwrap();
    let client = client.login("me@example.com", "secret").await.unwrap();
    assert!(client.has_capability(&mailtap_imap::Capability::Unknown("IDLE".to_string())));

    let SelectOutcome::Selected(mut client, status) = client.select("INBOX").await.unwrap() else {
        panic!("select should succeed");
    };
    assert_eq!(status.exists, 3);
    assert_eq!(status.uid_validity.map(|v| v.get()), Some(42));

    let ids = client.search(&SearchCriteria::Unseen).await.unwrap();
    assert_eq!(ids.iter().map(|s| s.get()).collect::<Vec<_>>(), vec![1, 3]);

    let fetched = client
        .fetch(
            &SequenceSet::single(3).unwrap(),
            FetchItems::Items(vec![
                FetchAttribute::Flags,
                FetchAttribute::header_fields(&["SUBJECT"]),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(fetched.len(), 1);
    let (seq, items) = &fetched[0];
    assert_eq!(seq.get(), 3);
    assert!(
        items
            .iter()
            .any(|i| i.body_data() == Some(&b"Subject: hi\r\n\r\n"[..]))
    );

    client.logout().await.unwrap();

    assert_eq!(
        sent_lines(&sent),
        vec![
            "A0000 LOGIN me@example.com secret",
            "A0001 SELECT INBOX",
            "A0002 SEARCH UNSEEN",
            "A0003 FETCH 3 (FLAGS BODY.PEEK[HEADER.FIELDS (SUBJECT)])",
            "A0004 LOGOUT",
        ]
    );
}

#[tokio::test]
async fn test_rejected_select_can_still_log_out() {
    let script = [
        GREETING,
        b"A0000 OK logged in\r\n",
        b"A0001 NO [NONEXISTENT] Mailbox doesn't exist\r\n",
        b"A0002 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (stream, sent) = MockStream::new(&script);

    let client = Client::from_stream(stream).await.unwrap();
    let client = client.login("u", "p").await.unwrap();

    match client.select("Nope").await.unwrap() {
        SelectOutcome::Rejected(client, reason) => {
            assert_eq!(reason, "Mailbox doesn't exist");
            client.logout().await.unwrap();
        }
        SelectOutcome::Selected(..) => panic!("select should be rejected"),
    }

    assert_eq!(sent_lines(&sent).last().unwrap(), "A0002 LOGOUT");
}

#[tokio::test]
async fn test_reselect_from_selected_state() {
    let script = [
        GREETING,
        b"A0000 OK logged in\r\n",
        b"* 1 EXISTS\r\n",
        b"A0001 OK selected\r\n",
        b"* 5 EXISTS\r\n",
        b"A0002 OK [READ-ONLY] selected\r\n",
    ]
    .concat();
    let (stream, sent) = MockStream::new(&script);

    let client = Client::from_stream(stream).await.unwrap();
    let client = client.login("u", "p").await.unwrap();
    let SelectOutcome::Selected(client, _) = client.select("INBOX").await.unwrap() else {
        panic!("first select should succeed");
    };
    let SelectOutcome::Selected(_client, status) = client.select("Archive").await.unwrap() else {
        panic!("second select should succeed");
    };

    assert_eq!(status.exists, 5);
    assert!(status.read_only);
    assert_eq!(sent_lines(&sent)[2], "A0002 SELECT Archive");
}

#[tokio::test]
async fn test_list_quoted_names() {
    let script = [
        GREETING,
        b"A0000 OK logged in\r\n",
        b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n",
        b"* LIST (\\Noselect \\HasChildren) \"/\" \"[Gmail]\"\r\n",
        b"A0001 OK LIST completed\r\n",
    ]
    .concat();
    let (stream, sent) = MockStream::new(&script);

    let client = Client::from_stream(stream).await.unwrap();
    let mut client = client.login("u", "p").await.unwrap();
    let folders = client.list("", "*").await.unwrap();

    let rendered: Vec<String> = folders.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "(\\HasNoChildren) \"/\" INBOX",
            "(\\Noselect \\HasChildren) \"/\" \"[Gmail]\"",
        ]
    );
    assert_eq!(sent_lines(&sent)[1], "A0001 LIST \"\" *");
}

#[tokio::test]
async fn test_login_rejected() {
    let script = [GREETING, b"A0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n"].concat();
    let (stream, _sent) = MockStream::new(&script);

    let client = Client::from_stream(stream).await.unwrap();
    let err = client.login("u", "wrong").await.unwrap_err();
    assert!(matches!(err, Error::No(ref text) if text == "Invalid credentials"));
    assert!(err.is_rejection());
}

#[tokio::test]
async fn test_login_disabled_sends_nothing() {
    let (stream, sent) = MockStream::new(b"* OK [CAPABILITY IMAP4rev1 LOGINDISABLED] hi\r\n");

    let client = Client::from_stream(stream).await.unwrap();
    let err = client.login("u", "p").await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bye_greeting() {
    let (stream, _sent) = MockStream::new(b"* BYE too many connections\r\n");
    let err = Client::from_stream(stream).await.unwrap_err();
    assert!(matches!(err, Error::Bye(ref text) if text == "too many connections"));
}

#[tokio::test]
async fn test_logout_tolerates_dropped_connection() {
    let script = [GREETING, b"A0000 OK logged in\r\n", b"* BYE closing\r\n"].concat();
    let (stream, _sent) = MockStream::new(&script);

    let client = Client::from_stream(stream).await.unwrap();
    let client = client.login("u", "p").await.unwrap();
    client.logout().await.unwrap();
}

#[tokio::test]
async fn test_fetch_skips_unparseable_lines() {
    let script = [
        GREETING,
        b"A0000 OK logged in\r\n",
        b"A0001 OK selected\r\n",
        b"* XWEIRD something odd\r\n",
        b"* 2 FETCH (RFC822 {3}\r\nabc)\r\n",
        b"A0002 OK done\r\n",
    ]
    .concat();
    let (stream, _sent) = MockStream::new(&script);

    let client = Client::from_stream(stream).await.unwrap();
    let client = client.login("u", "p").await.unwrap();
    let SelectOutcome::Selected(mut client, _) = client.select("INBOX").await.unwrap() else {
        panic!("select should succeed");
    };

    let fetched = client
        .fetch(&SequenceSet::single(2).unwrap(), FetchAttribute::Rfc822.into())
        .await
        .unwrap();
    assert_eq!(fetched.len(), 1);
    assert!(matches!(
        &fetched[0].1[0],
        FetchItem::Body { data: Some(d), .. } if d == b"abc"
    ));
}

#[tokio::test]
async fn test_fetch_bad_is_error() {
    let script = [
        GREETING,
        b"A0000 OK logged in\r\n",
        b"A0001 OK selected\r\n",
        b"A0002 BAD Invalid messageset\r\n",
    ]
    .concat();
    let (stream, _sent) = MockStream::new(&script);

    let client = Client::from_stream(stream).await.unwrap();
    let client = client.login("u", "p").await.unwrap();
    let SelectOutcome::Selected(mut client, _) = client.select("INBOX").await.unwrap() else {
        panic!("select should succeed");
    };

    let err = client
        .fetch(&SequenceSet::single(99).unwrap(), FetchItems::Fast)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Bad(_)));
}

#[tokio::test]
async fn test_literal_argument_waits_for_continuation() {
    let stream = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN me@example.com secret\r\n")
        .read(b"A0000 OK logged in\r\n")
        .write(b"A0001 SELECT INBOX\r\n")
        .read(b"* 2 EXISTS\r\nA0001 OK SELECT completed\r\n")
        .write(b"A0002 SEARCH SUBJECT {19}\r\n")
        .read(b"+ go ahead\r\n")
        .write(b"x\"\r\nA9 DELETE INBOX\r\n")
        .read(b"* SEARCH 2\r\nA0002 OK SEARCH completed\r\n")
        .build();

    let client = Client::from_stream(stream).await.unwrap();
    let client = client.login("me@example.com", "secret").await.unwrap();
    let SelectOutcome::Selected(mut client, _) = client.select("INBOX").await.unwrap() else {
        panic!("select should succeed");
    };

    let ids = client
        .search(&SearchCriteria::Subject("x\"\r\nA9 DELETE INBOX".to_string()))
        .await
        .unwrap();
    assert_eq!(ids.iter().map(|s| s.get()).collect::<Vec<_>>(), vec![2]);
}

#[tokio::test]
async fn test_literal_refused_before_continuation() {
    let stream = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN me@example.com {5}\r\n")
        .read(b"A0000 NO no 8-bit passwords\r\n")
        .build();

    let client = Client::from_stream(stream).await.unwrap();
    let err = client.login("me@example.com", "péss").await.unwrap_err();
    assert!(matches!(err, Error::No(ref text) if text == "no 8-bit passwords"));
}
