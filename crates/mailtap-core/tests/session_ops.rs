//! Command operations run through a scoped session against a scripted
//! IMAP server.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailtap_core::{
    BodyKind, Error, Listing, MailboxSession, MessageCount, ReadOutcome, SearchQuery,
    StatusFilter, ops, run_scoped,
};

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

fn logouts(sent: &Arc<Mutex<Vec<u8>>>) -> usize {
    sent_lines(sent)
        .iter()
        .filter(|line| line.ends_with(" LOGOUT"))
        .count()
}

const GREETING: &[u8] = b"* OK IMAP4rev1 ready\r\n";
const LOGGED_IN: &[u8] = b"A0000 OK logged in\r\n";
const SELECTED: &[u8] = b"* 3 EXISTS\r\nA0001 OK [READ-WRITE] SELECT completed\r\n";

fn header_fetch(id: u32, flags: &str, headers: &str) -> Vec<u8> {
    format!(
        "* {id} FETCH (FLAGS ({flags}) BODY[HEADER.FIELDS (FROM TO SUBJECT DATE)] {{{}}}\r\n{headers})\r\n",
        headers.len()
    )
    .into_bytes()
}

async fn session(script: &[u8]) -> (MailboxSession<MockStream>, Arc<Mutex<Vec<u8>>>) {
    let (stream, sent) = MockStream::new(script);
    let session = MailboxSession::open(stream, "me@example.com", "secret")
        .await
        .unwrap();
    (session, sent)
}

#[tokio::test]
async fn test_list_recent_newest_first() {
    let script = [
        GREETING,
        LOGGED_IN,
        SELECTED,
        b"* SEARCH 1 2 3\r\nA0002 OK SEARCH completed\r\n",
        header_fetch(
            3,
            "",
            "From: Alice <alice@example.com>\r\nSubject: third\r\nDate: Tue, 5 Mar 2024 14:03:00 +0000\r\n\r\n",
        )
        .as_slice(),
        b"A0003 OK FETCH completed\r\n",
        header_fetch(2, "\\Seen", "From: bob@example.com\r\n\r\n").as_slice(),
        b"A0004 OK FETCH completed\r\n",
        b"* BYE bye\r\nA0005 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (session, sent) = session(&script).await;

    let listing = run_scoped(session, async |s| {
        ops::list_recent(s, StatusFilter::All, 2).await
    })
    .await
    .unwrap();

    let Listing::Messages(rows) = listing else {
        panic!("expected messages");
    };
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2]);
    assert_eq!(rows[0].subject.as_deref(), Some("third"));
    assert!(!rows[0].seen);
    assert_eq!(rows[0].date.display(), "2024-03-05 14:03");
    assert_eq!(rows[1].subject, None);
    assert!(rows[1].seen);

    assert_eq!(
        sent_lines(&sent),
        vec![
            "A0000 LOGIN me@example.com secret",
            "A0001 SELECT INBOX",
            "A0002 SEARCH ALL",
            "A0003 FETCH 3 (FLAGS BODY.PEEK[HEADER.FIELDS (FROM TO SUBJECT DATE)])",
            "A0004 FETCH 2 (FLAGS BODY.PEEK[HEADER.FIELDS (FROM TO SUBJECT DATE)])",
            "A0005 LOGOUT",
        ]
    );
}

#[tokio::test]
async fn test_unread_listing_empty() {
    let script = [
        GREETING,
        LOGGED_IN,
        SELECTED,
        b"* SEARCH\r\nA0002 OK SEARCH completed\r\n",
        b"A0003 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (session, sent) = session(&script).await;

    let listing = run_scoped(session, async |s| {
        ops::list_recent(s, StatusFilter::Unread, 20).await
    })
    .await
    .unwrap();

    assert_eq!(listing, Listing::Empty);
    assert_eq!(sent_lines(&sent)[2], "A0002 SEARCH UNSEEN");
    assert_eq!(logouts(&sent), 1);
}

#[tokio::test]
async fn test_search_without_filters_matches_all() {
    let script = [
        GREETING,
        LOGGED_IN,
        SELECTED,
        b"* SEARCH\r\nA0002 OK SEARCH completed\r\n",
        b"A0003 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (session, sent) = session(&script).await;

    let listing = run_scoped(session, async |s| {
        ops::search(s, &SearchQuery::default(), 20).await
    })
    .await
    .unwrap();

    assert_eq!(listing, Listing::Empty);
    assert_eq!(sent_lines(&sent)[2], "A0002 SEARCH ALL");
}

#[tokio::test]
async fn test_count_empty_mailbox() {
    let script = [
        GREETING,
        LOGGED_IN,
        b"* 0 EXISTS\r\nA0001 OK SELECT completed\r\n",
        b"* SEARCH\r\nA0002 OK SEARCH completed\r\n",
        b"* SEARCH\r\nA0003 OK SEARCH completed\r\n",
        b"A0004 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (session, sent) = session(&script).await;

    let count = run_scoped(session, async |s| ops::count(s).await)
        .await
        .unwrap();

    assert_eq!(count, MessageCount { total: 0, unread: 0 });
    assert_eq!(
        sent_lines(&sent)[2..4],
        ["A0002 SEARCH ALL".to_string(), "A0003 SEARCH UNSEEN".to_string()]
    );
}

#[tokio::test]
async fn test_read_one_found() {
    let body = "Subject: hello\r\nContent-Type: text/plain\r\n\r\nbody text\r\n";
    let fetch = format!("* 7 FETCH (RFC822 {{{}}}\r\n{body})\r\n", body.len());
    let script = [
        GREETING,
        LOGGED_IN,
        SELECTED,
        fetch.as_bytes(),
        b"A0002 OK FETCH completed\r\n",
        b"A0003 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (session, sent) = session(&script).await;

    let outcome = run_scoped(session, async |s| ops::read_one(s, 7).await)
        .await
        .unwrap();

    let ReadOutcome::Found(message) = outcome else {
        panic!("expected a message");
    };
    assert_eq!(message.headers.subject, "hello");
    assert_eq!(message.body.kind, BodyKind::PlainText);
    assert_eq!(message.body.text.trim_end(), "body text");
    assert_eq!(sent_lines(&sent)[2], "A0002 FETCH 7 RFC822");
}

#[tokio::test]
async fn test_read_one_missing() {
    let script = [
        GREETING,
        LOGGED_IN,
        SELECTED,
        b"A0002 OK FETCH completed\r\n",
        b"A0003 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (session, sent) = session(&script).await;

    let outcome = run_scoped(session, async |s| ops::read_one(s, 99).await)
        .await
        .unwrap();

    assert_eq!(outcome, ReadOutcome::NotFound);
    assert_eq!(logouts(&sent), 1);
}

#[tokio::test]
async fn test_missing_inbox_still_logs_out() {
    let script = [
        GREETING,
        LOGGED_IN,
        b"A0001 NO [NONEXISTENT] Mailbox doesn't exist\r\n",
        b"A0002 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (session, sent) = session(&script).await;

    let err = run_scoped(session, async |s| ops::count(s).await)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FolderNotFound { ref folder, .. } if folder == "INBOX"));
    assert_eq!(sent_lines(&sent).last().unwrap(), "A0002 LOGOUT");
    assert_eq!(logouts(&sent), 1);
}

#[tokio::test]
async fn test_failed_work_logs_out_once() {
    let script = [GREETING, LOGGED_IN, b"A0001 OK LOGOUT completed\r\n"].concat();
    let (session, sent) = session(&script).await;

    let err = run_scoped(session, async |s| {
        s.search(&mailtap_imap::SearchCriteria::All).await
    })
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Protocol(_)));
    assert_eq!(
        sent_lines(&sent),
        vec!["A0000 LOGIN me@example.com secret", "A0001 LOGOUT"]
    );
}

#[tokio::test]
async fn test_folders_without_selection() {
    let script = [
        GREETING,
        LOGGED_IN,
        b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n",
        b"* LIST (\\HasNoChildren) \"/\" Sent\r\n",
        b"A0001 OK LIST completed\r\n",
        b"A0002 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (session, sent) = session(&script).await;

    let folders = run_scoped(session, async |s| ops::folders(s).await)
        .await
        .unwrap();

    assert_eq!(
        folders,
        vec!["(\\HasNoChildren) \"/\" INBOX", "(\\HasNoChildren) \"/\" Sent"]
    );
    assert_eq!(sent_lines(&sent)[1], "A0001 LIST \"\" *");
}

fn three_message_script(search_tag: &str, first_fetch: &str, second_fetch: &str) -> Vec<u8> {
    [
        GREETING,
        LOGGED_IN,
        SELECTED,
        format!("* SEARCH 1 2 3\r\n{search_tag} OK SEARCH completed\r\n").as_bytes(),
        header_fetch(3, "", "Subject: third\r\n\r\n").as_slice(),
        format!("{first_fetch} OK FETCH completed\r\n").as_bytes(),
        header_fetch(2, "\\Seen", "Subject: second\r\n\r\n").as_slice(),
        format!("{second_fetch} OK FETCH completed\r\n").as_bytes(),
        b"A0005 OK LOGOUT completed\r\n",
    ]
    .concat()
}

#[tokio::test]
async fn test_unfiltered_search_matches_listing() {
    let script = three_message_script("A0002", "A0003", "A0004");

    let (listing_session, _) = session(&script).await;
    let listed = run_scoped(listing_session, async |s| {
        ops::list_recent(s, StatusFilter::All, 2).await
    })
    .await
    .unwrap();

    let (search_session, sent) = session(&script).await;
    let searched = run_scoped(search_session, async |s| {
        ops::search(s, &SearchQuery::default(), 2).await
    })
    .await
    .unwrap();

    let ids = |listing: &Listing| match listing {
        Listing::Messages(rows) => rows.iter().map(|r| r.id).collect::<Vec<_>>(),
        Listing::Empty => Vec::new(),
    };
    assert_eq!(ids(&searched), vec![3, 2]);
    assert_eq!(searched, listed);
    assert_eq!(sent_lines(&sent)[2], "A0002 SEARCH ALL");
}

#[tokio::test]
async fn test_malformed_date_still_listed() {
    let script = [
        GREETING,
        LOGGED_IN,
        SELECTED,
        b"* SEARCH 4\r\nA0002 OK SEARCH completed\r\n",
        header_fetch(
            4,
            "",
            "From: a@example.com\r\nDate: sometime next week, probably\r\n\r\n",
        )
        .as_slice(),
        b"A0003 OK FETCH completed\r\n",
        b"A0004 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (session, sent) = session(&script).await;

    let listing = run_scoped(session, async |s| {
        ops::list_recent(s, StatusFilter::All, 20).await
    })
    .await
    .unwrap();

    let Listing::Messages(rows) = listing else {
        panic!("expected messages");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date.display(), "sometime next week, ");
    assert_eq!(rows[0].date.raw(), "sometime next week, probably");
    assert_eq!(logouts(&sent), 1);
}

#[tokio::test]
async fn test_malformed_date_still_read() {
    let body = "Date: not-a-date\r\nSubject: odd\r\n\r\nstill readable\r\n";
    let fetch = format!("* 5 FETCH (RFC822 {{{}}}\r\n{body})\r\n", body.len());
    let script = [
        GREETING,
        LOGGED_IN,
        SELECTED,
        fetch.as_bytes(),
        b"A0002 OK FETCH completed\r\n",
        b"A0003 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (session, _) = session(&script).await;

    let outcome = run_scoped(session, async |s| ops::read_one(s, 5).await)
        .await
        .unwrap();

    let ReadOutcome::Found(message) = outcome else {
        panic!("expected a message");
    };
    assert_eq!(message.headers.date, "not-a-date");
    assert_eq!(message.body.text.trim_end(), "still readable");
}

#[tokio::test]
async fn test_all_matches_vanished_is_empty() {
    let script = [
        GREETING,
        LOGGED_IN,
        SELECTED,
        b"* SEARCH 1 2\r\nA0002 OK SEARCH completed\r\n",
        b"A0003 OK FETCH completed\r\n",
        b"A0004 OK FETCH completed\r\n",
        b"A0005 OK LOGOUT completed\r\n",
    ]
    .concat();
    let (session, sent) = session(&script).await;

    let listing = run_scoped(session, async |s| {
        ops::list_recent(s, StatusFilter::All, 20).await
    })
    .await
    .unwrap();

    assert_eq!(listing, Listing::Empty);
    assert_eq!(logouts(&sent), 1);
}
