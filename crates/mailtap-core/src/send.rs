//! Outgoing mail.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Local};
use mailtap_mime::encoding::{encode_quoted_printable, encode_rfc2047};
use mailtap_smtp::connection::{connect, connect_tls};
use mailtap_smtp::{Address, Client, Connected};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::credentials::{CredentialRecord, Security};
use crate::error::{Error, Result};

/// Name announced in EHLO.
const EHLO_NAME: &str = "localhost";

/// Longest line allowed in a 7bit body.
const MAX_7BIT_LINE: usize = 998;

/// A plain-text message to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// To header, one or more comma-separated addresses.
    pub to: String,
    /// Cc header, comma-separated.
    pub cc: Option<String>,
    /// Subject text.
    pub subject: String,
    /// Body text.
    pub body: String,
}

impl OutgoingMessage {
    /// Envelope recipients: To then Cc, split on commas and trimmed.
    #[must_use]
    pub fn recipients(&self) -> Vec<String> {
        std::iter::once(self.to.as_str())
            .chain(self.cc.as_deref())
            .flat_map(|list| list.split(','))
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Renders the message as `multipart/mixed` with one UTF-8 text part.
    #[must_use]
    pub fn render(&self, from: &str, date: DateTime<FixedOffset>, boundary: &str) -> String {
        let mut out = String::new();
        let _ = write!(out, "From: {from}\r\n");
        let _ = write!(out, "To: {}\r\n", self.to.trim());
        if let Some(cc) = self.cc.as_deref().map(str::trim).filter(|cc| !cc.is_empty()) {
            let _ = write!(out, "Cc: {cc}\r\n");
        }
        let _ = write!(out, "Subject: {}\r\n", encode_rfc2047(&self.subject, "utf-8"));
        let _ = write!(out, "Date: {}\r\n", date.to_rfc2822());
        out.push_str("MIME-Version: 1.0\r\n");
        let _ = write!(out, "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n");

        let (encoding, body) = encode_body(&self.body);
        let _ = write!(out, "--{boundary}\r\n");
        out.push_str("Content-Type: text/plain; charset=\"utf-8\"\r\n");
        let _ = write!(out, "Content-Transfer-Encoding: {encoding}\r\n\r\n");
        out.push_str(&body);
        if !body.ends_with("\r\n") {
            out.push_str("\r\n");
        }
        let _ = write!(out, "--{boundary}--\r\n");
        out
    }
}

/// Chooses 7bit for short-lined ASCII, quoted-printable otherwise.
fn encode_body(body: &str) -> (&'static str, String) {
    let plain = body.is_ascii() && body.lines().all(|line| line.len() <= MAX_7BIT_LINE);
    if plain {
        let crlf = body.lines().collect::<Vec<_>>().join("\r\n");
        ("7bit", crlf)
    } else {
        ("quoted-printable", encode_quoted_printable(body))
    }
}

fn boundary_for(date: DateTime<FixedOffset>) -> String {
    let stamp = date.timestamp_nanos_opt().unwrap_or_default();
    format!("=_mailtap_{stamp:x}_{:x}", std::process::id())
}

/// Sends `message` from the record's address through its SMTP server.
///
/// # Errors
///
/// [`Error::Send`] naming the step that failed.
pub async fn send(record: &CredentialRecord, message: &OutgoingMessage) -> Result<()> {
    let from = Address::new(&record.address).map_err(|e| Error::Send(e.to_string()))?;
    let recipients = message
        .recipients()
        .iter()
        .map(Address::new)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Send(e.to_string()))?;
    if recipients.is_empty() {
        return Err(Error::Send("no recipients".to_string()));
    }

    let now = Local::now().fixed_offset();
    let rendered = message.render(&record.address, now, &boundary_for(now));

    let server = &record.smtp.endpoint;
    debug!(server = %server, security = ?record.smtp.security, "submitting");
    let step = |what: &'static str| move |e: mailtap_smtp::Error| Error::Send(format!("{what}: {e}"));

    match record.smtp.security {
        Security::Tls => {
            let stream = connect_tls(&server.host, server.port)
                .await
                .map_err(step("connect"))?;
            let client = Client::from_stream(stream).await.map_err(step("greeting"))?;
            let client = client.ehlo(EHLO_NAME).await.map_err(step("EHLO"))?;
            submit(client, record, &from, &recipients, rendered.as_bytes()).await
        }
        Security::StartTls => {
            let stream = connect(&server.host, server.port)
                .await
                .map_err(step("connect"))?;
            let client = Client::from_stream(stream).await.map_err(step("greeting"))?;
            let client = client.ehlo(EHLO_NAME).await.map_err(step("EHLO"))?;
            let client = client
                .starttls(&server.host, EHLO_NAME)
                .await
                .map_err(step("STARTTLS"))?;
            submit(client, record, &from, &recipients, rendered.as_bytes()).await
        }
    }
}

/// AUTH PLAIN, one transaction, QUIT.
///
/// # Errors
///
/// [`Error::Send`] naming the step that failed.
pub async fn submit<S>(
    client: Client<S, Connected>,
    record: &CredentialRecord,
    from: &Address,
    recipients: &[Address],
    message: &[u8],
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let step = |what: &'static str| move |e: mailtap_smtp::Error| Error::Send(format!("{what}: {e}"));
    let Some((first, rest)) = recipients.split_first() else {
        return Err(Error::Send("no recipients".to_string()));
    };

    let client = client
        .auth_plain(&record.address, record.password())
        .await
        .map_err(step("authentication"))?;
    let client = client
        .mail_from(from, Some(message.len()))
        .await
        .map_err(step("MAIL FROM"))?;
    let mut client = client.rcpt_to(first).await.map_err(step("RCPT TO"))?;
    for recipient in rest {
        client = client.rcpt_to(recipient).await.map_err(step("RCPT TO"))?;
    }
    let client = client.data().await.map_err(step("DATA"))?;
    let client = client
        .send_message(message)
        .await
        .map_err(step("message"))?;
    client.quit().await.map_err(step("QUIT"))?;

    debug!(recipients = recipients.len(), "message sent");
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn message(to: &str, cc: Option<&str>, subject: &str, body: &str) -> OutgoingMessage {
        OutgoingMessage {
            to: to.to_string(),
            cc: cc.map(str::to_string),
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }

    fn fixed_date() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 14, 3, 0)
            .unwrap()
    }

    #[test]
    fn test_recipients_split_and_trimmed() {
        let msg = message("a@x.org", Some(" b@x.org, ,c@x.org "), "s", "b");
        assert_eq!(msg.recipients(), vec!["a@x.org", "b@x.org", "c@x.org"]);
        assert_eq!(message("a@x.org", None, "s", "b").recipients(), vec!["a@x.org"]);
    }

    #[test]
    fn test_render_ascii() {
        let msg = message("a@x.org", Some("b@x.org"), "Hello", "line one\nline two");
        let rendered = msg.render("me@x.org", fixed_date(), "BOUND");
        assert_eq!(
            rendered,
            "From: me@x.org\r\n\
             To: a@x.org\r\n\
             Cc: b@x.org\r\n\
             Subject: Hello\r\n\
             Date: Tue, 5 Mar 2024 14:03:00 +0000\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/mixed; boundary=\"BOUND\"\r\n\
             \r\n\
             --BOUND\r\n\
             Content-Type: text/plain; charset=\"utf-8\"\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             line one\r\n\
             line two\r\n\
             --BOUND--\r\n"
        );
    }

    #[test]
    fn test_render_non_ascii() {
        let msg = message("a@x.org", None, "Café", "Grüße");
        let rendered = msg.render("me@x.org", fixed_date(), "B");
        assert!(rendered.contains("Subject: =?utf-8?B?Q2Fmw6k=?=\r\n"));
        assert!(rendered.contains("Content-Transfer-Encoding: quoted-printable\r\n\r\nGr=C3=BC=C3=9Fe\r\n--B--\r\n"));
        assert!(!rendered.contains("Cc:"));
    }

    #[test]
    fn test_rendered_message_parses_back() {
        let msg = message("a@x.org", None, "Ünïcode", "plain body");
        let rendered = msg.render("me@x.org", fixed_date(), "B");
        let parsed = crate::model::parse_full(rendered.as_bytes());
        assert_eq!(parsed.headers.subject, "Ünïcode");
        assert_eq!(parsed.body.text, "plain body");
    }

    #[test]
    fn test_boundary_is_stable_per_instant() {
        let date = fixed_date();
        assert_eq!(boundary_for(date), boundary_for(date));
        assert!(boundary_for(date).starts_with("=_mailtap_"));
    }
}
