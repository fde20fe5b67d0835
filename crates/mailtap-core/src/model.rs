//! Readable views built from raw message bytes.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use mailtap_imap::Flags;
use mailtap_mime::{DecodedText, Headers, Message, Part};
use tracing::debug;

/// Body text used when no part can be shown.
pub const NO_READABLE_BODY: &str = "[No readable body]";

/// Prefix of a body taken from an HTML part.
pub const HTML_MARKER: &str = "[HTML]";

/// A Date header, parsed when possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateField {
    /// Parsed timestamp plus the header text it came from.
    Parsed {
        /// Timestamp in the sender's offset.
        at: DateTime<FixedOffset>,
        /// Header text as received.
        raw: String,
    },
    /// Unparseable or absent; kept verbatim.
    Raw(String),
}

impl DateField {
    /// Parses an RFC 2822 date, tolerating a trailing comment such as
    /// `(UTC)` and irregular whitespace. A zone name chrono does not know,
    /// or no zone at all, reads as UTC. Never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let cleaned = strip_trailing_comment(raw)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match DateTime::parse_from_rfc2822(&cleaned) {
            Ok(at) => Self::Parsed {
                at,
                raw: raw.to_string(),
            },
            Err(e) => match parse_zoneless(&cleaned) {
                Some(at) => Self::Parsed {
                    at,
                    raw: raw.to_string(),
                },
                None => {
                    if !cleaned.is_empty() {
                        debug!(date = %raw, error = %e, "unparseable date");
                    }
                    Self::Raw(raw.to_string())
                }
            },
        }
    }

    /// Header text as received.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Parsed { raw, .. } | Self::Raw(raw) => raw,
        }
    }

    /// `YYYY-MM-DD HH:MM` when parsed, else the first 20 characters.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Parsed { at, .. } => at.format("%Y-%m-%d %H:%M").to_string(),
            Self::Raw(raw) => raw.chars().take(20).collect(),
        }
    }
}

const ZONELESS_FORMATS: [&str; 2] = ["%d %b %Y %H:%M:%S", "%d %b %Y %H:%M"];

/// `[Day, ]DD Mon YYYY HH:MM[:SS] [ZONE]` where ZONE is a name or absent.
fn parse_zoneless(cleaned: &str) -> Option<DateTime<FixedOffset>> {
    let without_zone = match cleaned.rsplit_once(' ') {
        Some((rest, zone)) if zone.chars().all(|c| c.is_ascii_alphabetic()) => rest,
        _ => cleaned,
    };
    let without_day = without_zone
        .split_once(", ")
        .map_or(without_zone, |(_, rest)| rest);

    ZONELESS_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(without_day, format).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

fn strip_trailing_comment(raw: &str) -> &str {
    let trimmed = raw.trim_end();
    if trimmed.ends_with(')') {
        if let Some(open) = trimmed.rfind('(') {
            return &trimmed[..open];
        }
    }
    trimmed
}

/// One row of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    /// Sequence number in the selected folder.
    pub id: u32,
    /// Decoded From header, empty when absent.
    pub from: String,
    /// Decoded To header, empty when absent.
    pub to: String,
    /// Decoded Subject header.
    pub subject: Option<String>,
    /// Date header.
    pub date: DateField,
    /// True when the message carries `\Seen`.
    pub seen: bool,
}

/// How the body text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// From a `text/plain` part or a single-part message.
    PlainText,
    /// From a `text/html` part, markup left in place.
    Html,
    /// Nothing usable was found.
    Unreadable,
}

/// The body chosen for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody {
    /// Where the text came from.
    pub kind: BodyKind,
    /// Text to show.
    pub text: String,
}

impl MessageBody {
    fn unreadable() -> Self {
        Self {
            kind: BodyKind::Unreadable,
            text: NO_READABLE_BODY.to_string(),
        }
    }
}

/// Decoded top-level headers of a full message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageHeaders {
    /// Decoded From.
    pub from: String,
    /// Decoded To.
    pub to: String,
    /// Date header as received.
    pub date: String,
    /// Decoded Subject.
    pub subject: String,
}

/// A message ready for reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullMessage {
    /// Top-level headers.
    pub headers: MessageHeaders,
    /// Selected body.
    pub body: MessageBody,
    /// Attachment file names in document order.
    pub attachments: Vec<String>,
}

/// Builds a listing row from fetched header bytes and flags.
#[must_use]
pub fn parse_envelope(id: u32, raw_headers: &[u8], flags: &Flags) -> MessageEnvelope {
    let headers = Headers::parse_bytes(raw_headers);
    MessageEnvelope {
        id,
        from: decoded(&headers, "from").unwrap_or_default(),
        to: decoded(&headers, "to").unwrap_or_default(),
        subject: decoded(&headers, "subject"),
        date: DateField::parse(headers.get("date").unwrap_or_default()),
        seen: flags.is_seen(),
    }
}

/// Parses a complete message and picks the body to show.
#[must_use]
pub fn parse_full(raw: &[u8]) -> FullMessage {
    let message = Message::parse(raw);
    let headers = message.headers();

    FullMessage {
        headers: MessageHeaders {
            from: decoded(headers, "from").unwrap_or_default(),
            to: decoded(headers, "to").unwrap_or_default(),
            date: headers.get("date").unwrap_or_default().to_string(),
            subject: decoded(headers, "subject").unwrap_or_default(),
        },
        body: select_body(&message.root),
        attachments: message.walk().filter_map(Part::filename).collect(),
    }
}

/// Picks the body: a single part is read as is; in a multipart tree the
/// first `text/plain` part wins, then the first `text/html` part.
#[must_use]
pub fn select_body(root: &Part) -> MessageBody {
    if !root.is_multipart() {
        let text = logged(root.body_text(), "body");
        if text.is_empty() {
            return MessageBody::unreadable();
        }
        return MessageBody {
            kind: BodyKind::PlainText,
            text,
        };
    }

    if let Some(part) = root.walk().find(|p| p.content_type().is("text", "plain")) {
        return MessageBody {
            kind: BodyKind::PlainText,
            text: logged(part.body_text(), "text/plain part"),
        };
    }

    if let Some(part) = root.walk().find(|p| p.content_type().is("text", "html")) {
        let html = logged(part.body_text(), "text/html part");
        return MessageBody {
            kind: BodyKind::Html,
            text: format!("{HTML_MARKER}\n{html}"),
        };
    }

    MessageBody::unreadable()
}

fn decoded(headers: &Headers, name: &str) -> Option<String> {
    headers.get_decoded(name).map(|text| logged(text, name))
}

fn logged(decoded: DecodedText, what: &str) -> String {
    if decoded.lossy {
        debug!(what, "lossy decode, replacement characters inserted");
    }
    decoded.text
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
    use mailtap_imap::Flag;

    use super::*;

    #[test]
    fn test_date_with_comment() {
        let date = DateField::parse("Tue, 5 Mar 2024 14:03:00 +0000 (UTC)");
        assert!(matches!(date, DateField::Parsed { .. }));
        assert_eq!(date.display(), "2024-03-05 14:03");
        assert_eq!(date.raw(), "Tue, 5 Mar 2024 14:03:00 +0000 (UTC)");
    }

    #[test]
    fn test_date_keeps_sender_offset() {
        let date = DateField::parse("Mon,  4 Mar 2024   23:30:00 -0500");
        assert_eq!(date.display(), "2024-03-04 23:30");
    }

    #[test]
    fn test_date_zone_names_and_missing_zone() {
        for raw in [
            "Tue, 5 Mar 2024 14:03:00 UTC",
            "Tue, 5 Mar 2024 14:03:00",
            "Tue, 5 Mar 2024 14:03:00 CET",
            "5 Mar 2024 14:03 Z",
        ] {
            let date = DateField::parse(raw);
            assert!(matches!(date, DateField::Parsed { .. }), "{raw}");
            assert_eq!(date.display(), "2024-03-05 14:03", "{raw}");
            assert_eq!(date.raw(), raw);
        }
    }

    #[test]
    fn test_malformed_date_shows_prefix() {
        let date = DateField::parse("sometime last tuesday afternoon");
        assert_eq!(date, DateField::Raw("sometime last tuesday afternoon".to_string()));
        assert_eq!(date.display(), "sometime last tuesda");
        assert_eq!(DateField::parse("").display(), "");
        assert_eq!(DateField::parse("not-a-date").display(), "not-a-date");
        assert!(matches!(DateField::parse("Tue, 5 Mar 2024"), DateField::Raw(_)));
    }

    #[test]
    fn test_envelope() {
        let raw = b"From: =?utf-8?q?Ren=C3=A9?= <rene@example.com>\r\n\
                    To: me@example.com\r\n\
                    Subject: Hello\r\n\
                    Date: Tue, 5 Mar 2024 14:03:00 +0000\r\n\r\n";
        let flags = Flags::from_vec(vec![Flag::Seen]);

        let envelope = parse_envelope(7, raw, &flags);
        assert_eq!(envelope.id, 7);
        assert_eq!(envelope.from, "René <rene@example.com>");
        assert_eq!(envelope.subject.as_deref(), Some("Hello"));
        assert!(envelope.seen);
    }

    #[test]
    fn test_envelope_missing_headers() {
        let envelope = parse_envelope(1, b"\r\n", &Flags::new());
        assert_eq!(envelope.from, "");
        assert_eq!(envelope.subject, None);
        assert_eq!(envelope.date, DateField::Raw(String::new()));
        assert!(!envelope.seen);
    }

    #[test]
    fn test_single_part_body() {
        let raw = b"Subject: x\r\nContent-Type: text/plain; charset=iso-8859-1\r\n\
                    Content-Transfer-Encoding: quoted-printable\r\n\r\ncaf=E9\r\n";
        let message = parse_full(raw);
        assert_eq!(message.body.kind, BodyKind::PlainText);
        assert_eq!(message.body.text.trim_end(), "café");
        assert_eq!(message.headers.subject, "x");
    }

    #[test]
    fn test_empty_single_part_is_unreadable() {
        let message = parse_full(b"Subject: empty\r\n\r\n");
        assert_eq!(message.body.kind, BodyKind::Unreadable);
        assert_eq!(message.body.text, NO_READABLE_BODY);
    }

    #[test]
    fn test_plain_preferred_over_earlier_html() {
        let raw = b"Content-Type: multipart/alternative; boundary=b\r\n\r\n\
                    --b\r\nContent-Type: text/html\r\n\r\n<p>hi</p>\r\n\
                    --b\r\nContent-Type: text/plain\r\n\r\nhi\r\n\
                    --b--\r\n";
        let message = parse_full(raw);
        assert_eq!(message.body.kind, BodyKind::PlainText);
        assert_eq!(message.body.text, "hi");
    }

    #[test]
    fn test_html_only() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\r\n\
                    --b\r\nContent-Type: text/html\r\n\r\n<p>hi</p>\r\n\
                    --b--\r\n";
        let message = parse_full(raw);
        assert_eq!(message.body.kind, BodyKind::Html);
        assert!(message.body.text.starts_with("[HTML]\n<p>hi</p>"));
    }

    #[test]
    fn test_no_text_parts() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\r\n\
                    --b\r\nContent-Type: image/png\r\n\r\nxxx\r\n\
                    --b--\r\n";
        assert_eq!(parse_full(raw).body.text, NO_READABLE_BODY);
    }

    #[test]
    fn test_attachments_in_order() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\r\n\
                    --b\r\nContent-Type: text/plain\r\n\r\nsee attached\r\n\
                    --b\r\nContent-Type: application/pdf; name=\"a.pdf\"\r\n\r\n%PDF\r\n\
                    --b\r\nContent-Disposition: attachment; filename*=utf-8''r%C3%A9sum%C3%A9.txt\r\n\r\nx\r\n\
                    --b\r\nContent-Type: text/plain; name=a.pdf\r\n\r\ndup\r\n\
                    --b--\r\n";
        let message = parse_full(raw);
        assert_eq!(message.attachments, vec!["a.pdf", "résumé.txt", "a.pdf"]);
        assert_eq!(message.body.text, "see attached");
    }
}
