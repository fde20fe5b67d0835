//! Plain-text output for each command.

use std::io::{self, Write};

use mailtap_core::{
    FullMessage, Listing, MessageCount, MessageEnvelope, OutgoingMessage, StatusFilter,
};

const FROM_WIDTH: usize = 30;
const UNREAD_MARKER: char = '●';

fn table_header(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{:>6} | {:20} | {:30} | Subject", "ID", "Date", "From")?;
    writeln!(out, "{}", "-".repeat(100))
}

fn from_column(envelope: &MessageEnvelope) -> String {
    envelope.from.chars().take(FROM_WIDTH).collect()
}

fn subject_column(envelope: &MessageEnvelope) -> &str {
    envelope.subject.as_deref().unwrap_or("(no subject)")
}

/// Inbox table with an unread marker column.
pub fn inbox(out: &mut impl Write, listing: &Listing, filter: StatusFilter) -> io::Result<()> {
    let rows = match listing {
        Listing::Empty => {
            let text = match filter {
                StatusFilter::All => "Inbox is empty.",
                StatusFilter::Unread => "No unread messages.",
            };
            return writeln!(out, "{text}");
        }
        Listing::Messages(rows) => rows,
    };

    table_header(out)?;
    for envelope in rows {
        let marker = if envelope.seen { ' ' } else { UNREAD_MARKER };
        writeln!(
            out,
            "{:>6} {marker}| {:20} | {:30} | {}",
            envelope.id,
            envelope.date.display(),
            from_column(envelope),
            subject_column(envelope)
        )?;
    }
    Ok(())
}

/// Search results, preceded by a count.
pub fn search(out: &mut impl Write, listing: &Listing) -> io::Result<()> {
    let rows = match listing {
        Listing::Empty => return writeln!(out, "No matching messages."),
        Listing::Messages(rows) => rows,
    };

    writeln!(out, "Found {} message(s):", rows.len())?;
    table_header(out)?;
    for envelope in rows {
        writeln!(
            out,
            "{:>6} | {:20} | {:30} | {}",
            envelope.id,
            envelope.date.display(),
            from_column(envelope),
            subject_column(envelope)
        )?;
    }
    Ok(())
}

pub fn message(out: &mut impl Write, message: &FullMessage) -> io::Result<()> {
    let headers = &message.headers;
    writeln!(out, "From:    {}", headers.from)?;
    writeln!(out, "To:      {}", headers.to)?;
    writeln!(out, "Date:    {}", headers.date)?;
    writeln!(out, "Subject: {}", headers.subject)?;
    if !message.attachments.is_empty() {
        writeln!(out, "Attachments: {}", message.attachments.join(", "))?;
    }
    writeln!(out, "{}", "-".repeat(60))?;
    writeln!(out, "{}", message.body.text)
}

pub fn not_found(out: &mut impl Write, id: u32) -> io::Result<()> {
    writeln!(out, "Message {id} not found.")
}

pub fn count(out: &mut impl Write, count: MessageCount) -> io::Result<()> {
    writeln!(out, "Total: {}, Unread: {}", count.total, count.unread)
}

pub fn folders(out: &mut impl Write, folders: &[String]) -> io::Result<()> {
    folders.iter().try_for_each(|folder| writeln!(out, "{folder}"))
}

pub fn sent(out: &mut impl Write, message: &OutgoingMessage) -> io::Result<()> {
    match &message.cc {
        Some(cc) => writeln!(out, "Sent to {} (cc: {cc})", message.to),
        None => writeln!(out, "Sent to {}", message.to),
    }
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
    use mailtap_core::{BodyKind, DateField, MessageBody, MessageHeaders};

    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn envelope(id: u32, from: &str, subject: Option<&str>, seen: bool) -> MessageEnvelope {
        MessageEnvelope {
            id,
            from: from.to_string(),
            to: String::new(),
            subject: subject.map(str::to_string),
            date: DateField::parse("Tue, 5 Mar 2024 14:03:00 +0000"),
            seen,
        }
    }

    #[test]
    fn test_empty_listings() {
        assert_eq!(
            render(|o| inbox(o, &Listing::Empty, StatusFilter::All)),
            "Inbox is empty.\n"
        );
        assert_eq!(
            render(|o| inbox(o, &Listing::Empty, StatusFilter::Unread)),
            "No unread messages.\n"
        );
        assert_eq!(render(|o| search(o, &Listing::Empty)), "No matching messages.\n");
    }

    #[test]
    fn test_inbox_rows() {
        let listing = Listing::Messages(vec![
            envelope(12, "Alice <alice@example.com>", Some("Lunch"), false),
            envelope(3, "bob@example.com", None, true),
        ]);
        let text = render(|o| inbox(o, &listing, StatusFilter::All));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], format!("{:>6} | {:20} | {:30} | Subject", "ID", "Date", "From"));
        assert_eq!(lines[1], "-".repeat(100));
        assert_eq!(
            lines[2],
            "    12 ●| 2024-03-05 14:03     | Alice <alice@example.com>      | Lunch"
        );
        assert_eq!(
            lines[3],
            "     3  | 2024-03-05 14:03     | bob@example.com                | (no subject)"
        );
    }

    #[test]
    fn test_from_truncated() {
        let long = "A Very Long Display Name Indeed <someone@example.com>";
        let listing = Listing::Messages(vec![envelope(1, long, Some("x"), true)]);
        let text = render(|o| search(o, &listing));
        let row = text.lines().nth(3).unwrap();
        assert!(row.contains("| A Very Long Display Name Indee | x"));
    }

    #[test]
    fn test_search_count_line() {
        let listing = Listing::Messages(vec![envelope(1, "a", Some("x"), false)]);
        let text = render(|o| search(o, &listing));
        assert!(text.starts_with("Found 1 message(s):\n"));
        assert!(!text.contains('●'));
    }

    #[test]
    fn test_full_message() {
        let full = FullMessage {
            headers: MessageHeaders {
                from: "a@x.org".to_string(),
                to: "b@x.org".to_string(),
                date: "Tue, 5 Mar 2024 14:03:00 +0000 (UTC)".to_string(),
                subject: "Hi".to_string(),
            },
            body: MessageBody {
                kind: BodyKind::PlainText,
                text: "hello".to_string(),
            },
            attachments: vec!["a.pdf".to_string(), "b.png".to_string()],
        };
        let expected = format!(
            "From:    a@x.org\nTo:      b@x.org\nDate:    Tue, 5 Mar 2024 14:03:00 +0000 (UTC)\n\
             Subject: Hi\nAttachments: a.pdf, b.png\n{}\nhello\n",
            "-".repeat(60)
        );
        assert_eq!(render(|o| message(o, &full)), expected);
    }

    #[test]
    fn test_short_outputs() {
        assert_eq!(render(|o| not_found(o, 9)), "Message 9 not found.\n");
        assert_eq!(
            render(|o| count(o, MessageCount { total: 0, unread: 0 })),
            "Total: 0, Unread: 0\n"
        );
        assert_eq!(
            render(|o| folders(o, &["INBOX".to_string(), "Sent".to_string()])),
            "INBOX\nSent\n"
        );

        let mut outgoing = OutgoingMessage {
            to: "a@x.org".to_string(),
            cc: None,
            subject: String::new(),
            body: String::new(),
        };
        assert_eq!(render(|o| sent(o, &outgoing)), "Sent to a@x.org\n");
        outgoing.cc = Some("b@x.org, c@x.org".to_string());
        assert_eq!(
            render(|o| sent(o, &outgoing)),
            "Sent to a@x.org (cc: b@x.org, c@x.org)\n"
        );
    }
}
