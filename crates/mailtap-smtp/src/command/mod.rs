//! SMTP commands and their wire form.

use crate::types::{Address, AuthMechanism};

/// A command the client can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO
    Ehlo {
        /// Name the client announces.
        hostname: String,
    },
    /// STARTTLS
    StartTls,
    /// AUTH with an optional initial response (RFC 4954).
    Auth {
        /// Mechanism.
        mechanism: AuthMechanism,
        /// Base64 initial response.
        initial_response: Option<String>,
    },
    /// MAIL FROM
    MailFrom {
        /// Envelope sender.
        from: Address,
        /// SIZE parameter, sent only when the server advertises SIZE.
        size: Option<usize>,
    },
    /// RCPT TO
    RcptTo {
        /// Envelope recipient.
        to: Address,
    },
    /// DATA
    Data,
    /// QUIT
    Quit,
}

impl Command {
    /// Serializes the command with its trailing CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let line = match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::Auth {
                mechanism,
                initial_response: Some(resp),
            } => format!("AUTH {} {resp}", mechanism.as_str()),
            Self::Auth {
                mechanism,
                initial_response: None,
            } => format!("AUTH {}", mechanism.as_str()),
            Self::MailFrom { from, size: None } => format!("MAIL FROM:<{from}>"),
            Self::MailFrom {
                from,
                size: Some(size),
            } => format!("MAIL FROM:<{from}> SIZE={size}"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Quit => "QUIT".to_string(),
        };

        let mut buf = line.into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// True when the command carries credentials and must not be logged.
    #[must_use]
    pub const fn is_sensitive(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Frames a message for the DATA phase.
///
/// Line endings become CRLF, lines starting with `.` get an extra dot, and
/// the `.` terminator line is appended. A missing final line break is
/// added; an existing one does not produce an extra blank line.
#[must_use]
pub fn frame_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 32 + 5);

    let body = message.strip_suffix(b"\n").unwrap_or(message);
    if !message.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }

    out.extend_from_slice(b".\r\n");
    out
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
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[test]
    fn test_serialize() {
        let cases: Vec<(Command, &[u8])> = vec![
            (
                Command::Ehlo {
                    hostname: "client.example.com".to_string(),
                },
                b"EHLO client.example.com\r\n",
            ),
            (Command::StartTls, b"STARTTLS\r\n"),
            (
                Command::Auth {
                    mechanism: AuthMechanism::Plain,
                    initial_response: Some("AHVzZXIAcGFzcw==".to_string()),
                },
                b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n",
            ),
            (
                Command::MailFrom {
                    from: addr("me@example.com"),
                    size: None,
                },
                b"MAIL FROM:<me@example.com>\r\n",
            ),
            (
                Command::MailFrom {
                    from: addr("me@example.com"),
                    size: Some(12345),
                },
                b"MAIL FROM:<me@example.com> SIZE=12345\r\n",
            ),
            (
                Command::RcptTo {
                    to: addr("you@example.com"),
                },
                b"RCPT TO:<you@example.com>\r\n",
            ),
            (Command::Data, b"DATA\r\n"),
            (Command::Quit, b"QUIT\r\n"),
        ];

        for (command, wire) in cases {
            assert_eq!(command.serialize(), wire, "{command:?}");
        }
    }

    #[test]
    fn test_only_auth_is_sensitive() {
        assert!(
            Command::Auth {
                mechanism: AuthMechanism::Plain,
                initial_response: None,
            }
            .is_sensitive()
        );
        assert!(!Command::Data.is_sensitive());
    }

    #[test]
    fn test_frame_data_normalizes_line_endings() {
        assert_eq!(frame_data(b"a\nb\r\nc\r\n"), b"a\r\nb\r\nc\r\n.\r\n");
    }

    #[test]
    fn test_frame_data_adds_missing_line_break() {
        assert_eq!(frame_data(b"Subject: x\r\n\r\nhi"), b"Subject: x\r\n\r\nhi\r\n.\r\n");
    }

    #[test]
    fn test_frame_data_dot_stuffing() {
        assert_eq!(frame_data(b".hidden\r\n..\r\nok\r\n"), b"..hidden\r\n...\r\nok\r\n.\r\n");
    }

    #[test]
    fn test_frame_data_empty() {
        assert_eq!(frame_data(b""), b".\r\n");
    }
}
