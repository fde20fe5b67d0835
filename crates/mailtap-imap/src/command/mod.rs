//! Command builders.
//!
//! A [`Command`] knows how to serialize itself behind a tag; the client
//! owns the [`TagGenerator`] and writes the bytes. Arguments that cannot be
//! quoted go out as synchronizing literals, so a [`Wire`] may have to be
//! sent in several chunks.

mod serialize;
mod tag_generator;
mod types;

use crate::types::{Mailbox, SequenceSet};

pub use serialize::Wire;
pub use tag_generator::TagGenerator;
pub use types::{FetchAttribute, FetchItems, SearchCriteria};

use serialize::{write_astring, write_fetch_items, write_mailbox, write_search_criteria};

/// A client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `CAPABILITY`
    Capability,
    /// `NOOP`
    Noop,
    /// `LOGOUT`
    Logout,
    /// `LOGIN user pass`
    Login {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// `SELECT mailbox`
    Select {
        /// Mailbox to open read-write.
        mailbox: Mailbox,
    },
    /// `LIST reference pattern`
    List {
        /// Reference name.
        reference: String,
        /// Pattern with `*` / `%` wildcards.
        pattern: String,
    },
    /// `SEARCH criteria`
    Search {
        /// Keys to match.
        criteria: SearchCriteria,
    },
    /// `FETCH set items`
    Fetch {
        /// Messages to fetch.
        sequence: SequenceSet,
        /// Data items to return.
        items: FetchItems,
    },
}

impl Command {
    /// Serializes the command, including the trailing CRLF.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        self.encode(tag).into_bytes()
    }

    /// Serializes the command, keeping the literal boundaries.
    #[must_use]
    pub fn encode(&self, tag: &str) -> Wire {
        let mut buf = Wire::with_capacity(64);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),
            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }
            Self::Select { mailbox } => {
                buf.extend_from_slice(b"SELECT ");
                write_mailbox(&mut buf, mailbox);
            }
            Self::List { reference, pattern } => {
                buf.extend_from_slice(b"LIST ");
                write_astring(&mut buf, reference);
                buf.push(b' ');
                write_list_pattern(&mut buf, pattern);
            }
            Self::Search { criteria } => {
                buf.extend_from_slice(b"SEARCH ");
                if criteria.needs_utf8() {
                    buf.extend_from_slice(b"CHARSET UTF-8 ");
                }
                write_search_criteria(&mut buf, criteria);
            }
            Self::Fetch { sequence, items } => {
                buf.extend_from_slice(b"FETCH ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_fetch_items(&mut buf, items);
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns true if the serialized form carries a secret.
    #[must_use]
    pub const fn is_sensitive(&self) -> bool {
        matches!(self, Self::Login { .. })
    }
}

/// Wildcards are legal in list patterns, so a bare `*` or `%` stays bare.
fn write_list_pattern(buf: &mut Wire, pattern: &str) {
    if !pattern.is_empty()
        && pattern
            .bytes()
            .all(|b| b.is_ascii_graphic() && !matches!(b, b'"' | b'\\' | b'(' | b')' | b'{'))
    {
        buf.extend_from_slice(pattern.as_bytes());
    } else {
        write_astring(buf, pattern);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn wire(cmd: &Command) -> String {
        String::from_utf8(cmd.serialize("A0001")).unwrap()
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(wire(&Command::Capability), "A0001 CAPABILITY\r\n");
        assert_eq!(wire(&Command::Logout), "A0001 LOGOUT\r\n");
        assert_eq!(wire(&Command::Noop), "A0001 NOOP\r\n");
    }

    #[test]
    fn test_login_quotes_when_needed() {
        let cmd = Command::Login {
            username: "me@example.com".to_string(),
            password: "pa ss\"w\\d".to_string(),
        };
        assert_eq!(wire(&cmd), "A0001 LOGIN me@example.com \"pa ss\\\"w\\\\d\"\r\n");
        assert!(cmd.is_sensitive());
    }

    #[test]
    fn test_select() {
        let cmd = Command::Select {
            mailbox: Mailbox::inbox(),
        };
        assert_eq!(wire(&cmd), "A0001 SELECT INBOX\r\n");
        let cmd = Command::Select {
            mailbox: Mailbox::new("[Gmail]/Sent Mail"),
        };
        assert_eq!(wire(&cmd), "A0001 SELECT \"[Gmail]/Sent Mail\"\r\n");
    }

    #[test]
    fn test_list() {
        let cmd = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
        };
        assert_eq!(wire(&cmd), "A0001 LIST \"\" *\r\n");
    }

    #[test]
    fn test_search_always_quotes_text() {
        let cmd = Command::Search {
            criteria: SearchCriteria::all_of(vec![
                SearchCriteria::From("alice".to_string()),
                SearchCriteria::Subject("weekly report".to_string()),
                SearchCriteria::Since("1-Feb-2024".to_string()),
                SearchCriteria::Text("a\"b".to_string()),
            ]),
        };
        assert_eq!(
            wire(&cmd),
            "A0001 SEARCH FROM \"alice\" SUBJECT \"weekly report\" SINCE 1-Feb-2024 TEXT \"a\\\"b\"\r\n"
        );
    }

    #[test]
    fn test_search_empty_is_all() {
        let cmd = Command::Search {
            criteria: SearchCriteria::all_of(vec![]),
        };
        assert_eq!(wire(&cmd), "A0001 SEARCH ALL\r\n");
        let cmd = Command::Search {
            criteria: SearchCriteria::all_of(vec![SearchCriteria::Unseen]),
        };
        assert_eq!(wire(&cmd), "A0001 SEARCH UNSEEN\r\n");
    }

    #[test]
    fn test_search_non_ascii_is_literal_with_charset() {
        let cmd = Command::Search {
            criteria: SearchCriteria::Subject("café".to_string()),
        };
        assert_eq!(wire(&cmd), "A0001 SEARCH CHARSET UTF-8 SUBJECT {5}\r\ncafé\r\n");
        assert_eq!(cmd.encode("A0001").chunks().count(), 2);
    }

    #[test]
    fn test_line_breaks_go_out_as_literal() {
        let cmd = Command::Search {
            criteria: SearchCriteria::Subject("x\"\r\nA9 DELETE INBOX".to_string()),
        };
        let wire = cmd.encode("A1");
        let chunks: Vec<&[u8]> = wire.chunks().collect();
        assert_eq!(
            chunks,
            vec![
                &b"A1 SEARCH SUBJECT {19}\r\n"[..],
                &b"x\"\r\nA9 DELETE INBOX\r\n"[..],
            ]
        );
        assert_eq!(chunks.concat(), cmd.serialize("A1"));
    }

    #[test]
    fn test_login_literals() {
        let cmd = Command::Login {
            username: "me@example.com".to_string(),
            password: "pa\r\nss".to_string(),
        };
        let wire = cmd.encode("A0001");
        assert_eq!(wire.chunks().count(), 2);
        assert_eq!(wire.into_bytes(), b"A0001 LOGIN me@example.com {6}\r\npa\r\nss\r\n");

        let plain = Command::Login {
            username: "me".to_string(),
            password: "secret".to_string(),
        };
        assert_eq!(plain.encode("A0001").chunks().count(), 1);
    }

    #[test]
    fn test_fetch_headers() {
        let cmd = Command::Fetch {
            sequence: SequenceSet::single(7).unwrap(),
            items: FetchItems::Items(vec![
                FetchAttribute::Flags,
                FetchAttribute::header_fields(&["FROM", "TO", "SUBJECT", "DATE"]),
            ]),
        };
        assert_eq!(
            wire(&cmd),
            "A0001 FETCH 7 (FLAGS BODY.PEEK[HEADER.FIELDS (FROM TO SUBJECT DATE)])\r\n"
        );
    }

    #[test]
    fn test_fetch_single_item_is_bare() {
        let cmd = Command::Fetch {
            sequence: SequenceSet::single(12).unwrap(),
            items: FetchAttribute::Rfc822.into(),
        };
        assert_eq!(wire(&cmd), "A0001 FETCH 12 RFC822\r\n");
        let cmd = Command::Fetch {
            sequence: SequenceSet::single(5).unwrap(),
            items: FetchItems::Fast,
        };
        assert_eq!(wire(&cmd), "A0001 FETCH 5 FAST\r\n");
    }
}
