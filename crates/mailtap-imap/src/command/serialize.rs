//! Wire encoding of command arguments.

use crate::types::Mailbox;

use super::types::{FetchAttribute, FetchItems, SearchCriteria};

/// Serialized command bytes.
///
/// Each `{n}` literal announcement ends a chunk; the server has to answer
/// with a continuation before the next chunk goes out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wire {
    bytes: Vec<u8>,
    breaks: Vec<usize>,
}

impl Wire {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            breaks: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, b: u8) {
        self.bytes.push(b);
    }

    pub(crate) fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Consumes the buffer, returning all bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Pieces to send, each after a continuation except the first.
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        let ends = self.breaks.iter().copied().chain([self.bytes.len()]);
        ends.scan(0, |start, end| {
            let chunk = &self.bytes[*start..end];
            *start = end;
            Some(chunk)
        })
    }

    fn write_literal(&mut self, s: &str) {
        self.extend_from_slice(format!("{{{}}}\r\n", s.len()).as_bytes());
        self.breaks.push(self.bytes.len());
        self.extend_from_slice(s.as_bytes());
    }
}

/// Writes an astring: bare when it is a plain atom, otherwise quoted, or a
/// literal when the text cannot be quoted.
pub fn write_astring(buf: &mut Wire, s: &str) {
    if s.bytes().any(needs_literal) {
        buf.write_literal(s);
    } else if s.is_empty() || s.bytes().any(needs_quoting) {
        write_quoted(buf, s);
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Writes a quoted string, escaping `"` and `\`.
///
/// Callers route text with line breaks or 8-bit bytes to a literal first.
fn write_quoted(buf: &mut Wire, s: &str) {
    buf.push(b'"');
    for b in s.bytes() {
        if b == b'"' || b == b'\\' {
            buf.push(b'\\');
        }
        buf.push(b);
    }
    buf.push(b'"');
}

/// Writes a mailbox name.
pub fn write_mailbox(buf: &mut Wire, mailbox: &Mailbox) {
    write_astring(buf, mailbox.as_str());
}

/// Bytes a quoted string may not carry.
const fn needs_literal(b: u8) -> bool {
    matches!(b, b'\0' | b'\r' | b'\n') || b >= 0x80
}

const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'}' | b'%' | b'*' | b'[' | b']'
    ) || b < 0x20
        || b >= 0x7F
}

/// Writes FETCH items; a single attribute goes out bare.
pub fn write_fetch_items(buf: &mut Wire, items: &FetchItems) {
    match items {
        FetchItems::Fast => buf.extend_from_slice(b"FAST"),
        FetchItems::Items(attrs) => match attrs.as_slice() {
            [single] => write_fetch_attribute(buf, single),
            attrs => {
                buf.push(b'(');
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    write_fetch_attribute(buf, attr);
                }
                buf.push(b')');
            }
        },
    }
}

fn write_fetch_attribute(buf: &mut Wire, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags => buf.extend_from_slice(b"FLAGS"),
        FetchAttribute::InternalDate => buf.extend_from_slice(b"INTERNALDATE"),
        FetchAttribute::Rfc822Size => buf.extend_from_slice(b"RFC822.SIZE"),
        FetchAttribute::Uid => buf.extend_from_slice(b"UID"),
        FetchAttribute::Rfc822 => buf.extend_from_slice(b"RFC822"),
        FetchAttribute::Body { section, peek } => {
            let prefix: &[u8] = if *peek { b"BODY.PEEK[" } else { b"BODY[" };
            buf.extend_from_slice(prefix);
            if let Some(s) = section {
                buf.extend_from_slice(s.as_bytes());
            }
            buf.push(b']');
        }
    }
}

/// Writes SEARCH keys. User text is never sent as a bare atom.
pub fn write_search_criteria(buf: &mut Wire, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::All => buf.extend_from_slice(b"ALL"),
        SearchCriteria::Unseen => buf.extend_from_slice(b"UNSEEN"),
        SearchCriteria::Seen => buf.extend_from_slice(b"SEEN"),
        SearchCriteria::From(s) => write_text_key(buf, "FROM", s),
        SearchCriteria::To(s) => write_text_key(buf, "TO", s),
        SearchCriteria::Subject(s) => write_text_key(buf, "SUBJECT", s),
        SearchCriteria::Text(s) => write_text_key(buf, "TEXT", s),
        SearchCriteria::Since(date) => {
            buf.extend_from_slice(b"SINCE ");
            buf.extend_from_slice(date.as_bytes());
        }
        SearchCriteria::And(keys) => {
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                write_search_criteria(buf, key);
            }
        }
    }
}

fn write_text_key(buf: &mut Wire, keyword: &str, text: &str) {
    buf.extend_from_slice(keyword.as_bytes());
    buf.push(b' ');
    if text.bytes().any(needs_literal) {
        buf.write_literal(text);
    } else {
        write_quoted(buf, text);
    }
}
