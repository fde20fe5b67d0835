//! MIME part tree.

use crate::charset::{DecodedText, decode_body_text};
use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::{decode_base64_lenient, decode_header_text, decode_quoted_printable};
use crate::header::{Headers, is_field_name};
use std::fmt;

/// Nesting limit for multipart and attached messages; deeper parts stay leaves.
const MAX_DEPTH: usize = 32;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// One node of a MIME part tree.
///
/// Leaves carry a body; multipart containers and attached messages carry
/// `children` parsed from their body.
#[derive(Debug, Clone, Default)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw bytes, still transfer-encoded).
    pub body: Vec<u8>,
    /// Child parts, in document order.
    pub children: Vec<Part>,
}

impl Part {
    /// Creates a leaf part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            body,
            children: Vec::new(),
        }
    }

    /// Parses raw bytes into a part tree.
    ///
    /// Never fails. A multipart without a usable boundary, or one whose body
    /// has no delimiter lines, is kept as a leaf. A missing close delimiter
    /// ends the last part at the end of input.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        Self::parse_at_depth(raw, 0)
    }

    fn parse_at_depth(raw: &[u8], depth: usize) -> Self {
        let (head, body) = split_head_body(raw);
        let mut part = Self::new(Headers::parse_bytes(head), body.to_vec());
        if depth >= MAX_DEPTH {
            return part;
        }

        let content_type = part.content_type();
        if content_type.is_multipart() {
            if let Some(boundary) = content_type.boundary() {
                part.children = split_multipart(&part.body, boundary)
                    .into_iter()
                    .map(|child| Self::parse_at_depth(child, depth + 1))
                    .collect();
            }
        } else if content_type.is("message", "rfc822") {
            let inner = part.decoded_body();
            if !inner.is_empty() {
                part.children = vec![Self::parse_at_depth(&inner, depth + 1)];
            }
        }

        part
    }

    /// Returns true if this part has child parts.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.children.is_empty()
    }

    /// Gets the content type, defaulting to `text/plain` when the header is
    /// absent or unparseable.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .and_then(|value| ContentType::parse(value).ok())
            .unwrap_or_default()
    }

    /// Gets the content disposition, if declared.
    #[must_use]
    pub fn content_disposition(&self) -> Option<ContentDisposition> {
        self.headers
            .get("content-disposition")
            .map(ContentDisposition::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Decodes the body according to the transfer encoding, leniently.
    #[must_use]
    pub fn decoded_body(&self) -> Vec<u8> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64_lenient(&self.body),
            TransferEncoding::QuotedPrintable => decode_quoted_printable(&self.body),
            _ => self.body.clone(),
        }
    }

    /// Gets the decoded body as text in the declared charset.
    ///
    /// Without a declared charset the body is read as UTF-8.
    #[must_use]
    pub fn body_text(&self) -> DecodedText {
        let declared = self
            .headers
            .get("content-type")
            .and_then(|value| ContentType::parse(value).ok());
        decode_body_text(
            &self.decoded_body(),
            declared.as_ref().and_then(ContentType::charset),
        )
    }

    /// Gets the attachment filename.
    ///
    /// Taken from the Content-Disposition `filename` parameter, else the
    /// Content-Type `name` parameter, with encoded words decoded.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        self.content_disposition()
            .and_then(|cd| cd.filename())
            .or_else(|| self.content_type().parameter("name"))
            .map(|name| decode_header_text(&name).into_text())
            .filter(|name| !name.is_empty())
    }

    /// Iterates over this part and all descendants, depth-first pre-order.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Depth-first pre-order iterator over a part tree.
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<&'a Part>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Part;

    fn next(&mut self) -> Option<Self::Item> {
        let part = self.stack.pop()?;
        self.stack.extend(part.children.iter().rev());
        Some(part)
    }
}

/// Splits raw bytes at the first empty line.
///
/// Input whose first line is not a header field is treated as all body.
fn split_head_body(raw: &[u8]) -> (&[u8], &[u8]) {
    let first_line = raw.split(|&b| b == b'\n').next().unwrap_or_default();
    let first_line = String::from_utf8_lossy(first_line);
    let first_line = first_line.trim_end();
    if !first_line.is_empty()
        && !first_line
            .split_once(':')
            .is_some_and(|(name, _)| is_field_name(name.trim()))
    {
        return (&[], raw);
    }

    let mut pos = 0;
    while pos < raw.len() {
        let line_end = raw[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(raw.len(), |i| pos + i);
        let line = &raw[pos..line_end];
        if line.is_empty() || line == b"\r" {
            let body_start = (line_end + 1).min(raw.len());
            return (&raw[..pos], &raw[body_start..]);
        }
        pos = line_end + 1;
    }

    (raw, &[])
}

/// Splits a multipart body on `--boundary` delimiter lines.
///
/// The preamble before the first delimiter and the epilogue after the
/// close delimiter are dropped. The line break before each delimiter
/// belongs to the delimiter.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut current_start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| pos + i);
        let line = body[pos..line_end].trim_ascii_end();

        if let Some(rest) = line.strip_prefix(delimiter.as_bytes()) {
            let closing = rest.starts_with(b"--");
            if closing || rest.is_empty() {
                if let Some(start) = current_start.take() {
                    parts.push(strip_trailing_newline(&body[start..pos]));
                }
                if closing {
                    return parts;
                }
                current_start = Some((line_end + 1).min(body.len()));
            }
        }
        pos = line_end + 1;
    }

    if let Some(start) = current_start {
        parts.push(&body[start..]);
    }
    parts
}

fn strip_trailing_newline(bytes: &[u8]) -> &[u8] {
    bytes
        .strip_suffix(b"\r\n")
        .or_else(|| bytes.strip_suffix(b"\n"))
        .unwrap_or(bytes)
}

/// A complete MIME message.
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Root of the part tree; its headers are the message headers.
    pub root: Part,
}

impl Message {
    /// Parses a raw message. Never fails.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        Self {
            root: Part::parse(raw),
        }
    }

    /// Message headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// Checks if this is a multipart message with at least one part.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.root.is_multipart()
    }

    /// Gets the decoded From header.
    #[must_use]
    pub fn from(&self) -> Option<DecodedText> {
        self.root.headers.get_decoded("from")
    }

    /// Gets the decoded To header.
    #[must_use]
    pub fn to(&self) -> Option<DecodedText> {
        self.root.headers.get_decoded("to")
    }

    /// Gets the decoded Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<DecodedText> {
        self.root.headers.get_decoded("subject")
    }

    /// Gets the raw Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.root.headers.get("date")
    }

    /// Iterates over every part, depth-first pre-order, root first.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        self.root.walk()
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
    use super::*;

    const NESTED: &[u8] = b"From: Alice <alice@example.com>\r\n\
Subject: Nested\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
This is the preamble.\r\n\
--outer\r\n\
Content-Type: multipart/alternative; boundary=inner\r\n\
\r\n\
--inner\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Hi</p>\r\n\
--inner\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Hi\r\n\
--inner--\r\n\
--outer\r\n\
Content-Type: application/pdf; name=report.pdf\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0=\r\n\
--outer--\r\n\
epilogue\r\n";

    fn kinds(message: &Message) -> Vec<String> {
        message
            .walk()
            .map(|part| {
                let ct = part.content_type();
                format!("{}/{}", ct.main_type, ct.sub_type)
            })
            .collect()
    }

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse(" BASE64 "), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("x-unknown"), TransferEncoding::SevenBit);
    }

    #[test]
    fn test_single_part() {
        let message = Message::parse(b"From: a@example.com\r\nSubject: Test\r\n\r\nHello, World!");
        assert!(!message.is_multipart());
        assert_eq!(message.from().unwrap().text, "a@example.com");
        assert_eq!(message.subject().unwrap().text, "Test");
        assert_eq!(message.root.body_text().text, "Hello, World!");
    }

    #[test]
    fn test_walk_is_depth_first_preorder() {
        let message = Message::parse(NESTED);
        assert!(message.is_multipart());
        assert_eq!(
            kinds(&message),
            vec![
                "multipart/mixed",
                "multipart/alternative",
                "text/html",
                "text/plain",
                "application/pdf",
            ]
        );
    }

    #[test]
    fn test_part_bodies_exclude_delimiter_line_breaks() {
        let message = Message::parse(NESTED);
        let bodies: Vec<Vec<u8>> = message
            .walk()
            .filter(|part| !part.is_multipart())
            .map(Part::decoded_body)
            .collect();
        assert_eq!(bodies[0], b"<p>Hi</p>");
        assert_eq!(bodies[1], b"Hi");
        assert_eq!(bodies[2], b"%PDF-");
    }

    #[test]
    fn test_filename_from_content_type_name() {
        let message = Message::parse(NESTED);
        let names: Vec<String> = message.walk().filter_map(Part::filename).collect();
        assert_eq!(names, vec!["report.pdf"]);
    }

    #[test]
    fn test_filename_prefers_disposition_and_decodes() {
        let part = Part::parse(
            b"Content-Type: text/plain; name=fallback.txt\r\n\
Content-Disposition: attachment; filename=\"=?utf-8?Q?r=C3=A9sum=C3=A9.txt?=\"\r\n\
\r\n\
body",
        );
        assert_eq!(part.filename().as_deref(), Some("résumé.txt"));
    }

    #[test]
    fn test_lf_line_endings_and_missing_close() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\n\n--b\nContent-Type: text/plain\n\nfirst\n--b\nContent-Type: text/plain\n\nsecond\n";
        let message = Message::parse(raw);
        let texts: Vec<String> = message
            .walk()
            .skip(1)
            .map(|part| part.body_text().text)
            .collect();
        assert_eq!(texts, vec!["first", "second\n"]);
    }

    #[test]
    fn test_multipart_without_boundary_is_leaf() {
        let message = Message::parse(b"Content-Type: multipart/mixed\r\n\r\nraw text");
        assert!(!message.is_multipart());
        assert_eq!(message.root.body, b"raw text");
    }

    #[test]
    fn test_multipart_without_delimiters_is_leaf() {
        let message = Message::parse(b"Content-Type: multipart/mixed; boundary=zz\r\n\r\nno parts here");
        assert!(!message.is_multipart());
    }

    #[test]
    fn test_quoted_printable_latin1_body() {
        let part = Part::parse(
            b"Content-Type: text/plain; charset=iso-8859-1\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
caf=E9 cr=E8me=\r\n br=FBl=E9e",
        );
        let text = part.body_text();
        assert_eq!(text.text, "café crème brûlée");
        assert!(!text.lossy);
    }

    #[test]
    fn test_headerless_input_is_body() {
        let part = Part::parse(b"just some text\nwith lines");
        assert!(part.headers.is_empty());
        assert_eq!(part.body, b"just some text\nwith lines");
    }

    #[test]
    fn test_attached_message_is_walked() {
        let raw = b"Content-Type: multipart/mixed; boundary=m\r\n\r\n\
--m\r\n\
Content-Type: message/rfc822\r\n\
\r\n\
Subject: inner\r\n\
Content-Type: text/plain\r\n\
\r\n\
inner body\r\n\
--m--\r\n";
        let message = Message::parse(raw);
        assert_eq!(
            kinds(&message),
            vec!["multipart/mixed", "message/rfc822", "text/plain"]
        );
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut raw = b"Content-Type: text/plain\r\n\r\nleaf".to_vec();
        for level in 0..40 {
            let mut wrapped = format!(
                "Content-Type: multipart/mixed; boundary=b{level}\r\n\r\n--b{level}\r\n"
            )
            .into_bytes();
            wrapped.extend_from_slice(&raw);
            wrapped.extend_from_slice(format!("\r\n--b{level}--\r\n").as_bytes());
            raw = wrapped;
        }
        let message = Message::parse(&raw);
        assert_eq!(message.walk().count(), MAX_DEPTH + 1);
    }
}
