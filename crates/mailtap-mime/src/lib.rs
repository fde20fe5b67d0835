//! # mailtap-mime
//!
//! Lenient MIME parsing and text decoding for mailtap.
//!
//! Messages fetched from a mailbox server are mixed bags: headers carry
//! RFC 2047 encoded words in assorted charsets, bodies are wrapped in
//! base64 or quoted-printable, and multipart trees nest arbitrarily. This
//! crate turns that into readable text without ever failing on bad data.
//!
//! ## Features
//!
//! - **Part tree**: [`Part::parse`] builds a tree of parts from raw bytes,
//!   tolerating LF line endings, missing close delimiters and broken headers
//! - **Traversal**: [`Part::walk`] visits parts depth-first in document order
//! - **Text decoding**: [`decode_header_text`] and [`decode_body_text`] return
//!   a [`DecodedText`] that records whether replacement characters were used
//! - **Filenames**: RFC 2231 extended and continued parameters
//!
//! ## Quick Start
//!
//! ```
//! use mailtap_mime::Message;
//!
//! let raw = b"From: sender@example.com\r\n\
//!             Subject: =?utf-8?q?caf=C3=A9?=\r\n\
//!             Content-Type: text/plain; charset=utf-8\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw);
//! assert_eq!(message.subject().map(|s| s.text).as_deref(), Some("café"));
//! assert_eq!(message.root.body_text().text, "Hello, World!");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod charset;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use charset::{DecodedText, decode_body_text, decode_with_label};
pub use content_type::{ContentDisposition, ContentType};
pub use encoding::decode_header_text;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding, Walk};
