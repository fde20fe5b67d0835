//! # mailtap-core
//!
//! Everything the `mailtap` binary does between argument parsing and
//! printing:
//!
//! - [`credentials`]: locating and validating the JSON credential record
//! - [`MailboxSession`] and [`run_scoped`]: one logged-in IMAP connection
//!   per command, always logged out
//! - [`ops`]: listing, search, read, count and folder listing
//! - [`model`]: header decoding, lenient dates and body selection
//! - [`send`]: building a plain-text message and submitting it over SMTP
//!
//! ```ignore
//! use mailtap_core::{MailboxSession, StatusFilter, credentials, ops, run_scoped};
//!
//! let record = credentials::load(None)?;
//! let session = MailboxSession::connect(&record).await?;
//! let listing = run_scoped(session, async |s| ops::list_recent(s, StatusFilter::Unread, 10).await).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod credentials;
mod error;
pub mod model;
pub mod ops;
pub mod query;
pub mod send;
pub mod session;

pub use credentials::{CredentialRecord, Endpoint, Security, SmtpEndpoint};
pub use error::{Error, Result};
pub use model::{
    BodyKind, DateField, FullMessage, MessageBody, MessageEnvelope, MessageHeaders,
    NO_READABLE_BODY,
};
pub use ops::{INBOX, Listing, MessageCount, ReadOutcome};
pub use query::{SearchQuery, StatusFilter, parse_since};
pub use send::OutgoingMessage;
pub use session::{HeaderFetch, MailboxSession, run_scoped};
