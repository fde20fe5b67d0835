//! # mailtap-imap
//!
//! A small IMAP4rev1 client for reading mail: log in, list folders, select
//! a mailbox, search and fetch.
//!
//! The connection is modelled with type states, so commands are only
//! callable in the protocol state that allows them:
//!
//! ```text
//! NotAuthenticated --login()--> Authenticated --select()--> Selected
//! ```
//!
//! A SELECT the server refuses yields [`SelectOutcome::Rejected`], which
//! carries the connection back in the `Authenticated` state.
//!
//! ## Example
//!
//! ```ignore
//! use mailtap_imap::{Client, SearchCriteria, SelectOutcome, connect_tls};
//!
//! # async fn run() -> mailtap_imap::Result<()> {
//! let stream = connect_tls("imap.example.com", 993).await?;
//! let client = Client::from_stream(stream).await?;
//! let client = client.login("me@example.com", "secret").await?;
//!
//! match client.select("INBOX").await? {
//!     SelectOutcome::Selected(mut client, status) => {
//!         println!("{} messages", status.exists);
//!         let unseen = client.search(&SearchCriteria::Unseen).await?;
//!         println!("{} unread", unseen.len());
//!         client.logout().await?;
//!     }
//!     SelectOutcome::Rejected(client, reason) => {
//!         eprintln!("cannot open INBOX: {reason}");
//!         client.logout().await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: command builders and serialization
//! - [`connection`]: TLS transport, framing and the type-state client
//! - [`parser`]: sans-I/O response parser
//! - [`types`]: flags, identifiers, mailbox data

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchAttribute, FetchItems, SearchCriteria, TagGenerator};
pub use connection::{
    Authed, Authenticated, Client, FramedStream, ImapStream, NotAuthenticated, SelectOutcome,
    Selected, connect_tls,
};
pub use error::{Error, Result};
pub use parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
pub use types::{
    Capability, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, MailboxStatus, ResponseCode,
    SeqNum, SequenceSet, Status, Tag, Uid, UidValidity,
};
