//! # mailtap-smtp
//!
//! A small SMTP submission client: greeting, EHLO, optional STARTTLS,
//! AUTH PLAIN, one or more transactions, QUIT.
//!
//! ## Example
//!
//! ```ignore
//! use mailtap_smtp::{Address, Client, connection::connect};
//!
//! # async fn run() -> mailtap_smtp::Result<()> {
//! let tcp = connect("smtp.example.com", 587).await?;
//! let client = Client::from_stream(tcp).await?.ehlo("localhost").await?;
//! let client = client.starttls("smtp.example.com", "localhost").await?;
//! let client = client.auth_plain("me@example.com", "password").await?;
//!
//! let me = Address::new("me@example.com")?;
//! let you = Address::new("you@example.com")?;
//! let message = b"Subject: hi\r\n\r\nHello\r\n";
//!
//! let client = client.mail_from(&me, Some(message.len())).await?;
//! let client = client.rcpt_to(&you).await?.data().await?;
//! client.send_message(message).await?.quit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## States
//!
//! ```text
//! Connected ── auth_plain ──▶ Authenticated ── mail_from ──▶ MailTransaction
//!                                  ▲                               │ rcpt_to
//!                                  │                               ▼
//!                                  └──── send_message ◀── Data ◀── RecipientAdded
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, ServerInfo,
    SmtpTlsStream,
};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
