//! Error types for the IMAP client.

use thiserror::Error;

/// Errors raised while talking to an IMAP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Network I/O failed or the connection closed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or record error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Host name not usable for TLS verification.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A response did not match the grammar.
    #[error("Protocol error at position {position}: {message}")]
    Parse {
        /// Byte offset of the failure.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// Login was refused before it was attempted.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Tagged `NO`.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Tagged `BAD`.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// The server is closing the connection.
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// Framing limits exceeded or a required response is missing.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Returns true for a tagged `NO` or `BAD` completion.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::No(_) | Self::Bad(_))
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
