//! Error types for SMTP submission.

use std::io;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while talking to a submission server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket failure, including the server closing the connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS handshake or record failure.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Host name not usable for certificate verification.
    #[error("invalid host name: {0}")]
    InvalidDnsName(String),

    /// The server answered with a non-success code.
    #[error("server replied {code}: {message}")]
    Rejected {
        /// Reply code, e.g. 535.
        code: u16,
        /// Reply text.
        message: String,
    },

    /// The reply could not be understood.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An envelope address was malformed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The server lacks something the caller asked for.
    #[error("server does not support {0}")]
    NotSupported(String),

    /// The message is larger than the advertised SIZE limit.
    #[error("message is {size} bytes, server accepts at most {limit}")]
    MessageTooLarge {
        /// Message size.
        size: usize,
        /// Advertised limit.
        limit: usize,
    },
}

impl Error {
    pub(crate) fn rejected(reply: &crate::types::Reply) -> Self {
        Self::Rejected {
            code: reply.code.as_u16(),
            message: reply.message_text(),
        }
    }

    /// True for a 4xx rejection, which may succeed on a later attempt.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 400 && *code < 500)
    }
}
