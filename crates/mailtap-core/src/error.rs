//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced to the command line.
///
/// A missing message is not an error; see [`crate::ReadOutcome`].
#[derive(Debug, Error)]
pub enum Error {
    /// No credential file exists at any searched location.
    #[error("credentials not found (searched: {})", display_paths(.searched))]
    ConfigMissing {
        /// Locations tried, in order.
        searched: Vec<PathBuf>,
    },

    /// A credential file exists but cannot be used.
    #[error("credentials file {} is unusable: {reason}", .path.display())]
    ConfigInvalid {
        /// The offending file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// The server refused the login.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network, DNS, TLS or greeting failure before login completed.
    #[error("connection failed: {0}")]
    Connect(String),

    /// SELECT was refused.
    #[error("folder {folder} not available: {reason}")]
    FolderNotFound {
        /// Requested folder.
        folder: String,
        /// Server text.
        reason: String,
    },

    /// The session broke or the server misbehaved after login.
    #[error("IMAP error: {0}")]
    Protocol(String),

    /// Submission failed at any step.
    #[error("send failed: {0}")]
    Send(String),
}

impl From<mailtap_imap::Error> for Error {
    fn from(err: mailtap_imap::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

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

    #[test]
    fn test_config_missing_lists_paths() {
        let err = Error::ConfigMissing {
            searched: vec![PathBuf::from("a/email.json"), PathBuf::from("/b/email.json")],
        };
        assert_eq!(
            err.to_string(),
            "credentials not found (searched: a/email.json, /b/email.json)"
        );
    }

    #[test]
    fn test_imap_errors_become_protocol() {
        let err: Error = mailtap_imap::Error::Bye("shutting down".to_string()).into();
        assert!(matches!(err, Error::Protocol(ref m) if m.contains("shutting down")));
    }
}
