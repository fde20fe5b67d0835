//! Transports and the type-state client.

mod client;
mod stream;

pub use client::{
    Authenticated, Client, Connected, Data, MAX_REPLY_LINE, MailTransaction, RecipientAdded,
};
pub use stream::{SmtpTlsStream, connect, connect_tls, upgrade};

use std::collections::HashSet;

use crate::types::{AuthMechanism, Extension};

/// Server identity and EHLO extensions.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// First word of the greeting.
    pub hostname: String,
    /// Extensions from the latest EHLO.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// True if STARTTLS was advertised.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.extensions.contains(&Extension::StartTls)
    }

    /// True if SIZE was advertised, with or without a limit.
    #[must_use]
    pub fn supports_size(&self) -> bool {
        self.extensions
            .iter()
            .any(|ext| matches!(ext, Extension::Size(_)))
    }

    /// The advertised size limit, if any.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(limit) => *limit,
            _ => None,
        })
    }

    /// True if an AUTH line was advertised.
    #[must_use]
    pub fn advertises_auth(&self) -> bool {
        self.extensions
            .iter()
            .any(|ext| matches!(ext, Extension::Auth(_)))
    }

    /// Mechanisms from the AUTH line, empty when there is none.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }
}
