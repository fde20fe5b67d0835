//! Envelope addresses.

use crate::error::{Error, Result};

/// A bare `local@domain` address as used in `MAIL FROM` and `RCPT TO`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Validates and wraps an address.
    ///
    /// Surrounding whitespace and angle brackets are stripped, so
    /// `" <a@b.org> "` is accepted as `a@b.org`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] when the address is empty, lacks
    /// exactly one `@` with text on both sides, or contains characters that
    /// would break the command line.
    pub fn new(addr: impl AsRef<str>) -> Result<Self> {
        let addr = addr.as_ref().trim();
        let addr = addr
            .strip_prefix('<')
            .and_then(|a| a.strip_suffix('>'))
            .unwrap_or(addr);

        if addr.is_empty() {
            return Err(Error::InvalidAddress("address is empty".into()));
        }
        if addr.chars().any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>') {
            return Err(Error::InvalidAddress(format!("{addr}: illegal character")));
        }

        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress(format!("{addr}: missing @")));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(Error::InvalidAddress(format!(
                "{addr}: expected exactly one @ between local part and domain"
            )));
        }

        Ok(Self(addr.to_string()))
    }

    /// Returns the address text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
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

    #[test]
    fn test_valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
    }

    #[test]
    fn test_trims_and_unwraps_brackets() {
        let addr = Address::new("  <user@example.com> ").unwrap();
        assert_eq!(addr.to_string(), "user@example.com");
    }

    #[test]
    fn test_invalid_addresses() {
        for bad in [
            "",
            "   ",
            "userexample.com",
            "@example.com",
            "user@",
            "a@b@c",
            "user name@example.com",
            "user@example.com\r\nRCPT TO:<x@y>",
        ] {
            assert!(Address::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
