//! Server capabilities and tagged status.

/// Response status from a tagged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// Server capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051)
    Imap4Rev2,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
    /// Unknown capability
    Unknown(String),
}

impl Capability {
    /// Parses one capability atom; matching is case-insensitive.
    #[must_use]
    pub fn parse(atom: &str) -> Self {
        if let Some(mechanism) = atom
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("AUTH="))
            .and_then(|_| atom.get(5..))
        {
            return Self::Auth(mechanism.to_ascii_uppercase());
        }

        [
            ("IMAP4REV1", Self::Imap4Rev1),
            ("IMAP4REV2", Self::Imap4Rev2),
            ("STARTTLS", Self::StartTls),
            ("LOGINDISABLED", Self::LoginDisabled),
        ]
        .into_iter()
        .find(|(name, _)| atom.eq_ignore_ascii_case(name))
        .map_or_else(|| Self::Unknown(atom.to_string()), |(_, known)| known)
    }

    /// True for `AUTH=<mechanism>`, compared case-insensitively.
    #[must_use]
    pub fn is_auth(&self, mechanism: &str) -> bool {
        matches!(self, Self::Auth(m) if m.eq_ignore_ascii_case(mechanism))
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => f.write_str("IMAP4rev1"),
            Self::Imap4Rev2 => f.write_str("IMAP4rev2"),
            Self::StartTls => f.write_str("STARTTLS"),
            Self::LoginDisabled => f.write_str("LOGINDISABLED"),
            Self::Auth(mechanism) => write!(f, "AUTH={mechanism}"),
            Self::Unknown(atom) => f.write_str(atom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok() {
        assert!(Status::Ok.is_ok());
        assert!(Status::PreAuth.is_ok());
        assert!(!Status::No.is_ok());
        assert!(!Status::Bad.is_ok());
        assert!(!Status::Bye.is_ok());
    }

    #[test]
    fn capability_display_round_trip() {
        for raw in ["IMAP4rev1", "STARTTLS", "AUTH=XOAUTH2", "IDLE"] {
            assert_eq!(Capability::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn auth_mechanism_case_and_short_atoms() {
        let plain = Capability::parse("auth=plain");
        assert_eq!(plain, Capability::Auth("PLAIN".to_string()));
        assert!(plain.is_auth("Plain"));
        assert!(!plain.is_auth("LOGIN"));
        assert_eq!(Capability::parse("AUTH"), Capability::Unknown("AUTH".to_string()));
        assert_eq!(Capability::parse("logindisabled"), Capability::LoginDisabled);
        assert_eq!(Capability::parse("AUTHé"), Capability::Unknown("AUTHé".to_string()));
    }
}
