//! Mailbox types.

use super::{Flags, SeqNum, Uid, UidValidity};

/// Mailbox name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(pub String);

impl Mailbox {
    /// Creates a new mailbox name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The INBOX mailbox (case-insensitive per RFC).
    #[must_use]
    pub fn inbox() -> Self {
        Self("INBOX".to_string())
    }

    /// Returns the mailbox name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mailbox status information from SELECT/EXAMINE.
#[derive(Debug, Clone, Default)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// First unseen message sequence number.
    pub unseen: Option<SeqNum>,
    /// Next UID to be assigned.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY value.
    pub uid_validity: Option<UidValidity>,
    /// Flags defined for this mailbox.
    pub flags: Flags,
    /// Whether mailbox is read-only.
    pub read_only: bool,
}

/// LIST response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponse {
    /// Mailbox attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter.
    pub delimiter: Option<char>,
    /// Mailbox name.
    pub mailbox: Mailbox,
}

/// Renders the entry the way the server sent it:
/// `(\HasNoChildren) "/" INBOX`.
impl std::fmt::Display for ListResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let attributes: Vec<&str> = self.attributes.iter().map(MailboxAttribute::as_str).collect();
        write!(f, "({}) ", attributes.join(" "))?;
        match self.delimiter {
            Some('"') => write!(f, "\"\\\"\"")?,
            Some('\\') => write!(f, "\"\\\\\"")?,
            Some(delimiter) => write!(f, "\"{delimiter}\"")?,
            None => write!(f, "NIL")?,
        }
        let name = self.mailbox.as_str();
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_graphic() && !"(){%*\"\\]".contains(c)) {
            write!(f, " {name}")
        } else {
            write!(f, " \"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
        }
    }
}

/// Mailbox attributes from LIST response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// Mailbox cannot be selected.
    NoSelect,
    /// Mailbox cannot have children.
    NoInferiors,
    /// Mailbox has no children.
    HasNoChildren,
    /// Mailbox has children.
    HasChildren,
    /// Mailbox is marked for attention.
    Marked,
    /// Mailbox is not marked.
    Unmarked,
    /// All messages (virtual mailbox).
    All,
    /// Mailbox is the archive folder.
    Archive,
    /// Mailbox is the drafts folder.
    Drafts,
    /// Flagged/starred messages (virtual mailbox).
    Flagged,
    /// Mailbox is the junk/spam folder.
    Junk,
    /// Mailbox is the sent folder.
    Sent,
    /// Mailbox is the trash folder.
    Trash,
    /// Unknown attribute, kept verbatim.
    Unknown(String),
}

impl MailboxAttribute {
    /// Parses a mailbox attribute string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "\\NOSELECT" => Self::NoSelect,
            "\\NOINFERIORS" => Self::NoInferiors,
            "\\HASNOCHILDREN" => Self::HasNoChildren,
            "\\HASCHILDREN" => Self::HasChildren,
            "\\MARKED" => Self::Marked,
            "\\UNMARKED" => Self::Unmarked,
            // RFC 6154 SPECIAL-USE
            "\\ALL" => Self::All,
            "\\ARCHIVE" => Self::Archive,
            "\\DRAFTS" => Self::Drafts,
            "\\FLAGGED" => Self::Flagged,
            "\\JUNK" => Self::Junk,
            "\\SENT" => Self::Sent,
            "\\TRASH" => Self::Trash,
            _ => Self::Unknown(s.to_string()),
        }
    }

    /// Returns the attribute as an IMAP string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoSelect => "\\Noselect",
            Self::NoInferiors => "\\Noinferiors",
            Self::HasNoChildren => "\\HasNoChildren",
            Self::HasChildren => "\\HasChildren",
            Self::Marked => "\\Marked",
            Self::Unmarked => "\\Unmarked",
            Self::All => "\\All",
            Self::Archive => "\\Archive",
            Self::Drafts => "\\Drafts",
            Self::Flagged => "\\Flagged",
            Self::Junk => "\\Junk",
            Self::Sent => "\\Sent",
            Self::Trash => "\\Trash",
            Self::Unknown(s) => s,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(attributes: &[&str], delimiter: Option<char>, name: &str) -> ListResponse {
        ListResponse {
            attributes: attributes.iter().map(|a| MailboxAttribute::parse(a)).collect(),
            delimiter,
            mailbox: Mailbox::new(name),
        }
    }

    #[test]
    fn mailbox_basics() {
        assert_eq!(Mailbox::inbox().as_str(), "INBOX");
        assert_eq!(format!("{}", Mailbox::new("Sent")), "Sent");
    }

    #[test]
    fn mailbox_status_default() {
        let status = MailboxStatus::default();
        assert_eq!(status.exists, 0);
        assert!(status.unseen.is_none());
        assert!(status.flags.is_empty());
        assert!(!status.read_only);
    }

    #[test]
    fn list_display_plain_name() {
        let list = entry(&["\\HasNoChildren"], Some('/'), "INBOX");
        assert_eq!(list.to_string(), "(\\HasNoChildren) \"/\" INBOX");
    }

    #[test]
    fn list_display_quotes_names_with_spaces() {
        let list = entry(&["\\HasNoChildren", "\\Sent"], Some('.'), "Sent Items");
        assert_eq!(list.to_string(), "(\\HasNoChildren \\Sent) \".\" \"Sent Items\"");
    }

    #[test]
    fn list_display_nil_delimiter() {
        let list = entry(&[], None, "Archive");
        assert_eq!(list.to_string(), "() NIL Archive");
    }

    #[test]
    fn list_display_gmail_folder() {
        let list = entry(&["\\Noselect", "\\HasChildren"], Some('/'), "[Gmail]");
        assert_eq!(list.to_string(), "(\\Noselect \\HasChildren) \"/\" \"[Gmail]\"");
    }
}
