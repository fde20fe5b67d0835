//! Arguments of FETCH and SEARCH.

/// What a FETCH should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItems {
    /// `FAST` macro: FLAGS INTERNALDATE RFC822.SIZE.
    Fast,
    /// Explicit attribute list.
    Items(Vec<FetchAttribute>),
}

impl From<FetchAttribute> for FetchItems {
    fn from(attr: FetchAttribute) -> Self {
        Self::Items(vec![attr])
    }
}

/// A single FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// `FLAGS`
    Flags,
    /// `INTERNALDATE`
    InternalDate,
    /// `RFC822.SIZE`
    Rfc822Size,
    /// `UID`
    Uid,
    /// `RFC822`, the whole message. Sets `\Seen`.
    Rfc822,
    /// `BODY[section]` or `BODY.PEEK[section]`.
    Body {
        /// Section specifier, e.g. `HEADER.FIELDS (FROM SUBJECT)`.
        section: Option<String>,
        /// Use `BODY.PEEK` so `\Seen` is left alone.
        peek: bool,
    },
}

impl FetchAttribute {
    /// `BODY.PEEK[HEADER.FIELDS (...)]` for the given field names.
    #[must_use]
    pub fn header_fields(fields: &[&str]) -> Self {
        Self::Body {
            section: Some(format!("HEADER.FIELDS ({})", fields.join(" "))),
            peek: true,
        }
    }
}

/// SEARCH keys. A list of keys is an implicit AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// Every message.
    All,
    /// Messages without `\Seen`.
    Unseen,
    /// Messages with `\Seen`.
    Seen,
    /// From header contains the text.
    From(String),
    /// To header contains the text.
    To(String),
    /// Subject header contains the text.
    Subject(String),
    /// Header or body contains the text.
    Text(String),
    /// Internal date on or after an IMAP date such as `1-Feb-2024`.
    Since(String),
    /// Messages matching every key.
    And(Vec<Self>),
}

impl SearchCriteria {
    /// Returns true if any text argument is outside ASCII.
    #[must_use]
    pub fn needs_utf8(&self) -> bool {
        match self {
            Self::From(s) | Self::To(s) | Self::Subject(s) | Self::Text(s) => !s.is_ascii(),
            Self::And(keys) => keys.iter().any(Self::needs_utf8),
            Self::All | Self::Unseen | Self::Seen | Self::Since(_) => false,
        }
    }

    /// Combines keys; an empty list matches everything.
    #[must_use]
    pub fn all_of(keys: Vec<Self>) -> Self {
        match keys.len() {
            0 => Self::All,
            1 => keys.into_iter().next().unwrap_or(Self::All),
            _ => Self::And(keys),
        }
    }
}
