//! Search filters and their IMAP rendering.

use chrono::NaiveDate;
use mailtap_imap::SearchCriteria;

/// Which messages the inbox listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Every message.
    #[default]
    All,
    /// Messages without `\Seen`.
    Unread,
}

impl StatusFilter {
    /// The matching SEARCH key.
    #[must_use]
    pub const fn criteria(self) -> SearchCriteria {
        match self {
            Self::All => SearchCriteria::All,
            Self::Unread => SearchCriteria::Unseen,
        }
    }
}

/// Structured search; present fields are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Substring of the From header.
    pub from: Option<String>,
    /// Substring of the Subject header.
    pub subject: Option<String>,
    /// Internal date on or after this day.
    pub since: Option<NaiveDate>,
    /// Substring anywhere in the message.
    pub text: Option<String>,
}

impl SearchQuery {
    /// True when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.from.is_none() && self.subject.is_none() && self.since.is_none() && self.text.is_none()
    }

    /// Keys in the order FROM, SUBJECT, SINCE, TEXT; `ALL` when empty.
    #[must_use]
    pub fn criteria(&self) -> SearchCriteria {
        let mut keys = Vec::new();
        if let Some(from) = &self.from {
            keys.push(SearchCriteria::From(from.clone()));
        }
        if let Some(subject) = &self.subject {
            keys.push(SearchCriteria::Subject(subject.clone()));
        }
        if let Some(since) = self.since {
            keys.push(SearchCriteria::Since(imap_date(since)));
        }
        if let Some(text) = &self.text {
            keys.push(SearchCriteria::Text(text.clone()));
        }
        SearchCriteria::all_of(keys)
    }
}

/// IMAP `date` form, e.g. `5-Mar-2024`.
#[must_use]
pub fn imap_date(date: NaiveDate) -> String {
    date.format("%-d-%b-%Y").to_string()
}

/// Parses the `DD-Mon-YYYY` form users type (`05-Mar-2024` or `5-mar-2024`).
///
/// # Errors
///
/// Returns a message naming the expected format.
pub fn parse_since(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%d-%b-%Y")
        .map_err(|_| format!("invalid date {input:?}, expected DD-Mon-YYYY such as 05-Mar-2024"))
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
    use mailtap_imap::Command;

    use super::*;

    fn wire(criteria: SearchCriteria) -> String {
        let bytes = Command::Search { criteria }.serialize("A1");
        String::from_utf8(bytes).unwrap().trim_end().to_string()
    }

    #[test]
    fn test_empty_query_is_all() {
        let query = SearchQuery::default();
        assert!(query.is_empty());
        assert_eq!(wire(query.criteria()), "A1 SEARCH ALL");
    }

    #[test]
    fn test_fixed_key_order() {
        let query = SearchQuery {
            text: Some("invoice".to_string()),
            since: NaiveDate::from_ymd_opt(2024, 3, 5),
            subject: Some("Re: q3".to_string()),
            from: Some("alice".to_string()),
        };
        assert_eq!(
            wire(query.criteria()),
            r#"A1 SEARCH FROM "alice" SUBJECT "Re: q3" SINCE 5-Mar-2024 TEXT "invoice""#
        );
    }

    #[test]
    fn test_single_key_always_quoted() {
        let query = SearchQuery {
            from: Some("bob".to_string()),
            ..SearchQuery::default()
        };
        assert_eq!(wire(query.criteria()), r#"A1 SEARCH FROM "bob""#);
    }

    #[test]
    fn test_status_filter() {
        assert_eq!(wire(StatusFilter::All.criteria()), "A1 SEARCH ALL");
        assert_eq!(wire(StatusFilter::Unread.criteria()), "A1 SEARCH UNSEEN");
    }

    #[test]
    fn test_parse_since() {
        let date = parse_since("05-Mar-2024").unwrap();
        assert_eq!(imap_date(date), "5-Mar-2024");
        assert_eq!(parse_since("5-mar-2024").unwrap(), date);
        assert!(parse_since("2024-03-05").is_err());
    }
}
