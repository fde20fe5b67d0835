//! Message flags.

/// A flag from a FLAGS item or PERMANENTFLAGS code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Message has been read.
    Seen,
    /// Message has been answered.
    Answered,
    /// Message is flagged for special attention.
    Flagged,
    /// Message is marked for deletion.
    Deleted,
    /// Message is a draft.
    Draft,
    /// Message is recent (first session to see it).
    Recent,
    /// Custom keyword flag, or `\*` in PERMANENTFLAGS.
    Keyword(String),
}

/// System flags and their wire spelling.
static SYSTEM_FLAGS: [(Flag, &str); 6] = [
    (Flag::Seen, "\\Seen"),
    (Flag::Answered, "\\Answered"),
    (Flag::Flagged, "\\Flagged"),
    (Flag::Deleted, "\\Deleted"),
    (Flag::Draft, "\\Draft"),
    (Flag::Recent, "\\Recent"),
];

impl Flag {
    /// Parses a flag atom. System flags match case-insensitively; anything
    /// else is kept verbatim as a keyword.
    #[must_use]
    pub fn parse(atom: &str) -> Self {
        SYSTEM_FLAGS
            .iter()
            .find(|(_, wire)| wire.eq_ignore_ascii_case(atom))
            .map_or_else(|| Self::Keyword(atom.to_string()), |(flag, _)| flag.clone())
    }

    /// Wire spelling, e.g. `\Seen`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Keyword(keyword) => keyword,
            system => SYSTEM_FLAGS
                .iter()
                .find(|(flag, _)| flag == system)
                .map_or("", |(_, wire)| *wire),
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection of message flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    flags: Vec<Flag>,
}

impl Flags {
    /// Creates an empty flags collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects `flags`, keeping the first occurrence of each.
    #[must_use]
    pub fn from_vec(flags: Vec<Flag>) -> Self {
        flags.into_iter().fold(Self::new(), |mut set, flag| {
            set.insert(flag);
            set
        })
    }

    /// Adds a flag.
    pub fn insert(&mut self, flag: Flag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }

    /// Returns true if the flag is present.
    #[must_use]
    pub fn contains(&self, flag: &Flag) -> bool {
        self.flags.contains(flag)
    }

    /// Returns true if the message has been seen.
    #[must_use]
    pub fn is_seen(&self) -> bool {
        self.contains(&Flag::Seen)
    }

    /// Returns an iterator over the flags.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    /// Returns the number of flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Returns true if there are no flags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut set = Self::new();
        iter.into_iter().for_each(|flag| set.insert(flag));
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Flag::parse("\\Seen"), Flag::Seen);
        assert_eq!(Flag::parse("\\SEEN"), Flag::Seen);
        assert_eq!(Flag::parse("\\seen"), Flag::Seen);
        assert_eq!(Flag::parse("\\Recent"), Flag::Recent);
    }

    #[test]
    fn parse_keyword() {
        assert_eq!(Flag::parse("$Important"), Flag::Keyword("$Important".to_string()));
        assert_eq!(Flag::parse("\\*"), Flag::Keyword("\\*".to_string()));
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Flag::Seen), "\\Seen");
        assert_eq!(format!("{}", Flag::Keyword("Test".to_string())), "Test");
    }

    #[test]
    fn from_vec_dedups() {
        let flags = Flags::from_vec(vec![Flag::Seen, Flag::Answered, Flag::Seen]);
        assert_eq!(flags.len(), 2);
        assert!(flags.is_seen());
        assert!(flags.contains(&Flag::Answered));
    }

    #[test]
    fn collect_and_iter() {
        let flags: Flags = [Flag::Draft, Flag::Flagged].into_iter().collect();
        assert_eq!(flags.iter().count(), 2);
        assert!(!flags.is_seen());
        assert!(!Flags::default().is_seen());
    }
}
