//! Command tags.

/// Produces sequential tags `A0000`, `A0001`, ...
///
/// Tags only need to be unique among outstanding commands, so the counter
/// wraps instead of failing.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    counter: u32,
    prefix: char,
}

impl TagGenerator {
    /// Creates a generator using `prefix`.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { counter: 0, prefix }
    }

    /// Returns the next tag.
    pub fn next(&mut self) -> String {
        let n = self.counter;
        self.counter = self.counter.wrapping_add(1);
        format!("{}{n:04}", self.prefix)
    }

    /// Number of tags handed out so far, modulo 2^32.
    #[must_use]
    pub const fn issued(&self) -> u32 {
        self.counter
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
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
    fn test_sequence() {
        let mut tags = TagGenerator::default();
        assert_eq!(tags.next(), "A0000");
        assert_eq!(tags.next(), "A0001");
        assert_eq!(tags.issued(), 2);
    }

    #[test]
    fn test_padding_grows() {
        let mut tags = TagGenerator::new('T');
        tags.counter = 9999;
        assert_eq!(tags.next(), "T9999");
        assert_eq!(tags.next(), "T10000");
    }

    #[test]
    fn test_wraps() {
        let mut tags = TagGenerator::default();
        tags.counter = u32::MAX;
        assert_eq!(tags.next(), format!("A{}", u32::MAX));
        assert_eq!(tags.next(), "A0000");
    }
}
