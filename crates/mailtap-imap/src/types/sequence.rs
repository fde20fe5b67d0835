//! Message sets for FETCH.

use super::SeqNum;

/// The messages a FETCH addresses. Only single messages are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceSet(SeqNum);

impl SequenceSet {
    /// Creates a set holding message `n`; `None` for 0.
    #[must_use]
    pub fn single(n: u32) -> Option<Self> {
        SeqNum::new(n).map(Self)
    }
}

impl From<SeqNum> for SequenceSet {
    fn from(seq: SeqNum) -> Self {
        Self(seq)
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
