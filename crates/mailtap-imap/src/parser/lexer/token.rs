//! Tokens produced by the response lexer.

/// A single lexical unit of a server response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Bare atom, including flag names such as `\Seen`.
    Atom(&'a str),
    /// Quoted string with escapes resolved.
    QuotedString(String),
    /// Literal payload announced by a `{n}` prefix.
    Literal(Vec<u8>),
    /// Unsigned number.
    Number(u32),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// Single space.
    Space,
    /// `*`, the untagged prefix.
    Asterisk,
    /// `+`, the continuation prefix.
    Plus,
    /// `NIL` in any case.
    Nil,
    /// Line terminator.
    Crlf,
    /// End of input.
    Eof,
}

impl Token<'_> {
    /// Returns true for tokens that end a response line.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Crlf | Self::Eof)
    }
}
