//! Tokenizer for server response lines.
//!
//! The lexer works on a complete response (as assembled by the framed
//! reader, literals included) and never performs I/O. It is deliberately
//! forgiving: quoted strings are decoded lossily and unknown escapes are
//! kept verbatim, because real servers do not always follow the grammar.

#![allow(clippy::missing_errors_doc)]

mod token;

pub use token::Token;

use crate::{Error, Result};

/// Cursor over a response buffer.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer positioned at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current byte offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Unconsumed input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Returns true once every byte has been consumed.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Looks at the current byte.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Looks `offset` bytes ahead.
    #[must_use]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Consumes one byte.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consumes up to `n` bytes.
    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Produces the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        let single = match byte {
            b' ' => Some(Token::Space),
            b'(' => Some(Token::LParen),
            b')' => Some(Token::RParen),
            b'[' => Some(Token::LBracket),
            b']' => Some(Token::RBracket),
            b'*' => Some(Token::Asterisk),
            b'+' => Some(Token::Plus),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        match byte {
            b'\r' if self.peek_at(1) == Some(b'\n') => {
                self.skip(2);
                Ok(Token::Crlf)
            }
            b'\n' => {
                // Bare LF from a sloppy server still ends the line.
                self.advance();
                Ok(Token::Crlf)
            }
            b'"' => Ok(self.read_quoted_string()),
            b'{' => self.read_literal(),
            b'0'..=b'9' => self.read_number_or_atom(),
            _ if is_atom_char(byte) => self.read_atom(),
            _ => Err(self.error(&format!("unexpected byte {byte:#04x}"))),
        }
    }

    fn read_quoted_string(&mut self) -> Token<'a> {
        self.advance();

        let mut raw = Vec::new();
        while let Some(b) = self.advance() {
            match b {
                b'"' => break,
                b'\\' => match self.advance() {
                    Some(c @ (b'"' | b'\\')) => raw.push(c),
                    Some(c) => raw.extend_from_slice(&[b'\\', c]),
                    None => raw.push(b'\\'),
                },
                _ => raw.push(b),
            }
        }

        Token::QuotedString(String::from_utf8_lossy(&raw).into_owned())
    }

    fn read_literal(&mut self) -> Result<Token<'a>> {
        self.advance();

        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }
        let digits = &self.input[start..self.pos];

        // LITERAL+ / LITERAL- marker
        if self.peek() == Some(b'+') || self.peek() == Some(b'-') {
            self.advance();
        }
        if self.advance() != Some(b'}') {
            return Err(self.error("malformed literal prefix"));
        }

        let size: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.error("invalid literal size"))?;

        match (self.peek(), self.peek_at(1)) {
            (Some(b'\r'), Some(b'\n')) => self.skip(2),
            (Some(b'\n'), _) => self.skip(1),
            _ => return Err(self.error("expected line break after literal size")),
        }

        let end = match self.pos.checked_add(size) {
            Some(end) if end <= self.input.len() => end,
            _ => return Err(self.error("literal shorter than announced")),
        };
        let data = self.input[self.pos..end].to_vec();
        self.pos = end;

        Ok(Token::Literal(data))
    }

    fn read_number_or_atom(&mut self) -> Result<Token<'a>> {
        let text = self.take_atom()?;
        if text.bytes().all(|b| b.is_ascii_digit()) {
            text.parse()
                .map(Token::Number)
                .map_err(|_| self.error("number out of range"))
        } else {
            Ok(Token::Atom(text))
        }
    }

    fn read_atom(&mut self) -> Result<Token<'a>> {
        // `\*` appears in PERMANENTFLAGS and must stay one flag.
        if self.peek() == Some(b'\\') && self.peek_at(1) == Some(b'*') {
            let start = self.pos;
            self.skip(2);
            return self.slice_str(start).map(Token::Atom);
        }

        let text = self.take_atom()?;
        if text.eq_ignore_ascii_case("NIL") {
            Ok(Token::Nil)
        } else {
            Ok(Token::Atom(text))
        }
    }

    fn take_atom(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(is_atom_char) {
            self.advance();
        }
        self.slice_str(start)
    }

    fn slice_str(&self, start: usize) -> Result<&'a str> {
        std::str::from_utf8(&self.input[start..self.pos]).map_err(|_| self.error("atom is not UTF-8"))
    }

    fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }

    /// Consumes a token of the same kind as `expected`.
    #[allow(clippy::needless_pass_by_value)]
    pub fn expect(&mut self, expected: Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token) == std::mem::discriminant(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {expected:?}, got {token:?}")))
        }
    }

    /// Consumes a single space.
    pub fn expect_space(&mut self) -> Result<()> {
        self.expect(Token::Space)
    }

    /// Reads an atom, quoted string or literal as text.
    pub fn read_astring(&mut self) -> Result<String> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s.to_string()),
            Token::Number(n) => Ok(n.to_string()),
            Token::QuotedString(s) => Ok(s),
            Token::Literal(data) => Ok(String::from_utf8_lossy(&data).into_owned()),
            token => Err(self.error(&format!("expected astring, got {token:?}"))),
        }
    }

    /// Reads `NIL` or a string.
    pub fn read_nstring(&mut self) -> Result<Option<String>> {
        match self.next_token()? {
            Token::Nil => Ok(None),
            Token::QuotedString(s) => Ok(Some(s)),
            Token::Literal(data) => Ok(Some(String::from_utf8_lossy(&data).into_owned())),
            token => Err(self.error(&format!("expected nstring, got {token:?}"))),
        }
    }

    /// Reads a number.
    pub fn read_number(&mut self) -> Result<u32> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            token => Err(self.error(&format!("expected number, got {token:?}"))),
        }
    }

    /// Reads an atom.
    pub fn read_atom_string(&mut self) -> Result<&'a str> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s),
            token => Err(self.error(&format!("expected atom, got {token:?}"))),
        }
    }

    /// Consumes any run of spaces.
    pub fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.advance();
        }
    }
}

/// Returns true for bytes that may appear inside an atom.
///
/// `\` is accepted so that system flags lex as one token.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    matches!(b, 0x21..=0x7E)
        && !matches!(b, b'(' | b')' | b'{' | b'%' | b'*' | b'"' | b'[' | b']')
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn tokens(input: &[u8]) -> Vec<Token<'_>> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn test_tagged_line() {
        assert_eq!(
            tokens(b"A0001 OK done\r\n"),
            vec![
                Token::Atom("A0001"),
                Token::Space,
                Token::Atom("OK"),
                Token::Space,
                Token::Atom("done"),
                Token::Crlf,
            ]
        );
    }

    #[test]
    fn test_numbers_and_nil() {
        assert_eq!(
            tokens(b"12 nil NIL"),
            vec![
                Token::Number(12),
                Token::Space,
                Token::Nil,
                Token::Space,
                Token::Nil
            ]
        );
    }

    #[test]
    fn test_digit_led_atom() {
        assert_eq!(tokens(b"1:*")[0], Token::Atom("1:"));
        assert_eq!(tokens(b"3abc"), vec![Token::Atom("3abc")]);
    }

    #[test]
    fn test_quoted_escapes() {
        assert_eq!(
            tokens(br#""say \"hi\" \\ ok""#),
            vec![Token::QuotedString(r#"say "hi" \ ok"#.to_string())]
        );
    }

    #[test]
    fn test_quoted_unknown_escape_kept() {
        assert_eq!(
            tokens(br#""C:\dir""#),
            vec![Token::QuotedString(r"C:\dir".to_string())]
        );
    }

    #[test]
    fn test_quoted_invalid_utf8_is_lossy() {
        let toks = tokens(b"\"caf\xe9\"");
        assert_eq!(toks, vec![Token::QuotedString("caf\u{FFFD}".to_string())]);
    }

    #[test]
    fn test_flag_list() {
        assert_eq!(
            tokens(b"(\\Seen \\*)"),
            vec![
                Token::LParen,
                Token::Atom("\\Seen"),
                Token::Space,
                Token::Atom("\\*"),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_brackets() {
        assert_eq!(
            tokens(b"[UIDNEXT 7]"),
            vec![
                Token::LBracket,
                Token::Atom("UIDNEXT"),
                Token::Space,
                Token::Number(7),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn test_literal() {
        assert_eq!(
            tokens(b"{5}\r\nhello)"),
            vec![Token::Literal(b"hello".to_vec()), Token::RParen]
        );
    }

    #[test]
    fn test_literal_plus_marker() {
        assert_eq!(tokens(b"{2+}\r\nab"), vec![Token::Literal(b"ab".to_vec())]);
    }

    #[test]
    fn test_short_literal_errors() {
        let mut lexer = Lexer::new(b"{10}\r\nabc");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_continuation() {
        assert_eq!(
            tokens(b"+ go\r\n"),
            vec![Token::Plus, Token::Space, Token::Atom("go"), Token::Crlf]
        );
    }

    #[test]
    fn test_read_astring_variants() {
        let mut lexer = Lexer::new(b"INBOX \"Sent Items\" {4}\r\nWork 2024");
        assert_eq!(lexer.read_astring().unwrap(), "INBOX");
        lexer.expect_space().unwrap();
        assert_eq!(lexer.read_astring().unwrap(), "Sent Items");
        lexer.expect_space().unwrap();
        assert_eq!(lexer.read_astring().unwrap(), "Work");
        lexer.expect_space().unwrap();
        assert_eq!(lexer.read_astring().unwrap(), "2024");
    }

    #[test]
    fn test_atom_chars() {
        for b in [b'A', b'z', b'0', b':', b'\\', b'.', b'<'] {
            assert!(is_atom_char(b), "{}", b as char);
        }
        for b in [b' ', b'(', b')', b'{', b'"', b'[', b']', b'*', 0x7F, 0x0D] {
            assert!(!is_atom_char(b), "{b:#x}");
        }
    }
}
