//! Shared pieces of the response grammar.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{
    Capability, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, ResponseCode, SeqNum, Uid,
    UidValidity,
};
use crate::{Error, Result};

/// Parses a bracketed response code such as `[UIDVALIDITY 3857529045]`.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;

    let atom = lexer.read_atom_string()?;

    let code = match atom.to_ascii_uppercase().as_str() {
        "ALERT" => ResponseCode::Alert,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "UIDNEXT" => {
            lexer.expect_space()?;
            ResponseCode::UidNext(nonzero(lexer, Uid::new)?)
        }
        "UIDVALIDITY" => {
            lexer.expect_space()?;
            ResponseCode::UidValidity(nonzero(lexer, UidValidity::new)?)
        }
        "UNSEEN" => {
            lexer.expect_space()?;
            ResponseCode::Unseen(nonzero(lexer, SeqNum::new)?)
        }
        "CAPABILITY" => ResponseCode::Capability(parse_capability_data(lexer)?),
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            ResponseCode::PermanentFlags(parse_flag_list(lexer)?.iter().cloned().collect())
        }
        _ => ResponseCode::Unknown(atom.to_string()),
    };

    // Anything left inside the brackets is ignored.
    while lexer.peek().is_some_and(|b| b != b']') {
        lexer.advance();
    }
    lexer.expect(Token::RBracket)?;

    Ok(code)
}

fn nonzero<T>(lexer: &mut Lexer<'_>, make: fn(u32) -> Option<T>) -> Result<T> {
    let n = lexer.read_number()?;
    make(n).ok_or_else(|| Error::Parse {
        position: lexer.position(),
        message: "zero is not valid here".to_string(),
    })
}

/// Parses the space-separated capability atoms that follow `CAPABILITY`.
pub fn parse_capability_data(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();

    while lexer.peek() == Some(b' ') {
        lexer.advance();
        if let Token::Atom(s) = lexer.next_token()? {
            caps.push(Capability::parse(s));
        }
    }

    Ok(caps)
}

/// Parses a parenthesized flag list.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    lexer.expect(Token::LParen)?;

    let mut flags = Flags::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => return Ok(flags),
            Token::Space => {}
            Token::Atom(s) => flags.insert(Flag::parse(s)),
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected {token:?} in flag list"),
                });
            }
        }
    }
}

/// Parses the body of a `* LIST` line.
pub fn parse_list_response(lexer: &mut Lexer<'_>) -> Result<ListResponse> {
    lexer.expect(Token::LParen)?;
    let mut attributes = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(s) => attributes.push(MailboxAttribute::parse(s)),
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected {token:?} in LIST attributes"),
                });
            }
        }
    }

    lexer.expect_space()?;

    let delimiter = match lexer.next_token()? {
        Token::Nil => None,
        Token::QuotedString(s) => s.chars().next(),
        token => {
            return Err(Error::Parse {
                position: lexer.position(),
                message: format!("expected hierarchy delimiter, got {token:?}"),
            });
        }
    };

    lexer.expect_space()?;
    let name = lexer.read_astring()?;

    Ok(ListResponse {
        attributes,
        delimiter,
        mailbox: Mailbox::new(name),
    })
}

/// Parses the numbers of a `* SEARCH` line. Zero is dropped.
pub fn parse_search_response(lexer: &mut Lexer<'_>) -> Result<Vec<SeqNum>> {
    let mut nums = Vec::new();

    loop {
        lexer.skip_spaces();
        match lexer.next_token()? {
            Token::Number(n) => nums.extend(SeqNum::new(n)),
            token if token.is_terminal() => return Ok(nums),
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected {token:?} in SEARCH result"),
                });
            }
        }
    }
}

/// Consumes the rest of the line and returns it as text.
pub fn read_text_until_crlf(lexer: &mut Lexer<'_>) -> String {
    let remaining = lexer.remaining();
    let end = remaining
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(remaining.len());

    lexer.skip(end);
    if lexer.peek() == Some(b'\r') {
        lexer.advance();
    }
    if lexer.peek() == Some(b'\n') {
        lexer.advance();
    }

    String::from_utf8_lossy(&remaining[..end]).into_owned()
}
