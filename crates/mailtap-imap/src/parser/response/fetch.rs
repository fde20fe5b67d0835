//! FETCH response parsing.

use crate::parser::lexer::{Lexer, Token};
use crate::types::Uid;
use crate::{Error, Result};

use super::helpers::parse_flag_list;
use super::types::FetchItem;

/// Parses the parenthesized item list that follows `n FETCH`.
///
/// Items this client never requests (ENVELOPE, BODYSTRUCTURE, MODSEQ and
/// extensions) are skipped rather than rejected.
pub fn parse_fetch_response(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;

    let mut items = Vec::new();

    loop {
        let name = match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => continue,
            Token::Atom(name) => name,
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected {token:?} in FETCH item list"),
                });
            }
        };

        match name.to_ascii_uppercase().as_str() {
            "FLAGS" => {
                lexer.expect_space()?;
                items.push(FetchItem::Flags(parse_flag_list(lexer)?));
            }
            "UID" => {
                lexer.expect_space()?;
                let n = lexer.read_number()?;
                let uid = Uid::new(n).ok_or_else(|| Error::Parse {
                    position: lexer.position(),
                    message: "UID 0 is not valid".to_string(),
                })?;
                items.push(FetchItem::Uid(uid));
            }
            "RFC822.SIZE" => {
                lexer.expect_space()?;
                items.push(FetchItem::Rfc822Size(lexer.read_number()?));
            }
            "INTERNALDATE" => {
                lexer.expect_space()?;
                if let Some(date) = lexer.read_nstring()? {
                    items.push(FetchItem::InternalDate(date));
                }
            }
            // Bare BODY is the non-extensible body structure.
            "BODY" | "BINARY" if lexer.peek() != Some(b'[') => skip_fetch_item(lexer)?,
            "BODY" | "BINARY" | "RFC822" | "RFC822.HEADER" | "RFC822.TEXT" => {
                let (section, origin) = parse_section_and_origin(lexer);
                lexer.expect_space()?;
                let data = match lexer.next_token()? {
                    Token::Literal(bytes) => Some(bytes),
                    Token::QuotedString(text) => Some(text.into_bytes()),
                    Token::Nil => None,
                    token => {
                        return Err(Error::Parse {
                            position: lexer.position(),
                            message: format!("unexpected {token:?} as body data"),
                        });
                    }
                };
                items.push(FetchItem::Body {
                    section,
                    origin,
                    data,
                });
            }
            _ => skip_fetch_item(lexer)?,
        }
    }

    Ok(items)
}

/// Reads the optional `[section]` and `<origin>` suffixes of a body item.
fn parse_section_and_origin(lexer: &mut Lexer<'_>) -> (Option<String>, Option<u32>) {
    let section = take_delimited(lexer, b'[', b']').filter(|s| !s.is_empty());
    let origin = take_delimited(lexer, b'<', b'>').and_then(|s| s.parse().ok());
    (section, origin)
}

fn take_delimited(lexer: &mut Lexer<'_>, open: u8, close: u8) -> Option<String> {
    if lexer.peek() != Some(open) {
        return None;
    }
    lexer.advance();

    let rest = lexer.remaining();
    let len = rest.iter().position(|&b| b == close).unwrap_or(rest.len());
    let text = String::from_utf8_lossy(&rest[..len]).into_owned();
    lexer.skip(len + 1);
    Some(text)
}

/// Skips the value of an item this parser does not model.
fn skip_fetch_item(lexer: &mut Lexer<'_>) -> Result<()> {
    take_delimited(lexer, b'[', b']');
    take_delimited(lexer, b'<', b'>');
    lexer.expect_space()?;

    let mut depth = 0usize;
    loop {
        let token = lexer.next_token()?;
        if token.is_terminal() {
            return Err(Error::Parse {
                position: lexer.position(),
                message: "FETCH response ended inside an item".to_string(),
            });
        }
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 {
            return Ok(());
        }
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
    use crate::types::Flag;

    fn parse(data: &[u8]) -> Result<Vec<FetchItem>> {
        parse_fetch_response(&mut Lexer::new(data))
    }

    #[test]
    fn test_uid_and_flags() {
        let items = parse(b"(UID 123 FLAGS (\\Seen))").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], FetchItem::Uid(Uid::new(123).unwrap()));
        match &items[1] {
            FetchItem::Flags(flags) => assert!(flags.contains(&Flag::Seen)),
            other => panic!("expected flags, got {other:?}"),
        }
    }

    #[test]
    fn test_uid_zero_rejected() {
        let err = parse(b"(UID 0)").unwrap_err();
        assert!(err.to_string().contains("UID"));
    }

    #[test]
    fn test_size_and_internal_date() {
        let items = parse(b"(RFC822.SIZE 1234 INTERNALDATE \"17-Jul-1996 02:44:25 -0700\")").unwrap();
        assert_eq!(
            items,
            vec![
                FetchItem::Rfc822Size(1234),
                FetchItem::InternalDate("17-Jul-1996 02:44:25 -0700".to_string()),
            ]
        );
    }

    #[test]
    fn test_header_fields_literal() {
        let data = b"(FLAGS () BODY[HEADER.FIELDS (FROM SUBJECT)] {15}\r\nSubject: hi\r\n\r\n)";
        let items = parse(data).unwrap();
        assert_eq!(items.len(), 2);
        match &items[1] {
            FetchItem::Body {
                section,
                origin,
                data,
            } => {
                assert_eq!(section.as_deref(), Some("HEADER.FIELDS (FROM SUBJECT)"));
                assert_eq!(*origin, None);
                assert_eq!(data.as_deref(), Some(&b"Subject: hi\r\n\r\n"[..]));
            }
            other => panic!("expected body, got {other:?}"),
        }
    }

    #[test]
    fn test_rfc822_literal() {
        let items = parse(b"(RFC822 {3}\r\nabc)").unwrap();
        assert_eq!(items[0].body_data(), Some(&b"abc"[..]));
    }

    #[test]
    fn test_body_quoted_and_nil() {
        let items = parse(b"(BODY[TEXT]<0> \"short\" BODY[1] NIL)").unwrap();
        assert_eq!(
            items,
            vec![
                FetchItem::Body {
                    section: Some("TEXT".to_string()),
                    origin: Some(0),
                    data: Some(b"short".to_vec()),
                },
                FetchItem::Body {
                    section: Some("1".to_string()),
                    origin: None,
                    data: None,
                },
            ]
        );
    }

    #[test]
    fn test_unmodelled_items_skipped() {
        let data = b"(MODSEQ (12345) ENVELOPE (NIL \"subj\" ((NIL NIL \"a\" \"b.c\")) NIL) X-GM-LABELS (\\Inbox) UID 9)";
        let items = parse(data).unwrap();
        assert_eq!(items, vec![FetchItem::Uid(Uid::new(9).unwrap())]);
    }

    #[test]
    fn test_bare_body_structure_skipped() {
        let data = br#"(BODY ("TEXT" "PLAIN" NIL NIL NIL "7BIT" 3 1) RFC822.SIZE 3)"#;
        let items = parse(data).unwrap();
        assert_eq!(items, vec![FetchItem::Rfc822Size(3)]);
    }

    #[test]
    fn test_truncated_item_errors() {
        assert!(parse(b"(ENVELOPE (NIL \"x\"\r\n").is_err());
    }
}
