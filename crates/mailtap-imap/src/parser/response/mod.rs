//! Response parser.
//!
//! Turns one complete response (a line plus any literals it announced)
//! into a [`Response`].

#![allow(clippy::missing_errors_doc)]

mod fetch;
mod helpers;
mod types;

pub use types::{FetchItem, UntaggedResponse};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, SeqNum, Status, Tag};
use crate::{Error, Result};

use helpers::{
    parse_capability_data, parse_flag_list, parse_list_response, parse_response_code,
    parse_search_response, read_text_until_crlf,
};

/// A parsed server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Completion of the command carrying `tag`.
    Tagged {
        /// The command tag.
        tag: Tag,
        /// Completion status.
        status: Status,
        /// Bracketed response code.
        code: Option<ResponseCode>,
        /// Trailing text.
        text: String,
    },
    /// Server data.
    Untagged(UntaggedResponse),
    /// `+` continuation request.
    Continuation {
        /// Text after the `+`, if any.
        text: Option<String>,
    },
}

/// Stateless response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one complete response.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => Self::parse_untagged(&mut lexer),
            Token::Plus => Ok(Self::parse_continuation(&mut lexer)),
            Token::Atom(tag) => Self::parse_tagged(&mut lexer, tag),
            token => Err(Error::Parse {
                position: 0,
                message: format!("expected '*', '+' or a tag, got {token:?}"),
            }),
        }
    }

    fn parse_tagged(lexer: &mut Lexer<'_>, tag: &str) -> Result<Response> {
        lexer.expect_space()?;
        let word = lexer.read_atom_string()?;
        let status = status_keyword(word).ok_or_else(|| Error::Parse {
            position: lexer.position(),
            message: format!("invalid completion status {word}"),
        })?;
        let (code, text) = Self::parse_resp_text(lexer)?;

        Ok(Response::Tagged {
            tag: Tag::new(tag),
            status,
            code,
            text,
        })
    }

    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<Response> {
        lexer.expect_space()?;

        let untagged = match lexer.next_token()? {
            Token::Atom(word) => Self::parse_server_data(lexer, word)?,
            Token::Number(n) => Self::parse_message_data(lexer, n)?,
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected {token:?} after '*'"),
                });
            }
        };

        Ok(Response::Untagged(untagged))
    }

    fn parse_server_data(lexer: &mut Lexer<'_>, word: &str) -> Result<UntaggedResponse> {
        if let Some(status) = status_keyword(word) {
            let (code, text) = Self::parse_resp_text(lexer)?;
            return Ok(match status {
                Status::Ok => UntaggedResponse::Ok { code, text },
                Status::No => UntaggedResponse::No { code, text },
                Status::Bad => UntaggedResponse::Bad { code, text },
                Status::PreAuth => UntaggedResponse::PreAuth { code, text },
                Status::Bye => UntaggedResponse::Bye { code, text },
            });
        }

        match word.to_ascii_uppercase().as_str() {
            "CAPABILITY" => Ok(UntaggedResponse::Capability(parse_capability_data(lexer)?)),
            "FLAGS" => {
                lexer.expect_space()?;
                Ok(UntaggedResponse::Flags(parse_flag_list(lexer)?))
            }
            "LIST" => {
                lexer.expect_space()?;
                Ok(UntaggedResponse::List(parse_list_response(lexer)?))
            }
            "SEARCH" => Ok(UntaggedResponse::Search(parse_search_response(lexer)?)),
            _ => Err(Error::Parse {
                position: lexer.position(),
                message: format!("unsupported untagged response {word}"),
            }),
        }
    }

    fn parse_message_data(lexer: &mut Lexer<'_>, n: u32) -> Result<UntaggedResponse> {
        lexer.expect_space()?;
        let keyword = lexer.read_atom_string()?;

        let position = lexer.position();
        let seq = || {
            SeqNum::new(n).ok_or_else(|| Error::Parse {
                position,
                message: "sequence number 0".to_string(),
            })
        };

        match keyword.to_ascii_uppercase().as_str() {
            "EXISTS" => Ok(UntaggedResponse::Exists(n)),
            "RECENT" => Ok(UntaggedResponse::Recent(n)),
            "EXPUNGE" => Ok(UntaggedResponse::Expunge(seq()?)),
            "FETCH" => {
                let seq = seq()?;
                lexer.expect_space()?;
                let items = fetch::parse_fetch_response(lexer)?;
                Ok(UntaggedResponse::Fetch { seq, items })
            }
            _ => Err(Error::Parse {
                position: lexer.position(),
                message: format!("unsupported message data {keyword}"),
            }),
        }
    }

    fn parse_continuation(lexer: &mut Lexer<'_>) -> Response {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }
        let text = read_text_until_crlf(lexer);

        Response::Continuation {
            text: (!text.is_empty()).then_some(text),
        }
    }

    /// Reads `[code] text`; both halves are optional.
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        let code = if lexer.peek() == Some(b'[') {
            Some(parse_response_code(lexer)?)
        } else {
            None
        };

        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        Ok((code, read_text_until_crlf(lexer)))
    }
}

fn status_keyword(word: &str) -> Option<Status> {
    match word.to_ascii_uppercase().as_str() {
        "OK" => Some(Status::Ok),
        "NO" => Some(Status::No),
        "BAD" => Some(Status::Bad),
        "PREAUTH" => Some(Status::PreAuth),
        "BYE" => Some(Status::Bye),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use crate::types::{Capability, Flag, MailboxAttribute, ResponseCode};

    use super::*;

    fn untagged(input: &[u8]) -> UntaggedResponse {
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(u) => u,
            other => panic!("expected untagged, got {other:?}"),
        }
    }

    #[test]
    fn test_greeting() {
        assert_eq!(
            untagged(b"* OK IMAP4rev1 server ready\r\n"),
            UntaggedResponse::Ok {
                code: None,
                text: "IMAP4rev1 server ready".to_string()
            }
        );
    }

    #[test]
    fn test_greeting_with_capabilities() {
        match untagged(b"* OK [CAPABILITY IMAP4rev1 STARTTLS AUTH=PLAIN] ready\r\n") {
            UntaggedResponse::Ok {
                code: Some(ResponseCode::Capability(caps)),
                text,
            } => {
                assert!(caps.contains(&Capability::StartTls));
                assert!(caps.contains(&Capability::Auth("PLAIN".to_string())));
                assert_eq!(text, "ready");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_tagged() {
        assert_eq!(
            ResponseParser::parse(b"A0001 NO [TRYCREATE] no such mailbox\r\n").unwrap(),
            Response::Tagged {
                tag: Tag::new("A0001"),
                status: Status::No,
                code: Some(ResponseCode::TryCreate),
                text: "no such mailbox".to_string(),
            }
        );
    }

    #[test]
    fn test_tagged_without_text() {
        match ResponseParser::parse(b"A0002 OK\r\n").unwrap() {
            Response::Tagged { status, text, .. } => {
                assert_eq!(status, Status::Ok);
                assert_eq!(text, "");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_lowercase_keywords() {
        assert_eq!(untagged(b"* 4 exists\r\n"), UntaggedResponse::Exists(4));
        assert!(matches!(
            ResponseParser::parse(b"a1 ok fine\r\n").unwrap(),
            Response::Tagged {
                status: Status::Ok,
                ..
            }
        ));
    }

    #[test]
    fn test_capability() {
        match untagged(b"* CAPABILITY IMAP4rev1 IDLE LOGINDISABLED\r\n") {
            UntaggedResponse::Capability(caps) => {
                assert_eq!(caps[0], Capability::Imap4Rev1);
                assert!(caps.contains(&Capability::LoginDisabled));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_flags() {
        match untagged(b"* FLAGS (\\Seen \\Answered \\Flagged \\Deleted \\Draft)\r\n") {
            UntaggedResponse::Flags(flags) => {
                assert_eq!(flags.len(), 5);
                assert!(flags.contains(&Flag::Seen));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_permanent_flags_wildcard() {
        match untagged(b"* OK [PERMANENTFLAGS (\\Deleted \\Seen \\*)] Limited\r\n") {
            UntaggedResponse::Ok {
                code: Some(ResponseCode::PermanentFlags(flags)),
                ..
            } => assert_eq!(flags.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_list() {
        match untagged(b"* LIST (\\HasNoChildren \\Sent) \"/\" \"[Gmail]/Sent Mail\"\r\n") {
            UntaggedResponse::List(list) => {
                assert!(list.attributes.contains(&MailboxAttribute::HasNoChildren));
                assert_eq!(list.delimiter, Some('/'));
                assert_eq!(list.mailbox.as_str(), "[Gmail]/Sent Mail");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_list_nil_delimiter() {
        match untagged(b"* LIST () NIL INBOX\r\n") {
            UntaggedResponse::List(list) => {
                assert!(list.attributes.is_empty());
                assert_eq!(list.delimiter, None);
                assert_eq!(list.mailbox.as_str(), "INBOX");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_continuation() {
        assert_eq!(
            ResponseParser::parse(b"+ Ready for literal\r\n").unwrap(),
            Response::Continuation {
                text: Some("Ready for literal".to_string())
            }
        );
        assert_eq!(
            ResponseParser::parse(b"+\r\n").unwrap(),
            Response::Continuation { text: None }
        );
    }

    #[test]
    fn test_select_codes() {
        match untagged(b"* OK [UIDVALIDITY 1234567890] UIDs valid\r\n") {
            UntaggedResponse::Ok {
                code: Some(ResponseCode::UidValidity(v)),
                text,
            } => {
                assert_eq!(v.get(), 1_234_567_890);
                assert_eq!(text, "UIDs valid");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            untagged(b"* OK [UNSEEN 12] first unseen\r\n"),
            UntaggedResponse::Ok {
                code: Some(ResponseCode::Unseen(_)),
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_code_kept() {
        assert!(matches!(
            untagged(b"* OK [HIGHESTMODSEQ 715194045007] ok\r\n"),
            UntaggedResponse::Ok {
                code: Some(ResponseCode::Unknown(name)),
                ..
            } if name == "HIGHESTMODSEQ"
        ));
    }

    #[test]
    fn test_fetch() {
        match untagged(b"* 1 FETCH (FLAGS (\\Seen) UID 12345)\r\n") {
            UntaggedResponse::Fetch { seq, items } => {
                assert_eq!(seq.get(), 1);
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_search() {
        match untagged(b"* SEARCH 1 2 3 5 8 13\r\n") {
            UntaggedResponse::Search(nums) => {
                let values: Vec<u32> = nums.iter().map(|s| s.get()).collect();
                assert_eq!(values, vec![1, 2, 3, 5, 8, 13]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(untagged(b"* SEARCH\r\n"), UntaggedResponse::Search(vec![]));
    }

    #[test]
    fn test_unknown_untagged_is_error() {
        assert!(ResponseParser::parse(b"* NAMESPACE ((\"\" \"/\")) NIL NIL\r\n").is_err());
        assert!(ResponseParser::parse(b"* 0 FETCH (UID 1)\r\n").is_err());
    }
}
