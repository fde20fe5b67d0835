//! Sans-I/O parser for server responses.
//!
//! A [`Lexer`] splits a response into tokens and [`ResponseParser`] builds
//! typed [`Response`] values from them.
//!
//! ```
//! use mailtap_imap::parser::{Response, ResponseParser, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* 3 EXISTS\r\n").unwrap();
//! assert_eq!(response, Response::Untagged(UntaggedResponse::Exists(3)));
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{FetchItem, Response, ResponseParser, UntaggedResponse};
