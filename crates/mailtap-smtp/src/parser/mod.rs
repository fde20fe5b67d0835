//! Reply parsing.
//!
//! A reply is one or more lines sharing a three-digit code. Every line but
//! the last separates code and text with `-`; the last uses a space:
//!
//! ```text
//! 250-mx.example.com greets you
//! 250-SIZE 35882577
//! 250 AUTH PLAIN LOGIN
//! ```

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Builds a [`Reply`] from its lines (line endings already removed).
///
/// # Errors
///
/// Returns [`Error::Protocol`] for an empty reply, a line without a numeric
/// code, or lines whose codes disagree.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let first = lines
        .first()
        .ok_or_else(|| Error::Protocol("empty reply".into()))?;
    let code = reply_code(first)?;

    let mut message = Vec::with_capacity(lines.len());
    for line in lines {
        if reply_code(line)? != code {
            return Err(Error::Protocol(format!("mixed codes in reply: {line}")));
        }
        message.push(line.get(4..).unwrap_or_default().to_string());
    }

    Ok(Reply::new(ReplyCode::new(code), message))
}

/// True when `line` ends a reply: a bare code or a code followed by a space.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    match line.as_bytes() {
        [a, b, c] => [a, b, c].iter().all(|d| d.is_ascii_digit()),
        [_, _, _, sep, ..] => *sep == b' ',
        _ => false,
    }
}

fn reply_code(line: &str) -> Result<u16> {
    line.get(..3)
        .filter(|code| code.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| Error::Protocol(format!("invalid reply line: {line}")))
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

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_single_line() {
        let reply = parse_reply(&lines(&["250 OK"])).unwrap();
        assert_eq!(reply.code, ReplyCode::OK);
        assert_eq!(reply.message, vec!["OK"]);
    }

    #[test]
    fn test_multi_line() {
        let reply = parse_reply(&lines(&[
            "250-mx.example.com",
            "250-SIZE 1000",
            "250 AUTH PLAIN",
        ]))
        .unwrap();
        assert_eq!(reply.message, vec!["mx.example.com", "SIZE 1000", "AUTH PLAIN"]);
    }

    #[test]
    fn test_bare_code() {
        let reply = parse_reply(&lines(&["354"])).unwrap();
        assert_eq!(reply.code, ReplyCode::START_DATA);
        assert_eq!(reply.message, vec![""]);
    }

    #[test]
    fn test_is_last_reply_line() {
        assert!(is_last_reply_line("250 OK"));
        assert!(is_last_reply_line("221"));
        assert!(!is_last_reply_line("250-more"));
        assert!(!is_last_reply_line("25"));
        assert!(!is_last_reply_line("abc"));
    }

    #[test]
    fn test_errors() {
        assert!(parse_reply(&[]).is_err());
        assert!(parse_reply(&lines(&["25"])).is_err());
        assert!(parse_reply(&lines(&["ABC OK"])).is_err());
        assert!(parse_reply(&lines(&["250-a", "550 b"])).is_err());
        assert!(parse_reply(&lines(&["é5 x"])).is_err());
    }
}
