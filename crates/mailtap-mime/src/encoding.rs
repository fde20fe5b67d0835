//! Transfer and header encodings.
//!
//! Base64, Quoted-Printable, and RFC 2047 encoded words. The decoders used
//! on received mail are lenient: they skip garbage instead of failing.

use crate::charset::{DecodedText, decode_with_label};
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use std::fmt::Write as _;

/// Accepts input with or without padding and ignores stray trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 the way mail readers do.
///
/// Line breaks and any byte outside the alphabet are skipped, padding is
/// optional, and a dangling final character is dropped.
#[must_use]
pub fn decode_base64_lenient(data: &[u8]) -> Vec<u8> {
    let mut cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/')
        .collect();
    if cleaned.len() % 4 == 1 {
        cleaned.pop();
    }
    LENIENT.decode(&cleaned).unwrap_or_default()
}

/// Maximum line length for Quoted-Printable encoding.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// Line breaks in the input are kept as CRLF hard breaks; long lines get
/// soft breaks.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::new();
    let mut line_length = 0;
    let bytes = text.as_bytes();

    for (i, byte) in bytes.iter().enumerate() {
        if *byte == b'\r' {
            continue;
        }
        if *byte == b'\n' {
            result.push_str("\r\n");
            line_length = 0;
            continue;
        }

        if line_length >= MAX_LINE_LENGTH - 3 {
            result.push_str("=\r\n");
            line_length = 0;
        }

        let at_line_end = matches!(bytes.get(i + 1), None | Some(b'\r' | b'\n'));
        match byte {
            b'!'..=b'<' | b'>'..=b'~' => {
                result.push(char::from(*byte));
                line_length += 1;
            }
            b' ' | b'\t' if !at_line_end => {
                result.push(char::from(*byte));
                line_length += 1;
            }
            _ => {
                let _ = write!(result, "={byte:02X}");
                line_length += 3;
            }
        }
    }

    result
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks are removed. An `=` not followed by two hex digits is
/// kept literally.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break, possibly with trailing whitespace before it
        let mut j = i + 1;
        while j < data.len() && (data[j] == b' ' || data[j] == b'\t') {
            j += 1;
        }
        if data.get(j) == Some(&b'\n') {
            i = j + 1;
            continue;
        }
        if data.get(j) == Some(&b'\r') && data.get(j + 1) == Some(&b'\n') {
            i = j + 2;
            continue;
        }
        if j == data.len() {
            break;
        }

        match (hex_value(data.get(i + 1)), hex_value(data.get(i + 2))) {
            (Some(high), Some(low)) => {
                result.push((high << 4) | low);
                i += 3;
            }
            _ => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    result
}

fn hex_value(byte: Option<&u8>) -> Option<u8> {
    let byte = *byte?;
    char::from(byte)
        .to_digit(16)
        .and_then(|v| u8::try_from(v).ok())
}

/// Encodes a header value using RFC 2047 encoding.
///
/// Format: `=?charset?B?encoded-text?=`. Plain ASCII values are returned
/// unchanged.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) && !text.contains("=?") {
        return text.to_string();
    }

    let encoded = encode_base64(text.as_bytes());
    format!("=?{charset}?B?{encoded}?=")
}

/// One run of a header value: literal text or a decoded encoded word.
enum Piece {
    Plain(String),
    Encoded { charset: String, bytes: Vec<u8> },
}

/// Decodes header text that may mix plain runs and RFC 2047 encoded words.
///
/// Input without a well-formed encoded word is returned unchanged. Otherwise each encoded word is
/// decoded with its declared charset, adjacent words in the same charset
/// are joined before decoding so multi-byte characters split across words
/// survive, whitespace between encoded words is dropped, and the pieces are
/// joined with single spaces in their original order. Words that do not
/// parse are kept as literal text. This never fails.
///
/// # Example
///
/// ```
/// use mailtap_mime::decode_header_text;
///
/// let decoded = decode_header_text("=?iso-8859-1?q?caf=E9?= au lait");
/// assert_eq!(decoded.text, "café au lait");
/// assert!(!decoded.lossy);
/// ```
#[must_use]
pub fn decode_header_text(raw: &str) -> DecodedText {
    if !raw.contains("=?") {
        return DecodedText::clean(raw.to_string());
    }

    let pieces = split_encoded_words(raw);
    if !pieces.iter().any(|p| matches!(p, Piece::Encoded { .. })) {
        return DecodedText::clean(raw.to_string());
    }

    let mut output: Vec<String> = Vec::new();
    let mut lossy = false;
    let mut index = 0;

    while index < pieces.len() {
        match &pieces[index] {
            Piece::Plain(text) => {
                // Whitespace-only runs between words vanish here
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    output.push(trimmed.to_string());
                }
                index += 1;
            }
            Piece::Encoded { charset, bytes } => {
                let mut merged = bytes.clone();
                index += 1;
                // Merge following words of the same charset, skipping the
                // whitespace that separates them.
                while let Some(next) = next_word_same_charset(&pieces, index, charset) {
                    if let Piece::Encoded { bytes, .. } = &pieces[next] {
                        merged.extend_from_slice(bytes);
                    }
                    index = next + 1;
                }
                let decoded = decode_with_label(&merged, charset);
                lossy |= decoded.lossy;
                output.push(decoded.text);
            }
        }
    }

    DecodedText {
        text: output.join(" "),
        lossy,
    }
}

fn next_word_same_charset(pieces: &[Piece], index: usize, charset: &str) -> Option<usize> {
    let candidate = match pieces.get(index)? {
        Piece::Plain(text) if text.trim().is_empty() => index + 1,
        Piece::Plain(_) => return None,
        Piece::Encoded { .. } => index,
    };
    match pieces.get(candidate)? {
        Piece::Encoded { charset: next, .. } if next.eq_ignore_ascii_case(charset) => {
            Some(candidate)
        }
        _ => None,
    }
}

fn split_encoded_words(raw: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut plain = String::new();
    let mut rest = raw;

    while let Some(start) = rest.find("=?") {
        plain.push_str(&rest[..start]);
        let candidate = &rest[start..];
        if let Some((charset, bytes, consumed)) = parse_encoded_word(candidate) {
            if !plain.is_empty() {
                pieces.push(Piece::Plain(std::mem::take(&mut plain)));
            }
            pieces.push(Piece::Encoded { charset, bytes });
            rest = &candidate[consumed..];
        } else {
            plain.push_str("=?");
            rest = &candidate[2..];
        }
    }
    plain.push_str(rest);
    if !plain.is_empty() {
        pieces.push(Piece::Plain(plain));
    }

    pieces
}

/// Parses `=?charset?X?text?=` at the start of `input`.
///
/// Returns the charset, the transfer-decoded bytes and the consumed length.
fn parse_encoded_word(input: &str) -> Option<(String, Vec<u8>, usize)> {
    let body = input.strip_prefix("=?")?;
    let (charset, rest) = body.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let text = &rest[..end];

    if charset.is_empty()
        || charset.contains(char::is_whitespace)
        || text.contains(char::is_whitespace)
    {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64_lenient(text.as_bytes()),
        "Q" | "q" => {
            let spaced: Vec<u8> = text
                .bytes()
                .map(|b| if b == b'_' { b' ' } else { b })
                .collect();
            decode_quoted_printable(&spaced)
        }
        _ => return None,
    };

    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    Some((charset.to_string(), bytes, consumed))
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
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(decode_base64_lenient(encoded.as_bytes()), data);
    }

    #[test]
    fn test_base64_lenient_line_breaks_and_padding() {
        assert_eq!(decode_base64_lenient(b"SGVs\r\nbG8s\r\nIFdvcmxkIQ=="), b"Hello, World!");
        assert_eq!(decode_base64_lenient(b"SGVsbG8"), b"Hello");
        assert_eq!(decode_base64_lenient(b"SGVsbG8*!"), b"Hello");
    }

    #[test]
    fn test_quoted_printable_encode() {
        assert_eq!(encode_quoted_printable("Hello, World!"), "Hello, World!");

        let encoded = encode_quoted_printable("Héllo, Wørld!");
        assert!(encoded.contains("=C3"));
    }

    #[test]
    fn test_quoted_printable_encode_keeps_line_breaks() {
        let encoded = encode_quoted_printable("line one \nline two");
        assert_eq!(encoded, "line one=20\r\nline two");
    }

    #[test]
    fn test_quoted_printable_encode_soft_breaks() {
        let encoded = encode_quoted_printable(&"a".repeat(200));
        assert!(encoded.lines().all(|line| line.len() <= MAX_LINE_LENGTH));
        assert_eq!(decode_quoted_printable(encoded.as_bytes()), "a".repeat(200).as_bytes());
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable(b"Hello, World!"), b"Hello, World!");
        assert_eq!(decode_quoted_printable(b"H=C3=A9llo"), "Héllo".as_bytes());
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode_quoted_printable(b"Hello=\r\nWorld"), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello=  \nWorld"), b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_invalid_escape_kept() {
        assert_eq!(decode_quoted_printable(b"1+1=2 =ZZ"), b"1+1=2 =ZZ");
        assert_eq!(decode_quoted_printable(b"tail="), b"tail");
    }

    #[test]
    fn test_rfc2047_encode() {
        assert_eq!(encode_rfc2047("Hello", "utf-8"), "Hello");

        let encoded = encode_rfc2047("Héllo", "utf-8");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert!(encoded.ends_with("?="));
        assert_eq!(decode_header_text(&encoded).text, "Héllo");
    }

    #[test]
    fn test_decode_plain_passthrough() {
        let decoded = decode_header_text("  Weekly report  ");
        assert_eq!(decoded.text, "  Weekly report  ");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_decode_base64_word() {
        assert_eq!(decode_header_text("=?utf-8?B?SMOpbGxv?=").text, "Héllo");
    }

    #[test]
    fn test_decode_q_word() {
        assert_eq!(decode_header_text("=?UTF-8?Q?H=C3=A9llo_there?=").text, "Héllo there");
    }

    #[test]
    fn test_decode_mixed_plain_and_encoded() {
        let decoded = decode_header_text("Re: =?utf-8?q?caf=C3=A9?= tomorrow");
        assert_eq!(decoded.text, "Re: café tomorrow");
    }

    #[test]
    fn test_decode_adjacent_words_merge() {
        // "é" split across two words
        let decoded = decode_header_text("=?utf-8?B?w6k=?= =?utf-8?B?w6k=?=");
        assert_eq!(decoded.text, "éé");

        let split = decode_header_text("=?utf-8?Q?caf=C3?=\r\n =?utf-8?Q?=A9?=");
        assert_eq!(split.text, "café");
        assert!(!split.lossy);
    }

    #[test]
    fn test_decode_different_charsets_separated() {
        let decoded = decode_header_text("=?iso-8859-1?Q?caf=E9?= =?utf-8?Q?na=C3=AFve?=");
        assert_eq!(decoded.text, "café naïve");
    }

    #[test]
    fn test_decode_unknown_charset_is_lossy() {
        let decoded = decode_header_text("=?x-unknown?Q?abc?=");
        assert_eq!(decoded.text, "abc");
        assert!(decoded.lossy);
    }

    #[test]
    fn test_decode_malformed_word_kept() {
        let decoded = decode_header_text("price =?notaword");
        assert_eq!(decoded.text, "price =?notaword");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_decode_stray_marker_keeps_spacing() {
        let decoded = decode_header_text("  a =? b ");
        assert_eq!(decoded.text, "  a =? b ");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_decode_bad_bytes_replaced() {
        let decoded = decode_header_text("=?utf-8?B?/w==?=");
        assert_eq!(decoded.text, "\u{FFFD}");
        assert!(decoded.lossy);
    }

    proptest! {
        #[test]
        fn plain_ascii_is_unchanged(text in "[ -=@-~]*(=\\?[ -=@-~]*)?") {
            let decoded = decode_header_text(&text);
            prop_assert_eq!(decoded.text, text);
            prop_assert!(!decoded.lossy);
        }

        #[test]
        fn lenient_decoders_never_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = decode_base64_lenient(&data);
            let _ = decode_quoted_printable(&data);
            let _ = decode_header_text(&String::from_utf8_lossy(&data));
        }
    }
}
