//! Charset-aware decoding with explicit loss reporting.

use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

/// Text produced by a best-effort decode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedText {
    /// The decoded text.
    pub text: String,
    /// True if replacement characters were substituted or the charset was
    /// unknown and UTF-8 was assumed.
    pub lossy: bool,
}

impl DecodedText {
    /// Wraps text that needed no decoding.
    #[must_use]
    pub const fn clean(text: String) -> Self {
        Self { text, lossy: false }
    }

    /// Consumes the result, keeping only the text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Decodes a message body using its declared charset, or UTF-8 when none is
/// declared.
///
/// Undecodable bytes become U+FFFD. This never fails.
#[must_use]
pub fn decode_body_text(bytes: &[u8], charset: Option<&str>) -> DecodedText {
    charset.map_or_else(
        || decode_with_encoding(bytes, UTF_8, false),
        |label| decode_with_label(bytes, label),
    )
}

/// Decodes bytes with a charset label such as `iso-8859-1` or `UTF-8*en`.
///
/// An RFC 2231 language suffix is ignored. Unknown labels fall back to
/// UTF-8 and mark the result lossy.
#[must_use]
pub fn decode_with_label(bytes: &[u8], label: &str) -> DecodedText {
    let label = label.split('*').next().unwrap_or_default().trim();
    match Encoding::for_label(label.as_bytes()) {
        Some(encoding) => decode_with_encoding(bytes, encoding, false),
        None => {
            debug!(charset = label, "unknown charset, assuming utf-8");
            decode_with_encoding(bytes, UTF_8, true)
        }
    }
}

fn decode_with_encoding(bytes: &[u8], encoding: &'static Encoding, unknown: bool) -> DecodedText {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(
            charset = encoding.name(),
            "replacement characters substituted while decoding"
        );
    }
    DecodedText {
        text: text.into_owned(),
        lossy: unknown || had_errors,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::needless_collect, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_utf8() {
        let decoded = decode_body_text("héllo".as_bytes(), None);
        assert_eq!(decoded.text, "héllo");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_declared_latin1() {
        let decoded = decode_body_text(b"caf\xe9", Some("ISO-8859-1"));
        assert_eq!(decoded.text, "café");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let decoded = decode_body_text(b"ok \xff\xfe done", Some("utf-8"));
        assert!(decoded.text.starts_with("ok "));
        assert!(decoded.text.ends_with(" done"));
        assert!(decoded.text.contains('\u{FFFD}'));
        assert!(decoded.lossy);
    }

    #[test]
    fn test_unknown_charset_falls_back() {
        let decoded = decode_with_label(b"plain", "x-made-up");
        assert_eq!(decoded.text, "plain");
        assert!(decoded.lossy);
    }

    #[test]
    fn test_language_suffix_ignored() {
        let decoded = decode_with_label("naïve".as_bytes(), "utf-8*en");
        assert_eq!(decoded.text, "naïve");
        assert!(!decoded.lossy);
    }
}
