//! MIME content type and disposition handling.

use crate::charset::decode_with_label;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Raw parameters keyed by lowercase name (e.g., charset=utf-8).
    pub parameters: HashMap<String, String>,
}

impl Default for ContentType {
    /// `text/plain; charset=us-ascii`, the RFC 2045 default.
    fn default() -> Self {
        Self::new("text", "plain").with_parameter("charset", "us-ascii")
    }
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// Creates a text/plain content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates a multipart/mixed content type with boundary.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_parameter("boundary", boundary)
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters
            .get("charset")
            .map(String::as_str)
            .filter(|c| !c.is_empty())
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters
            .get("boundary")
            .map(String::as_str)
            .filter(|b| !b.is_empty())
    }

    /// Returns a parameter, resolving RFC 2231 extended and continued forms.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<String> {
        resolve_parameter(&self.parameters, name)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Checks the full `type/subtype`, ignoring case.
    #[must_use]
    pub fn is(&self, main_type: &str, sub_type: &str) -> bool {
        self.main_type.eq_ignore_ascii_case(main_type) && self.sub_type.eq_ignore_ascii_case(sub_type)
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="quoted; value"`
    ///
    /// # Errors
    ///
    /// Returns an error if the `type/subtype` pair is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let mut segments = split_segments(s).into_iter();

        let type_str = segments
            .next()
            .ok_or_else(|| Error::InvalidContentType("Empty content type".to_string()))?;

        let (main_type, sub_type) = type_str
            .split_once('/')
            .map(|(m, s)| (m.trim().to_lowercase(), s.trim().to_lowercase()))
            .filter(|(m, s)| !m.is_empty() && !s.is_empty())
            .ok_or_else(|| Error::InvalidContentType(format!("Missing subtype in {type_str:?}")))?;

        let mut content_type = Self::new(main_type, sub_type);
        content_type.parameters = parse_parameters(segments);
        Ok(content_type)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}")?;

        let mut parameters: Vec<_> = self.parameters.iter().collect();
        parameters.sort();
        for (key, value) in parameters {
            if value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c)) {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
    }
}

/// Content-Disposition header (RFC 2183).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Disposition type, lowercase (e.g., "inline", "attachment").
    pub kind: String,
    /// Raw parameters keyed by lowercase name.
    pub parameters: HashMap<String, String>,
}

impl ContentDisposition {
    /// Parses a Content-Disposition value. Never fails; an empty value
    /// yields an empty kind.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut segments = split_segments(s).into_iter();
        let kind = segments.next().unwrap_or_default().trim().to_lowercase();
        Self {
            kind,
            parameters: parse_parameters(segments),
        }
    }

    /// Checks if this is an attachment disposition.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.kind == "attachment"
    }

    /// Returns the `filename` parameter, RFC 2231 forms resolved.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        resolve_parameter(&self.parameters, "filename")
    }
}

/// Splits on `;` outside of double quotes.
fn split_segments(s: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in s.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ';' if !in_quotes => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments
        .into_iter()
        .map(|segment| segment.trim().to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn parse_parameters(segments: impl Iterator<Item = String>) -> HashMap<String, String> {
    segments
        .filter_map(|segment| {
            let (key, value) = segment.split_once('=')?;
            Some((key.trim().to_lowercase(), unquote(value.trim())))
        })
        .collect()
}

fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"') else {
        return value.to_string();
    };
    let inner = inner.strip_suffix('"').unwrap_or(inner);

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Looks up `name`, then `name*` (RFC 2231 extended), then the numbered
/// continuations `name*0`, `name*1*`, ...
fn resolve_parameter(parameters: &HashMap<String, String>, name: &str) -> Option<String> {
    if let Some(value) = parameters.get(name) {
        return Some(value.clone());
    }
    if let Some(value) = parameters.get(&format!("{name}*")) {
        let (charset, encoded) = split_extended(value);
        return Some(decode_with_label(&percent_decode(encoded), charset).text);
    }

    let mut charset = "utf-8";
    let mut bytes = Vec::new();
    let mut found = false;
    for index in 0.. {
        if let Some(value) = parameters.get(&format!("{name}*{index}*")) {
            let encoded = if index == 0 {
                let (declared, rest) = split_extended(value);
                charset = declared;
                rest
            } else {
                value.as_str()
            };
            bytes.extend(percent_decode(encoded));
        } else if let Some(value) = parameters.get(&format!("{name}*{index}")) {
            bytes.extend_from_slice(value.as_bytes());
        } else {
            break;
        }
        found = true;
    }

    found.then(|| decode_with_label(&bytes, charset).text)
}

/// Splits `charset'language'value`, defaulting the charset to UTF-8.
fn split_extended(value: &str) -> (&str, &str) {
    let mut fields = value.splitn(3, '\'');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(charset), Some(_language), Some(rest)) => {
            (if charset.is_empty() { "utf-8" } else { charset }, rest)
        }
        _ => ("utf-8", value),
    }
}

fn percent_decode(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3).and_then(|h| std::str::from_utf8(h).ok());
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                result.push(byte);
                i += 3;
                continue;
            }
        }
        result.push(bytes[i]);
        i += 1;
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_new() {
        let ct = ContentType::new("text", "plain");
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert!(ct.parameters.is_empty());
    }

    #[test]
    fn test_multipart_mixed() {
        let ct = ContentType::multipart_mixed("boundary123");
        assert!(ct.is("multipart", "mixed"));
        assert_eq!(ct.boundary(), Some("boundary123"));
        assert!(ct.is_multipart());
    }

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("Text/Plain; Charset=utf-8").unwrap();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.charset(), Some("utf-8"));
        assert!(ct.is_text());
    }

    #[test]
    fn test_content_type_parse_quoted() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"----=_Part;123\"").unwrap();
        assert!(ct.is("multipart", "mixed"));
        assert_eq!(ct.boundary(), Some("----=_Part;123"));
    }

    #[test]
    fn test_content_type_parse_rejects_missing_subtype() {
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("").is_err());
    }

    #[test]
    fn test_content_type_display() {
        let s = ContentType::text_plain().to_string();
        assert_eq!(s, "text/plain; charset=utf-8");

        let s = ContentType::multipart_mixed("a b").to_string();
        assert_eq!(s, "multipart/mixed; boundary=\"a b\"");
    }

    #[test]
    fn test_name_parameter() {
        let ct = ContentType::parse("application/pdf; name=\"q3 report.pdf\"").unwrap();
        assert_eq!(ct.parameter("name").as_deref(), Some("q3 report.pdf"));
    }

    #[test]
    fn test_disposition_filename() {
        let cd = ContentDisposition::parse("Attachment; filename=\"notes \\\"v2\\\".txt\"");
        assert!(cd.is_attachment());
        assert_eq!(cd.filename().as_deref(), Some("notes \"v2\".txt"));
    }

    #[test]
    fn test_disposition_rfc2231_extended() {
        let cd = ContentDisposition::parse("attachment; filename*=utf-8''na%C3%AFve%20plan.txt");
        assert_eq!(cd.filename().as_deref(), Some("naïve plan.txt"));

        let cd = ContentDisposition::parse("attachment; filename*=iso-8859-1'fr'caf%E9.txt");
        assert_eq!(cd.filename().as_deref(), Some("café.txt"));
    }

    #[test]
    fn test_disposition_rfc2231_continuations() {
        let cd = ContentDisposition::parse(
            "attachment; filename*0*=utf-8''%C3%A9t%C3%A9; filename*1=\"_photos\"; filename*2=.zip",
        );
        assert_eq!(cd.filename().as_deref(), Some("été_photos.zip"));
    }

    #[test]
    fn test_disposition_without_filename() {
        let cd = ContentDisposition::parse("inline");
        assert_eq!(cd.kind, "inline");
        assert_eq!(cd.filename(), None);
    }
}
