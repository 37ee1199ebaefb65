//! Canonical form of certificate text before hashing or comparison.

use serde_json::Value;

use crate::error::CertificateError;

/// ECMAScript WhiteSpace and LineTerminator code points, the set a browser's
/// `trim()` and `\s` match. Differs from `char::is_whitespace`: includes
/// U+FEFF and excludes U+0085.
pub fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{000B}'
            | '\u{000C}'
            | '\r'
            | ' '
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Trim the text and collapse every whitespace run into a single space.
///
/// A missing value normalizes to the empty string. No case folding and no
/// Unicode normalization are applied.
pub fn normalize<'a>(text: impl Into<Option<&'a str>>) -> String {
    let Some(text) = text.into() else {
        return String::new();
    };
    text.split(is_js_whitespace)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strict reader used by the ledger backend: the field must be a JSON string
/// that is non-empty after normalization.
pub fn require_certificate(value: Option<&Value>) -> Result<String, CertificateError> {
    let Some(Value::String(raw)) = value else {
        return Err(CertificateError::Missing);
    };
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Err(CertificateError::Empty);
    }
    Ok(normalized)
}
