//! Narrow hash encoding used for history entries, bookmarks and cache keys.
//!
//! A narrow serializes as `#narrow/op/operand/-op/operand`. Components are
//! percent-encoded with `.` standing in for `%`, so the result survives a
//! browser URL-decoding pass untouched, and spaces become `+`.

use std::fmt::Write;

use crate::domain::entities::Term;

const NARROW_PREFIX: &str = "#narrow";

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(byte, b'-' | b'_' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

/// Encodes one hash component.
#[must_use]
pub fn encode_hash_component(component: &str) -> String {
    let mut encoded = String::with_capacity(component.len());
    for byte in component.bytes() {
        if is_unreserved(byte) {
            encoded.push(char::from(byte));
        } else if byte == b' ' {
            encoded.push('+');
        } else {
            let _ = write!(encoded, ".{byte:02X}");
        }
    }
    encoded
}

/// Decodes one hash component. Returns `None` for malformed escapes or
/// bytes that are not UTF-8.
#[must_use]
pub fn decode_hash_component(component: &str) -> Option<String> {
    let escaped = component.replace('+', " ").replace('.', "%");
    let bytes = escaped.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())?;
            decoded.push(byte);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

/// Percent-decodes `%XX` escapes, keeping malformed escapes literally.
#[must_use]
pub fn percent_decode_lossy(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| bytes.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        if let Some(byte) = escaped {
            decoded.push(byte);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Serializes terms into a narrow hash.
#[must_use]
pub fn terms_to_hash(terms: &[Term]) -> String {
    let mut hash = String::from(NARROW_PREFIX);
    for term in terms {
        let sign = if term.negated { "-" } else { "" };
        let _ = write!(
            hash,
            "/{sign}{}/{}",
            encode_hash_component(&term.operator),
            encode_hash_component(&term.operand)
        );
    }
    hash
}

/// Parses a narrow hash back into terms.
///
/// Parsing stops at the first empty operator (e.g. a trailing slash).
/// Returns `None` when the hash is not a narrow, an operator has no
/// operand, or a component fails to decode.
#[must_use]
pub fn parse_narrow(hash: &str) -> Option<Vec<Term>> {
    let mut parts = hash.split('/');
    if !matches!(parts.next(), Some("#narrow" | "narrow")) {
        return None;
    }

    let parts: Vec<&str> = parts.collect();
    let mut terms = Vec::new();
    for pair in parts.chunks(2) {
        let operator = decode_hash_component(pair[0])?;
        if operator.is_empty() {
            break;
        }
        let raw_operand = pair.get(1).filter(|operand| !operand.is_empty())?;
        let operand = decode_hash_component(raw_operand)?;

        let (negated, operator) = match operator.strip_prefix('-') {
            Some(stripped) => (true, stripped.to_string()),
            None => (false, operator),
        };
        terms.push(Term {
            negated,
            operator,
            operand,
        });
    }
    Some(terms)
}
