//! Stable pretty-printing for JSON bodies

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Serialize with four-space indentation, preserving key order.
///
/// serde_json never escapes `/` or non-ASCII characters, so the output stays
/// readable for URLs and unicode text.
pub fn to_pretty_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = Serializer::with_formatter(&mut buf, formatter);

    // Serializing a Value into a Vec cannot fail
    if value.serialize(&mut ser).is_err() {
        return value.to_string();
    }

    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

/// Pretty-print `body` if it parses as JSON, otherwise return it unchanged.
pub fn format_json(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => to_pretty_json(&value),
        Err(_) => body.to_string(),
    }
}
