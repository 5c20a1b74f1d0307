//! Canonical JSON encoding for deterministic block hashing.
//!
//! A block's digest is SHA-256 over this encoding:
//! - Object keys sorted by byte comparison, at every nesting level
//! - Compact form, no insignificant whitespace
//! - Strings escape only `"`, `\` and control characters
//! - Hashes rendered as lowercase hex strings
//!
//! The encoding never depends on the iteration order of the map that holds a
//! payload, so two callers that build "the same" block always derive the same
//! digest, regardless of platform or serde_json feature flags.

use serde_json::Value;

use crate::crypto::sha256;
use crate::types::BlockHash;

/// Hashed field names. Emission order is fixed by the sort in
/// [`encode_object`], not by the order listed here.
mod keys {
    pub const INDEX: &str = "index";
    pub const NONCE: &str = "nonce";
    pub const PAYLOAD: &str = "payload";
    pub const PREVIOUS_HASH: &str = "previous_hash";
    pub const TIMESTAMP: &str = "timestamp";
}

/// Encode the hashed fields of a block to canonical bytes.
///
/// The stored `hash` is not part of its own preimage.
pub fn canonical_block_bytes(
    index: u64,
    timestamp: i64,
    payload: &Value,
    previous_hash: &BlockHash,
    nonce: u64,
) -> Vec<u8> {
    let index = Value::from(index);
    let nonce = Value::from(nonce);
    let previous_hash = Value::String(previous_hash.to_hex());
    let timestamp = Value::from(timestamp);

    let entries: [(&str, &Value); 5] = [
        (keys::TIMESTAMP, &timestamp),
        (keys::PREVIOUS_HASH, &previous_hash),
        (keys::PAYLOAD, payload),
        (keys::NONCE, &nonce),
        (keys::INDEX, &index),
    ];

    let mut buf = String::new();
    encode_object(&mut buf, entries.to_vec());
    buf.into_bytes()
}

/// The Hasher: digest of a block's fields.
pub fn block_digest(
    index: u64,
    timestamp: i64,
    payload: &Value,
    previous_hash: &BlockHash,
    nonce: u64,
) -> BlockHash {
    sha256(&canonical_block_bytes(index, timestamp, payload, previous_hash, nonce))
}

/// Encode an arbitrary JSON value canonically.
pub fn canonical_json(value: &Value) -> String {
    let mut buf = String::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a JSON value.
fn encode_value_to(buf: &mut String, value: &Value) {
    match value {
        Value::Null => buf.push_str("null"),
        Value::Bool(true) => buf.push_str("true"),
        Value::Bool(false) => buf.push_str("false"),
        Value::Number(n) => buf.push_str(&n.to_string()),
        Value::String(s) => encode_string(buf, s),
        Value::Array(items) => {
            buf.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                encode_value_to(buf, item);
            }
            buf.push(']');
        }
        Value::Object(map) => {
            encode_object(buf, map.iter().map(|(k, v)| (k.as_str(), v)).collect());
        }
    }
}

/// Encode an object with keys sorted by byte comparison.
fn encode_object(buf: &mut String, mut entries: Vec<(&str, &Value)>) {
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    buf.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        encode_string(buf, key);
        buf.push(':');
        encode_value_to(buf, value);
    }
    buf.push('}');
}

/// Encode a string literal with minimal escaping.
fn encode_string(buf: &mut String, s: &str) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\u{08}' => buf.push_str("\\b"),
            '\u{0c}' => buf.push_str("\\f"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                buf.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => buf.push(c),
        }
    }
    buf.push('"');
}
