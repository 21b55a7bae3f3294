//! Deterministic JSON serialization for signed payloads.
//!
//! The byte sequence produced here is what gets signed, so it must be
//! reproducible by any implementation that follows these rules:
//!
//! - object keys sorted by byte-wise comparison at every nesting level
//! - no insignificant whitespace and no trailing newline
//! - strings escape only `"`, `\` and U+0000..U+001F (short forms
//!   `\b \f \n \r \t`, otherwise lowercase `\u00XX`); everything else is raw
//!   UTF-8
//! - arrays keep their element order
//! - numbers must be integers; floats are rejected
//!
//! Semantically equal payloads therefore encode to identical bytes no matter
//! how they were built.

use crate::error::{LicenseError, LicenseResult};
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Encodes a JSON value into canonical bytes.
///
/// # Errors
///
/// Returns [`LicenseError::Canonical`] if the value contains a non-integer
/// number.
pub fn encode(value: &Value) -> LicenseResult<Vec<u8>> {
    let mut out = Vec::with_capacity(256);
    write_value(&mut out, value)?;
    Ok(out)
}

/// Serializes `value` with serde and encodes the result canonically.
pub fn encode_serialize<T: Serialize + ?Sized>(value: &T) -> LicenseResult<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    encode(&value)
}

/// Parses canonical (or any) JSON bytes back into a value.
pub fn parse(bytes: &[u8]) -> LicenseResult<Value> {
    Ok(serde_json::from_slice(bytes)?)
}

fn write_value(out: &mut Vec<u8>, value: &Value) -> LicenseResult<()> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => write_number(out, n)?,
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(out, item)?;
            }
            out.push(b']');
        }
        Value::Object(map) => write_object(out, map)?,
    }
    Ok(())
}

fn write_object(out: &mut Vec<u8>, map: &Map<String, Value>) -> LicenseResult<()> {
    // serde_json's map order depends on its feature flags; sort explicitly.
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    out.push(b'{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        write_string(out, key);
        out.push(b':');
        write_value(out, value)?;
    }
    out.push(b'}');
    Ok(())
}

fn write_number(out: &mut Vec<u8>, n: &Number) -> LicenseResult<()> {
    if let Some(i) = n.as_i64() {
        out.extend_from_slice(i.to_string().as_bytes());
    } else if let Some(u) = n.as_u64() {
        out.extend_from_slice(u.to_string().as_bytes());
    } else {
        return Err(LicenseError::Canonical(format!(
            "floating point value {n} is not allowed"
        )));
    }
    Ok(())
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\u{0c}' => out.extend_from_slice(b"\\f"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}
