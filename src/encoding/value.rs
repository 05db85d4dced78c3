//! # Order-Preserving Value Codec
//!
//! Canonical byte encodings for every [`Value`] variant. All numeric
//! encodings are fixed-width and byte-comparable: for two values of the same
//! type, numeric order equals lexicographic order of the encoded bytes, so
//! index range scans yield values in type-natural order with a plain memcmp.
//!
//! ## Encoding Rules
//!
//! | Type | Encoding |
//! |------|----------|
//! | Bool | one byte, 0 or 1 |
//! | signed ints | big-endian two's complement with the sign bit flipped |
//! | unsigned ints | big-endian |
//! | floats | IEEE 754 bits; sign bit flipped when positive, all bits inverted when negative |
//! | Text / Blob | verbatim |
//! | Null | empty |
//!
//! Flipping the sign bit maps the signed range onto the unsigned range in
//! order: `i64::MIN` encodes as `00..00`, `-1` as `7F..FF`, `0` as `80..00`.
//! The float transform orders all non-NaN values correctly, negative zero
//! before positive zero.
//!
//! ## Index Key Form
//!
//! Index keys compose an encoded value with a separator byte (ASCII unit
//! separator) and a record ID. The separator never appears inside a
//! fixed-width numeric encoding boundary ambiguity-free, but Text and Blob
//! are arbitrary bytes, so [`encode_index_key`] length-prefixes them with a
//! big-endian u32. Same-type encodings are therefore prefix-free.

use eyre::Result;

use crate::errors;
use crate::types::{FieldType, Value};

/// Encodes a value into its canonical byte form.
pub fn encode_value(v: &Value) -> Vec<u8> {
    let mut buf = Vec::with_capacity(v.field_type().fixed_width().unwrap_or(16));
    encode_value_into(v, &mut buf);
    buf
}

/// Appends the canonical byte form of a value to `buf`.
pub fn encode_value_into(v: &Value, buf: &mut Vec<u8>) {
    match v {
        Value::Null => {}
        Value::Bool(b) => buf.push(*b as u8),
        Value::Int(i) | Value::Int64(i) => buf.extend_from_slice(&((*i as u64) ^ SIGN64).to_be_bytes()),
        Value::Int8(i) => buf.push((*i as u8) ^ 0x80),
        Value::Int16(i) => buf.extend_from_slice(&((*i as u16) ^ SIGN16).to_be_bytes()),
        Value::Int32(i) => buf.extend_from_slice(&((*i as u32) ^ SIGN32).to_be_bytes()),
        Value::Uint(u) | Value::Uint64(u) => buf.extend_from_slice(&u.to_be_bytes()),
        Value::Uint8(u) => buf.push(*u),
        Value::Uint16(u) => buf.extend_from_slice(&u.to_be_bytes()),
        Value::Uint32(u) => buf.extend_from_slice(&u.to_be_bytes()),
        Value::Float32(f) => buf.extend_from_slice(&order_f32(*f).to_be_bytes()),
        Value::Float64(f) => buf.extend_from_slice(&order_f64(*f).to_be_bytes()),
        Value::Text(s) => buf.extend_from_slice(s.as_bytes()),
        Value::Blob(b) => buf.extend_from_slice(b),
    }
}

/// Appends the index-key form of a value: canonical bytes, with Text and
/// Blob length-prefixed (big-endian u32) so composite keys split safely.
pub fn encode_index_key(v: &Value, buf: &mut Vec<u8>) {
    match v {
        Value::Text(s) => {
            buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Blob(b) => {
            buf.extend_from_slice(&(b.len() as u32).to_be_bytes());
            buf.extend_from_slice(b);
        }
        other => encode_value_into(other, buf),
    }
}

/// Decodes canonical bytes back into a value of the given type.
pub fn decode_value(ty: FieldType, data: &[u8]) -> Result<Value> {
    if let Some(width) = ty.fixed_width() {
        if data.len() != width {
            return Err(errors::decode(format!(
                "expected {width} bytes for {ty:?}, got {}",
                data.len()
            )));
        }
    }

    Ok(match ty {
        FieldType::Null => {
            if !data.is_empty() {
                return Err(errors::decode("null value must be empty"));
            }
            Value::Null
        }
        FieldType::Bool => match data[0] {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            other => return Err(errors::decode(format!("invalid bool byte {other}"))),
        },
        FieldType::Int => Value::Int((be_u64(data) ^ SIGN64) as i64),
        FieldType::Int8 => Value::Int8((data[0] ^ 0x80) as i8),
        FieldType::Int16 => Value::Int16((be_u16(data) ^ SIGN16) as i16),
        FieldType::Int32 => Value::Int32((be_u32(data) ^ SIGN32) as i32),
        FieldType::Int64 => Value::Int64((be_u64(data) ^ SIGN64) as i64),
        FieldType::Uint => Value::Uint(be_u64(data)),
        FieldType::Uint8 => Value::Uint8(data[0]),
        FieldType::Uint16 => Value::Uint16(be_u16(data)),
        FieldType::Uint32 => Value::Uint32(be_u32(data)),
        FieldType::Uint64 => Value::Uint64(be_u64(data)),
        FieldType::Float32 => Value::Float32(unorder_f32(be_u32(data))),
        FieldType::Float64 => Value::Float64(unorder_f64(be_u64(data))),
        FieldType::Text => Value::Text(
            std::str::from_utf8(data)
                .map_err(|e| errors::decode(format!("invalid UTF-8 in text value: {e}")))?
                .to_string(),
        ),
        FieldType::Blob => Value::Blob(data.to_vec()),
    })
}

const SIGN16: u16 = 1 << 15;
const SIGN32: u32 = 1 << 31;
const SIGN64: u64 = 1 << 63;

fn order_f32(f: f32) -> u32 {
    let bits = f.to_bits();
    if bits & SIGN32 != 0 {
        !bits
    } else {
        bits ^ SIGN32
    }
}

fn unorder_f32(bits: u32) -> f32 {
    if bits & SIGN32 != 0 {
        f32::from_bits(bits ^ SIGN32)
    } else {
        f32::from_bits(!bits)
    }
}

fn order_f64(f: f64) -> u64 {
    let bits = f.to_bits();
    if bits & SIGN64 != 0 {
        !bits
    } else {
        bits ^ SIGN64
    }
}

fn unorder_f64(bits: u64) -> f64 {
    if bits & SIGN64 != 0 {
        f64::from_bits(bits ^ SIGN64)
    } else {
        f64::from_bits(!bits)
    }
}

fn be_u16(data: &[u8]) -> u16 {
    u16::from_be_bytes([data[0], data[1]])
}

fn be_u32(data: &[u8]) -> u32 {
    u32::from_be_bytes([data[0], data[1], data[2], data[3]])
}

fn be_u64(data: &[u8]) -> u64 {
    u64::from_be_bytes([
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ])
}
