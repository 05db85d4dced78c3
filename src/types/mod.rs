//! # Runtime Value Representation
//!
//! This module provides [`Value`], the runtime representation of a field's
//! data, and [`FieldType`], its type tag. Records are schemaless: every field
//! carries its own type, and two records in the same table may disagree about
//! a field's type.
//!
//! ## Value Variants
//!
//! | Variant | Rust type | Encoded width |
//! |---------|-----------|---------------|
//! | Null | - | 0 |
//! | Bool | bool | 1 |
//! | Int / Int64 | i64 | 8 |
//! | Int8 / Int16 / Int32 | i8 / i16 / i32 | 1 / 2 / 4 |
//! | Uint / Uint64 | u64 | 8 |
//! | Uint8 / Uint16 / Uint32 | u8 / u16 / u32 | 1 / 2 / 4 |
//! | Float32 / Float64 | f32 / f64 | 4 / 8 |
//! | Text | String | variable |
//! | Blob | `Vec<u8>` | variable |
//!
//! `Int` and `Uint` are the 64-bit "natural" integer types; the explicitly
//! sized variants exist so a record can round-trip a width chosen by the
//! writer.
//!
//! ## Comparison Semantics
//!
//! [`Value::compare`] implements SQL-flavored comparison: integers compare
//! numerically across widths and signedness, integers promote to floats when
//! mixed, and incomparable pairs (NULL involved, or mismatched classes like
//! Text vs Int) return `None`. [`Value::compare_for_sort`] extends this to a
//! total order for ORDER BY, ranking classes as
//! Null < Bool < numeric < Text < Blob.

use std::cmp::Ordering;
use std::fmt;

use eyre::Result;

use crate::errors;

/// Type tag for a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Text,
    Blob,
    Null,
}

impl FieldType {
    /// Stable one-byte tag used in encoded record headers.
    pub fn tag(self) -> u8 {
        match self {
            FieldType::Bool => 1,
            FieldType::Int => 2,
            FieldType::Int8 => 3,
            FieldType::Int16 => 4,
            FieldType::Int32 => 5,
            FieldType::Int64 => 6,
            FieldType::Uint => 7,
            FieldType::Uint8 => 8,
            FieldType::Uint16 => 9,
            FieldType::Uint32 => 10,
            FieldType::Uint64 => 11,
            FieldType::Float32 => 12,
            FieldType::Float64 => 13,
            FieldType::Text => 14,
            FieldType::Blob => 15,
            FieldType::Null => 16,
        }
    }

    pub fn from_tag(tag: u8) -> Result<FieldType> {
        Ok(match tag {
            1 => FieldType::Bool,
            2 => FieldType::Int,
            3 => FieldType::Int8,
            4 => FieldType::Int16,
            5 => FieldType::Int32,
            6 => FieldType::Int64,
            7 => FieldType::Uint,
            8 => FieldType::Uint8,
            9 => FieldType::Uint16,
            10 => FieldType::Uint32,
            11 => FieldType::Uint64,
            12 => FieldType::Float32,
            13 => FieldType::Float64,
            14 => FieldType::Text,
            15 => FieldType::Blob,
            16 => FieldType::Null,
            other => return Err(errors::decode(format!("unknown type tag {other}"))),
        })
    }

    /// Encoded width for fixed-width types, `None` for Text/Blob/Null.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            FieldType::Bool | FieldType::Int8 | FieldType::Uint8 => Some(1),
            FieldType::Int16 | FieldType::Uint16 => Some(2),
            FieldType::Int32 | FieldType::Uint32 | FieldType::Float32 => Some(4),
            FieldType::Int
            | FieldType::Int64
            | FieldType::Uint
            | FieldType::Uint64
            | FieldType::Float64 => Some(8),
            FieldType::Text | FieldType::Blob | FieldType::Null => None,
        }
    }

    /// The zero value of this type, used to backfill added fields.
    pub fn zero_value(self) -> Value {
        match self {
            FieldType::Bool => Value::Bool(false),
            FieldType::Int => Value::Int(0),
            FieldType::Int8 => Value::Int8(0),
            FieldType::Int16 => Value::Int16(0),
            FieldType::Int32 => Value::Int32(0),
            FieldType::Int64 => Value::Int64(0),
            FieldType::Uint => Value::Uint(0),
            FieldType::Uint8 => Value::Uint8(0),
            FieldType::Uint16 => Value::Uint16(0),
            FieldType::Uint32 => Value::Uint32(0),
            FieldType::Uint64 => Value::Uint64(0),
            FieldType::Float32 => Value::Float32(0.0),
            FieldType::Float64 => Value::Float64(0.0),
            FieldType::Text => Value::Text(String::new()),
            FieldType::Blob => Value::Blob(Vec::new()),
            FieldType::Null => Value::Null,
        }
    }
}

/// Runtime value of a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint(u64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// Comparison class of a value, ranking heterogeneous values for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Class {
    Null,
    Bool,
    Number,
    Text,
    Blob,
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Null => FieldType::Null,
            Value::Bool(_) => FieldType::Bool,
            Value::Int(_) => FieldType::Int,
            Value::Int8(_) => FieldType::Int8,
            Value::Int16(_) => FieldType::Int16,
            Value::Int32(_) => FieldType::Int32,
            Value::Int64(_) => FieldType::Int64,
            Value::Uint(_) => FieldType::Uint,
            Value::Uint8(_) => FieldType::Uint8,
            Value::Uint16(_) => FieldType::Uint16,
            Value::Uint32(_) => FieldType::Uint32,
            Value::Uint64(_) => FieldType::Uint64,
            Value::Float32(_) => FieldType::Float32,
            Value::Float64(_) => FieldType::Float64,
            Value::Text(_) => FieldType::Text,
            Value::Blob(_) => FieldType::Blob,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn class(&self) -> Class {
        match self {
            Value::Null => Class::Null,
            Value::Bool(_) => Class::Bool,
            Value::Text(_) => Class::Text,
            Value::Blob(_) => Class::Blob,
            _ => Class::Number,
        }
    }

    /// Widens any integer variant to i128 for cross-width comparison.
    pub(crate) fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Value::Int(v) | Value::Int64(v) => *v as i128,
            Value::Int8(v) => *v as i128,
            Value::Int16(v) => *v as i128,
            Value::Int32(v) => *v as i128,
            Value::Uint(v) | Value::Uint64(v) => *v as i128,
            Value::Uint8(v) => *v as i128,
            Value::Uint16(v) => *v as i128,
            Value::Uint32(v) => *v as i128,
            _ => return None,
        })
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            other => other.as_i128().map(|i| i as f64),
        }
    }

    /// SQL-flavored comparison. `None` means the pair is incomparable
    /// (NULL involved, or mismatched classes).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Blob(a), Value::Blob(b)) => Some(a.cmp(b)),
            (a, b) if a.class() == Class::Number && b.class() == Class::Number => {
                match (a.as_i128(), b.as_i128()) {
                    (Some(x), Some(y)) => Some(x.cmp(&y)),
                    _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
                }
            }
            _ => None,
        }
    }

    /// Total order for ORDER BY: Null < Bool < numeric < Text < Blob,
    /// NaN sorting last among numbers.
    pub fn compare_for_sort(&self, other: &Value) -> Ordering {
        match self.class().cmp(&other.class()) {
            Ordering::Equal => self
                .compare(other)
                .unwrap_or_else(|| match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => a.is_nan().cmp(&b.is_nan()),
                    _ => Ordering::Equal,
                }),
            unequal => unequal,
        }
    }

    /// Truthiness used by WHERE and AND/OR: NULL, zero, and empty values
    /// are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Float32(f) => *f != 0.0,
            Value::Float64(f) => *f != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Blob(b) => !b.is_empty(),
            other => other.as_i128() != Some(0),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) | Value::Int64(v) => write!(f, "{v}"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Uint(v) | Value::Uint64(v) => write!(f, "{v}"),
            Value::Uint8(v) => write!(f, "{v}"),
            Value::Uint16(v) => write!(f, "{v}"),
            Value::Uint32(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "'{v}'"),
            Value::Blob(v) => {
                write!(f, "x'")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                write!(f, "'")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_compare_across_widths_and_signedness() {
        assert_eq!(
            Value::Int8(-1).compare(&Value::Uint64(0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Uint(u64::MAX).compare(&Value::Int(-1)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::Int32(42).compare(&Value::Uint8(42)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn integers_promote_to_float_when_mixed() {
        assert_eq!(
            Value::Int(3).compare(&Value::Float64(3.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Float32(2.0).compare(&Value::Int16(2)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn null_and_mismatched_classes_are_incomparable() {
        assert_eq!(Value::Null.compare(&Value::Int(0)), None);
        assert_eq!(Value::Text("1".into()).compare(&Value::Int(1)), None);
    }

    #[test]
    fn sort_order_ranks_classes() {
        let mut values = vec![
            Value::Text("a".into()),
            Value::Int(7),
            Value::Null,
            Value::Bool(true),
            Value::Blob(vec![1]),
        ];
        values.sort_by(Value::compare_for_sort);
        assert_eq!(values[0], Value::Null);
        assert_eq!(values[1], Value::Bool(true));
        assert_eq!(values[2], Value::Int(7));
        assert_eq!(values[3], Value::Text("a".into()));
        assert_eq!(values[4], Value::Blob(vec![1]));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(Value::Float64(-0.5).is_truthy());
        assert!(Value::Text("x".into()).is_truthy());
    }

    #[test]
    fn zero_values_match_their_type() {
        for ty in [FieldType::Bool, FieldType::Int, FieldType::Text, FieldType::Blob] {
            assert_eq!(ty.zero_value().field_type(), ty);
        }
    }

    #[test]
    fn type_tags_round_trip() {
        for tag in 1..=16 {
            let ty = FieldType::from_tag(tag).unwrap();
            assert_eq!(ty.tag(), tag);
        }
        assert!(FieldType::from_tag(0).is_err());
        assert!(FieldType::from_tag(17).is_err());
    }
}
