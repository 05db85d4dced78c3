//! # Records - Heterogeneous Documents with Random Field Access
//!
//! A record is an ordered, name-unique sequence of typed fields. Records are
//! schemaless: two records in one table may carry different fields. This
//! module defines the [`Record`] trait, the encoded blob format, and the
//! types that read and build it.
//!
//! ## Encoded Record Layout
//!
//! ```text
//! +---------------+----------------------------------+------------------+
//! | Field Count   | Header Entries                   | Payload          |
//! | (u16)         | [17 bytes each, sorted by name]  | names ++ data    |
//! +---------------+----------------------------------+------------------+
//! ```
//!
//! Each header entry stores the field's name and data offsets (relative to
//! the payload start), its type tag, and its position in insertion order.
//! Because entries are sorted by name, [`RecordView::field`] is a binary
//! search that decodes only the target field; because each entry remembers
//! its insertion index, [`RecordView::iterate`] replays the original order.
//! Header words are little-endian; big-endian is reserved for the
//! order-sensitive value encodings themselves.
//!
//! ## Module Structure
//!
//! - `view`: [`RecordView`] / [`EncodedRecord`] zero-copy readers
//! - `builder`: [`FieldBuffer`] mutable record for schema changes
//! - `id`: ULID record-ID generation
//!
//! ## Aliasing Rule
//!
//! Table iteration hands callbacks a [`RecordView`] borrowing a buffer that
//! is reused between invocations. Callbacks must not retain the view past
//! their return; clone into a [`FieldBuffer`] to keep one.

pub mod builder;
pub mod id;
pub mod view;

#[cfg(test)]
mod tests;

use eyre::{ensure, Result};

pub use builder::FieldBuffer;
pub use view::{EncodedRecord, RecordView};

use crate::encoding::encode_value;
use crate::types::Value;

/// A named, typed field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: Value) -> Field {
        Field {
            name: name.into(),
            value,
        }
    }

    pub fn int(name: impl Into<String>, v: i64) -> Field {
        Field::new(name, Value::Int(v))
    }

    pub fn uint(name: impl Into<String>, v: u64) -> Field {
        Field::new(name, Value::Uint(v))
    }

    pub fn float(name: impl Into<String>, v: f64) -> Field {
        Field::new(name, Value::Float64(v))
    }

    pub fn text(name: impl Into<String>, v: impl Into<String>) -> Field {
        Field::new(name, Value::Text(v.into()))
    }

    pub fn blob(name: impl Into<String>, v: impl Into<Vec<u8>>) -> Field {
        Field::new(name, Value::Blob(v.into()))
    }

    pub fn bool(name: impl Into<String>, v: bool) -> Field {
        Field::new(name, Value::Bool(v))
    }
}

/// Capability every storable document implements.
///
/// `iterate` yields fields in a stable insertion order and stops on the
/// first callback error, surfacing it. `primary_key` is an optional
/// capability: implementations that return `Some` control their record ID,
/// everyone else gets a generated ULID.
pub trait Record {
    fn field(&self, name: &str) -> Result<Field>;

    fn iterate(&self, f: &mut dyn FnMut(Field) -> Result<()>) -> Result<()>;

    fn primary_key(&self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// Capability for materializing a generic record into a concrete value.
pub trait Scanner {
    fn scan_record(&mut self, record: &dyn Record) -> Result<()>;
}

/// A record wrapper pinning the primary key to a fixed byte string,
/// regardless of what the inner record reports.
///
/// `Table::replace` uses this to re-insert a record under its original ID.
#[derive(Clone, Copy)]
pub struct KeyedRecord<'a> {
    record: &'a dyn Record,
    key: &'a [u8],
}

impl<'a> KeyedRecord<'a> {
    pub fn new(record: &'a dyn Record, key: &'a [u8]) -> KeyedRecord<'a> {
        KeyedRecord { record, key }
    }
}

impl Record for KeyedRecord<'_> {
    fn field(&self, name: &str) -> Result<Field> {
        self.record.field(name)
    }

    fn iterate(&self, f: &mut dyn FnMut(Field) -> Result<()>) -> Result<()> {
        self.record.iterate(f)
    }

    fn primary_key(&self) -> Result<Option<Vec<u8>>> {
        Ok(Some(self.key.to_vec()))
    }
}

pub(crate) const ENTRY_SIZE: usize = 17;

/// Encodes a record into its binary blob form.
///
/// Fields are laid out in insertion order in the payload; the header entry
/// table is sorted by name for binary search. Empty and duplicate field
/// names are rejected.
pub fn encode(record: &dyn Record) -> Result<Vec<u8>> {
    let mut fields: Vec<Field> = Vec::new();
    record.iterate(&mut |f| {
        fields.push(f);
        Ok(())
    })?;

    ensure!(fields.len() <= u16::MAX as usize, "too many fields in record");

    let mut order: Vec<usize> = (0..fields.len()).collect();
    order.sort_by(|&a, &b| fields[a].name.as_bytes().cmp(fields[b].name.as_bytes()));
    for pair in order.windows(2) {
        let (a, b) = (&fields[pair[0]].name, &fields[pair[1]].name);
        ensure!(a != b, "duplicate field name {a:?}");
    }

    let mut data: Vec<Vec<u8>> = Vec::with_capacity(fields.len());
    let mut names_len = 0usize;
    let mut data_len = 0usize;
    for f in &fields {
        ensure!(!f.name.is_empty(), "field name cannot be empty");
        ensure!(f.name.len() <= u16::MAX as usize, "field name too long");
        let encoded = encode_value(&f.value);
        names_len += f.name.len();
        data_len += encoded.len();
        data.push(encoded);
    }

    let header_len = 2 + fields.len() * ENTRY_SIZE;
    let mut buf = Vec::with_capacity(header_len + names_len + data_len);
    buf.extend_from_slice(&(fields.len() as u16).to_le_bytes());

    // payload-relative offsets, names first then data, both in insertion order
    let mut name_offsets = Vec::with_capacity(fields.len());
    let mut off = 0u64;
    for f in &fields {
        name_offsets.push(off);
        off += f.name.len() as u64;
    }
    let mut data_offsets = Vec::with_capacity(fields.len());
    for d in &data {
        data_offsets.push(off);
        off += d.len() as u64;
    }
    ensure!(off <= u32::MAX as u64, "record payload too large");

    for &i in &order {
        let f = &fields[i];
        buf.extend_from_slice(&(name_offsets[i] as u32).to_le_bytes());
        buf.extend_from_slice(&(f.name.len() as u16).to_le_bytes());
        buf.extend_from_slice(&(data_offsets[i] as u32).to_le_bytes());
        buf.extend_from_slice(&(data[i].len() as u32).to_le_bytes());
        buf.extend_from_slice(&(i as u16).to_le_bytes());
        buf.push(f.value.field_type().tag());
    }

    for f in &fields {
        buf.extend_from_slice(f.name.as_bytes());
    }
    for d in &data {
        buf.extend_from_slice(d);
    }

    Ok(buf)
}
