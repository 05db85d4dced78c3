//! # RecordView - Zero-Copy Record Access
//!
//! [`RecordView`] reads an encoded record blob in place. Field lookup is a
//! binary search over the name-sorted header; only the requested field's
//! value is decoded. [`EncodedRecord`] is the owned counterpart returned by
//! point lookups.
//!
//! ## Thread Safety
//!
//! `RecordView` borrows immutably from a byte slice. Multiple views can read
//! the same blob concurrently.

use eyre::Result;
use smallvec::SmallVec;

use crate::encoding::decode_value;
use crate::errors::{self, Error};
use crate::records::{Field, Record, ENTRY_SIZE};
use crate::types::FieldType;

#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    data: &'a [u8],
    count: usize,
}

struct Entry {
    name_off: usize,
    name_len: usize,
    data_off: usize,
    data_len: usize,
    insert_idx: usize,
    type_tag: u8,
}

impl<'a> RecordView<'a> {
    pub fn new(data: &'a [u8]) -> Result<RecordView<'a>> {
        if data.len() < 2 {
            return Err(errors::decode("record blob too small for header"));
        }
        let count = u16::from_le_bytes([data[0], data[1]]) as usize;
        if data.len() < 2 + count * ENTRY_SIZE {
            return Err(errors::decode(format!(
                "record header claims {count} fields but blob holds {} bytes",
                data.len()
            )));
        }
        Ok(RecordView { data, count })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn payload(&self) -> &'a [u8] {
        &self.data[2 + self.count * ENTRY_SIZE..]
    }

    fn entry(&self, i: usize) -> Entry {
        let e = &self.data[2 + i * ENTRY_SIZE..2 + (i + 1) * ENTRY_SIZE];
        Entry {
            name_off: u32::from_le_bytes([e[0], e[1], e[2], e[3]]) as usize,
            name_len: u16::from_le_bytes([e[4], e[5]]) as usize,
            data_off: u32::from_le_bytes([e[6], e[7], e[8], e[9]]) as usize,
            data_len: u32::from_le_bytes([e[10], e[11], e[12], e[13]]) as usize,
            insert_idx: u16::from_le_bytes([e[14], e[15]]) as usize,
            type_tag: e[16],
        }
    }

    fn entry_name(&self, entry: &Entry) -> Result<&'a [u8]> {
        self.payload()
            .get(entry.name_off..entry.name_off + entry.name_len)
            .ok_or_else(|| errors::decode("field name offset out of bounds"))
    }

    fn decode_entry(&self, entry: &Entry) -> Result<Field> {
        let name = std::str::from_utf8(self.entry_name(entry)?)
            .map_err(|e| errors::decode(format!("invalid UTF-8 in field name: {e}")))?;
        let data = self
            .payload()
            .get(entry.data_off..entry.data_off + entry.data_len)
            .ok_or_else(|| errors::decode("field data offset out of bounds"))?;
        let value = decode_value(FieldType::from_tag(entry.type_tag)?, data)?;
        Ok(Field::new(name, value))
    }

    /// Binary search over the name-sorted header; decodes only the hit.
    pub fn field(&self, name: &str) -> Result<Field> {
        let (mut lo, mut hi) = (0, self.count);
        while lo < hi {
            let mid = (lo + hi) / 2;
            let entry = self.entry(mid);
            match self.entry_name(&entry)?.cmp(name.as_bytes()) {
                std::cmp::Ordering::Equal => return self.decode_entry(&entry),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        Err(Error::FieldNotFound.into())
    }

    /// Yields fields in insertion order, stopping on the first callback
    /// error and surfacing it.
    pub fn iterate(&self, f: &mut dyn FnMut(Field) -> Result<()>) -> Result<()> {
        let mut order: SmallVec<[(usize, usize); 16]> = (0..self.count)
            .map(|i| (self.entry(i).insert_idx, i))
            .collect();
        order.sort_unstable();

        for (_, i) in order {
            f(self.decode_entry(&self.entry(i))?)?;
        }
        Ok(())
    }
}

impl Record for RecordView<'_> {
    fn field(&self, name: &str) -> Result<Field> {
        RecordView::field(self, name)
    }

    fn iterate(&self, f: &mut dyn FnMut(Field) -> Result<()>) -> Result<()> {
        RecordView::iterate(self, f)
    }
}

/// An encoded record owning its bytes, as returned by point lookups.
#[derive(Debug, Clone)]
pub struct EncodedRecord {
    data: Vec<u8>,
    count: usize,
}

impl EncodedRecord {
    pub fn new(data: Vec<u8>) -> Result<EncodedRecord> {
        let count = RecordView::new(&data)?.count;
        Ok(EncodedRecord { data, count })
    }

    pub fn view(&self) -> RecordView<'_> {
        RecordView {
            data: &self.data,
            count: self.count,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl Record for EncodedRecord {
    fn field(&self, name: &str) -> Result<Field> {
        self.view().field(name)
    }

    fn iterate(&self, f: &mut dyn FnMut(Field) -> Result<()>) -> Result<()> {
        self.view().iterate(f)
    }
}
