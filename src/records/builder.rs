//! # FieldBuffer - Mutable Record
//!
//! [`FieldBuffer`] is the in-memory, mutable counterpart of an encoded
//! record. Schema mutations decode each stored record into a buffer, edit
//! it, and re-encode. It also serves as a plain ordered document builder
//! for inserts.
//!
//! ## Usage
//!
//! ```ignore
//! let mut fb = FieldBuffer::new();
//! fb.add(Field::int("id", 1));
//! fb.add(Field::text("name", "Ada"));
//! let blob = fb.encode()?;
//! ```

use eyre::Result;

use crate::errors::Error;
use crate::records::{self, Field, Record, Scanner};

/// An ordered, mutable collection of fields implementing [`Record`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBuffer {
    fields: Vec<Field>,
}

impl FieldBuffer {
    pub fn new() -> FieldBuffer {
        FieldBuffer::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Appends a field. Insertion order is preserved through encoding.
    pub fn add(&mut self, field: Field) -> &mut FieldBuffer {
        self.fields.push(field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Removes the named field.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        match self.fields.iter().position(|f| f.name == name) {
            Some(i) => {
                self.fields.remove(i);
                Ok(())
            }
            None => Err(Error::FieldNotFound.into()),
        }
    }

    /// Swaps the named field for `field`, keeping its position.
    pub fn replace(&mut self, name: &str, field: Field) -> Result<()> {
        match self.fields.iter().position(|f| f.name == name) {
            Some(i) => {
                self.fields[i] = field;
                Ok(())
            }
            None => Err(Error::FieldNotFound.into()),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        records::encode(self)
    }
}

impl Record for FieldBuffer {
    fn field(&self, name: &str) -> Result<Field> {
        self.get(name)
            .cloned()
            .ok_or_else(|| Error::FieldNotFound.into())
    }

    fn iterate(&self, f: &mut dyn FnMut(Field) -> Result<()>) -> Result<()> {
        for field in &self.fields {
            f(field.clone())?;
        }
        Ok(())
    }
}

impl Scanner for FieldBuffer {
    /// Appends every field of `record`, materializing it for mutation.
    fn scan_record(&mut self, record: &dyn Record) -> Result<()> {
        record.iterate(&mut |f| {
            self.fields.push(f);
            Ok(())
        })
    }
}

impl FromIterator<Field> for FieldBuffer {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> FieldBuffer {
        FieldBuffer {
            fields: iter.into_iter().collect(),
        }
    }
}
