//! # Table Layer
//!
//! A [`Table`] is a cheap handle over one engine sub-store, borrowing its
//! transaction. CRUD operations maintain every configured secondary index
//! synchronously; index handles are fetched fresh from the catalog on every
//! operation because another handle sharing the transaction may have
//! created or dropped one in between.
//!
//! Record IDs are either supplied by the record's
//! [`primary_key`](crate::records::Record::primary_key) capability or
//! generated as sortable ULIDs, so auto-keyed tables scan in insertion
//! time order.

use eyre::{ensure, Result, WrapErr};
use hashbrown::HashMap;
use tracing::debug;

use crate::engine::{Store, Transaction};
use crate::errors::{self, Error};
use crate::index::{Index, Options};
use crate::records::{self, id, EncodedRecord, Field, FieldBuffer, KeyedRecord, Record, RecordView, Scanner};
use crate::schema::{self, IndexConfig};

/// A named collection of records.
#[derive(Debug)]
pub struct Table<'tx, T: Transaction> {
    tx: &'tx T,
    store: T::Store,
    name: String,
}

impl<'tx, T: Transaction> Table<'tx, T> {
    pub(crate) fn new(tx: &'tx T, store: T::Store, name: String) -> Table<'tx, T> {
        Table { tx, store, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Visits every record in record-ID order.
    ///
    /// The view passed to the callback aliases a buffer reused across
    /// invocations; clone into a [`FieldBuffer`] to retain a record.
    /// Callback errors stop the scan and surface, including the
    /// [`stop`](crate::errors::stop) sentinel.
    pub fn iterate(
        &self,
        f: &mut dyn FnMut(&[u8], &RecordView<'_>) -> Result<()>,
    ) -> Result<()> {
        self.store.ascend_greater_or_equal(None, &mut |record_id, blob| {
            let view = RecordView::new(blob)?;
            f(record_id, &view)
        })
    }

    /// Fetches one record by ID.
    pub fn get_record(&self, record_id: &[u8]) -> Result<EncodedRecord> {
        match self.store.get(record_id) {
            Ok(blob) => EncodedRecord::new(blob),
            Err(e) if errors::is(&e, &Error::KeyNotFound) => Err(Error::RecordNotFound.into()),
            Err(e) => Err(e).wrap_err_with(|| {
                format!("fetching record {:?}", String::from_utf8_lossy(record_id))
            }),
        }
    }

    /// Inserts a record and returns its ID.
    ///
    /// The ID comes from the record's `primary_key` capability when present,
    /// otherwise a ULID is generated. Collisions on the record ID or on any
    /// unique index fail with the [`Duplicate`](Error::Duplicate) sentinel;
    /// no compensating rollback is attempted, atomicity belongs to the
    /// enclosing transaction.
    pub fn insert(&self, record: &dyn Record) -> Result<Vec<u8>> {
        let blob = records::encode(record).wrap_err("encoding record")?;

        let record_id = match record.primary_key()? {
            Some(pk) => {
                ensure!(!pk.is_empty(), "primary key cannot be empty");
                pk
            }
            None => id::generate()?.to_vec(),
        };

        match self.store.get(&record_id) {
            Ok(_) => return Err(Error::Duplicate.into()),
            Err(e) if errors::is(&e, &Error::KeyNotFound) => {}
            Err(e) => return Err(e),
        }

        self.store.put(&record_id, &blob)?;

        for (field_name, index) in self.indexes()? {
            let field = match record.field(&field_name) {
                Ok(f) => f,
                // records without the indexed field are simply unindexed
                Err(e) if errors::is(&e, &Error::FieldNotFound) => continue,
                Err(e) => return Err(e),
            };
            // a unique-index collision surfaces as the same Duplicate
            // sentinel a record-id collision does
            index.set(&field.value, &record_id)?;
        }

        Ok(record_id)
    }

    /// Deletes a record by ID, updating every index.
    pub fn delete(&self, record_id: &[u8]) -> Result<()> {
        match self.store.delete(record_id) {
            Ok(()) => {}
            Err(e) if errors::is(&e, &Error::KeyNotFound) => {
                return Err(Error::RecordNotFound.into())
            }
            Err(e) => return Err(e),
        }

        for (_, index) in self.indexes()? {
            index.delete(record_id)?;
        }
        Ok(())
    }

    /// Replaces the record stored under `record_id`.
    ///
    /// The new record keeps `record_id` even if its own `primary_key`
    /// capability reports something else.
    pub fn replace(&self, record_id: &[u8], record: &dyn Record) -> Result<()> {
        self.delete(record_id)?;
        self.insert(&KeyedRecord::new(record, record_id))?;
        Ok(())
    }

    /// Deletes every record and every index entry, keeping the table and
    /// its index configuration.
    pub fn truncate(&self) -> Result<()> {
        self.store.truncate()?;
        for (_, index) in self.indexes()? {
            index.truncate()?;
        }
        Ok(())
    }

    /// Adds a field to every record that does not already have it. Pass
    /// `ty.zero_value()` to backfill with the type's default.
    pub fn add_field(&self, field: Field) -> Result<()> {
        self.rewrite(|buffer| {
            if buffer.get(&field.name).is_some() {
                return Ok(false);
            }
            buffer.add(field.clone());
            Ok(true)
        })
    }

    /// Removes a field from every record that has it.
    pub fn delete_field(&self, name: &str) -> Result<()> {
        self.rewrite(|buffer| {
            if buffer.get(name).is_none() {
                return Ok(false);
            }
            buffer.delete(name)?;
            Ok(true)
        })
    }

    /// Renames a field on every record that has it.
    pub fn rename_field(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.rewrite(|buffer| {
            let Some(found) = buffer.get(old_name) else {
                return Ok(false);
            };
            let renamed = Field::new(new_name, found.value.clone());
            buffer.replace(old_name, renamed)?;
            Ok(true)
        })
    }

    /// Full-table rewrite for schema mutations: decode each record into a
    /// buffer, let `mutate` edit it (returning false to skip), re-encode.
    fn rewrite(&self, mut mutate: impl FnMut(&mut FieldBuffer) -> Result<bool>) -> Result<()> {
        self.store.ascend_greater_or_equal(None, &mut |record_id, blob| {
            let view = RecordView::new(blob)?;
            let mut buffer = FieldBuffer::new();
            buffer.scan_record(&view)?;

            if !mutate(&mut buffer)? {
                return Ok(());
            }

            self.store.put(record_id, &records::encode(&buffer)?)
        })
    }

    /// Creates an index on `field`, failing with
    /// [`IndexAlreadyExists`](Error::IndexAlreadyExists) if one exists.
    /// Existing records are not indexed; call [`reindex`](Self::reindex)
    /// to backfill.
    pub fn create_index(&self, field: &str, opts: Options) -> Result<Index<T::Store>> {
        let catalog = schema::index_catalog_table(self.tx)?;
        let store_name = schema::index_store_name(&self.name, field);

        match catalog.get_record(store_name.as_bytes()) {
            Ok(_) => return Err(Error::IndexAlreadyExists.into()),
            Err(e) if errors::is(&e, &Error::RecordNotFound) => {}
            Err(e) => return Err(e),
        }

        catalog.insert(&IndexConfig::new(&self.name, field, opts.unique))?;
        self.tx
            .create_store(&store_name)
            .wrap_err_with(|| format!("creating index {field:?} on table {:?}", self.name))?;

        let store = match self.tx.store(&store_name) {
            Ok(s) => s,
            Err(e) if errors::is(&e, &Error::StoreNotFound) => {
                return Err(Error::IndexNotFound.into())
            }
            Err(e) => return Err(e),
        };

        debug!(table = %self.name, field, unique = opts.unique, "created index");
        Ok(Index::new(store, opts))
    }

    /// Like [`create_index`](Self::create_index), but returns the existing
    /// index instead of failing.
    pub fn create_index_if_not_exists(&self, field: &str, opts: Options) -> Result<Index<T::Store>> {
        match self.create_index(field, opts) {
            Ok(index) => Ok(index),
            Err(e) if errors::is(&e, &Error::IndexAlreadyExists) => self.get_index(field),
            Err(e) => Err(e),
        }
    }

    /// Ensures an index exists for each `(field, options)` pair. Newly
    /// created indexes are not backfilled.
    pub fn create_indexes_if_not_exist<'a>(
        &self,
        indexes: impl IntoIterator<Item = (&'a str, Options)>,
    ) -> Result<()> {
        for (field, opts) in indexes {
            self.create_index_if_not_exists(field, opts)?;
        }
        Ok(())
    }

    /// Returns the index on `field`.
    pub fn get_index(&self, field: &str) -> Result<Index<T::Store>> {
        let store_name = schema::index_store_name(&self.name, field);
        let opts = schema::read_index_options(self.tx, &store_name)?;

        let store = match self.tx.store(&store_name) {
            Ok(s) => s,
            Err(e) if errors::is(&e, &Error::StoreNotFound) => {
                return Err(Error::IndexNotFound.into())
            }
            Err(e) => return Err(e),
        };

        Ok(Index::new(store, opts))
    }

    /// All indexes of this table, keyed by field name.
    pub fn indexes(&self) -> Result<HashMap<String, Index<T::Store>>> {
        let prefix = schema::index_store_name(&self.name, "");
        let mut indexes = HashMap::new();
        for store_name in self.tx.list_stores(&prefix)? {
            let field = store_name[prefix.len()..].to_string();
            let index = self.get_index(&field)?;
            indexes.insert(field, index);
        }
        Ok(indexes)
    }

    /// Drops the index on `field` and its catalog record.
    pub fn drop_index(&self, field: &str) -> Result<()> {
        let catalog = schema::index_catalog_table(self.tx)?;
        let store_name = schema::index_store_name(&self.name, field);

        match catalog.delete(store_name.as_bytes()) {
            Ok(()) => {}
            Err(e) if errors::is(&e, &Error::RecordNotFound) => {
                return Err(Error::IndexNotFound.into())
            }
            Err(e) => return Err(e),
        }

        match self.tx.drop_store(&store_name) {
            Ok(()) => {
                debug!(table = %self.name, field, "dropped index");
                Ok(())
            }
            Err(e) if errors::is(&e, &Error::StoreNotFound) => Err(Error::IndexNotFound.into()),
            Err(e) => Err(e),
        }
    }

    /// Rebuilds the index on `field` from scratch: drop, recreate with the
    /// same options, then index every record that has the field.
    pub fn reindex(&self, field: &str) -> Result<()> {
        let store_name = schema::index_store_name(&self.name, field);
        let opts = schema::read_index_options(self.tx, &store_name)?;

        self.drop_index(field)?;
        let index = self.create_index(field, opts)?;

        debug!(table = %self.name, field, "reindexing");
        self.iterate(&mut |record_id, record| {
            match record.field(field) {
                Ok(f) => index.set(&f.value, record_id),
                Err(e) if errors::is(&e, &Error::FieldNotFound) => Ok(()),
                Err(e) => Err(e),
            }
        })
    }
}
