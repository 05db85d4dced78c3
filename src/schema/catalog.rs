//! Catalog operations over the reserved stores.

use eyre::{ensure, Result, WrapErr};
use tracing::debug;

use crate::database::Table;
use crate::engine::{Store, Transaction};
use crate::errors::{self, Error};
use crate::index::Options;
use crate::records::{self, Field, FieldBuffer, Record};
use crate::schema::{INDEXES_STORE, INDEX_PREFIX, NAME_SEPARATOR, RESERVED_PREFIX, TABLES_STORE};
use crate::types::Value;

/// Builds the backing-store name for an index on `table.field`.
///
/// With an empty field this is the listing prefix for all of a table's
/// indexes.
pub fn index_store_name(table: &str, field: &str) -> String {
    let mut name = String::with_capacity(INDEX_PREFIX.len() + table.len() + 1 + field.len());
    name.push_str(INDEX_PREFIX);
    name.push_str(table);
    name.push(NAME_SEPARATOR);
    name.push_str(field);
    name
}

/// Creates the reserved catalog stores if this is a fresh database.
pub fn ensure_catalog<T: Transaction>(tx: &T) -> Result<()> {
    for name in [TABLES_STORE, INDEXES_STORE] {
        match tx.create_store(name) {
            Ok(()) => {}
            Err(e) if errors::is(&e, &Error::StoreAlreadyExists) => {}
            Err(e) => return Err(e).wrap_err("initializing catalog stores"),
        }
    }
    Ok(())
}

/// Registers `name` in the table catalog and creates its backing store.
pub fn create_table<T: Transaction>(tx: &T, name: &str) -> Result<()> {
    ensure!(!name.is_empty(), "table name cannot be empty");
    ensure!(
        !name.starts_with(RESERVED_PREFIX),
        "table name {name:?} uses the reserved catalog prefix"
    );

    let tables = tx.store(TABLES_STORE)?;
    match tables.get(name.as_bytes()) {
        Ok(_) => return Err(Error::TableAlreadyExists.into()),
        Err(e) if errors::is(&e, &Error::KeyNotFound) => {}
        Err(e) => return Err(e),
    }

    let mut config = FieldBuffer::new();
    config.add(Field::text("name", name));
    tables.put(name.as_bytes(), &records::encode(&config)?)?;

    tx.create_store(name)
        .wrap_err_with(|| format!("creating store for table {name:?}"))?;
    debug!(table = name, "created table");
    Ok(())
}

/// Unregisters `name`, dropping its store, its indexes, and their catalog
/// records.
pub fn drop_table<T: Transaction>(tx: &T, name: &str) -> Result<()> {
    let tables = tx.store(TABLES_STORE)?;
    match tables.delete(name.as_bytes()) {
        Ok(()) => {}
        Err(e) if errors::is(&e, &Error::KeyNotFound) => {
            return Err(Error::TableNotFound.into())
        }
        Err(e) => return Err(e),
    }

    let catalog = index_catalog_table(tx)?;
    for store_name in tx.list_stores(&index_store_name(name, ""))? {
        catalog.delete(store_name.as_bytes())?;
        tx.drop_store(&store_name)?;
    }

    tx.drop_store(name)?;
    debug!(table = name, "dropped table");
    Ok(())
}

/// Table names registered in the catalog, in ascending order.
pub fn list_tables<T: Transaction>(tx: &T) -> Result<Vec<String>> {
    let tables = tx.store(TABLES_STORE)?;
    let mut names = Vec::new();
    tables.ascend_greater_or_equal(None, &mut |key, _| {
        names.push(
            std::str::from_utf8(key)
                .map_err(|e| errors::decode(format!("invalid table name in catalog: {e}")))?
                .to_string(),
        );
        Ok(())
    })?;
    Ok(names)
}

/// The index catalog, viewed as an ordinary table of [`IndexConfig`]
/// records.
pub fn index_catalog_table<T: Transaction>(tx: &T) -> Result<Table<'_, T>> {
    let store = tx.store(INDEXES_STORE)?;
    Ok(Table::new(tx, store, INDEXES_STORE.to_string()))
}

/// Reads the options record for the index backed by `store_name`.
pub fn read_index_options<T: Transaction>(tx: &T, store_name: &str) -> Result<Options> {
    let catalog = index_catalog_table(tx)?;
    let record = match catalog.get_record(store_name.as_bytes()) {
        Ok(r) => r,
        Err(e) if errors::is(&e, &Error::RecordNotFound) => {
            return Err(Error::IndexNotFound.into())
        }
        Err(e) => return Err(e),
    };
    Ok(IndexConfig::from_record(&record)?.options())
}

/// Catalog record describing one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub table_name: String,
    pub field_name: String,
    pub unique: bool,
}

impl IndexConfig {
    pub fn new(table_name: impl Into<String>, field_name: impl Into<String>, unique: bool) -> Self {
        IndexConfig {
            table_name: table_name.into(),
            field_name: field_name.into(),
            unique,
        }
    }

    pub fn options(&self) -> Options {
        Options {
            unique: self.unique,
        }
    }

    pub fn from_record(record: &dyn Record) -> Result<IndexConfig> {
        let table_name = match record.field("table_name")?.value {
            Value::Text(s) => s,
            other => return Err(errors::decode(format!("table_name is {other:?}"))),
        };
        let field_name = match record.field("field_name")?.value {
            Value::Text(s) => s,
            other => return Err(errors::decode(format!("field_name is {other:?}"))),
        };
        let unique = match record.field("unique")?.value {
            Value::Bool(b) => b,
            other => return Err(errors::decode(format!("unique is {other:?}"))),
        };
        Ok(IndexConfig {
            table_name,
            field_name,
            unique,
        })
    }
}

impl Record for IndexConfig {
    fn field(&self, name: &str) -> Result<Field> {
        match name {
            "table_name" => Ok(Field::text("table_name", self.table_name.clone())),
            "field_name" => Ok(Field::text("field_name", self.field_name.clone())),
            "unique" => Ok(Field::bool("unique", self.unique)),
            _ => Err(Error::FieldNotFound.into()),
        }
    }

    fn iterate(&self, f: &mut dyn FnMut(Field) -> Result<()>) -> Result<()> {
        f(Field::text("table_name", self.table_name.clone()))?;
        f(Field::text("field_name", self.field_name.clone()))?;
        f(Field::bool("unique", self.unique))
    }

    fn primary_key(&self) -> Result<Option<Vec<u8>>> {
        Ok(Some(
            index_store_name(&self.table_name, &self.field_name).into_bytes(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_store_names_nest_under_the_table_prefix() {
        let full = index_store_name("users", "email");
        let prefix = index_store_name("users", "");
        assert!(full.starts_with(&prefix));
        assert_eq!(&full[prefix.len()..], "email");
        // a table whose name extends another's must not share the prefix
        assert!(!index_store_name("users_archive", "email").starts_with(&prefix));
    }

    #[test]
    fn index_config_round_trips_through_a_record() {
        let config = IndexConfig::new("users", "email", true);
        let blob = records::encode(&config).unwrap();
        let view = crate::records::RecordView::new(&blob).unwrap();
        assert_eq!(IndexConfig::from_record(&view).unwrap(), config);
    }

    #[test]
    fn index_config_primary_key_is_the_store_name() {
        let config = IndexConfig::new("users", "email", false);
        assert_eq!(
            config.primary_key().unwrap().unwrap(),
            index_store_name("users", "email").into_bytes()
        );
    }
}
