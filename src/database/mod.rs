//! # Database Handles and Transactions
//!
//! [`Database`] wraps a storage engine and hands out transactions; a
//! [`Tx`] resolves table names into [`Table`] handles through the catalog.
//! All mutations inside one transaction commit or roll back together —
//! the table layer performs no compensating writes of its own.
//!
//! ## Usage
//!
//! ```ignore
//! let db = Database::new(MemoryEngine::new())?;
//!
//! db.update(|tx| {
//!     let users = tx.create_table("users")?;
//!     users.insert(&record)?;
//!     Ok(())
//! })?;
//!
//! db.view(|tx| {
//!     let users = tx.table("users")?;
//!     users.iterate(&mut |id, record| { /* ... */ Ok(()) })
//! })?;
//! ```
//!
//! `update` commits when the closure succeeds and rolls back when it fails;
//! `view` always rolls back its read transaction.

mod table;

use eyre::Result;

pub use table::Table;

use crate::engine::{Engine, Transaction};
use crate::errors::{self, Error};
use crate::schema;

/// A database over a storage engine.
pub struct Database<E: Engine> {
    engine: E,
}

impl<E: Engine> Database<E> {
    /// Opens a database, creating the catalog stores on first use.
    pub fn new(engine: E) -> Result<Database<E>> {
        let tx = engine.begin(true)?;
        schema::ensure_catalog(&tx)?;
        tx.commit()?;
        Ok(Database { engine })
    }

    pub fn begin(&self, writable: bool) -> Result<Tx<E::Transaction>> {
        Ok(Tx {
            inner: self.engine.begin(writable)?,
            writable,
        })
    }

    /// Runs `f` in a read transaction, rolling it back afterwards.
    pub fn view<T>(&self, f: impl FnOnce(&Tx<E::Transaction>) -> Result<T>) -> Result<T> {
        let tx = self.begin(false)?;
        let out = f(&tx)?;
        tx.rollback()?;
        Ok(out)
    }

    /// Runs `f` in a write transaction, committing on success and rolling
    /// back on error.
    pub fn update<T>(&self, f: impl FnOnce(&Tx<E::Transaction>) -> Result<T>) -> Result<T> {
        let tx = self.begin(true)?;
        match f(&tx) {
            Ok(out) => {
                tx.commit()?;
                Ok(out)
            }
            Err(e) => {
                let _ = tx.rollback();
                Err(e)
            }
        }
    }
}

/// A transaction handle resolving tables through the catalog.
pub struct Tx<T: Transaction> {
    inner: T,
    writable: bool,
}

impl<T: Transaction> Tx<T> {
    pub fn writable(&self) -> bool {
        self.writable
    }

    pub fn commit(self) -> Result<()> {
        self.inner.commit()
    }

    pub fn rollback(self) -> Result<()> {
        self.inner.rollback()
    }

    /// Registers a new table and returns its handle.
    pub fn create_table(&self, name: &str) -> Result<Table<'_, T>> {
        schema::create_table(&self.inner, name)?;
        self.table(name)
    }

    /// Returns a handle to an existing table.
    pub fn table(&self, name: &str) -> Result<Table<'_, T>> {
        match self.inner.store(name) {
            Ok(store) => Ok(Table::new(&self.inner, store, name.to_string())),
            Err(e) if errors::is(&e, &Error::StoreNotFound) => {
                Err(Error::TableNotFound.into())
            }
            Err(e) => Err(e),
        }
    }

    /// Drops a table, its records, its indexes, and their catalog entries.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        schema::drop_table(&self.inner, name)
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        schema::list_tables(&self.inner)
    }
}
