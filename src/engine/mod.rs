//! # Storage Engine Contract
//!
//! The database core is generic over an ordered key-value engine. Anything
//! that can provide named, bytewise-ordered sub-stores inside transactions
//! can back a database: a B-tree file, an LSM store, or the in-memory
//! engine shipped in [`memory`].
//!
//! ## Contract
//!
//! - Stores are ordered by bytewise key comparison.
//! - Iteration reflects writes made earlier in the same transaction.
//! - Transactions are single-writer / multi-reader: at most one writable
//!   transaction at a time, read transactions see a committed snapshot.
//! - A `get` miss is the [`KeyNotFound`](crate::errors::Error::KeyNotFound)
//!   sentinel; a missing store is
//!   [`StoreNotFound`](crate::errors::Error::StoreNotFound). The layers
//!   above translate these at their boundaries.
//! - Dropping a transaction without committing rolls it back.
//!
//! Iteration callbacks may return any error to halt the traversal; the
//! error is surfaced to the `ascend`/`descend` caller, including the
//! [`stop`](crate::errors::stop) sentinel, which callers strip with
//! [`filter_stop`](crate::errors::filter_stop).

pub mod memory;

use eyre::Result;

pub use memory::MemoryEngine;

/// Visitor for ordered traversal. Receives `(key, value)` slices valid only
/// for the duration of the call.
pub type IterFn<'f> = dyn FnMut(&[u8], &[u8]) -> Result<()> + 'f;

/// An ordered key-value namespace.
pub trait Store {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Removes every entry, keeping the store itself.
    fn truncate(&self) -> Result<()>;

    /// Visits entries with key >= `pivot` in ascending key order; a `None`
    /// pivot starts at the first entry.
    fn ascend_greater_or_equal(&self, pivot: Option<&[u8]>, f: &mut IterFn<'_>) -> Result<()>;

    /// Visits entries with key <= `pivot` in descending key order; a `None`
    /// pivot starts at the last entry.
    fn descend_less_or_equal(&self, pivot: Option<&[u8]>, f: &mut IterFn<'_>) -> Result<()>;
}

/// A transaction over the engine's named stores.
pub trait Transaction {
    type Store: Store;

    fn create_store(&self, name: &str) -> Result<()>;

    fn store(&self, name: &str) -> Result<Self::Store>;

    fn drop_store(&self, name: &str) -> Result<()>;

    /// Names of all stores starting with `prefix`, in ascending order.
    fn list_stores(&self, prefix: &str) -> Result<Vec<String>>;

    fn commit(self) -> Result<()>;

    fn rollback(self) -> Result<()>;
}

/// A storage engine producing transactions.
pub trait Engine {
    type Transaction: Transaction;

    fn begin(&self, writable: bool) -> Result<Self::Transaction>;
}
