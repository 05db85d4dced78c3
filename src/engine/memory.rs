//! # In-Memory Engine
//!
//! A transactional, ordered key-value engine backed by `BTreeMap`s. It is
//! the engine behind the test suite and a reasonable choice for throwaway
//! databases.
//!
//! ## Transaction Model
//!
//! A writable transaction copies every store's entries at `begin` and works
//! on the copy; `commit` publishes the whole working set in one swap, so
//! readers holding the previous snapshot are never disturbed. At most one
//! writable transaction exists at a time; a second `begin(true)` fails
//! rather than blocking. Dropping a writable transaction without committing
//! releases the writer slot, discarding the working set.
//!
//! Iteration snapshots the visited range before invoking callbacks, so a
//! callback may freely mutate the store it is iterating.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use eyre::{bail, ensure, Result};
use parking_lot::RwLock;

use crate::engine::{Engine, IterFn, Store, Transaction};
use crate::errors::Error;

type Entries = BTreeMap<Vec<u8>, Vec<u8>>;
type StoreMap = BTreeMap<String, Arc<RwLock<Entries>>>;

#[derive(Debug)]
struct Shared {
    stores: RwLock<StoreMap>,
    writer: AtomicBool,
}

/// The in-memory storage engine.
#[derive(Clone, Debug)]
pub struct MemoryEngine {
    shared: Arc<Shared>,
}

impl MemoryEngine {
    pub fn new() -> MemoryEngine {
        MemoryEngine {
            shared: Arc::new(Shared {
                stores: RwLock::new(StoreMap::new()),
                writer: AtomicBool::new(false),
            }),
        }
    }
}

impl Default for MemoryEngine {
    fn default() -> MemoryEngine {
        MemoryEngine::new()
    }
}

impl Engine for MemoryEngine {
    type Transaction = MemoryTransaction;

    fn begin(&self, writable: bool) -> Result<MemoryTransaction> {
        let working = if writable {
            if self
                .shared
                .writer
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                bail!("a write transaction is already in progress");
            }
            self.shared
                .stores
                .read()
                .iter()
                .map(|(name, entries)| {
                    let copy = entries.read().clone();
                    (name.clone(), Arc::new(RwLock::new(copy)))
                })
                .collect()
        } else {
            self.shared.stores.read().clone()
        };

        Ok(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            working: RwLock::new(working),
            writable,
            done: AtomicBool::new(false),
        })
    }
}

#[derive(Debug)]
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    working: RwLock<StoreMap>,
    writable: bool,
    done: AtomicBool,
}

impl Transaction for MemoryTransaction {
    type Store = MemoryStore;

    fn create_store(&self, name: &str) -> Result<()> {
        ensure!(self.writable, "cannot create a store in a read-only transaction");
        ensure!(!name.is_empty(), "store name cannot be empty");
        let mut working = self.working.write();
        if working.contains_key(name) {
            return Err(Error::StoreAlreadyExists.into());
        }
        working.insert(name.to_string(), Arc::new(RwLock::new(Entries::new())));
        Ok(())
    }

    fn store(&self, name: &str) -> Result<MemoryStore> {
        match self.working.read().get(name) {
            Some(entries) => Ok(MemoryStore {
                entries: Arc::clone(entries),
                writable: self.writable,
            }),
            None => Err(Error::StoreNotFound.into()),
        }
    }

    fn drop_store(&self, name: &str) -> Result<()> {
        ensure!(self.writable, "cannot drop a store in a read-only transaction");
        match self.working.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(Error::StoreNotFound.into()),
        }
    }

    fn list_stores(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .working
            .read()
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn commit(self) -> Result<()> {
        ensure!(self.writable, "cannot commit a read-only transaction");
        *self.shared.stores.write() = std::mem::take(&mut *self.working.write());
        self.done.store(true, Ordering::Release);
        self.shared.writer.store(false, Ordering::Release);
        Ok(())
    }

    fn rollback(self) -> Result<()> {
        self.done.store(true, Ordering::Release);
        if self.writable {
            self.shared.writer.store(false, Ordering::Release);
        }
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.writable && !self.done.load(Ordering::Acquire) {
            self.shared.writer.store(false, Ordering::Release);
        }
    }
}

/// Handle to one named store within a transaction.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    entries: Arc<RwLock<Entries>>,
    writable: bool,
}

impl MemoryStore {
    fn snapshot_ascending(&self, pivot: Option<&[u8]>) -> Vec<(Vec<u8>, Vec<u8>)> {
        let entries = self.entries.read();
        let range: Box<dyn Iterator<Item = (&Vec<u8>, &Vec<u8>)>> = match pivot {
            Some(p) => Box::new(entries.range::<[u8], _>((Bound::Included(p), Bound::Unbounded))),
            None => Box::new(entries.iter()),
        };
        range.map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    fn snapshot_descending(&self, pivot: Option<&[u8]>) -> Vec<(Vec<u8>, Vec<u8>)> {
        let entries = self.entries.read();
        let range: Box<dyn Iterator<Item = (&Vec<u8>, &Vec<u8>)>> = match pivot {
            Some(p) => Box::new(
                entries
                    .range::<[u8], _>((Bound::Unbounded, Bound::Included(p)))
                    .rev(),
            ),
            None => Box::new(entries.iter().rev()),
        };
        range.map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound.into())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        ensure!(self.writable, "cannot write through a read-only transaction");
        ensure!(!key.is_empty(), "key cannot be empty");
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        ensure!(self.writable, "cannot delete through a read-only transaction");
        match self.entries.write().remove(key) {
            Some(_) => Ok(()),
            None => Err(Error::KeyNotFound.into()),
        }
    }

    fn truncate(&self) -> Result<()> {
        ensure!(self.writable, "cannot truncate through a read-only transaction");
        self.entries.write().clear();
        Ok(())
    }

    fn ascend_greater_or_equal(&self, pivot: Option<&[u8]>, f: &mut IterFn<'_>) -> Result<()> {
        for (k, v) in self.snapshot_ascending(pivot) {
            f(&k, &v)?;
        }
        Ok(())
    }

    fn descend_less_or_equal(&self, pivot: Option<&[u8]>, f: &mut IterFn<'_>) -> Result<()> {
        for (k, v) in self.snapshot_descending(pivot) {
            f(&k, &v)?;
        }
        Ok(())
    }
}
