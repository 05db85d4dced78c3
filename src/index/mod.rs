//! # Secondary Indexes
//!
//! An index maps encoded field values to record IDs inside one engine
//! sub-store. Two variants exist: **unique** indexes reject a second entry
//! at the same value, **non-unique** indexes append the record ID to the key
//! so any number of records may share a value.
//!
//! ## Entry Layout
//!
//! The store holds two disjoint key spaces, distinguished by a prefix byte:
//!
//! ```text
//! forward (0x01):
//!     unique      0x01 ‖ valueKey                      -> recordID
//!     non-unique  0x01 ‖ valueKey ‖ 0x1F ‖ recordID    -> recordID
//! reverse (0x02):
//!     0x02 ‖ recordID -> valueKey
//! ```
//!
//! `valueKey` is the order-preserving canonical encoding, with Text and Blob
//! length-prefixed so the unit-separator byte cannot be forged from inside a
//! value. The reverse space makes [`Index::delete`] a point lookup instead
//! of a scan. Non-unique forward entries carry the record ID redundantly as
//! the entry value, so traversal can split the composite key without knowing
//! the value's encoded width.
//!
//! ## Traversal
//!
//! [`Index::ascend_greater_or_equal`] and [`Index::descend_less_or_equal`]
//! visit forward entries in value order, handing the callback
//! `(valueKey, recordID)`. Callback errors stop the traversal and surface,
//! including the [`stop`](crate::errors::stop) sentinel.

use std::fmt;

use eyre::{ensure, Result};

use crate::encoding::encode_index_key;
use crate::engine::Store;
use crate::errors::{self, Error};
use crate::types::Value;

const FORWARD: u8 = 0x01;
const REVERSE: u8 = 0x02;

/// ASCII unit separator between value key and record ID in composite keys.
const SEPARATOR: u8 = 0x1F;

/// Index configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub unique: bool,
}

/// Internal sentinel ending a range scan when it leaves the forward space.
#[derive(Debug)]
struct RangeExhausted;

impl fmt::Display for RangeExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("range exhausted")
    }
}

impl std::error::Error for RangeExhausted {}

/// A secondary index over one engine sub-store.
#[derive(Debug)]
pub struct Index<S: Store> {
    store: S,
    opts: Options,
}

impl<S: Store> Index<S> {
    pub fn new(store: S, opts: Options) -> Index<S> {
        Index { store, opts }
    }

    pub fn is_unique(&self) -> bool {
        self.opts.unique
    }

    /// Inserts an entry for `record_id` at `value`.
    ///
    /// On a unique index, a second insert at an existing value fails with
    /// the [`Duplicate`](Error::Duplicate) sentinel.
    pub fn set(&self, value: &Value, record_id: &[u8]) -> Result<()> {
        ensure!(!record_id.is_empty(), "record id cannot be empty");

        let mut value_key = Vec::new();
        encode_index_key(value, &mut value_key);

        let forward = self.forward_key(&value_key, record_id);
        if self.opts.unique {
            match self.store.get(&forward) {
                Ok(_) => return Err(Error::Duplicate.into()),
                Err(e) if errors::is(&e, &Error::KeyNotFound) => {}
                Err(e) => return Err(e),
            }
        }

        self.store.put(&forward, record_id)?;
        self.store.put(&reverse_key(record_id), &value_key)
    }

    /// Removes the entry referencing `record_id`, if any.
    pub fn delete(&self, record_id: &[u8]) -> Result<()> {
        let reverse = reverse_key(record_id);
        let value_key = match self.store.get(&reverse) {
            Ok(v) => v,
            Err(e) if errors::is(&e, &Error::KeyNotFound) => return Ok(()),
            Err(e) => return Err(e),
        };

        self.store.delete(&self.forward_key(&value_key, record_id))?;
        self.store.delete(&reverse)
    }

    /// Removes every entry, keeping the index itself.
    pub fn truncate(&self) -> Result<()> {
        self.store.truncate()
    }

    /// Visits entries with value >= `pivot` in ascending value order.
    /// The callback receives `(valueKey, recordID)`.
    pub fn ascend_greater_or_equal(
        &self,
        pivot: Option<&Value>,
        f: &mut dyn FnMut(&[u8], &[u8]) -> Result<()>,
    ) -> Result<()> {
        let mut start = vec![FORWARD];
        if let Some(v) = pivot {
            encode_index_key(v, &mut start);
        }

        let res = self.store.ascend_greater_or_equal(Some(&start), &mut |k, v| {
            if k.first() != Some(&FORWARD) {
                return Err(RangeExhausted.into());
            }
            let (value_key, record_id) = self.split_forward(k, v)?;
            f(value_key, record_id)
        });
        strip_exhausted(res)
    }

    /// Visits entries with value <= `pivot` in descending value order.
    /// The callback receives `(valueKey, recordID)`.
    pub fn descend_less_or_equal(
        &self,
        pivot: Option<&Value>,
        f: &mut dyn FnMut(&[u8], &[u8]) -> Result<()>,
    ) -> Result<()> {
        let start = match pivot {
            Some(v) => {
                let mut key = vec![FORWARD];
                encode_index_key(v, &mut key);
                // past every composite entry sharing the pivot's value key
                key.push(0xFF);
                key
            }
            // just below the reverse space: the whole forward space qualifies
            None => vec![REVERSE],
        };

        let res = self.store.descend_less_or_equal(Some(&start), &mut |k, v| {
            if k.first() != Some(&FORWARD) {
                return Ok(());
            }
            let (value_key, record_id) = self.split_forward(k, v)?;
            f(value_key, record_id)
        });
        strip_exhausted(res)
    }

    fn forward_key(&self, value_key: &[u8], record_id: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(1 + value_key.len() + 1 + record_id.len());
        key.push(FORWARD);
        key.extend_from_slice(value_key);
        if !self.opts.unique {
            key.push(SEPARATOR);
            key.extend_from_slice(record_id);
        }
        key
    }

    /// Splits a forward entry back into `(valueKey, recordID)`.
    fn split_forward<'k>(&self, key: &'k [u8], value: &'k [u8]) -> Result<(&'k [u8], &'k [u8])> {
        if self.opts.unique {
            return Ok((&key[1..], value));
        }
        let record_id = value;
        let split = key
            .len()
            .checked_sub(record_id.len() + 1)
            .filter(|&i| key[i] == SEPARATOR)
            .ok_or_else(|| errors::decode("malformed composite index key"))?;
        Ok((&key[1..split], record_id))
    }
}

fn reverse_key(record_id: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + record_id.len());
    key.push(REVERSE);
    key.extend_from_slice(record_id);
    key
}

fn strip_exhausted(res: Result<()>) -> Result<()> {
    match res {
        Err(e) if e.downcast_ref::<RangeExhausted>().is_some() => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, MemoryEngine, Transaction};

    fn test_index(unique: bool) -> (impl Transaction, Options) {
        let engine = MemoryEngine::new();
        let tx = engine.begin(true).unwrap();
        tx.create_store("idx").unwrap();
        (tx, Options { unique })
    }

    fn collect(idx: &Index<impl Store>, pivot: Option<&Value>, descending: bool) -> Vec<Vec<u8>> {
        let mut ids = Vec::new();
        let mut push = |_: &[u8], id: &[u8]| {
            ids.push(id.to_vec());
            Ok(())
        };
        if descending {
            idx.descend_less_or_equal(pivot, &mut push).unwrap();
        } else {
            idx.ascend_greater_or_equal(pivot, &mut push).unwrap();
        }
        ids
    }

    #[test]
    fn non_unique_index_keeps_every_record_id_in_value_order() {
        let (tx, opts) = test_index(false);
        let idx = Index::new(tx.store("idx").unwrap(), opts);

        idx.set(&Value::Int(30), b"rec3").unwrap();
        idx.set(&Value::Int(10), b"rec1").unwrap();
        idx.set(&Value::Int(10), b"rec2").unwrap();

        assert_eq!(
            collect(&idx, None, false),
            [b"rec1".to_vec(), b"rec2".to_vec(), b"rec3".to_vec()]
        );
    }

    #[test]
    fn unique_index_rejects_second_value() {
        let (tx, opts) = test_index(true);
        let idx = Index::new(tx.store("idx").unwrap(), opts);

        idx.set(&Value::Text("x".into()), b"rec1").unwrap();
        let err = idx.set(&Value::Text("x".into()), b"rec2").unwrap_err();
        assert!(errors::is(&err, &Error::Duplicate));

        // a different value is fine
        idx.set(&Value::Text("y".into()), b"rec2").unwrap();
    }

    #[test]
    fn delete_removes_both_entry_spaces() {
        let (tx, opts) = test_index(false);
        let idx = Index::new(tx.store("idx").unwrap(), opts);

        idx.set(&Value::Int(1), b"rec1").unwrap();
        idx.set(&Value::Int(2), b"rec2").unwrap();
        idx.delete(b"rec1").unwrap();

        assert_eq!(collect(&idx, None, false), [b"rec2".to_vec()]);
        // idempotent for ids that have no entry
        idx.delete(b"rec1").unwrap();
        idx.delete(b"ghost").unwrap();
    }

    #[test]
    fn ascend_honors_pivot() {
        let (tx, opts) = test_index(false);
        let idx = Index::new(tx.store("idx").unwrap(), opts);
        for (v, id) in [(5, b"a"), (10, b"b"), (15, b"c")] {
            idx.set(&Value::Int(v), id).unwrap();
        }

        assert_eq!(
            collect(&idx, Some(&Value::Int(10)), false),
            [b"b".to_vec(), b"c".to_vec()]
        );
    }

    #[test]
    fn descend_honors_pivot_and_order() {
        let (tx, opts) = test_index(false);
        let idx = Index::new(tx.store("idx").unwrap(), opts);
        for (v, id) in [(5, b"a"), (10, b"b"), (15, b"c")] {
            idx.set(&Value::Int(v), id).unwrap();
        }

        assert_eq!(
            collect(&idx, Some(&Value::Int(10)), true),
            [b"b".to_vec(), b"a".to_vec()]
        );
        assert_eq!(
            collect(&idx, None, true),
            [b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]
        );
    }

    #[test]
    fn negative_values_sort_below_positive() {
        let (tx, opts) = test_index(false);
        let idx = Index::new(tx.store("idx").unwrap(), opts);
        for (v, id) in [(7i64, b"p"), (-7, b"n"), (0, b"z")] {
            idx.set(&Value::Int(v), id).unwrap();
        }

        assert_eq!(
            collect(&idx, None, false),
            [b"n".to_vec(), b"z".to_vec(), b"p".to_vec()]
        );
    }

    #[test]
    fn text_values_with_separator_bytes_are_safe() {
        let (tx, opts) = test_index(false);
        let idx = Index::new(tx.store("idx").unwrap(), opts);

        let tricky = Value::Text("a\u{1F}b".into());
        idx.set(&tricky, b"rec1").unwrap();

        let mut seen = Vec::new();
        idx.ascend_greater_or_equal(None, &mut |_, id| {
            seen.push(id.to_vec());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, [b"rec1".to_vec()]);

        idx.delete(b"rec1").unwrap();
        assert!(collect(&idx, None, false).is_empty());
    }

    #[test]
    fn callback_stop_sentinel_surfaces() {
        let (tx, opts) = test_index(false);
        let idx = Index::new(tx.store("idx").unwrap(), opts);
        for (v, id) in [(1, b"a"), (2, b"b")] {
            idx.set(&Value::Int(v), id).unwrap();
        }

        let mut seen = 0;
        let err = idx
            .ascend_greater_or_equal(None, &mut |_, _| {
                seen += 1;
                Err(errors::stop())
            })
            .unwrap_err();
        assert!(errors::is_stop(&err));
        assert_eq!(seen, 1);
    }

    #[test]
    fn unique_index_reports_record_id_for_value() {
        let (tx, opts) = test_index(true);
        let idx = Index::new(tx.store("idx").unwrap(), opts);
        idx.set(&Value::Int(42), b"the-rec").unwrap();

        let mut pairs = Vec::new();
        idx.ascend_greater_or_equal(None, &mut |vk, id| {
            pairs.push((vk.to_vec(), id.to_vec()));
            Ok(())
        })
        .unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].1, b"the-rec");
        assert_eq!(
            pairs[0].0,
            crate::encoding::encode_value(&Value::Int(42))
        );
    }
}
