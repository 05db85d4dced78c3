//! # Secondary Index Maintenance Tests
//!
//! Verifies that indexes stay consistent with table contents through
//! insert, delete, replace, reindex, and drop, and that the catalog's
//! index records stay in one-to-one correspondence with index stores.

use vellum::errors::{self, Error};
use vellum::index::Options;
use vellum::{Database, Field, FieldBuffer, MemoryEngine, Value};

fn test_db() -> Database<MemoryEngine> {
    Database::new(MemoryEngine::new()).unwrap()
}

fn named(name: &str) -> FieldBuffer {
    let mut fb = FieldBuffer::new();
    fb.add(Field::text("name", name));
    fb
}

#[test]
fn non_unique_index_returns_duplicates_in_insertion_order() {
    let db = test_db();
    db.update(|tx| {
        let table = tx.create_table("users")?;
        table.create_index("name", Options::default())?;

        let first = table.insert(&named("a"))?;
        let second = table.insert(&named("a"))?;

        let index = table.get_index("name")?;
        let mut ids = Vec::new();
        index.ascend_greater_or_equal(None, &mut |_, id| {
            ids.push(id.to_vec());
            Ok(())
        })?;
        assert_eq!(ids, [first, second], "ULID order is insertion time order");
        Ok(())
    })
    .unwrap();
}

#[test]
fn unique_index_rejects_duplicate_at_table_level() {
    let db = test_db();
    db.update(|tx| {
        let table = tx.create_table("users")?;
        table.create_index("email", Options { unique: true })?;

        let mut r = FieldBuffer::new();
        r.add(Field::text("email", "x"));
        table.insert(&r)?;

        let err = table.insert(&r).unwrap_err();
        assert!(errors::is(&err, &Error::Duplicate));
        Ok(())
    })
    .unwrap();
}

#[test]
fn delete_removes_index_entries() {
    let db = test_db();
    db.update(|tx| {
        let table = tx.create_table("users")?;
        table.create_index("name", Options::default())?;

        let id = table.insert(&named("gone"))?;
        table.insert(&named("kept"))?;
        table.delete(&id)?;

        let index = table.get_index("name")?;
        let mut ids = Vec::new();
        index.ascend_greater_or_equal(None, &mut |_, rid| {
            ids.push(rid.to_vec());
            Ok(())
        })?;
        assert_eq!(ids.len(), 1);
        assert!(!ids.contains(&id));
        Ok(())
    })
    .unwrap();
}

#[test]
fn replace_moves_index_entries_to_the_new_value() {
    let db = test_db();
    db.update(|tx| {
        let table = tx.create_table("users")?;
        table.create_index("email", Options { unique: true })?;

        let mut r = FieldBuffer::new();
        r.add(Field::text("email", "old@x"));
        let id = table.insert(&r)?;

        let mut replacement = FieldBuffer::new();
        replacement.add(Field::text("email", "new@x"));
        table.replace(&id, &replacement)?;

        // the old value is free again, the new one is taken
        let mut back = FieldBuffer::new();
        back.add(Field::text("email", "old@x"));
        table.insert(&back)?;

        let err = table.insert(&replacement).unwrap_err();
        assert!(errors::is(&err, &Error::Duplicate));
        Ok(())
    })
    .unwrap();
}

#[test]
fn records_without_the_indexed_field_are_unindexed() {
    let db = test_db();
    db.update(|tx| {
        let table = tx.create_table("users")?;
        table.create_index("email", Options { unique: true })?;

        let mut no_email = FieldBuffer::new();
        no_email.add(Field::int("n", 1));
        table.insert(&no_email)?;
        table.insert(&no_email)?;

        let index = table.get_index("email")?;
        let mut count = 0;
        index.ascend_greater_or_equal(None, &mut |_, _| {
            count += 1;
            Ok(())
        })?;
        assert_eq!(count, 0);
        Ok(())
    })
    .unwrap();
}

#[test]
fn reindex_backfills_existing_records() {
    let db = test_db();
    db.update(|tx| {
        let table = tx.create_table("users")?;
        table.insert(&named("b"))?;
        table.insert(&named("a"))?;

        // created after the inserts, so it starts empty
        table.create_index("name", Options::default())?;
        let index = table.get_index("name")?;
        let mut count = 0;
        index.ascend_greater_or_equal(None, &mut |_, _| {
            count += 1;
            Ok(())
        })?;
        assert_eq!(count, 0);

        table.reindex("name")?;

        let index = table.get_index("name")?;
        let mut values = Vec::new();
        index.ascend_greater_or_equal(None, &mut |vk, _| {
            values.push(vk.to_vec());
            Ok(())
        })?;
        assert_eq!(values.len(), 2);
        assert!(values[0] < values[1], "values come back in sorted order");
        Ok(())
    })
    .unwrap();
}

#[test]
fn reindex_missing_index_is_an_error() {
    let db = test_db();
    db.update(|tx| {
        let table = tx.create_table("users")?;
        let err = table.reindex("ghost").unwrap_err();
        assert!(errors::is(&err, &Error::IndexNotFound));
        Ok(())
    })
    .unwrap();
}

#[test]
fn create_and_drop_keep_catalog_consistent() {
    let db = test_db();
    db.update(|tx| {
        let table = tx.create_table("users")?;

        table.create_index("name", Options::default())?;
        table.create_index("email", Options { unique: true })?;

        let err = table.create_index("name", Options::default()).unwrap_err();
        assert!(errors::is(&err, &Error::IndexAlreadyExists));

        let indexes = table.indexes()?;
        assert_eq!(indexes.len(), 2);
        assert!(!indexes["name"].is_unique());
        assert!(indexes["email"].is_unique());

        table.drop_index("name")?;
        assert_eq!(table.indexes()?.len(), 1);

        let err = table.drop_index("name").unwrap_err();
        assert!(errors::is(&err, &Error::IndexNotFound));

        let err = table.get_index("name").unwrap_err();
        assert!(errors::is(&err, &Error::IndexNotFound));
        Ok(())
    })
    .unwrap();
}

#[test]
fn create_index_if_not_exists_is_idempotent() {
    let db = test_db();
    db.update(|tx| {
        let table = tx.create_table("users")?;
        table.create_index_if_not_exists("name", Options::default())?;
        table.create_index_if_not_exists("name", Options::default())?;
        assert_eq!(table.indexes()?.len(), 1);

        table.create_indexes_if_not_exist([
            ("name", Options::default()),
            ("email", Options { unique: true }),
        ])?;
        assert_eq!(table.indexes()?.len(), 2);
        Ok(())
    })
    .unwrap();
}

#[test]
fn drop_table_drops_its_indexes() {
    let db = test_db();
    db.update(|tx| {
        let table = tx.create_table("users")?;
        table.create_index("name", Options::default())?;
        tx.drop_table("users")?;

        // recreating the table starts from a clean catalog
        let table = tx.create_table("users")?;
        assert!(table.indexes()?.is_empty());
        Ok(())
    })
    .unwrap();
}

#[test]
fn truncate_clears_index_entries() {
    let db = test_db();
    db.update(|tx| {
        let table = tx.create_table("users")?;
        table.create_index("name", Options::default())?;
        table.insert(&named("a"))?;
        table.truncate()?;

        let index = table.get_index("name")?;
        let mut count = 0;
        index.ascend_greater_or_equal(None, &mut |_, _| {
            count += 1;
            Ok(())
        })?;
        assert_eq!(count, 0);

        // a fresh insert after truncate is indexed normally
        table.insert(&named("b"))?;
        let index = table.get_index("name")?;
        let mut count = 0;
        index.ascend_greater_or_equal(None, &mut |_, _| {
            count += 1;
            Ok(())
        })?;
        assert_eq!(count, 1);
        Ok(())
    })
    .unwrap();
}

#[test]
fn index_created_in_one_handle_is_seen_by_another() {
    // Table handles fetch indexes per operation, so a second handle to the
    // same table observes catalog changes made through the first.
    let db = test_db();
    db.update(|tx| {
        let first = tx.table("users").err();
        assert!(first.is_some());

        let handle_a = tx.create_table("users")?;
        let handle_b = tx.table("users")?;

        handle_a.create_index("name", Options::default())?;
        assert_eq!(handle_b.indexes()?.len(), 1);

        handle_b.insert(&named("seen"))?;
        let index = handle_a.get_index("name")?;
        let mut count = 0;
        index.ascend_greater_or_equal(None, &mut |_, _| {
            count += 1;
            Ok(())
        })?;
        assert_eq!(count, 1);
        Ok(())
    })
    .unwrap();
}
