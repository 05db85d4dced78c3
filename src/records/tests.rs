//! Tests for the records module

use super::*;
use crate::errors::{self, Error};
use crate::types::Value;

fn sample() -> FieldBuffer {
    let mut fb = FieldBuffer::new();
    fb.add(Field::int("id", 7))
        .add(Field::text("name", "Ada"))
        .add(Field::bool("active", true));
    fb
}

#[test]
fn encode_then_view_round_trips_fields() {
    let blob = encode(&sample()).unwrap();
    let view = RecordView::new(&blob).unwrap();

    assert_eq!(view.len(), 3);
    assert_eq!(view.field("id").unwrap().value, Value::Int(7));
    assert_eq!(
        view.field("name").unwrap().value,
        Value::Text("Ada".to_string())
    );
    assert_eq!(view.field("active").unwrap().value, Value::Bool(true));
}

#[test]
fn view_borrows_blob_zero_copy() {
    let blob = encode(&sample()).unwrap();
    let view = RecordView::new(&blob).unwrap();
    assert!(std::ptr::eq(view.data().as_ptr(), blob.as_ptr()));
}

#[test]
fn iterate_yields_insertion_order_not_name_order() {
    // insertion order (id, name, active) differs from sorted name order
    // (active, id, name), so this exercises the insert_idx path
    let blob = encode(&sample()).unwrap();
    let view = RecordView::new(&blob).unwrap();

    let mut names = Vec::new();
    view.iterate(&mut |f| {
        names.push(f.name);
        Ok(())
    })
    .unwrap();
    assert_eq!(names, ["id", "name", "active"]);
}

#[test]
fn iterate_surfaces_callback_error_and_stops() {
    let blob = encode(&sample()).unwrap();
    let view = RecordView::new(&blob).unwrap();

    let mut seen = 0;
    let err = view
        .iterate(&mut |_| {
            seen += 1;
            Err(errors::stop())
        })
        .unwrap_err();
    assert!(errors::is_stop(&err));
    assert_eq!(seen, 1);
}

#[test]
fn missing_field_is_the_not_found_sentinel() {
    let blob = encode(&sample()).unwrap();
    let view = RecordView::new(&blob).unwrap();
    let err = view.field("ghost").unwrap_err();
    assert!(errors::is(&err, &Error::FieldNotFound));
}

#[test]
fn empty_record_encodes_and_reads_back() {
    let blob = encode(&FieldBuffer::new()).unwrap();
    let view = RecordView::new(&blob).unwrap();
    assert!(view.is_empty());
    assert!(errors::is(
        &view.field("any").unwrap_err(),
        &Error::FieldNotFound
    ));
}

#[test]
fn encode_rejects_empty_and_duplicate_names() {
    let mut fb = FieldBuffer::new();
    fb.add(Field::int("", 1));
    assert!(encode(&fb).is_err());

    let mut fb = FieldBuffer::new();
    fb.add(Field::int("a", 1)).add(Field::int("a", 2));
    assert!(encode(&fb).is_err());
}

#[test]
fn view_rejects_truncated_blobs() {
    let blob = encode(&sample()).unwrap();
    assert!(RecordView::new(&[]).is_err());
    assert!(RecordView::new(&blob[..1]).is_err());
    assert!(RecordView::new(&blob[..10]).is_err());
}

#[test]
fn field_buffer_delete_replace() {
    let mut fb = sample();
    fb.delete("name").unwrap();
    assert!(fb.get("name").is_none());
    assert!(errors::is(
        &fb.delete("name").unwrap_err(),
        &Error::FieldNotFound
    ));

    fb.replace("id", Field::int("id", 8)).unwrap();
    assert_eq!(fb.get("id").unwrap().value, Value::Int(8));
    assert!(fb.replace("ghost", Field::int("x", 0)).is_err());
}

#[test]
fn scan_record_materializes_a_view() {
    let blob = encode(&sample()).unwrap();
    let view = RecordView::new(&blob).unwrap();

    let mut fb = FieldBuffer::new();
    fb.scan_record(&view).unwrap();
    assert_eq!(fb.len(), 3);
    assert_eq!(fb.get("name").unwrap().value, Value::Text("Ada".into()));
}

#[test]
fn keyed_record_pins_the_primary_key() {
    let fb = sample();
    let keyed = KeyedRecord::new(&fb, b"pinned");
    assert_eq!(keyed.primary_key().unwrap().unwrap(), b"pinned");
    assert_eq!(keyed.field("id").unwrap().value, Value::Int(7));
}

#[test]
fn encoded_record_owns_its_bytes() {
    let blob = encode(&sample()).unwrap();
    let rec = EncodedRecord::new(blob).unwrap();
    assert_eq!(rec.field("id").unwrap().value, Value::Int(7));
    assert_eq!(rec.view().len(), 3);
}

#[test]
fn many_fields_binary_search_finds_every_one() {
    let mut fb = FieldBuffer::new();
    for i in 0..100 {
        fb.add(Field::int(format!("field_{i:03}"), i));
    }
    let blob = encode(&fb).unwrap();
    let view = RecordView::new(&blob).unwrap();
    for i in 0..100 {
        assert_eq!(
            view.field(&format!("field_{i:03}")).unwrap().value,
            Value::Int(i)
        );
    }
}
