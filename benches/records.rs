//! Record codec benchmarks
//!
//! Measures encoding a document, point field lookup through the
//! name-sorted header, and full iteration.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vellum::{Field, FieldBuffer, RecordView};

fn document(field_count: usize) -> FieldBuffer {
    let mut fb = FieldBuffer::new();
    for i in 0..field_count {
        match i % 3 {
            0 => fb.add(Field::int(format!("num_{i:04}"), i as i64)),
            1 => fb.add(Field::text(format!("txt_{i:04}"), "payload value")),
            _ => fb.add(Field::bool(format!("flag_{i:04}"), i % 2 == 0)),
        };
    }
    fb
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_encode");

    for field_count in [4usize, 16, 64] {
        let doc = document(field_count);
        group.bench_with_input(
            BenchmarkId::new("fields", field_count),
            &doc,
            |b, doc| {
                b.iter(|| black_box(doc.encode().unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_get_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_get_field");

    for field_count in [4usize, 16, 64] {
        let blob = document(field_count).encode().unwrap();
        let last = format!("txt_{:04}", field_count - 2);
        group.bench_with_input(
            BenchmarkId::new("fields", field_count),
            &blob,
            |b, blob| {
                let view = RecordView::new(blob).unwrap();
                b.iter(|| black_box(view.field(black_box(&last)).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_iterate(c: &mut Criterion) {
    let blob = document(16).encode().unwrap();
    c.bench_function("record_iterate_16", |b| {
        let view = RecordView::new(&blob).unwrap();
        b.iter(|| {
            let mut count = 0usize;
            view.iterate(&mut |f| {
                count += f.name.len();
                Ok(())
            })
            .unwrap();
            black_box(count)
        });
    });
}

criterion_group!(benches, bench_encode, bench_get_field, bench_iterate);
criterion_main!(benches);
