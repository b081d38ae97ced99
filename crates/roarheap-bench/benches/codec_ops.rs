//! Criterion micro-benchmarks for serialization and deserialization in
//! both wire formats and both decode modes.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use roarheap_bench::{populated_heap, reference_values};
use roarheap_bitmap::{BitmapHandle, DecodeMode, Format, FrozenBitmap};

const FORMATS: [(&str, Format); 2] = [("portable", Format::Portable), ("native", Format::Native)];

/// Benchmark: serialize the reference bitmap into an arena buffer.
fn bench_serialize(c: &mut Criterion) {
    let values = reference_values();
    let (mut heap, h) = populated_heap(&values).unwrap();

    let mut group = c.benchmark_group("codec_serialize");
    for (name, format) in FORMATS {
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                let bytes = h.serialize(&mut heap, format).unwrap();
                black_box(bytes.len());
                bytes.dispose(heap.arena_mut()).unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark: deserialize the reference encoding, copying or frozen.
fn bench_deserialize(c: &mut Criterion) {
    let values = reference_values();
    let (mut heap, h) = populated_heap(&values).unwrap();

    let mut group = c.benchmark_group("codec_deserialize");
    for (name, format) in FORMATS {
        let bytes = h.serialize(&mut heap, format).unwrap();
        for (mode_name, mode) in [("copy", DecodeMode::Copy), ("frozen", DecodeMode::Frozen)] {
            let id = BenchmarkId::new(name, mode_name);
            group.bench_function(id, |b| {
                b.iter(|| {
                    let decoded = BitmapHandle::deserialize(&mut heap, &bytes, format, mode).unwrap();
                    black_box(decoded.cardinality(&heap).unwrap());
                    decoded.dispose(&mut heap).unwrap();
                });
            });
        }
    }
    group.finish();
}

/// Benchmark: full scan of a frozen view over host bytes.
fn bench_frozen_iter(c: &mut Criterion) {
    let values = reference_values();
    let (heap, h) = populated_heap(&values).unwrap();
    let bytes = h.serialize_to_vec(&heap, Format::Portable).unwrap();

    c.bench_function("codec_frozen_iter_400k", |b| {
        b.iter(|| {
            let frozen = FrozenBitmap::parse(&bytes, Format::Portable).unwrap();
            black_box(frozen.iter().fold(0u64, |acc, v| acc + u64::from(v)));
        });
    });
}

criterion_group!(benches, bench_serialize, bench_deserialize, bench_frozen_iter);
criterion_main!(benches);
