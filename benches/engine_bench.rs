//! Benchmarks for the engine's pure paths.
//!
//! Run with: cargo bench
//!
//! Layout generation runs on every instrument or range change, and key
//! mapping runs on every keystroke; both should stay far below a frame
//! budget.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use claviature::instrument::Catalog;
use claviature::layout;
use claviature::mapping::KeyMap;

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/generate");
    let catalog = Catalog::standard();

    for instrument in catalog.entries() {
        group.bench_with_input(
            BenchmarkId::from_parameter(instrument.name),
            &instrument.range,
            |b, range| b.iter(|| layout::generate(black_box(*range))),
        );
    }

    group.finish();
}

fn bench_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("mapping/note_for");
    let map = KeyMap::new("awsedftgyhujkolp;'", 60);
    let symbols: Vec<char> = "awsedftgyhujkolp;'zq".chars().collect();

    for transpose in [0i32, 3, -5] {
        group.bench_with_input(
            BenchmarkId::from_parameter(transpose),
            &transpose,
            |b, &t| {
                b.iter(|| {
                    for &symbol in &symbols {
                        black_box(map.note_for(black_box(symbol), t));
                    }
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_layout, bench_mapping);
criterion_main!(benches);
