//! Benchmarks for frame encoding and decoding

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use protocol::{decode_status, encode_start_treatment, encode_status_query};

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    group.bench_function("status_query", |b| b.iter(encode_status_query));

    group.bench_function("start_treatment", |b| {
        b.iter(|| encode_start_treatment(black_box(2), black_box(1)))
    });

    group.finish();
}

fn benchmark_decode(c: &mut Criterion) {
    let response = [
        0xFF, 0x02, 0x00, 0x96, 0x1E, 0x1F, 0x01, 0x2C, 0x00, 0x00, 0x00, 0x00,
    ];

    c.bench_function("decode_status", |b| {
        b.iter(|| decode_status(black_box(&response)))
    });
}

criterion_group!(benches, benchmark_encode, benchmark_decode);
criterion_main!(benches);
