// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the modified UTF-8 codec in randwerk-core.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use randwerk_core::mutf8;

/// ASCII text takes the borrow-only fast path on encode and the
/// `str::from_utf8` fast path on decode.
fn bench_ascii(c: &mut Criterion) {
    let text = "patient-record-0042 ".repeat(512); // ~10 KiB

    c.bench_function("mutf8_encode_ascii (10 KiB)", |b| {
        b.iter(|| black_box(mutf8::encode(black_box(&text))));
    });

    let bytes = mutf8::encode(&text).into_owned();
    c.bench_function("mutf8_decode_ascii (10 KiB)", |b| {
        b.iter(|| black_box(mutf8::decode(black_box(&bytes)).expect("decode failed")));
    });
}

/// Text with NULs and supplementary characters forces the slow paths.
fn bench_mixed(c: &mut Criterion) {
    let text = "h\u{e9}llo\0w\u{f6}rld \u{1F600} ".repeat(512);

    let mut group = c.benchmark_group("mutf8_mixed");
    group.bench_function("encode", |b| {
        b.iter(|| black_box(mutf8::encode(black_box(&text))));
    });

    let bytes = mutf8::encode(&text).into_owned();
    group.bench_function("decode", |b| {
        b.iter(|| black_box(mutf8::decode(black_box(&bytes)).expect("decode failed")));
    });
    group.bench_function("decode_lossy", |b| {
        b.iter(|| black_box(mutf8::decode_lossy(black_box(&bytes))));
    });
    group.finish();
}

criterion_group!(benches, bench_ascii, bench_mixed);
criterion_main!(benches);
