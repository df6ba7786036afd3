//! Performance benchmarks for the reply ring buffer.
//!
//! The engine pushes one byte per poll and checks every terminator suffix
//! after each push, so `put_evicting` and `ends_with` dominate.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench ring_buffer_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use espat_core::Terminator;
use espat_protocol::RingBuffer;
use std::hint::black_box;

/// Ring filled to `fill` bytes with its content straddling the wrap point.
fn wrapped_ring(capacity: usize, fill: usize) -> RingBuffer {
    let mut ring = RingBuffer::new(capacity).unwrap();
    for _ in 0..capacity / 2 {
        ring.put(0).unwrap();
        ring.get().unwrap();
    }
    for i in 0..fill {
        ring.put(i as u8).unwrap();
    }
    ring
}

/// Benchmark the per-byte push used by the engine.
fn bench_put_evicting(c: &mut Criterion) {
    let mut group = c.benchmark_group("put_evicting");
    group.throughput(Throughput::Elements(1));

    let mut ring = wrapped_ring(512, 511);
    group.bench_function("full_ring", |b| {
        b.iter(|| black_box(ring.put_evicting(black_box(b'x'))));
    });

    group.finish();
}

/// Benchmark a full terminator scan, as done after every received byte.
fn bench_terminator_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("terminator_scan");
    group.throughput(Throughput::Elements(1));

    let mut miss = wrapped_ring(512, 300);
    miss.put_slice(b"+CIFSR:STAIP,\"10.0").unwrap();
    group.bench_function("no_match", |b| {
        b.iter(|| {
            let hit = Terminator::ALL
                .into_iter()
                .find(|t| black_box(&miss).ends_with(t.as_bytes()));
            black_box(hit);
        });
    });

    let mut hit = wrapped_ring(512, 300);
    hit.put_slice(b"\r\nWIFI CONNECTED\r\n").unwrap();
    group.bench_function("last_terminator", |b| {
        b.iter(|| {
            let found = Terminator::ALL
                .into_iter()
                .find(|t| black_box(&hit).ends_with(t.as_bytes()));
            black_box(found);
        });
    });

    group.finish();
}

/// Benchmark bulk copies across the wrap point.
fn bench_slices(c: &mut Criterion) {
    let mut group = c.benchmark_group("slices");

    for size in [16usize, 128, 255].iter() {
        group.throughput(Throughput::Bytes(*size as u64));

        group.bench_with_input(BenchmarkId::new("put_get", size), size, |b, &size| {
            let data = vec![0x5Au8; size];
            let mut ring = wrapped_ring(256, 0);
            b.iter(|| {
                ring.put_slice(black_box(&data)).unwrap();
                black_box(ring.get_many(size).unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("peek_from_end", size), size, |b, &size| {
            let ring = wrapped_ring(256, 255);
            b.iter(|| black_box(ring.peek_from_end(black_box(size)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_put_evicting,
    bench_terminator_scan,
    bench_slices,
);

criterion_main!(benches);
