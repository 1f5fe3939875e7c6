//! Benchmarks for the decode and windowing hot path
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use telemeter_rs::history::HistoryBuffer;
use telemeter_rs::protocol::Frame;
use telemeter_rs::stats::WindowStats;

/// Encode a continuation frame carrying `pairs` raw sample pairs
fn continuation_frame(pairs: usize) -> Vec<u8> {
    let mut words: Vec<i16> = vec![2222];
    for i in 0..pairs {
        words.push((150 - (i % 10)) as i16);
        words.push((240 - (i % 5)) as i16);
    }
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");

    for pairs in [4usize, 64, 256].iter() {
        let bytes = continuation_frame(*pairs);
        group.throughput(Throughput::Elements(*pairs as u64));
        group.bench_with_input(BenchmarkId::new("continuation", pairs), &bytes, |b, bytes| {
            b.iter(|| Frame::decode(black_box(bytes)).unwrap());
        });
    }

    let meter: Vec<u8> = [4444i16, 0, 2000, 1200, 0]
        .iter()
        .flat_map(|w| w.to_le_bytes())
        .collect();
    group.bench_function("meter", |b| {
        b.iter(|| Frame::decode(black_box(&meter)).unwrap());
    });

    group.finish();
}

fn bench_history_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_append");
    group.throughput(Throughput::Elements(1));

    group.bench_function("append_at_capacity", |b| {
        let mut history = HistoryBuffer::new(1000, 0.5);
        let mut i = 0u64;
        b.iter(|| {
            history.append(black_box(i as f64 * 0.05), black_box(0.3));
            i = i.wrapping_add(1);
        });
    });

    group.finish();
}

fn bench_window_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_stats");

    for size in [100usize, 1000].iter() {
        let mut history = HistoryBuffer::new(*size, 0.5);
        for i in 0..*size {
            history.append(i as f64 * 0.05, i as f64 * 0.00125);
        }
        let window = history.series();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("compute", size), &window, |b, window| {
            b.iter(|| WindowStats::compute(black_box(window)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_decode,
    bench_history_append,
    bench_window_stats
);
criterion_main!(benches);
