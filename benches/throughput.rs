//! Throughput Benchmark for linecache
//!
//! Measures the store and the header parser under simple workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use linecache::protocol::parse_command;
use linecache::storage::StorageEngine;
use std::sync::Arc;
use std::thread;

/// Benchmark set operations
fn bench_put(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    let mut group = c.benchmark_group("put");
    group.throughput(Throughput::Elements(1));

    group.bench_function("put_small", |b| {
        let mut i = 0u64;
        let value = Bytes::from("small_value");
        let len = value.len().to_string();
        b.iter(|| {
            let key = format!("key_{}", i);
            engine.put(key, value.clone(), "0".into(), 0, len.clone(), false);
            i += 1;
        });
    });

    group.bench_function("put_1kb", |b| {
        let mut i = 0u64;
        let value = Bytes::from("x".repeat(1024));
        let len = value.len().to_string();
        b.iter(|| {
            let key = format!("key_{}", i);
            engine.put(key, value.clone(), "0".into(), 0, len.clone(), false);
            i += 1;
        });
    });

    group.bench_function("replace_existing", |b| {
        let value = Bytes::from("small_value");
        let len = value.len().to_string();
        engine.put("hot".to_string(), value.clone(), "0".into(), 0, len.clone(), false);
        b.iter(|| {
            black_box(engine.put("hot".to_string(), value.clone(), "0".into(), 0, len.clone(), true));
        });
    });

    group.finish();
}

/// Benchmark get operations
fn bench_get(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    for i in 0..100_000 {
        let value = Bytes::from(format!("value_{}", i));
        let len = value.len().to_string();
        engine.put(format!("key_{}", i), value, "0".into(), 0, len, false);
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key_{}", i % 100_000);
            black_box(engine.get(&key));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing_{}", i);
            black_box(engine.get(&key));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark header parsing
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(1));

    group.bench_function("parse_set", |b| {
        b.iter(|| black_box(parse_command(black_box(b"set user_101 0 3600 42"))));
    });

    group.bench_function("parse_get", |b| {
        b.iter(|| black_box(parse_command(black_box(b"get user_101"))));
    });

    group.bench_function("parse_invalid", |b| {
        b.iter(|| black_box(parse_command(black_box(b"foo bar baz"))));
    });

    group.finish();
}

/// Mixed reads and writes from several threads
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");
    group.throughput(Throughput::Elements(8 * 1000));

    group.bench_function("mixed_8_threads", |b| {
        b.iter(|| {
            let engine = Arc::new(StorageEngine::new());
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let engine = Arc::clone(&engine);
                    thread::spawn(move || {
                        let value = Bytes::from("value");
                        let len = value.len().to_string();
                        for i in 0..1000 {
                            let key = format!("key_{}_{}", t, i % 100);
                            if i % 4 == 0 {
                                engine.put(key, value.clone(), "0".into(), 0, len.clone(), false);
                            } else {
                                black_box(engine.get(&key));
                            }
                        }
                    })
                })
                .collect();

            for handle in handles {
                let _ = handle.join();
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_put, bench_get, bench_parse, bench_concurrent);
criterion_main!(benches);
