//! Benchmarks for gf
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn benchmark_queue_operations(c: &mut Criterion) {
    use gf::walker::queue::{LevelQueue, WorkItem};

    c.bench_function("level_queue_send_recv", |b| {
        let (sender, receiver) = LevelQueue::new(10_000).split();
        let parent = WorkItem::root("/test/path".into());

        b.iter(|| {
            sender.send(parent.child("entry".as_ref(), false)).unwrap();
            let received = receiver.recv().unwrap();
            black_box(received);
        })
    });
}

fn benchmark_name_matching(c: &mut Criterion) {
    use gf::search::base_name;
    use regex::bytes::Regex;
    use std::path::Path;

    let pattern = Regex::new(r"\.rs$").unwrap();
    let paths: Vec<&Path> = [
        "src/walker/pool.rs",
        "target/debug/deps/libgf.rlib",
        "Cargo.toml",
        "a/very/deep/tree/of/directories/main.rs",
    ]
    .iter()
    .map(Path::new)
    .collect();

    c.bench_function("base_name_match", |b| {
        b.iter(|| {
            let hits = paths
                .iter()
                .filter(|p| pattern.is_match(base_name(p)))
                .count();
            black_box(hits);
        })
    });
}

criterion_group!(benches, benchmark_queue_operations, benchmark_name_matching);
criterion_main!(benches);
