//! Benchmarks for the diff/patch engine
//!
//! Run with: cargo bench -p trellis-core --bench patch
//!
//! Measures reconciliation of keyed child lists of various sizes against
//! the in-memory DOM, for the shapes the two-ended walk handles cheaply
//! (append, rotation) and the one it does not (middle insertion).

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use trellis_core::dom::{MemoryDom, NodeId};
use trellis_core::vnode::{patch, VNode};

fn list(keys: impl IntoIterator<Item = usize>) -> VNode {
    VNode::element("ul").children(keys.into_iter().map(|key| {
        VNode::element("li")
            .key(key.to_string())
            .attr("class", "row")
            .child(VNode::text(format!("row {key}")))
    }))
}

/// Mount `old` into a fresh DOM.
fn mounted(old: &VNode) -> (MemoryDom, NodeId) {
    let mut dom = MemoryDom::new();
    let container = dom.create_container("div");
    patch(&mut dom, None, old, container).expect("mount");
    (dom, container)
}

fn bench_scenario(c: &mut Criterion, name: &str, reorder: fn(usize) -> Vec<usize>) {
    let mut group = c.benchmark_group(format!("patch/{name}"));

    for n in [10, 100, 1000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let old = list(0..n);
                    let (dom, container) = mounted(&old);
                    (dom, container, old, list(reorder(n)))
                },
                |(mut dom, container, old, new)| {
                    patch(&mut dom, Some(&old), &new, container).expect("patch");
                    black_box(dom.stats())
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_identity(c: &mut Criterion) {
    bench_scenario(c, "identity", |n| (0..n).collect());
}

fn bench_append(c: &mut Criterion) {
    bench_scenario(c, "append", |n| (0..n + 1).collect());
}

fn bench_rotate(c: &mut Criterion) {
    bench_scenario(c, "rotate", |n| {
        let mut keys: Vec<_> = (0..n).collect();
        keys.rotate_right(1);
        keys
    });
}

fn bench_insert_middle(c: &mut Criterion) {
    bench_scenario(c, "insert_middle", |n| {
        let mut keys: Vec<_> = (0..n).collect();
        keys.insert(n / 2, n);
        keys
    });
}

criterion_group!(benches, bench_identity, bench_append, bench_rotate, bench_insert_middle);
criterion_main!(benches);
