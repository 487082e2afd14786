//! Benchmarks for keyed reconciliation and trigger fan-out
//!
//! Run with: cargo bench -p sprig-core --bench reconcile

use std::cell::Cell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sprig_core::prelude::*;
use sprig_core::renderer::longest_increasing_subsequence;

fn keyed_list(keys: &[usize]) -> VNode {
    h(
        "ul",
        None,
        keys.iter()
            .map(|&key| h("li", props([("key", key as i64)]), key.to_string()))
            .collect::<Vec<_>>(),
    )
}

// =============================================================================
// KEYED DIFF
// =============================================================================

fn bench_keyed_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed/reverse");

    for size in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(size as u64));
        let forward: Vec<usize> = (0..size).collect();
        let backward: Vec<usize> = (0..size).rev().collect();

        let mut host = MemoryHost::new();
        let root = host.create_root();
        let renderer = Renderer::new(host);
        renderer.render(keyed_list(&forward), root);

        let mut flip = false;
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let keys = if flip { &forward } else { &backward };
                flip = !flip;
                renderer.render(keyed_list(keys), root);
                renderer.host_mut().clear_ops();
            })
        });
    }

    group.finish();
}

fn bench_keyed_rotate(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed/rotate");

    for size in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(size as u64));
        let mut keys: Vec<usize> = (0..size).collect();

        let mut host = MemoryHost::new();
        let root = host.create_root();
        let renderer = Renderer::new(host);
        renderer.render(keyed_list(&keys), root);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                keys.rotate_right(1);
                renderer.render(keyed_list(&keys), root);
                renderer.host_mut().clear_ops();
            })
        });
    }

    group.finish();
}

fn bench_lis(c: &mut Criterion) {
    let mut group = c.benchmark_group("lis");

    for size in [100usize, 1000, 10_000] {
        // Interleaved runs: half ascending, half shuffled by a fixed stride.
        let seq: Vec<usize> = (0..size)
            .map(|i| if i % 2 == 0 { i + 1 } else { (i * 7919) % size + 1 })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &seq, |b, seq| {
            b.iter(|| black_box(longest_increasing_subsequence(seq)))
        });
    }

    group.finish();
}

// =============================================================================
// TRIGGER FAN-OUT
// =============================================================================

fn bench_trigger_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("trigger/fan_out");

    for subscribers in [1usize, 10, 100] {
        let source = Ref::new(0);
        let runs = Rc::new(Cell::new(0usize));
        let effects: Vec<Effect> = (0..subscribers)
            .map(|_| {
                let (source, runs) = (source.clone(), runs.clone());
                effect(move || {
                    source.get();
                    runs.set(runs.get() + 1);
                })
            })
            .collect();

        let mut next = 0i64;
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| {
                    next += 1;
                    source.set(black_box(next));
                })
            },
        );

        drop(effects);
    }

    group.finish();
}

fn bench_batched_render(c: &mut Criterion) {
    let counter = Rc::new(
        ComponentOptions::new(|ctx| h("p", None, format!("count:{}", ctx.get("count"))))
            .with_setup(|_props, _ctx| {
                Some(Object::from_entries([("count", Value::from(Ref::new(0)))]))
            }),
    );

    let mut host = MemoryHost::new();
    let root = host.create_root();
    let renderer = Renderer::new(host);
    let Some(instance) = create_app(counter).mount(&renderer, root) else {
        return;
    };
    let Value::Ref(count) = instance.setup_state().get("count") else {
        return;
    };

    let mut next = 0i64;
    c.bench_function("scheduler/ten_writes_one_render", |b| {
        b.iter(|| {
            for _ in 0..10 {
                next += 1;
                count.set(next);
            }
            run_microtasks();
            renderer.host_mut().clear_ops();
        })
    });
}

criterion_group!(
    benches,
    bench_keyed_reverse,
    bench_keyed_rotate,
    bench_lis,
    bench_trigger_fan_out,
    bench_batched_render,
);
criterion_main!(benches);
