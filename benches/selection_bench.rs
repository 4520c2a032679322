//! Selection Benchmarks - Catch Hot-Path Performance
//!
//! Benchmarks the work done on every catch: the uniform draw over the
//! eligible sea, the pick transition, and a full catch against the
//! in-memory store.
//!
//! Run with: cargo bench --bench selection_bench

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use treehole_bottles::adapters::memory::InMemoryStore;
use treehole_bottles::config::ExchangeSettings;
use treehole_bottles::domain::bottle::{Bottle, BottleStatus};
use treehole_bottles::domain::selection::pick_uniform;
use treehole_bottles::usecases::{BottleExchange, ExchangePorts};

fn sea(size: usize) -> Vec<Bottle> {
    let created_at = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
    (0..size)
        .map(|i| Bottle {
            id: format!("bottle-{i}"),
            creator_id: format!("user-{}", i % 97),
            content: "a message at sea".to_string(),
            pick_count: (i % 10) as u32,
            max_picks: 10,
            status: BottleStatus::Floating,
            returned_at: None,
            created_at,
        })
        .collect()
}

/// Benchmark the uniform draw over 1000 eligible bottles.
fn bench_pick_uniform(c: &mut Criterion) {
    let bottles = sea(1000);
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("pick_uniform_1000", |b| {
        b.iter(|| {
            let _picked = pick_uniform(black_box(&bottles), &mut rng);
        });
    });
}

/// Benchmark eligibility filtering plus the draw, as done per catch.
fn bench_filter_and_pick(c: &mut Criterion) {
    let bottles = sea(1000);
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("filter_and_pick_1000", |b| {
        b.iter(|| {
            let eligible: Vec<&Bottle> = bottles
                .iter()
                .filter(|bottle| bottle.is_catchable_by(black_box("user-3")))
                .collect();
            let _picked = pick_uniform(&eligible, &mut rng);
        });
    });
}

/// Benchmark the floating → returned transition.
fn bench_apply_pick(c: &mut Criterion) {
    let bottle = sea(10).swap_remove(9);
    let now = Utc.with_ymd_and_hms(2026, 6, 2, 0, 0, 0).unwrap();

    c.bench_function("apply_pick_terminal", |b| {
        b.iter(|| {
            let _step = black_box(&bottle).apply_pick(black_box(now));
        });
    });
}

/// Benchmark a full VIP catch against the in-memory store.
fn bench_catch_in_memory(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(InMemoryStore::new());
    let exchange = BottleExchange::with_settings(
        ExchangePorts::from_backend(Arc::clone(&store)),
        ExchangeSettings::default(),
    );
    let creator = "creator".to_string();
    let catcher = "catcher".to_string();

    c.bench_function("catch_bottle_in_memory", |b| {
        b.to_async(&runtime).iter(|| async {
            // Keep the sea stocked so every catch finds something
            exchange
                .throw_bottle(&creator, "restock", true)
                .await
                .unwrap();
            let _caught = exchange.catch_bottle(&catcher, true).await.unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_pick_uniform,
    bench_filter_and_pick,
    bench_apply_pick,
    bench_catch_in_memory,
);
criterion_main!(benches);
