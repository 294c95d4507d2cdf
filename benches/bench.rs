// Criterion benchmarks for Mix & Mingle

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mix_mingle::core::{InMemoryStore, MatchEngine, RouteTable};
use std::sync::Arc;

fn route_table(extra: usize) -> RouteTable {
    let mut protected: Vec<String> = [
        "/dashboard",
        "/create-profile",
        "/go-live",
        "/room",
        "/messages",
        "/notifications",
        "/admin",
        "/api/swipe",
        "/api/matches",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect();
    protected.extend((0..extra).map(|i| format!("/section-{}/private", i)));

    RouteTable::from_prefixes(&protected, &["/room/lobby".to_string()])
}

fn bench_route_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_classification");

    for extra in [0usize, 50, 500] {
        let routes = route_table(extra);
        group.bench_with_input(BenchmarkId::new("classify", extra), &routes, |b, routes| {
            b.iter(|| {
                black_box(routes.classify(black_box("/room/lobby/chat")));
                black_box(routes.classify(black_box("/messages/thread-9")));
                black_box(routes.classify(black_box("/terms")));
            })
        });
    }

    group.finish();
}

fn bench_submit_preference(c: &mut Criterion) {
    let engine = MatchEngine::new(Arc::new(InMemoryStore::new()));
    let mut counter = 0u64;

    c.bench_function("submit_preference_mutual_like", |b| {
        b.iter(|| {
            counter += 1;
            let a = format!("a-{}", counter);
            let z = format!("z-{}", counter);
            tokio_test::block_on(async {
                engine.submit_preference(&a, &z, "like").await.unwrap();
                black_box(engine.submit_preference(&z, &a, "super_like").await.unwrap());
            });
        })
    });
}

criterion_group!(benches, bench_route_classification, bench_submit_preference);
criterion_main!(benches);
