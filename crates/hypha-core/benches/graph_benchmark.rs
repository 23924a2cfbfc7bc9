//! Bulk insertion and neighborhood iteration benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hypha_core::{Direction, GraphStore};

fn build_graph(nodes: i64, edges: usize) -> GraphStore {
    let graph = GraphStore::new();
    let mut writer = graph.write().unwrap();
    for n in 0..nodes {
        writer.add_node(n).unwrap();
    }
    let mut rng = StdRng::seed_from_u64(42);
    let mut added = 0_usize;
    let mut edge_id = 0_i64;
    while added < edges {
        let source = rng.gen_range(0..nodes);
        let target = rng.gen_range(0..nodes);
        edge_id += 1;
        if writer.add_edge(edge_id, source, target, 0_i64, true).is_ok() {
            added += 1;
        }
    }
    drop(writer);
    graph
}

fn bench_bulk_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_insert");
    for &edges in &[1_000_usize, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(edges), &edges, |b, &edges| {
            b.iter(|| build_graph(1_000, edges));
        });
    }
    group.finish();
}

fn bench_neighbor_iteration(c: &mut Criterion) {
    let graph = build_graph(1_000, 10_000);
    c.bench_function("neighbors_1k_nodes", |b| {
        b.iter(|| {
            let mut total = 0_usize;
            for n in 0..1_000_i64 {
                total += graph
                    .neighbors(&n.into(), Direction::Both, None)
                    .unwrap()
                    .len();
            }
            black_box(total)
        });
    });
}

fn bench_degree_queries(c: &mut Criterion) {
    let graph = build_graph(1_000, 10_000);
    c.bench_function("degree_1k_nodes", |b| {
        b.iter(|| {
            let mut total = 0_u32;
            for n in 0..1_000_i64 {
                total += graph.degree(&n.into()).unwrap();
            }
            black_box(total)
        });
    });
}

criterion_group!(
    benches,
    bench_bulk_insert,
    bench_neighbor_iteration,
    bench_degree_queries
);
criterion_main!(benches);
