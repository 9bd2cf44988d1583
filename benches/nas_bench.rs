//! Criterion benchmarks for the search core.
//!
//! Measures Pareto ranking on synthetic objective clouds and full
//! generation steps against the analytic proxy evaluator.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use u_nas::evaluator::ProxyEvaluator;
use u_nas::pareto::{crowding_distance, non_dominated_sort};
use u_nas::random::create_rng;
use u_nas::search::{EvolutionController, SearchConfig};

fn random_points(n: usize, seed: u64) -> Vec<[f64; 4]> {
    let mut rng = create_rng(seed);
    (0..n)
        .map(|_| {
            [
                rng.random_range(0.0..1.0),
                rng.random_range(0.0..1.0),
                rng.random_range(0.0..1.0),
                rng.random_range(0.0..1.0),
            ]
        })
        .collect()
}

fn bench_non_dominated_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("non_dominated_sort");

    for n in [50, 200, 800] {
        let points = random_points(n, 7);
        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, pts| {
            b.iter(|| non_dominated_sort(black_box(pts)));
        });
    }
    group.finish();
}

fn bench_crowding_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("crowding_distance");

    for n in [50, 200, 800] {
        let points = random_points(n, 11);
        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, pts| {
            b.iter(|| crowding_distance(black_box(pts)));
        });
    }
    group.finish();
}

fn bench_step_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_generation");
    group.sample_size(10);

    for population in [20, 50, 100] {
        let config = SearchConfig::default()
            .with_population_size(population)
            .with_seed(42);
        group.bench_with_input(
            BenchmarkId::from_parameter(population),
            &config,
            |b, cfg| {
                let mut controller = EvolutionController::new(ProxyEvaluator::new());
                controller
                    .initialize(cfg.clone())
                    .expect("benchmark config is valid");
                b.iter(|| black_box(controller.step_generation().expect("step succeeds")));
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_non_dominated_sort,
    bench_crowding_distance,
    bench_step_generation
);
criterion_main!(benches);
