use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{DMatrix, DVector};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use bpmf_rs::config::PlannerConfig;
use bpmf_rs::partitioning::plan;
use bpmf_rs::ratings::from_triplets;
use bpmf_rs::sampler::{draw, standard_normal, GaussianPrior, PosteriorInput, Strategy};

// Dense row of `nnz` ratings against `n_opp` random opposite vectors.
struct Row {
    opposite: DMatrix<f64>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl Row {
    fn random(k: usize, n_opp: usize, nnz: usize, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let opposite = DMatrix::from_fn(k, n_opp, |_, _| rng.gen_range(-1.0..1.0));
        let indices = (0..nnz).map(|_| rng.gen_range(0..n_opp)).collect();
        let values = (0..nnz).map(|_| rng.gen_range(1.0..5.0)).collect();
        Row {
            opposite,
            indices,
            values,
        }
    }
}

fn bench_strategies(c: &mut Criterion) {
    let k = 10;
    let prior = GaussianPrior::standard(k);
    let mut group = c.benchmark_group("posterior-draw");

    for &nnz in &[8usize, 64, 2_000, 20_000] {
        let row = Row::random(k, 5_000, nnz, 42);
        let noise: DVector<f64> = standard_normal(&mut SmallRng::seed_from_u64(1), k);
        let input = PosteriorInput {
            entity: 0,
            prior: &prior,
            indices: &row.indices,
            values: &row.values,
            opposite: &row.opposite,
            alpha: 2.0,
            mean_rating: 3.0,
        };
        for strategy in [
            Strategy::Incremental,
            Strategy::FullCholesky,
            Strategy::ParallelFullCholesky,
        ] {
            group.bench_with_input(
                BenchmarkId::new(format!("{strategy:?}"), nnz),
                &input,
                |b, input| {
                    b.iter(|| draw(strategy, input, &noise, 200).unwrap());
                },
            );
        }
    }

    group.finish();
}

fn bench_planner(c: &mut Criterion) {
    let mut group = c.benchmark_group("planner");
    for &(rows, cols, per_row) in &[(2_000, 500, 8), (10_000, 2_000, 4)] {
        let mut rng = SmallRng::seed_from_u64(7);
        let triplets: Vec<_> = (0..rows)
            .flat_map(|i| (0..per_row).map(move |_| i))
            .map(|i| (i, rng.gen_range(0..cols), rng.gen_range(1.0..5.0)))
            .collect();
        let m = from_triplets(rows, cols, &triplets);
        let cfg = PlannerConfig::default();
        group.bench_with_input(
            BenchmarkId::new(format!("{rows}x{cols}"), per_row),
            &m,
            |b, m| {
                b.iter(|| {
                    // bootstrap plan, no opposite partition
                    let _ = plan(m, None, 8, &cfg).unwrap();
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_strategies, bench_planner);
criterion_main!(benches);
