use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::PlannerConfig;
use crate::partitioning::{plan, Partition};
use crate::ratings::from_triplets;

fn random_matrix(rows: usize, cols: usize, density: f64, seed: u64) -> sprs::CsMat<f64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut t = Vec::new();
    for i in 0..rows {
        // at least one rating per row keeps the matrix non-empty
        t.push((i, rng.gen_range(0..cols), rng.gen_range(1..=5) as f64));
        for j in 0..cols {
            if rng.gen_bool(density) {
                t.push((i, j, rng.gen_range(1..=5) as f64));
            }
        }
    }
    from_triplets(rows, cols, &t)
}

proptest! {
    #[test]
    fn prop_partition_covers_all_entities(
        rows in 1usize..40,
        cols in 1usize..20,
        nprocs in 1usize..6,
        density in 0.0f64..0.5,
        with_opposite in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let m = random_matrix(rows, cols, density, seed);
        let opposite = Partition::even(cols, nprocs);
        let opp = if with_opposite { Some(&opposite) } else { None };
        let plan = plan(&m, opp, nprocs, &PlannerConfig::default()).unwrap();

        let b = plan.partition.bounds();
        prop_assert_eq!(b.len(), nprocs + 1);
        prop_assert_eq!(b[0], 0);
        prop_assert_eq!(b[nprocs], rows);
        prop_assert!(b.windows(2).all(|w| w[0] <= w[1]));

        // permutation is a bijection
        let mut seen = vec![false; rows];
        for &old in &plan.permutation {
            prop_assert!(!seen[old]);
            seen[old] = true;
        }
        prop_assert!(seen.iter().all(|&s| s));

        // each entity sits inside its worker's range, in original order
        for (new, &old) in plan.permutation.iter().enumerate() {
            prop_assert_eq!(plan.partition.owner_of(new), plan.owner[old]);
        }
        for p in 0..nprocs {
            let block = &plan.permutation[plan.partition.range(p)];
            prop_assert!(block.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn prop_single_worker_always_trivial(
        rows in 1usize..30,
        cols in 1usize..10,
        seed in any::<u64>(),
    ) {
        let m = random_matrix(rows, cols, 0.3, seed);
        let plan = plan(&m, None, 1, &PlannerConfig::default()).unwrap();
        prop_assert_eq!(plan.partition, Partition::trivial(rows));
    }
}
