use super::*;
use crate::ratings::from_triplets;
#[path = "partition_property_tests.rs"]
mod partition_property_tests;

fn uniform_rows(n: usize, cols: usize, per_row: usize) -> CsMat<f64> {
    let mut t = Vec::new();
    for i in 0..n {
        for r in 0..per_row {
            // scatter the ratings so rows differ in structure, not in count
            t.push((i, (i * 7 + r * 3) % cols, 1.0 + r as f64));
        }
    }
    from_triplets(n, cols, &t)
}

#[test]
fn even_split_matches_contiguous_blocks() {
    let p = Partition::even(10, 3);
    assert_eq!(p.bounds(), &[0, 3, 6, 10]);
    assert_eq!(p.owner_of(0), 0);
    assert_eq!(p.owner_of(5), 1);
    assert_eq!(p.owner_of(9), 2);
    assert_eq!(p.count(2), 4);
}

#[test]
fn owner_of_skips_empty_ranges() {
    let p = Partition::from_counts(&[0, 4, 0, 2]);
    assert_eq!(p.bounds(), &[0, 0, 4, 4, 6]);
    assert_eq!(p.owner_of(0), 1);
    assert_eq!(p.owner_of(3), 1);
    assert_eq!(p.owner_of(4), 3);
}

#[test]
fn from_bounds_rejects_decreasing() {
    assert!(Partition::from_bounds(vec![0, 5, 3]).is_err());
    assert!(Partition::from_bounds(vec![1, 5]).is_err());
    assert!(Partition::from_bounds(vec![0, 2, 5]).is_ok());
}

#[test]
fn single_worker_plan_is_trivial() {
    let m = uniform_rows(7, 5, 2);
    let plan = plan(&m, None, 1, &PlannerConfig::default()).unwrap();
    assert_eq!(plan.partition, Partition::trivial(7));
    assert_eq!(plan.permutation, (0..7).collect::<Vec<_>>());
}

#[test]
fn comm_weight_zero_splits_uniform_rows_in_half() {
    let m = uniform_rows(10, 10, 2);
    let cfg = PlannerConfig {
        comm_weight: 0.0,
        ..Default::default()
    };
    let opposite = Partition::even(10, 2);
    let plan = plan(&m, Some(&opposite), 2, &cfg).unwrap();
    assert_eq!(plan.partition.bounds(), &[0, 5, 10]);
    assert_eq!(plan.load.entities, vec![5, 5]);
}

#[test]
fn comm_term_follows_opposite_blocks() {
    // rows 0..4 rate columns 0..4 only, rows 4..8 rate columns 4..8 only;
    // the rows are interleaved so the even split would cut every rating
    let mut t = Vec::new();
    for i in 0..8 {
        let block = if i % 2 == 0 { 0 } else { 4 };
        for c in block..block + 4 {
            t.push((i, c, 3.0));
        }
    }
    let m = from_triplets(8, 8, &t);
    let opposite = Partition::even(8, 2);
    let cfg = PlannerConfig {
        imbalance_weight: 1.0,
        comm_weight: 10.0,
        ..Default::default()
    };
    let plan = plan(&m, Some(&opposite), 2, &cfg).unwrap();
    for i in 0..8 {
        assert_eq!(plan.owner[i], i % 2, "entity {i}");
    }
    assert_eq!(plan.load.total_comm, 0);
    assert_eq!(plan.permutation, vec![0, 2, 4, 6, 1, 3, 5, 7]);
    assert_eq!(plan.reports.len(), cfg.passes);
    assert_eq!(plan.reports.last().unwrap().comm_pct, 0.0);
}

#[test]
fn empty_matrix_is_rejected() {
    let m = from_triplets(3, 3, &[]);
    assert!(matches!(
        plan(&m, None, 2, &PlannerConfig::default()),
        Err(BpmfError::EmptyMatrix(_))
    ));
}

#[test]
fn opposite_worker_count_must_match() {
    let m = uniform_rows(6, 6, 1);
    let opposite = Partition::even(6, 3);
    assert!(matches!(
        plan(&m, Some(&opposite), 2, &PlannerConfig::default()),
        Err(BpmfError::WorkerCountMismatch { own: 2, opposite: 3 })
    ));
}
