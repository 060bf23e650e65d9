use std::sync::Arc;

use bpmf_rs::prelude::*;
use bpmf_rs::ratings::{check_transpose, from_triplets};

fn small_cfg(k: usize) -> BpmfConfig {
    BpmfConfig {
        num_latent: k,
        burnin: 0,
        ..BpmfConfig::default()
    }
}

fn pair(cfg: BpmfConfig, train: sprs::CsMat<f64>, test: sprs::CsMat<f64>, rank: usize, nprocs: usize) -> (Sys, Sys) {
    let a = Sys::new("movies", train, test, Arc::new(cfg), rank, nprocs).unwrap();
    let b = Sys::transposed("users", &a).unwrap();
    (a, b)
}

#[test]
fn four_by_four_single_worker_epoch() {
    let triplets = [
        (0, 0, 5.0),
        (0, 2, 3.0),
        (1, 1, 4.0),
        (2, 3, 1.0),
        (3, 0, 2.0),
        (3, 3, 4.0),
    ];
    let train = from_triplets(4, 4, &triplets);
    let (mut movies, mut users) = pair(small_cfg(2), train.clone(), train, 0, 1);
    movies.set_hyperparams(GaussianPrior::standard(2)).unwrap();
    users.set_hyperparams(GaussianPrior::standard(2)).unwrap();

    movies.assign(&mut users).unwrap();
    users.assign(&mut movies).unwrap();
    assert_eq!(movies.partition().bounds(), &[0, 4]);
    assert_eq!(users.partition().bounds(), &[0, 4]);
    movies.build_conn(&mut users).unwrap();
    users.build_conn(&mut movies).unwrap();
    assert_eq!(movies.connectivity().unwrap().total(), 0);

    let comm = NoComm;
    let stats = movies.sample(&users, &comm).unwrap().clone();
    assert_eq!(movies.receive_items(&comm).unwrap(), 0);
    users.sample(&movies, &comm).unwrap();
    users.receive_items(&comm).unwrap();

    for i in 0..4 {
        assert!(movies.items().column(i).norm() > 0.0, "movie {i} unsampled");
        assert!(users.items().column(i).norm() > 0.0, "user {i} unsampled");
    }
    assert_eq!(stats.count, 4);
    assert!((stats.norm - movies.items().norm_squared()).abs() < 1e-9);
    assert!(stats.cov.is_square());

    let report = movies.predict(&users, true).unwrap();
    assert_eq!(report.count, 6);
    assert!(report.rmse.is_finite() && report.rmse >= 0.0);
    // first post-burn-in sample: the running average is the prediction
    assert!((report.rmse - report.rmse_avg).abs() < 1e-12);
    assert_eq!(movies.rmse(), report.rmse);
}

#[test]
fn running_average_tracks_mean_of_predictions() {
    let train = from_triplets(3, 3, &[(0, 0, 4.0), (1, 1, 3.0), (2, 2, 5.0), (0, 1, 2.0)]);
    let test = from_triplets(3, 3, &[(0, 0, 4.0)]);
    let (mut a, mut b) = pair(small_cfg(2), train, test, 0, 1);
    a.assign(&mut b).unwrap();
    b.assign(&mut a).unwrap();

    let mut preds = Vec::new();
    for _ in 0..5 {
        a.sample(&b, &NoComm).unwrap();
        b.sample(&a, &NoComm).unwrap();
        a.predict(&b, true).unwrap();
        let u = a.items().column(0);
        let v = b.items().column(0);
        preds.push(u.dot(&v) + a.mean_rating());
    }
    let mean = preds.iter().sum::<f64>() / preds.len() as f64;
    let m2: f64 = preds.iter().map(|p| (p - mean).powi(2)).sum();
    assert!((a.prediction_mean().data()[0] - mean).abs() < 1e-10);
    assert!((a.prediction_m2().data()[0] - m2).abs() < 1e-9);
}

#[test]
fn burn_in_restarts_running_average() {
    let train = from_triplets(2, 2, &[(0, 0, 4.0), (1, 1, 3.0), (0, 1, 1.0)]);
    let cfg = BpmfConfig {
        burnin: 3,
        ..small_cfg(2)
    };
    let (mut a, mut b) = pair(cfg, train.clone(), train, 0, 1);
    a.assign(&mut b).unwrap();
    b.assign(&mut a).unwrap();
    for _ in 0..2 {
        a.sample(&b, &NoComm).unwrap();
        b.sample(&a, &NoComm).unwrap();
        let r = a.predict(&b, true).unwrap();
        assert_eq!(r.rmse, r.rmse_avg);
        assert!(a.prediction_m2().data().iter().all(|&m| m == 0.0));
    }
    assert_eq!(a.aggr_mu().amax(), 0.0);
}

#[test]
fn even_split_without_planner() {
    let train = from_triplets(
        10,
        10,
        &(0..10).map(|i| (i, (i * 3) % 10, 1.0 + i as f64)).collect::<Vec<_>>(),
    );
    let cfg = BpmfConfig {
        permute: false,
        ..small_cfg(2)
    };
    let (mut a, mut b) = pair(cfg, train.clone(), train.clone(), 1, 2);
    a.assign(&mut b).unwrap();
    b.assign(&mut a).unwrap();
    assert_eq!(a.partition().bounds(), &[0, 5, 10]);
    assert_eq!(b.partition().bounds(), &[0, 5, 10]);
    assert_eq!(a.worker_entities(1), 5);
    assert_eq!(a.worker_nnz(0) + a.worker_nnz(1), 10);
    // no permutation applied
    assert_eq!(a.ratings(), &train);
}

#[test]
fn planner_permutation_keeps_sides_consistent() {
    let mut t = Vec::new();
    for i in 0..12 {
        for r in 0..(1 + i % 4) {
            t.push((i, (i * 5 + r * 7) % 9, 1.0 + r as f64));
        }
    }
    let train = from_triplets(12, 9, &t);
    let test = from_triplets(12, 9, &[(0, 8, 2.0), (11, 0, 3.0)]);
    let cfg = BpmfConfig {
        optimize_locality: true,
        ..small_cfg(3)
    };
    let (mut a, mut b) = pair(cfg, train.clone(), test, 0, 3);
    a.assign(&mut b).unwrap();
    b.assign(&mut a).unwrap();
    a.build_conn(&mut b).unwrap();
    b.build_conn(&mut a).unwrap();

    check_transpose(a.ratings(), b.ratings()).unwrap();
    check_transpose(a.held_out(), b.held_out()).unwrap();
    assert_eq!(a.ratings().nnz(), train.nnz());
    assert_eq!(b.held_out().nnz(), 2);
    for sys in [&a, &b] {
        sys.partition().validate_invariants().unwrap();
        assert_eq!(sys.partition().nprocs(), 3);
        let conn = sys.connectivity().unwrap();
        conn.validate_invariants().unwrap();
        for k in 0..sys.num() {
            assert!(!conn.conn(k).contains(sys.partition().owner_of(k)));
        }
    }
    // ratings survive as a multiset
    let mut before: Vec<f64> = train.data().to_vec();
    let mut after: Vec<f64> = a.ratings().data().to_vec();
    before.sort_by(f64::total_cmp);
    after.sort_by(f64::total_cmp);
    assert_eq!(before, after);
}

#[test]
fn sampling_without_connectivity_fails_for_several_workers() {
    let train = from_triplets(4, 4, &[(0, 0, 1.0), (3, 3, 2.0)]);
    let (mut a, mut b) = pair(small_cfg(2), train.clone(), train, 0, 2);
    a.assign(&mut b).unwrap();
    b.assign(&mut a).unwrap();
    let comms = LocalComm::group(2);
    assert!(matches!(
        a.sample(&b, &comms[0]),
        Err(BpmfError::MissingConnectivity(_))
    ));
    // wrong group size
    a.build_conn(&mut b).unwrap();
    assert!(matches!(
        a.sample(&b, &NoComm),
        Err(BpmfError::Communication(_))
    ));
}
