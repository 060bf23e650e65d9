//! One entity type of the factorization and its share of the sampling run.
//!
//! Two mirrored [`Sys`] values exist per worker, one per entity type. Each
//! holds the training and held-out matrices with its own entities as rows,
//! the dense factor matrix (one column per entity, all entities replicated on
//! every worker), and the partition and connectivity used to decide who
//! samples which column and where it is sent afterwards.
//!
//! A driver typically runs:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use bpmf_rs::prelude::*;
//! # fn run(train: sprs::CsMat<f64>, test: sprs::CsMat<f64>) -> Result<(), BpmfError> {
//! let cfg = Arc::new(BpmfConfig::default());
//! let comm = NoComm;
//! let mut movies = Sys::new("movies", train, test, cfg.clone(), comm.rank(), comm.size())?;
//! let mut users = Sys::transposed("users", &movies)?;
//! movies.assign(&mut users)?;
//! users.assign(&mut movies)?;
//! movies.build_conn(&mut users)?;
//! users.build_conn(&mut movies)?;
//! for _ in 0..cfg.total_iterations() {
//!     movies.sample(&users, &comm)?;
//!     movies.receive_items(&comm)?;
//!     users.sample(&movies, &comm)?;
//!     users.receive_items(&comm)?;
//!     let report = movies.predict(&users, false)?;
//!     log::info!("rmse {:.4} (avg {:.4})", report.rmse, report.rmse_avg);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use std::hash::Hasher;

use ahash::AHasher;
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use sprs::CsMat;

use crate::algs::communicator::{Communicator, SendQueue, Wait};
use crate::algs::wire::{decode_column, encode_column};
use crate::bpmf_error::BpmfError;
use crate::config::BpmfConfig;
use crate::connectivity::{self, Connectivity};
use crate::partitioning::{self, Partition, WorkerId};
use crate::ratings;
use crate::sampler::{self, GaussianPrior, PosteriorInput, Strategy};
use crate::stats::{EpochStats, welford_update};

/// Per-entity priors carried over from an earlier run.
///
/// `mu` is `k × N`; column `i` of `lambda` is entity `i`'s `k × k` precision
/// in column-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagatedPosterior {
    pub mu: DMatrix<f64>,
    pub lambda: DMatrix<f64>,
}

impl PropagatedPosterior {
    pub fn new(mu: DMatrix<f64>, lambda: DMatrix<f64>) -> Result<Self, BpmfError> {
        let (k, n) = mu.shape();
        if lambda.nrows() != k * k {
            return Err(BpmfError::DimensionMismatch {
                what: "propagated precision rows",
                expected: k * k,
                found: lambda.nrows(),
            });
        }
        if lambda.ncols() != n {
            return Err(BpmfError::DimensionMismatch {
                what: "propagated precision columns",
                expected: n,
                found: lambda.ncols(),
            });
        }
        Ok(Self { mu, lambda })
    }

    pub fn prior(&self, i: usize) -> GaussianPrior {
        let k = self.mu.nrows();
        GaussianPrior {
            mu: self.mu.column(i).into_owned(),
            lambda: DMatrix::from_column_slice(k, k, self.lambda.column(i).as_slice()),
        }
    }

    fn permute(&mut self, perm: &[usize]) {
        self.mu = self.mu.select_columns(perm);
        self.lambda = self.lambda.select_columns(perm);
    }
}

/// Result of [`Sys::predict`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionReport {
    /// RMSE of this sweep's point predictions.
    pub rmse: f64,
    /// RMSE of the running average predictions.
    pub rmse_avg: f64,
    /// Held-out entries evaluated.
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct PerfBucket {
    count: usize,
    total: Duration,
}

/// One entity type: ratings, factors, partition and sampling state.
#[derive(Debug)]
pub struct Sys {
    name: String,
    cfg: Arc<BpmfConfig>,
    procid: WorkerId,
    nprocs: usize,
    /// Message channel of this entity type's columns.
    tag: u16,

    m: CsMat<f64>,
    /// Row offsets of `m`.
    row_ptr: Vec<usize>,
    t: CsMat<f64>,
    pavg: CsMat<f64>,
    pm2: CsMat<f64>,

    items: DMatrix<f64>,
    aggr_mu: DMatrix<f64>,
    aggr_lambda: DMatrix<f64>,
    hp: GaussianPrior,
    propagated: Option<PropagatedPosterior>,
    mean_rating: f64,

    partition: Partition,
    assigned: bool,
    conn: Option<Connectivity>,

    iter: usize,
    stats: EpochStats,
    rmse: f64,
    rmse_avg: f64,
    perf: BTreeMap<usize, PerfBucket>,
    /// Column sends of the last sweep, completed by `receive_items`.
    in_flight: SendQueue,
}

fn same_pattern_zeros(m: &CsMat<f64>) -> CsMat<f64> {
    m.map(|_| 0.0)
}

impl Sys {
    /// Build the first entity type from its training and held-out matrices.
    ///
    /// Both matrices are grown to a common shape. The training matrix must
    /// hold at least one rating.
    pub fn new(
        name: impl Into<String>,
        train: CsMat<f64>,
        test: CsMat<f64>,
        cfg: Arc<BpmfConfig>,
        procid: WorkerId,
        nprocs: usize,
    ) -> Result<Self, BpmfError> {
        let name = name.into();
        cfg.validate()?;
        if nprocs == 0 || procid >= nprocs {
            return Err(BpmfError::RankOutOfRange {
                rank: procid,
                nprocs,
            });
        }
        let train = ratings::ensure_csr(train);
        let test = ratings::ensure_csr(test);
        if train.rows() == 0 || train.cols() == 0 || train.nnz() == 0 {
            return Err(BpmfError::EmptyMatrix(name));
        }
        let rows = train.rows().max(test.rows());
        let cols = train.cols().max(test.cols());
        let m = ratings::resize(&train, rows, cols);
        let t = ratings::resize(&test, rows, cols);
        let mean_rating = ratings::mean_value(&m);
        Ok(Self::from_parts(name, cfg, procid, nprocs, 0, m, t, mean_rating))
    }

    /// Build the opposite entity type by transposing `other`.
    pub fn transposed(name: impl Into<String>, other: &Sys) -> Result<Self, BpmfError> {
        let m = ratings::transpose(&other.m);
        ratings::check_transpose(&other.m, &m)?;
        let t = ratings::transpose(&other.t);
        ratings::check_transpose(&other.t, &t)?;
        let mut sys = Self::from_parts(
            name.into(),
            other.cfg.clone(),
            other.procid,
            other.nprocs,
            other.tag.wrapping_add(1),
            m,
            t,
            other.mean_rating,
        );
        sys.pavg = ratings::transpose(&other.pavg);
        sys.pm2 = ratings::transpose(&other.pm2);
        Ok(sys)
    }

    #[allow(clippy::too_many_arguments)]
    fn from_parts(
        name: String,
        cfg: Arc<BpmfConfig>,
        procid: WorkerId,
        nprocs: usize,
        tag: u16,
        m: CsMat<f64>,
        t: CsMat<f64>,
        mean_rating: f64,
    ) -> Self {
        let k = cfg.num_latent;
        let num = m.rows();
        Self {
            name,
            procid,
            nprocs,
            tag,
            pavg: same_pattern_zeros(&t),
            pm2: same_pattern_zeros(&t),
            row_ptr: ratings::row_ptr(&m),
            m,
            t,
            items: DMatrix::zeros(k, num),
            aggr_mu: DMatrix::zeros(k, num),
            aggr_lambda: DMatrix::zeros(k * k, num),
            hp: GaussianPrior::standard(k),
            propagated: None,
            mean_rating,
            partition: Partition::even(num, nprocs),
            assigned: false,
            conn: None,
            iter: 0,
            stats: EpochStats::zeros(k),
            rmse: 0.0,
            rmse_avg: 0.0,
            perf: BTreeMap::new(),
            in_flight: SendQueue::default(),
            cfg,
        }
    }

    /// Use per-entity priors instead of the global hyperparameters.
    ///
    /// Must be called before [`Sys::assign`], in original entity order.
    pub fn with_propagated_posterior(mut self, posterior: PropagatedPosterior) -> Result<Self, BpmfError> {
        if self.assigned {
            return Err(BpmfError::InvalidConfig(format!(
                "{}: propagated posterior supplied after partitioning",
                self.name
            )));
        }
        if posterior.mu.nrows() != self.num_latent() {
            return Err(BpmfError::DimensionMismatch {
                what: "propagated mean rows",
                expected: self.num_latent(),
                found: posterior.mu.nrows(),
            });
        }
        if posterior.mu.ncols() != self.num() {
            return Err(BpmfError::DimensionMismatch {
                what: "propagated mean columns",
                expected: self.num(),
                found: posterior.mu.ncols(),
            });
        }
        self.propagated = Some(posterior);
        Ok(self)
    }

    /// Replace the global prior, e.g. after the driver resampled it.
    pub fn set_hyperparams(&mut self, prior: GaussianPrior) -> Result<(), BpmfError> {
        prior.check_dim(self.num_latent())?;
        self.hp = prior;
        Ok(())
    }

    fn set_ratings(&mut self, m: CsMat<f64>) {
        self.row_ptr = ratings::row_ptr(&m);
        self.m = m;
    }

    fn check_opposite(&self, other: &Sys) -> Result<(), BpmfError> {
        if other.nprocs != self.nprocs {
            return Err(BpmfError::WorkerCountMismatch {
                own: self.nprocs,
                opposite: other.nprocs,
            });
        }
        if other.num() != self.m.cols() {
            return Err(BpmfError::DimensionMismatch {
                what: "opposite entity count",
                expected: self.m.cols(),
                found: other.num(),
            });
        }
        if other.num_latent() != self.num_latent() {
            return Err(BpmfError::DimensionMismatch {
                what: "opposite latent size",
                expected: self.num_latent(),
                found: other.num_latent(),
            });
        }
        Ok(())
    }

    /// Reorder entities (`perm[new] = old`) and re-derive `other`'s matrices
    /// as transposes so both views keep addressing the same ratings.
    fn apply_permutation(&mut self, perm: &[usize], other: &mut Sys) {
        self.set_ratings(ratings::permute_rows(&self.m, perm));
        self.t = ratings::permute_rows(&self.t, perm);
        self.pavg = ratings::permute_rows(&self.pavg, perm);
        self.pm2 = ratings::permute_rows(&self.pm2, perm);
        self.items = self.items.select_columns(perm);
        self.aggr_mu = self.aggr_mu.select_columns(perm);
        self.aggr_lambda = self.aggr_lambda.select_columns(perm);
        if let Some(p) = self.propagated.as_mut() {
            p.permute(perm);
        }

        other.set_ratings(ratings::transpose(&self.m));
        other.t = ratings::transpose(&self.t);
        other.pavg = ratings::transpose(&self.pavg);
        other.pm2 = ratings::transpose(&self.pm2);
    }

    /// (Re)compute this entity type's partition, consulting `other`'s when it
    /// has one. Invalidates connectivity on both sides.
    pub fn assign(&mut self, other: &mut Sys) -> Result<(), BpmfError> {
        self.check_opposite(other)?;
        let num = self.num();
        if self.nprocs == 1 {
            self.partition = Partition::trivial(num);
        } else if !self.cfg.permute {
            self.partition = Partition::even(num, self.nprocs);
        } else {
            let opposite = other.assigned.then_some(&other.partition);
            let plan = partitioning::plan(&self.m, opposite, self.nprocs, &self.cfg.planner)?;
            if self.cfg.verbose && self.procid == 0 {
                for (pass, report) in plan.reports.iter().enumerate() {
                    log::info!("{}: balance after pass {pass}:\n{report}", self.name);
                }
            }
            self.apply_permutation(&plan.permutation, other);
            self.partition = plan.partition;
        }
        self.assigned = true;
        self.conn = None;
        other.conn = None;

        let p = self.procid;
        log::info!(
            "{}: worker {p} owns {:?} ({} entities, {} ratings)",
            self.name,
            self.partition.range(p),
            self.worker_entities(p),
            self.worker_nnz(p)
        );
        Ok(())
    }

    /// (Re)derive this entity type's destination sets. With
    /// `optimize_locality`, entities are first reordered inside their worker
    /// blocks and `other`'s matrices re-derived.
    pub fn build_conn(&mut self, other: &mut Sys) -> Result<(), BpmfError> {
        self.check_opposite(other)?;
        if !self.assigned {
            return Err(BpmfError::MissingPartition(self.name.clone()));
        }
        if !other.assigned {
            return Err(BpmfError::MissingPartition(other.name.clone()));
        }
        let mut conn = connectivity::build(&self.m, &self.t, &self.partition, &other.partition)?;
        if self.cfg.optimize_locality && self.nprocs > 1 {
            let order = connectivity::locality_order(&conn, &self.partition);
            self.apply_permutation(&order, other);
            conn = connectivity::build(&self.m, &self.t, &self.partition, &other.partition)?;
        }

        if self.procid == 0 {
            log::info!(
                "{}: {:.2} sends per entity, {} per sweep",
                self.name,
                conn.avg_sends(),
                conn.total()
            );
            log::debug!("{}: from\\to sends\n{}", self.name, conn.send_table());
        }
        self.conn = Some(conn);
        Ok(())
    }

    fn prior_of(&self, idx: usize) -> GaussianPrior {
        match &self.propagated {
            Some(p) => p.prior(idx),
            None => self.hp.clone(),
        }
    }

    fn noise_rng(&self, idx: usize) -> SmallRng {
        let mut hasher = AHasher::default();
        hasher.write_u64(self.cfg.seed);
        hasher.write_u64(u64::from(self.tag));
        hasher.write_u64(self.iter as u64);
        hasher.write_u64(idx as u64);
        SmallRng::seed_from_u64(hasher.finish())
    }

    /// Draw entity `idx`'s next vector against `other`'s current factors.
    ///
    /// Does not write the result; returns it with the elapsed time.
    pub fn sample_one(&self, idx: usize, other: &Sys) -> Result<(DVector<f64>, Duration), BpmfError> {
        if idx >= self.num() {
            return Err(BpmfError::DimensionMismatch {
                what: "entity index bound",
                expected: self.num(),
                found: idx,
            });
        }
        let start = Instant::now();
        let prior = self.prior_of(idx);
        let span = self.row_ptr[idx]..self.row_ptr[idx + 1];
        let indices = &self.m.indices()[span.clone()];
        let values = &self.m.data()[span];
        let input = PosteriorInput {
            entity: idx,
            prior: &prior,
            indices,
            values,
            opposite: &other.items,
            alpha: self.cfg.alpha,
            mean_rating: self.mean_rating,
        };
        let strategy = Strategy::select(indices.len(), &self.cfg.sampler);
        let noise = sampler::standard_normal(&mut self.noise_rng(idx), self.num_latent());
        let u = sampler::draw(strategy, &input, &noise, self.cfg.sampler.parallel_grain)?;
        Ok((u, start.elapsed()))
    }

    /// One sweep over the entities this worker owns, followed by sending each
    /// new vector to the workers in its destination set.
    ///
    /// Sends stay in flight until [`Sys::receive_items`] has taken this
    /// worker's incoming columns.
    pub fn sample<C: Communicator>(&mut self, other: &Sys, comm: &C) -> Result<&EpochStats, BpmfError> {
        self.check_opposite(other)?;
        if comm.size() != self.nprocs || comm.rank() != self.procid {
            return Err(BpmfError::Communication(format!(
                "communicator is rank {} of {}, {} expects {} of {}",
                comm.rank(),
                comm.size(),
                self.name,
                self.procid,
                self.nprocs
            )));
        }
        if self.nprocs > 1 && self.conn.is_none() {
            return Err(BpmfError::MissingConnectivity(self.name.clone()));
        }

        let k = self.num_latent();
        let range = self.partition.range(self.procid);
        let start = Instant::now();
        let drawn: Vec<(DVector<f64>, Duration)> = range
            .clone()
            .into_par_iter()
            .map(|i| self.sample_one(i, other))
            .collect::<Result<_, _>>()?;

        let post_burnin = self.iter >= self.cfg.burnin;
        let mut sum = DVector::zeros(k);
        let mut prod = DMatrix::zeros(k, k);
        let mut norm = 0.0;
        let mut nnz = 0;
        for (i, (u, elapsed)) in range.clone().zip(drawn) {
            self.items.set_column(i, &u);
            sum += &u;
            prod.ger(1.0, &u, &u, 1.0);
            norm += u.norm_squared();
            let row_nnz = self.row_ptr[i + 1] - self.row_ptr[i];
            nnz += row_nnz;

            if post_burnin {
                let mut mu = self.aggr_mu.column_mut(i);
                mu += &u;
                let mut lambda = self.aggr_lambda.column_mut(i);
                for c in 0..k {
                    for r in 0..k {
                        lambda[c * k + r] += u[r] * u[c];
                    }
                }
            }

            if self.cfg.measure_perf {
                let bucket = self.perf.entry(row_nnz).or_default();
                bucket.count += 1;
                bucket.total += elapsed;
            }

            if let Some(conn) = &self.conn {
                let dests = conn.conn(i);
                if !dests.is_empty() {
                    let msg = encode_column(self.tag, i, u.as_slice());
                    for to in dests.iter() {
                        self.in_flight.push(comm.isend(to, self.tag, &msg));
                    }
                }
            }
        }
        let count = range.len();
        self.stats = EpochStats::finish(sum, prod, norm, count, self.num());
        self.iter += 1;

        let secs = start.elapsed().as_secs_f64();
        if self.procid == 0 || self.cfg.verbose {
            log::info!(
                "{} sweep {} on worker {}: {count} entities, {nnz} ratings in {secs:.3}s ({:.0} entities/s, {:.0} ratings/s)",
                self.name,
                self.iter,
                self.procid,
                count as f64 / secs.max(f64::EPSILON),
                nnz as f64 / secs.max(f64::EPSILON)
            );
        }
        Ok(&self.stats)
    }

    /// Receive every column of this entity type that another worker sampled
    /// and this worker reads, then complete this worker's own sends. Returns
    /// the number of columns received.
    pub fn receive_items<C: Communicator>(&mut self, comm: &C) -> Result<usize, BpmfError> {
        if self.nprocs == 1 {
            self.in_flight.wait_all();
            return Ok(0);
        }
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| BpmfError::MissingConnectivity(self.name.clone()))?;
        let me = self.procid;
        let mut expected = vec![0usize; self.nprocs];
        for k in 0..self.num() {
            if conn.conn(k).contains(me) {
                expected[self.partition.owner_of(k)] += 1;
            }
        }

        let k = self.num_latent();
        let mut received = 0;
        for (peer, &n) in expected.iter().enumerate() {
            for _ in 0..n {
                let buf = comm.irecv(peer, self.tag).wait().ok_or_else(|| {
                    BpmfError::Communication(format!(
                        "{}: no column from worker {peer} on channel {}",
                        self.name, self.tag
                    ))
                })?;
                let (entity, col) = decode_column(&buf, self.tag, k)?;
                if entity >= self.num() || self.partition.owner_of(entity) != peer {
                    return Err(BpmfError::Communication(format!(
                        "{}: worker {peer} sent entity {entity} it does not own",
                        self.name
                    )));
                }
                self.items.set_column(entity, &col);
                received += 1;
            }
        }
        let sent = self.in_flight.wait_all();
        log::trace!("{}: {received} columns in, {sent} sends completed", self.name);
        Ok(received)
    }

    /// RMSE of the current and running-average predictions on the held-out
    /// ratings, updating the running statistics.
    ///
    /// `all` evaluates every row; otherwise only rows this worker owns.
    pub fn predict(&mut self, other: &Sys, all: bool) -> Result<PredictionReport, BpmfError> {
        self.check_opposite(other)?;
        let rows = if all {
            0..self.num()
        } else {
            self.partition.range(self.procid)
        };
        // post-burn-in samples seen, 0 while still burning in
        let n = self.iter.saturating_sub(self.cfg.burnin);

        let starts = ratings::row_ptr(&self.t);
        let pavg = self.pavg.data_mut();
        let pm2 = self.pm2.data_mut();
        let (mut se, mut se_avg, mut count) = (0.0, 0.0, 0);
        for i in rows {
            let span = starts[i]..starts[i + 1];
            if span.is_empty() {
                continue;
            }
            let u = self.items.column(i);
            if u.norm_squared() == 0.0 {
                return Err(BpmfError::UnsampledVector {
                    side: "own",
                    entity: i,
                });
            }
            let cols = &self.t.indices()[span.clone()];
            let vals = &self.t.data()[span.clone()];
            for ((&j, &r), slot) in cols.iter().zip(vals).zip(span) {
                let v = other.items.column(j);
                if v.norm_squared() == 0.0 {
                    return Err(BpmfError::UnsampledVector {
                        side: "opposite",
                        entity: j,
                    });
                }
                let pred = u.dot(&v) + self.mean_rating;
                welford_update(&mut pavg[slot], &mut pm2[slot], n, pred);
                se += (pred - r).powi(2);
                se_avg += (pavg[slot] - r).powi(2);
                count += 1;
            }
        }

        let (rmse, rmse_avg) = if count == 0 {
            (0.0, 0.0)
        } else {
            ((se / count as f64).sqrt(), (se_avg / count as f64).sqrt())
        };
        self.rmse = rmse;
        self.rmse_avg = rmse_avg;
        Ok(PredictionReport {
            rmse,
            rmse_avg,
            count,
        })
    }

    /// `(nnz, average time)` per row density seen, when `measure_perf` is on.
    pub fn perf_report(&self) -> Vec<(usize, Duration)> {
        self.perf
            .iter()
            .map(|(&nnz, b)| (nnz, b.total / b.count.max(1) as u32))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BpmfConfig {
        &self.cfg
    }

    pub fn procid(&self) -> WorkerId {
        self.procid
    }

    pub fn nprocs(&self) -> usize {
        self.nprocs
    }

    /// Number of entities of this type.
    pub fn num(&self) -> usize {
        self.m.rows()
    }

    pub fn num_latent(&self) -> usize {
        self.cfg.num_latent
    }

    pub fn ratings(&self) -> &CsMat<f64> {
        &self.m
    }

    pub fn held_out(&self) -> &CsMat<f64> {
        &self.t
    }

    /// Running mean of each held-out prediction, same pattern as
    /// [`Sys::held_out`].
    pub fn prediction_mean(&self) -> &CsMat<f64> {
        &self.pavg
    }

    /// Unnormalized running second moment of each held-out prediction.
    pub fn prediction_m2(&self) -> &CsMat<f64> {
        &self.pm2
    }

    pub fn mean_rating(&self) -> f64 {
        self.mean_rating
    }

    pub fn items(&self) -> &DMatrix<f64> {
        &self.items
    }

    pub fn hyperparams(&self) -> &GaussianPrior {
        &self.hp
    }

    pub fn propagated_posterior(&self) -> Option<&PropagatedPosterior> {
        self.propagated.as_ref()
    }

    /// Post-burn-in sum of each entity's samples, `k × N`.
    pub fn aggr_mu(&self) -> &DMatrix<f64> {
        &self.aggr_mu
    }

    /// Post-burn-in sum of each entity's sample outer products, `k² × N`
    /// column-major.
    pub fn aggr_lambda(&self) -> &DMatrix<f64> {
        &self.aggr_lambda
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    pub fn connectivity(&self) -> Option<&Connectivity> {
        self.conn.as_ref()
    }

    pub fn worker_entities(&self, p: WorkerId) -> usize {
        self.partition.count(p)
    }

    pub fn worker_nnz(&self, p: WorkerId) -> usize {
        self.partition
            .range(p)
            .map(|i| ratings::row_nnz(&self.m, i))
            .sum()
    }

    /// Completed sweeps.
    pub fn iter(&self) -> usize {
        self.iter
    }

    pub fn stats(&self) -> &EpochStats {
        &self.stats
    }

    /// Sends posted by the last sweep and not yet completed.
    pub fn sends_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn rmse(&self) -> f64 {
        self.rmse
    }

    pub fn rmse_avg(&self) -> f64 {
        self.rmse_avg
    }
}
