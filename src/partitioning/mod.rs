//! Entry-point for the load-balancing partition planner.
//!
//! A [`Partition`] splits one entity type into `nprocs` contiguous ranges.
//! [`plan`] computes the worker of every entity with a few greedy passes that
//! trade work balance against ratings crossing workers, then returns the
//! stable permutation that makes each worker's entities contiguous.

pub mod metrics;
pub mod state;

#[cfg(test)]
mod tests;

pub use self::metrics::BalanceReport;
pub use self::state::{EntityLoad, WorkerLoadState};

use sprs::CsMat;

use crate::bpmf_error::BpmfError;
use crate::config::PlannerConfig;
use crate::debug_invariants::DebugInvariants;

pub type WorkerId = usize;

/// Boundary offsets of a contiguous partition: worker `p` owns
/// `bounds[p]..bounds[p + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    bounds: Vec<usize>,
}

impl Partition {
    /// One worker owning everything.
    pub fn trivial(num: usize) -> Self {
        Self {
            bounds: vec![0, num],
        }
    }

    /// `nprocs` blocks of `num / nprocs` entities; the last block also takes
    /// the remainder.
    pub fn even(num: usize, nprocs: usize) -> Self {
        assert!(nprocs > 0, "need at least one worker");
        let per = num / nprocs;
        let mut bounds: Vec<usize> = (0..nprocs).map(|p| p * per).collect();
        bounds.push(num);
        Self { bounds }
    }

    /// Prefix sums of per-worker entity counts.
    pub fn from_counts(counts: &[usize]) -> Self {
        let mut bounds = Vec::with_capacity(counts.len() + 1);
        bounds.push(0);
        let mut acc = 0;
        for &c in counts {
            acc += c;
            bounds.push(acc);
        }
        Self { bounds }
    }

    /// Build from raw boundaries, validating them.
    pub fn from_bounds(bounds: Vec<usize>) -> Result<Self, BpmfError> {
        let p = Self { bounds };
        p.validate_invariants()?;
        Ok(p)
    }

    pub fn bounds(&self) -> &[usize] {
        &self.bounds
    }

    pub fn nprocs(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Total number of entities covered.
    pub fn num(&self) -> usize {
        *self.bounds.last().unwrap_or(&0)
    }

    pub fn from(&self, p: WorkerId) -> usize {
        self.bounds[p]
    }

    pub fn to(&self, p: WorkerId) -> usize {
        self.bounds[p + 1]
    }

    pub fn range(&self, p: WorkerId) -> std::ops::Range<usize> {
        self.from(p)..self.to(p)
    }

    pub fn count(&self, p: WorkerId) -> usize {
        self.to(p) - self.from(p)
    }

    /// Worker owning `idx`. Empty ranges are skipped.
    pub fn owner_of(&self, idx: usize) -> WorkerId {
        debug_assert!(idx < self.num(), "entity {idx} outside partition");
        self.bounds.partition_point(|&b| b <= idx) - 1
    }
}

impl DebugInvariants for Partition {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Partition");
    }

    fn validate_invariants(&self) -> Result<(), BpmfError> {
        if self.bounds.len() < 2 {
            return Err(BpmfError::InvariantViolation(
                "partition needs at least two boundaries".into(),
            ));
        }
        if self.bounds[0] != 0 {
            return Err(BpmfError::InvariantViolation(format!(
                "partition starts at {} instead of 0",
                self.bounds[0]
            )));
        }
        if let Some(w) = self.bounds.windows(2).position(|w| w[0] > w[1]) {
            return Err(BpmfError::InvariantViolation(format!(
                "partition boundary {} > {} at worker {w}",
                self.bounds[w],
                self.bounds[w + 1]
            )));
        }
        Ok(())
    }
}

/// Result of a planner run.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Final worker of each entity, in original entity order.
    pub owner: Vec<WorkerId>,
    /// `permutation[new] = old`: worker blocks in ascending order, original
    /// relative order kept inside each block.
    pub permutation: Vec<usize>,
    /// Boundaries in the permuted index space.
    pub partition: Partition,
    /// Per-worker totals after the last pass.
    pub load: WorkerLoadState,
    /// One report per pass.
    pub reports: Vec<BalanceReport>,
}

/// Number of `row`'s ratings whose opposite entity lives on each worker.
fn ratings_per_worker(m: &CsMat<f64>, row: usize, opposite: &Partition) -> Vec<usize> {
    let mut per = vec![0usize; opposite.nprocs()];
    if let Some(r) = m.outer_view(row) {
        for &j in r.indices() {
            per[opposite.owner_of(j)] += 1;
        }
    }
    per
}

/// Greedy load-balancing assignment of the rows of `m` to `nprocs` workers.
///
/// `opposite` is the partition of the column entities, when one exists; its
/// absence (bootstrap) zeroes the communication term.
pub fn plan(
    m: &CsMat<f64>,
    opposite: Option<&Partition>,
    nprocs: usize,
    cfg: &PlannerConfig,
) -> Result<Plan, BpmfError> {
    let num = m.rows();
    if num == 0 || m.cols() == 0 || m.nnz() == 0 {
        return Err(BpmfError::EmptyMatrix("planner input".into()));
    }
    if nprocs == 0 {
        return Err(BpmfError::InvalidConfig("nprocs must be ≥ 1".into()));
    }
    if let Some(opp) = opposite {
        if opp.num() != m.cols() {
            return Err(BpmfError::DimensionMismatch {
                what: "opposite partition size",
                expected: m.cols(),
                found: opp.num(),
            });
        }
        if opp.nprocs() != nprocs {
            return Err(BpmfError::WorkerCountMismatch {
                own: nprocs,
                opposite: opp.nprocs(),
            });
        }
    }

    let nnz_of: Vec<usize> = m.outer_iterator().map(|r| r.nnz()).collect();
    let mut load = WorkerLoadState::new(nprocs, num);
    let mut reports = Vec::with_capacity(cfg.passes);

    for pass in 0..cfg.passes {
        for i in 0..num {
            let nnz = nnz_of[i];
            let work = cfg.entity_overhead + nnz as f64;
            let comm_on: Vec<usize> = match opposite {
                Some(opp) => ratings_per_worker(m, i, opp)
                    .into_iter()
                    .map(|local| nnz - local)
                    .collect(),
                None => vec![0; nprocs],
            };
            let entity = |comm| EntityLoad { nnz, work, comm };

            if let Some(prev) = load.owner(i) {
                load.unassign_entity(i, entity(comm_on[prev]));
            }

            let mut best = 0;
            let mut min_cost = f64::INFINITY;
            for p in 0..nprocs {
                let cost = cfg.imbalance_weight * load.work_share(p)
                    + cfg.comm_weight * comm_on[p] as f64;
                if cost < min_cost {
                    best = p;
                    min_cost = cost;
                }
            }
            load.assign_entity(i, best, entity(comm_on[best]));
        }
        let report = BalanceReport::from_state(&load, m.nnz(), num);
        log::debug!("planner pass {pass}: {report}");
        reports.push(report);
    }

    let mut owner = Vec::with_capacity(num);
    for (i, o) in load.owners().iter().enumerate() {
        owner.push(o.ok_or_else(|| {
            BpmfError::InvariantViolation(format!("entity {i} left unassigned"))
        })?);
    }

    let mut by_worker: Vec<Vec<usize>> = vec![Vec::new(); nprocs];
    for (i, &p) in owner.iter().enumerate() {
        by_worker[p].push(i);
    }
    let counts: Vec<usize> = by_worker.iter().map(Vec::len).collect();
    let permutation: Vec<usize> = by_worker.into_iter().flatten().collect();
    let partition = Partition::from_counts(&counts);
    partition.debug_assert_invariants();

    Ok(Plan {
        owner,
        permutation,
        partition,
        load,
        reports,
    })
}
