//! Partitioning quality metrics.
//!
//! This module summarizes a [`WorkerLoadState`] into the imbalance and
//! communication figures the planner logs after every pass. The report is
//! purely diagnostic.

use std::fmt;

use itertools::{Itertools, MinMaxResult};

use super::state::WorkerLoadState;

/// Maximum, average and minimum of one per-worker quantity, plus the spread
/// `nprocs · (max − min) / total` in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub max: f64,
    pub avg: f64,
    pub min: f64,
    pub unbalance_pct: f64,
}

impl Spread {
    fn of(values: impl Iterator<Item = f64>, total: f64, nprocs: usize) -> Self {
        let (min, max) = match values.minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::NoElements => (0.0, 0.0),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
        let unbalance_pct = if total > 0.0 {
            100.0 * nprocs as f64 * (max - min) / total
        } else {
            0.0
        };
        Self {
            max,
            avg: total / nprocs.max(1) as f64,
            min,
            unbalance_pct,
        }
    }
}

impl fmt::Display for Spread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0}%\t({:.1} <-> {:.1} <-> {:.1})",
            self.unbalance_pct, self.max, self.avg, self.min
        )
    }
}

/// Balance and communication summary of a (partial) assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceReport {
    /// Ratings crossing workers, as a percentage of `nnz · nprocs`.
    pub comm_pct: f64,
    pub nnz: Spread,
    pub entities: Spread,
    pub work: Spread,
}

impl BalanceReport {
    /// `total_nnz` and `num_entities` are the matrix totals, not the running
    /// totals of the state (which carry a small bootstrap offset).
    pub fn from_state(st: &WorkerLoadState, total_nnz: usize, num_entities: usize) -> Self {
        let p = st.nprocs();
        let comm_pct = if total_nnz > 0 {
            100.0 * st.total_comm as f64 / total_nnz as f64 / p as f64
        } else {
            0.0
        };
        Self {
            comm_pct,
            nnz: Spread::of(st.nnz.iter().map(|&v| v as f64), total_nnz as f64, p),
            entities: Spread::of(
                st.entities.iter().map(|&v| v as f64),
                num_entities as f64,
                p,
            ),
            work: Spread::of(st.work.iter().copied(), st.total_work, p),
        }
    }
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "comm cost {:.2}% | nnz unbalance {} | entities unbalance {} | work unbalance {}",
            self.comm_pct, self.nnz, self.entities, self.work
        )
    }
}
