//! Streaming statistics: per-entry prediction averages and per-sweep factor
//! summaries.

use nalgebra::{DMatrix, DVector};

/// Welford update of a running mean and unnormalized second moment.
///
/// `n` is the number of samples including `x`. `n == 0` restarts the
/// statistic at `x` (used during burn-in, where only the latest prediction
/// counts).
pub fn welford_update(mean: &mut f64, m2: &mut f64, n: usize, x: f64) {
    if n <= 1 {
        *mean = x;
        *m2 = 0.0;
        return;
    }
    let delta = x - *mean;
    *mean += delta / n as f64;
    *m2 += delta * (x - *mean);
}

/// Running mean and variance of one scalar stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStat {
    pub n: usize,
    pub mean: f64,
    pub m2: f64,
}

impl RunningStat {
    pub fn push(&mut self, x: f64) {
        self.n += 1;
        welford_update(&mut self.mean, &mut self.m2, self.n, x);
    }

    /// Sample variance; zero with fewer than two samples.
    pub fn variance(&self) -> f64 {
        if self.n < 2 {
            0.0
        } else {
            self.m2 / (self.n - 1) as f64
        }
    }
}

/// Sum, bias-corrected covariance and squared norm of the vectors sampled in
/// one sweep by one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochStats {
    pub sum: DVector<f64>,
    pub cov: DMatrix<f64>,
    pub norm: f64,
    /// Vectors accumulated.
    pub count: usize,
}

impl EpochStats {
    pub fn zeros(k: usize) -> Self {
        Self {
            sum: DVector::zeros(k),
            cov: DMatrix::zeros(k, k),
            norm: 0.0,
            count: 0,
        }
    }

    /// `(Σvvᵀ − (Σv)(Σv)ᵀ/N)/(N−1)` for `N` entities in total.
    ///
    /// `N` is the size of the entity type, not the number of vectors this
    /// worker sampled, so per-worker results can be summed by the driver.
    pub fn finish(sum: DVector<f64>, prod: DMatrix<f64>, norm: f64, count: usize, n: usize) -> Self {
        let n_f = n as f64;
        let denom = n.saturating_sub(1).max(1) as f64;
        let cov = (prod - &sum * sum.transpose() / n_f) / denom;
        Self {
            sum,
            cov,
            norm,
            count,
        }
    }
}
