//! Run-wide configuration.
//!
//! [`BpmfConfig`] is built once at startup, validated, wrapped in an `Arc` and
//! handed to every [`Sys`](crate::sys::Sys). Nothing mutates it afterwards.

use serde::{Deserialize, Serialize};

use crate::bpmf_error::BpmfError;

/// Knobs of the greedy partition planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Number of full reassignment passes over all entities.
    pub passes: usize,
    /// Fixed work charged per entity on top of its nonzero count.
    pub entity_overhead: f64,
    /// Weight of the per-worker work share in the assignment cost.
    pub imbalance_weight: f64,
    /// Weight of the number of ratings that would cross workers.
    pub comm_weight: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            passes: 3,
            entity_overhead: 10.0,
            imbalance_weight: 10_000.0,
            comm_weight: 1.0,
        }
    }
}

/// Density thresholds of the posterior sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Rows with fewer ratings use rank-1 Cholesky updates.
    pub incremental_below: usize,
    /// Rows with at least this many ratings accumulate in parallel.
    pub parallel_from: usize,
    /// Minimum number of ratings handled per rayon task in the parallel path.
    pub parallel_grain: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            incremental_below: 24,
            parallel_from: 10_500,
            parallel_grain: 200,
        }
    }
}

/// Global configuration shared by both entity types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BpmfConfig {
    /// Latent dimension `k`.
    pub num_latent: usize,
    /// Number of sweeps excluded from posterior and prediction averaging.
    pub burnin: usize,
    /// Number of post-burn-in sweeps the driver intends to run.
    pub nsims: usize,
    /// Observation noise precision.
    pub alpha: f64,
    /// Run the load-balancing planner; otherwise split evenly.
    pub permute: bool,
    /// Reorder entities inside each worker block by destination set.
    pub optimize_locality: bool,
    /// Emit per-worker diagnostics in addition to the rank-0 summaries.
    pub verbose: bool,
    /// Record per-entity sampling time.
    pub measure_perf: bool,
    /// Base seed of the per-entity noise streams.
    pub seed: u64,
    pub planner: PlannerConfig,
    pub sampler: SamplerConfig,
}

impl Default for BpmfConfig {
    fn default() -> Self {
        Self {
            num_latent: 10,
            burnin: 0,
            nsims: 20,
            alpha: 2.0,
            permute: true,
            optimize_locality: false,
            verbose: false,
            measure_perf: false,
            seed: 42,
            planner: PlannerConfig::default(),
            sampler: SamplerConfig::default(),
        }
    }
}

impl BpmfConfig {
    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<(), BpmfError> {
        if self.num_latent == 0 {
            return Err(BpmfError::InvalidConfig("num_latent must be ≥ 1".into()));
        }
        if !(self.alpha > 0.0) {
            return Err(BpmfError::InvalidConfig(format!(
                "alpha must be positive, got {}",
                self.alpha
            )));
        }
        if self.planner.passes == 0 {
            return Err(BpmfError::InvalidConfig("planner.passes must be ≥ 1".into()));
        }
        if self.planner.entity_overhead < 0.0
            || self.planner.imbalance_weight < 0.0
            || self.planner.comm_weight < 0.0
        {
            return Err(BpmfError::InvalidConfig(
                "planner weights must be non-negative".into(),
            ));
        }
        if self.sampler.incremental_below > self.sampler.parallel_from {
            return Err(BpmfError::InvalidConfig(format!(
                "sampler.incremental_below ({}) exceeds sampler.parallel_from ({})",
                self.sampler.incremental_below, self.sampler.parallel_from
            )));
        }
        if self.sampler.parallel_grain == 0 {
            return Err(BpmfError::InvalidConfig(
                "sampler.parallel_grain must be ≥ 1".into(),
            ));
        }
        Ok(())
    }

    /// Total number of sweeps a driver runs: burn-in plus sampling.
    pub fn total_iterations(&self) -> usize {
        self.burnin + self.nsims
    }
}
