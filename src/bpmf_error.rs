//! BpmfError: Unified error type for bpmf-rs public APIs
//!
//! Every fallible operation in the crate returns this error. None of the
//! variants is transient: a caller seeing one of them should stop the run.

use thiserror::Error;

/// Unified error type for sampling, partitioning and communication.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BpmfError {
    /// A rating matrix without rows, columns or nonzeros was supplied.
    #[error("Precondition violated: rating matrix `{0}` is empty")]
    EmptyMatrix(String),
    /// Two inputs that must agree in shape do not.
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// A configuration value is outside its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The local rank is not a valid worker index.
    #[error("Rank {rank} out of range for {nprocs} workers")]
    RankOutOfRange { rank: usize, nprocs: usize },
    /// The two entity types were partitioned for different worker counts.
    #[error("Worker count mismatch: {own} workers here, {opposite} on the opposite side")]
    WorkerCountMismatch { own: usize, opposite: usize },
    /// The accumulated posterior precision could not be factorized.
    #[error("Cholesky factorization failed for entity {entity} ({nnz} ratings): precision is not positive definite")]
    NotPositiveDefinite { entity: usize, nnz: usize },
    /// A latent vector with zero norm was read before ever being sampled.
    #[error("Precondition violated: latent vector of {side} entity {entity} has zero norm")]
    UnsampledVector { side: &'static str, entity: usize },
    /// An operation needs a partition that has not been assigned yet.
    #[error("Partition for `{0}` has not been assigned")]
    MissingPartition(String),
    /// An operation needs connectivity that has not been built yet.
    #[error("Connectivity for `{0}` has not been built")]
    MissingConnectivity(String),
    /// A message could not be decoded or did not arrive.
    #[error("Communication error: {0}")]
    Communication(String),
    /// An internal structure failed validation.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}
