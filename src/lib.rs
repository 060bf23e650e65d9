//! # bpmf-rs
//!
//! bpmf-rs trains a Bayesian probabilistic matrix factorization of a sparse
//! rating matrix with Gibbs sampling, spread over a fixed group of workers.
//! Each worker owns a contiguous slice of each entity type and samples only
//! those latent vectors, then ships them to the workers that read them.
//!
//! ## Pieces
//! - [`partitioning`]: greedy planner balancing work against ratings that
//!   cross workers, producing a [`Partition`](partitioning::Partition) and the
//!   entity permutation behind it
//! - [`connectivity`]: per-entity destination sets and the worker-to-worker
//!   message table
//! - [`sampler`]: the conjugate Gaussian draw of one latent vector, with three
//!   factorization strategies picked by row density
//! - [`sys`]: one entity type's state; epoch sweeps, column exchange and
//!   held-out prediction
//! - [`algs::communicator`]: serial, in-process and (feature `mpi-support`)
//!   MPI transports
//!
//! ## Determinism
//!
//! Every latent draw uses a `SmallRng` seeded from the configured seed, the
//! entity type, the sweep number and the entity index, so a run does not
//! depend on rayon scheduling.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! bpmf-rs = "0.3"
//! # features = ["mpi-support"]
//! ```

pub mod algs;
pub mod bpmf_error;
pub mod config;
pub mod connectivity;
pub mod debug_invariants;
pub mod partitioning;
pub mod ratings;
pub mod sampler;
pub mod stats;
pub mod sys;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{Communicator, LocalComm, NoComm, SendQueue, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::bpmf_error::BpmfError;
    pub use crate::config::{BpmfConfig, PlannerConfig, SamplerConfig};
    pub use crate::connectivity::{Connectivity, ProcSet};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::partitioning::{Partition, Plan, WorkerId, plan};
    pub use crate::sampler::{GaussianPrior, PosteriorInput, Strategy};
    pub use crate::stats::{EpochStats, RunningStat};
    pub use crate::sys::{PredictionReport, PropagatedPosterior, Sys};
}
