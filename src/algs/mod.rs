//! Re-export message-passing building blocks.

pub mod communicator;
pub mod wire;

pub use communicator::{Communicator, LocalComm, NoComm, SendQueue, Wait};
#[cfg(feature = "mpi-support")]
pub use communicator::MpiComm;
