//! Thin façade over in-process or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees). Messages
//! between one (source, destination, tag) triple are delivered in send order.
//! All handles are **waitable**; callers `.wait()` before trusting a receive
//! buffer.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;

/// Point-to-point byte messages between the workers of one group.
pub trait Communicator {
    /// Handle returned by `isend`. Sends may outlive the call that posted
    /// them, so the handle owns whatever it needs.
    type SendHandle: Wait + Send + Sync + 'static;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// Index of the local worker.
    fn rank(&self) -> usize;
    /// Number of workers.
    fn size(&self) -> usize;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    fn irecv(&self, peer: usize, tag: u16) -> Self::RecvHandle;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

/// Sends posted but not yet waited on, whatever communicator posted them.
#[derive(Default)]
pub struct SendQueue(Vec<Box<dyn FnOnce() + Send + Sync>>);

impl SendQueue {
    pub fn push<H: Wait + Send + Sync + 'static>(&mut self, handle: H) {
        self.0.push(Box::new(move || {
            handle.wait();
        }));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wait for every queued send, oldest first. Returns how many completed.
    pub fn wait_all(&mut self) -> usize {
        let n = self.0.len();
        for done in self.0.drain(..) {
            done();
        }
        n
    }
}

impl fmt::Debug for SendQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SendQueue").field(&self.0.len()).finish()
    }
}

/// Compile-time no-op comm for a single worker.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16) {}
}

// --- LocalComm: workers as threads of one process ---
type Key = (usize, usize, u16); // (src, dst, tag)
type Mailbox = DashMap<Key, VecDeque<Bytes>>;

/// Pending receive on a [`LocalComm`] mailbox.
pub struct LocalHandle {
    mailbox: Arc<Mailbox>,
    key: Key,
    timeout: Duration,
}

impl Wait for LocalHandle {
    /// Polls until a message arrives; `None` once the timeout elapses.
    fn wait(self) -> Option<Vec<u8>> {
        let start = Instant::now();
        loop {
            if let Some(mut queue) = self.mailbox.get_mut(&self.key) {
                if let Some(bytes) = queue.pop_front() {
                    return Some(bytes.to_vec());
                }
            }
            if start.elapsed() > self.timeout {
                return None;
            }
            std::thread::yield_now();
        }
    }
}

/// In-process communicator: every worker of a group shares one mailbox.
#[derive(Clone, Debug)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
    timeout: Duration,
}

impl LocalComm {
    /// One communicator per worker of an `n`-worker group.
    pub fn group(n: usize) -> Vec<LocalComm> {
        let mailbox = Arc::new(Mailbox::new());
        (0..n)
            .map(|rank| LocalComm {
                rank,
                size: n,
                mailbox: mailbox.clone(),
                timeout: Duration::from_secs(60),
            })
            .collect()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Messages sent but not yet received, over the whole group.
    pub fn pending(&self) -> usize {
        self.mailbox.iter().map(|e| e.value().len()).sum()
    }
}

impl Communicator for LocalComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        let key = (self.rank, peer, tag);
        self.mailbox
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16) -> Self::RecvHandle {
        LocalHandle {
            mailbox: self.mailbox.clone(),
            key: (peer, self.rank, tag),
            timeout: self.timeout,
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::environment::Universe;
    use mpi::point_to_point::{Destination, Source};
    use mpi::request::StaticScope;
    use mpi::topology::{Communicator as MpiCommunicator, SimpleCommunicator};

    /// World communicator; finalizes MPI when dropped.
    pub struct MpiComm {
        world: SimpleCommunicator,
        _universe: Universe,
        rank: usize,
        size: usize,
    }

    impl MpiComm {
        /// `None` if MPI was already initialized.
        pub fn new() -> Option<Self> {
            let universe = mpi::initialize()?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Some(Self {
                world,
                _universe: universe,
                rank,
                size,
            })
        }
    }

    /// Send buffer handed to MPI; freed once its request completes.
    struct InFlight<R> {
        request: R,
        buf: *mut [u8],
    }

    // MPI request handles are plain integers and the buffer is owned by
    // the send until `wait` returns. Only ever moved, never shared.
    unsafe impl<R> Send for InFlight<R> {}
    unsafe impl<R> Sync for InFlight<R> {}

    /// Pending MPI send or completed receive.
    pub enum MpiHandle {
        Sent(Box<dyn FnOnce() + Send + Sync>),
        Received(Vec<u8>),
    }

    impl Wait for MpiHandle {
        fn wait(self) -> Option<Vec<u8>> {
            match self {
                MpiHandle::Sent(done) => {
                    done();
                    None
                }
                MpiHandle::Received(msg) => Some(msg),
            }
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiHandle;
        type RecvHandle = MpiHandle;

        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }

        /// Posts a non-blocking send of a private copy of `buf`. Dropping
        /// the handle without waiting aborts, as for any MPI request.
        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiHandle {
            let raw: *mut [u8] = Box::into_raw(buf.to_vec().into_boxed_slice());
            // SAFETY: `raw` stays allocated until the request completes below.
            let bytes: &'static [u8] = unsafe { &*raw };
            let request = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, bytes, i32::from(tag));
            let flight = InFlight { request, buf: raw };
            MpiHandle::Sent(Box::new(move || {
                let flight = flight;
                let InFlight { request, buf } = flight;
                request.wait();
                // SAFETY: the request is complete; MPI no longer reads `buf`.
                drop(unsafe { Box::from_raw(buf) });
            }))
        }

        fn irecv(&self, peer: usize, tag: u16) -> MpiHandle {
            let (msg, _status) = self
                .world
                .process_at_rank(peer as i32)
                .receive_vec_with_tag::<u8>(i32::from(tag));
            MpiHandle::Received(msg)
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
