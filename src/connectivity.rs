//! Which workers need which freshly sampled vectors.
//!
//! For every entity, [`build`] collects the workers owning any opposite entity
//! it co-occurs with in the training or held-out matrix. Those workers read the
//! entity's vector during their next sweep, so the owner sends it to each of
//! them after sampling. The own worker is never a destination.

pub mod proc_set;

pub use self::proc_set::ProcSet;

use hashbrown::HashMap;
use rayon::prelude::*;
use sprs::CsMat;

use crate::bpmf_error::BpmfError;
use crate::debug_invariants::DebugInvariants;
use crate::partitioning::{Partition, WorkerId};

/// Destination sets of one entity type plus the per worker-pair tally.
#[derive(Debug, Clone)]
pub struct Connectivity {
    sets: Vec<ProcSet>,
    counts: HashMap<(WorkerId, WorkerId), usize>,
    total: usize,
    nprocs: usize,
}

impl Connectivity {
    /// Destinations of entity `k`.
    pub fn conn(&self, k: usize) -> &ProcSet {
        &self.sets[k]
    }

    pub fn num(&self) -> usize {
        self.sets.len()
    }

    pub fn nprocs(&self) -> usize {
        self.nprocs
    }

    /// Vectors sent per sweep from worker `from` to worker `to`.
    pub fn conn_count(&self, from: WorkerId, to: WorkerId) -> usize {
        self.counts.get(&(from, to)).copied().unwrap_or(0)
    }

    /// Vectors sent per sweep over all workers.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Average number of sends per entity.
    pub fn avg_sends(&self) -> f64 {
        if self.sets.is_empty() {
            0.0
        } else {
            self.total as f64 / self.sets.len() as f64
        }
    }

    /// Tab separated from→to matrix, one row per sending worker.
    pub fn send_table(&self) -> String {
        let mut out = String::new();
        for to in 0..self.nprocs {
            out.push('\t');
            out.push_str(&to.to_string());
        }
        for from in 0..self.nprocs {
            out.push('\n');
            out.push_str(&from.to_string());
            for to in 0..self.nprocs {
                out.push('\t');
                out.push_str(&self.conn_count(from, to).to_string());
            }
        }
        out
    }
}

impl DebugInvariants for Connectivity {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Connectivity");
    }

    fn validate_invariants(&self) -> Result<(), BpmfError> {
        let popcount: usize = self.sets.iter().map(ProcSet::count).sum();
        let tallied: usize = self.counts.values().sum();
        if popcount != self.total || tallied != self.total {
            return Err(BpmfError::InvariantViolation(format!(
                "message count {} disagrees with set sizes {popcount} / table {tallied}",
                self.total
            )));
        }
        if let Some(bad) = self.counts.keys().find(|(from, to)| from == to) {
            return Err(BpmfError::InvariantViolation(format!(
                "worker {} sends to itself",
                bad.0
            )));
        }
        Ok(())
    }
}

fn check_shape(
    what: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), BpmfError> {
    if expected == found {
        Ok(())
    } else {
        Err(BpmfError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}

/// Derive destination sets for the rows of `m` (training) and `t` (held-out).
pub fn build(
    m: &CsMat<f64>,
    t: &CsMat<f64>,
    own: &Partition,
    opposite: &Partition,
) -> Result<Connectivity, BpmfError> {
    if own.nprocs() != opposite.nprocs() {
        return Err(BpmfError::WorkerCountMismatch {
            own: own.nprocs(),
            opposite: opposite.nprocs(),
        });
    }
    check_shape("connectivity rows", m.rows(), own.num())?;
    check_shape("connectivity columns", m.cols(), opposite.num())?;
    check_shape("held-out rows", m.rows(), t.rows())?;
    check_shape("held-out columns", m.cols(), t.cols())?;

    let nprocs = own.nprocs();
    let sets: Vec<ProcSet> = (0..m.rows())
        .into_par_iter()
        .map(|k| {
            let mut set = ProcSet::new(nprocs);
            for mat in [m, t] {
                if let Some(row) = mat.outer_view(k) {
                    for &j in row.indices() {
                        set.insert(opposite.owner_of(j));
                    }
                }
            }
            set.remove(own.owner_of(k));
            set
        })
        .collect();

    let mut counts = HashMap::new();
    let mut total = 0;
    for (k, set) in sets.iter().enumerate() {
        let from = own.owner_of(k);
        for to in set.iter() {
            *counts.entry((from, to)).or_insert(0) += 1;
            total += 1;
        }
    }

    let conn = Connectivity {
        sets,
        counts,
        total,
        nprocs,
    };
    conn.debug_assert_invariants();
    Ok(conn)
}

/// Permutation (`new → old`) sorting each worker block by the destination
/// set's bit string, so entities bound for the same workers sit together.
/// Block boundaries are unchanged.
pub fn locality_order(conn: &Connectivity, own: &Partition) -> Vec<usize> {
    let keys: Vec<String> = (0..conn.num())
        .into_par_iter()
        .map(|k| conn.conn(k).to_bit_string())
        .collect();
    let mut perm: Vec<usize> = (0..conn.num()).collect();
    for p in 0..own.nprocs() {
        perm[own.range(p)].sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    }
    perm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratings::from_triplets;

    /// 4 entities × 4 opposite entities, two workers on each side.
    fn fixture() -> (CsMat<f64>, CsMat<f64>, Partition, Partition) {
        let m = from_triplets(
            4,
            4,
            &[(0, 0, 1.0), (0, 3, 1.0), (1, 1, 1.0), (2, 2, 1.0), (3, 0, 1.0)],
        );
        let t = from_triplets(4, 4, &[(1, 2, 1.0)]);
        (m, t, Partition::even(4, 2), Partition::even(4, 2))
    }

    #[test]
    fn destinations_exclude_owner() {
        let (m, t, own, opp) = fixture();
        let conn = build(&m, &t, &own, &opp).unwrap();
        // entity 0 (worker 0) rates 0 (w0) and 3 (w1)
        assert_eq!(conn.conn(0).iter().collect::<Vec<_>>(), vec![1]);
        // entity 1 (worker 0) rates 1 (w0), held-out 2 (w1)
        assert_eq!(conn.conn(1).iter().collect::<Vec<_>>(), vec![1]);
        // entity 2 (worker 1) rates 2 (w1)
        assert!(conn.conn(2).is_empty());
        // entity 3 (worker 1) rates 0 (w0)
        assert_eq!(conn.conn(3).iter().collect::<Vec<_>>(), vec![0]);
        for k in 0..4 {
            assert!(!conn.conn(k).contains(own.owner_of(k)));
        }
        assert_eq!(conn.conn_count(0, 1), 2);
        assert_eq!(conn.conn_count(1, 0), 1);
        assert_eq!(conn.conn_count(0, 0), 0);
        assert_eq!(conn.total(), 3);
        conn.validate_invariants().unwrap();
        assert!(conn.send_table().contains("0\t0\t2"));
    }

    #[test]
    fn single_worker_sends_nothing() {
        let (m, t, _, _) = fixture();
        let conn = build(&m, &t, &Partition::trivial(4), &Partition::trivial(4)).unwrap();
        assert_eq!(conn.total(), 0);
        assert_eq!(conn.avg_sends(), 0.0);
    }

    #[test]
    fn mismatched_worker_counts_rejected() {
        let (m, t, own, _) = fixture();
        let opp = Partition::even(4, 4);
        assert!(matches!(
            build(&m, &t, &own, &opp),
            Err(BpmfError::WorkerCountMismatch { .. })
        ));
    }

    #[test]
    fn locality_order_keeps_blocks() {
        let m = from_triplets(
            4,
            4,
            &[(0, 3, 1.0), (1, 0, 1.0), (2, 0, 1.0), (3, 1, 1.0)],
        );
        let t = from_triplets(4, 4, &[]);
        let own = Partition::even(4, 2);
        let opp = Partition::even(4, 2);
        let conn = build(&m, &t, &own, &opp).unwrap();
        let perm = locality_order(&conn, &own);
        // block 0: entity 0 → {1} ("10"), entity 1 → {} ("00") ⇒ 1 first
        assert_eq!(&perm[0..2], &[1, 0]);
        // block 1: entity 2 → {0} ("01"), entity 3 → {0} ("01") ⇒ stable
        assert_eq!(&perm[2..4], &[2, 3]);
    }
}
