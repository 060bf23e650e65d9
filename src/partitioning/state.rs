//! Per-worker load bookkeeping for the greedy planner.
//!
//! This module provides [`WorkerLoadState`], the running totals the planner
//! consults when it picks a worker for an entity. Every change goes through
//! [`WorkerLoadState::assign_entity`] or [`WorkerLoadState::unassign_entity`],
//! each of which receives the entity's cost figures explicitly.

/// Cost figures of one entity as seen by the planner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityLoad {
    /// Number of ratings in the entity's row.
    pub nnz: usize,
    /// `entity_overhead + nnz`.
    pub work: f64,
    /// Ratings that cross workers if the entity lands on the chosen worker.
    pub comm: usize,
}

/// Running totals per worker plus the current owner of every entity.
#[derive(Debug, Clone)]
pub struct WorkerLoadState {
    /// Ratings owned per worker.
    pub nnz: Vec<usize>,
    /// Entities owned per worker.
    pub entities: Vec<usize>,
    /// Work owned per worker.
    pub work: Vec<f64>,
    pub total_nnz: usize,
    pub total_entities: usize,
    pub total_work: f64,
    pub total_comm: usize,
    owner: Vec<Option<usize>>,
    comm_at_owner: Vec<usize>,
}

impl WorkerLoadState {
    /// Totals start slightly above zero so that ratios are defined before the
    /// first assignment.
    pub fn new(nprocs: usize, num_entities: usize) -> Self {
        Self {
            nnz: vec![0; nprocs],
            entities: vec![0; nprocs],
            work: vec![0.0; nprocs],
            total_nnz: 1,
            total_entities: 1,
            total_work: 0.01,
            total_comm: 0,
            owner: vec![None; num_entities],
            comm_at_owner: vec![0; num_entities],
        }
    }

    pub fn nprocs(&self) -> usize {
        self.work.len()
    }

    /// Current worker of `entity`, if any.
    pub fn owner(&self, entity: usize) -> Option<usize> {
        self.owner[entity]
    }

    /// Share of total work currently held by `proc`.
    pub fn work_share(&self, proc: usize) -> f64 {
        self.work[proc] / self.total_work
    }

    /// Place `entity` on `proc` and add its load to the totals.
    pub fn assign_entity(&mut self, entity: usize, proc: usize, load: EntityLoad) {
        debug_assert!(self.owner[entity].is_none(), "entity {entity} assigned twice");
        self.owner[entity] = Some(proc);
        self.comm_at_owner[entity] = load.comm;
        self.nnz[proc] += load.nnz;
        self.entities[proc] += 1;
        self.work[proc] += load.work;
        self.total_nnz += load.nnz;
        self.total_entities += 1;
        self.total_work += load.work;
        self.total_comm += load.comm;
    }

    /// Remove `entity` from its worker. A no-op for unassigned entities.
    /// Returns the worker it was taken from.
    pub fn unassign_entity(&mut self, entity: usize, load: EntityLoad) -> Option<usize> {
        let proc = self.owner[entity].take()?;
        let comm = std::mem::take(&mut self.comm_at_owner[entity]);
        self.nnz[proc] -= load.nnz;
        self.entities[proc] -= 1;
        self.work[proc] -= load.work;
        self.total_nnz -= load.nnz;
        self.total_entities -= 1;
        self.total_work -= load.work;
        self.total_comm -= comm;
        Some(proc)
    }

    /// Final owner of every entity. `None` only if an entity was never placed.
    pub fn owners(&self) -> &[Option<usize>] {
        &self.owner
    }
}
