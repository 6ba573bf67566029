//! Run Status Store
//!
//! In-memory registry of run records keyed by run identifier.
//!
//! Records live in a sharded `DashMap`, so runs never contend on a
//! global lock and each record's mutations are serialized by its shard.
//! Insertion order is kept with a sequence number assigned at creation.
//! Nothing is persisted: records disappear on eviction or process exit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, error, info};

use super::model::{RunId, RunRecord, RunSummary};
use crate::error::WorkflowError;

#[derive(Debug)]
struct StoredRun {
    seq: u64,
    record: RunRecord,
}

/// Concurrency-safe registry of run records.
#[derive(Debug, Default)]
pub struct StatusStore {
    runs: DashMap<RunId, StoredRun>,
    next_seq: AtomicU64,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new record. Fails if the identifier is already present.
    pub fn create(&self, run_id: RunId, record: RunRecord) -> Result<(), WorkflowError> {
        match self.runs.entry(run_id) {
            Entry::Occupied(_) => {
                error!("Run {} already registered", run_id);
                Err(WorkflowError::DuplicateRun(run_id))
            }
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(StoredRun { seq, record });
                debug!("Registered run {}", run_id);
                Ok(())
            }
        }
    }

    /// Applies `mutate` to the stored record while holding its shard lock.
    ///
    /// Returns whatever the closure returns, so callers can take a
    /// consistent snapshot of the record in the same critical section.
    pub fn update<F, R>(&self, run_id: &RunId, mutate: F) -> Result<R, WorkflowError>
    where
        F: FnOnce(&mut RunRecord) -> R,
    {
        let mut stored = self
            .runs
            .get_mut(run_id)
            .ok_or(WorkflowError::RunNotFound(*run_id))?;
        Ok(mutate(&mut stored.record))
    }

    /// Returns a snapshot of the record.
    pub fn get(&self, run_id: &RunId) -> Result<RunRecord, WorkflowError> {
        self.runs
            .get(run_id)
            .map(|stored| stored.record.clone())
            .ok_or(WorkflowError::RunNotFound(*run_id))
    }

    /// Summaries of every stored run, oldest first.
    pub fn list(&self) -> Vec<RunSummary> {
        let mut entries: Vec<(u64, RunSummary)> = self
            .runs
            .iter()
            .map(|stored| (stored.seq, stored.record.summary()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, summary)| summary).collect()
    }

    /// Removes terminal runs that finished more than `age` ago.
    ///
    /// PENDING and RUNNING records are kept regardless of age.
    /// Returns the number of records removed.
    pub fn evict_older_than(&self, age: Duration) -> usize {
        // An age too large to represent has no cutoff, so nothing expires
        let cutoff = chrono::Duration::from_std(age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age));

        let before = self.runs.len();
        self.runs.retain(|_, stored| {
            let record = &stored.record;
            let expired = match (record.is_terminal(), record.finished_at, cutoff) {
                (true, Some(finished), Some(cutoff)) => finished < cutoff,
                _ => false,
            };
            !expired
        });
        let removed = before.saturating_sub(self.runs.len());

        info!("Evicted {} runs older than {:?}", removed, age);
        removed
    }

    /// Number of stored runs.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of runs that are PENDING or RUNNING.
    pub fn active_count(&self) -> usize {
        self.runs
            .iter()
            .filter(|stored| !stored.record.is_terminal())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::model::{RunRequest, RunStatus, StepName, StepOutcome};
    use serde_json::json;
    use std::sync::Arc;

    fn new_record() -> (RunId, RunRecord) {
        let id = RunId::new();
        (id, RunRecord::new(id, RunRequest::new("acct1")))
    }

    fn finished_record(finished_ago: chrono::Duration) -> (RunId, RunRecord) {
        let (id, mut record) = new_record();
        record.begin().unwrap();
        record
            .record_step(StepOutcome::success(StepName::Fetch, Utc::now(), json!([])))
            .unwrap();
        record.finish().unwrap();
        record.finished_at = Some(Utc::now() - finished_ago);
        (id, record)
    }

    #[test]
    fn test_create_and_get() {
        let store = StatusStore::new();
        let (id, record) = new_record();
        store.create(id, record.clone()).unwrap();

        assert_eq!(store.get(&id).unwrap(), record);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_duplicate_fails() {
        let store = StatusStore::new();
        let (id, record) = new_record();
        store.create(id, record.clone()).unwrap();

        assert_eq!(store.create(id, record), Err(WorkflowError::DuplicateRun(id)));
    }

    #[test]
    fn test_get_unknown_fails() {
        let store = StatusStore::new();
        let id = RunId::new();
        assert_eq!(store.get(&id), Err(WorkflowError::RunNotFound(id)));
    }

    #[test]
    fn test_update_applies_mutation() {
        let store = StatusStore::new();
        let (id, record) = new_record();
        store.create(id, record).unwrap();

        let status = store
            .update(&id, |r| {
                r.begin().unwrap();
                r.overall_status
            })
            .unwrap();

        assert_eq!(status, RunStatus::Running);
        assert_eq!(store.get(&id).unwrap().overall_status, RunStatus::Running);
    }

    #[test]
    fn test_update_unknown_fails() {
        let store = StatusStore::new();
        let id = RunId::new();
        assert_eq!(store.update(&id, |_| ()), Err(WorkflowError::RunNotFound(id)));
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let store = StatusStore::new();
        let ids: Vec<RunId> = (0..20)
            .map(|_| {
                let (id, record) = new_record();
                store.create(id, record).unwrap();
                id
            })
            .collect();

        let listed: Vec<RunId> = store.list().into_iter().map(|s| s.run_id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn test_evict_only_old_terminal_runs() {
        let store = StatusStore::new();

        let (old_id, old) = finished_record(chrono::Duration::hours(48));
        let (fresh_id, fresh) = finished_record(chrono::Duration::minutes(5));
        let (pending_id, mut pending) = new_record();
        pending.created_at = Utc::now() - chrono::Duration::days(10);
        let (running_id, mut running) = new_record();
        running.begin().unwrap();
        running.created_at = Utc::now() - chrono::Duration::days(10);

        store.create(old_id, old).unwrap();
        store.create(fresh_id, fresh).unwrap();
        store.create(pending_id, pending).unwrap();
        store.create(running_id, running).unwrap();

        let removed = store.evict_older_than(Duration::from_secs(24 * 3600));

        assert_eq!(removed, 1);
        assert!(store.get(&old_id).is_err());
        assert!(store.get(&fresh_id).is_ok());
        assert!(store.get(&pending_id).is_ok());
        assert!(store.get(&running_id).is_ok());
    }

    #[test]
    fn test_evict_zero_age_never_removes_running() {
        let store = StatusStore::new();
        let (running_id, mut running) = new_record();
        running.begin().unwrap();
        store.create(running_id, running).unwrap();

        assert_eq!(store.evict_older_than(Duration::ZERO), 0);
        assert_eq!(store.active_count(), 1);
    }

    #[test]
    fn test_evict_huge_age_removes_nothing() {
        let store = StatusStore::new();
        let (id, record) = finished_record(chrono::Duration::days(365));
        store.create(id, record).unwrap();

        assert_eq!(store.evict_older_than(Duration::from_secs(u64::MAX)), 0);
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        let store = Arc::new(StatusStore::new());
        let ids: Vec<RunId> = (0..8)
            .map(|_| {
                let (id, mut record) = new_record();
                record.begin().unwrap();
                store.create(id, record).unwrap();
                id
            })
            .collect();

        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let store = Arc::clone(&store);
                let id = *id;
                std::thread::spawn(move || {
                    for step in StepName::PIPELINE {
                        store
                            .update(&id, |r| {
                                r.record_step(StepOutcome::success(step, Utc::now(), json!({})))
                            })
                            .unwrap()
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for id in ids {
            let record = store.get(&id).unwrap();
            let names: Vec<StepName> = record.steps.iter().map(|s| s.step_name).collect();
            assert_eq!(names, StepName::PIPELINE.to_vec());
        }
    }
}
