//! In-process job store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vtx_models::{Job, JobId, JobStatus, NewJob};

use crate::error::{JobStoreError, JobStoreResult};
use crate::store::{JobStore, JobUpdate};

#[derive(Default)]
struct State {
    jobs: HashMap<JobId, Job>,
    /// Insertion order, used to break `created_at` ties.
    order: Vec<JobId>,
    history: HashMap<JobId, Vec<(JobStatus, DateTime<Utc>)>>,
}

/// Job store kept in memory.
///
/// Enforces the status state machine on every update and keeps a per-job log of
/// the statuses each row passed through.
#[derive(Default)]
pub struct MemoryJobStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Statuses `id` has been in, oldest first.
    pub fn history(&self, id: &JobId) -> Vec<(JobStatus, DateTime<Utc>)> {
        self.lock()
            .map(|state| state.history.get(id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Status sequence for `id` without timestamps.
    pub fn statuses(&self, id: &JobId) -> Vec<JobStatus> {
        self.history(id).into_iter().map(|(status, _)| status).collect()
    }

    /// Seed a job row as-is, e.g. one with a fixed id.
    pub fn seed(&self, job: Job) -> JobStoreResult<()> {
        let mut state = self.lock()?;
        state
            .history
            .entry(job.id.clone())
            .or_default()
            .push((job.status, Utc::now()));
        state.order.push(job.id.clone());
        state.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|state| state.jobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> JobStoreResult<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| JobStoreError::unavailable("memory store lock poisoned"))
    }

    fn check_available(&self) -> JobStoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(JobStoreError::unavailable("memory store marked unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: NewJob) -> JobStoreResult<Job> {
        self.check_available()?;
        let row = Job::queued(JobId::new(), job);
        self.seed(row.clone())?;
        Ok(row)
    }

    async fn get(&self, id: &JobId) -> JobStoreResult<Option<Job>> {
        self.check_available()?;
        Ok(self.lock()?.jobs.get(id).cloned())
    }

    async fn find_queued(&self) -> JobStoreResult<Option<Job>> {
        self.check_available()?;
        let state = self.lock()?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.jobs.get(id))
            .find(|job| job.status == JobStatus::Queued)
            .cloned())
    }

    async fn update(&self, id: &JobId, update: JobUpdate) -> JobStoreResult<Option<Job>> {
        self.check_available()?;
        let mut state = self.lock()?;

        let Some(job) = state.jobs.get_mut(id) else {
            return Ok(None);
        };
        if let Some(expected) = update.expected_status {
            if job.status != expected {
                return Ok(None);
            }
        }
        if !job.status.can_transition_to(update.status) {
            return Err(JobStoreError::InvalidTransition {
                from: job.status,
                to: update.status,
            });
        }

        update.apply_to(job);
        let updated = job.clone();
        state
            .history
            .entry(id.clone())
            .or_default()
            .push((updated.status, Utc::now()));
        Ok(Some(updated))
    }

    async fn list_by_user(&self, user_id: &str) -> JobStoreResult<Vec<Job>> {
        self.check_available()?;
        let state = self.lock()?;
        let mut rows: Vec<(usize, &Job)> = state
            .order
            .iter()
            .enumerate()
            .filter_map(|(seq, id)| state.jobs.get(id).map(|job| (seq, job)))
            .filter(|(_, job)| job.user_id.as_deref() == Some(user_id))
            .collect();
        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });
        Ok(rows.into_iter().map(|(_, job)| job.clone()).collect())
    }

    async fn ping(&self) -> JobStoreResult<()> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_is_queued() {
        let store = MemoryJobStore::new();
        let job = store
            .insert(NewJob::new("store://videos/uploads/a.mp4", Some("u1".into())))
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.result_url.is_none());
        assert_eq!(store.get(&job.id).await.unwrap(), Some(job.clone()));
        assert_eq!(store.statuses(&job.id), vec![JobStatus::Queued]);
    }

    #[tokio::test]
    async fn test_conditional_claim_only_once() {
        let store = MemoryJobStore::new();
        let job = store.insert(NewJob::new("store://b/k", None)).await.unwrap();

        let first = store
            .update(&job.id, JobUpdate::processing().only_if(JobStatus::Queued))
            .await
            .unwrap();
        let second = store
            .update(&job.id, JobUpdate::processing().only_if(JobStatus::Queued))
            .await
            .unwrap();

        assert_eq!(first.map(|j| j.status), Some(JobStatus::Processing));
        assert!(second.is_none());
        assert!(store.find_queued().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_illegal_transition() {
        let store = MemoryJobStore::new();
        let job = store.insert(NewJob::new("store://b/k", None)).await.unwrap();

        let err = store
            .update(&job.id, JobUpdate::done("store://b/outputs/x.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, JobStoreError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_history_records_lifecycle() {
        let store = MemoryJobStore::new();
        let job = store.insert(NewJob::new("store://b/k", None)).await.unwrap();

        store.update(&job.id, JobUpdate::processing()).await.unwrap();
        store.update(&job.id, JobUpdate::failed("boom")).await.unwrap();

        assert_eq!(
            store.statuses(&job.id),
            vec![JobStatus::Queued, JobStatus::Processing, JobStatus::Failed]
        );
        let stored = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.error.as_deref(), Some("boom"));
        assert!(stored.validate().is_ok());
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let store = MemoryJobStore::new();
        let result = store
            .update(&JobId::from_string("nope"), JobUpdate::processing())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_by_user_newest_first() {
        let store = MemoryJobStore::new();
        let a = store.insert(NewJob::new("store://b/1", Some("u1".into()))).await.unwrap();
        let _other = store.insert(NewJob::new("store://b/2", Some("u2".into()))).await.unwrap();
        let c = store.insert(NewJob::new("store://b/3", Some("u1".into()))).await.unwrap();

        let jobs = store.list_by_user("u1").await.unwrap();
        let ids: Vec<_> = jobs.iter().map(|j| j.id.clone()).collect();
        assert_eq!(ids, vec![c.id, a.id]);
        assert!(store.list_by_user("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = MemoryJobStore::new();
        store.set_unavailable(true);
        assert!(store.ping().await.is_err());
        assert!(store.find_queued().await.is_err());

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }
}
