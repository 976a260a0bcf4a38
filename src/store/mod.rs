//! C5 — Job store: keyed job records, status/progress/result, TTL.

pub mod memory;
pub mod redis_store;

use crate::errors::JobError;
use crate::model::{JobRecord, JobStatus, SearchResult};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} already exists")]
    AlreadyExists(String),
    #[error("job {0} not found")]
    NotFound(String),
    #[error("progress {attempted} is not monotonic (current {current})")]
    NonMonotonicProgress { current: u8, attempted: u8 },
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// C5 contract (spec.md §4.8). All writes outside terminal-state
/// transitions are best-effort: callers treat `Err` from `set_status`
/// (non-terminal) / `set_result` / `set_error` as non-fatal and continue
/// (spec.md §7 propagation policy), except where the spec marks a write
/// fatal (create_job, terminal transitions at the dedup boundary).
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: JobRecord) -> Result<(), StoreError>;
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<JobRecord>, StoreError>;
    async fn get_job(&self, request_id: &str) -> Result<Option<JobRecord>, StoreError>;

    /// Rejects non-monotonic progress; idempotent on status (spec.md §4.8).
    async fn set_status(
        &self,
        request_id: &str,
        status: JobStatus,
        progress: Option<u8>,
    ) -> Result<(), StoreError>;

    async fn set_result(&self, request_id: &str, result: SearchResult) -> Result<(), StoreError>;
    async fn set_error(&self, request_id: &str, error: JobError) -> Result<(), StoreError>;

    /// Startup readiness probe (spec.md §5).
    async fn ping(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::clock::Clock;
    use std::sync::Arc;

    /// Shared contract tests any `JobStore` impl must satisfy (spec.md §8
    /// round-trip: `createJob(id) -> getJob(id)` returns equal status/progress).
    pub async fn assert_create_then_get_round_trips(store: &dyn JobStore, clock: &Arc<dyn Clock>) {
        let job = JobRecord::new("req-1", "fp-1", clock.now_ms(), None, None);
        store.create_job(job.clone()).await.unwrap();
        let fetched = store.get_job("req-1").await.unwrap().unwrap();
        assert_eq!(fetched.status, job.status);
        assert_eq!(fetched.progress, job.progress);
    }

    pub async fn assert_progress_is_monotonic(store: &dyn JobStore, clock: &Arc<dyn Clock>) {
        let job = JobRecord::new("req-2", "fp-2", clock.now_ms(), None, None);
        store.create_job(job).await.unwrap();
        store.set_status("req-2", JobStatus::Running, Some(40)).await.unwrap();
        let err = store.set_status("req-2", JobStatus::Running, Some(10)).await;
        assert!(err.is_err());
        let fetched = store.get_job("req-2").await.unwrap().unwrap();
        assert_eq!(fetched.progress, 40);
    }
}
