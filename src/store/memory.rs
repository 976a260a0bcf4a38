//! In-memory `JobStore` fallback (spec.md §4.8: "a local in-memory fallback
//! is acceptable for development"). Shape grounded on the teacher's
//! `DashMap`-backed state plus its periodic `eviction()` sweep task.

use super::{JobStore, StoreError};
use crate::clock::SharedClock;
use crate::errors::JobError;
use crate::model::{JobRecord, JobStatus, SearchResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

pub struct MemoryJobStore {
    jobs: Arc<DashMap<String, JobRecord>>,
    by_fingerprint: Arc<DashMap<String, String>>,
    clock: SharedClock,
    ttl_ms: i64,
}

impl MemoryJobStore {
    pub fn new(clock: SharedClock, ttl: Duration) -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            by_fingerprint: Arc::new(DashMap::new()),
            clock,
            ttl_ms: ttl.as_millis() as i64,
        }
    }

    /// Spawns the periodic sweep task (teacher's `eviction()` pattern).
    pub fn spawn_eviction_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let jobs = self.jobs.clone();
        let by_fp = self.by_fingerprint.clone();
        let clock = self.clock.clone();
        let ttl_ms = self.ttl_ms;
        tokio::spawn(async move {
            let mut iv = tokio::time::interval(Duration::from_secs(60));
            loop {
                iv.tick().await;
                let now = clock.now_ms();
                let before = jobs.len();
                jobs.retain(|_, job| now.saturating_sub(job.created_at_ms) < ttl_ms);
                by_fp.retain(|_, request_id| jobs.contains_key(request_id));
                let after = jobs.len();
                if before != after {
                    tracing::info!(evicted = before - after, remaining = after, "job_store_eviction");
                }
            }
        })
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create_job(&self, job: JobRecord) -> Result<(), StoreError> {
        if self.jobs.contains_key(&job.request_id) {
            return Err(StoreError::AlreadyExists(job.request_id));
        }
        self.by_fingerprint.insert(job.fingerprint.clone(), job.request_id.clone());
        self.jobs.insert(job.request_id.clone(), job);
        Ok(())
    }

    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<JobRecord>, StoreError> {
        let Some(request_id) = self.by_fingerprint.get(fingerprint).map(|r| r.clone()) else {
            return Ok(None);
        };
        Ok(self.jobs.get(&request_id).map(|r| r.clone()))
    }

    async fn get_job(&self, request_id: &str) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.jobs.get(request_id).map(|r| r.clone()))
    }

    async fn set_status(
        &self,
        request_id: &str,
        status: JobStatus,
        progress: Option<u8>,
    ) -> Result<(), StoreError> {
        let mut entry = self
            .jobs
            .get_mut(request_id)
            .ok_or_else(|| StoreError::NotFound(request_id.to_string()))?;
        if let Some(p) = progress {
            if p < entry.progress {
                return Err(StoreError::NonMonotonicProgress { current: entry.progress, attempted: p });
            }
            entry.progress = p;
        }
        entry.status = status;
        entry.updated_at_ms = self.clock.now_ms();
        Ok(())
    }

    async fn set_result(&self, request_id: &str, result: SearchResult) -> Result<(), StoreError> {
        let mut entry = self
            .jobs
            .get_mut(request_id)
            .ok_or_else(|| StoreError::NotFound(request_id.to_string()))?;
        entry.result = Some(result);
        entry.updated_at_ms = self.clock.now_ms();
        Ok(())
    }

    async fn set_error(&self, request_id: &str, error: JobError) -> Result<(), StoreError> {
        let mut entry = self
            .jobs
            .get_mut(request_id)
            .ok_or_else(|| StoreError::NotFound(request_id.to_string()))?;
        entry.error = Some(error);
        entry.updated_at_ms = self.clock.now_ms();
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::store::test_support;

    fn store() -> (Arc<MemoryJobStore>, Arc<dyn crate::clock::Clock>) {
        let clock: Arc<dyn crate::clock::Clock> = Arc::new(FakeClock::new(1_000));
        (Arc::new(MemoryJobStore::new(clock.clone(), Duration::from_secs(86_400))), clock)
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let (s, c) = store();
        test_support::assert_create_then_get_round_trips(s.as_ref(), &c).await;
    }

    #[tokio::test]
    async fn progress_is_monotonic() {
        let (s, c) = store();
        test_support::assert_progress_is_monotonic(s.as_ref(), &c).await;
    }

    #[tokio::test]
    async fn duplicate_create_job_rejected() {
        let (s, c) = store();
        let job = JobRecord::new("dup", "fp", c.now_ms(), None, None);
        s.create_job(job.clone()).await.unwrap();
        assert!(s.create_job(job).await.is_err());
    }

    #[tokio::test]
    async fn find_by_fingerprint_resolves_current_job() {
        let (s, c) = store();
        let job = JobRecord::new("req-x", "fp-x", c.now_ms(), None, None);
        s.create_job(job).await.unwrap();
        let found = s.find_by_fingerprint("fp-x").await.unwrap().unwrap();
        assert_eq!(found.request_id, "req-x");
    }
}
