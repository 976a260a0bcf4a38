//! Redis-backed `JobStore` (spec.md §4.8 "Expected: a remote key-value store
//! with TTL (e.g., Redis)", §6.4 key layout).

use super::{JobStore, StoreError};
use crate::clock::SharedClock;
use crate::errors::JobError;
use crate::model::{JobRecord, JobStatus, SearchResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

pub struct RedisJobStore {
    conn: ConnectionManager,
    clock: SharedClock,
    ttl_secs: u64,
}

fn job_key(request_id: &str) -> String {
    format!("job:{request_id}")
}

fn fingerprint_key(fingerprint: &str) -> String {
    format!("jobfp:{fingerprint}")
}

impl RedisJobStore {
    pub async fn connect(url: &str, clock: SharedClock, ttl: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let conn = client
            .get_tokio_connection_manager()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { conn, clock, ttl_secs: ttl.as_secs() })
    }

    async fn read(&self, request_id: &str) -> Result<Option<JobRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(job_key(request_id))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        match raw {
            Some(s) => serde_json::from_str(&s)
                .map(Some)
                .map_err(|e| StoreError::Unavailable(e.to_string())),
            None => Ok(None),
        }
    }

    async fn write(&self, job: &JobRecord) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(job).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        conn.set_ex::<_, _, ()>(job_key(&job.request_id), raw, self.ttl_secs)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn create_job(&self, job: JobRecord) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(&job).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let set: bool = redis::cmd("SET")
            .arg(job_key(&job.request_id))
            .arg(&raw)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if !set {
            return Err(StoreError::AlreadyExists(job.request_id));
        }
        conn.set_ex::<_, _, ()>(fingerprint_key(&job.fingerprint), job.request_id.clone(), self.ttl_secs)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<JobRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let request_id: Option<String> = conn
            .get(fingerprint_key(fingerprint))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        match request_id {
            Some(id) => self.read(&id).await,
            None => Ok(None),
        }
    }

    async fn get_job(&self, request_id: &str) -> Result<Option<JobRecord>, StoreError> {
        self.read(request_id).await
    }

    async fn set_status(
        &self,
        request_id: &str,
        status: JobStatus,
        progress: Option<u8>,
    ) -> Result<(), StoreError> {
        let mut job = self
            .read(request_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(request_id.to_string()))?;
        if let Some(p) = progress {
            if p < job.progress {
                return Err(StoreError::NonMonotonicProgress { current: job.progress, attempted: p });
            }
            job.progress = p;
        }
        job.status = status;
        job.updated_at_ms = self.clock.now_ms();
        self.write(&job).await
    }

    async fn set_result(&self, request_id: &str, result: SearchResult) -> Result<(), StoreError> {
        let mut job = self
            .read(request_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(request_id.to_string()))?;
        job.result = Some(result);
        job.updated_at_ms = self.clock.now_ms();
        self.write(&job).await
    }

    async fn set_error(&self, request_id: &str, error: JobError) -> Result<(), StoreError> {
        let mut job = self
            .read(request_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(request_id.to_string()))?;
        job.error = Some(error);
        job.updated_at_ms = self.clock.now_ms();
        self.write(&job).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}
