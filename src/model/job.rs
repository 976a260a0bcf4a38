//! §3.3 JobRecord.

use super::result::SearchResult;
use crate::errors::JobError;
use serde::{Deserialize, Serialize};

/// Status DAG: PENDING -> RUNNING -> {DONE_SUCCESS, DONE_FAILED}. No back-edges
/// (spec.md §3.3 invariant). Accepts the legacy `"FAILED"` literal on read only
/// (spec.md §9 open question), never produced on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "DONE_SUCCESS")]
    DoneSuccess,
    #[serde(rename = "DONE_FAILED")]
    DoneFailed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::DoneSuccess | JobStatus::DoneFailed)
    }

    pub fn as_wire_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::DoneSuccess => "DONE_SUCCESS",
            JobStatus::DoneFailed => "DONE_FAILED",
        }
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "PENDING" => Ok(JobStatus::Pending),
            "RUNNING" => Ok(JobStatus::Running),
            "DONE_SUCCESS" => Ok(JobStatus::DoneSuccess),
            // Back-compat: legacy writer used bare "FAILED" (spec.md §9).
            "DONE_FAILED" | "FAILED" => Ok(JobStatus::DoneFailed),
            other => Err(serde::de::Error::custom(format!("unknown job status {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub request_id: String,
    pub fingerprint: String,
    pub status: JobStatus,
    /// Monotonic in [0,100]; writers must never lower it (spec.md §3.3).
    pub progress: u8,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub owner_session_hash: Option<String>,
    pub owner_user_hash: Option<String>,
    pub error: Option<JobError>,
    pub result: Option<SearchResult>,
}

impl JobRecord {
    pub fn new(
        request_id: impl Into<String>,
        fingerprint: impl Into<String>,
        now_ms: i64,
        owner_session_hash: Option<String>,
        owner_user_hash: Option<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            fingerprint: fingerprint.into(),
            status: JobStatus::Pending,
            progress: 0,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            owner_session_hash,
            owner_user_hash,
            error: None,
            result: None,
        }
    }

    /// Is this job anonymous/public (no bound owner)? Used by
    /// `activatePendingSubscriptions` (spec.md §4.10) to skip ownership checks.
    pub fn is_anonymous(&self) -> bool {
        self.owner_session_hash.is_none() && self.owner_user_hash.is_none()
    }

    /// True if `owner_session_hash` matches, or the job is anonymous.
    pub fn owned_by_or_anonymous(&self, session_hash: &str) -> bool {
        self.is_anonymous() || self.owner_session_hash.as_deref() == Some(session_hash)
    }
}
