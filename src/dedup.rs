//! C13 — Dedup & lifecycle decision matrix (spec.md §4.9).

use crate::clock::SharedClock;
use crate::config::DedupConfig;
use crate::errors::{ErrorKind, JobError};
use crate::model::{JobRecord, JobStatus};
use crate::store::{JobStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupDecision {
    NewJob,
    Reuse { request_id: String },
}

pub struct DedupOutcome {
    pub decision: DedupDecision,
    pub reason: &'static str,
}

/// Applies the spec.md §4.9 decision matrix. On `STALE_RUNNING_NO_HEARTBEAT`
/// the prior record is marked `DONE_FAILED(STALE_RUNNING)` before returning
/// `NewJob` — best-effort, per §4.8 non-terminal write semantics, except this
/// is itself a terminal transition so its failure is logged but not retried.
pub async fn decide(
    store: &dyn JobStore,
    fingerprint: &str,
    config: &DedupConfig,
    clock: &SharedClock,
) -> Result<DedupOutcome, StoreError> {
    let existing = store.find_by_fingerprint(fingerprint).await?;

    let Some(job) = existing else {
        tracing::info!(fingerprint, "dedup_candidate_found_none");
        return Ok(log_decision(DedupDecision::NewJob, "no_existing_job"));
    };

    tracing::info!(fingerprint, request_id = %job.request_id, status = ?job.status, "dedup_candidate_found");

    let now = clock.now_ms();
    let age_ms = now.saturating_sub(job.updated_at_ms);

    let outcome = match job.status {
        JobStatus::DoneSuccess => {
            if age_ms <= config.success_fresh_window.as_millis() as i64 {
                DedupOutcome { decision: DedupDecision::Reuse { request_id: job.request_id }, reason: "DONE_SUCCESS_FRESH" }
            } else {
                log_decision(DedupDecision::NewJob, "DONE_SUCCESS_STALE")
            }
        }
        JobStatus::DoneFailed => log_decision(DedupDecision::NewJob, "DONE_FAILED_NEVER_REUSED"),
        JobStatus::Running | JobStatus::Pending => {
            if age_ms <= config.running_max_age.as_millis() as i64 {
                DedupOutcome { decision: DedupDecision::Reuse { request_id: job.request_id }, reason: "RUNNING_WITHIN_TTL" }
            } else {
                reclaim_stale_running(store, &job).await;
                log_decision(DedupDecision::NewJob, "STALE_RUNNING_NO_HEARTBEAT")
            }
        }
    };

    tracing::info!(fingerprint, decision = ?outcome.decision, reason = outcome.reason, "dedup_decision");
    Ok(outcome)
}

fn log_decision(decision: DedupDecision, reason: &'static str) -> DedupOutcome {
    DedupOutcome { decision, reason }
}

async fn reclaim_stale_running(store: &dyn JobStore, job: &JobRecord) {
    if let Err(e) = store
        .set_error(&job.request_id, JobError::new(ErrorKind::StaleRunning, "stale running job reclaimed"))
        .await
    {
        tracing::warn!(request_id = %job.request_id, error = %e, "store_error");
    }
    if let Err(e) = store.set_status(&job.request_id, JobStatus::DoneFailed, None).await {
        tracing::warn!(request_id = %job.request_id, error = %e, "store_error");
    }
}
