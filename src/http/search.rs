//! `POST /api/v1/search` and `GET /api/v1/search/:requestId/result`
//! (spec.md §4.12, §6.1).

use super::session::{hash_session_id, session_id_from_headers};
use super::AppState;
use crate::dedup::{self, DedupDecision};
use crate::errors::{AppError, JobError};
use crate::metrics::Metrics;
use crate::model::job::JobStatus;
use crate::model::request::{Coordinate, SearchRequest};
use crate::model::result::SearchResult;
use crate::model::{IdempotencyFingerprint, JobRecord};
use crate::pipeline;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const CONTRACTS_VERSION: &str = crate::model::result::CONTRACTS_VERSION;
const DEFAULT_REGION: &str = "US";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSearchBody {
    pub query: String,
    pub user_location: Option<Coordinate>,
    pub region_code: Option<String>,
    pub ui_language: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitSearchResponse {
    request_id: String,
    status: &'static str,
    contracts_version: &'static str,
}

pub async fn submit_search(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SubmitSearchBody>,
) -> Result<impl IntoResponse, AppError> {
    let Some(session_id) = session_id_from_headers(&headers) else {
        return Err(AppError::BadRequest("missing x-session-id header".into()));
    };

    let request = SearchRequest {
        query: body.query,
        user_location: body.user_location,
        ui_language: body.ui_language,
        region_code: body.region_code.unwrap_or_else(|| DEFAULT_REGION.to_string()),
        session_id: session_id.clone(),
        user_id: None,
        submitted_at_ms: state.clock.now_ms(),
    };
    let fingerprint = IdempotencyFingerprint::compute(&request);
    Metrics::inc(&state.metrics.searches_submitted);

    let outcome = dedup::decide(state.store.as_ref(), fingerprint.as_str(), &state.dedup, &state.clock).await?;

    let (request_id, status) = match outcome.decision {
        DedupDecision::Reuse { request_id } => {
            Metrics::inc(&state.metrics.searches_reused);
            let status = state.store.get_job(&request_id).await?.map(|j| j.status).unwrap_or(JobStatus::Pending);
            (request_id, status)
        }
        DedupDecision::NewJob => {
            Metrics::inc(&state.metrics.searches_new);
            let request_id = uuid::Uuid::new_v4().to_string();
            let owner_session_hash = Some(hash_session_id(&session_id));
            let job = JobRecord::new(&request_id, fingerprint.as_str(), state.clock.now_ms(), owner_session_hash.clone(), None);
            state.store.create_job(job).await?;
            state
                .registry
                .activate_pending_subscriptions("search", &request_id, owner_session_hash.as_deref(), false)
                .await;

            let deps = state.pipeline_deps.clone();
            let rid = request_id.clone();
            tokio::spawn(async move { pipeline::run(deps, request, rid).await });

            (request_id, JobStatus::Pending)
        }
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitSearchResponse { request_id, status: status.as_wire_str(), contracts_version: CONTRACTS_VERSION }),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[serde(untagged)]
enum GetResultResponse {
    NonTerminal {
        request_id: String,
        status: &'static str,
        progress: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        meta: Option<NonTerminalMeta>,
        contracts_version: &'static str,
    },
    Success {
        request_id: String,
        status: &'static str,
        results: Vec<crate::model::place::Place>,
        assist: crate::model::result::AssistantMessage,
        contracts_version: &'static str,
    },
    Failure {
        request_id: String,
        status: &'static str,
        code: String,
        message: String,
        error_type: String,
        terminal: bool,
        contracts_version: &'static str,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NonTerminalMeta {
    is_stale: bool,
}

pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let job = state.store.get_job(&request_id).await?.ok_or(AppError::NotFound)?;

    if !job.status.is_terminal() {
        let age_ms = state.clock.now_ms().saturating_sub(job.updated_at_ms);
        let is_stale = age_ms > state.dedup.running_max_age.as_millis() as i64;
        let body = GetResultResponse::NonTerminal {
            request_id: job.request_id,
            status: job.status.as_wire_str(),
            progress: job.progress,
            meta: is_stale.then_some(NonTerminalMeta { is_stale }),
            contracts_version: CONTRACTS_VERSION,
        };
        return Ok((StatusCode::ACCEPTED, Json(body)));
    }

    if job.status == JobStatus::DoneFailed {
        let error = job.error.unwrap_or_else(JobError::default_search_failed);
        let body = GetResultResponse::Failure {
            request_id: job.request_id,
            status: "DONE_FAILED",
            code: error.code,
            message: error.message,
            error_type: error.error_type,
            terminal: true,
            contracts_version: CONTRACTS_VERSION,
        };
        return Ok((StatusCode::OK, Json(body)));
    }

    match job.result {
        Some(SearchResult { places, assistant, .. }) => {
            let body = GetResultResponse::Success {
                request_id: job.request_id,
                status: "done",
                results: places,
                assist: assistant,
                contracts_version: CONTRACTS_VERSION,
            };
            Ok((StatusCode::OK, Json(body)))
        }
        None => {
            let body = GetResultResponse::Failure {
                request_id: job.request_id,
                status: "DONE_SUCCESS",
                code: "RESULT_MISSING".to_string(),
                message: "Search completed but result unavailable. Please retry.".to_string(),
                error_type: "fatal".to_string(),
                terminal: true,
                contracts_version: CONTRACTS_VERSION,
            };
            Ok((StatusCode::OK, Json(body)))
        }
    }
}
