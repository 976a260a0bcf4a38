//! Error taxonomy (spec.md §7) and the stage-outcome sum type (spec.md §9)
//! that replaces error-as-control-flow inside the pipeline.

use crate::llm::LlmError;
use crate::provider::ProviderError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Closed set of error kinds from spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ProviderTimeout,
    ProviderUnavailable,
    LlmSchemaInvalid,
    LlmFatal,
    StoreUnavailable,
    StaleRunning,
    ResultMissing,
    WsNotReady,
    SearchFailed,
    NotFound,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::ProviderTimeout => "PROVIDER_TIMEOUT",
            ErrorKind::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            ErrorKind::LlmSchemaInvalid => "LLM_SCHEMA_INVALID",
            ErrorKind::LlmFatal => "LLM_FATAL",
            ErrorKind::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorKind::StaleRunning => "STALE_RUNNING",
            ErrorKind::ResultMissing => "RESULT_MISSING",
            ErrorKind::WsNotReady => "WS_NOT_READY",
            ErrorKind::SearchFailed => "SEARCH_FAILED",
            ErrorKind::NotFound => "NOT_FOUND",
        }
    }

    fn retriable(self) -> bool {
        matches!(self, ErrorKind::ProviderTimeout | ErrorKind::ProviderUnavailable)
    }
}

/// Error attached to a terminal DONE_FAILED job record (spec.md §3.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobError {
    pub code: String,
    pub message: String,
    pub error_type: String,
}

impl JobError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code: kind.code().to_string(),
            message: message.into(),
            error_type: if kind.retriable() { "retriable".into() } else { "fatal".into() },
        }
    }

    pub fn from_llm_error(e: &LlmError) -> Self {
        let kind = match e {
            LlmError::SchemaInvalid(_) => ErrorKind::LlmSchemaInvalid,
            LlmError::AbortTimeout { .. } | LlmError::Provider5xx { .. } | LlmError::Provider4xxFatal { .. } => {
                ErrorKind::LlmFatal
            }
        };
        Self::new(kind, e.to_string())
    }

    pub fn from_provider_error(e: &ProviderError) -> Self {
        let kind = match e {
            ProviderError::Timeout => ErrorKind::ProviderTimeout,
            ProviderError::Server { .. } | ProviderError::Client { .. } => ErrorKind::ProviderUnavailable,
        };
        Self::new(kind, e.to_string())
    }

    /// Safe defaults used when an `error` field was dropped by a non-fatal
    /// write failure (spec.md §3.3, §6.1 `GET .../result`).
    pub fn default_search_failed() -> Self {
        Self {
            code: "SEARCH_FAILED".into(),
            message: "Search failed. Please retry.".into(),
            error_type: "fatal".into(),
        }
    }
}

/// HTTP-facing application error. Handlers return `Result<T, AppError>` and
/// use `?`; this maps each spec.md §7 kind to its wire status + body once.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("ws ticket store not ready")]
    WsNotReady,
    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<crate::store::StoreError> for AppError {
    fn from(e: crate::store::StoreError) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

impl From<crate::ticket_store::TicketStoreError> for AppError {
    fn from(_: crate::ticket_store::TicketStoreError) -> Self {
        AppError::WsNotReady
    }
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "errorCode")]
    error_code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorBody { error_code: "NOT_FOUND", message: "unknown requestId".into() }),
            )
                .into_response(),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody { error_code: "BAD_REQUEST", message: msg }),
            )
                .into_response(),
            AppError::StoreUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody { error_code: "STORE_UNAVAILABLE", message: msg }),
            )
                .into_response(),
            AppError::WsNotReady => {
                let mut resp = (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ErrorBody {
                        error_code: "WS_TICKET_REDIS_NOT_READY",
                        message: "ticket store not ready".into(),
                    }),
                )
                    .into_response();
                resp.headers_mut()
                    .insert("Retry-After", axum::http::HeaderValue::from_static("2"));
                resp
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal_error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody { error_code: "INTERNAL", message: "internal error".into() }),
                )
                    .into_response()
            }
        }
    }
}

/// Outcome of one pipeline stage (spec.md §9): success, a non-fatal
/// fallback, or a terminal condition that ends the pipeline early. The
/// orchestrator dispatches on this instead of treating a stage error as an
/// exception to unwind.
pub enum StageOutcome<T> {
    Success(T),
    FallbackUsed(T, &'static str),
    Terminal(JobError),
}

impl<T> StageOutcome<T> {
    /// Collapses `Success`/`FallbackUsed` into the value, logging the
    /// fallback reason; `Terminal` becomes `Err` carrying the job error the
    /// orchestrator should persist and publish.
    pub fn into_value_or_log(self, stage: &'static str) -> Result<T, JobError> {
        match self {
            StageOutcome::Success(v) => Ok(v),
            StageOutcome::FallbackUsed(v, reason) => {
                tracing::warn!(stage, reason, "stage_fallback_used");
                Ok(v)
            }
            StageOutcome::Terminal(err) => {
                tracing::error!(stage, code = %err.code, "stage_terminal");
                Err(err)
            }
        }
    }
}
