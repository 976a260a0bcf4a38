//! `POST /api/v1/auth/ws-ticket` (spec.md §4.13, §6.1).

use super::session::{hash_session_id, session_id_from_headers};
use super::AppState;
use crate::errors::AppError;
use crate::metrics::Metrics;
use crate::model::Ticket;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WsTicketResponse {
    ticket: String,
    ttl_seconds: u64,
    trace_id: String,
}

pub async fn issue_ws_ticket(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let session_id = session_id_from_headers(&headers)
        .ok_or_else(|| AppError::BadRequest("missing x-session-id header".into()))?;

    let ticket_id = uuid::Uuid::new_v4().to_string();
    let trace_id = uuid::Uuid::new_v4().to_string();
    let now_ms = state.clock.now_ms();
    let ticket = Ticket {
        ticket_id: ticket_id.clone(),
        session_hash: hash_session_id(&session_id),
        expires_at_ms: now_ms + state.ticket_ttl.as_millis() as i64,
    };

    state.ticket_store.issue(ticket).await?;
    Metrics::inc(&state.metrics.ws_tickets_issued);

    Ok(Json(WsTicketResponse { ticket: ticket_id, ttl_seconds: state.ticket_ttl.as_secs(), trace_id }))
}
