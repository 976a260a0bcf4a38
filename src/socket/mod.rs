//! C15 — Socket surface (spec.md §4.13, §6.2). Ticket-based handshake, frame
//! parsing, and routing into the subscription registry. Socket I/O runs on
//! its own task per connection, entirely separate from the pipeline task
//! that writes through C7/C8 (spec.md §5 "Socket I/O runs on a separate set
//! of tasks").

mod frame;
mod sink;

use crate::http::AppState;
use crate::metrics::Metrics;
use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use sink::WsSink;
use std::collections::HashSet;
use std::sync::Arc;

use frame::{InboundBody, InboundFrame};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(handshake))
}

#[derive(Debug, Deserialize)]
struct HandshakeParams {
    ticket: String,
}

#[derive(Debug, Serialize)]
struct HandshakeRejection {
    #[serde(rename = "errorCode")]
    error_code: &'static str,
}

async fn handshake(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HandshakeParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let redeemed = state.ticket_store.redeem(&params.ticket).await;
    let session_hash = match redeemed {
        Ok(Some(ticket)) => ticket.session_hash,
        Ok(None) => {
            return (
                axum::http::StatusCode::UNAUTHORIZED,
                Json(HandshakeRejection { error_code: "TICKET_INVALID" }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, "ticket_store_unavailable_at_handshake");
            return (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                Json(HandshakeRejection { error_code: "WS_TICKET_REDIS_NOT_READY" }),
            )
                .into_response();
        }
    };

    Metrics::inc(&state.metrics.ws_tickets_redeemed);
    ws.on_upgrade(move |socket| connection(socket, state, session_hash))
}

async fn connection(socket: axum::extract::ws::WebSocket, state: Arc<AppState>, session_hash: String) {
    let socket_handle = uuid::Uuid::new_v4().to_string();
    let (write, mut read) = socket.split();
    let sink: Arc<WsSink> = Arc::new(WsSink::new(write));

    // Local view of what this connection still wants delivered; the registry
    // has no per-subscriber removal, so unsubscribe is enforced here by
    // filtering outbound sends (spec.md §9 "identifiers only" — no need to
    // mutate registry state to forget a subscriber's interest).
    let mut active: HashSet<(String, String)> = HashSet::new();

    while let Some(msg) = read.next().await {
        let Ok(msg) = msg else { break };
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<InboundFrame>(&text) {
            Ok(frame) if frame.v == 1 => {
                handle_frame(&state, &session_hash, &socket_handle, sink.clone(), frame.body, &mut active).await;
            }
            _ => {
                tracing::warn!(socket_handle, "ws_malformed_frame");
                let _ = sink.send_raw(&error_frame("FRAME_INVALID", "unrecognized frame")).await;
                break;
            }
        }
    }

    tracing::info!(socket_handle, "ws_connection_closed");
}

async fn handle_frame(
    state: &Arc<AppState>,
    session_hash: &str,
    socket_handle: &str,
    sink: Arc<WsSink>,
    body: InboundBody,
    active: &mut HashSet<(String, String)>,
) {
    match body {
        InboundBody::Subscribe { channel, request_id } => {
            subscribe(state, session_hash, socket_handle, sink, &channel, &request_id).await;
            active.insert((channel, request_id));
        }
        InboundBody::Unsubscribe { channel, request_id } => {
            active.remove(&(channel, request_id));
        }
        InboundBody::RevealLimitReached { request_id, channel, ui_language } => {
            tracing::info!(request_id, channel, ui_language, "ws_reveal_limit_reached");
        }
    }
}

async fn subscribe(
    state: &Arc<AppState>,
    session_hash: &str,
    socket_handle: &str,
    sink: Arc<WsSink>,
    channel: &str,
    request_id: &str,
) {
    let job = state.store.get_job(request_id).await.ok().flatten();
    match job {
        Some(job) if !job.owned_by_or_anonymous(session_hash) => {
            tracing::warn!(request_id, socket_handle, "ws_subscribe_ownership_rejected");
            let _ = sink.send_raw(&error_frame("NOT_FOUND", "unknown requestId")).await;
        }
        Some(_) => {
            let drained = state
                .registry
                .subscribe_active(channel, request_id, session_hash, socket_handle, sink.clone())
                .await;
            for backlog_event in &drained {
                if sink.send(&backlog_event.event).await.is_err() {
                    tracing::warn!(request_id, socket_handle, "ws_publish_error");
                }
            }
        }
        None => {
            state.registry.subscribe_pending(request_id, session_hash, socket_handle, sink);
        }
    }
}

fn error_frame(code: &str, message: &str) -> String {
    serde_json::json!({"v": 1, "type": "error", "code": code, "message": message}).to_string()
}
