//! C14 — HTTP surface (spec.md §4.12, §6.1). Teacher-style: one `Router`,
//! one `AppState`, handlers grouped by resource in sibling modules, wired
//! together with the same `ServiceBuilder` layer stack the teacher used for
//! its ingest endpoint.

mod ops;
mod search;
mod session;
mod ticket;

use crate::config::{DedupConfig, RankingConfig, RegionPolicyConfig};
use crate::clock::SharedClock;
use crate::metrics::Metrics;
use crate::pipeline::PipelineDeps;
use crate::pubsub::SubscriptionRegistry;
use crate::store::JobStore;
use crate::ticket_store::TicketStore;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub ticket_store: Arc<dyn TicketStore>,
    pub registry: Arc<SubscriptionRegistry>,
    pub pipeline_deps: Arc<PipelineDeps>,
    pub dedup: DedupConfig,
    pub ranking: RankingConfig,
    pub region_policy: RegionPolicyConfig,
    pub clock: SharedClock,
    pub metrics: Arc<Metrics>,
    pub ticket_ttl: Duration,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/search", post(search::submit_search))
        .route("/api/v1/search/:request_id/result", get(search::get_result))
        .route("/api/v1/auth/ws-ticket", post(ticket::issue_ws_ticket))
        .route("/health", get(ops::health))
        .route("/ready", get(ops::ready))
        .route("/metrics", get(ops::metrics))
        .merge(crate::socket::router())
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CompressionLayer::new()))
}
