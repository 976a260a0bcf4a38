//! WS ticket issuance over HTTP, then single-use redemption against the
//! ticket store directly — concurrent redeemers racing for the same ticket
//! must see exactly one winner.

mod support;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use place_search_core::model::request::Coordinate;
use serde_json::Value;
use support::{build_harness, FakeLlmTransport};
use tower::ServiceExt;

const BODY_LIMIT: usize = 1024 * 1024;

#[tokio::test]
async fn issued_ticket_redeems_exactly_once_under_concurrent_redemption() {
    let harness = build_harness(FakeLlmTransport::default(), Coordinate { lat: 0.0, lng: 0.0 });
    let router = place_search_core::http::build_router(harness.state.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/ws-ticket")
        .header("x-session-id", "session-ticket")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let ticket_id = body["ticket"].as_str().unwrap().to_string();
    assert!(body["ttlSeconds"].as_u64().unwrap() > 0);

    let store_a = harness.state.ticket_store.clone();
    let store_b = harness.state.ticket_store.clone();
    let id_a = ticket_id.clone();
    let id_b = ticket_id.clone();

    let (first, second) = tokio::join!(
        tokio::spawn(async move { store_a.redeem(&id_a).await.unwrap() }),
        tokio::spawn(async move { store_b.redeem(&id_b).await.unwrap() }),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    let successes = [&first, &second].iter().filter(|r| r.is_some()).count();
    assert_eq!(successes, 1, "exactly one concurrent redeemer should win the single-use ticket");
}

#[tokio::test]
async fn ws_ticket_requires_session_header() {
    let harness = build_harness(FakeLlmTransport::default(), Coordinate { lat: 0.0, lng: 0.0 });
    let router = place_search_core::http::build_router(harness.state.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/ws-ticket")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
