//! Process-wide observability counters.
//!
//! Shape lifted directly from the teacher's `Metrics`/`MResp` pair: atomic
//! counters bumped inline at each branch, exposed as one JSON document on
//! `/metrics`. Field names are renamed for this domain.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Metrics {
    pub searches_submitted: AtomicU64,
    pub searches_new: AtomicU64,
    pub searches_reused: AtomicU64,
    pub searches_stale_reclaimed: AtomicU64,
    pub searches_done_success: AtomicU64,
    pub searches_done_failed: AtomicU64,
    pub llm_calls_total: AtomicU64,
    pub llm_retries_total: AtomicU64,
    pub llm_timeouts_total: AtomicU64,
    pub llm_schema_invalid_total: AtomicU64,
    pub provider_calls_total: AtomicU64,
    pub provider_failures_total: AtomicU64,
    pub geocode_cache_hits: AtomicU64,
    pub geocode_cache_misses: AtomicU64,
    pub ws_publish_failures_total: AtomicU64,
    pub ws_tickets_issued: AtomicU64,
    pub ws_tickets_redeemed: AtomicU64,
    pub store_write_failures_total: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            searches_submitted: AtomicU64::new(0),
            searches_new: AtomicU64::new(0),
            searches_reused: AtomicU64::new(0),
            searches_stale_reclaimed: AtomicU64::new(0),
            searches_done_success: AtomicU64::new(0),
            searches_done_failed: AtomicU64::new(0),
            llm_calls_total: AtomicU64::new(0),
            llm_retries_total: AtomicU64::new(0),
            llm_timeouts_total: AtomicU64::new(0),
            llm_schema_invalid_total: AtomicU64::new(0),
            provider_calls_total: AtomicU64::new(0),
            provider_failures_total: AtomicU64::new(0),
            geocode_cache_hits: AtomicU64::new(0),
            geocode_cache_misses: AtomicU64::new(0),
            ws_publish_failures_total: AtomicU64::new(0),
            ws_tickets_issued: AtomicU64::new(0),
            ws_tickets_redeemed: AtomicU64::new(0),
            store_write_failures_total: AtomicU64::new(0),
        }
    }

    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let l = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            searches_submitted: l(&self.searches_submitted),
            searches_new: l(&self.searches_new),
            searches_reused: l(&self.searches_reused),
            searches_stale_reclaimed: l(&self.searches_stale_reclaimed),
            searches_done_success: l(&self.searches_done_success),
            searches_done_failed: l(&self.searches_done_failed),
            llm_calls_total: l(&self.llm_calls_total),
            llm_retries_total: l(&self.llm_retries_total),
            llm_timeouts_total: l(&self.llm_timeouts_total),
            llm_schema_invalid_total: l(&self.llm_schema_invalid_total),
            provider_calls_total: l(&self.provider_calls_total),
            provider_failures_total: l(&self.provider_failures_total),
            geocode_cache_hits: l(&self.geocode_cache_hits),
            geocode_cache_misses: l(&self.geocode_cache_misses),
            ws_publish_failures_total: l(&self.ws_publish_failures_total),
            ws_tickets_issued: l(&self.ws_tickets_issued),
            ws_tickets_redeemed: l(&self.ws_tickets_redeemed),
            store_write_failures_total: l(&self.store_write_failures_total),
        }
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub searches_submitted: u64,
    pub searches_new: u64,
    pub searches_reused: u64,
    pub searches_stale_reclaimed: u64,
    pub searches_done_success: u64,
    pub searches_done_failed: u64,
    pub llm_calls_total: u64,
    pub llm_retries_total: u64,
    pub llm_timeouts_total: u64,
    pub llm_schema_invalid_total: u64,
    pub provider_calls_total: u64,
    pub provider_failures_total: u64,
    pub geocode_cache_hits: u64,
    pub geocode_cache_misses: u64,
    pub ws_publish_failures_total: u64,
    pub ws_tickets_issued: u64,
    pub ws_tickets_redeemed: u64,
    pub store_write_failures_total: u64,
}
