//! Subscription registry + publisher + drainer (spec.md §4.10, §4.11).
//!
//! Keyed by `(channel, requestId)`. Mutates under a per-entry lock; fan-out
//! to sockets happens without holding the lock (copy-then-send, spec.md §5).
//! Cyclic references are avoided: subscribers are identified by
//! `socketHandle`/`sessionHash` strings, never back-pointers into the socket.

use super::backlog::{Backlog, BacklogEvent, DEFAULT_CAPACITY};
use super::event::{PushEvent, PushEventBody};
use crate::clock::SharedClock;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

const COALESCE_WINDOW_MS: i64 = 100;

#[derive(Debug, thiserror::Error)]
#[error("socket send failed: {0}")]
pub struct SendError(pub String);

/// The registry's only handle onto a live socket: an opaque send sink.
/// Identified by `socket_handle` wherever it must be referenced, never by a
/// pointer back into the socket task (spec.md §9).
#[async_trait]
pub trait SocketSink: Send + Sync {
    async fn send(&self, event: &PushEvent) -> Result<(), SendError>;
}

struct Subscriber {
    socket_handle: String,
    session_hash: String,
    sink: Arc<dyn SocketSink>,
    last_ack: u64,
}

struct Entry {
    subscribers: Vec<Subscriber>,
    backlog: Backlog,
    last_progress_sent_ms: std::collections::HashMap<String, i64>,
    /// Progress events coalesced away mid-window, keyed by stage — holds only
    /// the most recent one, flushed once the window has elapsed (spec.md
    /// §4.10: "most recent per (requestId, stage)", never the first).
    pending_progress: std::collections::HashMap<String, PushEvent>,
}

impl Entry {
    fn new(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            backlog: Backlog::new(capacity),
            last_progress_sent_ms: Default::default(),
            pending_progress: Default::default(),
        }
    }
}

struct PendingSubscriber {
    session_hash: String,
    socket_handle: String,
    sink: Arc<dyn SocketSink>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PublishSummary {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

pub enum SubscribeOutcome {
    /// Job already known; subscriber is ACTIVE and these backlog events were
    /// drained immediately (spec.md §4.10 "drain on ACTIVE transition").
    Active(Vec<BacklogEvent>),
    /// Job not yet registered in the store; stashed until
    /// `activate_pending_subscriptions` runs.
    Pending,
}

pub struct SubscriptionRegistry {
    entries: DashMap<(String, String), Mutex<Entry>>,
    pending: DashMap<String, Mutex<Vec<PendingSubscriber>>>,
    backlog_capacity: usize,
    clock: SharedClock,
}

impl SubscriptionRegistry {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: DashMap::new(),
            pending: DashMap::new(),
            backlog_capacity: DEFAULT_CAPACITY,
            clock,
        }
    }

    /// Subscribe when the job is already known to the caller (existing
    /// JobRecord). Drains the backlog from cursor 0 and registers the
    /// subscriber as ACTIVE.
    pub async fn subscribe_active(
        &self,
        channel: &str,
        request_id: &str,
        session_hash: &str,
        socket_handle: &str,
        sink: Arc<dyn SocketSink>,
    ) -> Vec<BacklogEvent> {
        let key = (channel.to_string(), request_id.to_string());
        let entry_lock = self
            .entries
            .entry(key)
            .or_insert_with(|| Mutex::new(Entry::new(self.backlog_capacity)));
        let mut entry = entry_lock.lock().unwrap();
        entry.subscribers.push(Subscriber {
            socket_handle: socket_handle.to_string(),
            session_hash: session_hash.to_string(),
            sink,
            last_ack: 0,
        });
        entry.backlog.since(0)
    }

    /// Subscribe before the job exists in the store (spec.md §4.10 "pending
    /// subscriptions"). Resolved later by `activate_pending_subscriptions`.
    pub fn subscribe_pending(&self, request_id: &str, session_hash: &str, socket_handle: &str, sink: Arc<dyn SocketSink>) {
        let bucket = self.pending.entry(request_id.to_string()).or_default();
        bucket.lock().unwrap().push(PendingSubscriber {
            session_hash: session_hash.to_string(),
            socket_handle: socket_handle.to_string(),
            sink,
        });
    }

    /// Migrates pending subscribers for `request_id` into ACTIVE, after
    /// ownership verification: `session_hash` must match the job's owner
    /// unless `job_is_anonymous` (spec.md §4.10).
    pub async fn activate_pending_subscriptions(
        &self,
        channel: &str,
        request_id: &str,
        owner_session_hash: Option<&str>,
        job_is_anonymous: bool,
    ) {
        let Some((_, pending_lock)) = self.pending.remove(request_id) else { return };
        let pending = pending_lock.into_inner();

        for p in pending {
            let eligible = job_is_anonymous || owner_session_hash == Some(p.session_hash.as_str());
            if !eligible {
                tracing::warn!(request_id, socket_handle = %p.socket_handle, "pending_subscription_ownership_rejected");
                continue;
            }
            let drained = self
                .subscribe_active(channel, request_id, &p.session_hash, &p.socket_handle, p.sink.clone())
                .await;
            for backlog_event in &drained {
                if p.sink.send(&backlog_event.event).await.is_err() {
                    tracing::warn!(request_id, socket_handle = %p.socket_handle, "ws_publish_error");
                }
            }
        }
    }

    /// `publishToChannel` (spec.md §4.10). Must not throw: every failure path
    /// is absorbed into the returned summary.
    pub async fn publish_to_channel(&self, channel: &str, request_id: &str, body: PushEventBody) -> PublishSummary {
        let key = (channel.to_string(), request_id.to_string());
        let entry_lock = self
            .entries
            .entry(key)
            .or_insert_with(|| Mutex::new(Entry::new(self.backlog_capacity)));
        let mut entry = entry_lock.lock().unwrap();
        let now = self.clock.now_ms();

        let mut to_deliver: Vec<PushEvent> = Vec::new();

        // Flush any stage whose coalescing window has since elapsed without
        // another event arriving — otherwise the most recent value observed
        // for that stage would never reach the backlog or subscribers.
        let due_stages: Vec<String> = entry
            .pending_progress
            .keys()
            .filter(|stage| {
                now.saturating_sub(entry.last_progress_sent_ms.get(stage.as_str()).copied().unwrap_or(i64::MIN))
                    >= COALESCE_WINDOW_MS
            })
            .cloned()
            .collect();
        for stage in due_stages {
            if let Some(event) = entry.pending_progress.remove(&stage) {
                entry.last_progress_sent_ms.insert(stage, now);
                entry.backlog.push(event.clone());
                to_deliver.push(event);
            }
        }

        if let Some(stage) = body.coalesce_stage() {
            let last = entry.last_progress_sent_ms.get(stage).copied().unwrap_or(i64::MIN);
            if now.saturating_sub(last) < COALESCE_WINDOW_MS {
                // Still inside the window: stash as the latest value for this
                // stage, superseding anything stashed earlier, instead of
                // dropping it outright (spec.md §4.10 "most recent per
                // (requestId, stage)"). A later publish call flushes it.
                let event = PushEvent::new(channel, request_id, body);
                entry.pending_progress.insert(stage.to_string(), event);
            } else {
                entry.last_progress_sent_ms.insert(stage.to_string(), now);
                let event = PushEvent::new(channel, request_id, body);
                entry.backlog.push(event.clone());
                to_deliver.push(event);
            }
        } else {
            let event = PushEvent::new(channel, request_id, body);
            entry.backlog.push(event.clone());
            to_deliver.push(event);
        }

        // Copy-then-send: release the lock's hold on subscriber state before
        // the (possibly slow) socket writes (spec.md §5).
        let subscribers: Vec<(String, Arc<dyn SocketSink>)> =
            entry.subscribers.iter().map(|s| (s.socket_handle.clone(), s.sink.clone())).collect();
        drop(entry);

        let attempted = subscribers.len() * to_deliver.len();
        let mut sent = 0usize;
        let mut failed = 0usize;
        for (handle, sink) in &subscribers {
            for event in &to_deliver {
                match sink.send(event).await {
                    Ok(()) => sent += 1,
                    Err(e) => {
                        failed += 1;
                        tracing::warn!(request_id, socket_handle = %handle, error = %e, "ws_publish_error");
                    }
                }
            }
        }

        PublishSummary { attempted, sent, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;

    struct RecordingSink {
        received: std::sync::Mutex<Vec<PushEvent>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self { received: std::sync::Mutex::new(Vec::new()), fail })
        }
    }

    #[async_trait]
    impl SocketSink for RecordingSink {
        async fn send(&self, event: &PushEvent) -> Result<(), SendError> {
            if self.fail {
                return Err(SendError("socket closed".into()));
            }
            self.received.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn registry() -> (SubscriptionRegistry, Arc<FakeClock>) {
        let clock = Arc::new(FakeClock::new(0));
        (SubscriptionRegistry::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn publish_before_subscribe_is_buffered_then_drained() {
        let (reg, _clock) = registry();
        reg.publish_to_channel("search", "req-1", PushEventBody::Status { status: "queued".into() }).await;

        let sink = RecordingSink::new(false);
        let drained = reg.subscribe_active("search", "req-1", "sess-1", "sock-1", sink).await;
        assert_eq!(drained.len(), 1);
    }

    #[tokio::test]
    async fn publish_fans_out_to_active_subscribers() {
        let (reg, _clock) = registry();
        let sink = RecordingSink::new(false);
        reg.subscribe_active("search", "req-1", "sess-1", "sock-1", sink.clone()).await;

        let summary = reg
            .publish_to_channel("search", "req-1", PushEventBody::Status { status: "running".into() })
            .await;
        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.sent, 1);
        assert_eq!(sink.received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn publish_failure_is_absorbed_into_summary_never_panics() {
        let (reg, _clock) = registry();
        let sink = RecordingSink::new(true);
        reg.subscribe_active("search", "req-1", "sess-1", "sock-1", sink).await;

        let summary = reg
            .publish_to_channel("search", "req-1", PushEventBody::Status { status: "running".into() })
            .await;
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.sent, 0);
    }

    #[tokio::test]
    async fn progress_bursts_within_window_are_coalesced() {
        let (reg, clock) = registry();
        let sink = RecordingSink::new(false);
        reg.subscribe_active("search", "req-1", "sess-1", "sock-1", sink.clone()).await;

        for p in [10u8, 20, 30, 40] {
            reg.publish_to_channel("search", "req-1", PushEventBody::Progress { progress: p, stage: "gate".into() })
                .await;
        }
        // All four bursts landed inside one 100ms coalescing window.
        assert_eq!(sink.received.lock().unwrap().len(), 1);

        clock.advance_ms(150);
        reg.publish_to_channel("search", "req-1", PushEventBody::Progress { progress: 50, stage: "gate".into() })
            .await;
        assert_eq!(sink.received.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn coalesced_window_delivers_most_recent_progress_not_first() {
        let (reg, clock) = registry();
        let sink = RecordingSink::new(false);
        reg.subscribe_active("search", "req-1", "sess-1", "sock-1", sink.clone()).await;

        // First event opens the window and is delivered immediately.
        reg.publish_to_channel("search", "req-1", PushEventBody::Progress { progress: 10, stage: "gate".into() })
            .await;
        // These land inside the same window and must be coalesced away...
        for p in [20u8, 30, 40] {
            reg.publish_to_channel("search", "req-1", PushEventBody::Progress { progress: p, stage: "gate".into() })
                .await;
        }

        clock.advance_ms(150);
        // The next publish for the same stage first flushes the stashed
        // latest value (40) — itself landing back inside a fresh window, so
        // only the flushed event is delivered this call.
        reg.publish_to_channel("search", "req-1", PushEventBody::Progress { progress: 99, stage: "gate".into() })
            .await;

        let received = sink.received.lock().unwrap();
        assert_eq!(received.len(), 2);
        match &received[1].body {
            PushEventBody::Progress { progress, stage } => {
                assert_eq!(*progress, 40);
                assert_eq!(stage, "gate");
            }
            other => panic!("expected flushed gate progress, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pending_subscription_activates_only_for_matching_owner() {
        let (reg, _clock) = registry();
        let allowed = RecordingSink::new(false);
        let denied = RecordingSink::new(false);
        reg.subscribe_pending("req-1", "owner-session", "sock-allowed", allowed.clone());
        reg.subscribe_pending("req-1", "other-session", "sock-denied", denied.clone());

        reg.publish_to_channel("search", "req-1", PushEventBody::Status { status: "queued".into() }).await;
        reg.activate_pending_subscriptions("search", "req-1", Some("owner-session"), false).await;

        assert_eq!(allowed.received.lock().unwrap().len(), 1);
        assert_eq!(denied.received.lock().unwrap().len(), 0);
    }
}
