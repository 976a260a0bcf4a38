//! Server→client push event envelope (spec.md §6.2). Every frame carries
//! `requestId`; clients are expected to tolerate unknown event types and be
//! idempotent on `eventId` (at-least-once delivery, spec.md §4.10).

use crate::model::result::{AssistantKind, SearchResult};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEventBody {
    Progress { progress: u8, stage: String },
    Assistant { kind: AssistantKind, text: String, #[serde(rename = "blocksSearch")] blocks_search: bool },
    #[serde(rename = "stream.delta")]
    StreamDelta { text: String },
    #[serde(rename = "stream.done")]
    StreamDone,
    Recommendation { result: SearchResult },
    Status { status: String },
    Error { code: String, message: String },
    Done { result: SearchResult },
}

impl PushEventBody {
    /// Terminal events are never coalesced and close the subscription entry
    /// (spec.md §4.10 termination, §8 "terminal events delivered exactly once").
    pub fn is_terminal(&self) -> bool {
        matches!(self, PushEventBody::Done { .. } | PushEventBody::Error { .. })
    }

    /// Progress events are the only kind the publisher coalesces, keyed by
    /// (requestId, stage) (spec.md §4.10 throttling).
    pub fn coalesce_stage(&self) -> Option<&str> {
        match self {
            PushEventBody::Progress { stage, .. } => Some(stage.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushEvent {
    pub v: u8,
    pub event_id: String,
    pub request_id: String,
    pub channel: String,
    #[serde(flatten)]
    pub body: PushEventBody,
}

impl PushEvent {
    pub fn new(channel: impl Into<String>, request_id: impl Into<String>, body: PushEventBody) -> Self {
        Self {
            v: 1,
            event_id: uuid::Uuid::new_v4().to_string(),
            request_id: request_id.into(),
            channel: channel.into(),
            body,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.body.is_terminal()
    }
}
