//! Per-(channel, requestId) ring buffer of published events (spec.md §4.10:
//! "a bounded backlog buffer (ring, capacity ≥ 256 events per request)").

use super::event::PushEvent;
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct BacklogEvent {
    pub cursor: u64,
    pub event: PushEvent,
}

/// Monotonic cursor + bounded ring. Oldest events are dropped once capacity
/// is exceeded; subscribers that fall that far behind rely on the terminal
/// event still being retained (terminal events are never coalesced away and
/// backlog is kept at that size floor until job TTL, spec.md §4.10).
#[derive(Debug)]
pub struct Backlog {
    capacity: usize,
    events: VecDeque<BacklogEvent>,
    next_cursor: u64,
    closed: bool,
}

impl Backlog {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, events: VecDeque::with_capacity(capacity), next_cursor: 0, closed: false }
    }

    /// Appends the event, assigning it the next cursor; returns that cursor.
    pub fn push(&mut self, event: PushEvent) -> u64 {
        let cursor = self.next_cursor;
        self.next_cursor += 1;
        let is_terminal = event.is_terminal();
        self.events.push_back(BacklogEvent { cursor, event });
        if self.events.len() > self.capacity {
            self.events.pop_front();
        }
        if is_terminal {
            self.closed = true;
        }
        cursor
    }

    /// Events with `cursor > after`, in publish order (spec.md §4.10 drain).
    pub fn since(&self, after: u64) -> Vec<BacklogEvent> {
        self.events.iter().filter(|e| e.cursor > after).cloned().collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn latest_cursor(&self) -> u64 {
        self.next_cursor.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::event::PushEventBody;

    fn progress_event(stage: &str, progress: u8) -> PushEvent {
        PushEvent::new("search", "req-1", PushEventBody::Progress { progress, stage: stage.into() })
    }

    #[test]
    fn since_returns_only_events_after_cursor_in_order() {
        let mut backlog = Backlog::new(DEFAULT_CAPACITY);
        backlog.push(progress_event("gate", 25));
        let mid_cursor = backlog.push(progress_event("intent", 40));
        backlog.push(progress_event("provider", 60));

        let drained = backlog.since(mid_cursor);
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].cursor, mid_cursor + 1);
    }

    #[test]
    fn ring_drops_oldest_beyond_capacity() {
        let mut backlog = Backlog::new(2);
        backlog.push(progress_event("a", 10));
        backlog.push(progress_event("b", 20));
        backlog.push(progress_event("c", 30));
        let all = backlog.since(0);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn terminal_event_closes_backlog() {
        let mut backlog = Backlog::new(DEFAULT_CAPACITY);
        assert!(!backlog.is_closed());
        backlog.push(PushEvent::new("search", "req-1", PushEventBody::Done {
            result: crate::model::result::SearchResult {
                places: vec![],
                assistant: crate::model::result::AssistantMessage {
                    kind: crate::model::result::AssistantKind::Summary,
                    text: "done".into(),
                    blocks_search: false,
                },
                meta: crate::model::result::ResultMeta {
                    fetched_count: 0,
                    returned_count: 0,
                    ranking_profile: "GOOGLE".into(),
                    distance_origin: crate::model::result::DistanceOrigin::None,
                    distance_ref: None,
                    contracts_version: crate::model::result::CONTRACTS_VERSION.into(),
                },
            },
        }));
        assert!(backlog.is_closed());
    }
}
