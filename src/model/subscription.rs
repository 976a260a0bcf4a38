//! §3.9 Subscription.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Job not yet known / ownership not yet verified.
    Pending,
    Active,
}

/// Identifies a subscriber; the actual socket sender handle lives in the
/// registry keyed by `subscriber_id` (spec.md §9: no bidirectional object
/// pointers — model cyclic refs through identifiers only).
#[derive(Debug, Clone)]
pub struct Subscription {
    pub subscriber_id: u64,
    pub channel: String,
    pub request_id: String,
    pub session_hash: String,
    pub state: SubscriptionState,
    /// Last backlog cursor this subscriber has acknowledged/been sent.
    pub last_ack: u64,
}
