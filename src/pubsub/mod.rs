//! C7/C8 — Subscription registry, push publisher, and backlog drainer
//! (spec.md §4.10, §4.11). Cyclic references (socket ↔ registry ↔ publisher)
//! are modeled through identifiers only (`sessionHash`, `requestId`,
//! `socketHandle`), never bidirectional object pointers (spec.md §9).

pub mod backlog;
pub mod event;
pub mod registry;

pub use backlog::{Backlog, BacklogEvent};
pub use event::{PushEvent, PushEventBody};
pub use registry::{PublishSummary, SubscriptionRegistry};
