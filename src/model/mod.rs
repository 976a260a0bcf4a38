//! §3 data model.

pub mod fingerprint;
pub mod intent;
pub mod job;
pub mod language;
pub mod place;
pub mod request;
pub mod result;
pub mod route;
pub mod subscription;
pub mod ticket;

pub use fingerprint::IdempotencyFingerprint;
pub use intent::IntentDecision;
pub use job::{JobRecord, JobStatus};
pub use language::LanguageContext;
pub use place::Place;
pub use request::SearchRequest;
pub use result::{AssistantKind, AssistantMessage, ResultMeta, SearchResult};
pub use route::{CuisineStrictness, ProviderMethod, RouteMapping, TypeHint};
pub use subscription::{Subscription, SubscriptionState};
pub use ticket::Ticket;
