//! C6 — Ticket store: short-lived single-use tickets for socket auth
//! (spec.md §3.10, §4.13, §6.4).

pub mod memory;
pub mod redis_store;

use crate::model::Ticket;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicketStoreError {
    #[error("ticket not ready")]
    NotReady,
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn issue(&self, ticket: Ticket) -> Result<(), TicketStoreError>;

    /// Atomically deletes-then-returns the ticket (spec.md §3.10: "Single-use;
    /// redemption atomically deletes the record"). A second redemption with
    /// the same id returns `Ok(None)`.
    async fn redeem(&self, ticket_id: &str) -> Result<Option<Ticket>, TicketStoreError>;

    async fn ping(&self) -> Result<(), TicketStoreError>;
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    pub async fn assert_single_use_redemption(store: &dyn TicketStore, ticket: Ticket) {
        let id = ticket.ticket_id.clone();
        store.issue(ticket).await.unwrap();
        let first = store.redeem(&id).await.unwrap();
        assert!(first.is_some());
        let second = store.redeem(&id).await.unwrap();
        assert!(second.is_none());
    }
}
