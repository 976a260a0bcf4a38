//! In-memory ticket store. `DashMap::remove` is the atomic delete-and-return
//! primitive that gives redemption its single-use guarantee.

use super::{TicketStore, TicketStoreError};
use crate::clock::SharedClock;
use crate::model::Ticket;
use async_trait::async_trait;
use dashmap::DashMap;

pub struct MemoryTicketStore {
    tickets: DashMap<String, Ticket>,
    clock: SharedClock,
}

impl MemoryTicketStore {
    pub fn new(clock: SharedClock) -> Self {
        Self { tickets: DashMap::new(), clock }
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn issue(&self, ticket: Ticket) -> Result<(), TicketStoreError> {
        self.tickets.insert(ticket.ticket_id.clone(), ticket);
        Ok(())
    }

    async fn redeem(&self, ticket_id: &str) -> Result<Option<Ticket>, TicketStoreError> {
        let now = self.clock.now_ms();
        match self.tickets.remove(ticket_id) {
            Some((_, ticket)) if !ticket.is_expired(now) => Ok(Some(ticket)),
            _ => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), TicketStoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::ticket_store::test_support;
    use std::sync::Arc;

    #[tokio::test]
    async fn redemption_is_single_use() {
        let clock: Arc<dyn crate::clock::Clock> = Arc::new(FakeClock::new(0));
        let store = MemoryTicketStore::new(clock);
        let ticket = Ticket { ticket_id: "t1".into(), session_hash: "s1".into(), expires_at_ms: 60_000 };
        test_support::assert_single_use_redemption(&store, ticket).await;
    }

    #[tokio::test]
    async fn expired_ticket_cannot_be_redeemed() {
        let clock = Arc::new(FakeClock::new(100_000));
        let shared: Arc<dyn crate::clock::Clock> = clock.clone();
        let store = MemoryTicketStore::new(shared);
        let ticket = Ticket { ticket_id: "t2".into(), session_hash: "s1".into(), expires_at_ms: 50_000 };
        store.issue(ticket).await.unwrap();
        assert!(store.redeem("t2").await.unwrap().is_none());
    }
}
