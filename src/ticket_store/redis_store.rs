//! Redis-backed ticket store. `GETDEL` gives atomic delete-and-return.

use super::{TicketStore, TicketStoreError};
use crate::clock::SharedClock;
use crate::model::Ticket;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

pub struct RedisTicketStore {
    conn: ConnectionManager,
    clock: SharedClock,
}

fn ticket_key(ticket_id: &str) -> String {
    format!("ticket:{ticket_id}")
}

impl RedisTicketStore {
    pub async fn connect(url: &str, clock: SharedClock) -> Result<Self, TicketStoreError> {
        let client = redis::Client::open(url).map_err(|e| TicketStoreError::Unavailable(e.to_string()))?;
        let conn = client
            .get_tokio_connection_manager()
            .await
            .map_err(|e| TicketStoreError::Unavailable(e.to_string()))?;
        Ok(Self { conn, clock })
    }
}

#[async_trait]
impl TicketStore for RedisTicketStore {
    async fn issue(&self, ticket: Ticket) -> Result<(), TicketStoreError> {
        let mut conn = self.conn.clone();
        // TTL is the ticket's *remaining* lifetime, not its absolute expiry
        // (spec.md §4.13/§6.4: `ticket:{ticketId}` TTL 60s).
        let ttl_secs = ((ticket.expires_at_ms - self.clock.now_ms()).max(0) as u64 / 1000).max(1);
        let raw = serde_json::to_string(&ticket).map_err(|e| TicketStoreError::Unavailable(e.to_string()))?;
        conn.set_ex::<_, _, ()>(ticket_key(&ticket.ticket_id), raw, ttl_secs)
            .await
            .map_err(|e| TicketStoreError::Unavailable(e.to_string()))
    }

    async fn redeem(&self, ticket_id: &str) -> Result<Option<Ticket>, TicketStoreError> {
        let mut conn = self.conn.clone();
        // GETDEL: atomic read + delete, giving single-use redemption.
        let raw: Option<String> = redis::cmd("GETDEL")
            .arg(ticket_key(ticket_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| TicketStoreError::Unavailable(e.to_string()))?;
        match raw {
            Some(s) => {
                let ticket: Ticket =
                    serde_json::from_str(&s).map_err(|e| TicketStoreError::Unavailable(e.to_string()))?;
                // Belt-and-suspenders against clock skew between this process
                // and Redis's own TTL eviction (spec.md §3.10).
                if ticket.is_expired(self.clock.now_ms()) {
                    return Ok(None);
                }
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), TicketStoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| TicketStoreError::Unavailable(e.to_string()))
    }
}
