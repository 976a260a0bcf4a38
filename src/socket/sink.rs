//! Adapts the axum websocket write-half to [`SocketSink`] so the
//! subscription registry can fan out without knowing about axum at all.

use crate::pubsub::registry::{SendError, SocketSink};
use crate::pubsub::PushEvent;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::sync::Mutex;

pub struct WsSink {
    write: Mutex<SplitSink<WebSocket, Message>>,
}

impl WsSink {
    pub fn new(write: SplitSink<WebSocket, Message>) -> Self {
        Self { write: Mutex::new(write) }
    }

    pub async fn send_raw(&self, text: &str) -> Result<(), SendError> {
        self.write
            .lock()
            .await
            .send(Message::Text(text.to_string()))
            .await
            .map_err(|e| SendError(e.to_string()))
    }
}

#[async_trait]
impl SocketSink for WsSink {
    async fn send(&self, event: &PushEvent) -> Result<(), SendError> {
        let text = serde_json::to_string(event).map_err(|e| SendError(e.to_string()))?;
        self.send_raw(&text).await
    }
}
