//! WebSocket を使った MessagePusher 実装
//!
//! WebSocket の生成と書き込みは UI 層の writer タスクが担当します。
//! この実装は接続ごとの有界キュー（`PusherChannel`）を管理し、
//! キューへの投入だけを行います。キューが満杯の場合は待たずに破棄します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: connection id
    clients: Mutex<HashMap<String, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered connections
    pub async fn connection_count(&self) -> usize {
        self.clients.lock().await.len()
    }
}

fn try_push(
    connection_id: &ConnectionId,
    sender: &PusherChannel,
    content: &str,
) -> Result<(), MessagePushError> {
    sender.try_send(content.to_string()).map_err(|e| match e {
        TrySendError::Full(_) => MessagePushError::Backpressure(connection_id.to_string()),
        TrySendError::Closed(_) => {
            MessagePushError::PushFailed(format!("connection '{}' is closed", connection_id))
        }
    })
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        clients.insert(connection_id.into_string(), sender);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(connection_id.as_str());
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id
        );
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;
        let sender = clients
            .get(connection_id.as_str())
            .ok_or_else(|| MessagePushError::ClientNotFound(connection_id.to_string()))?;
        try_push(connection_id, sender, content)?;
        tracing::debug!("Pushed message to connection '{}'", connection_id);
        Ok(())
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, content: &str) -> Vec<ConnectionId> {
        let clients = self.clients.lock().await;
        let mut failed = Vec::new();

        for target in targets {
            let result = match clients.get(target.as_str()) {
                Some(sender) => try_push(&target, sender, content),
                None => Err(MessagePushError::ClientNotFound(target.to_string())),
            };
            if let Err(e) = result {
                tracing::warn!("Broadcast to '{}' skipped: {}", target, e);
                failed.push(target);
            }
        }

        failed
    }
}
