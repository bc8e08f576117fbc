//! UseCase: 接続処理
//!
//! シグナリング接続ごとに送信キューを MessagePusher に登録し、
//! 接続セッションを作成します。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionSession, MessagePusher, PusherChannel};

/// 接続のユースケース
pub struct ConnectParticipantUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectParticipantUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 送信キューを登録し、`Connected` 状態のセッションを返す
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> ConnectionSession {
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        tracing::info!("Connection '{}' established", connection_id);
        ConnectionSession::new(connection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::SignalingState, infrastructure::message_pusher::WebSocketMessagePusher};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_connect_registers_outbound_queue() {
        // テスト項目: 接続すると送信キューが登録され、Connected 状態のセッションが返される
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = ConnectParticipantUseCase::new(pusher.clone());
        let (tx, mut rx) = mpsc::channel(4);
        let connection_id = ConnectionId::new("c1".to_string()).unwrap();

        // when (操作):
        let session = usecase.execute(connection_id.clone(), tx).await;

        // then (期待する結果):
        assert_eq!(session.state(), SignalingState::Connected);
        assert!(!session.is_active());
        pusher.push_to(&connection_id, "hello").await.unwrap();
        assert_eq!(rx.recv().await, Some("hello".to_string()));
    }
}
