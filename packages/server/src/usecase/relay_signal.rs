//! UseCase: signal の中継
//!
//! ペイロードは解釈せずに宛先の接続へそのまま届けます。
//! 宛先が同じ Room にいるかどうかは確認しません（信頼された中継）。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher};

use super::error::RelaySignalError;

/// signal 中継のユースケース
pub struct RelaySignalUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelaySignalUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// `to` の接続にシリアライズ済みの signal メッセージを届ける
    pub async fn execute(
        &self,
        from: &ConnectionId,
        to: &ConnectionId,
        message: &str,
    ) -> Result<(), RelaySignalError> {
        match self.message_pusher.push_to(to, message).await {
            Ok(()) => {
                tracing::debug!("Relayed signal from '{}' to '{}'", from, to);
                Ok(())
            }
            Err(MessagePushError::Backpressure(_)) => {
                tracing::warn!("Dropped signal from '{}' to '{}': queue full", from, to);
                Err(RelaySignalError::Dropped(to.to_string()))
            }
            Err(MessagePushError::ClientNotFound(_) | MessagePushError::PushFailed(_)) => {
                Err(RelaySignalError::PeerUnavailable(to.to_string()))
            }
        }
    }
}
