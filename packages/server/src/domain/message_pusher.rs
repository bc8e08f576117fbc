//! MessagePusher trait 定義
//!
//! クライアントへのメッセージ送信（通知）の抽象化。
//! UseCase 層は送信手段（WebSocket など）を知らずに通知できます。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError};

/// Outbound queue of a single connection (bounded)
pub type PusherChannel = mpsc::Sender<String>;

/// MessagePusher trait
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信キューを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信キューを登録解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続にメッセージを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にメッセージを送信（一部の失敗は許容し、失敗した接続を返す）
    async fn broadcast(&self, targets: Vec<ConnectionId>, content: &str) -> Vec<ConnectionId>;
}
