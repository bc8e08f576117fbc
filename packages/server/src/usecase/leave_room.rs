//! UseCase: Room 退出（明示的な leave-room）
//!
//! 退出処理は `active` フラグで守られており、同じ接続が 2 回退出しても
//! 2 回目は何もしません（退出通知も重複しない）。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionSession, Departure, MessagePusher, RoomId, RoomRepository,
};

/// Room 退出のユースケース
pub struct LeaveRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl LeaveRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// Room から退出し、セッションを `Connected` に戻す
    ///
    /// 接続が `room_id` の参加者でなければ `None`（no-op）。
    pub async fn execute(
        &self,
        session: &mut ConnectionSession,
        room_id: &RoomId,
    ) -> Option<Departure> {
        let room_id = session.begin_leave(room_id)?;
        let departure = self
            .repository
            .leave_room(&room_id, session.connection_id())
            .await;
        session.finish_leave();
        departure
    }

    /// 退出通知を残りの参加者にブロードキャストし、届けられなかった接続を返す
    pub async fn broadcast_participant_left(
        &self,
        targets: Vec<ConnectionId>,
        message: &str,
    ) -> Vec<ConnectionId> {
        self.message_pusher.broadcast(targets, message).await
    }
}
