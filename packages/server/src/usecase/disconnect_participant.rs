//! UseCase: 切断処理
//!
//! トランスポートが切断された接続の後始末。`leave-room` と同じ退出処理に
//! 合流し、さらに送信キューを登録解除します。何度呼ばれても後始末は 1 回だけ。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionSession, Departure, MessagePusher, RoomRepository};

/// 切断のユースケース
pub struct DisconnectParticipantUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 参加中の Room から退出し、送信キューを登録解除してセッションを閉じる
    ///
    /// Room に参加していなかった場合や、2 回目以降の呼び出しでは `None`。
    pub async fn execute(&self, session: &mut ConnectionSession) -> Option<Departure> {
        let room_id = session.begin_disconnect()?;

        let departure = match room_id {
            Some(room_id) => {
                self.repository
                    .leave_room(&room_id, session.connection_id())
                    .await
            }
            None => None,
        };

        self.message_pusher
            .unregister_client(session.connection_id())
            .await;
        session.finish_disconnect();
        tracing::info!("Connection '{}' closed", session.connection_id());

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            DisplayName, PeerId, RoomId, SignalingState, Timestamp, entity::tests::participant,
        },
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository,
        },
    };
    use tokio::sync::mpsc;

    fn room_id() -> RoomId {
        RoomId::new("r1".to_string()).unwrap()
    }

    fn joined_session(id: &str, name: &str) -> ConnectionSession {
        let mut session = ConnectionSession::new(ConnectionId::new(id.to_string()).unwrap());
        session.begin_room_request().unwrap();
        session.complete_room_request(
            room_id(),
            PeerId::new(format!("peer-{}", id)).unwrap(),
            DisplayName::new(name.to_string()).unwrap(),
        );
        session
    }

    async fn setup() -> (
        DisconnectParticipantUseCase,
        Arc<InMemoryRoomRepository>,
        Arc<WebSocketMessagePusher>,
    ) {
        let repository = Arc::new(InMemoryRoomRepository::new(10));
        repository
            .create_room(room_id(), participant("c1", "Alice", "p1"), Timestamp::new(1))
            .await
            .unwrap();
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = DisconnectParticipantUseCase::new(repository.clone(), pusher.clone());
        (usecase, repository, pusher)
    }

    #[tokio::test]
    async fn test_disconnect_last_participant_deletes_room() {
        // テスト項目: 最後の参加者が切断すると Room が削除され、送信キューも登録解除される
        // given (前提条件):
        let (usecase, repository, pusher) = setup().await;
        let (tx, _rx) = mpsc::channel(4);
        pusher
            .register_client(ConnectionId::new("c1".to_string()).unwrap(), tx)
            .await;
        let mut alice = joined_session("c1", "Alice");

        // when (操作):
        let departure = usecase.execute(&mut alice).await.unwrap();

        // then (期待する結果):
        assert!(departure.room_deleted);
        assert_eq!(repository.count_rooms().await, 0);
        assert_eq!(pusher.connection_count().await, 0);
        assert_eq!(alice.state(), SignalingState::Closed);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        // テスト項目: 切断処理を 2 回呼んでも 2 回目は何もしない
        // given (前提条件):
        let (usecase, repository, _pusher) = setup().await;
        repository
            .join_room(&room_id(), participant("c2", "Bob", "p2"))
            .await
            .unwrap();
        let mut bob = joined_session("c2", "Bob");
        assert!(usecase.execute(&mut bob).await.is_some());

        // when (操作):
        let second = usecase.execute(&mut bob).await;

        // then (期待する結果):
        assert!(second.is_none());
        let room = repository.get_room(&room_id()).await.unwrap();
        assert_eq!(room.participant_count(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_without_room() {
        // テスト項目: Room に参加していない接続の切断は退出を伴わない
        let (usecase, repository, _pusher) = setup().await;
        let mut session = ConnectionSession::new(ConnectionId::new("c9".to_string()).unwrap());

        let departure = usecase.execute(&mut session).await;

        assert!(departure.is_none());
        assert_eq!(session.state(), SignalingState::Closed);
        assert_eq!(repository.count_rooms().await, 1);
    }
}
