//! UseCase: Room 参加
//!
//! ### どのような状況を想定しているか
//! - 正常系：既存 Room への参加（参加直前の参加者一覧を返す）
//! - 異常系：存在しない Room、定員超過
//! - 参加通知は参加直前のスナップショットに含まれる参加者にのみ送る

use std::sync::Arc;

use huddle_shared::time::Clock;

use crate::domain::{
    ConnectionId, ConnectionSession, DisplayName, MessagePusher, Participant, PeerId,
    RepositoryError, RoomId, RoomRepository, Timestamp,
};

use super::error::JoinRoomError;

/// Room 参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    /// Room に参加し、参加直前の参加者一覧（本人を除く、参加順）を返す
    pub async fn execute(
        &self,
        session: &mut ConnectionSession,
        room_id: RoomId,
        display_name: DisplayName,
        peer_id: PeerId,
    ) -> Result<Vec<Participant>, JoinRoomError> {
        session.begin_room_request()?;

        let participant = Participant::new(
            session.connection_id().clone(),
            display_name.clone(),
            peer_id.clone(),
            Timestamp::new(self.clock.now_millis()),
        );

        match self.repository.join_room(&room_id, participant).await {
            Ok(existing) => {
                session.complete_room_request(room_id, peer_id, display_name);
                Ok(existing)
            }
            Err(e) => {
                session.abort_room_request();
                tracing::info!(
                    "'{}' could not join room '{}': {}",
                    session.connection_id(),
                    room_id,
                    e
                );
                Err(match e {
                    RepositoryError::RoomNotFound(id) => JoinRoomError::RoomNotFound(id),
                    RepositoryError::RoomFull {
                        room_id,
                        max_participants,
                    } => JoinRoomError::RoomFull {
                        room_id,
                        max_participants,
                    },
                    other => JoinRoomError::Repository(other),
                })
            }
        }
    }

    /// 参加通知を既存の参加者にブロードキャストし、届けられなかった接続を返す
    pub async fn broadcast_participant_joined(
        &self,
        targets: Vec<ConnectionId>,
        message: &str,
    ) -> Vec<ConnectionId> {
        self.message_pusher.broadcast(targets, message).await
    }
}
