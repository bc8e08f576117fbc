//! UseCase: Room 作成
//!
//! ### どのような状況を想定しているか
//! - 正常系：新しい Room の作成（作成者が最初の参加者）
//! - 異常系：既存の Room ID、既に Room に参加中の接続
//! - エッジケース：Room ID 省略時はサーバーが生成する

use std::sync::Arc;

use huddle_shared::time::Clock;

use crate::domain::{
    ConnectionSession, DisplayName, Participant, PeerId, RepositoryError, Room, RoomId,
    RoomIdFactory, RoomRepository, Timestamp,
};

use super::error::CreateRoomError;

/// Room 作成のユースケース
pub struct CreateRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Room を作成し、セッションを `InRoom` に遷移させる
    ///
    /// 失敗した場合、セッションは `Connected` のまま。
    pub async fn execute(
        &self,
        session: &mut ConnectionSession,
        room_id: Option<RoomId>,
        display_name: DisplayName,
        peer_id: PeerId,
    ) -> Result<Room, CreateRoomError> {
        session.begin_room_request()?;

        let room_id = room_id.unwrap_or_else(RoomIdFactory::generate);
        let now = Timestamp::new(self.clock.now_millis());
        let creator = Participant::new(
            session.connection_id().clone(),
            display_name.clone(),
            peer_id.clone(),
            now,
        );

        match self.repository.create_room(room_id, creator, now).await {
            Ok(room) => {
                session.complete_room_request(room.id.clone(), peer_id, display_name);
                Ok(room)
            }
            Err(RepositoryError::RoomAlreadyExists(id)) => {
                session.abort_room_request();
                tracing::info!(
                    "'{}' tried to create existing room '{}'",
                    session.connection_id(),
                    id
                );
                Err(CreateRoomError::RoomAlreadyExists(id))
            }
            Err(e) => {
                session.abort_room_request();
                Err(CreateRoomError::Repository(e))
            }
        }
    }
}
