//! UseCase: Room 情報の取得

use std::sync::Arc;

use crate::domain::{Room, RoomId, RoomRepository};

use super::error::GetRoomInfoError;

/// Room 情報取得のユースケース（`get-room-info` と `GET /api/rooms/{room_id}`）
pub struct GetRoomInfoUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomInfoUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// Room のスナップショットを取得
    pub async fn execute(&self, room_id: &RoomId) -> Result<Room, GetRoomInfoError> {
        self.repository
            .get_room(room_id)
            .await
            .ok_or_else(|| GetRoomInfoError::RoomNotFound(room_id.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Timestamp, entity::tests::participant},
        infrastructure::repository::InMemoryRoomRepository,
    };

    #[tokio::test]
    async fn test_get_room_info() {
        // テスト項目: 存在する Room のスナップショットを取得できる
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new(10));
        let room_id = RoomId::new("r1".to_string()).unwrap();
        repository
            .create_room(room_id.clone(), participant("c1", "Alice", "p1"), Timestamp::new(7))
            .await
            .unwrap();
        let usecase = GetRoomInfoUseCase::new(repository);

        // when (操作):
        let room = usecase.execute(&room_id).await.unwrap();

        // then (期待する結果):
        assert_eq!(room.participant_count(), 1);
        assert_eq!(room.max_participants, 10);
        assert_eq!(room.created_at, Timestamp::new(7));
    }

    #[tokio::test]
    async fn test_get_room_info_not_found() {
        // テスト項目: 存在しない Room は RoomNotFound
        let usecase = GetRoomInfoUseCase::new(Arc::new(InMemoryRoomRepository::new(10)));
        let result = usecase
            .execute(&RoomId::new("missing".to_string()).unwrap())
            .await;
        assert_eq!(
            result,
            Err(GetRoomInfoError::RoomNotFound("missing".to_string()))
        );
    }
}
