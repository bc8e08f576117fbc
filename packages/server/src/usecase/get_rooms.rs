//! UseCase: Room 一覧の取得

use std::sync::Arc;

use crate::domain::{Room, RoomRepository};

/// Room 一覧取得のユースケース
pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 全 Room のスナップショット（作成順）
    pub async fn execute(&self) -> Vec<Room> {
        self.repository.list_rooms().await
    }

    /// 現在の Room 数
    pub async fn count(&self) -> usize {
        self.repository.count_rooms().await
    }

    /// Room あたりの最大参加者数
    pub fn max_participants(&self) -> usize {
        self.repository.max_participants()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{RoomId, Timestamp, entity::tests::participant},
        infrastructure::repository::InMemoryRoomRepository,
    };

    #[tokio::test]
    async fn test_get_rooms() {
        // テスト項目: Room 一覧と Room 数を取得できる
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new(4));
        for (i, id) in ["r1", "r2"].iter().enumerate() {
            repository
                .create_room(
                    RoomId::new(id.to_string()).unwrap(),
                    participant(&format!("c{}", i), "Alice", "p1"),
                    Timestamp::new(i as i64),
                )
                .await
                .unwrap();
        }
        let usecase = GetRoomsUseCase::new(repository);

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].id.as_str(), "r1");
        assert_eq!(usecase.count().await, 2);
        assert_eq!(usecase.max_participants(), 4);
    }
}
