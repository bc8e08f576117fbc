//! UseCase: 空の Room の定期削除
//!
//! Room は最後の参加者が退出した時点で削除されるため、通常この処理で
//! 削除される Room はありません。`--auto-delete-empty-rooms` を指定した場合に定期実行されます。

use std::sync::Arc;

use crate::domain::RoomRepository;

pub struct CleanupEmptyRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl CleanupEmptyRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 空の Room を削除し、削除した数を返す
    pub async fn execute(&self) -> usize {
        let removed = self.repository.remove_empty_rooms().await;
        if removed > 0 {
            tracing::info!("Cleaned up {} empty rooms", removed);
        } else {
            tracing::debug!("Room cleanup found no empty rooms");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionId, RoomId, Timestamp, entity::tests::participant},
        infrastructure::repository::InMemoryRoomRepository,
    };

    #[tokio::test]
    async fn test_cleanup_keeps_occupied_rooms() {
        // テスト項目: 参加者のいる Room は削除されない
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new(10));
        let room_id = RoomId::new("r1".to_string()).unwrap();
        repository
            .create_room(room_id.clone(), participant("c1", "Alice", "p1"), Timestamp::new(1))
            .await
            .unwrap();
        let usecase = CleanupEmptyRoomsUseCase::new(repository.clone());

        // when (操作):
        let removed = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(removed, 0);
        assert_eq!(repository.count_rooms().await, 1);

        // 退出後は Room 自体が即座に削除されているため、掃除対象もない
        repository
            .leave_room(&room_id, &ConnectionId::new("c1".to_string()).unwrap())
            .await
            .unwrap();
        assert_eq!(usecase.execute().await, 0);
        assert_eq!(repository.count_rooms().await, 0);
    }
}
