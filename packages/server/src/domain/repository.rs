//! Repository trait 定義
//!
//! ドメイン層が必要とする Room Registry へのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 原子性
//!
//! 実装は各メソッドを他の変更系メソッドに対して原子的に適用しなければなりません。
//! 同じ Room への並行 `join_room` が定員を超えて成功したり、空になった Room の
//! 削除より先に並行 `join_room` が存在チェックを通過したりしてはいけません。

use async_trait::async_trait;

use super::{ConnectionId, Participant, RepositoryError, Room, RoomId, Timestamp};

/// Result of removing a participant from a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// The participant that was removed
    pub participant: Participant,
    /// Connections still in the room (empty when the room was deleted)
    pub remaining: Vec<ConnectionId>,
    /// Whether the room was deleted because it became empty
    pub room_deleted: bool,
}

/// Room Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Room を作成し、作成者を最初の参加者として登録
    async fn create_room(
        &self,
        room_id: RoomId,
        creator: Participant,
        created_at: Timestamp,
    ) -> Result<Room, RepositoryError>;

    /// 既存の Room に参加し、参加直前の参加者一覧（参加者本人を除く）を返す
    async fn join_room(
        &self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<Vec<Participant>, RepositoryError>;

    /// Room から参加者を削除（空になった Room は即座に削除）
    ///
    /// 参加者でなければ `None`（no-op）
    async fn leave_room(&self, room_id: &RoomId, connection_id: &ConnectionId)
    -> Option<Departure>;

    /// 指定した接続以外の参加者の接続 ID を取得
    async fn broadcast_targets(&self, room_id: &RoomId, exclude: &ConnectionId)
    -> Vec<ConnectionId>;

    /// Room のスナップショットを取得
    async fn get_room(&self, room_id: &RoomId) -> Option<Room>;

    /// 全 Room のスナップショットを取得（作成順）
    async fn list_rooms(&self) -> Vec<Room>;

    /// Room 数を取得
    async fn count_rooms(&self) -> usize;

    /// 参加者のいない Room を削除し、削除した数を返す
    async fn remove_empty_rooms(&self) -> usize;

    /// Room あたりの最大参加者数
    fn max_participants(&self) -> usize;
}
