//! ドメイン層のエラー定義

use thiserror::Error;

/// Value Object の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Room エンティティの不変条件違反
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room is full (max {max_participants} participants)")]
    Full { max_participants: usize },

    #[error("connection '{0}' is already a participant")]
    DuplicateParticipant(String),
}

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room '{0}' already exists")]
    RoomAlreadyExists(String),

    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("room '{room_id}' is full (max {max_participants} participants)")]
    RoomFull {
        room_id: String,
        max_participants: usize,
    },

    #[error("connection '{0}' is already in the room")]
    DuplicateParticipant(String),
}

/// MessagePusher のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("outbound queue of client '{0}' is full")]
    Backpressure(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// 接続セッションの状態遷移エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("connection is already in room '{0}'")]
    AlreadyInRoom(String),

    #[error("a room request is already pending")]
    RequestPending,

    #[error("connection is closing")]
    Closed,
}
