//! UseCase 層のエラー定義

use std::time::Duration;

use thiserror::Error;

use crate::domain::{RepositoryError, SessionError, SttError};

/// Room 作成のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateRoomError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("room '{0}' already exists")]
    RoomAlreadyExists(String),

    #[error("registry error: {0}")]
    Repository(RepositoryError),
}

/// Room 参加のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("room '{room_id}' is full (max {max_participants} participants)")]
    RoomFull {
        room_id: String,
        max_participants: usize,
    },

    #[error("registry error: {0}")]
    Repository(RepositoryError),
}

/// signal 中継のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelaySignalError {
    #[error("peer '{0}' is not connected")]
    PeerUnavailable(String),

    #[error("outbound queue of peer '{0}' is full; signal dropped")]
    Dropped(String),
}

/// Room 情報取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomInfoError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
}

/// 文字起こしセッションのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptionError {
    #[error("transcription service is not configured")]
    NotConfigured,

    #[error("transcription service did not become ready within {0:?}")]
    InitTimeout(Duration),

    #[error("failed to initialize transcription service: {0}")]
    InitFailed(SttError),

    #[error("transcription service error: {0}")]
    Provider(String),

    #[error("transcription service cannot keep up; {0} consecutive audio frames dropped")]
    Backpressure(usize),
}

impl TranscriptionError {
    /// Machine-readable code sent in `error` frames
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "stt-not-configured",
            Self::InitTimeout(_) => "stt-init-timeout",
            Self::InitFailed(_) => "stt-init-failed",
            Self::Provider(_) => "stt-provider-error",
            Self::Backpressure(_) => "stt-backpressure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_error_codes_are_distinct() {
        // テスト項目: 文字起こしエラーはそれぞれ異なるコードを持つ
        // given (前提条件):
        let errors = [
            TranscriptionError::NotConfigured,
            TranscriptionError::InitTimeout(Duration::from_secs(10)),
            TranscriptionError::InitFailed(SttError::ConnectionFailed("x".to_string())),
            TranscriptionError::Provider("x".to_string()),
            TranscriptionError::Backpressure(51),
        ];

        // when (操作):
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();

        // then (期待する結果):
        assert_eq!(codes.len(), errors.len());
    }
}
