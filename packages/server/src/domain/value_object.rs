//! Value Object 定義
//!
//! 外部入力（クライアントから送られてくる文字列）を検証し、
//! ドメイン層では常に妥当な値だけを扱えるようにします。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of a room identifier (in characters)
pub const MAX_ROOM_ID_LENGTH: usize = 64;
/// Maximum length of a peer identifier (in characters)
pub const MAX_PEER_ID_LENGTH: usize = 128;
/// Maximum length of a display name (in characters)
pub const MAX_DISPLAY_NAME_LENGTH: usize = 64;

/// Room identifier
///
/// Opaque and case-sensitive. Surrounding whitespace is rejected rather than
/// trimmed so that `"r1"` and `" r1"` never silently alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("roomId"));
        }
        if value.trim() != value {
            return Err(ValueObjectError::Invalid {
                field: "roomId",
                reason: "must not contain leading or trailing whitespace",
            });
        }
        if value.chars().count() > MAX_ROOM_ID_LENGTH {
            return Err(ValueObjectError::TooLong {
                field: "roomId",
                max: MAX_ROOM_ID_LENGTH,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates room identifiers for rooms whose creator did not choose one.
pub struct RoomIdFactory;

impl RoomIdFactory {
    pub fn generate() -> RoomId {
        // UUID v4 simple form is 32 hex chars, always within MAX_ROOM_ID_LENGTH
        RoomId(Uuid::new_v4().simple().to_string())
    }
}

/// Transport connection identifier, assigned by the server per connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Allocate a fresh identifier for a newly accepted connection
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an identifier received from a client (e.g. a `signal` target)
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("connectionId"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier used by the external media-negotiation layer.
///
/// Not checked for uniqueness; the server only stores and forwards it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("peerId"));
        }
        if value.chars().count() > MAX_PEER_ID_LENGTH {
            return Err(ValueObjectError::TooLong {
                field: "peerId",
                max: MAX_PEER_ID_LENGTH,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for PeerId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Participant display name (trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::Empty("name"));
        }
        if trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
            return Err(ValueObjectError::TooLong {
                field: "name",
                max: MAX_DISPLAY_NAME_LENGTH,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_accepts_case_sensitive_values() {
        // テスト項目: RoomId は大文字・小文字を区別する
        // given (前提条件):
        let lower = RoomId::new("room".to_string()).unwrap();

        // when (操作):
        let upper = RoomId::new("ROOM".to_string()).unwrap();

        // then (期待する結果):
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_room_id_rejects_empty_and_padded_values() {
        // テスト項目: 空文字列・前後に空白を含む RoomId は拒否される
        // given (前提条件):
        let inputs = ["", "   ", " r1", "r1 "];

        for input in inputs {
            // when (操作):
            let result = RoomId::new(input.to_string());

            // then (期待する結果):
            assert!(result.is_err(), "'{}' should be rejected", input);
        }
    }

    #[test]
    fn test_room_id_rejects_too_long_value() {
        // テスト項目: 最大長を超える RoomId は拒否される
        // given (前提条件):
        let input = "a".repeat(MAX_ROOM_ID_LENGTH + 1);

        // when (操作):
        let result = RoomId::new(input);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::TooLong {
                field: "roomId",
                max: MAX_ROOM_ID_LENGTH
            })
        );
    }

    #[test]
    fn test_room_id_factory_generates_unique_valid_ids() {
        // テスト項目: RoomIdFactory が一意かつ妥当な RoomId を生成する
        // given (前提条件):

        // when (操作):
        let a = RoomIdFactory::generate();
        let b = RoomIdFactory::generate();

        // then (期待する結果):
        assert_ne!(a, b);
        assert!(RoomId::new(a.as_str().to_string()).is_ok());
    }

    #[test]
    fn test_peer_id_rejects_empty_value() {
        // テスト項目: 空の PeerId は拒否される
        // given (前提条件):

        // when (操作):
        let result = PeerId::new("".to_string());

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty("peerId")));
    }

    #[test]
    fn test_display_name_is_trimmed() {
        // テスト項目: DisplayName は前後の空白が取り除かれる
        // given (前提条件):

        // when (操作):
        let name = DisplayName::new("  Alice ".to_string()).unwrap();

        // then (期待する結果):
        assert_eq!(name.as_str(), "Alice");
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: 接続ごとに異なる ConnectionId が割り当てられる
        // given (前提条件):

        // when (操作):
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(a, b);
    }
}
