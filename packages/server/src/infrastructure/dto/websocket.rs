//! Signaling WebSocket message DTOs.
//!
//! Every message is a JSON object tagged by `"type"` (kebab-case) with
//! camelCase fields. Unknown `type` values decode to
//! [`ClientMessage::Unknown`] instead of failing.

use serde::{Deserialize, Serialize};

/// Messages sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// `roomId` may be omitted; the server then generates one
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
        name: String,
        peer_id: String,
    },
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        name: String,
        peer_id: String,
    },
    /// Opaque relay; `signal` is never inspected
    Signal {
        to: String,
        signal: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: String },
    #[serde(rename_all = "camelCase")]
    GetRoomInfo { room_id: String },
    #[serde(other)]
    Unknown,
}

/// Participant entry of `existing-participants`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub connection_id: String,
    pub name: String,
    pub peer_id: String,
}

/// Messages sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Connected { connection_id: String },
    #[serde(rename_all = "camelCase")]
    RoomCreated { room_id: String, peer_id: String },
    #[serde(rename_all = "camelCase")]
    RoomAlreadyExists { room_id: String },
    ExistingParticipants { participants: Vec<ParticipantInfo> },
    #[serde(rename_all = "camelCase")]
    ParticipantJoined {
        connection_id: String,
        name: String,
        peer_id: String,
    },
    #[serde(rename_all = "camelCase")]
    RoomNotFound { room_id: String },
    #[serde(rename_all = "camelCase")]
    RoomFull {
        room_id: String,
        max_participants: usize,
    },
    Signal {
        signal: serde_json::Value,
        from: String,
    },
    #[serde(rename_all = "camelCase")]
    ParticipantLeft { connection_id: String, name: String },
    #[serde(rename_all = "camelCase")]
    RoomInfo {
        id: String,
        participant_count: usize,
        max_participants: usize,
        created_at: String,
    },
    #[serde(rename_all = "camelCase")]
    AlreadyInRoom { room_id: String },
    PeerUnavailable { to: String },
    /// The target's outbound queue was full; the signal was not delivered
    SignalDropped { to: String },
    InvalidRequest { reason: String },
    UnknownMessageType,
}

impl ServerMessage {
    /// Serialize to the JSON text sent over the wire
    pub fn to_json(&self) -> String {
        // Serializing these variants cannot fail: every field is a string,
        // number or an already-parsed JSON value.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_create_room() {
        // テスト項目: create-room が camelCase のフィールドでデコードされる
        // given (前提条件):
        let text = r#"{"type":"create-room","roomId":"r1","name":"Alice","peerId":"p1"}"#;

        // when (操作):
        let msg: ClientMessage = serde_json::from_str(text).unwrap();

        // then (期待する結果):
        assert_eq!(
            msg,
            ClientMessage::CreateRoom {
                room_id: Some("r1".to_string()),
                name: "Alice".to_string(),
                peer_id: "p1".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_create_room_without_room_id() {
        // テスト項目: roomId を省略した create-room もデコードできる
        let text = r#"{"type":"create-room","name":"Alice","peerId":"p1"}"#;
        let msg: ClientMessage = serde_json::from_str(text).unwrap();
        assert!(matches!(msg, ClientMessage::CreateRoom { room_id: None, .. }));
    }

    #[test]
    fn test_decode_signal_keeps_payload_opaque() {
        // テスト項目: signal のペイロードはそのまま保持される
        // given (前提条件):
        let text =
            r#"{"type":"signal","to":"c2","from":"p1","signal":{"sdp":"v=0","nested":[1,2]}}"#;

        // when (操作):
        let msg: ClientMessage = serde_json::from_str(text).unwrap();

        // then (期待する結果):
        assert_eq!(
            msg,
            ClientMessage::Signal {
                to: "c2".to_string(),
                signal: json!({"sdp": "v=0", "nested": [1, 2]}),
                from: Some("p1".to_string()),
            }
        );
    }

    #[test]
    fn test_decode_unknown_type() {
        // テスト項目: 未知の type は Unknown としてデコードされる
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"dance","x":1}"#).unwrap();
        assert_eq!(msg, ClientMessage::Unknown);
    }

    #[test]
    fn test_decode_missing_field_fails() {
        // テスト項目: 必須フィールドが欠けている場合はデコードエラー
        let result =
            serde_json::from_str::<ClientMessage>(r#"{"type":"join-room","roomId":"r1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_encode_server_messages() {
        // テスト項目: サーバーメッセージが type 付きの camelCase JSON になる
        // given (前提条件):
        let created = ServerMessage::RoomCreated {
            room_id: "r1".to_string(),
            peer_id: "p1".to_string(),
        };
        let full = ServerMessage::RoomFull {
            room_id: "r1".to_string(),
            max_participants: 10,
        };
        let left = ServerMessage::ParticipantLeft {
            connection_id: "c1".to_string(),
            name: "Alice".to_string(),
        };

        // when (操作):
        let created: serde_json::Value = serde_json::from_str(&created.to_json()).unwrap();
        let full: serde_json::Value = serde_json::from_str(&full.to_json()).unwrap();
        let left: serde_json::Value = serde_json::from_str(&left.to_json()).unwrap();

        // then (期待する結果):
        assert_eq!(
            created,
            json!({"type": "room-created", "roomId": "r1", "peerId": "p1"})
        );
        assert_eq!(
            full,
            json!({"type": "room-full", "roomId": "r1", "maxParticipants": 10})
        );
        assert_eq!(
            left,
            json!({"type": "participant-left", "connectionId": "c1", "name": "Alice"})
        );
    }

    #[test]
    fn test_encode_signal_dropped() {
        // テスト項目: 配送できなかった signal の通知は宛先を含む
        let dropped = ServerMessage::SignalDropped {
            to: "c2".to_string(),
        };
        assert_eq!(dropped.to_json(), r#"{"type":"signal-dropped","to":"c2"}"#);
    }

    #[test]
    fn test_encode_unit_variant() {
        // テスト項目: フィールドのないメッセージは type のみになる
        assert_eq!(
            ServerMessage::UnknownMessageType.to_json(),
            r#"{"type":"unknown-message-type"}"#
        );
    }
}
