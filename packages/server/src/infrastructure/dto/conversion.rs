//! Conversion logic from domain entities to DTOs.

use huddle_shared::time::timestamp_to_rfc3339;

use crate::domain::{Participant, Room, TranscriptRecord, TranscriptionContext};
use crate::infrastructure::dto::{http, transcript::TranscriptFrame, websocket as ws};

impl From<&Participant> for ws::ParticipantInfo {
    fn from(model: &Participant) -> Self {
        Self {
            connection_id: model.connection_id.as_str().to_string(),
            name: model.display_name.as_str().to_string(),
            peer_id: model.peer_id.as_str().to_string(),
        }
    }
}

impl From<&Room> for ws::ServerMessage {
    /// `room-info` snapshot
    fn from(room: &Room) -> Self {
        Self::RoomInfo {
            id: room.id.as_str().to_string(),
            participant_count: room.participant_count(),
            max_participants: room.max_participants,
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Room> for http::RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            participant_count: room.participant_count(),
            max_participants: room.max_participants,
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Room> for http::RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            host: room.host.as_str().to_string(),
            participants: room
                .participants
                .iter()
                .map(|p| http::ParticipantDetailDto {
                    connection_id: p.connection_id.as_str().to_string(),
                    name: p.display_name.as_str().to_string(),
                    peer_id: p.peer_id.as_str().to_string(),
                    joined_at: timestamp_to_rfc3339(p.joined_at.value()),
                })
                .collect(),
            max_participants: room.max_participants,
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

/// Attach the session labels to a provider transcript
pub fn transcript_frame(
    context: &TranscriptionContext,
    record: TranscriptRecord,
) -> TranscriptFrame {
    TranscriptFrame::Transcript {
        text: record.text,
        is_final: record.is_final,
        timestamp: record.timestamp,
        speaker: record.speaker,
        confidence: record.confidence,
        room_id: context.room_id.as_str().to_string(),
        user_id: context.user_id.clone(),
    }
}
