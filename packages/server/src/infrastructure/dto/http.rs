//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub status: String,
    pub active_rooms: usize,
    pub max_participants: usize,
    pub transcription: bool,
    pub timestamp: String,
}

/// `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfoDto {
    pub message: String,
    pub version: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub participant_count: usize,
    pub max_participants: usize,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDetailDto {
    pub connection_id: String,
    pub name: String,
    pub peer_id: String,
    pub joined_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    pub host: String,
    pub participants: Vec<ParticipantDetailDto>,
    pub max_participants: usize,
    pub created_at: String,
}
