//! Transcription WebSocket frame DTOs.

use serde::{Deserialize, Serialize};

/// Frames sent to the transcription client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TranscriptFrame {
    #[serde(rename_all = "camelCase")]
    Transcript {
        text: String,
        is_final: bool,
        timestamp: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    Error {
        code: String,
        message: String,
    },
}

impl TranscriptFrame {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Text commands accepted from the transcription client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TranscriptControl {
    /// Stop forwarding audio and close the provider stream
    Stop,
    #[serde(other)]
    Unknown,
}

/// Query parameters of `GET /transcript`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptQuery {
    pub room_id: Option<String>,
    pub user_id: Option<String>,
}
