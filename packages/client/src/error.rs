//! Error types for the Huddle client.

use std::path::PathBuf;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not reach the server
    #[error("Connection error: {0}")]
    Connection(String),

    /// The connection dropped after it was established
    #[error("Connection lost")]
    ConnectionLost,

    /// The server refused the WebSocket handshake
    #[error("Server rejected the connection with HTTP {0}")]
    Rejected(u16),

    #[error("Failed to read audio file '{path}': {source}")]
    Audio {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error frame sent by the transcription endpoint
    #[error("Transcription error ({code}): {message}")]
    Transcription { code: String, message: String },
}

impl ClientError {
    /// Whether reconnecting can help
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::ConnectionLost => true,
            Self::Rejected(status) => *status >= 500,
            Self::Audio { .. } | Self::Transcription { .. } => false,
        }
    }
}

impl From<tungstenite::Error> for ClientError {
    /// Handshake failures keep their HTTP status
    fn from(error: tungstenite::Error) -> Self {
        match error {
            tungstenite::Error::Http(response) => Self::Rejected(response.status().as_u16()),
            other => Self::Connection(other.to_string()),
        }
    }
}
