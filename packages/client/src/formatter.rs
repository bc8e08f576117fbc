//! Message formatting utilities for client display.

use huddle_server::infrastructure::dto::{
    transcript::TranscriptFrame,
    websocket::{ParticipantInfo, ServerMessage},
};

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a server message
    ///
    /// # Arguments
    ///
    /// * `message` - Decoded server message
    /// * `own_connection_id` - This client's connection id (marked as "me")
    pub fn format_server_message(message: &ServerMessage, own_connection_id: &str) -> String {
        match message {
            ServerMessage::Connected { connection_id } => {
                format!("\nConnected as {}\n", connection_id)
            }
            ServerMessage::RoomCreated { room_id, peer_id } => {
                format!("\n* Room '{}' created (peer {})\n", room_id, peer_id)
            }
            ServerMessage::RoomAlreadyExists { room_id } => {
                format!("\n! Room '{}' already exists\n", room_id)
            }
            ServerMessage::ExistingParticipants { participants } => {
                Self::format_participants(participants, own_connection_id)
            }
            ServerMessage::ParticipantJoined {
                connection_id,
                name,
                peer_id,
            } => format!("\n+ {} joined ({}, peer {})\n", name, connection_id, peer_id),
            ServerMessage::RoomNotFound { room_id } => {
                format!("\n! Room '{}' not found\n", room_id)
            }
            ServerMessage::RoomFull {
                room_id,
                max_participants,
            } => format!(
                "\n! Room '{}' is full ({} participants max)\n",
                room_id, max_participants
            ),
            ServerMessage::Signal { signal, from } => {
                format!("\n<< signal from {}: {}\n", from, signal)
            }
            ServerMessage::ParticipantLeft {
                connection_id,
                name,
            } => format!("\n- {} left ({})\n", name, connection_id),
            ServerMessage::RoomInfo {
                id,
                participant_count,
                max_participants,
                created_at,
            } => format!(
                "\nRoom '{}': {}/{} participants, created at {}\n",
                id, participant_count, max_participants, created_at
            ),
            ServerMessage::AlreadyInRoom { room_id } => {
                format!("\n! Already in room '{}' (leave it first)\n", room_id)
            }
            ServerMessage::PeerUnavailable { to } => {
                format!("\n! Connection '{}' is not available\n", to)
            }
            ServerMessage::SignalDropped { to } => {
                format!("\n! Signal to '{}' was dropped (peer is busy), retry\n", to)
            }
            ServerMessage::InvalidRequest { reason } => {
                format!("\n! Invalid request: {}\n", reason)
            }
            ServerMessage::UnknownMessageType => {
                "\n! Server did not understand the message\n".to_string()
            }
        }
    }

    fn format_participants(participants: &[ParticipantInfo], own_connection_id: &str) -> String {
        let mut output = format!("\n\n{}\nParticipants:\n", RULE);

        if participants.is_empty() {
            output.push_str("(No other participants)\n");
        } else {
            for participant in participants {
                let me_suffix = if participant.connection_id == own_connection_id {
                    " (me)"
                } else {
                    ""
                };
                output.push_str(&format!(
                    "{}{} - {} (peer {})\n",
                    participant.name, me_suffix, participant.connection_id, participant.peer_id
                ));
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format a transcription frame
    pub fn format_transcript(frame: &TranscriptFrame) -> String {
        match frame {
            TranscriptFrame::Transcript {
                text,
                is_final,
                speaker,
                ..
            } => {
                let marker = if *is_final { "final" } else { "partial" };
                match speaker {
                    Some(speaker) => format!("[{}] {}: {}", marker, speaker, text),
                    None => format!("[{}] {}", marker, text),
                }
            }
            TranscriptFrame::Error { code, message } => format!("[error {}] {}", code, message),
        }
    }

    /// Format a message that could not be decoded
    pub fn format_raw_message(text: &str) -> String {
        format!("\n? {}\n", text)
    }
}
