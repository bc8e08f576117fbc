//! Console command parsing.

use huddle_server::infrastructure::dto::websocket::ClientMessage;
use serde_json::Value;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  /create [room]           create a room (the server picks an id when omitted)
  /join <room>             join an existing room
  /leave <room>            leave the room
  /info <room>             show room information
  /signal <connId> <json>  relay a raw signaling payload to a connection
  /help                    show this help
  /quit                    exit
";

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create { room_id: Option<String> },
    Join { room_id: String },
    Leave { room_id: String },
    Info { room_id: String },
    Signal { to: String, payload: Value },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("commands start with '/' (type /help)")]
    NotACommand,

    #[error("unknown command '{0}' (type /help)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid signal payload: {0}")]
    InvalidPayload(String),
}

/// Parse one console line
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let Some(body) = line.strip_prefix('/') else {
        return Err(CommandError::NotACommand);
    };

    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };

    match name {
        "create" => Ok(Command::Create {
            room_id: single_arg(rest),
        }),
        "join" => single_arg(rest)
            .map(|room_id| Command::Join { room_id })
            .ok_or(CommandError::Usage("/join <room>")),
        "leave" => single_arg(rest)
            .map(|room_id| Command::Leave { room_id })
            .ok_or(CommandError::Usage("/leave <room>")),
        "info" => single_arg(rest)
            .map(|room_id| Command::Info { room_id })
            .ok_or(CommandError::Usage("/info <room>")),
        "signal" => {
            let Some((to, json)) = rest.split_once(char::is_whitespace) else {
                return Err(CommandError::Usage("/signal <connId> <json>"));
            };
            let payload = serde_json::from_str(json.trim())
                .map_err(|e| CommandError::InvalidPayload(e.to_string()))?;
            Ok(Command::Signal {
                to: to.to_string(),
                payload,
            })
        }
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn single_arg(rest: &str) -> Option<String> {
    rest.split_whitespace().next().map(str::to_string)
}

impl Command {
    /// Wire message for commands that talk to the server
    pub fn to_message(&self, name: &str, peer_id: &str) -> Option<ClientMessage> {
        match self {
            Command::Create { room_id } => Some(ClientMessage::CreateRoom {
                room_id: room_id.clone(),
                name: name.to_string(),
                peer_id: peer_id.to_string(),
            }),
            Command::Join { room_id } => Some(ClientMessage::JoinRoom {
                room_id: room_id.clone(),
                name: name.to_string(),
                peer_id: peer_id.to_string(),
            }),
            Command::Leave { room_id } => Some(ClientMessage::LeaveRoom {
                room_id: room_id.clone(),
            }),
            Command::Info { room_id } => Some(ClientMessage::GetRoomInfo {
                room_id: room_id.clone(),
            }),
            Command::Signal { to, payload } => Some(ClientMessage::Signal {
                to: to.clone(),
                signal: payload.clone(),
                from: None,
            }),
            Command::Help | Command::Quit => None,
        }
    }
}
