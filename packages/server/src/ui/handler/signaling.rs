//! Signaling WebSocket handler.
//!
//! 接続ごとに受信ループ（このタスク）と送信タスクを 1 つずつ持ちます。
//! 受信したメッセージはこのタスクの中で 1 つずつ順番に処理されるため、
//! 同じ接続からのリクエストが並行して Room を操作することはありません。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::stream::StreamExt;
use tokio::{sync::mpsc, time::timeout};

use crate::{
    domain::{
        ConnectionId, ConnectionSession, Departure, DisplayName, PeerId, RoomId, SessionError,
        ValueObjectError,
    },
    infrastructure::dto::websocket::{ClientMessage, ParticipantInfo, ServerMessage},
    ui::state::AppState,
    usecase::{CreateRoomError, GetRoomInfoError, JoinRoomError, RelaySignalError},
};

use super::transport::{finish_writer, spawn_writer};

pub async fn signaling_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let transport = state.transport;
    let (sink, mut receiver) = socket.split();

    // このキューは MessagePusher にも登録され、他の接続からの通知も流れてくる
    let (tx, rx) = mpsc::channel::<String>(transport.outbound_buffer);
    let mut writer = spawn_writer(rx, sink, transport, |text| text);

    let connection_id = ConnectionId::generate();
    let mut session = state
        .connect_participant_usecase
        .execute(connection_id.clone(), tx.clone())
        .await;

    reply(
        &tx,
        ServerMessage::Connected {
            connection_id: connection_id.as_str().to_string(),
        },
    )
    .await;

    let mut writer_finished = false;
    loop {
        let frame = tokio::select! {
            _ = &mut writer => {
                writer_finished = true;
                break;
            }
            frame = timeout(transport.ping_timeout, receiver.next()) => frame,
        };

        match frame {
            Err(_) => {
                tracing::info!(
                    "Connection '{}' idle for {:?}; closing",
                    connection_id,
                    transport.ping_timeout
                );
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                tracing::debug!("WebSocket error on '{}': {}", connection_id, e);
                break;
            }
            Ok(Some(Ok(Message::Text(text)))) => {
                tracing::debug!("Received from '{}': {}", connection_id, text.as_str());
                let response = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(message) => dispatch(&state, &mut session, &tx, message).await,
                    Err(e) => Some(ServerMessage::InvalidRequest {
                        reason: e.to_string(),
                    }),
                };
                if let Some(response) = response {
                    reply(&tx, response).await;
                }
            }
            Ok(Some(Ok(Message::Binary(_)))) => {
                reply(
                    &tx,
                    ServerMessage::InvalidRequest {
                        reason: "binary frames are not supported".to_string(),
                    },
                )
                .await;
            }
            Ok(Some(Ok(Message::Close(_)))) => {
                tracing::info!("Connection '{}' requested close", connection_id);
                break;
            }
            // Ping / Pong は受信しただけで生存確認になる
            Ok(Some(Ok(_))) => {}
        }
    }

    if let Some(departure) = state
        .disconnect_participant_usecase
        .execute(&mut session)
        .await
    {
        let message = participant_left(&departure);
        state
            .disconnect_participant_usecase
            .broadcast_participant_left(departure.remaining, &message)
            .await;
    }

    drop(tx);
    if !writer_finished {
        finish_writer(writer, transport.send_timeout).await;
    }
}

/// Handle one decoded client message, returning the reply for the caller
async fn dispatch(
    state: &AppState,
    session: &mut ConnectionSession,
    tx: &mpsc::Sender<String>,
    message: ClientMessage,
) -> Option<ServerMessage> {
    match message {
        ClientMessage::CreateRoom {
            room_id,
            name,
            peer_id,
        } => {
            let room_id = match room_id.filter(|id| !id.trim().is_empty()) {
                Some(id) => match RoomId::new(id) {
                    Ok(id) => Some(id),
                    Err(e) => return Some(invalid_request(e)),
                },
                None => None,
            };
            let (display_name, peer_id) = match identity(name, peer_id) {
                Ok(identity) => identity,
                Err(e) => return Some(invalid_request(e)),
            };

            let created_peer_id = peer_id.as_str().to_string();
            match state
                .create_room_usecase
                .execute(session, room_id, display_name, peer_id)
                .await
            {
                Ok(room) => Some(ServerMessage::RoomCreated {
                    room_id: room.id.into_string(),
                    peer_id: created_peer_id,
                }),
                Err(CreateRoomError::RoomAlreadyExists(room_id)) => {
                    Some(ServerMessage::RoomAlreadyExists { room_id })
                }
                Err(CreateRoomError::Session(e)) => session_rejection(e),
                Err(CreateRoomError::Repository(e)) => {
                    tracing::error!("Unexpected registry error on create-room: {}", e);
                    Some(ServerMessage::InvalidRequest {
                        reason: e.to_string(),
                    })
                }
            }
        }
        ClientMessage::JoinRoom {
            room_id,
            name,
            peer_id,
        } => {
            let room_id = match RoomId::new(room_id) {
                Ok(id) => id,
                Err(e) => return Some(invalid_request(e)),
            };
            let (display_name, peer_id) = match identity(name, peer_id) {
                Ok(identity) => identity,
                Err(e) => return Some(invalid_request(e)),
            };

            let joined = ServerMessage::ParticipantJoined {
                connection_id: session.connection_id().as_str().to_string(),
                name: display_name.as_str().to_string(),
                peer_id: peer_id.as_str().to_string(),
            };

            match state
                .join_room_usecase
                .execute(session, room_id, display_name, peer_id)
                .await
            {
                Ok(existing) => {
                    // 参加者一覧を本人に届けてから、既存の参加者に通知する
                    let snapshot = ServerMessage::ExistingParticipants {
                        participants: existing.iter().map(ParticipantInfo::from).collect(),
                    };
                    reply(tx, snapshot).await;

                    let targets = existing.into_iter().map(|p| p.connection_id).collect();
                    state
                        .join_room_usecase
                        .broadcast_participant_joined(targets, &joined.to_json())
                        .await;
                    None
                }
                Err(JoinRoomError::RoomNotFound(room_id)) => {
                    Some(ServerMessage::RoomNotFound { room_id })
                }
                Err(JoinRoomError::RoomFull {
                    room_id,
                    max_participants,
                }) => Some(ServerMessage::RoomFull {
                    room_id,
                    max_participants,
                }),
                Err(JoinRoomError::Session(e)) => session_rejection(e),
                Err(JoinRoomError::Repository(e)) => {
                    tracing::error!("Unexpected registry error on join-room: {}", e);
                    Some(ServerMessage::InvalidRequest {
                        reason: e.to_string(),
                    })
                }
            }
        }
        ClientMessage::Signal { to, signal, from } => {
            let target = match ConnectionId::new(to) {
                Ok(id) => id,
                Err(e) => return Some(invalid_request(e)),
            };
            let from = from.unwrap_or_else(|| session.connection_id().as_str().to_string());
            let relayed = ServerMessage::Signal { signal, from };

            match state
                .relay_signal_usecase
                .execute(session.connection_id(), &target, &relayed.to_json())
                .await
            {
                Ok(()) => None,
                Err(RelaySignalError::PeerUnavailable(to)) => {
                    Some(ServerMessage::PeerUnavailable { to })
                }
                Err(RelaySignalError::Dropped(to)) => Some(ServerMessage::SignalDropped { to }),
            }
        }
        ClientMessage::LeaveRoom { room_id } => {
            let room_id = match RoomId::new(room_id) {
                Ok(id) => id,
                Err(e) => return Some(invalid_request(e)),
            };
            match state.leave_room_usecase.execute(session, &room_id).await {
                Some(departure) => {
                    let message = participant_left(&departure);
                    state
                        .leave_room_usecase
                        .broadcast_participant_left(departure.remaining, &message)
                        .await;
                }
                None => tracing::debug!(
                    "'{}' is not in room '{}'; ignoring leave-room",
                    session.connection_id(),
                    room_id
                ),
            }
            None
        }
        ClientMessage::GetRoomInfo { room_id } => {
            let room_id = match RoomId::new(room_id) {
                Ok(id) => id,
                Err(e) => return Some(invalid_request(e)),
            };
            match state.get_room_info_usecase.execute(&room_id).await {
                Ok(room) => Some(ServerMessage::from(&room)),
                Err(GetRoomInfoError::RoomNotFound(room_id)) => {
                    Some(ServerMessage::RoomNotFound { room_id })
                }
            }
        }
        ClientMessage::Unknown => Some(ServerMessage::UnknownMessageType),
    }
}

fn identity(name: String, peer_id: String) -> Result<(DisplayName, PeerId), ValueObjectError> {
    Ok((DisplayName::new(name)?, PeerId::new(peer_id)?))
}

fn invalid_request(error: ValueObjectError) -> ServerMessage {
    ServerMessage::InvalidRequest {
        reason: error.to_string(),
    }
}

fn session_rejection(error: SessionError) -> Option<ServerMessage> {
    match error {
        SessionError::AlreadyInRoom(room_id) => Some(ServerMessage::AlreadyInRoom { room_id }),
        SessionError::RequestPending => Some(ServerMessage::InvalidRequest {
            reason: error.to_string(),
        }),
        SessionError::Closed => None,
    }
}

fn participant_left(departure: &Departure) -> String {
    ServerMessage::ParticipantLeft {
        connection_id: departure.participant.connection_id.as_str().to_string(),
        name: departure.participant.display_name.as_str().to_string(),
    }
    .to_json()
}

/// Queue a reply for this connection's own writer
async fn reply(tx: &mpsc::Sender<String>, message: ServerMessage) {
    if tx.send(message.to_json()).await.is_err() {
        tracing::debug!("Writer is gone; dropping reply");
    }
}
