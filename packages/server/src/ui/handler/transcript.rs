//! Transcription WebSocket handler.
//!
//! Binary frames carry 16 kHz mono 16-bit little-endian PCM. Text frames carry
//! control commands (`{"type":"stop"}`). Transcripts and errors are returned
//! as JSON text frames.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::stream::StreamExt;
use tokio::{sync::mpsc, time::timeout};

use crate::{
    domain::{ConnectionId, RoomId, TranscriptionContext},
    infrastructure::dto::{
        conversion::transcript_frame,
        transcript::{TranscriptControl, TranscriptFrame, TranscriptQuery},
    },
    ui::state::AppState,
    usecase::{AudioOutcome, TranscriptionOutput},
};

use super::transport::{finish_writer, spawn_writer};

pub async fn transcript_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<TranscriptQuery>,
) -> Result<impl IntoResponse, (StatusCode, &'static str)> {
    let Some(room_id) = query.room_id.and_then(|id| RoomId::new(id).ok()) else {
        tracing::warn!("Rejected transcription connection without a valid roomId");
        return Err((StatusCode::BAD_REQUEST, "roomId query parameter is required"));
    };

    let context = TranscriptionContext {
        connection_id: ConnectionId::generate(),
        room_id,
        user_id: query
            .user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()),
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, context)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, context: TranscriptionContext) {
    let transport = state.transport;
    let connection_id = context.connection_id.clone();
    let (sink, mut receiver) = socket.split();

    let (tx, rx) = mpsc::channel::<TranscriptionOutput>(transport.outbound_buffer);
    let labels = context.clone();
    let mut writer = spawn_writer(rx, sink, transport, move |output| encode(&labels, output));

    let mut bridge = state.transcription_usecase.open(context, tx);
    if let Err(e) = state.transcription_usecase.start(&mut bridge).await {
        tracing::info!(
            "Closing transcription connection '{}': {}",
            connection_id,
            e
        );
        // Bridge が送信側を持っているので、破棄するとエラーフレームの後に Close が送られる
        drop(bridge);
        finish_writer(writer, transport.send_timeout).await;
        return;
    }

    let mut writer_finished = false;
    let mut forwarded: u64 = 0;
    loop {
        tokio::select! {
            _ = &mut writer => {
                writer_finished = true;
                break;
            }
            event = bridge.next_event() => bridge.handle_event(event).await,
            frame = timeout(transport.ping_timeout, receiver.next()) => match frame {
                Err(_) => {
                    tracing::info!(
                        "Transcription connection '{}' idle for {:?}; closing",
                        connection_id,
                        transport.ping_timeout
                    );
                    break;
                }
                Ok(None) | Ok(Some(Err(_))) => break,
                Ok(Some(Ok(Message::Binary(data)))) => {
                    if bridge.push_audio(data.to_vec()).await == AudioOutcome::Forwarded {
                        forwarded += 1;
                    }
                }
                Ok(Some(Ok(Message::Text(text)))) => {
                    match serde_json::from_str::<TranscriptControl>(text.as_str()) {
                        Ok(TranscriptControl::Stop) => {
                            tracing::info!("Client '{}' stopped transcription", connection_id);
                            bridge.close().await;
                        }
                        Ok(TranscriptControl::Unknown) | Err(_) => {
                            tracing::debug!("Ignoring text frame from '{}'", connection_id);
                        }
                    }
                }
                Ok(Some(Ok(Message::Close(_)))) => break,
                Ok(Some(Ok(_))) => {}
            },
        }
    }

    bridge.close().await;
    tracing::info!(
        "Transcription connection '{}' closed ({} audio frames forwarded)",
        connection_id,
        forwarded
    );

    drop(bridge);
    if !writer_finished {
        finish_writer(writer, transport.send_timeout).await;
    }
}

fn encode(context: &TranscriptionContext, output: TranscriptionOutput) -> String {
    match output {
        TranscriptionOutput::Transcript(record) => transcript_frame(context, record).to_json(),
        TranscriptionOutput::Error { code, message } => TranscriptFrame::Error {
            code: code.to_string(),
            message,
        }
        .to_json(),
    }
}
