//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use huddle_shared::time::timestamp_to_rfc3339;

use crate::{
    domain::RoomId,
    infrastructure::dto::http::{HealthDto, RoomDetailDto, RoomSummaryDto, ServiceInfoDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        active_rooms: state.get_rooms_usecase.count().await,
        max_participants: state.get_rooms_usecase.max_participants(),
        transcription: state.transcription_usecase.is_enabled(),
        timestamp: timestamp_to_rfc3339(state.clock.now_millis()),
    })
}

pub async fn service_info() -> Json<ServiceInfoDto> {
    Json(ServiceInfoDto {
        message: "Huddle signaling server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;
    Json(rooms.iter().map(RoomSummaryDto::from).collect())
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|_| StatusCode::NOT_FOUND)?;
    match state.get_room_info_usecase.execute(&room_id).await {
        Ok(room) => Ok(Json(RoomDetailDto::from(&room))),
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}
