//! Data Transfer Objects (DTOs)
//!
//! DTOs are organized by protocol:
//! - `websocket`: signaling WebSocket messages
//! - `transcript`: transcription WebSocket frames
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod transcript;
pub mod websocket;
