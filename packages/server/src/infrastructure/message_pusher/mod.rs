//! メッセージ送信（通知）の実装
//!
//! - `websocket`: 接続ごとの有界キューを経由して WebSocket に書き込む実装

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
