//! Huddle signaling and live-transcription server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin huddle-server
//! cargo run --bin huddle-server -- --host 127.0.0.1 --port 3001
//! DEEPGRAM_API_KEY=... cargo run --bin huddle-server
//! ```

use std::sync::Arc;

use clap::Parser;
use huddle_server::{
    config::{ServerArgs, ServerConfig},
    domain::SttProvider,
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository,
        stt::DeepgramProvider,
    },
    ui::Server,
};
use huddle_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    // .env は任意
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from(ServerArgs::parse());

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Deepgram への TLS 接続に使う暗号プロバイダ
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Initialize dependencies in order:
    // 1. Repository
    // 2. MessagePusher
    // 3. STT provider
    // 4. Server (UseCases and AppState)
    let repository = Arc::new(InMemoryRoomRepository::new(
        config.max_participants_per_room,
    ));
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let stt_provider = config
        .stt_api_key
        .clone()
        .map(|key| Arc::new(DeepgramProvider::new(key)) as Arc<dyn SttProvider>);

    let host = config.host.clone();
    let port = config.port;
    let server = Server::new(
        config,
        repository,
        message_pusher,
        stt_provider,
        Arc::new(SystemClock),
    );
    if let Err(e) = server.run(host, port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
