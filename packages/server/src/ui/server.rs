//! Server execution logic.

use std::{sync::Arc, time::Duration};

use axum::{Router, http::HeaderValue, routing::get};
use huddle_shared::time::Clock;
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::ServerConfig,
    domain::{MessagePusher, RoomRepository, SttProvider},
    usecase::CleanupEmptyRoomsUseCase,
};

use super::{
    handler::{
        get_room_detail, get_rooms, health_check, service_info, signaling_handler,
        transcript_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Huddle signaling and transcription server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(config, repository, message_pusher, None, Arc::new(SystemClock));
/// server.run("127.0.0.1".to_string(), 3001).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    /// Empty allows any origin
    cors_allowed_origins: Vec<String>,
    room_cleanup_interval: Option<Duration>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `config` - Typed server configuration
    /// * `repository` - Room registry
    /// * `message_pusher` - Outbound queues of the signaling connections
    /// * `stt_provider` - Speech-to-text provider (`None` disables transcription)
    /// * `clock` - Time source for timestamps
    pub fn new(
        config: ServerConfig,
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        stt_provider: Option<Arc<dyn SttProvider>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = AppState::new(
            repository,
            message_pusher,
            stt_provider,
            config.transcription,
            clock,
            config.transport,
        );

        Self {
            state: Arc::new(state),
            cors_allowed_origins: config.cors_allowed_origins,
            room_cleanup_interval: config.room_cleanup_interval,
        }
    }

    /// Build the axum router
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(signaling_handler))
            .route("/transcript", get(transcript_handler))
            // HTTP エンドポイント
            .route("/", get(service_info))
            .route("/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .layer(cors_layer(&self.cors_allowed_origins))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Huddle server listening on {}", listener.local_addr()?);
        tracing::info!("Signaling: ws://{}/ws", bind_addr);
        tracing::info!("Transcription: ws://{}/transcript?roomId=<room>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener).await?;
        Ok(())
    }

    /// Serve on an already bound listener until a shutdown signal arrives
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        if !self.state.transcription_usecase.is_enabled() {
            tracing::warn!("No speech-to-text API key configured; transcription is disabled");
        }

        let cleanup = self.room_cleanup_interval.map(|interval| {
            spawn_room_cleanup(self.state.cleanup_empty_rooms_usecase.clone(), interval)
        });

        let app = self.router();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(task) = cleanup {
            task.abort();
        }
        result?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

fn spawn_room_cleanup(
    usecase: Arc<CleanupEmptyRoomsUseCase>,
    interval: Duration,
) -> JoinHandle<()> {
    tracing::info!("Empty-room cleanup every {:?}", interval);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        loop {
            ticker.tick().await;
            usecase.execute().await;
        }
    })
}
