//! Server configuration.
//!
//! Every option is a command-line flag with an environment-variable fallback.
//! The binary loads `.env` (if present) before parsing.

use std::time::Duration;

use clap::{Parser, builder::RangedU64ValueParser};

use crate::{domain::SttOptions, usecase::TranscriptionSettings};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "huddle-server",
    version,
    about = "Signaling and live-transcription server for peer-to-peer meetings"
)]
pub struct ServerArgs {
    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port number to bind to
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Maximum participants per room
    #[arg(
        long,
        env = "MAX_PARTICIPANTS_PER_ROOM",
        default_value_t = 10,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_participants_per_room: usize,

    /// Periodically sweep rooms without participants
    #[arg(long, env = "AUTO_DELETE_EMPTY_ROOMS", default_value_t = false)]
    pub auto_delete_empty_rooms: bool,

    /// Interval of the empty-room sweep (milliseconds)
    #[arg(
        long,
        env = "ROOM_CLEANUP_INTERVAL",
        default_value_t = 300_000,
        value_parser = RangedU64ValueParser::<u64>::new().range(1..)
    )]
    pub room_cleanup_interval_ms: u64,

    /// Deepgram API key; transcription is disabled without it
    #[arg(long, env = "DEEPGRAM_API_KEY", hide_env_values = true)]
    pub stt_api_key: Option<String>,

    #[arg(long, env = "STT_MODEL", default_value = "nova-2")]
    pub stt_model: String,

    #[arg(long, env = "STT_LANGUAGE", default_value = "en-US")]
    pub stt_language: String,

    /// Provider handshake timeout (milliseconds)
    #[arg(
        long,
        env = "STT_INIT_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = RangedU64ValueParser::<u64>::new().range(1..)
    )]
    pub stt_init_timeout_ms: u64,

    /// Label transcripts with speakers
    #[arg(long, env = "STT_DIARIZATION", default_value_t = false)]
    pub stt_diarization: bool,

    /// Comma separated list of allowed origins (empty allows any origin)
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_allowed_origins: Vec<String>,

    /// WebSocket ping interval (milliseconds)
    #[arg(
        long,
        env = "WEBSOCKET_PING_INTERVAL",
        default_value_t = 25_000,
        value_parser = RangedU64ValueParser::<u64>::new().range(1..)
    )]
    pub ping_interval_ms: u64,

    /// Close connections silent for longer than this (milliseconds)
    #[arg(
        long,
        env = "WEBSOCKET_PING_TIMEOUT",
        default_value_t = 60_000,
        value_parser = RangedU64ValueParser::<u64>::new().range(1..)
    )]
    pub ping_timeout_ms: u64,

    /// Per-connection outbound queue capacity
    #[arg(
        long,
        env = "OUTBOUND_BUFFER",
        default_value_t = 256,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub outbound_buffer: usize,

    /// Close connections whose writes stall longer than this (milliseconds)
    #[arg(
        long,
        env = "SEND_TIMEOUT_MS",
        default_value_t = 5_000,
        value_parser = RangedU64ValueParser::<u64>::new().range(1..)
    )]
    pub send_timeout_ms: u64,

    /// Consecutive dropped audio frames tolerated before transcription stops
    #[arg(long, env = "MAX_DROPPED_AUDIO_FRAMES", default_value_t = 50)]
    pub max_dropped_audio_frames: usize,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// WebSocket transport tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
    pub send_timeout: Duration,
    pub outbound_buffer: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_millis(25_000),
            ping_timeout: Duration::from_millis(60_000),
            send_timeout: Duration::from_millis(5_000),
            outbound_buffer: 256,
        }
    }
}

/// Typed server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_participants_per_room: usize,
    /// `Some(interval)` when the empty-room sweep is enabled
    pub room_cleanup_interval: Option<Duration>,
    pub stt_api_key: Option<String>,
    pub transcription: TranscriptionSettings,
    /// Empty allows any origin
    pub cors_allowed_origins: Vec<String>,
    pub transport: TransportConfig,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            max_participants_per_room: crate::domain::DEFAULT_MAX_PARTICIPANTS,
            room_cleanup_interval: None,
            stt_api_key: None,
            transcription: TranscriptionSettings::default(),
            cors_allowed_origins: Vec::new(),
            transport: TransportConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        let stt_api_key = args
            .stt_api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Self {
            host: args.host,
            port: args.port,
            max_participants_per_room: args.max_participants_per_room,
            room_cleanup_interval: args
                .auto_delete_empty_rooms
                .then(|| Duration::from_millis(args.room_cleanup_interval_ms)),
            stt_api_key,
            transcription: TranscriptionSettings {
                options: SttOptions {
                    model: args.stt_model,
                    language: args.stt_language,
                    diarization: args.stt_diarization,
                    ..SttOptions::default()
                },
                init_timeout: Duration::from_millis(args.stt_init_timeout_ms),
                max_dropped_frames: args.max_dropped_audio_frames,
            },
            cors_allowed_origins: args
                .cors_allowed_origins
                .into_iter()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            transport: TransportConfig {
                ping_interval: Duration::from_millis(args.ping_interval_ms),
                ping_timeout: Duration::from_millis(args.ping_timeout_ms),
                send_timeout: Duration::from_millis(args.send_timeout_ms),
                outbound_buffer: args.outbound_buffer,
            },
            log_level: args.log_level,
        }
    }
}
