//! Huddle CLI client.
//!
//! Signaling console (create / join rooms, relay raw signals) or, with
//! `--transcribe`, a streamer that sends a PCM file for live transcription.
//! Reconnects are bounded by `--max-attempts` with exponential backoff.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin huddle-client -- --name Alice
//! cargo run --bin huddle-client -- --transcribe speech.pcm --room r1 --user alice
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use huddle_client::{RetryPolicy, session::run_signaling_client, transcribe::run_transcription};
use huddle_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "huddle-client")]
#[command(about = "Huddle signaling console and transcription streamer", long_about = None)]
struct Args {
    /// Server base URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:3001")]
    url: String,

    /// Display name used in rooms
    #[arg(short = 'n', long, required_unless_present = "transcribe")]
    name: Option<String>,

    /// Stream a 16 kHz mono 16-bit little-endian PCM file for transcription
    #[arg(long, value_name = "FILE", requires = "room")]
    transcribe: Option<PathBuf>,

    /// Room the transcription belongs to
    #[arg(long)]
    room: Option<String>,

    /// User label attached to transcripts
    #[arg(long)]
    user: Option<String>,

    /// Maximum connection attempts
    #[arg(long, default_value_t = 5)]
    max_attempts: u32,

    /// Initial reconnect backoff (milliseconds)
    #[arg(long, default_value_t = 1000)]
    backoff_ms: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    // wss:// 接続用
    let _ = rustls::crypto::ring::default_provider().install_default();

    let args = Args::parse();
    let policy = RetryPolicy::new(
        args.max_attempts.max(1),
        Duration::from_millis(args.backoff_ms),
        Duration::from_secs(30),
    );
    let base_url = args.url.trim_end_matches('/').to_string();

    let result = match (args.transcribe, args.room, args.name) {
        (Some(path), Some(room), _) => {
            run_transcription(&base_url, &path, &room, args.user.as_deref(), policy).await
        }
        (_, _, Some(name)) => {
            run_signaling_client(format!("{}/ws", base_url), name, policy).await
        }
        // clap enforces --name or --transcribe/--room
        _ => Ok(()),
    };

    if let Err(e) = result {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
