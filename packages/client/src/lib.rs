//! Huddle CLI client.
//!
//! - signaling console: create / join rooms and relay raw `signal` payloads
//! - transcription streamer: sends a PCM file to `/transcript` and prints transcripts

pub mod command;
pub mod error;
pub mod formatter;
pub mod retry;
pub mod runner;
pub mod session;
pub mod transcribe;
mod ui;

pub use error::ClientError;
pub use retry::RetryPolicy;
