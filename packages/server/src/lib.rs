//! Huddle server library.
//!
//! Room coordination and WebRTC signaling relay for small peer-to-peer
//! meetings, plus a per-connection bridge that streams client audio to a
//! speech-to-text provider and returns live transcripts.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
