//! Speech-to-text provider implementations.

pub mod deepgram;

pub use deepgram::DeepgramProvider;
