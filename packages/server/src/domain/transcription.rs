//! Speech-to-text provider abstraction.
//!
//! A provider connection is exposed as a pair of channels instead of
//! callbacks: commands (audio, keep-alive, finish) flow in, events
//! (transcripts, errors, close) flow out. The transcription bridge owns the
//! resulting [`SttStream`] exclusively.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};

use super::value_object::{ConnectionId, RoomId};

/// Provider connection options
#[derive(Debug, Clone, PartialEq)]
pub struct SttOptions {
    pub model: String,
    pub language: String,
    pub sample_rate: u32,
    pub interim_results: bool,
    pub punctuate: bool,
    pub smart_format: bool,
    pub diarization: bool,
}

impl Default for SttOptions {
    fn default() -> Self {
        Self {
            model: "nova-2".to_string(),
            language: "en-US".to_string(),
            sample_rate: 16_000,
            interim_results: true,
            punctuate: true,
            smart_format: true,
            diarization: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SttError {
    #[error("speech-to-text provider is not configured")]
    NotConfigured,

    #[error("failed to connect to speech-to-text provider: {0}")]
    ConnectionFailed(String),

    #[error("speech-to-text provider rejected the credentials: {0}")]
    AuthenticationFailed(String),
}

/// Messages sent to the provider connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SttCommand {
    /// Raw 16-bit little-endian PCM
    Audio(Vec<u8>),
    KeepAlive,
    /// Flush pending results and close the provider stream
    Finish,
}

/// Events emitted by the provider connection
#[derive(Debug, Clone, PartialEq)]
pub enum SttEvent {
    Transcript {
        text: String,
        is_final: bool,
        speaker: Option<String>,
        confidence: Option<f64>,
    },
    Error(String),
    Closed,
}

/// Why an audio frame could not be queued for the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttSendError {
    /// The provider queue is full
    Backpressure,
    /// The provider connection is gone
    Closed,
}

/// Handle to one live provider connection
pub struct SttStream {
    commands: mpsc::Sender<SttCommand>,
    events: mpsc::Receiver<SttEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl SttStream {
    pub fn new(commands: mpsc::Sender<SttCommand>, events: mpsc::Receiver<SttEvent>) -> Self {
        Self {
            commands,
            events,
            tasks: Vec::new(),
        }
    }

    /// Attach the background tasks driving the connection; they are torn
    /// down together with the stream.
    pub fn with_tasks(mut self, tasks: Vec<JoinHandle<()>>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Queue an audio frame without waiting
    pub fn send_audio(&self, frame: Vec<u8>) -> Result<(), SttSendError> {
        self.commands
            .try_send(SttCommand::Audio(frame))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => SttSendError::Backpressure,
                mpsc::error::TrySendError::Closed(_) => SttSendError::Closed,
            })
    }

    /// Next provider event; `None` once the provider side is gone
    pub async fn recv_event(&mut self) -> Option<SttEvent> {
        self.events.recv().await
    }

    /// Ask the provider to finish, give its tasks `grace` to wind down, then
    /// abort whatever is still running.
    pub async fn close(mut self, grace: Duration) {
        if self.commands.try_send(SttCommand::Finish).is_err() {
            tracing::debug!("Provider command queue unavailable while closing");
        }
        self.events.close();

        let tasks = std::mem::take(&mut self.tasks);
        for mut task in tasks {
            if tokio::time::timeout(grace, &mut task).await.is_err() {
                task.abort();
            }
        }
    }
}

impl Drop for SttStream {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Streaming speech-to-text backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SttProvider: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &'static str;

    /// Open a streaming connection; resolves once the provider is ready
    async fn connect(&self, options: &SttOptions) -> Result<SttStream, SttError>;
}

/// Labels attached to every transcript of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionContext {
    pub connection_id: ConnectionId,
    pub room_id: RoomId,
    pub user_id: Option<String>,
}

/// Uniform transcript record delivered to the client
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRecord {
    pub text: String,
    pub is_final: bool,
    pub timestamp: i64,
    pub speaker: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Created,
    Initializing,
    Streaming,
    Closing,
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_audio_reports_backpressure_when_queue_is_full() {
        // テスト項目: 送信キューが満杯の場合は Backpressure が返される
        // given (前提条件):
        let (tx, _rx) = mpsc::channel(1);
        let (_event_tx, event_rx) = mpsc::channel(1);
        let stream = SttStream::new(tx, event_rx);
        stream.send_audio(vec![0, 0]).unwrap();

        // when (操作):
        let result = stream.send_audio(vec![0, 0]);

        // then (期待する結果):
        assert_eq!(result, Err(SttSendError::Backpressure));
    }

    #[tokio::test]
    async fn test_send_audio_reports_closed_when_provider_is_gone() {
        // テスト項目: プロバイダ側が終了している場合は Closed が返される
        // given (前提条件):
        let (tx, rx) = mpsc::channel(1);
        let (_event_tx, event_rx) = mpsc::channel(1);
        let stream = SttStream::new(tx, event_rx);
        drop(rx);

        // when (操作):
        let result = stream.send_audio(vec![0, 0]);

        // then (期待する結果):
        assert_eq!(result, Err(SttSendError::Closed));
    }

    #[tokio::test]
    async fn test_close_sends_finish_and_aborts_stuck_tasks() {
        // テスト項目: close は Finish を送り、終わらないタスクを中断する
        // given (前提条件):
        let (tx, mut rx) = mpsc::channel(4);
        let (_event_tx, event_rx) = mpsc::channel(1);
        let stuck = tokio::spawn(async {
            std::future::pending::<()>().await;
        });
        let stream = SttStream::new(tx, event_rx).with_tasks(vec![stuck]);

        // when (操作):
        stream.close(Duration::from_millis(20)).await;

        // then (期待する結果):
        assert_eq!(rx.recv().await, Some(SttCommand::Finish));
    }
}
