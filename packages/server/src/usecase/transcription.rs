//! UseCase: ライブ文字起こし
//!
//! 音声用 WebSocket 接続ごとに 1 つの [`TranscriptionBridge`] を作成します。
//! Bridge は STT プロバイダへの接続（[`SttStream`]）を排他的に所有し、
//! クライアント向けのフレームを有界キューに積みます。
//!
//! ```text
//! Created ──start──▶ Initializing ──ready──▶ Streaming ──close──▶ Closing ──▶ Closed
//!                         │ timeout / error                                      ▲
//!                         └──────────────────────────────────────────────────────┘
//! ```
//!
//! `active` は入力音声の転送とイベント配信の両方を制御し、終了処理の最初に
//! 一度だけ false になります。以降の呼び出しはすべて no-op です。

use std::{sync::Arc, time::Duration};

use huddle_shared::time::Clock;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::{
    BridgeState, SttEvent, SttOptions, SttProvider, SttSendError, SttStream, TranscriptRecord,
    TranscriptionContext, audio,
};

use super::error::TranscriptionError;

/// Time given to the provider to flush results after a close request
const PROVIDER_CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Frames produced for the transcription client
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptionOutput {
    Transcript(TranscriptRecord),
    Error { code: &'static str, message: String },
}

impl From<&TranscriptionError> for TranscriptionOutput {
    fn from(error: &TranscriptionError) -> Self {
        Self::Error {
            code: error.code(),
            message: error.to_string(),
        }
    }
}

/// What happened to an inbound audio frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOutcome {
    Forwarded,
    /// Failed validation
    Rejected,
    /// Provider queue full
    Dropped,
    /// The bridge is not streaming
    Inactive,
}

#[derive(Debug, Clone)]
pub struct TranscriptionSettings {
    pub options: SttOptions,
    pub init_timeout: Duration,
    /// Consecutive provider-queue drops tolerated before the bridge closes
    pub max_dropped_frames: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            options: SttOptions::default(),
            init_timeout: Duration::from_secs(10),
            max_dropped_frames: 50,
        }
    }
}

/// ライブ文字起こしのユースケース
pub struct TranscriptionUseCase {
    /// `None` when no API key is configured
    provider: Option<Arc<dyn SttProvider>>,
    settings: TranscriptionSettings,
    clock: Arc<dyn Clock>,
}

impl TranscriptionUseCase {
    pub fn new(
        provider: Option<Arc<dyn SttProvider>>,
        settings: TranscriptionSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            settings,
            clock,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// 接続用の Bridge を作成（まだプロバイダには接続しない）
    pub fn open(
        &self,
        context: TranscriptionContext,
        outbound: mpsc::Sender<TranscriptionOutput>,
    ) -> TranscriptionBridge {
        TranscriptionBridge::new(
            context,
            outbound,
            self.clock.clone(),
            self.settings.max_dropped_frames,
        )
    }

    /// プロバイダに接続して Streaming に遷移させる
    ///
    /// 失敗した場合はエラーフレームを送り、Bridge は Closed になる。
    pub async fn start(&self, bridge: &mut TranscriptionBridge) -> Result<(), TranscriptionError> {
        match &self.provider {
            Some(provider) => {
                bridge
                    .initialize(
                        provider.as_ref(),
                        &self.settings.options,
                        self.settings.init_timeout,
                    )
                    .await
            }
            None => {
                bridge.reject(TranscriptionError::NotConfigured);
                Err(TranscriptionError::NotConfigured)
            }
        }
    }
}

/// 音声接続 1 本分の文字起こしセッション
pub struct TranscriptionBridge {
    context: TranscriptionContext,
    state: BridgeState,
    active: bool,
    stream: Option<SttStream>,
    outbound: mpsc::Sender<TranscriptionOutput>,
    clock: Arc<dyn Clock>,
    max_dropped_frames: usize,
    consecutive_drops: usize,
}

impl TranscriptionBridge {
    pub fn new(
        context: TranscriptionContext,
        outbound: mpsc::Sender<TranscriptionOutput>,
        clock: Arc<dyn Clock>,
        max_dropped_frames: usize,
    ) -> Self {
        Self {
            context,
            state: BridgeState::Created,
            active: false,
            stream: None,
            outbound,
            clock,
            max_dropped_frames,
            consecutive_drops: 0,
        }
    }

    pub fn context(&self) -> &TranscriptionContext {
        &self.context
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Connect to the provider, bounded by `timeout`
    pub async fn initialize(
        &mut self,
        provider: &dyn SttProvider,
        options: &SttOptions,
        timeout: Duration,
    ) -> Result<(), TranscriptionError> {
        if self.state != BridgeState::Created {
            tracing::warn!(
                "Bridge for '{}' already initialized (state {:?})",
                self.context.connection_id,
                self.state
            );
            return Ok(());
        }

        self.state = BridgeState::Initializing;
        tracing::info!(
            "Starting {} transcription for room '{}' (connection '{}')",
            provider.name(),
            self.context.room_id,
            self.context.connection_id
        );

        let result = match tokio::time::timeout(timeout, provider.connect(options)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(TranscriptionError::InitFailed(e)),
            Err(_) => Err(TranscriptionError::InitTimeout(timeout)),
        };

        match result {
            Ok(stream) => {
                self.stream = Some(stream);
                self.active = true;
                self.state = BridgeState::Streaming;
                Ok(())
            }
            Err(e) => {
                self.reject(e.clone());
                Err(e)
            }
        }
    }

    /// Report a fatal start-up error and go straight to Closed
    pub fn reject(&mut self, error: TranscriptionError) {
        tracing::warn!(
            "Transcription for '{}' unavailable: {}",
            self.context.connection_id,
            error
        );
        self.deliver(TranscriptionOutput::from(&error));
        self.active = false;
        self.state = BridgeState::Closed;
    }

    /// Validate and forward one client audio frame
    pub async fn push_audio(&mut self, frame: Vec<u8>) -> AudioOutcome {
        if !self.active {
            return AudioOutcome::Inactive;
        }
        let Some(stream) = self.stream.as_ref() else {
            return AudioOutcome::Inactive;
        };

        if let Err(reason) = audio::check(&frame) {
            tracing::debug!(
                "Dropping invalid audio frame from '{}': {:?}",
                self.context.connection_id,
                reason
            );
            return AudioOutcome::Rejected;
        }

        match stream.send_audio(frame) {
            Ok(()) => {
                self.consecutive_drops = 0;
                AudioOutcome::Forwarded
            }
            Err(SttSendError::Backpressure) => {
                self.consecutive_drops += 1;
                if self.consecutive_drops == 1 {
                    tracing::warn!(
                        "Provider queue full for '{}'; dropping audio",
                        self.context.connection_id
                    );
                }
                if self.consecutive_drops > self.max_dropped_frames {
                    self.fail(TranscriptionError::Backpressure(self.consecutive_drops))
                        .await;
                }
                AudioOutcome::Dropped
            }
            Err(SttSendError::Closed) => {
                self.handle_provider_closed().await;
                AudioOutcome::Inactive
            }
        }
    }

    /// Next provider event; pending forever while no provider is attached
    pub async fn next_event(&mut self) -> Option<SttEvent> {
        match self.stream.as_mut() {
            Some(stream) => stream.recv_event().await,
            None => std::future::pending().await,
        }
    }

    /// Relay a provider event to the client (`None` means the provider went away)
    pub async fn handle_event(&mut self, event: Option<SttEvent>) {
        if !self.active {
            tracing::debug!(
                "Ignoring provider event for inactive bridge '{}'",
                self.context.connection_id
            );
            return;
        }

        match event {
            Some(SttEvent::Transcript {
                text,
                is_final,
                speaker,
                confidence,
            }) => {
                let record = TranscriptRecord {
                    text,
                    is_final,
                    timestamp: self.clock.now_millis(),
                    speaker,
                    confidence,
                };
                self.deliver(TranscriptionOutput::Transcript(record));
            }
            Some(SttEvent::Error(message)) => {
                tracing::warn!(
                    "Provider error for '{}': {}",
                    self.context.connection_id,
                    message
                );
                self.deliver(TranscriptionOutput::from(&TranscriptionError::Provider(
                    message,
                )));
            }
            Some(SttEvent::Closed) | None => self.handle_provider_closed().await,
        }
    }

    /// Explicit close (client stop or transport disconnect). Idempotent.
    pub async fn close(&mut self) {
        if self.state == BridgeState::Closed {
            return;
        }
        self.active = false;
        self.state = BridgeState::Closing;
        if let Some(stream) = self.stream.take() {
            tracing::info!(
                "Closing transcription stream for '{}'",
                self.context.connection_id
            );
            stream.close(PROVIDER_CLOSE_GRACE).await;
        }
        self.state = BridgeState::Closed;
    }

    async fn fail(&mut self, error: TranscriptionError) {
        tracing::warn!(
            "Closing transcription for '{}': {}",
            self.context.connection_id,
            error
        );
        self.deliver(TranscriptionOutput::from(&error));
        self.close().await;
    }

    async fn handle_provider_closed(&mut self) {
        tracing::info!(
            "Provider closed the stream for '{}'",
            self.context.connection_id
        );
        self.close().await;
    }

    fn deliver(&self, output: TranscriptionOutput) {
        match self.outbound.try_send(output) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => tracing::warn!(
                "Client queue full for '{}'; dropping transcription frame",
                self.context.connection_id
            ),
            Err(TrySendError::Closed(_)) => tracing::debug!(
                "Client of '{}' is gone; dropping transcription frame",
                self.context.connection_id
            ),
        }
    }
}
