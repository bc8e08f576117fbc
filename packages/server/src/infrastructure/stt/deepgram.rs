//! Deepgram live transcription client.
//!
//! # Connection Flow
//!
//! 1. `connect()` opens `wss://api.deepgram.com/v1/listen` with the stream
//!    options as query parameters and `Authorization: Token <key>`
//! 2. A writer task forwards [`SttCommand`]s as binary audio or JSON control
//!    messages, sending `KeepAlive` while no audio flows
//! 3. A reader task maps `Results` messages to [`SttEvent::Transcript`]
//! 4. `Finish` sends `CloseStream`; Deepgram flushes pending results and
//!    closes the socket, which ends the reader task with [`SttEvent::Closed`]

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::{sync::mpsc, time::Instant};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderValue, StatusCode},
    },
};

use crate::domain::{SttCommand, SttError, SttEvent, SttOptions, SttProvider, SttStream};

pub const DEEPGRAM_LISTEN_URL: &str = "wss://api.deepgram.com/v1/listen";

/// Deepgram closes idle streams after roughly 10 seconds without data
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

/// Queued commands per stream (about 5 s of 100 ms chunks)
const COMMAND_BUFFER: usize = 50;

const EVENT_BUFFER: usize = 100;

const UTTERANCE_END_MS: u32 = 1000;

pub struct DeepgramProvider {
    api_key: String,
    endpoint: String,
}

impl DeepgramProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, DEEPGRAM_LISTEN_URL.to_string())
    }

    /// Point the provider at another endpoint (e.g. a self-hosted Deepgram)
    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        Self { api_key, endpoint }
    }

    fn listen_url(&self, options: &SttOptions) -> String {
        let mut url = format!(
            "{}?model={}&language={}&encoding=linear16&sample_rate={}&channels=1\
             &interim_results={}&punctuate={}&smart_format={}&utterance_end_ms={}&vad_events=true",
            self.endpoint,
            urlencoding::encode(&options.model),
            urlencoding::encode(&options.language),
            options.sample_rate,
            options.interim_results,
            options.punctuate,
            options.smart_format,
            UTTERANCE_END_MS,
        );
        if options.diarization {
            url.push_str("&diarize=true");
        }
        url
    }
}

#[async_trait]
impl SttProvider for DeepgramProvider {
    fn name(&self) -> &'static str {
        "deepgram"
    }

    async fn connect(&self, options: &SttOptions) -> Result<SttStream, SttError> {
        let mut request = self
            .listen_url(options)
            .into_client_request()
            .map_err(|e| SttError::ConnectionFailed(e.to_string()))?;
        request.headers_mut().insert(
            "Authorization",
            HeaderValue::from_str(&format!("Token {}", self.api_key))
                .map_err(|e| SttError::AuthenticationFailed(e.to_string()))?,
        );

        tracing::info!(
            "Connecting to Deepgram (model={}, language={})",
            options.model,
            options.language
        );
        let (ws_stream, _response) = connect_async(request).await.map_err(map_connect_error)?;
        tracing::info!("Deepgram connection established");

        let (mut write, mut read) = ws_stream.split();
        let (command_tx, mut command_rx) = mpsc::channel::<SttCommand>(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::channel::<SttEvent>(EVENT_BUFFER);

        let writer_events = event_tx.clone();
        let writer_task = tokio::spawn(async move {
            let mut keepalive = tokio::time::interval(KEEPALIVE_INTERVAL);
            keepalive.tick().await;
            let mut last_sent = Instant::now();

            loop {
                let message = tokio::select! {
                    command = command_rx.recv() => match command {
                        Some(SttCommand::Audio(frame)) => Message::Binary(frame.into()),
                        Some(SttCommand::KeepAlive) => control_message("KeepAlive"),
                        Some(SttCommand::Finish) | None => {
                            if let Err(e) = write.send(control_message("CloseStream")).await {
                                tracing::debug!("Failed to send CloseStream: {}", e);
                            }
                            break;
                        }
                    },
                    _ = keepalive.tick() => {
                        if last_sent.elapsed() < KEEPALIVE_INTERVAL {
                            continue;
                        }
                        control_message("KeepAlive")
                    }
                };

                if let Err(e) = write.send(message).await {
                    tracing::warn!("Failed to write to Deepgram: {}", e);
                    let _ = writer_events
                        .send(SttEvent::Error(format!("failed to send audio: {}", e)))
                        .await;
                    break;
                }
                last_sent = Instant::now();
            }
            tracing::debug!("Deepgram writer task exiting");
        });

        let reader_task = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let event = match message {
                    Ok(Message::Text(text)) => parse_message(text.as_str()),
                    Ok(Message::Close(frame)) => {
                        tracing::info!("Deepgram closed the stream: {:?}", frame);
                        break;
                    }
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!("Deepgram stream error: {}", e);
                        Some(SttEvent::Error(e.to_string()))
                    }
                };

                if let Some(event) = event
                    && event_tx.send(event).await.is_err()
                {
                    tracing::debug!("Event receiver dropped");
                    return;
                }
            }
            let _ = event_tx.send(SttEvent::Closed).await;
            tracing::debug!("Deepgram reader task exiting");
        });

        Ok(SttStream::new(command_tx, event_rx).with_tasks(vec![writer_task, reader_task]))
    }
}

fn control_message(kind: &str) -> Message {
    Message::Text(format!(r#"{{"type":"{}"}}"#, kind).into())
}

fn map_connect_error(error: tungstenite::Error) -> SttError {
    match error {
        tungstenite::Error::Http(response)
            if response.status() == StatusCode::UNAUTHORIZED
                || response.status() == StatusCode::FORBIDDEN =>
        {
            SttError::AuthenticationFailed(format!("HTTP {}", response.status()))
        }
        other => SttError::ConnectionFailed(other.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum DeepgramMessage {
    Results {
        channel: ResultChannel,
        #[serde(default)]
        is_final: bool,
        #[serde(default)]
        speech_final: bool,
    },
    Error {
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ResultChannel {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    confidence: Option<f64>,
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
struct Word {
    speaker: Option<u32>,
}

/// Map one Deepgram text message to a stream event
fn parse_message(text: &str) -> Option<SttEvent> {
    let message = match serde_json::from_str::<DeepgramMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Failed to parse Deepgram message: {}", e);
            return None;
        }
    };

    match message {
        DeepgramMessage::Results {
            channel,
            is_final,
            speech_final,
        } => {
            let alternative = channel.alternatives.into_iter().next()?;
            let text = alternative.transcript.trim();
            if text.is_empty() {
                return None;
            }
            let speaker = alternative
                .words
                .iter()
                .find_map(|w| w.speaker)
                .map(|n| format!("Speaker {}", n));

            Some(SttEvent::Transcript {
                text: text.to_string(),
                is_final: is_final || speech_final,
                speaker,
                confidence: alternative.confidence,
            })
        }
        DeepgramMessage::Error {
            description,
            message,
        } => Some(SttEvent::Error(
            description
                .or(message)
                .unwrap_or_else(|| "unknown Deepgram error".to_string()),
        )),
        DeepgramMessage::Other => None,
    }
}
