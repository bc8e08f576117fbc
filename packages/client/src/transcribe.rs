//! Streams a raw PCM file to the transcription endpoint.
//!
//! The file must already be 16 kHz mono 16-bit little-endian PCM. Chunks are
//! paced in real time so the provider sees a live stream. Once the file is
//! sent the client stops transcription and closes the socket.

use std::{path::Path, time::Duration};

use futures_util::{Sink, SinkExt, StreamExt};
use huddle_server::{
    domain::audio::TARGET_SAMPLE_RATE, infrastructure::dto::transcript::TranscriptFrame,
};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{
    error::ClientError, formatter::MessageFormatter, retry::RetryPolicy, runner::run_with_retry,
};

/// Length of one audio chunk
pub const CHUNK_MS: usize = 100;
/// Bytes per chunk (16-bit mono samples)
pub const CHUNK_BYTES: usize = TARGET_SAMPLE_RATE as usize * 2 * CHUNK_MS / 1000;
/// How long to wait for the server's close reply
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Build the `/transcript` URL for a server base URL
pub fn transcript_url(base_url: &str, room_id: &str, user_id: Option<&str>) -> String {
    let mut url = format!(
        "{}/transcript?roomId={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(room_id)
    );
    if let Some(user_id) = user_id {
        url.push_str("&userId=");
        url.push_str(&urlencoding::encode(user_id));
    }
    url
}

/// Split PCM data into chunks of whole samples
pub fn chunks(pcm: &[u8]) -> impl Iterator<Item = &[u8]> {
    let usable = pcm.len() - pcm.len() % 2;
    pcm[..usable].chunks(CHUNK_BYTES)
}

/// Stream `path` and print transcripts until the file has been sent
pub async fn run_transcription(
    base_url: &str,
    path: &Path,
    room_id: &str,
    user_id: Option<&str>,
    policy: RetryPolicy,
) -> Result<(), ClientError> {
    let pcm = tokio::fs::read(path)
        .await
        .map_err(|source| ClientError::Audio {
            path: path.to_path_buf(),
            source,
        })?;
    let url = transcript_url(base_url, room_id, user_id);

    let label = format!("Connecting to {}", url);
    let (ws_stream, _) = run_with_retry(policy, &label, || async {
        connect_async(url.as_str()).await.map_err(ClientError::from)
    })
    .await?;
    let (mut write, mut read) = ws_stream.split();

    // 受信は別タスクで行い、最初のエラーフレームを結果として返す
    let mut reader = tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<TranscriptFrame>(text.as_str()) {
                        Ok(TranscriptFrame::Error { code, message }) => {
                            return Err(ClientError::Transcription { code, message });
                        }
                        Ok(frame) => println!("{}", MessageFormatter::format_transcript(&frame)),
                        Err(_) => {
                            let raw = MessageFormatter::format_raw_message(text.as_str());
                            println!("{}", raw.trim());
                        }
                    }
                }
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
        Ok(())
    });

    let total = pcm.len() / CHUNK_BYTES;
    tracing::info!(
        "Streaming {} ({} bytes, ~{} chunks of {} ms)",
        path.display(),
        pcm.len(),
        total,
        CHUNK_MS
    );

    let mut ticker = tokio::time::interval(Duration::from_millis(CHUNK_MS as u64));
    for chunk in chunks(&pcm) {
        tokio::select! {
            result = &mut reader => return flatten(result),
            _ = ticker.tick() => {}
        }
        if let Err(e) = write.send(Message::binary(chunk.to_vec())).await {
            tracing::warn!("Failed to send audio: {}", e);
            return Err(ClientError::ConnectionLost);
        }
    }

    tracing::info!("Audio sent; closing the stream");
    end_stream(&mut write).await?;

    match tokio::time::timeout(CLOSE_TIMEOUT, &mut reader).await {
        Ok(result) => flatten(result),
        Err(_) => {
            reader.abort();
            Ok(())
        }
    }
}

/// Send `stop` followed by a close frame
async fn end_stream<S>(write: &mut S) -> Result<(), ClientError>
where
    S: Sink<Message> + Unpin,
{
    let stop = serde_json::json!({"type": "stop"}).to_string();
    write
        .send(Message::text(stop))
        .await
        .map_err(|_| ClientError::ConnectionLost)?;
    write
        .send(Message::Close(None))
        .await
        .map_err(|_| ClientError::ConnectionLost)
}

fn flatten(
    result: Result<Result<(), ClientError>, tokio::task::JoinError>,
) -> Result<(), ClientError> {
    result.unwrap_or_else(|e| Err(ClientError::Connection(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size_is_100ms_of_audio() {
        // テスト項目: 100ms 分のチャンクは 16kHz / 16bit で 3200 バイト
        assert_eq!(CHUNK_BYTES, 3200);
    }

    #[test]
    fn test_chunks_drop_trailing_odd_byte() {
        // テスト項目: 末尾の半端なバイトは送らない
        // given (前提条件):
        let pcm = vec![0u8; CHUNK_BYTES + 5];

        // when (操作):
        let lengths: Vec<usize> = chunks(&pcm).map(<[u8]>::len).collect();

        // then (期待する結果):
        assert_eq!(lengths, vec![CHUNK_BYTES, 4]);
    }

    #[tokio::test]
    async fn test_end_stream_closes_right_after_stop() {
        // テスト項目: 送信完了後は stop の直後に close を送り、待機しない
        // given (前提条件):
        let mut sent: Vec<Message> = Vec::new();

        // when (操作):
        let result = end_stream(&mut sent).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(sent.len(), 2);
        let stop: serde_json::Value = serde_json::from_str(sent[0].to_text().unwrap()).unwrap();
        assert_eq!(stop["type"], "stop");
        assert!(matches!(sent[1], Message::Close(None)));
    }

    #[test]
    fn test_transcript_url_encodes_query() {
        // テスト項目: Room ID とユーザー ID は URL エンコードされる
        assert_eq!(
            transcript_url("ws://localhost:3001/", "team sync", Some("a&b")),
            "ws://localhost:3001/transcript?roomId=team%20sync&userId=a%26b"
        );
        assert_eq!(
            transcript_url("ws://localhost:3001", "r1", None),
            "ws://localhost:3001/transcript?roomId=r1"
        );
    }
}
