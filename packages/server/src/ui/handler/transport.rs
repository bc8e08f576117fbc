//! Outbound half of a WebSocket connection.
//!
//! Every connection owns one writer task that drains a bounded queue into the
//! socket. The same task sends keep-alive pings and gives up on the socket
//! when a write stalls for longer than the send timeout.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::ws::{Message, WebSocket},
};
use futures_util::{sink::SinkExt, stream::SplitSink};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, timeout},
};

use crate::config::TransportConfig;

/// Spawn the writer task of a connection
///
/// The task ends (after sending a Close frame) once every sender of `rx` has
/// been dropped, or as soon as a write fails or stalls.
pub(super) fn spawn_writer<T, F>(
    mut rx: mpsc::Receiver<T>,
    mut sink: SplitSink<WebSocket, Message>,
    config: TransportConfig,
    mut encode: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: FnMut(T) -> String + Send + 'static,
{
    tokio::spawn(async move {
        let mut ping = tokio::time::interval_at(
            Instant::now() + config.ping_interval,
            config.ping_interval,
        );
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let frame = tokio::select! {
                item = rx.recv() => match item {
                    Some(item) => Message::Text(encode(item).into()),
                    None => {
                        let _ = timeout(config.send_timeout, sink.send(Message::Close(None))).await;
                        break;
                    }
                },
                _ = ping.tick() => Message::Ping(Bytes::new()),
            };

            match timeout(config.send_timeout, sink.send(frame)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::debug!("WebSocket write failed: {}", e);
                    break;
                }
                Err(_) => {
                    tracing::warn!(
                        "WebSocket write stalled for {:?}; closing connection",
                        config.send_timeout
                    );
                    break;
                }
            }
        }
    })
}

/// Wait for the writer to flush, aborting it after `grace`
pub(super) async fn finish_writer(mut writer: JoinHandle<()>, grace: Duration) {
    if timeout(grace, &mut writer).await.is_err() {
        tracing::debug!("Writer did not finish within {:?}; aborting", grace);
        writer.abort();
    }
}
