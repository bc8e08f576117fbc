//! In-process test server and WebSocket test client.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use huddle_server::{
    config::ServerConfig,
    domain::SttProvider,
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository},
    ui::Server,
};
use huddle_shared::time::FixedClock;
use serde_json::Value;
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

/// How long a test waits for an expected frame
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Server running on an ephemeral port inside the test runtime
pub struct TestServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::default(), None).await
    }

    pub async fn start_with(
        config: ServerConfig,
        stt_provider: Option<Arc<dyn SttProvider>>,
    ) -> Self {
        let repository = Arc::new(InMemoryRoomRepository::new(
            config.max_participants_per_room,
        ));
        let message_pusher = Arc::new(WebSocketMessagePusher::new());
        let server = Server::new(
            config,
            repository,
            message_pusher,
            stt_provider,
            Arc::new(FixedClock::new(1_672_531_200_000)),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let task = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        Self { addr, task }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn transcript_url(&self, query: &str) -> String {
        format!("ws://{}/transcript{}", self.addr, query)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Signaling client speaking JSON text frames
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pub connection_id: String,
}

impl TestClient {
    /// Connect and consume the `connected` greeting
    pub async fn connect(url: &str) -> Self {
        let (ws, _) = connect_async(url).await.expect("Failed to connect");
        let mut client = Self {
            ws,
            connection_id: String::new(),
        };

        let greeting = client.recv().await;
        assert_eq!(greeting["type"], "connected");
        client.connection_id = greeting["connectionId"]
            .as_str()
            .expect("connectionId must be a string")
            .to_string();
        client
    }

    pub async fn send(&mut self, message: Value) {
        self.ws
            .send(Message::text(message.to_string()))
            .await
            .expect("Failed to send message");
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.ws
            .send(Message::text(text.to_string()))
            .await
            .expect("Failed to send message");
    }

    /// Next JSON text frame (control frames are skipped)
    pub async fn recv(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("Timed out waiting for a message")
                .expect("Connection closed")
                .expect("WebSocket error");
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).expect("Invalid JSON from server");
            }
        }
    }

    /// Assert that no text frame arrives within `wait`
    pub async fn expect_silence(&mut self, wait: Duration) {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            match tokio::time::timeout_at(deadline, self.ws.next()).await {
                Err(_) => return,
                Ok(Some(Ok(Message::Text(text)))) => {
                    panic!("Unexpected message: {}", text.as_str())
                }
                Ok(Some(Ok(_))) => continue,
                Ok(_) => return,
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
