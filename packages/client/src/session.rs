//! Signaling console session.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use huddle_server::infrastructure::dto::websocket::ServerMessage;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{
    command::{self, Command, HELP},
    error::ClientError,
    formatter::MessageFormatter,
    retry::RetryPolicy,
    runner::run_with_retry,
    ui::redisplay_prompt,
};

/// Run the signaling console, reconnecting per `policy`
///
/// The console input survives reconnects; the room membership does not, so
/// the user has to rejoin after a reconnect.
pub async fn run_signaling_client(
    url: String,
    name: String,
    policy: RetryPolicy,
) -> Result<(), ClientError> {
    let peer_id = uuid::Uuid::new_v4().to_string();
    let input = Arc::new(Mutex::new(spawn_readline(name.clone())));

    println!(
        "\nYou are '{}' (peer {}). Type /help for commands. Press Ctrl+D to exit.\n",
        name, peer_id
    );

    let label = format!("Connecting to {} as '{}'", url, name);
    run_with_retry(policy, &label, || {
        run_signaling_session(&url, &name, &peer_id, input.clone())
    })
    .await
}

/// Read console lines on a blocking thread (rustyline is synchronous)
fn spawn_readline(name: String) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", name);
        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}

/// One connection's worth of console session
///
/// Returns `Ok(())` when the user quits and `Err` when the connection drops.
pub async fn run_signaling_session(
    url: &str,
    name: &str,
    peer_id: &str,
    input: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
) -> Result<(), ClientError> {
    let (ws_stream, _) = connect_async(url).await?;
    tracing::info!("Connected to signaling server");

    let (mut write, mut read) = ws_stream.split();
    let mut input = input.lock().await;
    let mut own_connection_id = String::new();

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerMessage>(text.as_str()) {
                        Ok(message) => {
                            if let ServerMessage::Connected { connection_id } = &message {
                                own_connection_id = connection_id.clone();
                            }
                            print!(
                                "{}",
                                MessageFormatter::format_server_message(
                                    &message,
                                    &own_connection_id,
                                )
                            );
                        }
                        Err(_) => print!("{}", MessageFormatter::format_raw_message(text.as_str())),
                    }
                    redisplay_prompt(name);
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed the connection");
                    return Err(ClientError::ConnectionLost);
                }
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return Err(ClientError::ConnectionLost);
                }
                Some(Ok(_)) => {}
            },
            line = input.recv() => {
                let Some(line) = line else {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                };

                let command = match command::parse(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{}", e);
                        redisplay_prompt(name);
                        continue;
                    }
                };

                match command {
                    Command::Help => {
                        print!("{}", HELP);
                        redisplay_prompt(name);
                    }
                    Command::Quit => {
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(());
                    }
                    other => {
                        let Some(message) = other.to_message(name, peer_id) else {
                            continue;
                        };
                        let json = match serde_json::to_string(&message) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!("Failed to serialize message: {}", e);
                                continue;
                            }
                        };
                        if let Err(e) = write.send(Message::text(json)).await {
                            tracing::warn!("Failed to send message: {}", e);
                            return Err(ClientError::ConnectionLost);
                        }
                    }
                }
            }
        }
    }
}
