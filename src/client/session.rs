//! WebSocket client session management.

use std::io::Write as _;

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::messages::{
    IncomingMessage, MessageType, OutgoingError, OutgoingGameOver, OutgoingGameStart, OutgoingMove,
    OutgoingWaiting,
};

use super::error::ClientError;
use super::formatter::MessageFormatter;

/// First-pass decode of a server frame: just the tag.
#[derive(Debug, Deserialize)]
struct TypeProbe {
    r#type: MessageType,
}

/// Render one server frame for terminal display.
fn render_server_event(text: &str) -> String {
    let Ok(probe) = serde_json::from_str::<TypeProbe>(text) else {
        return MessageFormatter::format_raw_message(text);
    };

    match probe.r#type {
        MessageType::Waiting => match serde_json::from_str::<OutgoingWaiting>(text) {
            Ok(msg) => MessageFormatter::format_waiting(&msg.message),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        MessageType::GameStart => match serde_json::from_str::<OutgoingGameStart>(text) {
            Ok(msg) => MessageFormatter::format_game_start(msg.color, &msg.game_id),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        MessageType::Move => match serde_json::from_str::<OutgoingMove>(text) {
            Ok(msg) => MessageFormatter::format_move(&msg.r#move),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        MessageType::GameOver => match serde_json::from_str::<OutgoingGameOver>(text) {
            Ok(msg) => MessageFormatter::format_game_over(&msg.outcome, &msg.method),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        MessageType::Error => match serde_json::from_str::<OutgoingError>(text) {
            Ok(msg) => MessageFormatter::format_error(&msg.message),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
    }
}

/// Translate one prompt line into a protocol message.
///
/// `init` (or `new`) requests matchmaking; anything else is sent as a UCI
/// move and judged by the server.
fn message_for_line(line: &str) -> IncomingMessage {
    match line {
        "init" | "new" => IncomingMessage::init_game(),
        mv => IncomingMessage::new_move(mv.to_string()),
    }
}

/// Redisplay the input prompt after printing a server event.
fn redisplay_prompt(user_id: &str) {
    print!("{}> ", user_id);
    let _ = std::io::stdout().flush();
}

/// Run one WebSocket client session until the connection drops.
pub async fn run_client_session(url: &str, token: &str, user_id: &str) -> Result<(), ClientError> {
    // Authenticate via the token query parameter
    let url = format!("{}?token={}", url, token);

    let (ws_stream, _response) = match connect_async(&url).await {
        Ok(result) => result,
        Err(e) => {
            let error_msg = e.to_string();

            // The server answers 401 before upgrading when the token is bad
            if error_msg.contains("401") || error_msg.contains("Unauthorized") {
                return Err(ClientError::AuthRejected);
            }

            return Err(ClientError::ConnectionError(error_msg));
        }
    };

    tracing::info!("Connected to chess server!");
    println!(
        "\nYou are '{}'. Type 'init' to look for an opponent, then moves like e2e4. Press Ctrl+C to exit.\n",
        user_id
    );

    let (mut write, mut read) = ws_stream.split();

    let user_id_for_read = user_id.to_string();

    // Spawn a task to display incoming server events
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    print!("{}", render_server_event(&text));
                    redisplay_prompt(&user_id_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let user_id_for_prompt = user_id.to_string();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", user_id_for_prompt);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to translate prompt lines into protocol messages
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let msg = message_for_line(&line);

            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            let connection_error = read_result.unwrap_or(false);
            if connection_error {
                return Err(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                ));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            let write_error = write_result.unwrap_or(false);
            if write_error {
                return Err(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                ));
            }
        }
    }

    Ok(())
}
