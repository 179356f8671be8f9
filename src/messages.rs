//! WebSocket message vocabulary shared by the server and the client.
//!
//! Every frame carries one JSON object tagged by its `type` field.
//! Inbound messages (client → server) are `init_game` and `move`;
//! everything else the server answers with an `error` message.

use serde::{Deserialize, Serialize};

/// Inbound `type` tag requesting matchmaking.
pub const INIT_GAME: &str = "init_game";
/// Inbound `type` tag carrying a move.
pub const MOVE: &str = "move";

/// Tag carried in the `type` field of every outbound message frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Waiting,
    GameStart,
    Move,
    GameOver,
    Error,
}

/// Side assigned to a player when a game starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
}

impl PlayerColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerColor::White => "white",
            PlayerColor::Black => "black",
        }
    }
}

/// Message received from a client.
///
/// The tag stays a plain string so that an unknown `type` still decodes
/// and can be answered with an `error` message instead of tearing the
/// frame apart. `move` is only meaningful for `type: "move"` and defaults
/// to an empty string so that `init_game` frames decode without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub r#type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub r#move: String,
}

impl IncomingMessage {
    pub fn init_game() -> Self {
        Self {
            r#type: INIT_GAME.to_string(),
            r#move: String::new(),
        }
    }

    pub fn new_move(mv: String) -> Self {
        Self {
            r#type: MOVE.to_string(),
            r#move: mv,
        }
    }
}

/// Sent to a player who entered the matchmaking slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingWaiting {
    pub r#type: MessageType,
    pub message: String,
}

impl OutgoingWaiting {
    pub fn new() -> Self {
        Self {
            r#type: MessageType::Waiting,
            message: "waiting for opponent".to_string(),
        }
    }
}

impl Default for OutgoingWaiting {
    fn default() -> Self {
        Self::new()
    }
}

/// Sent to both players when a pairing succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingGameStart {
    pub r#type: MessageType,
    pub color: PlayerColor,
    pub game_id: String,
}

impl OutgoingGameStart {
    pub fn new(color: PlayerColor, game_id: String) -> Self {
        Self {
            r#type: MessageType::GameStart,
            color,
            game_id,
        }
    }
}

/// Canonical echo of an accepted move, sent to both players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingMove {
    pub r#type: MessageType,
    pub r#move: String,
}

impl OutgoingMove {
    pub fn new(mv: String) -> Self {
        Self {
            r#type: MessageType::Move,
            r#move: mv,
        }
    }
}

/// Sent to both players when a game reaches a terminal state.
///
/// `outcome` is a PGN result token (`1-0`, `0-1`, `1/2-1/2`), `method` a
/// human-readable reason (`Checkmate`, `Stalemate`, `Abandonment`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingGameOver {
    pub r#type: MessageType,
    pub outcome: String,
    pub method: String,
}

impl OutgoingGameOver {
    pub fn new(outcome: String, method: String) -> Self {
        Self {
            r#type: MessageType::GameOver,
            outcome,
            method,
        }
    }
}

/// Sent to the offending client when an operation is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingError {
    pub r#type: MessageType,
    pub message: String,
}

impl OutgoingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::Error,
            message: message.into(),
        }
    }
}
