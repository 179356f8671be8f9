//! A single chess match between two players.
//!
//! The game owns its position and enforces that every accepted move is a
//! legal move by the side to move. Accepted moves and terminal outcomes
//! are broadcast to both participants through channel snapshots handed in
//! by the manager, so the game never reads the manager's registries.

use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::engine::{ChessPosition, Color, EngineError};
use crate::game::session::{PusherChannel, push_json};
use crate::messages::{OutgoingGameOver, OutgoingMove, PlayerColor};

/// Lifecycle status of a game. Transitions only go from `InProgress` to
/// one of the terminal states, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::InProgress => "in_progress",
            GameStatus::Completed => "completed",
            GameStatus::Abandoned => "abandoned",
        }
    }
}

/// Errors surfaced to the client when a move is rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    #[error("game has already ended")]
    GameEnded,
    #[error("move cannot be empty")]
    EmptyMove,
    #[error("you are not in this game")]
    NotInGame,
    #[error("not your turn")]
    NotYourTurn,
    #[error("invalid move format")]
    InvalidMove,
}

impl From<EngineError> for GameError {
    fn from(_: EngineError) -> Self {
        GameError::InvalidMove
    }
}

/// Channel snapshots for the two participants, taken by the manager right
/// before delegating to the game. A disconnected side is `None`.
#[derive(Debug)]
pub struct ParticipantChannels {
    pub white: Option<PusherChannel>,
    pub black: Option<PusherChannel>,
}

/// Terminal summary handed back to the manager for registry cleanup and
/// history recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedGame {
    pub status: GameStatus,
    pub outcome: String,
    pub method: String,
    pub ended_at: i64,
}

struct GameInner {
    position: ChessPosition,
    status: GameStatus,
    ended_at: Option<i64>,
}

/// One match: two player identities, the position, and a lifecycle status.
pub struct Game {
    pub id: String,
    pub white_user_id: String,
    pub black_user_id: String,
    pub started_at: i64,
    inner: RwLock<GameInner>,
}

impl Game {
    /// Create a new game in the starting position. Announcing the pairing
    /// to the players is the manager's job.
    pub fn start(white_user_id: String, black_user_id: String, now: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            white_user_id,
            black_user_id,
            started_at: now,
            inner: RwLock::new(GameInner {
                position: ChessPosition::new(),
                status: GameStatus::InProgress,
                ended_at: None,
            }),
        }
    }

    pub fn is_player(&self, user_id: &str) -> bool {
        user_id == self.white_user_id || user_id == self.black_user_id
    }

    pub fn color_of(&self, user_id: &str) -> Option<PlayerColor> {
        if user_id == self.white_user_id {
            Some(PlayerColor::White)
        } else if user_id == self.black_user_id {
            Some(PlayerColor::Black)
        } else {
            None
        }
    }

    pub async fn is_active(&self) -> bool {
        let inner = self.inner.read().await;
        inner.status == GameStatus::InProgress
    }

    pub async fn status(&self) -> GameStatus {
        let inner = self.inner.read().await;
        inner.status
    }

    /// Validate and apply a move by `user_id`.
    ///
    /// On success the accepted move is echoed to both participants; if the
    /// move ends the game, a `game_over` message is broadcast instead and
    /// the terminal summary is returned for cleanup. On error nothing is
    /// sent and the position is unchanged.
    pub async fn make_move(
        &self,
        user_id: &str,
        move_str: &str,
        channels: &ParticipantChannels,
        now: i64,
    ) -> Result<Option<FinishedGame>, GameError> {
        let mut inner = self.inner.write().await;

        if inner.status != GameStatus::InProgress {
            return Err(GameError::GameEnded);
        }
        if move_str.is_empty() {
            return Err(GameError::EmptyMove);
        }
        if !self.is_player(user_id) {
            return Err(GameError::NotInGame);
        }

        let white_to_move = inner.position.turn() == Color::White;
        if white_to_move != (user_id == self.white_user_id) {
            return Err(GameError::NotYourTurn);
        }

        let mv = inner.position.decode(move_str)?;
        inner.position.apply(&mv)?;

        if let Some(outcome) = inner.position.outcome() {
            inner.status = GameStatus::Completed;
            inner.ended_at = Some(now);

            let game_over = OutgoingGameOver::new(outcome.result.clone(), outcome.method.clone());
            push_json(channels.white.as_ref(), &game_over);
            push_json(channels.black.as_ref(), &game_over);

            return Ok(Some(FinishedGame {
                status: GameStatus::Completed,
                outcome: outcome.result,
                method: outcome.method,
                ended_at: now,
            }));
        }

        let echo = OutgoingMove::new(move_str.to_string());
        push_json(channels.white.as_ref(), &echo);
        push_json(channels.black.as_ref(), &echo);

        Ok(None)
    }

    /// Declare abandonment by `user_id` and notify the survivor.
    ///
    /// No-op when the game has already ended. Returns the terminal summary
    /// for cleanup otherwise.
    pub async fn handle_disconnect(
        &self,
        user_id: &str,
        channels: &ParticipantChannels,
        now: i64,
    ) -> Option<FinishedGame> {
        let mut inner = self.inner.write().await;

        if inner.status != GameStatus::InProgress {
            return None;
        }

        inner.status = GameStatus::Abandoned;
        inner.ended_at = Some(now);

        let (survivor, outcome) = if user_id == self.white_user_id {
            (channels.black.as_ref(), "0-1") // black wins
        } else {
            (channels.white.as_ref(), "1-0") // white wins
        };

        push_json(
            survivor,
            &OutgoingGameOver::new(outcome.to_string(), "Abandonment".to_string()),
        );

        Some(FinishedGame {
            status: GameStatus::Abandoned,
            outcome: outcome.to_string(),
            method: "Abandonment".to_string(),
            ended_at: now,
        })
    }
}
