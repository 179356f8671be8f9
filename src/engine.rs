//! Chess rules engine wrapper.
//!
//! Thin boundary around [`shakmaty`] exposing exactly what the game layer
//! needs: decode a UCI move string against the current position, apply it,
//! report the side to move, and detect terminal outcomes. The rest of the
//! crate never touches shakmaty types directly.

use shakmaty::uci::UciMove;
use shakmaty::{Chess, Move, Position};
use thiserror::Error;

pub use shakmaty::Color;

/// Errors produced while decoding or applying a move.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The move string is not valid long-algebraic (UCI) notation.
    #[error("move string is not valid UCI notation")]
    DecodeFailed,
    /// The move is syntactically valid but not legal in the position.
    #[error("move is not legal in the current position")]
    IllegalMove,
}

/// Terminal result of a finished game.
///
/// `result` is a PGN result token (`1-0`, `0-1`, `1/2-1/2`); `method` is a
/// human-readable reason such as `Checkmate` or `Stalemate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    pub result: String,
    pub method: String,
}

/// A chess position with side-to-move and outcome queries.
#[derive(Debug, Clone)]
pub struct ChessPosition {
    board: Chess,
}

impl ChessPosition {
    /// Standard starting position.
    pub fn new() -> Self {
        Self {
            board: Chess::default(),
        }
    }

    /// Decode a UCI move string (`<from><to>[promotion]`, e.g. `e2e4`,
    /// `e7e8q`) into a move that is legal in the current position.
    pub fn decode(&self, move_str: &str) -> Result<Move, EngineError> {
        let uci: UciMove = move_str.parse().map_err(|_| EngineError::DecodeFailed)?;
        uci.to_move(&self.board).map_err(|_| EngineError::IllegalMove)
    }

    /// Apply a decoded move. The position is left unchanged on error.
    pub fn apply(&mut self, mv: &Move) -> Result<(), EngineError> {
        let next = self
            .board
            .clone()
            .play(mv)
            .map_err(|_| EngineError::IllegalMove)?;
        self.board = next;
        Ok(())
    }

    /// Which side moves next.
    pub fn turn(&self) -> Color {
        self.board.turn()
    }

    /// Terminal outcome of the position, if any.
    ///
    /// Shakmaty reports checkmate, stalemate and insufficient material on
    /// its own; a halfmove clock of 100 is additionally reported as a
    /// fifty-move-rule draw since nobody is around to claim it.
    pub fn outcome(&self) -> Option<GameOutcome> {
        if let Some(outcome) = self.board.outcome() {
            let method = if self.board.is_checkmate() {
                "Checkmate"
            } else if self.board.is_stalemate() {
                "Stalemate"
            } else {
                "InsufficientMaterial"
            };
            return Some(GameOutcome {
                result: outcome.to_string(),
                method: method.to_string(),
            });
        }

        if self.board.halfmoves() >= 100 {
            return Some(GameOutcome {
                result: "1/2-1/2".to_string(),
                method: "FiftyMoveRule".to_string(),
            });
        }

        None
    }
}

impl Default for ChessPosition {
    fn default() -> Self {
        Self::new()
    }
}
