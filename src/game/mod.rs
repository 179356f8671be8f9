//! Game domain: player sessions, matches, and the game manager.

pub mod game;
pub mod manager;
pub mod session;

pub use game::{Game, GameError, GameStatus};
pub use manager::GameManager;
pub use session::{PlayerSession, PusherChannel};
