//! Server state and connection parameters.

use std::sync::Arc;

use serde::Deserialize;

use crate::auth::JwtConfig;
use crate::game::GameManager;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Access token; may instead arrive in the `auth_token` cookie
    pub token: Option<String>,
}

/// Shared application state
pub struct AppState {
    /// Registry of sessions, games, and the matchmaking slot
    pub manager: Arc<GameManager>,
    /// Token validation configuration
    pub jwt: JwtConfig,
}
