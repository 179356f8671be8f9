//! Game history store.
//!
//! The game manager records every game start and every terminal transition
//! through the [`GameHistoryStore`] trait. The trait is the interface the
//! core consumes; the bundled implementation keeps records in memory.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

/// One recorded game, mirroring what a SQL-backed store would persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub id: String,
    pub white_user_id: String,
    pub black_user_id: String,
    pub status: String,
    pub outcome: Option<String>,
    pub method: Option<String>,
    pub started_at: i64,
    pub ended_at: Option<i64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("game '{0}' was never recorded as started")]
    UnknownGame(String),
}

/// Store for started and finished games.
#[async_trait]
pub trait GameHistoryStore: Send + Sync {
    /// Record a freshly created game.
    async fn record_started(&self, record: GameRecord) -> Result<(), HistoryError>;

    /// Record the terminal transition of a previously started game.
    async fn record_finished(
        &self,
        game_id: &str,
        status: &str,
        outcome: &str,
        method: &str,
        ended_at: i64,
    ) -> Result<(), HistoryError>;
}

/// In-memory [`GameHistoryStore`] implementation.
pub struct InMemoryGameHistoryStore {
    records: Mutex<HashMap<String, GameRecord>>,
}

impl InMemoryGameHistoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a recorded game by id.
    pub async fn get(&self, game_id: &str) -> Option<GameRecord> {
        let records = self.records.lock().await;
        records.get(game_id).cloned()
    }

    /// Number of recorded games.
    pub async fn len(&self) -> usize {
        let records = self.records.lock().await;
        records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryGameHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GameHistoryStore for InMemoryGameHistoryStore {
    async fn record_started(&self, record: GameRecord) -> Result<(), HistoryError> {
        let mut records = self.records.lock().await;
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn record_finished(
        &self,
        game_id: &str,
        status: &str,
        outcome: &str,
        method: &str,
        ended_at: i64,
    ) -> Result<(), HistoryError> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(game_id)
            .ok_or_else(|| HistoryError::UnknownGame(game_id.to_string()))?;

        record.status = status.to_string();
        record.outcome = Some(outcome.to_string());
        record.method = Some(method.to_string());
        record.ended_at = Some(ended_at);
        Ok(())
    }
}
