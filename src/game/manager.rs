//! Process-wide registry of sessions, games, and the matchmaking slot.
//!
//! The manager serialises every state transition that spans more than one
//! of its registries behind a single reader/writer lock. It never blocks
//! on the network while holding that lock: all outbound traffic goes
//! through non-blocking pusher channels, and move validation is delegated
//! to the game (which holds only its own lock) after the registries have
//! been snapshotted.
//!
//! Lock ordering is manager first, then game, never the reverse.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::common::time::Clock;
use crate::game::game::{FinishedGame, Game, GameStatus, ParticipantChannels};
use crate::game::session::{PlayerSession, PusherChannel, push_json};
use crate::history::{GameHistoryStore, GameRecord};
use crate::messages::{
    INIT_GAME, IncomingMessage, MOVE, OutgoingError, OutgoingGameStart, OutgoingWaiting,
    PlayerColor,
};

/// Error refusing a connection attach.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachError {
    #[error("authentication required")]
    AuthRequired,
}

struct ManagerState {
    sessions: HashMap<String, PlayerSession>,
    games: HashMap<String, Arc<Game>>,
    /// Single-cell matchmaking queue: the user waiting for an opponent.
    pending_user: Option<String>,
}

impl ManagerState {
    fn snapshot_channels(&self, game: &Game) -> ParticipantChannels {
        ParticipantChannels {
            white: self
                .sessions
                .get(&game.white_user_id)
                .and_then(|s| s.channel.clone()),
            black: self
                .sessions
                .get(&game.black_user_id)
                .and_then(|s| s.channel.clone()),
        }
    }

    /// Remove a game from the registry and clear both participants'
    /// references to it. Game first, then sessions.
    fn remove_game(&mut self, game: &Game) {
        self.games.remove(&game.id);
        for user_id in [&game.white_user_id, &game.black_user_id] {
            if let Some(session) = self.sessions.get_mut(user_id.as_str()) {
                if session.game_id.as_deref() == Some(game.id.as_str()) {
                    session.game_id = None;
                }
            }
        }
    }
}

/// Stateful in-memory engine owning the session registry, the matchmaking
/// slot, and the active-game registry.
pub struct GameManager {
    state: RwLock<ManagerState>,
    history: Arc<dyn GameHistoryStore>,
    clock: Arc<dyn Clock>,
}

impl GameManager {
    pub fn new(history: Arc<dyn GameHistoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(ManagerState {
                sessions: HashMap::new(),
                games: HashMap::new(),
                pending_user: None,
            }),
            history,
            clock,
        }
    }

    /// Bind a freshly upgraded connection to the user's session, creating
    /// the session on first contact.
    ///
    /// Reconnection supersedes: a previous live channel is dropped (its
    /// read loop then tears itself down) and, if the user held the
    /// matchmaking slot, the slot is cleared as a withdrawal. A stale
    /// reference to a game that ended while the user was away is cleared.
    pub async fn attach_connection(
        &self,
        user_id: &str,
        channel: PusherChannel,
    ) -> Result<(), AttachError> {
        if user_id.is_empty() {
            return Err(AttachError::AuthRequired);
        }
        let now = self.clock.now_millis();
        let mut state = self.state.write().await;

        let session = state
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| PlayerSession {
                user_id: user_id.to_string(),
                channel: None,
                game_id: None,
                disconnected: false,
                last_seen: now,
            });
        let superseded = session
            .channel
            .as_ref()
            .is_some_and(|old| !old.same_channel(&channel));
        session.channel = Some(channel);
        session.disconnected = false;
        session.last_seen = now;

        if superseded {
            tracing::info!("User '{}' reconnected, superseding previous channel", user_id);
            if state.pending_user.as_deref() == Some(user_id) {
                state.pending_user = None;
            }
        } else {
            tracing::info!("User '{}' connected", user_id);
        }

        if let Some(game_id) = state.sessions.get(user_id).and_then(|s| s.game_id.clone()) {
            let active = match state.games.get(&game_id) {
                Some(game) => game.is_active().await,
                None => false,
            };
            if !active {
                if let Some(session) = state.sessions.get_mut(user_id) {
                    session.game_id = None;
                }
            }
        }

        Ok(())
    }

    /// Tear down a connection that stopped reading.
    ///
    /// `channel` is the channel the connection loop owned; when a newer
    /// channel has superseded it this is a no-op, so a slow old loop can
    /// never clobber a live reconnection. Otherwise the session enters the
    /// disconnect grace state, the matchmaking slot is withdrawn, and an
    /// active game is declared abandoned.
    pub async fn detach_connection(&self, user_id: &str, channel: &PusherChannel) {
        let now = self.clock.now_millis();
        let finished;
        {
            let mut state = self.state.write().await;
            let Some(session) = state.sessions.get_mut(user_id) else {
                return;
            };
            let owns_channel = session
                .channel
                .as_ref()
                .is_some_and(|current| current.same_channel(channel));
            if !owns_channel {
                tracing::debug!("Ignoring detach from superseded channel of '{}'", user_id);
                return;
            }

            session.channel = None;
            session.disconnected = true;
            session.last_seen = now;

            if state.pending_user.as_deref() == Some(user_id) {
                state.pending_user = None;
            }

            let game_id = state.sessions.get(user_id).and_then(|s| s.game_id.clone());
            finished = match game_id {
                Some(game_id) => match state.games.get(&game_id).cloned() {
                    Some(game) => {
                        let channels = state.snapshot_channels(&game);
                        let result = game.handle_disconnect(user_id, &channels, now).await;
                        state.remove_game(&game);
                        result.map(|finished| (game.id.clone(), finished))
                    }
                    None => {
                        if let Some(session) = state.sessions.get_mut(user_id) {
                            session.game_id = None;
                        }
                        None
                    }
                },
                None => None,
            };

            tracing::info!("User '{}' disconnected", user_id);
        }

        if let Some((game_id, finished)) = finished {
            self.record_finished(&game_id, &finished).await;
        }
    }

    /// Dispatch one decoded inbound message for `user_id`.
    pub async fn dispatch(&self, user_id: &str, message: IncomingMessage) {
        match message.r#type.as_str() {
            INIT_GAME => self.handle_init(user_id).await,
            MOVE => self.handle_move(user_id, &message.r#move).await,
            _ => {
                let channel = {
                    let state = self.state.read().await;
                    state.sessions.get(user_id).and_then(|s| s.channel.clone())
                };
                push_json(channel.as_ref(), &OutgoingError::new("unknown message type"));
            }
        }
    }

    /// Matchmaking entry point (`init_game`).
    ///
    /// Evaluated atomically under the manager lock: either the caller
    /// takes the empty pending slot, or is paired against the waiter (who
    /// plays white). Both `game_start` messages are queued inside the same
    /// critical section that binds the game to the sessions, so neither
    /// player can move before both have been told.
    pub async fn handle_init(&self, user_id: &str) {
        let now = self.clock.now_millis();
        let started;
        {
            let mut state = self.state.write().await;
            let Some(session) = state.sessions.get(user_id) else {
                return;
            };
            let reply_channel = session.channel.clone();

            if let Some(game_id) = session.game_id.clone() {
                let active = match state.games.get(&game_id) {
                    Some(game) => game.is_active().await,
                    None => false,
                };
                if active {
                    push_json(
                        reply_channel.as_ref(),
                        &OutgoingError::new("already in active game"),
                    );
                    return;
                }
                // stale reference to a finished game
                state.games.remove(&game_id);
                if let Some(session) = state.sessions.get_mut(user_id) {
                    session.game_id = None;
                }
            }

            if state.pending_user.as_deref() == Some(user_id) {
                push_json(
                    reply_channel.as_ref(),
                    &OutgoingError::new("already waiting for opponent"),
                );
                return;
            }

            if let Some(pending_id) = state.pending_user.clone() {
                let usable = state
                    .sessions
                    .get(&pending_id)
                    .is_some_and(|s| s.is_connected() && s.game_id.is_none());
                if !usable {
                    tracing::debug!("Clearing stale pending user '{}'", pending_id);
                    state.pending_user = None;
                }
            }

            match state.pending_user.clone() {
                None => {
                    state.pending_user = Some(user_id.to_string());
                    push_json(reply_channel.as_ref(), &OutgoingWaiting::new());
                    tracing::info!("Player '{}' waiting for opponent", user_id);
                    started = None;
                }
                Some(pending_id) if pending_id == user_id => {
                    push_json(
                        reply_channel.as_ref(),
                        &OutgoingError::new("cannot play against yourself"),
                    );
                    started = None;
                }
                Some(pending_id) => {
                    state.pending_user = None;

                    // seniority takes white
                    let game = Arc::new(Game::start(pending_id.clone(), user_id.to_string(), now));
                    if let Some(session) = state.sessions.get_mut(&pending_id) {
                        session.game_id = Some(game.id.clone());
                    }
                    if let Some(session) = state.sessions.get_mut(user_id) {
                        session.game_id = Some(game.id.clone());
                    }
                    state.games.insert(game.id.clone(), game.clone());

                    let white_channel = state
                        .sessions
                        .get(&pending_id)
                        .and_then(|s| s.channel.clone());
                    push_json(
                        white_channel.as_ref(),
                        &OutgoingGameStart::new(PlayerColor::White, game.id.clone()),
                    );
                    push_json(
                        reply_channel.as_ref(),
                        &OutgoingGameStart::new(PlayerColor::Black, game.id.clone()),
                    );

                    tracing::info!(
                        "Game {} started (white: {}, black: {})",
                        game.id,
                        pending_id,
                        user_id
                    );
                    started = Some(game);
                }
            }
        }

        if let Some(game) = started {
            self.record_started(&game).await;
        }
    }

    /// Route a move to the caller's active game.
    ///
    /// The manager lock is only held to look the game up and snapshot the
    /// participants' channels; validation runs under the game's own lock.
    pub async fn handle_move(&self, user_id: &str, move_str: &str) {
        let now = self.clock.now_millis();

        let (game, channels, reply_channel) = {
            let state = self.state.read().await;
            let Some(session) = state.sessions.get(user_id) else {
                return;
            };
            let reply_channel = session.channel.clone();

            let game = session
                .game_id
                .as_ref()
                .and_then(|game_id| state.games.get(game_id))
                .cloned();
            match game {
                Some(game) => {
                    let channels = state.snapshot_channels(&game);
                    (game, channels, reply_channel)
                }
                None => {
                    drop(state);
                    push_json(reply_channel.as_ref(), &OutgoingError::new("not in a game"));
                    return;
                }
            }
        };

        match game.make_move(user_id, move_str, &channels, now).await {
            Ok(None) => {}
            Ok(Some(finished)) => {
                {
                    let mut state = self.state.write().await;
                    state.remove_game(&game);
                }
                self.record_finished(&game.id, &finished).await;
            }
            Err(error) => {
                push_json(reply_channel.as_ref(), &OutgoingError::new(error.to_string()));
            }
        }
    }

    /// Snapshot count of games still in progress.
    pub async fn active_game_count(&self) -> usize {
        let state = self.state.read().await;
        let mut count = 0;
        for game in state.games.values() {
            if game.is_active().await {
                count += 1;
            }
        }
        count
    }

    /// Snapshot count of sessions with a live channel.
    pub async fn connected_user_count(&self) -> usize {
        let state = self.state.read().await;
        state.sessions.values().filter(|s| s.is_connected()).count()
    }

    async fn record_started(&self, game: &Game) {
        let record = GameRecord {
            id: game.id.clone(),
            white_user_id: game.white_user_id.clone(),
            black_user_id: game.black_user_id.clone(),
            status: GameStatus::InProgress.as_str().to_string(),
            outcome: None,
            method: None,
            started_at: game.started_at,
            ended_at: None,
        };
        if let Err(error) = self.history.record_started(record).await {
            tracing::warn!("Failed to record start of game {}: {}", game.id, error);
        }
    }

    async fn record_finished(&self, game_id: &str, finished: &FinishedGame) {
        if let Err(error) = self
            .history
            .record_finished(
                game_id,
                finished.status.as_str(),
                &finished.outcome,
                &finished.method,
                finished.ended_at,
            )
            .await
        {
            tracing::warn!("Failed to record result of game {}: {}", game_id, error);
        }
    }
}
