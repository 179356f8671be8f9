//! Player session model and the outbound push channel.

use serde::Serialize;
use tokio::sync::mpsc;

/// Channel used to push outbound JSON frames to a connected client.
///
/// Sends never block: the WebSocket send task drains the receiving end
/// into the socket, so registries can be mutated and messages queued
/// without waiting on the network.
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Durable record of an authenticated user's presence, independent of any
/// particular connection lifetime.
#[derive(Debug)]
pub struct PlayerSession {
    pub user_id: String,
    /// Present while connected; `None` during the disconnect grace period.
    pub channel: Option<PusherChannel>,
    /// Set iff the user is a player in an active game.
    pub game_id: Option<String>,
    pub disconnected: bool,
    pub last_seen: i64,
}

impl PlayerSession {
    pub fn new(user_id: String, channel: PusherChannel, now: i64) -> Self {
        Self {
            user_id,
            channel: Some(channel),
            game_id: None,
            disconnected: false,
            last_seen: now,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// Serialize and push a message to this session's client, if connected.
    pub fn push<T: Serialize>(&self, msg: &T) {
        push_json(self.channel.as_ref(), msg);
    }
}

/// Serialize and push a message down a channel snapshot.
///
/// Send failures are swallowed: a broken peer is detected by its own read
/// loop and handled through detach, never by the sender.
pub fn push_json<T: Serialize>(channel: Option<&PusherChannel>, msg: &T) {
    let Some(tx) = channel else {
        return;
    };
    match serde_json::to_string(msg) {
        Ok(json) => {
            if tx.send(json).is_err() {
                tracing::warn!("Failed to push message to a closed channel");
            }
        }
        Err(e) => {
            tracing::error!("Failed to serialize outbound message: {}", e);
        }
    }
}
