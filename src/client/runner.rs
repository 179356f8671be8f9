//! Client execution logic with bounded reconnection.
//!
//! The server supersedes a user's previous channel on reconnect, so
//! retrying after a transport failure is always safe. Fatal errors
//! (rejected credentials) end the client immediately.

use std::time::Duration;

use super::error::ClientError;
use super::session::run_client_session;

const RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Run the client, reconnecting on connection loss.
///
/// Each transport failure consumes one of [`RECONNECT_ATTEMPTS`]; a
/// session that ends cleanly (user quit at the prompt) does not.
pub async fn run_client(url: String, token: String, user_id: String) -> Result<(), ClientError> {
    let mut attempts_left = RECONNECT_ATTEMPTS;

    loop {
        match run_client_session(&url, &token, &user_id).await {
            Ok(()) => return Ok(()),
            Err(error) if error.is_fatal() || attempts_left == 0 => return Err(error),
            Err(error) => {
                attempts_left -= 1;
                tracing::warn!(
                    "Connection lost ({}), retrying in {:?} ({} attempts left)",
                    error,
                    RECONNECT_INTERVAL,
                    attempts_left
                );
                tokio::time::sleep(RECONNECT_INTERVAL).await;
            }
        }
    }
}
