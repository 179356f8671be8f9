//! WebSocket connection handlers and HTTP endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::{
    auth::validate_token,
    game::session::push_json,
    messages::{IncomingMessage, OutgoingError},
};

use super::state::{AppState, ConnectQuery};

/// Authenticate and upgrade an incoming WebSocket connection.
///
/// The token comes from the `token` query parameter or the `auth_token`
/// cookie; a missing or invalid token is rejected with 401 before the
/// upgrade happens.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let token = query
        .token
        .or_else(|| token_from_cookie(&headers))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = validate_token(&token, &state.jwt).map_err(|e| {
        tracing::warn!("Rejecting connection with invalid token: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    let user_id = claims.sub;
    if user_id.is_empty() {
        tracing::warn!("Rejecting token with empty subject");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

/// Extract the `auth_token` cookie value, if present.
fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get("cookie")?.to_str().ok()?;
    cookies
        .split(';')
        .find_map(|pair| pair.trim().strip_prefix("auth_token=").map(str::to_string))
}

/// Per-connection I/O pump.
///
/// One task forwards queued outbound frames to the socket; the other
/// decodes inbound frames and dispatches them into the game manager. When
/// either side stops (read error, close, or supersession dropping the
/// pusher channel), both are torn down and the connection is detached.
pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: String) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    if let Err(e) = state.manager.attach_connection(&user_id, tx.clone()).await {
        tracing::warn!("Refused connection for '{}': {}", user_id, e);
        return;
    }

    let (mut sender, mut receiver) = socket.split();

    // Drain queued outbound frames into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let manager = state.manager.clone();
    let loop_user_id = user_id.clone();
    let loop_channel = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket read error for '{}': {}", loop_user_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let incoming = match serde_json::from_str::<IncomingMessage>(&text) {
                        Ok(incoming) => incoming,
                        Err(e) => {
                            tracing::debug!("Undecodable frame from '{}': {}", loop_user_id, e);
                            push_json(
                                Some(&loop_channel),
                                &OutgoingError::new("invalid message format"),
                            );
                            continue;
                        }
                    };
                    manager.dispatch(&loop_user_id, incoming).await;
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", loop_user_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.manager.detach_connection(&user_id, &tx).await;
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Snapshot counters exposed at `/api/stats`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub active_games: usize,
    pub connected_users: usize,
}

/// Report active game and connected user counts.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        active_games: state.manager.active_game_count().await,
        connected_users: state.manager.connected_user_count().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_token_from_cookie_single() {
        // テスト項目: auth_token クッキーのみの場合に値が取れる
        // given (前提条件):
        let headers = headers_with_cookie("auth_token=abc123");

        // when (操作):
        let token = token_from_cookie(&headers);

        // then (期待する結果):
        assert_eq!(token, Some("abc123".to_string()));
    }

    #[test]
    fn test_token_from_cookie_among_others() {
        // テスト項目: 複数クッキーの中から auth_token が取り出せる
        // given (前提条件):
        let headers = headers_with_cookie("theme=dark; auth_token=abc123; lang=ja");

        // when (操作):
        let token = token_from_cookie(&headers);

        // then (期待する結果):
        assert_eq!(token, Some("abc123".to_string()));
    }

    #[test]
    fn test_token_from_cookie_missing() {
        // テスト項目: auth_token クッキーがない場合は None になる
        // given (前提条件):
        let headers = headers_with_cookie("theme=dark; lang=ja");

        // when (操作):
        let token = token_from_cookie(&headers);

        // then (期待する結果):
        assert_eq!(token, None);
    }

    #[test]
    fn test_token_from_cookie_no_header() {
        // テスト項目: Cookie ヘッダー自体がない場合は None になる
        // given (前提条件):
        let headers = HeaderMap::new();

        // when (操作):
        let token = token_from_cookie(&headers);

        // then (期待する結果):
        assert_eq!(token, None);
    }
}
