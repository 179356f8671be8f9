//! Error types for the chess client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the token before upgrading the connection
    #[error("Authentication rejected by the server")]
    AuthRejected,

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl ClientError {
    /// Whether reconnecting could ever help.
    ///
    /// An auth rejection is fatal: the server refused the token itself,
    /// so presenting the same token again cannot succeed. Transport
    /// failures are transient and worth retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClientError::AuthRejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_rejection_is_fatal() {
        // テスト項目: 認証拒否は致命的エラーとして再試行の対象外になる
        // given (前提条件):
        let error = ClientError::AuthRejected;

        // when (操作):
        let result = error.is_fatal();

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_connection_error_is_transient() {
        // テスト項目: 接続エラーは一時的なものとして扱われる
        // given (前提条件):
        let error = ClientError::ConnectionError("connection reset".to_string());

        // when (操作):
        let result = error.is_fatal();

        // then (期待する結果):
        assert!(!result);
    }
}
