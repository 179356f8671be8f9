//! Logging setup for the chess server and client binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default verbosity for a binary's own events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Initialize the tracing subscriber for one of the chess binaries.
///
/// The library crate and the binary itself log at `default_level`, while
/// the frame-level transport dependencies are capped at `warn` so a debug
/// run shows pairings and moves rather than WebSocket internals. The
/// `RUST_LOG` environment variable overrides the whole filter.
///
/// # Examples
///
/// ```no_run
/// use chess_app_rs::common::logger::{LogLevel, setup_logger};
///
/// setup_logger("server", LogLevel::Info);
/// ```
pub fn setup_logger(binary_name: &str, default_level: LogLevel) {
    let crate_name = env!("CARGO_PKG_NAME").replace('-', "_");
    let level = default_level.as_str();
    let default_filter = format!(
        "{crate_name}={level},{binary_name}={level},\
         tungstenite=warn,tokio_tungstenite=warn,hyper=warn"
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
