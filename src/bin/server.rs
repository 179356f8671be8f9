//! Real-time chess matchmaking and game server.
//!
//! Pairs authenticated WebSocket clients into games, validates moves, and
//! broadcasts authoritative state changes to both players.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=dev-secret cargo run --bin server
//! JWT_SECRET=dev-secret cargo run --bin server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use chess_app_rs::{
    auth::JwtConfig,
    common::{
        logger::{LogLevel, setup_logger},
        time::SystemClock,
    },
    game::GameManager,
    history::InMemoryGameHistoryStore,
    server::{run_server, state::AppState},
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "WebSocket chess matchmaking and game server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), LogLevel::Info);

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Token configuration
    // 2. History store
    // 3. Game manager
    // 4. AppState + server
    let jwt = JwtConfig::from_env();
    let history = Arc::new(InMemoryGameHistoryStore::new());
    let manager = Arc::new(GameManager::new(history, Arc::new(SystemClock)));
    let state = Arc::new(AppState { manager, jwt });

    if let Err(e) = run_server(args.host, args.port, state).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
