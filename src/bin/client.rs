//! Interactive WebSocket chess client.
//!
//! Connects to a chess server, requests matchmaking with `init`, then
//! sends UCI moves typed at the prompt. Automatically reconnects on
//! disconnection (max 5 attempts with 5 second interval); the server
//! supersedes the previous channel on reconnect.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=dev-secret cargo run --bin client -- --user-id alice
//! cargo run --bin client -- --token <access-token>
//! ```

use chess_app_rs::{
    auth::{JwtConfig, generate_access_token},
    client::run_client,
    common::logger::{LogLevel, setup_logger},
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "Interactive WebSocket chess client", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// User ID to mint a development token for (requires JWT_SECRET)
    #[arg(short = 'i', long)]
    user_id: Option<String>,

    /// Pre-issued access token (takes precedence over --user-id)
    #[arg(short = 't', long)]
    token: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), LogLevel::Info);

    let args = Args::parse();

    let (token, user_id) = match (args.token, args.user_id) {
        (Some(token), user_id) => (token, user_id.unwrap_or_else(|| "me".to_string())),
        (None, Some(user_id)) => {
            let jwt = JwtConfig::from_env();
            match generate_access_token(&user_id, &jwt) {
                Ok(token) => (token, user_id),
                Err(e) => {
                    tracing::error!("Failed to mint a development token: {}", e);
                    std::process::exit(1);
                }
            }
        }
        (None, None) => {
            eprintln!("either --token or --user-id is required");
            std::process::exit(1);
        }
    };

    // Run the client
    if let Err(e) = run_client(args.url, token, user_id).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
