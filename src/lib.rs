//! Real-time chess matchmaking and game server.
//!
//! This library provides server and client implementations for a
//! WebSocket-based chess service: authenticated users are paired into
//! two-player games, every move is validated against chess rules, and
//! authoritative state changes are broadcast to both players.

pub mod auth;
pub mod client;
pub mod engine;
pub mod game;
pub mod history;
pub mod messages;
pub mod server;

// shared library
pub mod common;
