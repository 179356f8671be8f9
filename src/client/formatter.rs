//! Message formatting utilities for client display.

use crate::messages::PlayerColor;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the matchmaking acknowledgement
    pub fn format_waiting(message: &str) -> String {
        format!("\n* {}\n", message)
    }

    /// Format the game start banner with the assigned color
    pub fn format_game_start(color: PlayerColor, game_id: &str) -> String {
        let mut output = String::new();
        output.push_str("\n============================================================\n");
        output.push_str(&format!("Game {} started. You play {}.\n", game_id, color.as_str()));
        output.push_str("============================================================\n");
        output
    }

    /// Format an accepted move echoed by the server
    pub fn format_move(mv: &str) -> String {
        format!("\nmove played: {}\n", mv)
    }

    /// Format the end-of-game notification
    pub fn format_game_over(outcome: &str, method: &str) -> String {
        format!("\nGame over: {} ({})\n", outcome, method)
    }

    /// Format a server-side rejection
    pub fn format_error(message: &str) -> String {
        format!("\n! {}\n", message)
    }

    /// Format an unrecognized frame as raw text
    pub fn format_raw_message(text: &str) -> String {
        format!("\n{}\n", text)
    }
}
