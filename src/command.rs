//! Line commands that stand in for pointer and form events.
//!
//! Each stdin line is split on whitespace and parsed with clap into a typed
//! [`Command`]. Pointer coordinates are in client space (top-left origin).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true, disable_help_subcommand = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Press at client `(x, y)`.
    #[command(allow_negative_numbers = true)]
    Down { x: f64, y: f64 },
    /// Move the pointer to client `(x, y)`.
    #[command(allow_negative_numbers = true)]
    Move { x: f64, y: f64 },
    /// Release at client `(x, y)`.
    #[command(allow_negative_numbers = true)]
    Up { x: f64, y: f64 },
    /// Set a slider from its range control.
    #[command(allow_negative_numbers = true)]
    Slide { id: Uuid, value: f64 },
    /// Write the scene as JSON to `path`, or to stdout.
    Export { path: Option<PathBuf> },
    /// Replace the scene with the JSON payload at `path`.
    Import { path: PathBuf },
    /// Add an entity from its JSON form (the create form analogue).
    Create {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        json: Vec<String>,
    },
    /// Replace an entity's fields from its JSON form (a direct edit).
    Update {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        json: Vec<String>,
    },
    Delete { id: Uuid },
    Dup { id: Uuid },
    /// Attach an external source to a receiver. Falls back to the configured
    /// serial path.
    Connect { id: Uuid, path: Option<PathBuf> },
    Disconnect { id: Uuid },
    Collisions { state: Toggle },
    List,
    Quit,
}

impl Command {
    /// Rejoin the whitespace-split JSON words of `create` / `update`.
    #[must_use]
    pub fn payload(words: &[String]) -> String {
        words.join(" ")
    }
}

/// Parse one input line.
///
/// # Errors
///
/// Returns [`CommandError::Empty`] for a blank line and
/// [`CommandError::Invalid`] with clap's first error line otherwise.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(CommandError::Empty);
    }
    Line::try_parse_from(tokens).map(|l| l.command).map_err(|e| {
        let rendered = e.to_string();
        CommandError::Invalid(rendered.lines().next().unwrap_or_default().trim().to_string())
    })
}

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;
