//! Chat application module for the banter REPL tools.
//!
//! This module provides the pieces shared by the three chat binaries:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Core chat session management and backend interaction
//! - [`commands`]: Slash command parsing and handling
//!
//! The binaries differ only in response mode (whole-response vs. streamed)
//! and renderer (plain text vs. markdown).

mod commands;
mod config;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use session::{ChatSession, SessionStats, SubmitOutcome};
