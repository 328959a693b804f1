//! Configuration types for the chat applications.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures shared by the three binaries.

use std::time::Duration;

use arrrg_derive::CommandLine;

/// Command-line arguments shared by the banter chat tools.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend base URL.
    #[arrrg(optional, "Backend base URL (default: http://127.0.0.1:8000/)", "URL")]
    pub endpoint: Option<String>,

    /// Total request timeout in seconds.
    #[arrrg(optional, "Total request timeout in seconds (default: none)", "SECONDS")]
    pub timeout: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat application.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend base URL; `None` targets the development server default.
    pub endpoint: Option<String>,

    /// Total request timeout; `None` lets a stream run to completion.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Endpoint: the client default (`http://127.0.0.1:8000/`)
    /// - Timeout: none
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            endpoint: None,
            timeout: None,
            use_color: true,
        }
    }

    /// Sets the backend endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the total request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            endpoint: args.endpoint,
            timeout: args.timeout.map(Duration::from_secs),
            use_color: !args.no_color,
        }
    }
}
