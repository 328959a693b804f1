// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod markdown;
pub mod render;
pub mod text_stream;
pub mod transcript;

// Re-exports
pub use client::{Backend, ChatClient};
pub use client_logger::ClientLogger;
pub use error::{Error, Result};
pub use markdown::MarkdownRenderer;
pub use render::{PlainTextRenderer, Renderer};
pub use text_stream::TextStream;
pub use transcript::{Message, Role, Transcript};
