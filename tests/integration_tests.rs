//! Integration tests for the banter library.
//! The live-endpoint tests require BANTER_ENDPOINT to be set and skip
//! otherwise; everything else runs against scripted backends.

use futures::stream;

use banter::chat::{ChatSession, SubmitOutcome};
use banter::{
    Backend, ChatClient, MarkdownRenderer, Message, Renderer, Result, Role, TextStream,
};

/// Backend that echoes the message back, whole or in fixed-size pieces.
struct EchoBackend;

#[async_trait::async_trait]
impl Backend for EchoBackend {
    async fn send(&self, message: &str) -> Result<String> {
        Ok(format!("echo: {message}"))
    }

    async fn stream(&self, message: &str) -> Result<TextStream> {
        let reply = format!("echo: {message}");
        let fragments: Vec<Result<String>> = reply
            .as_bytes()
            .chunks(3)
            .map(|chunk| Ok(String::from_utf8_lossy(chunk).into_owned()))
            .collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}

/// Renderer that discards output.
struct NullRenderer;

impl Renderer for NullRenderer {
    fn print_text(&mut self, _text: &str) {}
    fn print_error(&mut self, _error: &str) {}
    fn print_info(&mut self, _info: &str) {}
    fn finish_response(&mut self) {}
}

#[tokio::test]
async fn full_conversation_over_scripted_backend() {
    let mut session = ChatSession::new(EchoBackend);
    let mut renderer = NullRenderer;

    let outcome = session.send("first", &mut renderer).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Sent);

    let outcome = session
        .send_streaming("second", &mut renderer)
        .await
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Sent);

    let outcome = session.send("   ", &mut renderer).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Ignored);

    let messages = session.transcript().messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0], Message::user("first"));
    assert_eq!(messages[1], Message::assistant("echo: first"));
    assert_eq!(messages[2], Message::user("second"));
    assert_eq!(messages[3], Message::assistant("echo: second"));

    for (index, message) in messages.iter().enumerate() {
        let expected = if index % 2 == 0 {
            Role::User
        } else {
            Role::Assistant
        };
        assert_eq!(message.role, expected, "index {index}");
    }
}

/// Backend that streams a markdown reply with a fenced code block.
struct MarkdownBackend;

#[async_trait::async_trait]
impl Backend for MarkdownBackend {
    async fn send(&self, _message: &str) -> Result<String> {
        unimplemented!("this test only streams")
    }

    async fn stream(&self, _message: &str) -> Result<TextStream> {
        let fragments: Vec<Result<String>> = [
            "# Greet",
            "ings\n\nHere is ",
            "some code:\n\n```rust\nfn ma",
            "in() {}\n``",
            "`\n\nDone.",
        ]
        .iter()
        .map(|fragment| Ok(fragment.to_string()))
        .collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}

#[tokio::test]
async fn markdown_rendering_is_display_only() {
    let mut session = ChatSession::new(MarkdownBackend);
    let mut renderer = MarkdownRenderer::with_color(true);

    session
        .send_streaming("show me code", &mut renderer)
        .await
        .unwrap();

    // The transcript stores the raw reply regardless of the renderer.
    let raw = "# Greetings\n\nHere is some code:\n\n```rust\nfn main() {}\n```\n\nDone.";
    assert_eq!(session.transcript().last().unwrap().content, raw);
}

#[tokio::test]
async fn live_whole_response() {
    // This test requires a running backend named by BANTER_ENDPOINT.
    let Ok(endpoint) = std::env::var("BANTER_ENDPOINT") else {
        eprintln!("Skipping live_whole_response: BANTER_ENDPOINT not set");
        return;
    };

    let client = ChatClient::new(Some(endpoint)).expect("Failed to create client");
    let response = ChatClient::send(&client, "Say hello").await;
    assert!(response.is_ok(), "Request should succeed: {response:?}");
}

#[tokio::test]
async fn live_streaming() {
    let Ok(endpoint) = std::env::var("BANTER_ENDPOINT") else {
        eprintln!("Skipping live_streaming: BANTER_ENDPOINT not set");
        return;
    };

    let client = ChatClient::new(Some(endpoint)).expect("Failed to create client");
    let stream = ChatClient::stream(&client, "Count to 3").await;
    assert!(stream.is_ok(), "Stream request should succeed");
}
