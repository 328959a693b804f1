//! Streamed chat application with markdown rendering.
//!
//! This binary provides a REPL that streams replies like `banter-stream`
//! but renders them as markdown: inline styling line by line, fenced code
//! blocks emitted with syntax highlighting once their closing fence
//! arrives. The rendering is purely a display transform; the transcript
//! keeps the raw reply text.
//!
//! # Usage
//!
//! ```bash
//! # Talk to the development server on its default address
//! banter-markdown
//!
//! # Disable colors to see the raw markdown
//! banter-markdown --no-color
//! ```
//!
//! # Commands
//!
//! Slash commands are the same as `banter-chat`; type `/help` at the
//! prompt for the list.

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use banter::chat::{ChatArgs, ChatCommand, ChatConfig, ChatSession, help_text, parse_command};
use banter::{Backend, ChatClient, MarkdownRenderer, Renderer};

/// Main entry point for the banter-markdown application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("banter-markdown [OPTIONS]");
    let config = ChatConfig::from(args);

    let client = ChatClient::with_options(config.endpoint.clone(), config.timeout)?;
    println!("banter markdown (backend: {})", client.base_url());
    println!("Type /help for commands, /quit to exit\n");

    let mut session = ChatSession::new(client);
    let mut renderer = MarkdownRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    if handle_command(cmd, &mut session, &mut renderer) {
                        break;
                    }
                    continue;
                }

                println!("Assistant:");
                if let Err(e) = session.send_streaming(line, &mut renderer).await {
                    renderer.print_error(&e.to_string());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at the prompt - drop the current line
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {err}"));
                break;
            }
        }
    }

    Ok(())
}

/// Handles a parsed slash command. Returns true when the application
/// should exit.
fn handle_command<B: Backend>(
    cmd: ChatCommand,
    session: &mut ChatSession<B>,
    renderer: &mut dyn Renderer,
) -> bool {
    match cmd {
        ChatCommand::Quit => {
            println!("Goodbye!");
            return true;
        }
        ChatCommand::Clear => {
            session.clear();
            renderer.print_info("Conversation cleared.");
        }
        ChatCommand::Help => {
            for line in help_text().lines() {
                println!("    {line}");
            }
        }
        ChatCommand::Stats => {
            let stats = session.stats();
            println!("    Session Statistics:");
            println!("      Messages: {}", stats.message_count);
            println!("      Turns: {}", stats.turn_count);
        }
        ChatCommand::SaveTranscript(path) => match session.save_transcript_to(&path) {
            Ok(_) => renderer.print_info(&format!("Transcript saved to {path}")),
            Err(err) => renderer.print_error(&format!("Failed to save transcript: {err}")),
        },
        ChatCommand::LoadTranscript(path) => match session.load_transcript_from(&path) {
            Ok(_) => renderer.print_info(&format!("Transcript loaded from {path}")),
            Err(err) => renderer.print_error(&format!("Failed to load transcript: {err}")),
        },
        ChatCommand::Invalid(message) => {
            renderer.print_error(&message);
        }
    }
    false
}
