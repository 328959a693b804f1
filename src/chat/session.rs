//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the transcript
//! and dispatches user input to the backend in either response mode.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};

use crate::client::Backend;
use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::transcript::{Message, Transcript};

/// Result of a submit call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The input was dispatched to the backend and the reply applied.
    Sent,

    /// The input was empty or whitespace and was silently ignored.
    Ignored,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The number of messages in the transcript.
    pub message_count: usize,

    /// The number of turns dispatched to the backend.
    pub turn_count: u64,
}

/// A chat session that owns the transcript and backend interactions.
///
/// The session is the single top-level component: it accepts user input,
/// appends the turn's user/assistant pair, issues exactly one backend call
/// per submit, and reveals the reply through a [`Renderer`].
///
/// Overlapping submits are unrepresentable: both submit methods borrow the
/// session mutably, so a second submit cannot begin while one is awaiting.
pub struct ChatSession<B: Backend> {
    backend: B,
    transcript: Transcript,
    turn_count: u64,
}

impl<B: Backend> ChatSession<B> {
    /// Creates a new chat session over the given backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            transcript: Transcript::new(),
            turn_count: 0,
        }
    }

    /// Sends a user message and awaits the whole reply.
    ///
    /// This method:
    /// 1. Appends the user message and an empty assistant message
    /// 2. Issues one request to the whole-response endpoint
    /// 3. Applies the reply to the assistant message in one mutation
    /// 4. Renders the complete reply
    ///
    /// Blank input is a silent no-op. On failure the turn's pair stays in
    /// the transcript with the assistant message empty, and the error is
    /// returned for the caller to render.
    pub async fn send(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<SubmitOutcome> {
        let Some(input) = prepare_input(user_input) else {
            return Ok(SubmitOutcome::Ignored);
        };

        self.transcript.begin_turn(input);
        self.turn_count += 1;

        let reply = self.backend.send(input).await?;
        self.transcript.set_reply(reply.as_str());
        renderer.print_text(&reply);
        renderer.finish_response();
        Ok(SubmitOutcome::Sent)
    }

    /// Sends a user message and streams the reply.
    ///
    /// For each decoded fragment the assistant message is extended (its
    /// content is the accumulator, so after every fragment it holds the
    /// full reply so far) and the fragment is forwarded to the renderer.
    /// The loop ends when the backend closes the stream.
    ///
    /// Blank input is a silent no-op. On failure the turn's pair stays in
    /// the transcript with whatever content had accumulated.
    pub async fn send_streaming(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<SubmitOutcome> {
        let Some(input) = prepare_input(user_input) else {
            return Ok(SubmitOutcome::Ignored);
        };

        self.transcript.begin_turn(input);
        self.turn_count += 1;

        let mut stream = self.backend.stream(input).await?;
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            self.transcript.append_to_reply(&fragment);
            renderer.print_text(&fragment);
        }
        renderer.finish_response();
        Ok(SubmitOutcome::Sent)
    }

    /// Returns the transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the number of messages in the transcript.
    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    /// Clears the transcript.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            message_count: self.transcript.len(),
            turn_count: self.turn_count,
        }
    }

    /// Saves the transcript to the specified path.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile::new(self.transcript.messages());
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &transcript).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })
    }

    /// Loads a transcript from disk, replacing the current transcript.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the file's messages violate the
    /// user/assistant alternation invariant.
    pub fn load_transcript_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::open(path.as_ref())
            .map_err(|err| Error::io("failed to open transcript file", err))?;
        let reader = BufReader::new(file);
        let transcript: TranscriptFile = from_reader(reader).map_err(|err| {
            Error::serialization("failed to parse transcript", Some(Box::new(err)))
        })?;
        self.transcript = Transcript::from_messages(transcript.messages)?;
        Ok(())
    }
}

/// Trims input and rejects blank submissions.
fn prepare_input(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

#[derive(Serialize, Deserialize)]
struct TranscriptFile {
    version: u8,
    messages: Vec<Message>,
}

impl TranscriptFile {
    fn new(messages: &[Message]) -> Self {
        Self {
            version: 1,
            messages: messages.to_vec(),
        }
    }
}
