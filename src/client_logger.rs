//! Logging trait for chat client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to
//! capture and record all backend interactions passing through the
//! [`ChatClient`](crate::ChatClient), plus the stream adapter that feeds a
//! logger while fragments pass through to the caller.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;

use crate::error::Result;

/// A trait for logging chat client operations.
///
/// Implement this trait to capture and record backend interactions,
/// including both whole-response replies and individual stream fragments.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Mutex;
/// use banter::ClientLogger;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_reply(&self, reply: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "reply: {reply}").unwrap();
///     }
///
///     fn log_stream_fragment(&self, fragment: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "fragment: {fragment}").unwrap();
///     }
///
///     fn log_stream_reply(&self, reply: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "stream complete: {reply}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a complete reply from a whole-response `send` call.
    ///
    /// This method is called once per successful `send` call with the full
    /// reply text from the backend.
    fn log_reply(&self, reply: &str);

    /// Log an individual decoded stream fragment.
    ///
    /// This method is called for each text fragment decoded during a
    /// streaming request, in arrival order.
    fn log_stream_fragment(&self, fragment: &str);

    /// Log the concatenated reply from a completed stream.
    ///
    /// This method is called once when a stream drains, with the full
    /// reply text assembled from all fragments.
    fn log_stream_reply(&self, reply: &str);
}

/// A stream wrapper that feeds fragments to a [`ClientLogger`] while
/// passing them through unchanged.
///
/// Fragments are logged as they are polled; when the inner stream is fully
/// drained the concatenation of everything that passed through is logged
/// once as the stream's reply.
pub struct LoggingStream {
    inner: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
    logger: Arc<dyn ClientLogger>,
    accumulated: Option<String>,
}

impl LoggingStream {
    /// Wraps a fragment stream so that `logger` observes it.
    pub fn new<S>(stream: S, logger: Arc<dyn ClientLogger>) -> Self
    where
        S: Stream<Item = Result<String>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            logger,
            accumulated: Some(String::new()),
        }
    }
}

impl Stream for LoggingStream {
    type Item = Result<String>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            std::task::Poll::Ready(Some(Ok(fragment))) => {
                if let Some(accumulated) = self.accumulated.as_mut() {
                    accumulated.push_str(&fragment);
                    self.logger.log_stream_fragment(&fragment);
                }
                std::task::Poll::Ready(Some(Ok(fragment)))
            }
            std::task::Poll::Ready(Some(Err(e))) => std::task::Poll::Ready(Some(Err(e))),
            std::task::Poll::Ready(None) => {
                if let Some(accumulated) = self.accumulated.take() {
                    self.logger.log_stream_reply(&accumulated);
                }
                std::task::Poll::Ready(None)
            }
            std::task::Poll::Pending => std::task::Poll::Pending,
        }
    }
}
