//! HTTP client for the chat backend.
//!
//! The backend exposes two endpoints sharing one request shape:
//!
//! - `POST /api/chat` with body `{"message": <text>}` returns
//!   `{"reply": <text>}` in one piece.
//! - `POST /api/chat-stream` with the same body returns an unframed byte
//!   stream whose decoded text, concatenated in arrival order, is the full
//!   reply.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client_logger::{ClientLogger, LoggingStream};
use crate::error::{Error, Result};
use crate::text_stream::{TextStream, decode_text};

/// Default backend address, matching the development server's default port.
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";

/// Path of the whole-response endpoint, relative to the base URL.
const CHAT_PATH: &str = "api/chat";

/// Path of the streaming endpoint, relative to the base URL.
const CHAT_STREAM_PATH: &str = "api/chat-stream";

/// Request body shared by both endpoints.
#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Response body of the whole-response endpoint.
#[derive(Debug, Clone, Deserialize)]
struct ChatReply {
    reply: String,
}

/// The transport seam between a chat session and the backend.
///
/// [`ChatClient`] is the HTTP implementation; tests drive sessions with
/// scripted implementations that never touch the network.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Sends a message and awaits the complete reply.
    async fn send(&self, message: &str) -> Result<String>;

    /// Sends a message and returns a stream of decoded reply fragments.
    async fn stream(&self, message: &str) -> Result<TextStream>;
}

/// Client for the chat backend.
#[derive(Clone)]
pub struct ChatClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl ChatClient {
    /// Create a new client for the given backend address.
    ///
    /// With `None` the client targets the development server's default
    /// address, `http://127.0.0.1:8000/`.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    ///
    /// A `timeout` of `None` (the default) places no bound on a request: a
    /// stream runs until the backend closes it.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {e}"),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attaches a logger that observes replies and stream fragments.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns the backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create and return default headers for backend requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Map a transport-level failure to our error type.
    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                self.timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Process backend response errors and convert to our error type.
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        // The backend is a FastAPI service; its error bodies carry a
        // `detail` field, either a string or a list of validation records.
        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<serde_json::Value>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.detail);
        let message = match detail {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => error_body,
        };

        match status_code {
            400 => Error::bad_request(message),
            404 => Error::not_found(message),
            408 => Error::timeout(message, None),
            422 => Error::validation(message, Some("message".to_string())),
            500 => Error::internal_server(message),
            502..=504 => Error::service_unavailable(message),
            _ => Error::api(status_code, message),
        }
    }

    /// Send a message and await the complete reply (whole-response mode).
    pub async fn send(&self, message: &str) -> Result<String> {
        let url = self.base_url.join(CHAT_PATH)?;

        let response = self
            .client
            .post(url)
            .headers(self.default_headers())
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let body: ChatReply = response.json().await.map_err(|e| {
            Error::serialization(format!("Failed to parse reply: {e}"), Some(Box::new(e)))
        })?;

        if let Some(logger) = &self.logger {
            logger.log_reply(&body.reply);
        }
        Ok(body.reply)
    }

    /// Send a message and stream the reply (streaming mode).
    ///
    /// Returns a stream of decoded text fragments that can be consumed
    /// incrementally. The stream is finite and non-restartable; it ends
    /// when the backend closes the response body.
    pub async fn stream(&self, message: &str) -> Result<TextStream> {
        let url = self.base_url.join(CHAT_STREAM_PATH)?;

        let mut headers = self.default_headers();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/plain"));

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let byte_stream = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
            })
        });

        let fragments = decode_text(byte_stream);
        match &self.logger {
            Some(logger) => Ok(Box::pin(LoggingStream::new(fragments, Arc::clone(logger)))),
            None => Ok(Box::pin(fragments)),
        }
    }
}

#[async_trait::async_trait]
impl Backend for ChatClient {
    async fn send(&self, message: &str) -> Result<String> {
        ChatClient::send(self, message).await
    }

    async fn stream(&self, message: &str) -> Result<TextStream> {
        ChatClient::stream(self, message).await
    }
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Parses and normalizes a backend base URL.
///
/// A missing trailing slash would make `Url::join` replace the last path
/// segment instead of appending, so one is added.
fn parse_base_url(base: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json, to_value};

    #[test]
    fn client_creation_defaults() {
        let client = ChatClient::new(None).unwrap();
        assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
        assert!(client.timeout.is_none());
    }

    #[test]
    fn client_creation_custom() {
        let client = ChatClient::with_options(
            Some("http://backend.example.com:9000/".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url().as_str(), "http://backend.example.com:9000/");
        assert_eq!(client.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = ChatClient::new(Some("http://localhost:8000".to_string())).unwrap();
        assert_eq!(
            client.base_url().join(CHAT_PATH).unwrap().as_str(),
            "http://localhost:8000/api/chat"
        );

        let client = ChatClient::new(Some("http://localhost:8000/v2".to_string())).unwrap();
        assert_eq!(
            client.base_url().join(CHAT_STREAM_PATH).unwrap().as_str(),
            "http://localhost:8000/v2/api/chat-stream"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ChatClient::new(Some("not a url".to_string())).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn request_body_shape() {
        let request = ChatRequest { message: "Hello!" };
        let json = to_value(&request).unwrap();
        assert_eq!(json, json!({"message": "Hello!"}));
    }

    #[test]
    fn reply_body_shape() {
        let reply: ChatReply = from_value(json!({"reply": "Hi."})).unwrap();
        assert_eq!(reply.reply, "Hi.");
    }

    #[test]
    fn reply_body_missing_field_fails() {
        let result: std::result::Result<ChatReply, _> = from_value(json!({"answer": "Hi."}));
        assert!(result.is_err());
    }
}
