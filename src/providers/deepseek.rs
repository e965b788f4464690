//! DeepSeek completion client (OpenAI-compatible chat completions).
//!
//! Two modes: `complete_buffered` waits for the whole response and maps
//! provider degradation to canned apology text, raising only transport
//! timeouts and connection failures so the retry policy can act on them.
//! `complete_streaming` re-emits the provider's SSE feed as text fragments
//! and never errors: failures become one canned fragment that ends the
//! stream.

use std::time::Duration;

use async_stream::stream;
use futures::{Stream, TryStreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::config::API_KEY_PLACEHOLDER;
use crate::conversation::{Message, Role};

use super::ProviderError;

const MODEL: &str = "deepseek-chat";
const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.9;
const FREQUENCY_PENALTY: f32 = 0.1;
const PRESENCE_PENALTY: f32 = 0.1;
const MAX_TOKENS: u32 = 1500;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// Degraded-provider responses. These are returned as successful completions
// and recorded in the transcript like any other assistant turn.
pub const NOT_CONFIGURED_TEXT: &str =
    "I apologize, but the AI service is not properly configured. Please check the API key settings.";
pub const NO_CONTENT_TEXT: &str =
    "I apologize, but I couldn't generate a proper response. Please try again.";
pub const AUTH_ISSUE_TEXT: &str =
    "I apologize, but there's an authentication issue. Please check the API key configuration.";
pub const RATE_LIMIT_TEXT: &str =
    "I apologize, but the service is currently experiencing high demand. Please try again in a moment.";
pub const UNEXPECTED_TEXT: &str =
    "I apologize, but I encountered an unexpected error. Please try again.";
pub const STREAM_TIMEOUT_TEXT: &str =
    "I apologize, but the request timed out. Please try again.";
pub const STREAM_CONNECTION_TEXT: &str =
    "I apologize, but there was a connection error. Please check your internet connection and try again.";

pub fn technical_difficulties(status: u16) -> String {
    format!(
        "I apologize, but I'm experiencing technical difficulties (Error {status}). Please try again."
    )
}

#[derive(Debug, Clone, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: &'static str,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let kind = if err.is_timeout() {
        std::io::ErrorKind::TimedOut
    } else {
        std::io::ErrorKind::Interrupted
    };
    std::io::Error::new(kind, err)
}

/// Map a reqwest failure on the buffered path: timeouts and connection
/// failures are raised for the retry policy, anything else degrades to
/// canned text.
fn transport_failure(err: reqwest::Error) -> Result<String, ProviderError> {
    if err.is_timeout() {
        tracing::error!("Provider request timed out");
        Err(ProviderError::Timeout(err))
    } else if err.is_connect() {
        tracing::error!("Provider connection failed");
        Err(ProviderError::Connection(err))
    } else {
        tracing::error!("Unexpected provider transport error: {err}");
        Ok(UNEXPECTED_TEXT.to_string())
    }
}

/// Client for the DeepSeek chat completions endpoint. Stateless beyond the
/// pooled HTTP connection; cheap to clone.
#[derive(Clone)]
pub struct CompletionClient {
    http: Client,
    api_url: String,
    api_key: Option<String>,
}

impl CompletionClient {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            api_url: api_url.into(),
            api_key,
        }
    }

    /// True when a usable (non-placeholder) API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|k| !k.is_empty() && k != API_KEY_PLACEHOLDER)
    }

    fn request_payload(&self, messages: &[Message], stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: MODEL,
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
            frequency_penalty: FREQUENCY_PENALTY,
            presence_penalty: PRESENCE_PENALTY,
            stream,
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }

    /// Send the full message list and wait for the complete response.
    ///
    /// Non-200 statuses and empty payloads degrade to canned text rather
    /// than failing; only transport timeouts and connection errors are
    /// returned as errors.
    pub async fn complete_buffered(&self, messages: &[Message]) -> Result<String, ProviderError> {
        if !self.is_configured() {
            tracing::error!("DeepSeek API key not configured properly");
            return Ok(NOT_CONFIGURED_TEXT.to_string());
        }

        let payload = self.request_payload(messages, false);
        tracing::debug!("Requesting completion with {} messages", messages.len());

        let request = self
            .authorized(self.http.post(&self.api_url))
            .header("Accept", "application/json")
            .json(&payload);

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => return transport_failure(err),
        };

        let status = response.status();
        tracing::debug!("Provider response status: {status}");

        match status {
            StatusCode::OK => {
                let body = match response.text().await {
                    Ok(body) => body,
                    Err(err) => return transport_failure(err),
                };
                let completion: CompletionResponse = match serde_json::from_str(&body) {
                    Ok(completion) => completion,
                    Err(err) => {
                        tracing::error!("Unparseable completion body: {err}");
                        return Ok(NO_CONTENT_TEXT.to_string());
                    }
                };
                match completion
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message)
                    .and_then(|m| m.content)
                {
                    Some(content) if !content.is_empty() => {
                        tracing::debug!("Completion received: {} characters", content.len());
                        Ok(content)
                    }
                    _ => {
                        tracing::error!("No choices in completion response");
                        Ok(NO_CONTENT_TEXT.to_string())
                    }
                }
            }
            StatusCode::UNAUTHORIZED => {
                tracing::error!("Provider rejected the API key");
                Ok(AUTH_ISSUE_TEXT.to_string())
            }
            StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!("Provider rate limit exceeded");
                Ok(RATE_LIMIT_TEXT.to_string())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::error!("Provider error {status}: {body}");
                Ok(technical_difficulties(status.as_u16()))
            }
        }
    }

    /// Stream the completion as text fragments.
    ///
    /// Lazy, finite and non-restartable. Unlike the buffered path this never
    /// errors: any failure yields one canned explanatory fragment and ends
    /// the stream. Malformed event lines are skipped without aborting.
    pub fn complete_streaming(
        &self,
        messages: &[Message],
    ) -> impl Stream<Item = String> + Send + 'static {
        let client = self.clone();
        let payload = self.request_payload(messages, true);
        let message_count = messages.len();

        stream! {
            if !client.is_configured() {
                tracing::error!("DeepSeek API key not configured properly");
                yield NOT_CONFIGURED_TEXT.to_string();
                return;
            }

            tracing::debug!("Requesting streaming completion with {message_count} messages");

            let request = client
                .authorized(client.http.post(&client.api_url))
                .header("Accept", "text/event-stream")
                .json(&payload);

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) if err.is_timeout() => {
                    tracing::error!("Streaming request timed out");
                    yield STREAM_TIMEOUT_TEXT.to_string();
                    return;
                }
                Err(err) if err.is_connect() => {
                    tracing::error!("Streaming connection failed");
                    yield STREAM_CONNECTION_TEXT.to_string();
                    return;
                }
                Err(err) => {
                    tracing::error!("Unexpected streaming transport error: {err}");
                    yield UNEXPECTED_TEXT.to_string();
                    return;
                }
            };

            let status = response.status();
            tracing::debug!("Streaming response status: {status}");

            match status {
                StatusCode::OK => {}
                StatusCode::UNAUTHORIZED => {
                    tracing::error!("Provider rejected the API key");
                    yield AUTH_ISSUE_TEXT.to_string();
                    return;
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    tracing::warn!("Provider rate limit exceeded");
                    yield RATE_LIMIT_TEXT.to_string();
                    return;
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    tracing::error!("Provider error {status}: {body}");
                    yield technical_difficulties(status.as_u16());
                    return;
                }
            }

            let reader = StreamReader::new(Box::pin(response.bytes_stream().map_err(convert_err)));
            let mut lines = reader.lines();

            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(err) => {
                        tracing::error!("Stream interrupted: {err}");
                        let text = if err.kind() == std::io::ErrorKind::TimedOut {
                            STREAM_TIMEOUT_TEXT
                        } else {
                            STREAM_CONNECTION_TEXT
                        };
                        yield text.to_string();
                        break;
                    }
                };

                let Some(data) = line.trim().strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data == "[DONE]" {
                    break;
                }

                // Malformed fragments are skipped, not fatal.
                let chunk: StreamChunk = match serde_json::from_str(data) {
                    Ok(chunk) => chunk,
                    Err(_) => continue,
                };
                if let Some(content) = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                {
                    if !content.is_empty() {
                        yield content;
                    }
                }
            }
        }
    }

    /// Minimal connectivity check used by the health endpoint.
    pub async fn probe(&self) -> String {
        if !self.is_configured() {
            return "not_configured".to_string();
        }

        let payload = json!({
            "model": MODEL,
            "messages": [
                {"role": "system", "content": "You are a test assistant."},
                {"role": "user", "content": "Say 'API test successful' in exactly 3 words."}
            ],
            "max_tokens": 10
        });

        let request = self
            .authorized(self.http.post(&self.api_url))
            .timeout(PROBE_TIMEOUT)
            .json(&payload);

        match request.send().await {
            Ok(response) if response.status() == StatusCode::OK => "success".to_string(),
            Ok(response) => format!("failed_{}", response.status().as_u16()),
            Err(err) => {
                let msg: String = err.to_string().chars().take(50).collect();
                format!("error_{msg}")
            }
        }
    }
}
