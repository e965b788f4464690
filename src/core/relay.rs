//! Chat-session relay.
//!
//! Ties the session store, prompt assembler and completion client together:
//! validates the request, assembles model input from stored state, relays
//! the provider's output (buffered or incremental) and records the exchange.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde::Serialize;

use crate::config::Config;
use crate::providers::deepseek::CompletionClient;
use crate::providers::retry::with_retry;
use crate::providers::ProviderError;

use super::prompt;
use super::store::{SessionStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Please provide a message")]
    EmptyMessage,

    #[error("No active session. Please access the chat properly.")]
    SessionMissing,

    #[error("Failed to get AI response. Please check your internet connection and try again.")]
    ProviderUnreachable,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One step of the incremental relay, forwarded to the transport as-is.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelayEvent {
    Chunk { chunk: String },
    Complete { full_response: String },
    Error { error: String },
}

pub struct ChatRelay {
    store: Arc<SessionStore>,
    client: CompletionClient,
    retry_attempts: u32,
    retry_base: Duration,
}

impl ChatRelay {
    pub fn new(store: Arc<SessionStore>, client: CompletionClient, config: &Config) -> Self {
        Self {
            store,
            client,
            retry_attempts: config.retry_attempts,
            retry_base: config.retry_base,
        }
    }

    /// Buffered relay: one provider call (behind the retry policy), one
    /// response payload.
    ///
    /// Degraded provider text counts as a successful exchange and is
    /// recorded; only an unreachable provider (retries exhausted) errors,
    /// and then the transcript is left untouched.
    pub async fn chat(&self, session_key: &str, message: &str) -> Result<String, RelayError> {
        let record = self
            .store
            .get(session_key)
            .ok_or(RelayError::SessionMissing)?;

        let message = message.trim();
        if message.is_empty() {
            return Err(RelayError::EmptyMessage);
        }

        let messages = prompt::assemble(&record, message);

        let response = with_retry(
            self.retry_attempts,
            self.retry_base,
            ProviderError::is_transient,
            || self.client.complete_buffered(&messages),
        )
        .await;

        match response {
            Some(text) => {
                self.store.append_exchange(session_key, message, &text)?;
                Ok(text)
            }
            None => Err(RelayError::ProviderUnreachable),
        }
    }

    /// Incremental relay: validation happens up front so the endpoint can
    /// still reject bad requests, then the returned producer forwards each
    /// provider fragment as it arrives, records the exchange once the
    /// provider stream ends and emits one terminal event.
    pub fn chat_stream(
        &self,
        session_key: &str,
        message: &str,
    ) -> Result<impl Stream<Item = RelayEvent> + Send + 'static, RelayError> {
        let record = self
            .store
            .get(session_key)
            .ok_or(RelayError::SessionMissing)?;

        let message = message.trim().to_string();
        if message.is_empty() {
            return Err(RelayError::EmptyMessage);
        }

        let messages = prompt::assemble(&record, &message);
        let store = Arc::clone(&self.store);
        let client = self.client.clone();
        let session_key = session_key.to_string();

        Ok(stream! {
            let fragments = client.complete_streaming(&messages);
            futures::pin_mut!(fragments);

            let mut full_response = String::new();
            while let Some(fragment) = fragments.next().await {
                full_response.push_str(&fragment);
                yield RelayEvent::Chunk { chunk: fragment };
            }

            if !full_response.is_empty() {
                if let Err(err) = store.append_exchange(&session_key, &message, &full_response) {
                    tracing::error!("Failed to record streamed exchange: {err}");
                    yield RelayEvent::Error { error: err.to_string() };
                    return;
                }
            }

            yield RelayEvent::Complete { full_response };
        })
    }
}
