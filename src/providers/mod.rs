//! Completion provider integration

pub mod deepseek;
pub mod retry;

use thiserror::Error;

/// Transport-level failures surfaced to the retry policy.
///
/// Provider-level degradation (bad status codes, empty payloads) is not an
/// error: the client converts it to canned apology text so the relay can
/// treat it as a normal, recordable exchange.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("Connection failed")]
    Connection(#[source] reqwest::Error),
}

impl ProviderError {
    /// Whether the retry policy should attempt the call again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connection(_))
    }
}
