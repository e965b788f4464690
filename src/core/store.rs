//! In-memory session storage.
//!
//! Holds one record per session key: the resume text the persona is grounded
//! in plus the chat transcript. State lives for the process lifetime only;
//! a restart drops every transcript and any uploaded resume.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::conversation::Exchange;

/// Key of the session seeded from the configured resume file.
pub const PUBLIC_SESSION: &str = "public";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    NotFound(String),
}

/// One resume plus its conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub resume_text: String,
    pub uploaded_at: DateTime<Utc>,
    pub transcript: Vec<Exchange>,
    pub owner: String,
}

/// Process-wide session map. Transcripts are append-only during normal
/// operation; concurrent appends to the same key are last-writer-wins,
/// which is acceptable for best-effort conversational memory.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionRecord>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<SessionRecord> {
        self.sessions.get(key).map(|r| r.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sessions.contains_key(key)
    }

    /// Create or overwrite a record with an empty transcript.
    pub fn put(&self, key: impl Into<String>, resume_text: impl Into<String>, owner: impl Into<String>) {
        self.sessions.insert(
            key.into(),
            SessionRecord {
                resume_text: resume_text.into(),
                uploaded_at: Utc::now(),
                transcript: Vec::new(),
                owner: owner.into(),
            },
        );
    }

    pub fn append_exchange(
        &self,
        key: &str,
        user_message: &str,
        ai_response: &str,
    ) -> Result<(), StoreError> {
        let mut record = self
            .sessions
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        record
            .transcript
            .push(Exchange::new(user_message, ai_response));
        Ok(())
    }

    /// Empty the transcript in place; the resume text is kept.
    pub fn reset_transcript(&self, key: &str) -> Result<(), StoreError> {
        let mut record = self
            .sessions
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        record.transcript.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
