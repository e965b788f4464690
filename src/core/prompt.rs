//! Prompt assembly.
//!
//! Builds the ordered message list sent to the completion provider: persona
//! system prompt first, then a bounded window of prior exchanges, then the
//! new user message.

use crate::config::prompts::persona_prompt;
use crate::conversation::Message;

use super::store::SessionRecord;

/// Number of trailing exchanges carried as conversational context. Anything
/// older is dropped; the window is fixed, not configurable.
pub const CONTEXT_WINDOW: usize = 5;

/// Assemble the provider message list for one request.
///
/// The system prompt embeds the record's current resume text and is rebuilt
/// on every call. The last [`CONTEXT_WINDOW`] exchanges follow in
/// chronological order, one user and one assistant message each, and the new
/// message comes last. The caller validates the message is non-empty.
pub fn assemble(record: &SessionRecord, user_message: &str) -> Vec<Message> {
    let window_start = record.transcript.len().saturating_sub(CONTEXT_WINDOW);

    let mut messages = Vec::with_capacity(2 + 2 * CONTEXT_WINDOW);
    messages.push(Message::system(persona_prompt(&record.resume_text)));

    for exchange in &record.transcript[window_start..] {
        messages.push(Message::user(exchange.user_message.clone()));
        messages.push(Message::assistant(exchange.ai_response.clone()));
    }

    messages.push(Message::user(user_message));
    messages
}
