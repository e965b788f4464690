//! Core chat-session relay: session storage, prompt assembly and the relay
//! that ties them to the completion provider.

pub mod prompt;
pub mod relay;
pub mod store;

pub use relay::{ChatRelay, RelayError, RelayEvent};
pub use store::{SessionRecord, SessionStore, StoreError};
