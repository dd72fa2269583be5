// Event types for async communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One decoded application event from the `/generate` stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// An incremental fragment of the post body
    Text { content: String },
    /// Generation finished successfully
    Done,
    /// Terminal failure reported by the server
    Error { content: String },
}

impl Event {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a session's background task reports back to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Event(Event),
    /// The request failed before or while streaming
    TransportFailed(String),
    /// The byte stream ended without a `done` or `error` event
    StreamClosed,
    /// No chunk arrived within the idle timeout
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMessage {
    pub session: SessionId,
    pub update: SessionUpdate,
}
