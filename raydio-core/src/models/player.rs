use serde::{Deserialize, Serialize};

use super::id::StreamId;

/// Lifecycle of the SDK livestream player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "stream_id", rename_all = "snake_case")]
pub enum PlayerState {
    /// Initial state, nothing requested yet
    New,
    Connecting(StreamId),
    Playing(StreamId),
    /// Audio connection dropped, the player is retrying on its own
    Disconnected(StreamId),
    /// Unrecoverable failure
    Failed,
    /// Playback was stopped
    Closed,
}

impl PlayerState {
    #[must_use]
    pub const fn stream_id(&self) -> Option<&StreamId> {
        match self {
            Self::Connecting(id) | Self::Playing(id) | Self::Disconnected(id) => Some(id),
            Self::New | Self::Failed | Self::Closed => None,
        }
    }
}
