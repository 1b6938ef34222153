use serde::{Deserialize, Serialize};

use super::id::StreamId;

/// Simplified play state visible to the rest of the application.
///
/// `None` (as `Option<PlayState>`) means nothing is connecting nor playing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "stream_id", rename_all = "snake_case")]
pub enum PlayState {
    /// Establishing (or re-establishing) the audio connection
    Connecting(StreamId),
    Playing(StreamId),
}

impl PlayState {
    #[must_use]
    pub const fn stream_id(&self) -> &StreamId {
        match self {
            Self::Connecting(id) | Self::Playing(id) => id,
        }
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        matches!(self, Self::Playing(_))
    }
}
