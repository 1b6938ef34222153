//! Contracts of the Raydio SDK collaborators.
//!
//! The SDK owns the transport, the livestream catalogue and the audio
//! pipeline; this crate only consumes it through these traits. State streams
//! are replayable: a new subscriber first receives the current value, then
//! every change.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::models::{
    BroadcasterId, ConnectionState, Livestream, LivestreamGroup, PlayerState, StreamId,
};

/// Connection of the client to the Raydio server
#[async_trait]
pub trait RaydioConnection: Send + Sync {
    /// Current state followed by every transition
    fn state(&self) -> BoxStream<'static, ConnectionState>;

    fn current_state(&self) -> ConnectionState;

    /// Establish the initial connection. Returns false on failure.
    async fn connect(&self) -> bool;

    /// Re-establish a lost connection. Returns false on failure.
    async fn reconnect(&self) -> bool;
}

/// Loads the currently active livestreams into the backing container
#[async_trait]
pub trait LivestreamLoader: Send + Sync {
    /// Refresh the container. Returns false if loading failed.
    async fn load(&self) -> bool;
}

/// Holds the loaded livestreams, grouped by title
pub trait LivestreamGroupContainer: Send + Sync {
    /// All currently online groups
    fn online(&self) -> BoxStream<'static, Vec<LivestreamGroup>>;

    /// The livestream of a broadcaster, `None` while the broadcaster is not live.
    ///
    /// Consecutive equal values are not repeated.
    fn find(&self, broadcaster_id: &BroadcasterId) -> BoxStream<'static, Option<Livestream>>;
}

/// Plays the audio broadcast of a livestream
pub trait LivestreamPlayer: Send + Sync {
    fn play(&self, stream_id: &StreamId);

    /// Stop playing. Stopping an idle player is a no-op.
    fn stop(&self);

    /// Current player state followed by every transition
    fn state(&self) -> BoxStream<'static, PlayerState>;
}

/// Creates a player per playback session
pub trait PlayerFactory: Send + Sync {
    fn create(&self) -> Arc<dyn LivestreamPlayer>;
}

/// Bundle of all SDK entry points, as handed out by the SDK builder
#[derive(Clone)]
pub struct RaydioSdk {
    pub connection: Arc<dyn RaydioConnection>,
    pub livestream_loader: Arc<dyn LivestreamLoader>,
    pub livestream_group_container: Arc<dyn LivestreamGroupContainer>,
    pub livestream_player_factory: Arc<dyn PlayerFactory>,
}

impl std::fmt::Debug for RaydioSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaydioSdk")
            .field("connection", &self.connection.current_state())
            .finish_non_exhaustive()
    }
}
