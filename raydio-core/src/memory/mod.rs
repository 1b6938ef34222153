//! In-memory implementation of the SDK and platform contracts.
//!
//! Stands in for the real SDK in the demo binary and in tests.

pub mod catalogue;
pub mod connection;
pub mod notifier;
pub mod player;

use std::sync::Arc;
use std::time::Duration;

pub use catalogue::InMemoryCatalogue;
pub use connection::InMemoryConnection;
pub use notifier::{NotifierEvent, RecordingNotifier};
pub use player::{InMemoryPlayer, InMemoryPlayerFactory, PlayerCommand};

use crate::models::{ConnectionState, UserId};
use crate::sdk::RaydioSdk;

/// All in-memory SDK parts, keeping the concrete types for inspection
#[derive(Debug, Clone)]
pub struct InMemorySdk {
    pub connection: Arc<InMemoryConnection>,
    pub catalogue: Arc<InMemoryCatalogue>,
    pub players: Arc<InMemoryPlayerFactory>,
}

impl InMemorySdk {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self::builder(user_id).build()
    }

    #[must_use]
    pub fn builder(user_id: UserId) -> InMemorySdkBuilder {
        InMemorySdkBuilder {
            user_id,
            initial_state: ConnectionState::New,
            connect_delay: None,
        }
    }

    /// Type-erased view handed to the coordinator
    #[must_use]
    pub fn sdk(&self) -> RaydioSdk {
        RaydioSdk {
            connection: self.connection.clone(),
            livestream_loader: self.catalogue.clone(),
            livestream_group_container: self.catalogue.clone(),
            livestream_player_factory: self.players.clone(),
        }
    }
}

#[derive(Debug)]
pub struct InMemorySdkBuilder {
    user_id: UserId,
    initial_state: ConnectionState,
    connect_delay: Option<Duration>,
}

impl InMemorySdkBuilder {
    #[must_use]
    pub const fn initial_state(mut self, state: ConnectionState) -> Self {
        self.initial_state = state;
        self
    }

    /// Players move from connecting to playing after this delay
    #[must_use]
    pub const fn connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    #[must_use]
    pub fn build(self) -> InMemorySdk {
        InMemorySdk {
            connection: Arc::new(InMemoryConnection::with_state(self.initial_state)),
            catalogue: Arc::new(InMemoryCatalogue::new()),
            players: Arc::new(InMemoryPlayerFactory::new(self.user_id, self.connect_delay)),
        }
    }
}
