// Current play state, shared between the playback session and list screens.

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use raydio_core::models::{PlayState, StreamId};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

/// Holds and adjusts the current play state.
///
/// `None` whenever nothing is connecting nor playing, which is also the
/// initial value.
#[derive(Debug, Clone)]
pub struct PlayStateContainer {
    state: Arc<watch::Sender<Option<PlayState>>>,
}

impl PlayStateContainer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(None)),
        }
    }

    pub fn on_connect(&self, stream_id: &StreamId) {
        self.set(Some(PlayState::Connecting(stream_id.clone())));
    }

    pub fn on_play(&self, stream_id: &StreamId) {
        self.set(Some(PlayState::Playing(stream_id.clone())));
    }

    /// A dropped audio connection is shown as connecting again
    pub fn on_disconnect(&self, stream_id: &StreamId) {
        self.set(Some(PlayState::Connecting(stream_id.clone())));
    }

    pub fn on_stop(&self) {
        self.set(None);
    }

    #[must_use]
    pub fn current(&self) -> Option<PlayState> {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<PlayState>> {
        self.state.subscribe()
    }

    /// Current value followed by every change
    #[must_use]
    pub fn stream(&self) -> BoxStream<'static, Option<PlayState>> {
        WatchStream::new(self.state.subscribe()).boxed()
    }

    fn set(&self, new_state: Option<PlayState>) {
        self.state.send_if_modified(|current| {
            if *current == new_state {
                return false;
            }
            debug!(from = ?current, to = ?new_state, "Play state changed");
            *current = new_state;
            true
        });
    }
}

impl Default for PlayStateContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let container = PlayStateContainer::new();
        let id = StreamId::from("s1");
        assert_eq!(container.current(), None);

        container.on_connect(&id);
        assert_eq!(container.current(), Some(PlayState::Connecting(id.clone())));

        container.on_play(&id);
        assert_eq!(container.current(), Some(PlayState::Playing(id.clone())));

        container.on_disconnect(&id);
        assert_eq!(container.current(), Some(PlayState::Connecting(id.clone())));

        container.on_stop();
        assert_eq!(container.current(), None);
    }

    #[tokio::test]
    async fn test_repeated_value_not_broadcast() {
        let container = PlayStateContainer::new();
        let rx = container.subscribe();

        container.on_stop();
        assert!(!rx.has_changed().unwrap());

        container.on_play(&StreamId::from("s1"));
        assert!(rx.has_changed().unwrap());
    }
}
