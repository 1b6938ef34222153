use std::sync::Arc;
use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::info;

use crate::models::{PlayerState, StreamId, UserId};
use crate::sdk::{LivestreamPlayer, PlayerFactory};

/// Commands received by an [`InMemoryPlayer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    Play(StreamId),
    Stop,
}

/// Player that records commands and lets the caller drive its state.
///
/// With a connect delay configured, `play` moves from `Connecting` to
/// `Playing` on its own after the delay.
#[derive(Debug)]
pub struct InMemoryPlayer {
    user_id: UserId,
    state: Arc<watch::Sender<PlayerState>>,
    commands: Mutex<Vec<PlayerCommand>>,
    connect_delay: Option<Duration>,
}

impl InMemoryPlayer {
    #[must_use]
    pub fn new(user_id: UserId, connect_delay: Option<Duration>) -> Self {
        Self {
            user_id,
            state: Arc::new(watch::Sender::new(PlayerState::New)),
            commands: Mutex::new(Vec::new()),
            connect_delay,
        }
    }

    /// Force a player state, e.g. `Failed` or `Disconnected`
    pub fn emit(&self, state: PlayerState) {
        self.state.send_replace(state);
    }

    pub fn current(&self) -> PlayerState {
        self.state.borrow().clone()
    }

    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.commands.lock().clone()
    }

    pub fn play_count(&self) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|c| matches!(c, PlayerCommand::Play(_)))
            .count()
    }
}

impl LivestreamPlayer for InMemoryPlayer {
    fn play(&self, stream_id: &StreamId) {
        self.commands.lock().push(PlayerCommand::Play(stream_id.clone()));
        info!(
            user_id = %self.user_id,
            stream_id = %stream_id,
            "User starts playing livestream"
        );
        self.state.send_replace(PlayerState::Connecting(stream_id.clone()));

        let Some(delay) = self.connect_delay else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let state = Arc::clone(&self.state);
        let stream_id = stream_id.clone();
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            state.send_if_modified(|current| {
                if *current == PlayerState::Connecting(stream_id.clone()) {
                    *current = PlayerState::Playing(stream_id);
                    true
                } else {
                    false
                }
            });
        });
    }

    fn stop(&self) {
        self.commands.lock().push(PlayerCommand::Stop);
        let user_id = &self.user_id;
        self.state.send_if_modified(|current| {
            let Some(stream_id) = current.stream_id().cloned() else {
                return false;
            };
            info!(%user_id, %stream_id, "User stops playing livestream");
            *current = PlayerState::Closed;
            true
        });
    }

    fn state(&self) -> BoxStream<'static, PlayerState> {
        WatchStream::new(self.state.subscribe()).boxed()
    }
}

/// Creates [`InMemoryPlayer`]s and keeps them for inspection
#[derive(Debug)]
pub struct InMemoryPlayerFactory {
    user_id: UserId,
    connect_delay: Option<Duration>,
    players: Mutex<Vec<Arc<InMemoryPlayer>>>,
}

impl InMemoryPlayerFactory {
    #[must_use]
    pub fn new(user_id: UserId, connect_delay: Option<Duration>) -> Self {
        Self {
            user_id,
            connect_delay,
            players: Mutex::new(Vec::new()),
        }
    }

    /// The most recently created player
    pub fn last(&self) -> Option<Arc<InMemoryPlayer>> {
        self.players.lock().last().cloned()
    }

    pub fn created(&self) -> usize {
        self.players.lock().len()
    }
}

impl PlayerFactory for InMemoryPlayerFactory {
    fn create(&self) -> Arc<dyn LivestreamPlayer> {
        let player = Arc::new(InMemoryPlayer::new(self.user_id.clone(), self.connect_delay));
        self.players.lock().push(Arc::clone(&player));
        player
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_idle_player_is_noop() {
        let player = InMemoryPlayer::new(UserId::from("u1"), None);
        player.stop();
        assert_eq!(player.current(), PlayerState::New);
        assert_eq!(player.commands(), vec![PlayerCommand::Stop]);
    }

    #[tokio::test]
    async fn test_play_then_stop() {
        let player = InMemoryPlayer::new(UserId::from("u1"), None);
        player.play(&StreamId::from("s1"));
        assert_eq!(player.current(), PlayerState::Connecting(StreamId::from("s1")));

        player.stop();
        assert_eq!(player.current(), PlayerState::Closed);
        assert_eq!(player.play_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_delay_moves_to_playing() {
        let player = InMemoryPlayer::new(UserId::from("u1"), Some(Duration::from_millis(300)));
        let mut states = player.state();
        assert_eq!(states.next().await, Some(PlayerState::New));

        player.play(&StreamId::from("s1"));
        assert_eq!(states.next().await, Some(PlayerState::Connecting(StreamId::from("s1"))));
        assert_eq!(states.next().await, Some(PlayerState::Playing(StreamId::from("s1"))));
    }
}
