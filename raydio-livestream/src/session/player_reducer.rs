// Maps the SDK player's states onto the externally visible play state.

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use raydio_core::models::{PlayState, PlayerState, StreamId};
use tracing::debug;

use super::{EndReason, SessionShared};

/// What a player state change means for the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlayerAction {
    /// Nothing to publish
    Ignore,
    /// Publish a new play state (`None` = nothing playing)
    Publish(Option<PlayState>),
    /// Unrecoverable player failure
    Terminate,
}

/// `Closed` is ambiguous between "stopped on purpose" and "stopped because a
/// connection was lost"; while a connection is being recovered the stream is
/// still shown as connecting.
pub(crate) fn reduce(
    state: &PlayerState,
    connection_lost: bool,
    session_stream: &StreamId,
) -> PlayerAction {
    match state {
        PlayerState::New => PlayerAction::Ignore,
        PlayerState::Connecting(id) | PlayerState::Disconnected(id) => {
            PlayerAction::Publish(Some(PlayState::Connecting(id.clone())))
        }
        PlayerState::Playing(id) => PlayerAction::Publish(Some(PlayState::Playing(id.clone()))),
        PlayerState::Failed => PlayerAction::Terminate,
        PlayerState::Closed if connection_lost => {
            PlayerAction::Publish(Some(PlayState::Connecting(session_stream.clone())))
        }
        PlayerState::Closed => PlayerAction::Publish(None),
    }
}

pub(crate) async fn watch_player(
    session: Arc<SessionShared>,
    mut states: BoxStream<'static, PlayerState>,
) {
    loop {
        let state = tokio::select! {
            biased;
            () = session.cancel.cancelled() => break,
            next = states.next() => match next {
                Some(state) => state,
                None => break,
            },
        };

        debug!(?state, "Player state changed");
        if session.apply_player_state(&state) == PlayerAction::Terminate {
            session.teardown(EndReason::PlayerFailed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> StreamId {
        StreamId::from(s)
    }

    #[test]
    fn test_reduce_table() {
        let session = id("s0");

        assert_eq!(reduce(&PlayerState::New, false, &session), PlayerAction::Ignore);
        assert_eq!(
            reduce(&PlayerState::Connecting(id("s1")), false, &session),
            PlayerAction::Publish(Some(PlayState::Connecting(id("s1"))))
        );
        assert_eq!(
            reduce(&PlayerState::Playing(id("s1")), false, &session),
            PlayerAction::Publish(Some(PlayState::Playing(id("s1"))))
        );
        assert_eq!(
            reduce(&PlayerState::Disconnected(id("s1")), false, &session),
            PlayerAction::Publish(Some(PlayState::Connecting(id("s1"))))
        );
        assert_eq!(reduce(&PlayerState::Failed, false, &session), PlayerAction::Terminate);
        assert_eq!(reduce(&PlayerState::Failed, true, &session), PlayerAction::Terminate);
    }

    #[test]
    fn test_closed_depends_on_connection_loss() {
        let session = id("s0");
        assert_eq!(
            reduce(&PlayerState::Closed, false, &session),
            PlayerAction::Publish(None)
        );
        assert_eq!(
            reduce(&PlayerState::Closed, true, &session),
            PlayerAction::Publish(Some(PlayState::Connecting(id("s0"))))
        );
    }
}
