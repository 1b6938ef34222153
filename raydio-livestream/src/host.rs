// Owner of the single active playback session.

use std::sync::Arc;

use parking_lot::Mutex;
use raydio_core::platform::Notifier;
use raydio_core::{Config, RaydioSdk};
use tracing::info;

use crate::control::ControlBus;
use crate::error::SessionResult;
use crate::play_state::PlayStateContainer;
use crate::session::{EndReason, Session, SessionContext, SessionRequest};

/// Starts and stops playback sessions, keeping at most one alive
pub struct SessionHost {
    ctx: SessionContext,
    current: Mutex<Option<Session>>,
    // Serializes start/stop so a replaced session is fully gone first
    lifecycle: tokio::sync::Mutex<()>,
}

impl SessionHost {
    #[must_use]
    pub fn new(sdk: RaydioSdk, notifier: Arc<dyn Notifier>, config: &Config) -> Self {
        Self::with_context(SessionContext {
            sdk,
            notifier,
            play_state: PlayStateContainer::new(),
            control_bus: ControlBus::new(),
            session: config.session.clone(),
            notifications: config.notifications.clone(),
        })
    }

    #[must_use]
    pub fn with_context(ctx: SessionContext) -> Self {
        Self {
            ctx,
            current: Mutex::new(None),
            lifecycle: tokio::sync::Mutex::new(()),
        }
    }

    /// Start a session, ending the active one first.
    ///
    /// The previous session's watchers have finished before the new session
    /// starts, so the two never publish concurrently.
    pub async fn start(&self, request: SessionRequest) -> SessionResult<Session> {
        let _guard = self.lifecycle.lock().await;

        let previous = self.current.lock().take();
        if let Some(previous) = previous {
            info!(session_id = %previous.id(), "Replacing playback session");
            previous.stop_with(EndReason::Replaced);
            previous.join().await;
        }

        let session = Session::start(request, self.ctx.clone())?;
        *self.current.lock() = Some(session.clone());
        Ok(session)
    }

    /// Stop the active session. Returns false if none was running.
    pub async fn stop(&self) -> bool {
        let _guard = self.lifecycle.lock().await;

        let current = self.current.lock().take();
        let Some(session) = current else {
            return false;
        };
        let was_active = !session.is_terminated();
        session.stop();
        session.join().await;
        was_active
    }

    /// The active session, if it has not ended on its own
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.current
            .lock()
            .as_ref()
            .filter(|session| !session.is_terminated())
            .cloned()
    }

    #[must_use]
    pub fn play_state(&self) -> &PlayStateContainer {
        &self.ctx.play_state
    }

    #[must_use]
    pub fn control_bus(&self) -> &ControlBus {
        &self.ctx.control_bus
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raydio_core::memory::{InMemorySdk, RecordingNotifier};
    use raydio_core::models::{BroadcasterId, StreamId, UserId};

    fn request(stream: &str, broadcaster: &str) -> SessionRequest {
        SessionRequest {
            stream_id: Some(StreamId::from(stream)),
            broadcaster_id: Some(BroadcasterId::from(broadcaster)),
            title: Some("Match".to_string()),
            language: Some("English".to_string()),
        }
    }

    #[tokio::test]
    async fn test_start_replaces_previous_session() {
        let sdk = InMemorySdk::new(UserId::from("u1"));
        let host = SessionHost::new(
            sdk.sdk(),
            Arc::new(RecordingNotifier::new()),
            &Config::default(),
        );

        let first = host.start(request("s1", "b1")).await.unwrap();
        let second = host.start(request("s2", "b2")).await.unwrap();

        assert!(first.is_terminated());
        assert_eq!(first.end_reason(), Some(EndReason::Replaced));
        assert_eq!(host.current().map(|s| s.id().clone()), Some(second.id().clone()));
        assert_eq!(sdk.players.created(), 2);
    }

    #[tokio::test]
    async fn test_stop_when_idle() {
        let sdk = InMemorySdk::new(UserId::from("u1"));
        let host = SessionHost::new(
            sdk.sdk(),
            Arc::new(RecordingNotifier::new()),
            &Config::default(),
        );
        assert!(!host.stop().await);

        let session = host.start(request("s1", "b1")).await.unwrap();
        assert!(host.stop().await);
        assert!(session.is_terminated());
        assert!(host.current().is_none());
        assert!(!host.stop().await);
    }
}
