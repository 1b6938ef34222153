// Playback session coordinator
//
// Keeps one livestream playback consistent while three external signals
// change independently:
// - connection_watcher  - client connection to the raydio server
// - presence_watcher    - whether the broadcaster is still live
// - player_reducer      - the SDK player's own state machine
//
// Every flag transition together with its notification and player side
// effects happens under one transition lock, so watchers running on
// different threads never interleave halfway through a transition. Teardown
// takes the same lock, marks the session terminated, and cancels all
// watcher tasks; nothing runs a side effect after that.

mod connection_watcher;
mod grace_timer;
mod player_reducer;
mod presence_watcher;
mod recovery;

pub use recovery::{RecoveryCause, SessionPhase};

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use raydio_core::config::{NotificationConfig, SessionConfig};
use raydio_core::models::{BroadcasterId, Livestream, PlayState, PlayerState, SessionId, StreamId};
use raydio_core::platform::{NotificationId, Notifier};
use raydio_core::sdk::{LivestreamPlayer, RaydioSdk};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Instrument};

use crate::control::{ControlBus, ControlRegistration, IntentFilter};
use crate::error::{SessionError, SessionResult};
use crate::notification::{notification_channel, LivestreamNotificationBuilder};
use crate::play_state::PlayStateContainer;

use grace_timer::GraceTimer;
use player_reducer::PlayerAction;
use recovery::RecoveryFlags;

/// Everything a session needs from its surroundings
#[derive(Clone)]
pub struct SessionContext {
    pub sdk: RaydioSdk,
    pub notifier: Arc<dyn Notifier>,
    pub play_state: PlayStateContainer,
    pub control_bus: ControlBus,
    pub session: SessionConfig,
    pub notifications: NotificationConfig,
}

/// Parameters of a session start request.
///
/// Fields are optional because requests may come from an untyped source;
/// missing ids make the request invalid, missing display fields default to
/// empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub stream_id: Option<StreamId>,
    pub broadcaster_id: Option<BroadcasterId>,
    pub title: Option<String>,
    pub language: Option<String>,
}

impl SessionRequest {
    #[must_use]
    pub fn for_livestream(livestream: &Livestream) -> Self {
        Self {
            stream_id: Some(livestream.id.clone()),
            broadcaster_id: Some(livestream.broadcaster_id.clone()),
            title: Some(livestream.title.clone()),
            language: Some(livestream.language.native.clone()),
        }
    }

    /// Decode a start bundle, e.g. `{"stream_id": "s1", "broadcaster_id": "b1"}`.
    /// Unknown keys are ignored.
    pub fn from_json(bundle: &str) -> SessionResult<Self> {
        serde_json::from_str(bundle)
            .map_err(raydio_core::Error::from)
            .map_err(SessionError::from)
    }

    fn validate(self) -> SessionResult<ValidRequest> {
        let stream_id = self
            .stream_id
            .filter(|id| !id.as_str().is_empty())
            .ok_or_else(|| SessionError::InvalidRequest("missing stream id".to_string()))?;
        let broadcaster_id = self
            .broadcaster_id
            .filter(|id| !id.as_str().is_empty())
            .ok_or_else(|| SessionError::InvalidRequest("missing broadcaster id".to_string()))?;

        Ok(ValidRequest {
            stream_id,
            broadcaster_id,
            title: self.title.unwrap_or_default(),
            language: self.language.unwrap_or_default(),
        })
    }
}

struct ValidRequest {
    stream_id: StreamId,
    broadcaster_id: BroadcasterId,
    title: String,
    language: String,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Explicit stop request from the owner of the session
    Stopped,
    /// Stop-listen control intent (e.g. the notification button)
    StopIntent,
    /// A new session replaced this one
    Replaced,
    /// The streamer did not come back within the grace period
    StreamerGone,
    /// Refreshing the catalogue after a reconnect failed
    RefreshFailed,
    /// The livestream was still missing after a reconnect
    LivestreamMissing,
    /// The player reported an unrecoverable failure
    PlayerFailed,
}

/// Counters exposed for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionDiagnostics {
    pub grace_timer_starts: usize,
    pub grace_timer_cancellations: usize,
    pub grace_timer_pending: bool,
}

struct Snapshot {
    title: String,
    language: String,
}

struct SessionState {
    flags: RecoveryFlags,
    end_reason: Option<EndReason>,
    snapshot: Snapshot,
    control: Option<ControlRegistration>,
}

pub(crate) struct SessionShared {
    id: SessionId,
    stream_id: StreamId,
    broadcaster_id: BroadcasterId,
    ctx: SessionContext,
    player: Arc<dyn LivestreamPlayer>,
    notifications: LivestreamNotificationBuilder,
    grace_timer: GraceTimer,
    cancel: CancellationToken,
    state: Mutex<SessionState>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionShared {
    fn can_notify(&self) -> bool {
        self.ctx.notifier.has_post_permission()
    }

    fn is_client_lost(&self) -> bool {
        self.state.lock().flags.client_lost
    }

    /// Returns false if the loss was already known or the session ended
    fn mark_client_lost(&self) -> bool {
        let mut state = self.state.lock();
        if state.flags.terminated || state.flags.client_lost {
            return false;
        }
        state.flags.client_lost = true;

        if self.can_notify() {
            self.ctx.notifier.notify(
                NotificationId::ClientConnectionLost,
                self.notifications.client_connection_lost(),
            );
        }
        self.player.stop();
        true
    }

    fn clear_client_lost(&self) {
        let mut state = self.state.lock();
        if state.flags.terminated || !state.flags.client_lost {
            return;
        }
        state.flags.client_lost = false;
        self.ctx.notifier.cancel(NotificationId::ClientConnectionLost);
    }

    /// Pause playback and arm the grace timer. Returns false if the loss
    /// was already known or the session ended.
    fn mark_streamer_lost(self: &Arc<Self>) -> bool {
        let mut state = self.state.lock();
        if state.flags.terminated || state.flags.streamer_lost {
            return false;
        }
        state.flags.streamer_lost = true;

        self.player.stop();
        if self.can_notify() {
            self.ctx.notifier.notify(
                NotificationId::StreamerConnectionLost,
                self.notifications.streamer_connection_lost(),
            );
        }

        let session = Arc::downgrade(self);
        self.grace_timer.start(
            self.ctx.session.streamer_grace_period(),
            &self.cancel,
            move || {
                if let Some(session) = session.upgrade() {
                    session.teardown(EndReason::StreamerGone);
                }
            },
        );
        true
    }

    /// Returns false unless the streamer was lost before
    fn streamer_returned(&self, livestream: &Livestream) -> bool {
        let mut state = self.state.lock();
        if state.flags.terminated || !state.flags.streamer_lost {
            return false;
        }
        self.clear_streamer_lost(&mut state);
        self.player.play(&livestream.id);
        true
    }

    fn clear_streamer_lost(&self, state: &mut SessionState) {
        state.flags.streamer_lost = false;
        self.grace_timer.cancel();
        self.ctx.notifier.cancel(NotificationId::StreamerConnectionLost);
    }

    /// Resume playback after the client reconnected
    fn resume(&self, livestream: &Livestream) {
        let mut state = self.state.lock();
        if state.flags.terminated {
            return;
        }
        if state.flags.streamer_lost {
            self.clear_streamer_lost(&mut state);
        }
        self.player.play(&livestream.id);
    }

    /// Refresh the livestream notification with new title/language
    fn update_livestream(&self, livestream: &Livestream) {
        let mut state = self.state.lock();
        if state.flags.terminated {
            return;
        }
        state.snapshot = Snapshot {
            title: livestream.title.clone(),
            language: livestream.language.native.clone(),
        };

        if self.can_notify() {
            self.ctx.notifier.notify(
                NotificationId::Livestream,
                self.notifications
                    .livestream(&state.snapshot.title, &state.snapshot.language),
            );
        }
    }

    fn apply_player_state(&self, player_state: &PlayerState) -> PlayerAction {
        let state = self.state.lock();
        if state.flags.terminated {
            return PlayerAction::Ignore;
        }

        let action = player_reducer::reduce(player_state, state.flags.any_lost(), &self.stream_id);
        if let PlayerAction::Publish(play_state) = &action {
            let container = &self.ctx.play_state;
            match play_state {
                Some(PlayState::Connecting(id)) => container.on_connect(id),
                Some(PlayState::Playing(id)) => container.on_play(id),
                None => container.on_stop(),
            }
        }
        action
    }

    /// End the session. Only the first call has an effect.
    fn teardown(&self, reason: EndReason) {
        {
            let mut state = self.state.lock();
            if state.flags.terminated {
                debug!(?reason, "Session already terminated");
                return;
            }
            state.flags.terminated = true;
            state.end_reason = Some(reason);
            info!(?reason, "Ending playback session");

            let notifier = &self.ctx.notifier;
            notifier.cancel(NotificationId::ClientConnectionLost);
            notifier.cancel(NotificationId::StreamerConnectionLost);
            notifier.stop_foreground();

            if let Some(control) = state.control.take() {
                control.unregister();
            }

            self.player.stop();
            self.ctx.play_state.on_stop();
            self.grace_timer.cancel();
        }
        self.cancel.cancel();
    }
}

/// Handle to a running (or ended) playback session
#[derive(Clone)]
pub struct Session {
    shared: Arc<SessionShared>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.shared.id)
            .field("stream_id", &self.shared.stream_id)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start playing the requested livestream.
    ///
    /// Must be called from within a tokio runtime. An invalid request
    /// releases the platform resources a session would hold and fails.
    pub fn start(request: SessionRequest, ctx: SessionContext) -> SessionResult<Self> {
        let channel_id = ctx
            .notifier
            .create_channel(&notification_channel(&ctx.notifications));

        let request = match request.validate() {
            Ok(request) => request,
            Err(e) => {
                ctx.notifier.cancel(NotificationId::ClientConnectionLost);
                ctx.notifier.cancel(NotificationId::StreamerConnectionLost);
                ctx.notifier.stop_foreground();
                return Err(e);
            }
        };

        let notifications =
            LivestreamNotificationBuilder::new(channel_id, ctx.notifications.package_name.clone());
        let player = ctx.sdk.livestream_player_factory.create();
        let id = SessionId::new();

        let shared = Arc::new(SessionShared {
            id: id.clone(),
            stream_id: request.stream_id.clone(),
            broadcaster_id: request.broadcaster_id.clone(),
            ctx,
            player,
            notifications,
            grace_timer: GraceTimer::new(),
            cancel: CancellationToken::new(),
            state: Mutex::new(SessionState {
                flags: RecoveryFlags::default(),
                end_reason: None,
                snapshot: Snapshot {
                    title: request.title.clone(),
                    language: request.language.clone(),
                },
                control: None,
            }),
            tasks: Mutex::new(Vec::new()),
        });

        let weak: Weak<SessionShared> = Arc::downgrade(&shared);
        let registration = shared.ctx.control_bus.register(
            IntentFilter::stop_listen(&shared.ctx.notifications.package_name),
            move |_| {
                if let Some(session) = weak.upgrade() {
                    info!("Stop listen intent received");
                    session.teardown(EndReason::StopIntent);
                }
            },
        );
        shared.state.lock().control = Some(registration);

        let span = tracing::info_span!(
            "session",
            session_id = %id,
            stream_id = %request.stream_id,
            broadcaster_id = %request.broadcaster_id,
        );

        let connection_states = shared.ctx.sdk.connection.state();
        let livestreams = shared
            .ctx
            .sdk
            .livestream_group_container
            .find(&request.broadcaster_id);
        let player_states = shared.player.state();

        {
            let mut tasks = shared.tasks.lock();
            tasks.push(tokio::spawn(
                connection_watcher::watch_connection(Arc::clone(&shared), connection_states)
                    .instrument(span.clone()),
            ));
            tasks.push(tokio::spawn(
                presence_watcher::watch_presence(Arc::clone(&shared), livestreams)
                    .instrument(span.clone()),
            ));
            tasks.push(tokio::spawn(
                player_reducer::watch_player(Arc::clone(&shared), player_states)
                    .instrument(span.clone()),
            ));
        }

        shared.player.play(&request.stream_id);
        shared.ctx.notifier.start_foreground(
            NotificationId::Livestream,
            shared
                .notifications
                .livestream(&request.title, &request.language),
        );

        {
            let mut state = shared.state.lock();
            if !state.flags.terminated {
                state.flags.started = true;
            }
        }

        span.in_scope(|| info!("Playback session started"));
        Ok(Self { shared })
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.shared.id
    }

    /// Livestream the session was started with
    #[must_use]
    pub fn stream_id(&self) -> &StreamId {
        &self.shared.stream_id
    }

    #[must_use]
    pub fn broadcaster_id(&self) -> &BroadcasterId {
        &self.shared.broadcaster_id
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.shared.state.lock().flags.phase()
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.shared.state.lock().flags.terminated
    }

    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.shared.state.lock().end_reason
    }

    /// Title and language currently shown in the livestream notification
    #[must_use]
    pub fn display_info(&self) -> (String, String) {
        let state = self.shared.state.lock();
        (state.snapshot.title.clone(), state.snapshot.language.clone())
    }

    #[must_use]
    pub fn diagnostics(&self) -> SessionDiagnostics {
        let timer = &self.shared.grace_timer;
        SessionDiagnostics {
            grace_timer_starts: timer.starts(),
            grace_timer_cancellations: timer.cancellations(),
            grace_timer_pending: timer.is_pending(),
        }
    }

    /// Stop the session. Safe to call any number of times.
    pub fn stop(&self) {
        self.shared.teardown(EndReason::Stopped);
    }

    pub(crate) fn stop_with(&self, reason: EndReason) {
        self.shared.teardown(reason);
    }

    /// Resolves once the session has ended, for whatever reason
    pub async fn terminated(&self) {
        self.shared.cancel.cancelled().await;
    }

    /// Wait for all watcher tasks to finish. Call after the session ended.
    pub async fn join(&self) {
        let tasks: Vec<_> = std::mem::take(&mut *self.shared.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::error!(session_id = %self.shared.id, "Session watcher panicked: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raydio_core::memory::{InMemorySdk, RecordingNotifier};
    use raydio_core::models::UserId;

    fn context() -> (InMemorySdk, Arc<RecordingNotifier>, SessionContext) {
        let sdk = InMemorySdk::new(UserId::from("u1"));
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = SessionContext {
            sdk: sdk.sdk(),
            notifier: notifier.clone(),
            play_state: PlayStateContainer::new(),
            control_bus: ControlBus::new(),
            session: SessionConfig::default(),
            notifications: NotificationConfig::default(),
        };
        (sdk, notifier, ctx)
    }

    #[test]
    fn test_request_validation() {
        let request = SessionRequest {
            stream_id: Some(StreamId::from("s1")),
            broadcaster_id: None,
            ..SessionRequest::default()
        };
        assert!(matches!(request.validate(), Err(SessionError::InvalidRequest(_))));

        let request = SessionRequest {
            stream_id: Some(StreamId::from("")),
            broadcaster_id: Some(BroadcasterId::from("b1")),
            ..SessionRequest::default()
        };
        assert!(request.validate().is_err());

        let request = SessionRequest {
            stream_id: Some(StreamId::from("s1")),
            broadcaster_id: Some(BroadcasterId::from("b1")),
            ..SessionRequest::default()
        };
        let valid = request.validate().unwrap();
        assert_eq!(valid.title, "");
        assert_eq!(valid.language, "");
    }

    #[test]
    fn test_request_from_bundle() {
        let request =
            SessionRequest::from_json(r#"{"stream_id": "s1", "broadcaster_id": "b1", "extra": 1}"#)
                .unwrap();
        assert_eq!(request.stream_id, Some(StreamId::from("s1")));
        assert_eq!(request.title, None);

        let result = SessionRequest::from_json("not json");
        assert!(matches!(
            result,
            Err(SessionError::Core(raydio_core::Error::Serialization(_)))
        ));
    }

    #[tokio::test]
    async fn test_invalid_request_releases_platform() {
        let (sdk, notifier, ctx) = context();
        let result = Session::start(SessionRequest::default(), ctx);

        assert!(matches!(result, Err(SessionError::InvalidRequest(_))));
        assert_eq!(sdk.players.created(), 0);
        assert!(notifier
            .events()
            .contains(&raydio_core::memory::NotifierEvent::StopForeground));
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        let (sdk, notifier, ctx) = context();
        let play_state = ctx.play_state.clone();
        let request = SessionRequest {
            stream_id: Some(StreamId::from("s1")),
            broadcaster_id: Some(BroadcasterId::from("b1")),
            title: Some("Final".to_string()),
            language: Some("Deutsch".to_string()),
        };

        let session = Session::start(request, ctx).unwrap();
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(notifier.foreground(), Some(NotificationId::Livestream));

        session.stop();
        let events_after_first = notifier.events().len();
        session.stop();
        session.stop_with(EndReason::PlayerFailed);

        session.terminated().await;
        session.join().await;

        assert_eq!(notifier.events().len(), events_after_first);
        assert_eq!(session.phase(), SessionPhase::Terminated);
        assert_eq!(session.end_reason(), Some(EndReason::Stopped));
        assert_eq!(play_state.current(), None);
        assert_eq!(notifier.foreground(), None);
        assert_eq!(
            sdk.players.last().unwrap().current(),
            PlayerState::Closed
        );
    }
}
