// raydio-livestream - Playback of a single Raydio livestream
//
// - session/     - Playback session coordinator (connection, presence and
//                  player watchers, grace timer, teardown)
// - host         - Keeps at most one session alive
// - play_state   - Current play state shared with the list screen
// - notification - Notification content and channel
// - control      - Package-local control intents (stop listening)
// - list, router - Livestream list and connection screen state

pub mod control;
pub mod error;
pub mod host;
pub mod list;
pub mod notification;
pub mod play_state;
pub mod router;
pub mod session;

// Re-exports for convenience
pub use control::{ControlBus, ControlRegistration, IntentFilter};
pub use error::{SessionError, SessionResult};
pub use host::SessionHost;
pub use list::{BottomSheetState, ListUiState, LivestreamListModel};
pub use play_state::PlayStateContainer;
pub use router::{route, Screen, ScreenRouter};
pub use session::{
    EndReason, RecoveryCause, Session, SessionContext, SessionDiagnostics, SessionPhase,
    SessionRequest,
};
