use serde::Serialize;

/// Which side lost its connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryCause {
    Client,
    Streamer,
}

/// Session-level state machine:
/// `Starting -> Active -> Recovering(..) -> Active | Terminated`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "cause", rename_all = "snake_case")]
pub enum SessionPhase {
    Starting,
    Active,
    Recovering(RecoveryCause),
    Terminated,
}

/// Mutable state of a running session, guarded by the session's transition lock
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecoveryFlags {
    pub(crate) started: bool,
    pub(crate) client_lost: bool,
    pub(crate) streamer_lost: bool,
    pub(crate) terminated: bool,
}

impl RecoveryFlags {
    pub(crate) const fn any_lost(&self) -> bool {
        self.client_lost || self.streamer_lost
    }

    /// Client loss dominates: nothing can be recovered on the streamer side
    /// while the client itself is offline.
    pub(crate) const fn phase(&self) -> SessionPhase {
        if self.terminated {
            SessionPhase::Terminated
        } else if !self.started {
            SessionPhase::Starting
        } else if self.client_lost {
            SessionPhase::Recovering(RecoveryCause::Client)
        } else if self.streamer_lost {
            SessionPhase::Recovering(RecoveryCause::Streamer)
        } else {
            SessionPhase::Active
        }
    }
}
