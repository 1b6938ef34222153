// State behind the livestream list screen.
//
// Mirrors the online livestream groups and the current play state into a
// single UI state, and turns user clicks into session host calls.

use std::sync::Arc;

use futures::stream::StreamExt;
use raydio_core::models::{Livestream, LivestreamGroup, PlayState};
use raydio_core::sdk::LivestreamLoader;
use raydio_core::RaydioSdk;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SessionResult;
use crate::host::SessionHost;
use crate::session::{Session, SessionRequest};

/// Bottom sheet for picking a livestream (language) of a group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "group", rename_all = "snake_case")]
pub enum BottomSheetState {
    #[default]
    Hide,
    Show(LivestreamGroup),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListUiState {
    /// Initial load is running
    pub is_loading: bool,
    /// User-triggered reload is running
    pub is_refreshing: bool,
    pub play_state: Option<PlayState>,
    pub groups: Vec<LivestreamGroup>,
    pub bottom_sheet: BottomSheetState,
}

impl ListUiState {
    /// Livestream at `index` counted across all groups, with its group
    pub fn livestream_at(
        &self,
        index: usize,
    ) -> raydio_core::Result<(&LivestreamGroup, &Livestream)> {
        self.groups
            .iter()
            .flat_map(|group| group.livestreams.iter().map(move |l| (group, l)))
            .nth(index)
            .ok_or_else(|| raydio_core::Error::NotFound(format!("livestream #{index}")))
    }
}

pub struct LivestreamListModel {
    loader: Arc<dyn LivestreamLoader>,
    host: Arc<SessionHost>,
    ui: Arc<watch::Sender<ListUiState>>,
    cancel: CancellationToken,
}

impl LivestreamListModel {
    /// Start following groups and play state, and run the initial load.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(sdk: &RaydioSdk, host: Arc<SessionHost>) -> Self {
        let ui = Arc::new(watch::Sender::new(ListUiState::default()));
        let cancel = CancellationToken::new();

        let mut groups = sdk.livestream_group_container.online();
        let groups_ui = Arc::clone(&ui);
        let token = cancel.clone();
        tokio::spawn(async move {
            loop {
                let online = tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    next = groups.next() => match next {
                        Some(online) => online,
                        None => break,
                    },
                };
                groups_ui.send_modify(|state| apply_groups(state, online));
            }
        });

        let loader = Arc::clone(&sdk.livestream_loader);
        let load_ui = Arc::clone(&ui);
        let token = cancel.clone();
        tokio::spawn(async move {
            load_ui.send_modify(|state| state.is_loading = true);
            let loaded = tokio::select! {
                biased;
                () = token.cancelled() => return,
                loaded = loader.load() => loaded,
            };
            if !loaded {
                warn!("Initial livestream load failed");
            }
            load_ui.send_modify(|state| state.is_loading = false);
        });

        let mut play_states = host.play_state().stream();
        let play_ui = Arc::clone(&ui);
        let token = cancel.clone();
        tokio::spawn(async move {
            loop {
                let play_state = tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    next = play_states.next() => match next {
                        Some(play_state) => play_state,
                        None => break,
                    },
                };
                play_ui.send_if_modified(|state| {
                    if state.play_state == play_state {
                        return false;
                    }
                    state.play_state = play_state;
                    true
                });
            }
        });

        Self {
            loader: Arc::clone(&sdk.livestream_loader),
            host,
            ui,
            cancel,
        }
    }

    #[must_use]
    pub fn ui_state(&self) -> ListUiState {
        self.ui.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListUiState> {
        self.ui.subscribe()
    }

    /// Reload the active livestreams. Returns whether loading succeeded.
    pub async fn refresh(&self) -> bool {
        self.ui.send_modify(|state| state.is_refreshing = true);
        let loaded = self.loader.load().await;
        if !loaded {
            warn!("Refreshing livestreams failed");
        }
        self.ui.send_modify(|state| state.is_refreshing = false);
        loaded
    }

    /// Clicking the group that is currently playing stops playback,
    /// any other group opens the bottom sheet.
    pub async fn on_group_clicked(&self, group: &LivestreamGroup) {
        let playing_here = self
            .ui
            .borrow()
            .play_state
            .as_ref()
            .is_some_and(|play_state| group.contains_stream(play_state.stream_id()));

        if playing_here {
            debug!(group = %group.title, "Stopping playback of clicked group");
            self.host.stop().await;
            return;
        }

        self.ui
            .send_modify(|state| state.bottom_sheet = BottomSheetState::Show(group.clone()));
    }

    pub fn on_bottom_sheet_dismissed(&self) {
        self.ui
            .send_modify(|state| state.bottom_sheet = BottomSheetState::Hide);
    }

    /// Start playing the selected livestream, ending any current session
    pub async fn on_livestream_clicked(&self, livestream: &Livestream) -> SessionResult<Session> {
        self.host
            .start(SessionRequest::for_livestream(livestream))
            .await
    }
}

impl Drop for LivestreamListModel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// A shown bottom sheet follows its group by title and hides once the
/// group is gone.
fn apply_groups(state: &mut ListUiState, online: Vec<LivestreamGroup>) {
    let bottom_sheet = match &state.bottom_sheet {
        BottomSheetState::Show(shown) => online
            .iter()
            .find(|group| group.title == shown.title)
            .cloned()
            .map_or(BottomSheetState::Hide, BottomSheetState::Show),
        BottomSheetState::Hide => BottomSheetState::Hide,
    };
    state.groups = online;
    state.bottom_sheet = bottom_sheet;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use raydio_core::models::{BroadcasterId, Language, StreamId};

    fn livestream(id: &str, title: &str) -> Livestream {
        Livestream {
            id: StreamId::from(id),
            broadcaster_id: BroadcasterId::from(format!("b-{id}").as_str()),
            title: title.to_string(),
            language: Language::new("de", "Deutsch"),
            started_at: Utc::now(),
        }
    }

    fn group(title: &str, ids: &[&str]) -> LivestreamGroup {
        LivestreamGroup {
            title: title.to_string(),
            livestreams: ids.iter().map(|id| livestream(id, title)).collect(),
        }
    }

    #[test]
    fn test_shown_group_follows_update() {
        let mut state = ListUiState {
            bottom_sheet: BottomSheetState::Show(group("Final", &["s1"])),
            ..ListUiState::default()
        };

        let updated = group("Final", &["s1", "s2"]);
        apply_groups(&mut state, vec![group("Semi", &["s3"]), updated.clone()]);
        assert_eq!(state.bottom_sheet, BottomSheetState::Show(updated));
        assert_eq!(state.groups.len(), 2);
    }

    #[test]
    fn test_shown_group_hidden_when_gone() {
        let mut state = ListUiState {
            bottom_sheet: BottomSheetState::Show(group("Final", &["s1"])),
            ..ListUiState::default()
        };

        apply_groups(&mut state, vec![group("Semi", &["s3"])]);
        assert_eq!(state.bottom_sheet, BottomSheetState::Hide);
    }

    #[test]
    fn test_livestream_at_counts_across_groups() {
        let state = ListUiState {
            groups: vec![group("Final", &["s1", "s2"]), group("Semi", &["s3"])],
            ..ListUiState::default()
        };

        let (group, livestream) = state.livestream_at(2).unwrap();
        assert_eq!(group.title, "Semi");
        assert_eq!(livestream.id, StreamId::from("s3"));
        assert!(matches!(
            state.livestream_at(3),
            Err(raydio_core::Error::NotFound(_))
        ));
    }

    #[test]
    fn test_hidden_sheet_stays_hidden() {
        let mut state = ListUiState::default();
        apply_groups(&mut state, vec![group("Final", &["s1"])]);
        assert_eq!(state.bottom_sheet, BottomSheetState::Hide);
    }
}
