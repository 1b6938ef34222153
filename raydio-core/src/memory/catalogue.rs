use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use crate::models::{group_by_title, BroadcasterId, Livestream, LivestreamGroup};
use crate::sdk::{LivestreamGroupContainer, LivestreamLoader};

/// Livestream catalogue backing both the loader and the group container.
///
/// `remote` is what the server currently knows; `loaded` is what the client
/// has seen. Live updates reach both, `load()` copies remote into loaded.
#[derive(Debug)]
pub struct InMemoryCatalogue {
    remote: Mutex<Vec<Livestream>>,
    loaded: watch::Sender<Vec<Livestream>>,
    load_results: Mutex<VecDeque<bool>>,
    load_count: AtomicUsize,
}

impl InMemoryCatalogue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            remote: Mutex::new(Vec::new()),
            loaded: watch::Sender::new(Vec::new()),
            load_results: Mutex::new(VecDeque::new()),
            load_count: AtomicUsize::new(0),
        }
    }

    /// A broadcaster starts (or replaces) their livestream; pushed to clients
    pub fn go_live(&self, livestream: Livestream) {
        info!(
            broadcaster_id = %livestream.broadcaster_id,
            stream_id = %livestream.id,
            "Livestream went live"
        );
        upsert(&mut self.remote.lock(), livestream.clone());
        self.loaded.send_modify(|loaded| upsert(loaded, livestream));
    }

    /// A broadcaster's livestream ends; pushed to clients
    pub fn end(&self, broadcaster_id: &BroadcasterId) {
        info!(%broadcaster_id, "Livestream ended");
        self.remote
            .lock()
            .retain(|l| &l.broadcaster_id != broadcaster_id);
        self.loaded.send_if_modified(|loaded| {
            let before = loaded.len();
            loaded.retain(|l| &l.broadcaster_id != broadcaster_id);
            loaded.len() != before
        });
    }

    /// Replace the server-side catalogue without notifying clients,
    /// e.g. changes that happened while the client was offline
    pub fn set_remote(&self, livestreams: Vec<Livestream>) {
        *self.remote.lock() = livestreams;
    }

    /// Queue the results of the next `load` calls
    pub fn script_load(&self, results: impl IntoIterator<Item = bool>) {
        self.load_results.lock().extend(results);
    }

    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    pub fn loaded(&self) -> Vec<Livestream> {
        self.loaded.borrow().clone()
    }
}

impl Default for InMemoryCatalogue {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert(livestreams: &mut Vec<Livestream>, livestream: Livestream) {
    match livestreams
        .iter_mut()
        .find(|l| l.broadcaster_id == livestream.broadcaster_id)
    {
        Some(existing) => *existing = livestream,
        None => livestreams.push(livestream),
    }
}

#[async_trait]
impl LivestreamLoader for InMemoryCatalogue {
    async fn load(&self) -> bool {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        let success = self.load_results.lock().pop_front().unwrap_or(true);
        if success {
            let remote = self.remote.lock().clone();
            debug!(count = remote.len(), "Loaded active livestreams");
            self.loaded.send_replace(remote);
        } else {
            debug!("Loading active livestreams failed");
        }
        success
    }
}

impl LivestreamGroupContainer for InMemoryCatalogue {
    fn online(&self) -> BoxStream<'static, Vec<LivestreamGroup>> {
        WatchStream::new(self.loaded.subscribe())
            .map(group_by_title)
            .boxed()
    }

    fn find(&self, broadcaster_id: &BroadcasterId) -> BoxStream<'static, Option<Livestream>> {
        let broadcaster_id = broadcaster_id.clone();
        WatchStream::new(self.loaded.subscribe())
            .map(move |loaded| {
                loaded
                    .into_iter()
                    .find(|l| l.broadcaster_id == broadcaster_id)
            })
            .scan(None::<Option<Livestream>>, |last, current| {
                let changed = last.as_ref() != Some(&current);
                if changed {
                    *last = Some(current.clone());
                }
                future::ready(Some(changed.then_some(current)))
            })
            .filter_map(future::ready)
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Language, StreamId};
    use chrono::Utc;

    fn livestream(id: &str, broadcaster: &str) -> Livestream {
        Livestream {
            id: StreamId::from(id),
            broadcaster_id: BroadcasterId::from(broadcaster),
            title: "Final".to_string(),
            language: Language::new("de", "Deutsch"),
            started_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_load_copies_remote() {
        let catalogue = InMemoryCatalogue::new();
        catalogue.set_remote(vec![livestream("s1", "b1")]);
        assert!(catalogue.loaded().is_empty());

        assert!(catalogue.load().await);
        assert_eq!(catalogue.loaded().len(), 1);

        catalogue.script_load([false]);
        catalogue.set_remote(Vec::new());
        assert!(!catalogue.load().await);
        assert_eq!(catalogue.loaded().len(), 1);
        assert_eq!(catalogue.load_count(), 2);
    }

    #[tokio::test]
    async fn test_find_skips_unchanged_values() {
        let catalogue = InMemoryCatalogue::new();
        catalogue.go_live(livestream("s1", "b1"));

        let mut found = catalogue.find(&BroadcasterId::from("b1"));
        assert_eq!(found.next().await.flatten().map(|l| l.id), Some(StreamId::from("s1")));

        // Another broadcaster does not produce an emission for b1
        catalogue.go_live(livestream("s2", "b2"));
        catalogue.end(&BroadcasterId::from("b1"));
        assert_eq!(found.next().await, Some(None));

        catalogue.go_live(livestream("s3", "b1"));
        assert_eq!(found.next().await.flatten().map(|l| l.id), Some(StreamId::from("s3")));
    }

    #[tokio::test]
    async fn test_online_groups_by_title() {
        let catalogue = InMemoryCatalogue::new();
        catalogue.go_live(livestream("s1", "b1"));
        catalogue.go_live(livestream("s2", "b2"));

        let groups = catalogue.online().next().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].livestreams.len(), 2);
    }
}
