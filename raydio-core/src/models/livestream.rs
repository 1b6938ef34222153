use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{BroadcasterId, StreamId};

/// Language a livestream is commentated in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    /// ISO 639-1 code, e.g. "de"
    pub code: String,
    /// Name of the language in the language itself, e.g. "Deutsch"
    pub native: String,
}

impl Language {
    #[must_use]
    pub fn new(code: impl Into<String>, native: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            native: native.into(),
        }
    }
}

/// A single audio broadcast, owned by a broadcaster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Livestream {
    pub id: StreamId,
    pub broadcaster_id: BroadcasterId,
    pub title: String,
    pub language: Language,
    pub started_at: DateTime<Utc>,
}

/// Livestreams sharing a title, differing by language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivestreamGroup {
    pub title: String,
    pub livestreams: Vec<Livestream>,
}

impl LivestreamGroup {
    #[must_use]
    pub fn contains_stream(&self, stream_id: &StreamId) -> bool {
        self.livestreams.iter().any(|l| &l.id == stream_id)
    }

    #[must_use]
    pub fn find_broadcaster(&self, broadcaster_id: &BroadcasterId) -> Option<&Livestream> {
        self.livestreams
            .iter()
            .find(|l| &l.broadcaster_id == broadcaster_id)
    }
}

/// Group livestreams by title, keeping first-seen order of titles.
#[must_use]
pub fn group_by_title(livestreams: impl IntoIterator<Item = Livestream>) -> Vec<LivestreamGroup> {
    let mut groups: Vec<LivestreamGroup> = Vec::new();
    for livestream in livestreams {
        match groups.iter_mut().find(|g| g.title == livestream.title) {
            Some(group) => group.livestreams.push(livestream),
            None => groups.push(LivestreamGroup {
                title: livestream.title.clone(),
                livestreams: vec![livestream],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(id: &str, broadcaster: &str, title: &str, lang: &str) -> Livestream {
        Livestream {
            id: StreamId::from(id),
            broadcaster_id: BroadcasterId::from(broadcaster),
            title: title.to_string(),
            language: Language::new(lang, lang),
            started_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_by_title() {
        let groups = group_by_title(vec![
            stream("s1", "b1", "Final", "de"),
            stream("s2", "b2", "Semi", "en"),
            stream("s3", "b3", "Final", "fr"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Final");
        assert_eq!(groups[0].livestreams.len(), 2);
        assert_eq!(groups[1].title, "Semi");
        assert!(groups[0].contains_stream(&StreamId::from("s3")));
        assert!(!groups[1].contains_stream(&StreamId::from("s3")));
    }

    #[test]
    fn test_find_broadcaster() {
        let groups = group_by_title(vec![stream("s1", "b1", "Final", "de")]);
        let found = groups[0].find_broadcaster(&BroadcasterId::from("b1"));
        assert_eq!(found.map(|l| l.id.as_str()), Some("s1"));
        assert!(groups[0].find_broadcaster(&BroadcasterId::from("b9")).is_none());
    }
}
