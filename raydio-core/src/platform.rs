//! Host platform contracts: notifications and package-local control intents.

use serde::{Deserialize, Serialize};

/// Fixed identifiers of the notifications posted by a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationId {
    /// Title and language of the playing livestream (foreground notification)
    Livestream,
    ClientConnectionLost,
    StreamerConnectionLost,
}

impl NotificationId {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Livestream => 1,
            Self::ClientConnectionLost => 2,
            Self::StreamerConnectionLost => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Importance {
    None,
    Low,
    Default,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockscreenVisibility {
    Public,
    Private,
    Secret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub lockscreen_visibility: LockscreenVisibility,
}

/// A broadcast-style intent scoped to one package
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlIntent {
    pub action: String,
    pub package: String,
}

impl ControlIntent {
    /// Action suffix of the intent that stops the running playback session
    pub const STOP_LISTEN: &'static str = "STOP_LISTEN";

    /// Fully qualified stop-listen action for a package
    #[must_use]
    pub fn stop_listen_action(package: &str) -> String {
        format!("{package}.{}", Self::STOP_LISTEN)
    }

    #[must_use]
    pub fn stop_listen(package: &str) -> Self {
        Self {
            action: Self::stop_listen_action(package),
            package: package.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
    pub intent: ControlIntent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub channel_id: String,
    pub title: String,
    pub text: String,
    pub actions: Vec<NotificationAction>,
}

/// Posts and removes notifications on the host platform
pub trait Notifier: Send + Sync {
    /// Whether the user granted permission to post notifications
    fn has_post_permission(&self) -> bool;

    /// Register the channel. Returns the channel id notifications must use,
    /// which is empty on hosts without channel support.
    fn create_channel(&self, channel: &NotificationChannel) -> String;

    fn notify(&self, id: NotificationId, notification: Notification);

    /// Remove a notification. Cancelling one that is not shown is a no-op.
    fn cancel(&self, id: NotificationId);

    /// Promote the session to the foreground with the given notification
    fn start_foreground(&self, id: NotificationId, notification: Notification);

    /// Leave the foreground and remove the foreground notification
    fn stop_foreground(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_codes() {
        assert_eq!(NotificationId::Livestream.code(), 1);
        assert_eq!(NotificationId::ClientConnectionLost.code(), 2);
        assert_eq!(NotificationId::StreamerConnectionLost.code(), 3);
    }

    #[test]
    fn test_stop_listen_intent() {
        let intent = ControlIntent::stop_listen("de.mycrocast.raydio.uefa.example");
        assert_eq!(intent.action, "de.mycrocast.raydio.uefa.example.STOP_LISTEN");
        assert_eq!(intent.package, "de.mycrocast.raydio.uefa.example");
    }
}
