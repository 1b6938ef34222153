//! Notification content of a playback session.

use raydio_core::config::NotificationConfig;
use raydio_core::platform::{
    ControlIntent, Importance, LockscreenVisibility, Notification, NotificationAction,
    NotificationChannel,
};

/// Channel all session notifications are posted to
#[must_use]
pub fn notification_channel(config: &NotificationConfig) -> NotificationChannel {
    NotificationChannel {
        id: config.channel_id.clone(),
        name: config.channel_name.clone(),
        importance: Importance::None,
        lockscreen_visibility: LockscreenVisibility::Private,
    }
}

/// Builds the notifications shown while a livestream session runs
#[derive(Debug, Clone)]
pub struct LivestreamNotificationBuilder {
    channel_id: String,
    package_name: String,
}

impl LivestreamNotificationBuilder {
    /// `channel_id` is the id returned when registering the channel
    #[must_use]
    pub fn new(channel_id: String, package_name: String) -> Self {
        Self {
            channel_id,
            package_name,
        }
    }

    /// Title and language of the livestream, with a button to stop listening
    #[must_use]
    pub fn livestream(&self, title: &str, language: &str) -> Notification {
        Notification {
            channel_id: self.channel_id.clone(),
            title: title.to_string(),
            text: format!("Language: {language}"),
            actions: vec![NotificationAction {
                label: "Stop listen".to_string(),
                intent: ControlIntent::stop_listen(&self.package_name),
            }],
        }
    }

    /// The client lost its connection to the raydio server
    #[must_use]
    pub fn client_connection_lost(&self) -> Notification {
        Notification {
            channel_id: self.channel_id.clone(),
            title: "Client lost connection".to_string(),
            text: "Waiting for client to be reconnected.".to_string(),
            actions: Vec::new(),
        }
    }

    /// The streamer of the playing livestream lost their connection
    #[must_use]
    pub fn streamer_connection_lost(&self) -> Notification {
        Notification {
            channel_id: self.channel_id.clone(),
            title: "Streamer lost connection".to_string(),
            text: "Waiting for streamer to reconnect.".to_string(),
            actions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> LivestreamNotificationBuilder {
        LivestreamNotificationBuilder::new(
            "channel".to_string(),
            "de.mycrocast.raydio.uefa.example".to_string(),
        )
    }

    #[test]
    fn test_livestream_notification() {
        let notification = builder().livestream("Final", "Deutsch");
        assert_eq!(notification.channel_id, "channel");
        assert_eq!(notification.title, "Final");
        assert_eq!(notification.text, "Language: Deutsch");
        assert_eq!(notification.actions.len(), 1);
        assert_eq!(notification.actions[0].label, "Stop listen");
        assert_eq!(
            notification.actions[0].intent.action,
            "de.mycrocast.raydio.uefa.example.STOP_LISTEN"
        );
    }

    #[test]
    fn test_connection_lost_notifications_have_no_actions() {
        let client = builder().client_connection_lost();
        assert_eq!(client.title, "Client lost connection");
        assert!(client.actions.is_empty());

        let streamer = builder().streamer_connection_lost();
        assert_eq!(streamer.text, "Waiting for streamer to reconnect.");
        assert!(streamer.actions.is_empty());
    }

    #[test]
    fn test_channel_from_config() {
        let channel = notification_channel(&NotificationConfig::default());
        assert_eq!(channel.id, "raydio_livestream_listener_channel_id");
        assert_eq!(channel.importance, Importance::None);
        assert_eq!(channel.lockscreen_visibility, LockscreenVisibility::Private);
    }
}
