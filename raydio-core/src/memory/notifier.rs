use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::platform::{Notification, NotificationChannel, NotificationId, Notifier};

/// Calls received by a [`RecordingNotifier`], in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierEvent {
    ChannelCreated(String),
    Notify(NotificationId, Notification),
    Cancel(NotificationId),
    StartForeground(NotificationId, Notification),
    StopForeground,
}

/// Notifier that keeps every call and the set of visible notifications
#[derive(Debug)]
pub struct RecordingNotifier {
    permission: AtomicBool,
    supports_channels: bool,
    events: Mutex<Vec<NotifierEvent>>,
    visible: Mutex<HashMap<NotificationId, Notification>>,
    foreground: Mutex<Option<NotificationId>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            permission: AtomicBool::new(true),
            supports_channels: true,
            events: Mutex::new(Vec::new()),
            visible: Mutex::new(HashMap::new()),
            foreground: Mutex::new(None),
        }
    }

    /// Host without notification channels (channel id is empty)
    #[must_use]
    pub fn without_channels() -> Self {
        Self {
            supports_channels: false,
            ..Self::new()
        }
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<NotifierEvent> {
        self.events.lock().clone()
    }

    /// How many times the notification was posted
    pub fn notify_count(&self, id: NotificationId) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, NotifierEvent::Notify(n, _) if *n == id))
            .count()
    }

    pub fn is_visible(&self, id: NotificationId) -> bool {
        self.visible.lock().contains_key(&id)
    }

    pub fn visible(&self, id: NotificationId) -> Option<Notification> {
        self.visible.lock().get(&id).cloned()
    }

    pub fn foreground(&self) -> Option<NotificationId> {
        *self.foreground.lock()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for RecordingNotifier {
    fn has_post_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn create_channel(&self, channel: &NotificationChannel) -> String {
        if !self.supports_channels {
            return String::new();
        }
        self.events
            .lock()
            .push(NotifierEvent::ChannelCreated(channel.id.clone()));
        channel.id.clone()
    }

    fn notify(&self, id: NotificationId, notification: Notification) {
        debug!(id = id.code(), title = %notification.title, "Posting notification");
        self.events
            .lock()
            .push(NotifierEvent::Notify(id, notification.clone()));
        self.visible.lock().insert(id, notification);
    }

    fn cancel(&self, id: NotificationId) {
        self.events.lock().push(NotifierEvent::Cancel(id));
        self.visible.lock().remove(&id);
    }

    fn start_foreground(&self, id: NotificationId, notification: Notification) {
        self.events
            .lock()
            .push(NotifierEvent::StartForeground(id, notification.clone()));
        self.visible.lock().insert(id, notification);
        *self.foreground.lock() = Some(id);
    }

    fn stop_foreground(&self) {
        self.events.lock().push(NotifierEvent::StopForeground);
        if let Some(id) = self.foreground.lock().take() {
            self.visible.lock().remove(&id);
        }
    }
}
