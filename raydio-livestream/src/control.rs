// Package-local control intents.
//
// UI-originated commands (currently only "stop listening") reach the running
// session through a broadcast bus. A session registers a receiver when it
// starts and unregisters it on teardown.

use std::sync::Arc;

use raydio_core::platform::ControlIntent;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const BUS_CAPACITY: usize = 16;

/// Actions and package a receiver accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentFilter {
    pub actions: Vec<String>,
    pub package: String,
}

impl IntentFilter {
    /// Filter accepting only the stop-listen intent of `package`
    #[must_use]
    pub fn stop_listen(package: &str) -> Self {
        Self {
            actions: vec![ControlIntent::stop_listen_action(package)],
            package: package.to_string(),
        }
    }

    #[must_use]
    pub fn matches(&self, intent: &ControlIntent) -> bool {
        intent.package == self.package && self.actions.iter().any(|a| *a == intent.action)
    }
}

#[derive(Debug, Clone)]
pub struct ControlBus {
    tx: broadcast::Sender<ControlIntent>,
}

impl ControlBus {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Deliver an intent to every registered receiver.
    ///
    /// Returns the number of receivers it was delivered to.
    pub fn send(&self, intent: ControlIntent) -> usize {
        match self.tx.send(intent) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(intent)) => {
                debug!(action = %intent.action, "No receiver registered for control intent");
                0
            }
        }
    }

    /// Register a receiver invoked for every intent matching `filter`.
    ///
    /// Must be called from within a tokio runtime. Intents sent after this
    /// returns are delivered.
    pub fn register<F>(&self, filter: IntentFilter, on_receive: F) -> ControlRegistration
    where
        F: Fn(&ControlIntent) + Send + Sync + 'static,
    {
        let mut rx = self.tx.subscribe();
        let token = CancellationToken::new();
        let child = token.clone();
        let on_receive = Arc::new(on_receive);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = child.cancelled() => break,
                    received = rx.recv() => match received {
                        Ok(intent) if filter.matches(&intent) => on_receive(&intent),
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Control intent receiver lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        ControlRegistration { token }
    }
}

impl Default for ControlBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a receiver registered; dropping it unregisters
#[derive(Debug)]
pub struct ControlRegistration {
    token: CancellationToken,
}

impl ControlRegistration {
    /// Idempotent
    pub fn unregister(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for ControlRegistration {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const PACKAGE: &str = "de.mycrocast.raydio.uefa.example";

    #[test]
    fn test_filter_matches_package_and_action() {
        let filter = IntentFilter::stop_listen(PACKAGE);
        assert!(filter.matches(&ControlIntent::stop_listen(PACKAGE)));
        assert!(!filter.matches(&ControlIntent::stop_listen("other.package")));
        assert!(!filter.matches(&ControlIntent {
            action: format!("{PACKAGE}.PAUSE"),
            package: PACKAGE.to_string(),
        }));
    }

    #[tokio::test]
    async fn test_registered_receiver_gets_matching_intents() {
        let bus = ControlBus::new();
        let received = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&received);
        let registration = bus.register(IntentFilter::stop_listen(PACKAGE), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.send(ControlIntent::stop_listen("other.package")), 1);
        assert_eq!(bus.send(ControlIntent::stop_listen(PACKAGE)), 1);

        tokio::time::timeout(Duration::from_secs(1), async {
            while received.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(received.load(Ordering::SeqCst), 1);
        assert!(registration.is_registered());
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let bus = ControlBus::new();
        let registration = bus.register(IntentFilter::stop_listen(PACKAGE), |_| {});
        registration.unregister();
        registration.unregister();
        assert!(!registration.is_registered());
    }

    #[test]
    fn test_send_without_receivers() {
        let bus = ControlBus::new();
        assert_eq!(bus.send(ControlIntent::stop_listen(PACKAGE)), 0);
    }
}
