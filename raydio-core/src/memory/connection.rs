use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use crate::models::ConnectionState;
use crate::sdk::RaydioConnection;

/// Connection whose outcome is scripted by the caller.
///
/// Unscripted `connect`/`reconnect` calls succeed.
#[derive(Debug)]
pub struct InMemoryConnection {
    state: watch::Sender<ConnectionState>,
    connect_results: Mutex<VecDeque<bool>>,
    reconnect_results: Mutex<VecDeque<bool>>,
    connect_attempts: AtomicUsize,
    reconnect_attempts: Mutex<Vec<Instant>>,
}

impl InMemoryConnection {
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(ConnectionState::New)
    }

    #[must_use]
    pub fn with_state(state: ConnectionState) -> Self {
        Self {
            state: watch::Sender::new(state),
            connect_results: Mutex::new(VecDeque::new()),
            reconnect_results: Mutex::new(VecDeque::new()),
            connect_attempts: AtomicUsize::new(0),
            reconnect_attempts: Mutex::new(Vec::new()),
        }
    }

    /// Queue the results of the next `connect` calls
    pub fn script_connect(&self, results: impl IntoIterator<Item = bool>) {
        self.connect_results.lock().extend(results);
    }

    /// Queue the results of the next `reconnect` calls
    pub fn script_reconnect(&self, results: impl IntoIterator<Item = bool>) {
        self.reconnect_results.lock().extend(results);
    }

    pub fn set_state(&self, state: ConnectionState) {
        debug!(%state, "Connection state changed");
        self.state.send_replace(state);
    }

    /// Simulate the network dropping
    pub fn drop_connection(&self) {
        self.set_state(ConnectionState::Disconnected);
    }

    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Instants at which `reconnect` was called
    pub fn reconnect_attempts(&self) -> Vec<Instant> {
        self.reconnect_attempts.lock().clone()
    }
}

impl Default for InMemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RaydioConnection for InMemoryConnection {
    fn state(&self) -> BoxStream<'static, ConnectionState> {
        WatchStream::new(self.state.subscribe()).boxed()
    }

    fn current_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    async fn connect(&self) -> bool {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        let success = self.connect_results.lock().pop_front().unwrap_or(true);
        if success {
            info!("Connected to raydio server");
            self.set_state(ConnectionState::Connected);
        } else {
            info!("Connecting to raydio server failed");
        }
        success
    }

    async fn reconnect(&self) -> bool {
        self.reconnect_attempts.lock().push(Instant::now());
        let success = self.reconnect_results.lock().pop_front().unwrap_or(true);
        if success {
            info!("Reconnected to raydio server");
            self.set_state(ConnectionState::Connected);
        } else {
            debug!("Reconnect attempt failed");
        }
        success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_scripted_failure_keeps_state() {
        let connection = InMemoryConnection::new();
        connection.script_connect([false]);

        assert!(!connection.connect().await);
        assert_eq!(connection.current_state(), ConnectionState::New);

        assert!(connection.connect().await);
        assert_eq!(connection.current_state(), ConnectionState::Connected);
        assert_eq!(connection.connect_attempts(), 2);
    }

    #[tokio::test]
    async fn test_state_stream_replays_current() {
        let connection = InMemoryConnection::with_state(ConnectionState::Connected);
        let mut states = connection.state();
        assert_eq!(states.next().await, Some(ConnectionState::Connected));

        connection.drop_connection();
        assert_eq!(states.next().await, Some(ConnectionState::Disconnected));
    }

    #[tokio::test]
    async fn test_reconnect_records_attempts() {
        let connection = InMemoryConnection::with_state(ConnectionState::Disconnected);
        connection.script_reconnect([false, true]);

        assert!(!connection.reconnect().await);
        assert_eq!(connection.current_state(), ConnectionState::Disconnected);
        assert!(connection.reconnect().await);
        assert_eq!(connection.current_state(), ConnectionState::Connected);
        assert_eq!(connection.reconnect_attempts().len(), 2);
    }
}
