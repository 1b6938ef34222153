// Maps the client connection state onto the screen to show.

use std::sync::Arc;

use futures::stream::StreamExt;
use raydio_core::models::ConnectionState;
use raydio_core::sdk::RaydioConnection;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// A connect attempt failed; offers a new attempt
    ConnectionFailed,
    Connecting,
    /// Connected; shows the livestream list
    Livestreams,
    /// An established connection was closed; offers a reconnect
    Disconnected,
}

/// Screen for a connection state. `None` for `New`, which triggers a connect
/// instead of a screen change.
#[must_use]
pub const fn route(state: ConnectionState) -> Option<Screen> {
    match state {
        ConnectionState::New => None,
        ConnectionState::Connecting => Some(Screen::Connecting),
        ConnectionState::Connected => Some(Screen::Livestreams),
        ConnectionState::Disconnected => Some(Screen::Disconnected),
    }
}

pub struct ScreenRouter {
    connection: Arc<dyn RaydioConnection>,
    screen: Arc<watch::Sender<Option<Screen>>>,
    cancel: CancellationToken,
}

impl ScreenRouter {
    /// Start following the connection state. Must be called from within a
    /// tokio runtime.
    #[must_use]
    pub fn new(connection: Arc<dyn RaydioConnection>) -> Self {
        let screen = Arc::new(watch::Sender::new(None));
        let cancel = CancellationToken::new();

        let mut states = connection.state();
        let task_connection = Arc::clone(&connection);
        let task_screen = Arc::clone(&screen);
        let token = cancel.clone();
        tokio::spawn(async move {
            loop {
                let state = tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    next = states.next() => match next {
                        Some(state) => state,
                        None => break,
                    },
                };

                debug!(%state, "Routing connection state");
                match route(state) {
                    Some(next) => {
                        task_screen.send_replace(Some(next));
                    }
                    None => {
                        let connected = tokio::select! {
                            biased;
                            () = token.cancelled() => break,
                            connected = task_connection.connect() => connected,
                        };
                        if !connected {
                            warn!("Connecting to raydio failed");
                            task_screen.send_replace(Some(Screen::ConnectionFailed));
                        }
                    }
                }
            }
        });

        Self {
            connection,
            screen,
            cancel,
        }
    }

    /// `None` until the first screen is known
    #[must_use]
    pub fn screen(&self) -> Option<Screen> {
        *self.screen.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Screen>> {
        self.screen.subscribe()
    }

    /// New connect attempt from the connection-failed screen
    pub async fn retry_connect(&self) -> bool {
        let connected = self.connection.connect().await;
        if !connected {
            self.screen.send_replace(Some(Screen::ConnectionFailed));
        }
        connected
    }

    /// Reconnect attempt from the disconnected screen
    pub async fn reconnect(&self) -> bool {
        self.connection.reconnect().await
    }
}

impl Drop for ScreenRouter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
