// Reacts to the client's connection to the raydio server.
//
// Losing the connection pauses playback and retries `reconnect()` at a fixed
// interval until it succeeds. Once connected again the livestream catalogue
// is refreshed, because the stream may have changed or ended meanwhile.

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use raydio_core::models::ConnectionState;
use tracing::{debug, info, warn};

use super::{EndReason, SessionShared};

pub(crate) async fn watch_connection(
    session: Arc<SessionShared>,
    mut states: BoxStream<'static, ConnectionState>,
) {
    loop {
        let state = tokio::select! {
            biased;
            () = session.cancel.cancelled() => break,
            next = states.next() => match next {
                Some(state) => state,
                None => break,
            },
        };

        debug!(%state, "Connection state changed");
        match state {
            ConnectionState::Disconnected => on_disconnected(&session).await,
            ConnectionState::Connected => on_connected(&session).await,
            ConnectionState::New | ConnectionState::Connecting => {}
        }
    }
}

async fn on_disconnected(session: &Arc<SessionShared>) {
    if !session.mark_client_lost() {
        return;
    }
    info!("Client lost connection, trying to reconnect");

    let connection = &session.ctx.sdk.connection;
    let interval = session.ctx.session.reconnect_interval();
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        let reconnected = tokio::select! {
            biased;
            () = session.cancel.cancelled() => return,
            reconnected = connection.reconnect() => reconnected,
        };
        if reconnected {
            info!(attempt, "Reconnect succeeded");
            return;
        }

        debug!(attempt, retry_in = ?interval, "Reconnect failed");
        tokio::select! {
            biased;
            () = session.cancel.cancelled() => return,
            () = tokio::time::sleep(interval) => {}
        }
    }
}

async fn on_connected(session: &Arc<SessionShared>) {
    if !session.is_client_lost() {
        return;
    }

    // Refresh first: the livestream may have changed or ended while offline
    let loader = &session.ctx.sdk.livestream_loader;
    let refreshed = tokio::select! {
        biased;
        () = session.cancel.cancelled() => return,
        refreshed = loader.load() => refreshed,
    };

    session.clear_client_lost();

    if !refreshed {
        warn!("Refreshing livestreams after reconnect failed");
        session.teardown(EndReason::RefreshFailed);
        return;
    }

    let mut found = session
        .ctx
        .sdk
        .livestream_group_container
        .find(&session.broadcaster_id);
    let livestream = tokio::select! {
        biased;
        () = session.cancel.cancelled() => return,
        next = found.next() => next.flatten(),
    };

    match livestream {
        Some(livestream) => {
            info!(stream_id = %livestream.id, "Resuming livestream after reconnect");
            session.resume(&livestream);
        }
        None => {
            // Ended while we were offline: same as the streamer losing the connection
            if session.mark_streamer_lost() {
                info!("Livestream ended while client was offline");
                return;
            }
            warn!("Livestream still missing after reconnect, nothing to resume");
            session.teardown(EndReason::LivestreamMissing);
        }
    }
}
