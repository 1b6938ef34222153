// Follows the selected broadcaster's livestream in the container.
//
// A disappearing livestream starts the grace timer; the session ends if the
// broadcaster does not come back before it elapses.

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use raydio_core::models::Livestream;
use tracing::info;

use super::SessionShared;

pub(crate) async fn watch_presence(
    session: Arc<SessionShared>,
    mut livestreams: BoxStream<'static, Option<Livestream>>,
) {
    loop {
        let livestream = tokio::select! {
            biased;
            () = session.cancel.cancelled() => break,
            next = livestreams.next() => match next {
                Some(livestream) => livestream,
                None => break,
            },
        };

        match livestream {
            None => {
                if session.mark_streamer_lost() {
                    info!("Streamer lost connection, waiting for them to come back");
                }
            }
            Some(livestream) => {
                if session.streamer_returned(&livestream) {
                    info!(stream_id = %livestream.id, "Streamer is back");
                }
                session.update_livestream(&livestream);
            }
        }
    }
}
