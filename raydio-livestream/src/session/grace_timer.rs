// One-shot timer ending a session when a lost streamer does not come back.
//
// Cancellation and expiry race for the same slot under a mutex: whoever
// takes the pending entry first wins. A cancellation that lands before the
// expiry callback claimed the slot always prevents it from running.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct Pending {
    generation: u64,
    token: CancellationToken,
}

pub(crate) struct GraceTimer {
    slot: Arc<Mutex<Option<Pending>>>,
    generation: AtomicU64,
    starts: AtomicUsize,
    cancellations: AtomicUsize,
}

impl GraceTimer {
    pub(crate) fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
            starts: AtomicUsize::new(0),
            cancellations: AtomicUsize::new(0),
        }
    }

    /// Arm the timer, replacing a pending one. `on_expiry` runs at most once,
    /// and never after `cancel` or after `parent` is cancelled.
    pub(crate) fn start<F>(&self, period: Duration, parent: &CancellationToken, on_expiry: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = parent.child_token();

        if let Some(previous) = self.slot.lock().replace(Pending {
            generation,
            token: token.clone(),
        }) {
            previous.token.cancel();
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        debug!(generation, ?period, "Grace timer started");

        let slot = Arc::clone(&self.slot);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(generation, "Grace timer cancelled");
                }
                () = tokio::time::sleep(period) => {
                    if claim(&slot, generation) {
                        debug!(generation, "Grace timer elapsed");
                        on_expiry();
                    } else {
                        debug!(generation, "Grace timer cancelled at deadline");
                    }
                }
            }
        });
    }

    /// Cancel the pending timer. Returns false if none was pending.
    pub(crate) fn cancel(&self) -> bool {
        match self.slot.lock().take() {
            Some(pending) => {
                pending.token.cancel();
                self.cancellations.fetch_add(1, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn cancellations(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }
}

/// Take the slot for an elapsed timer. Fails once the entry was cancelled,
/// replaced or already taken by `cancel`.
fn claim(slot: &Mutex<Option<Pending>>, generation: u64) -> bool {
    let mut slot = slot.lock();
    match slot.as_ref() {
        Some(p) if p.generation == generation && !p.token.is_cancelled() => {
            slot.take();
            true
        }
        _ => false,
    }
}
