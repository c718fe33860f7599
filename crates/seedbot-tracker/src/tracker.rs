//! Progress tracker: tracking store plus a self-managing background loop.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use seedbot_models::{DestinationId, MessageRef, TorrentId};
use tokio::sync::Mutex;
use tracing::{debug, error, info, trace};

use crate::config::TrackerConfig;
use crate::reconciler::{Reconciler, TickReport};
use crate::service::{NotificationChannel, Renderer, TorrentSource};
use crate::store::{Subscription, TrackingStore};

/// Whether the background loop is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

struct Shared {
    store: Mutex<TrackingStore>,
    /// Only flipped while `store` is locked, so "store is empty" and
    /// "loop is running" are always decided together.
    running: AtomicBool,
    reconciler: Reconciler,
}

/// Keeps chat messages in sync with torrent progress.
///
/// Cheap to clone; every clone shares the same store and loop. The loop is
/// spawned on demand by [`register_tracking`](Self::register_tracking) and
/// exits by itself once nothing is tracked.
#[derive(Clone)]
pub struct ProgressTracker {
    shared: Arc<Shared>,
}

impl ProgressTracker {
    /// Create a tracker. No task is spawned until something is tracked.
    pub fn new(
        config: TrackerConfig,
        source: Arc<dyn TorrentSource>,
        channel: Arc<dyn NotificationChannel>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                store: Mutex::new(TrackingStore::new()),
                running: AtomicBool::new(false),
                reconciler: Reconciler::new(config, source, channel, renderer),
            }),
        }
    }

    /// Start displaying a torrent's progress in `message` and make sure the
    /// loop is running.
    pub async fn register_tracking(
        &self,
        torrent_id: TorrentId,
        destination: DestinationId,
        message: MessageRef,
    ) {
        let mut store = self.shared.store.lock().await;
        store.add_subscription(torrent_id, destination, message);
        debug!(torrent_id = %torrent_id, chat_id = %destination, message_id = message, "tracking torrent");
        self.start_locked(&store);
    }

    /// Start the loop if it is stopped and something is tracked.
    ///
    /// Returns true if this call started it. Safe to call redundantly.
    pub async fn ensure_running(&self) -> bool {
        let store = self.shared.store.lock().await;
        self.start_locked(&store)
    }

    fn start_locked(&self, store: &TrackingStore) -> bool {
        if store.is_empty() {
            return false;
        }
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return false;
        }

        info!(torrents = store.len(), "starting progress loop");
        tokio::spawn(run_loop(Arc::clone(&self.shared)));
        true
    }

    /// Stop tracking a torrent (e.g. after the user deleted it).
    ///
    /// The messages are left as they are. Returns the dropped subscriptions.
    pub async fn untrack(&self, torrent_id: TorrentId) -> Vec<Subscription> {
        let removed = self.shared.store.lock().await.remove_torrent(torrent_id);
        if !removed.is_empty() {
            debug!(torrent_id = %torrent_id, "torrent untracked");
        }
        removed
    }

    pub fn loop_state(&self) -> LoopState {
        if self.shared.running.load(Ordering::SeqCst) {
            LoopState::Running
        } else {
            LoopState::Stopped
        }
    }

    pub async fn is_tracking(&self, torrent_id: TorrentId) -> bool {
        self.shared.store.lock().await.contains(torrent_id)
    }

    pub async fn subscriptions(&self, torrent_id: TorrentId) -> Vec<Subscription> {
        self.shared.store.lock().await.subscriptions(torrent_id)
    }

    /// Number of tracked torrents.
    pub async fn tracked_count(&self) -> usize {
        self.shared.store.lock().await.len()
    }

    /// The channel progress messages go through.
    pub fn channel(&self) -> Arc<dyn NotificationChannel> {
        self.shared.reconciler.channel()
    }
}

/// Tick until the store is empty. Ticks never overlap: the next sleep only
/// starts once the current pass is done.
async fn run_loop(shared: Arc<Shared>) {
    let interval = shared.reconciler.config().poll_interval;

    loop {
        let outcome = AssertUnwindSafe(shared.reconciler.tick(&shared.store))
            .catch_unwind()
            .await;

        match outcome {
            Ok(report) => log_report(&report),
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(reason = %reason, "progress tick failed, continuing");
            }
        }

        {
            let store = shared.store.lock().await;
            if store.is_empty() {
                shared.running.store(false, Ordering::SeqCst);
                info!("no torrents tracked, stopping progress loop");
                return;
            }
        }

        tokio::time::sleep(interval).await;
    }
}

fn log_report(report: &TickReport) {
    if report.is_idle() {
        trace!(skipped = report.skipped.len(), "progress tick idle");
    } else {
        debug!(
            rendered = report.rendered.len(),
            skipped = report.skipped.len(),
            deferred = report.deferred.len(),
            completed = report.completed.len(),
            vanished = report.vanished.len(),
            dropped = report.dropped.len(),
            "progress tick done"
        );
    }
}
