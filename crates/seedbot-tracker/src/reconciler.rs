//! One pass of the progress loop.
//!
//! A tick walks a snapshot of the tracking store, polls each torrent once and
//! pushes a fresh render to every subscription when progress moved enough.
//! The store lock is only held between external calls, never across them.

use std::future::Future;
use std::sync::Arc;

use seedbot_models::TorrentId;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::service::{NotificationChannel, Renderer, TorrentSource};
use crate::store::{Subscription, TrackingStore};

/// Progress value used when nothing has been rendered yet.
const UNRENDERED: f64 = -1.0;

/// What happened to each torrent during a tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Torrents whose subscriptions received a render.
    pub rendered: Vec<TorrentId>,
    /// Torrents skipped because progress moved less than the threshold.
    pub skipped: Vec<TorrentId>,
    /// Torrents left tracked after a transient failure.
    pub deferred: Vec<TorrentId>,
    /// Torrents untracked after their final render.
    pub completed: Vec<TorrentId>,
    /// Torrents untracked because the daemon no longer knows them.
    pub vanished: Vec<TorrentId>,
    /// Subscriptions dropped after a delivery failure.
    pub dropped: Vec<(TorrentId, Subscription)>,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.rendered.is_empty()
            && self.deferred.is_empty()
            && self.completed.is_empty()
            && self.vanished.is_empty()
            && self.dropped.is_empty()
    }
}

/// Decide whether a newly polled progress value warrants a render.
///
/// Renders when progress moved by at least `threshold` points, or when it
/// just crossed into completion.
pub fn should_render(progress: f64, previous: f64, threshold: f64) -> bool {
    let just_completed = progress >= 100.0 && previous < 100.0;
    (progress - previous).abs() >= threshold || just_completed
}

/// Polls torrents and keeps their chat messages in sync.
pub struct Reconciler {
    source: Arc<dyn TorrentSource>,
    channel: Arc<dyn NotificationChannel>,
    renderer: Arc<dyn Renderer>,
    config: TrackerConfig,
}

impl Reconciler {
    pub fn new(
        config: TrackerConfig,
        source: Arc<dyn TorrentSource>,
        channel: Arc<dyn NotificationChannel>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            source,
            channel,
            renderer,
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The notification channel, for callers that send initial messages.
    pub fn channel(&self) -> Arc<dyn NotificationChannel> {
        Arc::clone(&self.channel)
    }

    /// Run one pass over every tracked torrent.
    pub async fn tick(&self, store: &Mutex<TrackingStore>) -> TickReport {
        let snapshot = store.lock().await.snapshot();
        let mut report = TickReport::default();

        trace!(torrents = snapshot.len(), "reconcile tick");

        for (torrent_id, subscriptions) in snapshot {
            self.reconcile(torrent_id, subscriptions, store, &mut report)
                .await;
        }

        report
    }

    async fn reconcile(
        &self,
        torrent_id: TorrentId,
        subscriptions: Vec<Subscription>,
        store: &Mutex<TrackingStore>,
        report: &mut TickReport,
    ) {
        let torrent = match self.bounded("torrent-get", self.source.torrent(torrent_id)).await {
            Ok(torrent) => torrent,
            Err(e) if e.is_not_found() => {
                info!(torrent_id = %torrent_id, "torrent no longer exists, untracking");
                self.forget(torrent_id, store).await;
                report.vanished.push(torrent_id);
                return;
            }
            Err(e) => {
                warn!(torrent_id = %torrent_id, error = %e, "failed to poll torrent");
                report.deferred.push(torrent_id);
                return;
            }
        };

        let progress = torrent.progress();

        // Fetched per torrent so every message of this torrent shows the same figure.
        let free_space = match self
            .bounded(
                "free-space",
                self.source.free_space(&self.config.free_space_path),
            )
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(torrent_id = %torrent_id, error = %e, "failed to read free space");
                report.deferred.push(torrent_id);
                return;
            }
        };

        {
            let mut store = store.lock().await;
            if !store.contains(torrent_id) {
                debug!(torrent_id = %torrent_id, "torrent untracked during poll");
                return;
            }
            let previous = store.last_progress(torrent_id).unwrap_or(UNRENDERED);
            if !should_render(progress, previous, self.config.progress_threshold) {
                trace!(torrent_id = %torrent_id, progress, previous, "progress below threshold");
                report.skipped.push(torrent_id);
                return;
            }
            store.set_last_progress(torrent_id, progress);
        }

        let text = self.renderer.render(&torrent, free_space);
        let mut delivered = Vec::with_capacity(subscriptions.len());
        let mut all_delivered = true;

        for subscription in subscriptions {
            match self
                .bounded(
                    "edit-message",
                    self.channel
                        .edit(subscription.destination, subscription.message, &text),
                )
                .await
            {
                Ok(()) => delivered.push(subscription),
                Err(e) if e.is_unchanged() => {
                    trace!(torrent_id = %torrent_id, chat_id = %subscription.destination, "message not modified");
                    delivered.push(subscription);
                }
                Err(e) if e.is_retryable_delivery() => {
                    warn!(torrent_id = %torrent_id, chat_id = %subscription.destination, error = %e, "progress edit deferred");
                    all_delivered = false;
                    store.lock().await.clear_last_progress(torrent_id);
                }
                Err(e) => {
                    warn!(
                        torrent_id = %torrent_id,
                        chat_id = %subscription.destination,
                        error = %e,
                        "failed to update progress message, dropping subscription"
                    );
                    self.discard_message(&subscription).await;
                    store.lock().await.remove_exact(torrent_id, &subscription);
                    report.dropped.push((torrent_id, subscription));
                }
            }
        }

        report.rendered.push(torrent_id);
        debug!(torrent_id = %torrent_id, progress, chats = delivered.len(), "progress rendered");

        if progress >= 100.0 {
            if !all_delivered {
                debug!(torrent_id = %torrent_id, "final render incomplete, retrying next tick");
                return;
            }
            if store.lock().await.retire(torrent_id, &delivered) {
                info!(torrent_id = %torrent_id, name = %torrent.name, "torrent complete, untracking");
                report.completed.push(torrent_id);
            }
        }
    }

    /// Untrack a vanished torrent and clear its messages.
    async fn forget(&self, torrent_id: TorrentId, store: &Mutex<TrackingStore>) {
        let subscriptions = store.lock().await.remove_torrent(torrent_id);
        for subscription in &subscriptions {
            self.discard_message(subscription).await;
        }
    }

    /// Best-effort delete of a message that can no longer be kept in sync.
    async fn discard_message(&self, subscription: &Subscription) {
        if let Err(e) = self
            .bounded(
                "delete-message",
                self.channel
                    .delete(subscription.destination, subscription.message),
            )
            .await
        {
            debug!(
                chat_id = %subscription.destination,
                message_id = subscription.message,
                error = %e,
                "failed to delete stale message"
            );
        }
    }

    /// Await an external call, giving up after the configured timeout.
    async fn bounded<T, E, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        TrackerError: From<E>,
    {
        match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(result) => result.map_err(TrackerError::from),
            Err(_) => Err(TrackerError::Timeout {
                operation,
                after: self.config.call_timeout,
            }),
        }
    }
}
