//! In-memory tracking store.
//!
//! Maps each tracked torrent to the chat messages displaying it, plus the
//! last progress value that was rendered. The store itself is a plain data
//! structure; the tracker wraps it in a mutex shared with the loop.

use std::collections::{BTreeMap, HashMap};

use seedbot_models::{DestinationId, MessageRef, TorrentId};

/// A chat message currently displaying a torrent's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscription {
    /// Chat holding the message.
    pub destination: DestinationId,
    /// Message to keep in sync.
    pub message: MessageRef,
}

impl Subscription {
    pub fn new(destination: DestinationId, message: MessageRef) -> Self {
        Self {
            destination,
            message,
        }
    }
}

/// Tracked torrents and their subscriptions.
///
/// Invariant: a torrent id has a last-progress entry only while it has at
/// least one subscription.
#[derive(Debug, Default)]
pub struct TrackingStore {
    subscriptions: BTreeMap<TorrentId, BTreeMap<DestinationId, MessageRef>>,
    last_progress: HashMap<TorrentId, f64>,
}

impl TrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a display target. A second call for the same destination
    /// replaces the tracked message id.
    pub fn add_subscription(
        &mut self,
        torrent_id: TorrentId,
        destination: DestinationId,
        message: MessageRef,
    ) {
        self.subscriptions
            .entry(torrent_id)
            .or_default()
            .insert(destination, message);
    }

    /// Drop one display target. Returns the removed subscription.
    ///
    /// Removing the last subscription untracks the torrent.
    pub fn remove_subscription(
        &mut self,
        torrent_id: TorrentId,
        destination: DestinationId,
    ) -> Option<Subscription> {
        let targets = self.subscriptions.get_mut(&torrent_id)?;
        let message = targets.remove(&destination)?;
        if targets.is_empty() {
            self.remove_torrent(torrent_id);
        }
        Some(Subscription::new(destination, message))
    }

    /// Drop a subscription only if it still points at the same message.
    ///
    /// A destination re-registered with a new message since the snapshot
    /// was taken is left alone.
    pub fn remove_exact(&mut self, torrent_id: TorrentId, subscription: &Subscription) -> bool {
        let current = self
            .subscriptions
            .get(&torrent_id)
            .and_then(|targets| targets.get(&subscription.destination));
        if current != Some(&subscription.message) {
            return false;
        }
        self.remove_subscription(torrent_id, subscription.destination)
            .is_some()
    }

    /// Untrack a torrent, returning the subscriptions it had.
    pub fn remove_torrent(&mut self, torrent_id: TorrentId) -> Vec<Subscription> {
        self.last_progress.remove(&torrent_id);
        self.subscriptions
            .remove(&torrent_id)
            .map(|targets| {
                targets
                    .into_iter()
                    .map(|(destination, message)| Subscription::new(destination, message))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Retire the subscriptions that displayed a final render.
    ///
    /// Returns true when the torrent is no longer tracked. Subscriptions
    /// registered after the render survive and get a fresh render next tick.
    pub fn retire(&mut self, torrent_id: TorrentId, rendered: &[Subscription]) -> bool {
        for subscription in rendered {
            self.remove_exact(torrent_id, subscription);
        }
        if self.contains(torrent_id) {
            self.clear_last_progress(torrent_id);
            false
        } else {
            true
        }
    }

    /// Record the last rendered progress. Ignored for untracked torrents.
    pub fn set_last_progress(&mut self, torrent_id: TorrentId, value: f64) -> bool {
        if !self.contains(torrent_id) {
            return false;
        }
        self.last_progress.insert(torrent_id, value);
        true
    }

    /// Forget the last rendered progress so the next poll re-renders.
    pub fn clear_last_progress(&mut self, torrent_id: TorrentId) {
        self.last_progress.remove(&torrent_id);
    }

    /// Last rendered progress, if any.
    pub fn last_progress(&self, torrent_id: TorrentId) -> Option<f64> {
        self.last_progress.get(&torrent_id).copied()
    }

    pub fn contains(&self, torrent_id: TorrentId) -> bool {
        self.subscriptions.contains_key(&torrent_id)
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Number of tracked torrents.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Subscriptions of one torrent, ordered by destination.
    pub fn subscriptions(&self, torrent_id: TorrentId) -> Vec<Subscription> {
        self.subscriptions
            .get(&torrent_id)
            .map(|targets| {
                targets
                    .iter()
                    .map(|(&destination, &message)| Subscription::new(destination, message))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Point-in-time copy of every tracked torrent, ordered by id.
    pub fn snapshot(&self) -> Vec<(TorrentId, Vec<Subscription>)> {
        self.subscriptions
            .keys()
            .map(|&torrent_id| (torrent_id, self.subscriptions(torrent_id)))
            .collect()
    }
}
