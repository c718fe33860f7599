//! In-memory collaborators for tracker tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use seedbot_models::{DestinationId, Eta, MessageRef, Torrent, TorrentId, TorrentStatus};

use crate::error::{DeliveryError, FetchError};
use crate::service::{NotificationChannel, Renderer, TorrentSource};

/// Torrent source driven by per-torrent progress scripts (in percent).
///
/// Each poll consumes one entry; the last entry repeats forever. Torrents
/// without a script report `NotFound`.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<TorrentId, VecDeque<Result<f64, FetchError>>>>,
    hanging: Mutex<HashSet<TorrentId>>,
    free_space_error: Mutex<Option<FetchError>>,
    fetches: Mutex<Vec<TorrentId>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, id: TorrentId, steps: &[f64]) {
        self.scripts
            .lock()
            .unwrap()
            .insert(id, steps.iter().map(|p| Ok(*p)).collect());
    }

    pub fn script_results(&self, id: TorrentId, steps: Vec<Result<f64, FetchError>>) {
        self.scripts.lock().unwrap().insert(id, steps.into());
    }

    pub fn hang(&self, id: TorrentId) {
        self.hanging.lock().unwrap().insert(id);
    }

    pub fn fail_free_space(&self, error: FetchError) {
        *self.free_space_error.lock().unwrap() = Some(error);
    }

    pub fn fetches(&self) -> Vec<TorrentId> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, id: TorrentId) -> usize {
        self.fetches().iter().filter(|f| **f == id).count()
    }

    fn next_step(&self, id: TorrentId) -> Result<f64, FetchError> {
        let mut scripts = self.scripts.lock().unwrap();
        let Some(steps) = scripts.get_mut(&id) else {
            return Err(FetchError::NotFound(id));
        };
        if steps.len() > 1 {
            steps.pop_front().unwrap_or(Err(FetchError::NotFound(id)))
        } else {
            steps.front().cloned().unwrap_or(Err(FetchError::NotFound(id)))
        }
    }
}

pub fn torrent_at(id: TorrentId, progress: f64) -> Torrent {
    Torrent {
        id,
        name: format!("torrent-{}", id),
        percent_done: progress / 100.0,
        eta: Eta::Unknown,
        total_size: 1_000_000,
        added_date: Utc.timestamp_opt(0, 0).unwrap(),
        status: TorrentStatus::Downloading,
        rate_download: 0,
    }
}

#[async_trait]
impl TorrentSource for ScriptedSource {
    async fn torrent(&self, id: TorrentId) -> Result<Torrent, FetchError> {
        self.fetches.lock().unwrap().push(id);
        let hang = self.hanging.lock().unwrap().contains(&id);
        if hang {
            std::future::pending::<()>().await;
        }
        self.next_step(id).map(|progress| torrent_at(id, progress))
    }

    async fn free_space(&self, _path: &Path) -> Result<u64, FetchError> {
        match self.free_space_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(42),
        }
    }
}

/// Channel that records every call and fails on demand.
#[derive(Default)]
pub struct RecordingChannel {
    edits: Mutex<Vec<(DestinationId, MessageRef, String)>>,
    deletes: Mutex<Vec<(DestinationId, MessageRef)>>,
    failures: Mutex<HashMap<(DestinationId, MessageRef), DeliveryError>>,
    hanging: Mutex<HashSet<(DestinationId, MessageRef)>>,
    fail_deletes: Mutex<bool>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_edit(&self, destination: DestinationId, message: MessageRef, error: DeliveryError) {
        self.failures
            .lock()
            .unwrap()
            .insert((destination, message), error);
    }

    pub fn clear_edit_failure(&self, destination: DestinationId, message: MessageRef) {
        self.failures.lock().unwrap().remove(&(destination, message));
    }

    pub fn hang_edit(&self, destination: DestinationId, message: MessageRef) {
        self.hanging.lock().unwrap().insert((destination, message));
    }

    pub fn fail_deletes(&self) {
        *self.fail_deletes.lock().unwrap() = true;
    }

    pub fn edits(&self) -> Vec<(DestinationId, MessageRef, String)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn edit_texts(&self, destination: DestinationId) -> Vec<String> {
        self.edits()
            .into_iter()
            .filter(|(d, _, _)| *d == destination)
            .map(|(_, _, text)| text)
            .collect()
    }

    pub fn deletes(&self) -> Vec<(DestinationId, MessageRef)> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, _destination: DestinationId, _text: &str) -> Result<MessageRef, DeliveryError> {
        Ok(1)
    }

    async fn edit(
        &self,
        destination: DestinationId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), DeliveryError> {
        self.edits
            .lock()
            .unwrap()
            .push((destination, message, text.to_string()));
        let hang = self.hanging.lock().unwrap().contains(&(destination, message));
        if hang {
            std::future::pending::<()>().await;
        }
        match self.failures.lock().unwrap().get(&(destination, message)) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn delete(&self, destination: DestinationId, message: MessageRef) -> Result<(), DeliveryError> {
        self.deletes.lock().unwrap().push((destination, message));
        if *self.fail_deletes.lock().unwrap() {
            return Err(DeliveryError::Failed("message can't be deleted".to_string()));
        }
        Ok(())
    }
}

/// Renders id and progress only.
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(&self, torrent: &Torrent, free_space: u64) -> String {
        format!("{}: {:.2}% ({} free)", torrent.id, torrent.progress(), free_space)
    }
}
