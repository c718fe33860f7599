//! Transmission RPC client.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use seedbot_models::{Torrent, TorrentId};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::TransmissionConfig;
use crate::error::{Result, TransmissionError};
use crate::rpc::{self, RpcRequest, RpcResponse, SESSION_HEADER, TORRENT_FIELDS};

/// Session negotiation attempts per call.
const SESSION_ATTEMPTS: usize = 3;

/// What to hand the daemon in `torrent-add`.
#[derive(Debug, Clone)]
pub enum AddSource {
    /// Magnet link or URL the daemon fetches itself.
    Link(String),
    /// Contents of a .torrent file.
    Metainfo(Vec<u8>),
}

/// A torrent accepted by `torrent-add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedTorrent {
    pub id: TorrentId,
    pub name: String,
    pub hash: String,
    /// The daemon already had this torrent.
    pub duplicate: bool,
}

/// Client for a single Transmission daemon.
///
/// Safe to share between tasks; the session id is renegotiated on demand.
pub struct TransmissionClient {
    http: reqwest::Client,
    config: TransmissionConfig,
    session_id: RwLock<Option<String>>,
}

impl TransmissionClient {
    /// Create a client without contacting the daemon.
    pub fn new(config: TransmissionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            session_id: RwLock::new(None),
        })
    }

    /// Create a client and wait until the daemon answers.
    ///
    /// Retries `max_retries` times, `retry_delay` apart.
    pub async fn connect(config: TransmissionConfig) -> Result<Self> {
        let attempts = config.max_retries.max(1);
        let delay = config.retry_delay;
        let client = Self::new(config)?;

        let mut last = String::new();
        for attempt in 1..=attempts {
            match client.session_check().await {
                Ok(()) => {
                    info!(url = %client.config.rpc_url(), "connected to Transmission");
                    return Ok(client);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        attempts,
                        error = %e,
                        "Transmission not reachable, retrying in {}s",
                        delay.as_secs()
                    );
                    last = e.to_string();
                }
            }
            if attempt < attempts {
                tokio::time::sleep(delay).await;
            }
        }

        Err(TransmissionError::ConnectFailed { attempts, last })
    }

    pub fn config(&self) -> &TransmissionConfig {
        &self.config
    }

    /// Verify the daemon is reachable and negotiate a session.
    pub async fn session_check(&self) -> Result<()> {
        self.call("session-get", json!({"fields": ["version"]}))
            .await
            .map(|_| ())
    }

    /// Send one RPC call and return its `arguments`.
    async fn call(&self, method: &str, arguments: Value) -> Result<Value> {
        let url = self.config.rpc_url();
        let body = RpcRequest { method, arguments };
        let user = self.config.username.as_deref().map(str::trim).unwrap_or("");

        for _ in 0..SESSION_ATTEMPTS {
            let mut request = self.http.post(&url).json(&body);
            if let Some(id) = self.session_id.read().await.as_deref() {
                request = request.header(SESSION_HEADER, id);
            }
            if !user.is_empty() {
                request = request.basic_auth(user, self.config.password.as_deref());
            }

            let response = request.send().await?;
            match response.status() {
                StatusCode::CONFLICT => {
                    let id = response
                        .headers()
                        .get(SESSION_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    debug!("Transmission session id renewed");
                    *self.session_id.write().await = id;
                    continue;
                }
                StatusCode::UNAUTHORIZED => return Err(TransmissionError::Unauthorized),
                status if !status.is_success() => {
                    return Err(TransmissionError::Status(status.as_u16()))
                }
                _ => {}
            }

            let parsed: RpcResponse = response.json().await?;
            return parsed.into_arguments();
        }

        Err(TransmissionError::SessionNegotiation)
    }

    /// Fetch one torrent.
    pub async fn torrent(&self, id: TorrentId) -> Result<Torrent> {
        let arguments = self
            .call("torrent-get", json!({"ids": [id], "fields": TORRENT_FIELDS}))
            .await?;
        rpc::parse_torrents(arguments)?
            .into_iter()
            .next()
            .ok_or(TransmissionError::NotFound(id))
    }

    /// Fetch every torrent, ordered by id.
    pub async fn torrents(&self) -> Result<Vec<Torrent>> {
        let arguments = self
            .call("torrent-get", json!({"fields": TORRENT_FIELDS}))
            .await?;
        let mut torrents = rpc::parse_torrents(arguments)?;
        torrents.sort_by_key(|t| t.id);
        Ok(torrents)
    }

    /// Add a torrent, optionally saving it under `download_dir`.
    pub async fn add(&self, source: AddSource, download_dir: Option<&Path>) -> Result<AddedTorrent> {
        let mut arguments = match source {
            AddSource::Link(link) => json!({"filename": link}),
            AddSource::Metainfo(bytes) => json!({"metainfo": STANDARD.encode(bytes)}),
        };
        if let Some(dir) = download_dir {
            arguments["download-dir"] = json!(dir.to_string_lossy());
        }

        let (added, duplicate) = rpc::parse_added(self.call("torrent-add", arguments).await?)?;
        info!(torrent_id = added.id, name = %added.name, duplicate, "torrent added");

        Ok(AddedTorrent {
            id: added.id,
            name: added.name,
            hash: added.hash_string,
            duplicate,
        })
    }

    /// Add a magnet link or a URL the daemon downloads itself.
    pub async fn add_magnet_or_url(&self, link: &str) -> Result<AddedTorrent> {
        self.add(AddSource::Link(link.to_string()), None).await
    }

    /// Add the contents of a .torrent file.
    pub async fn add_metainfo(&self, bytes: Vec<u8>) -> Result<AddedTorrent> {
        self.add(AddSource::Metainfo(bytes), None).await
    }

    /// Remove a torrent, optionally deleting its data.
    pub async fn remove(&self, id: TorrentId, delete_data: bool) -> Result<()> {
        self.require(id).await?;
        self.call(
            "torrent-remove",
            json!({"ids": [id], "delete-local-data": delete_data}),
        )
        .await?;
        info!(torrent_id = id, delete_data, "torrent removed");
        Ok(())
    }

    /// Resume a torrent in its queue position.
    pub async fn start(&self, id: TorrentId) -> Result<()> {
        self.simple_action("torrent-start", id).await
    }

    /// Resume a torrent, bypassing the queue.
    pub async fn start_now(&self, id: TorrentId) -> Result<()> {
        self.simple_action("torrent-start-now", id).await
    }

    /// Pause a torrent.
    pub async fn stop(&self, id: TorrentId) -> Result<()> {
        self.simple_action("torrent-stop", id).await
    }

    /// Move a torrent's data to `location`.
    pub async fn move_data(&self, id: TorrentId, location: &Path) -> Result<()> {
        self.require(id).await?;
        self.call(
            "torrent-set-location",
            json!({"ids": [id], "location": location.to_string_lossy(), "move": true}),
        )
        .await?;
        info!(torrent_id = id, location = %location.display(), "torrent data moved");
        Ok(())
    }

    /// Free bytes on the volume holding `path`.
    pub async fn free_space(&self, path: &Path) -> Result<u64> {
        let arguments = self
            .call("free-space", json!({"path": path.to_string_lossy()}))
            .await?;
        rpc::parse_free_space(arguments)
    }

    async fn simple_action(&self, method: &str, id: TorrentId) -> Result<()> {
        self.require(id).await?;
        self.call(method, json!({"ids": [id]})).await?;
        debug!(torrent_id = id, method, "torrent action sent");
        Ok(())
    }

    /// Actions on unknown ids succeed silently in Transmission; surface them.
    async fn require(&self, id: TorrentId) -> Result<()> {
        let arguments = self
            .call("torrent-get", json!({"ids": [id], "fields": ["id"]}))
            .await?;
        let found = arguments
            .get("torrents")
            .and_then(Value::as_array)
            .is_some_and(|list| !list.is_empty());
        if found {
            Ok(())
        } else {
            Err(TransmissionError::NotFound(id))
        }
    }
}
