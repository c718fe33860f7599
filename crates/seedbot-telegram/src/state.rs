//! Shared state for the Telegram bot.

use std::collections::HashMap;
use std::sync::Arc;

use seedbot_core::{BotConfig, TorrentMessageRenderer};
use seedbot_models::Torrent;
use seedbot_search::{JackettClient, OmdbClient, SearchError, SearchResults};
use seedbot_tracker::{ProgressTracker, Renderer};
use seedbot_transmission::{Result as TransmissionResult, TransmissionClient, TransmissionConfig};
use teloxide::Bot;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::channel::TelegramChannel;
use crate::error::Result;
use crate::source::TransmissionSource;

/// Everything the handlers share.
pub struct BotState {
    pub config: BotConfig,
    pub transmission: Arc<TransmissionClient>,
    pub jackett: JackettClient,
    pub omdb: OmdbClient,
    pub tracker: ProgressTracker,
    renderer: Arc<TorrentMessageRenderer>,
    /// Last search results per chat, for numbered replies.
    search_results: RwLock<HashMap<i64, SearchResults>>,
}

impl BotState {
    /// Build the state around an already connected Transmission client.
    pub fn new(config: BotConfig, transmission: Arc<TransmissionClient>, bot: Bot) -> Result<Self> {
        let jackett_url = Url::parse(&config.jackett_url).map_err(SearchError::from)?;
        let jackett = JackettClient::new(
            jackett_url,
            Some(config.jackett_token.clone()),
            config.request_timeout,
        )?;
        let omdb = OmdbClient::new(Some(config.omdb_token.clone()), config.request_timeout)?;

        let renderer = Arc::new(TorrentMessageRenderer::new(
            config.download_base_url.clone(),
            config.utc_offset,
        ));
        let tracker = ProgressTracker::new(
            config.tracker_config(),
            Arc::new(TransmissionSource::new(Arc::clone(&transmission))),
            Arc::new(TelegramChannel::new(bot)),
            renderer.clone(),
        );

        Ok(Self {
            config,
            transmission,
            jackett,
            omdb,
            tracker,
            renderer,
            search_results: RwLock::new(HashMap::new()),
        })
    }

    /// Connect to Transmission (with retries) and build the state.
    pub async fn connect(config: BotConfig, bot: Bot) -> Result<Self> {
        let transmission = TransmissionClient::connect(transmission_config(&config)).await?;
        Self::new(config, Arc::new(transmission), bot)
    }

    /// Progress message text for a torrent, with current free space.
    pub async fn progress_text(&self, torrent: &Torrent) -> TransmissionResult<String> {
        let free_space = self.transmission.free_space(&self.config.data_dir).await?;
        Ok(self.renderer.render(torrent, free_space))
    }

    pub async fn store_results(&self, chat_id: i64, results: SearchResults) {
        debug!(chat_id = %chat_id, results = results.len(), "storing search results");
        self.search_results.write().await.insert(chat_id, results);
    }

    pub async fn results_for(&self, chat_id: i64) -> Option<SearchResults> {
        self.search_results.read().await.get(&chat_id).cloned()
    }
}

/// Transmission settings from the bot configuration.
pub fn transmission_config(config: &BotConfig) -> TransmissionConfig {
    TransmissionConfig::new(config.transmission_host.clone(), config.transmission_port)
        .with_protocol(config.transmission_protocol.clone())
        .with_credentials(
            config.transmission_username.clone(),
            config.transmission_password.clone(),
        )
        .with_timeout(config.request_timeout)
        .with_retries(config.max_retries, config.retry_delay)
}
