//! Environment-driven configuration.
//!
//! Every setting comes from an environment variable. A `.env.local` or
//! `.env` file in the working directory is loaded first when present.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_TOKEN`: Bot token from @BotFather
//! - `JACKETT_URL`, `JACKETT_TOKEN`: Jackett instance and API key
//! - `OMDB_TOKEN`: OMDb API key
//!
//! Optional:
//! - `TRANSMISSION_HOST` (default `localhost`), `TRANSMISSION_PORT` (`9091`),
//!   `TRANSMISSION_PROTOCOL` (`http`), `TRANSMISSION_USERNAME`,
//!   `TRANSMISSION_PASSWORD`
//! - `DATA_DIR` (`/data`), `MOVIES_DIR`, `TV_DIR`
//! - `MAX_RETRIES` (`30`), `RETRY_DELAY` (`60` seconds)
//! - `AUTHORIZED_USERS`: comma separated Telegram user ids, empty for everyone
//! - `PROGRESS_INTERVAL_SECS` (`5`), `PROGRESS_THRESHOLD` (`0.5`),
//!   `REQUEST_TIMEOUT_SECS` (`15`)
//! - `DOWNLOAD_BASE_URL`: where completed downloads are served
//! - `DISPLAY_UTC_OFFSET` (`+00:00`): offset used for dates in messages

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;
use seedbot_tracker::TrackerConfig;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Load `.env.local` or `.env` from the working directory, if present.
pub fn load_dotenv() {
    match dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv()) {
        Ok(path) => debug!(path = %path.display(), "Loaded environment file"),
        Err(e) => debug!(error = %e, "No environment file loaded"),
    }
}

/// Complete Seedbot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,

    pub transmission_host: String,
    pub transmission_port: u16,
    pub transmission_protocol: String,
    pub transmission_username: Option<String>,
    pub transmission_password: Option<String>,

    pub jackett_url: String,
    pub jackett_token: String,
    pub omdb_token: String,

    /// Download directory; its free space is shown in progress messages.
    pub data_dir: PathBuf,
    pub movies_dir: PathBuf,
    pub tv_dir: PathBuf,

    /// Attempts when first connecting to the daemon.
    pub max_retries: u32,
    /// Delay between connection attempts.
    pub retry_delay: Duration,

    /// Users allowed to talk to the bot. `None` allows everyone.
    pub authorized_users: Option<Vec<u64>>,

    pub progress_interval: Duration,
    pub progress_threshold: f64,
    pub request_timeout: Duration,

    pub download_base_url: Option<Url>,
    pub utc_offset: FixedOffset,
}

impl BotConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let data_dir = expand_path(&get("DATA_DIR").unwrap_or_else(|| "/data".to_string()));
        let movies_dir = get("MOVIES_DIR")
            .map(|p| expand_path(&p))
            .unwrap_or_else(|| data_dir.join("completed/Movies"));
        let tv_dir = get("TV_DIR")
            .map(|p| expand_path(&p))
            .unwrap_or_else(|| data_dir.join("completed/TV"));

        let download_base_url = match get("DOWNLOAD_BASE_URL") {
            Some(raw) => Some(Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                key: "DOWNLOAD_BASE_URL",
                value: raw.clone(),
                reason: e.to_string(),
            })?),
            None => None,
        };

        let utc_offset = match get("DISPLAY_UTC_OFFSET") {
            Some(raw) => parse_utc_offset(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "DISPLAY_UTC_OFFSET",
                value: raw.clone(),
                reason: "expected +HH:MM or -HH:MM".to_string(),
            })?,
            None => FixedOffset::east_opt(0).ok_or_else(|| ConfigError::Invalid {
                key: "DISPLAY_UTC_OFFSET",
                value: "+00:00".to_string(),
                reason: "out of range".to_string(),
            })?,
        };

        Ok(Self {
            telegram_token: required("TELEGRAM_TOKEN")?,
            transmission_host: get("TRANSMISSION_HOST").unwrap_or_else(|| "localhost".to_string()),
            transmission_port: parse_or("TRANSMISSION_PORT", get("TRANSMISSION_PORT"), 9091)?,
            transmission_protocol: get("TRANSMISSION_PROTOCOL").unwrap_or_else(|| "http".to_string()),
            transmission_username: get("TRANSMISSION_USERNAME"),
            transmission_password: get("TRANSMISSION_PASSWORD"),
            jackett_url: required("JACKETT_URL")?,
            jackett_token: required("JACKETT_TOKEN")?,
            omdb_token: required("OMDB_TOKEN")?,
            data_dir,
            movies_dir,
            tv_dir,
            max_retries: parse_or("MAX_RETRIES", get("MAX_RETRIES"), 30)?,
            retry_delay: Duration::from_secs(parse_or("RETRY_DELAY", get("RETRY_DELAY"), 60)?),
            authorized_users: parse_authorized_users(get("AUTHORIZED_USERS"))?,
            progress_interval: positive_secs(
                "PROGRESS_INTERVAL_SECS",
                get("PROGRESS_INTERVAL_SECS"),
                5,
            )?,
            progress_threshold: parse_threshold(get("PROGRESS_THRESHOLD"), 0.5)?,
            request_timeout: positive_secs("REQUEST_TIMEOUT_SECS", get("REQUEST_TIMEOUT_SECS"), 15)?,
            download_base_url,
            utc_offset,
        })
    }

    /// Settings for the progress tracker.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig::new()
            .with_poll_interval(self.progress_interval)
            .with_progress_threshold(self.progress_threshold)
            .with_call_timeout(self.request_timeout)
            .with_free_space_path(self.data_dir.clone())
    }

    /// Whether a Telegram user may use the bot.
    pub fn is_authorized(&self, user_id: u64) -> bool {
        match &self.authorized_users {
            None => true,
            Some(users) => users.contains(&user_id),
        }
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).to_string())
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        }
    }
}

/// A whole number of seconds; zero would stall or spin the tracker loop.
fn positive_secs(key: &'static str, raw: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let secs = parse_or(key, raw, default)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: secs.to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_threshold(raw: Option<String>, default: f64) -> Result<f64, ConfigError> {
    let threshold: f64 = parse_or("PROGRESS_THRESHOLD", raw, default)?;
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ConfigError::Invalid {
            key: "PROGRESS_THRESHOLD",
            value: threshold.to_string(),
            reason: "must be a finite number of at least 0".to_string(),
        });
    }
    Ok(threshold)
}

fn parse_authorized_users(raw: Option<String>) -> Result<Option<Vec<u64>>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let mut users = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = part.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
            key: "AUTHORIZED_USERS",
            value: part.to_string(),
            reason: e.to_string(),
        })?;
        users.push(id);
    }

    Ok(if users.is_empty() { None } else { Some(users) })
}

/// Parse `+HH:MM`, `-HH:MM`, `+HH` or `Z`.
fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None => (rest.parse::<i32>().ok()?, 0),
    };
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("TELEGRAM_TOKEN", "123:abc"),
        ("JACKETT_URL", "http://jackett:9117"),
        ("JACKETT_TOKEN", "jk"),
        ("OMDB_TOKEN", "om"),
    ];

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup_from(REQUIRED)).unwrap();

        assert_eq!(config.transmission_host, "localhost");
        assert_eq!(config.transmission_port, 9091);
        assert_eq!(config.transmission_protocol, "http");
        assert_eq!(config.data_dir, PathBuf::from("/data"));
        assert_eq!(config.movies_dir, PathBuf::from("/data/completed/Movies"));
        assert_eq!(config.tv_dir, PathBuf::from("/data/completed/TV"));
        assert_eq!(config.max_retries, 30);
        assert_eq!(config.retry_delay, Duration::from_secs(60));
        assert_eq!(config.authorized_users, None);
        assert_eq!(config.progress_interval, Duration::from_secs(5));
        assert_eq!(config.progress_threshold, 0.5);
        assert!(config.download_base_url.is_none());
        assert_eq!(config.utc_offset.local_minus_utc(), 0);
    }

    #[test]
    fn test_missing_required() {
        let result = BotConfig::from_lookup(lookup_from(&[("TELEGRAM_TOKEN", "x")]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("JACKETT_URL"));

        let result = BotConfig::from_lookup(lookup_from(&[]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("TELEGRAM_TOKEN"));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(&[
            ("DATA_DIR", "/srv"),
            ("TV_DIR", "/media/tv"),
            ("TRANSMISSION_PORT", "9092"),
            ("AUTHORIZED_USERS", "11, 22,,33"),
            ("PROGRESS_INTERVAL_SECS", "2"),
            ("DOWNLOAD_BASE_URL", "https://files.example.com/dl/"),
            ("DISPLAY_UTC_OFFSET", "-05:00"),
        ]);
        let config = BotConfig::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.movies_dir, PathBuf::from("/srv/completed/Movies"));
        assert_eq!(config.tv_dir, PathBuf::from("/media/tv"));
        assert_eq!(config.transmission_port, 9092);
        assert_eq!(config.authorized_users, Some(vec![11, 22, 33]));
        assert!(config.is_authorized(22));
        assert!(!config.is_authorized(44));
        assert_eq!(config.utc_offset.local_minus_utc(), -5 * 3600);

        let tracker = config.tracker_config();
        assert_eq!(tracker.poll_interval, Duration::from_secs(2));
        assert_eq!(tracker.free_space_path, PathBuf::from("/srv"));
    }

    #[test]
    fn test_invalid_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("TRANSMISSION_PORT", "ninety"));
        let err = BotConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TRANSMISSION_PORT", .. }));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("AUTHORIZED_USERS", "12,abc"));
        let err = BotConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "AUTHORIZED_USERS", .. }));
    }

    #[test]
    fn test_tracker_settings_out_of_range() {
        let cases = [
            ("PROGRESS_INTERVAL_SECS", "0"),
            ("REQUEST_TIMEOUT_SECS", "0"),
            ("PROGRESS_THRESHOLD", "NaN"),
            ("PROGRESS_THRESHOLD", "inf"),
            ("PROGRESS_THRESHOLD", "-1"),
        ];
        for (key, value) in cases {
            let mut pairs = REQUIRED.to_vec();
            pairs.push((key, value));
            let err = BotConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
            match err {
                ConfigError::Invalid { key: bad, .. } => assert_eq!(bad, key, "{}={}", key, value),
                other => panic!("{}={} gave {:?}", key, value, other),
            }
        }

        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(&[("PROGRESS_THRESHOLD", "0"), ("REQUEST_TIMEOUT_SECS", "1")]);
        let config = BotConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.progress_threshold, 0.0);
        assert_eq!(config.request_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_empty_authorized_users_allows_everyone() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("AUTHORIZED_USERS", " , "));
        let config = BotConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(config.is_authorized(1));
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+05:30").unwrap().local_minus_utc(), 19_800);
        assert_eq!(parse_utc_offset("-04").unwrap().local_minus_utc(), -14_400);
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("05:00").is_none());
        assert!(parse_utc_offset("+25:00").is_none());
    }
}
