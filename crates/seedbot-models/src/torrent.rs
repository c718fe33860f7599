//! Torrent types for Seedbot.
//!
//! A [`Torrent`] is a point-in-time view of a download as reported by the
//! daemon. Nothing here is owned by Seedbot; every poll rebuilds it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::TorrentId;

/// Activity state of a torrent as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TorrentStatus {
    /// Torrent is paused.
    #[default]
    Stopped,
    /// Waiting in the verification queue.
    CheckWait,
    /// Verifying local data.
    Checking,
    /// Waiting in the download queue.
    DownloadWait,
    /// Downloading.
    Downloading,
    /// Waiting in the seed queue.
    SeedWait,
    /// Seeding.
    Seeding,
}

impl TorrentStatus {
    /// Map Transmission's numeric status code.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::CheckWait,
            2 => Self::Checking,
            3 => Self::DownloadWait,
            4 => Self::Downloading,
            5 => Self::SeedWait,
            6 => Self::Seeding,
            _ => Self::Stopped,
        }
    }

    /// Short label for chat output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::CheckWait => "queued for check",
            Self::Checking => "checking",
            Self::DownloadWait => "queued",
            Self::Downloading => "downloading",
            Self::SeedWait => "queued for seeding",
            Self::Seeding => "seeding",
        }
    }
}

/// Estimated time remaining for a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eta {
    /// Seconds until completion.
    Seconds(u64),
    /// Daemon has no estimate (e.g. torrent is stopped or complete).
    NotAvailable,
    /// Daemon cannot compute an estimate yet.
    Unknown,
}

impl From<i64> for Eta {
    fn from(raw: i64) -> Self {
        match raw {
            -1 => Eta::NotAvailable,
            s if s >= 0 => Eta::Seconds(s as u64),
            _ => Eta::Unknown,
        }
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::Seconds(total) => {
                let days = total / 86_400;
                let hours = (total % 86_400) / 3600;
                let minutes = (total % 3600) / 60;
                let seconds = total % 60;
                if days > 0 {
                    write!(f, "{}d {:02}h {:02}m", days, hours, minutes)
                } else if hours > 0 {
                    write!(f, "{}h {:02}m {:02}s", hours, minutes, seconds)
                } else {
                    write!(f, "{}m {:02}s", minutes, seconds)
                }
            }
            Eta::NotAvailable => write!(f, "not available"),
            Eta::Unknown => write!(f, "unknown"),
        }
    }
}

/// A torrent as seen by the daemon at poll time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Torrent {
    /// Daemon-assigned identifier.
    pub id: TorrentId,

    /// Display name.
    pub name: String,

    /// Fraction downloaded, 0.0 to 1.0.
    pub percent_done: f64,

    /// Estimated time remaining.
    pub eta: Eta,

    /// Total size in bytes.
    pub total_size: u64,

    /// When the torrent was added to the daemon.
    pub added_date: DateTime<Utc>,

    /// Current activity state.
    #[serde(default)]
    pub status: TorrentStatus,

    /// Download rate in bytes per second.
    #[serde(default)]
    pub rate_download: u64,
}

impl Torrent {
    /// Progress as a percentage (0 to 100).
    pub fn progress(&self) -> f64 {
        self.percent_done * 100.0
    }

    /// Whether the download has finished.
    pub fn is_complete(&self) -> bool {
        self.percent_done >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eta_from_raw() {
        assert_eq!(Eta::from(-1), Eta::NotAvailable);
        assert_eq!(Eta::from(-2), Eta::Unknown);
        assert_eq!(Eta::from(90), Eta::Seconds(90));
    }

    #[test]
    fn test_eta_display() {
        assert_eq!(Eta::Seconds(75).to_string(), "1m 15s");
        assert_eq!(Eta::Seconds(3723).to_string(), "1h 02m 03s");
        assert_eq!(Eta::Seconds(90_061).to_string(), "1d 01h 01m");
        assert_eq!(Eta::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_status_from_code() {
        assert_eq!(TorrentStatus::from_code(4), TorrentStatus::Downloading);
        assert_eq!(TorrentStatus::from_code(6), TorrentStatus::Seeding);
        assert_eq!(TorrentStatus::from_code(42), TorrentStatus::Stopped);
    }

    #[test]
    fn test_progress() {
        let torrent = Torrent {
            id: 1,
            name: "x".to_string(),
            percent_done: 0.5,
            eta: Eta::Unknown,
            total_size: 0,
            added_date: Utc::now(),
            status: TorrentStatus::Downloading,
            rate_download: 0,
        };
        assert_eq!(torrent.progress(), 50.0);
        assert!(!torrent.is_complete());
    }
}
