//! Tracker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the progress tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Delay between the end of one tick and the start of the next.
    pub poll_interval: Duration,
    /// Minimum change in percentage points that triggers a re-render.
    pub progress_threshold: f64,
    /// Upper bound for any single call to the daemon or the chat API.
    pub call_timeout: Duration,
    /// Directory whose free space is shown in progress messages.
    pub free_space_path: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            progress_threshold: 0.5,
            call_timeout: Duration::from_secs(15),
            free_space_path: PathBuf::from("/data"),
        }
    }
}

impl TrackerConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the re-render threshold in percentage points.
    pub fn with_progress_threshold(mut self, threshold: f64) -> Self {
        self.progress_threshold = threshold;
        self
    }

    /// Sets the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets the directory used for the free space figure.
    pub fn with_free_space_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.free_space_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();

        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.progress_threshold, 0.5);
        assert_eq!(config.call_timeout, Duration::from_secs(15));
        assert_eq!(config.free_space_path, PathBuf::from("/data"));
    }

    #[test]
    fn test_config_builder() {
        let config = TrackerConfig::new()
            .with_poll_interval(Duration::from_secs(1))
            .with_progress_threshold(1.0)
            .with_call_timeout(Duration::from_secs(3))
            .with_free_space_path("/srv/downloads");

        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.progress_threshold, 1.0);
        assert_eq!(config.call_timeout, Duration::from_secs(3));
        assert_eq!(config.free_space_path, PathBuf::from("/srv/downloads"));
    }
}
