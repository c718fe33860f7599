//! Transmission connection settings.

use std::time::Duration;

/// Where and how to reach the daemon.
#[derive(Debug, Clone)]
pub struct TransmissionConfig {
    pub host: String,
    pub port: u16,
    /// `http` or `https`.
    pub protocol: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Connection attempts made by [`connect`](crate::TransmissionClient::connect).
    pub max_retries: u32,
    /// Delay between connection attempts.
    pub retry_delay: Duration,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9091,
            protocol: "http".to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(15),
            max_retries: 30,
            retry_delay: Duration::from_secs(60),
        }
    }
}

impl TransmissionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Full RPC endpoint URL.
    pub fn rpc_url(&self) -> String {
        format!("{}://{}:{}/transmission/rpc", self.protocol, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rpc_url() {
        assert_eq!(
            TransmissionConfig::default().rpc_url(),
            "http://localhost:9091/transmission/rpc"
        );
    }

    #[test]
    fn test_builder() {
        let config = TransmissionConfig::new("nas.local", 443)
            .with_protocol("https")
            .with_credentials(Some("admin".to_string()), Some("secret".to_string()))
            .with_retries(3, Duration::from_secs(1));

        assert_eq!(config.rpc_url(), "https://nas.local:443/transmission/rpc");
        assert_eq!(config.username.as_deref(), Some("admin"));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
    }
}
