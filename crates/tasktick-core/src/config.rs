//! Client configuration
//!
//! Plain-struct configuration with public fields and a [`Default`], plus the
//! WebSocket URL templating and the reconnect policy.

use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Default page size for the bootstrap `GetProjects` request
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Default heartbeat period; keeps intermediary infrastructure from timing
/// out the connection
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// Default reconnect backoff base delay
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Default reconnect backoff cap
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(30);

/// What the connection driver does after the socket drops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// One-shot: a closed connection stays closed until the application
    /// re-establishes one (re-login flow)
    Never,
    /// Exponential backoff with queue replay: each re-established connection
    /// re-runs the bootstrap sequence, then drains whatever queued while
    /// disconnected
    Backoff { base: Duration, max: Duration },
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (zero-based), doubling from
    /// `base` and capped at `max`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            ReconnectPolicy::Never => Duration::ZERO,
            ReconnectPolicy::Backoff { base, max } => {
                let factor = 2u32.saturating_pow(attempt.min(16));
                base.saturating_mul(factor).min(*max)
            }
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::Backoff {
            base: DEFAULT_BACKOFF_BASE,
            max: DEFAULT_BACKOFF_MAX,
        }
    }
}

/// Configuration for a [`TasktickClient`](crate::TasktickClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, e.g. `https://tasktick.example.com`
    pub server_url: String,
    /// Opaque bearer credential from the login/register collaborator
    pub auth_token: String,
    /// Page size for the bootstrap `GetProjects` request
    pub page_size: u32,
    /// Heartbeat period while the connection is open
    pub heartbeat_interval: Duration,
    /// What to do when the socket drops
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    /// Config for `server_url` with the given token and default tuning
    pub fn new(server_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            auth_token: auth_token.into(),
            ..Self::default()
        }
    }

    /// The templated WebSocket endpoint: `ws(s)://<host>/ws/stream/<token>`
    ///
    /// `http`/`https` schemes map to `ws`/`wss`; `ws`/`wss` pass through.
    pub fn socket_url(&self) -> ClientResult<String> {
        let (scheme, rest) = self
            .server_url
            .split_once("://")
            .ok_or_else(|| ClientError::InvalidEndpoint(self.server_url.clone()))?;
        let scheme = match scheme {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            _ => return Err(ClientError::InvalidEndpoint(self.server_url.clone())),
        };
        Ok(format!(
            "{}://{}/ws/stream/{}",
            scheme,
            rest.trim_end_matches('/'),
            self.auth_token
        ))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            auth_token: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url_maps_http_to_ws() {
        let config = ClientConfig::new("http://localhost:8080", "abc");
        assert_eq!(
            config.socket_url().unwrap(),
            "ws://localhost:8080/ws/stream/abc"
        );
    }

    #[test]
    fn test_socket_url_maps_https_to_wss() {
        let config = ClientConfig::new("https://tasktick.example.com/", "abc");
        assert_eq!(
            config.socket_url().unwrap(),
            "wss://tasktick.example.com/ws/stream/abc"
        );
    }

    #[test]
    fn test_socket_url_rejects_unknown_scheme() {
        let config = ClientConfig::new("ftp://example.com", "abc");
        assert!(matches!(
            config.socket_url(),
            Err(ClientError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_socket_url_rejects_missing_scheme() {
        let config = ClientConfig::new("localhost:8080", "abc");
        assert!(config.socket_url().is_err());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = ReconnectPolicy::Backoff {
            base: Duration::from_secs(1),
            max: Duration::from_secs(30),
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(16));
        assert_eq!(policy.delay_for(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for(60), Duration::from_secs(30));
    }

    #[test]
    fn test_default_tuning() {
        let config = ClientConfig::default();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(25));
        assert!(matches!(config.reconnect, ReconnectPolicy::Backoff { .. }));
    }
}
