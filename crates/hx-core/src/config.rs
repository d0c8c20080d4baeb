//! Configuration for the kline feed.
//!
//! Settings are read from an optional JSON file. Every field has a default,
//! so an empty object (or no file at all) yields the canonical build:
//! `wss://api.huobi.pro/ws`, topic `market.btcusdt.kline.1min`.
//!
//! # Example config
//!
//! ```json
//! {
//!   "endpoint": { "scheme": "wss", "host": "api.huobi.pro", "path": "/ws" },
//!   "subscription": { "topic": "market.btcusdt.kline.1min", "id": "id1", "freq_ms": 5000 },
//!   "session": { "heartbeat_interval_ms": 1000, "close_grace_ms": 1000, "reply_to_pings": true }
//! }
//! ```

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::FeedError;

pub const DEFAULT_SCHEME: &str = "wss";
pub const DEFAULT_HOST: &str = "api.huobi.pro";
pub const DEFAULT_PATH: &str = "/ws";
pub const DEFAULT_TOPIC: &str = "market.btcusdt.kline.1min";
pub const DEFAULT_CORRELATION_ID: &str = "id1";
pub const DEFAULT_FREQ_MS: u64 = 5000;

/// Top-level application config, deserialized from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: EndpointConfig,
    pub subscription: SubscriptionConfig,
    pub session: SessionTuning,
}

/// Where to connect. Kept as three parts so a host can be swapped without
/// rewriting the whole URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub scheme: String,
    pub host: String,
    pub path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.into(),
            host: DEFAULT_HOST.into(),
            path: DEFAULT_PATH.into(),
        }
    }
}

impl EndpointConfig {
    /// Assemble and validate the websocket URL.
    pub fn url(&self) -> Result<Url, FeedError> {
        let raw = format!("{}://{}{}", self.scheme, self.host, self.path);
        let url = Url::parse(&raw).map_err(|e| FeedError::Config(format!("endpoint {raw}: {e}")))?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(FeedError::Config(format!(
                "endpoint scheme must be ws or wss, got {other}"
            ))),
        }
    }
}

/// The single subscription sent after the handshake.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// Topic of the form `market.<symbol>.kline.<interval>`.
    pub topic: String,
    /// Opaque correlation token echoed by the server.
    pub id: String,
    /// Server-side throttle hint; `0` leaves it out of the request.
    pub freq_ms: u64,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.into(),
            id: DEFAULT_CORRELATION_ID.into(),
            freq_ms: DEFAULT_FREQ_MS,
        }
    }
}

/// Timing knobs for the session loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// Period of the timestamp heartbeat; `0` disables it.
    pub heartbeat_interval_ms: u64,
    /// How long to wait for the peer after sending our close frame.
    pub close_grace_ms: u64,
    /// Answer server `{"ping": n}` messages with `{"pong": n}`.
    pub reply_to_pings: bool,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 1000,
            close_grace_ms: 1000,
            reply_to_pings: true,
        }
    }
}

impl SessionTuning {
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        (self.heartbeat_interval_ms > 0).then(|| Duration::from_millis(self.heartbeat_interval_ms))
    }

    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }
}

/// Load and parse a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
