//! Huobi-specific configuration extraction.
//!
//! Converts the generic [`AppConfig`] into the settings one kline session
//! needs, validating the endpoint URL and the topic shape up front.

use std::time::Duration;

use hx_core::FeedError;
use hx_core::config::AppConfig;

use super::protocol::parse_kline_topic;

/// Parsed Huobi kline session configuration.
#[derive(Debug, Clone)]
pub struct HuobiConfig {
    /// Websocket URL, e.g. `wss://api.huobi.pro/ws`.
    pub url: String,
    /// Kline topic, e.g. `market.btcusdt.kline.1min`.
    pub topic: String,
    /// Symbol part of the topic (`btcusdt`).
    pub symbol: String,
    /// Interval part of the topic (`1min`).
    pub interval: String,
    pub correlation_id: String,
    pub freq_ms: u64,
    pub heartbeat_interval: Option<Duration>,
    pub close_grace: Duration,
    pub reply_to_pings: bool,
}

impl HuobiConfig {
    /// Extract Huobi config from an [`AppConfig`].
    pub fn from_app(app: &AppConfig) -> Result<Self, FeedError> {
        let url = app.endpoint.url()?;

        let topic = app.subscription.topic.clone();
        let (symbol, interval) = parse_kline_topic(&topic)
            .ok_or_else(|| FeedError::Config(format!("not a kline topic: {topic:?}")))?;
        let (symbol, interval) = (symbol.to_string(), interval.to_string());

        if app.subscription.id.is_empty() {
            return Err(FeedError::Config("subscription id must not be empty".into()));
        }

        Ok(Self {
            url: url.to_string(),
            topic,
            symbol,
            interval,
            correlation_id: app.subscription.id.clone(),
            freq_ms: app.subscription.freq_ms,
            heartbeat_interval: app.session.heartbeat_interval(),
            close_grace: app.session.close_grace(),
            reply_to_pings: app.session.reply_to_pings,
        })
    }
}
