//! Huobi kline subscription protocol.
//!
//! After the handshake the client sends one `{"sub", "id", "freq-ms"}`
//! request; from then on every inbound frame is an envelope carrying one
//! candle, or an application ping `{"ping": n}` that wants `{"pong": n}`.
//! There is no explicit ack: the first envelope confirms the subscription.

use std::fmt;

use hx_core::DecodeError;
use serde::{Deserialize, Deserializer, Serialize};

/// Subscribe request, sent once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeRequest {
    /// Topic, e.g. `market.btcusdt.kline.1min`.
    pub sub: String,
    /// Correlation token echoed in the server's status message.
    pub id: String,
    /// Server-side throttle hint in milliseconds. Omitted on the wire when zero.
    #[serde(rename = "freq-ms", skip_serializing_if = "is_zero")]
    pub freq_ms: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

/// One candlestick bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Bucket start, seconds since epoch.
    pub id: i64,
    pub open: f64,
    pub close: f64,
    pub low: f64,
    pub high: f64,
    /// Base-currency amount traded.
    pub amount: f64,
    /// Quote-currency volume traded.
    #[serde(rename = "vol")]
    pub volume: f64,
    /// Number of trades in the bucket.
    pub count: i64,
}

/// Outer object of every market data push.
///
/// Status and control messages carry no `tick`; they decode with a
/// zero-valued [`Tick`] and an empty channel.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub ch: String,
    /// Server send time.
    #[serde(default)]
    pub ts: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tick: Tick,
}

/// `"tick": null` decodes the same as a missing tick.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResponseEnvelope {
    /// True for status/control messages that carry no channel.
    pub fn is_control(&self) -> bool {
        self.ch.is_empty()
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id={} open={} close={} low={} high={} amount={} vol={} count={}",
            self.id,
            self.open,
            self.close,
            self.low,
            self.high,
            self.amount,
            self.volume,
            self.count
        )
    }
}

impl fmt::Display for ResponseEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch={} ts={} {}", self.ch, self.ts, self.tick)
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Application-level keep-alive from the server.
    Ping(i64),
    Envelope(ResponseEnvelope),
}

/// Build the subscribe request for a topic.
pub fn build_subscribe(topic: &str, correlation_id: &str, freq_ms: u64) -> SubscribeRequest {
    SubscribeRequest { sub: topic.to_string(), id: correlation_id.to_string(), freq_ms }
}

/// Decode an inflated payload as a response envelope.
pub fn decode_envelope(payload: &[u8]) -> Result<ResponseEnvelope, DecodeError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Decode an inflated payload, separating server pings from envelopes.
pub fn decode_frame(payload: &[u8]) -> Result<Inbound, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    if let Some(ping) = value.get("ping").and_then(|p| p.as_i64()) {
        return Ok(Inbound::Ping(ping));
    }
    Ok(Inbound::Envelope(serde_json::from_value(value)?))
}

/// Reply to a server ping.
pub fn pong_reply(ping: i64) -> String {
    serde_json::json!({ "pong": ping }).to_string()
}

/// `market.<symbol>.kline.<interval>`
pub fn kline_topic(symbol: &str, interval: &str) -> String {
    format!("market.{symbol}.kline.{interval}")
}

/// Split a kline topic into `(symbol, interval)`.
///
/// Returns `None` if the topic does not have the kline shape.
pub fn parse_kline_topic(topic: &str) -> Option<(&str, &str)> {
    let mut parts = topic.split('.');
    let (market, symbol) = (parts.next()?, parts.next()?);
    let (kline, interval) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || market != "market" || kline != "kline" {
        return None;
    }
    if symbol.is_empty() || interval.is_empty() {
        return None;
    }
    Some((symbol, interval))
}
