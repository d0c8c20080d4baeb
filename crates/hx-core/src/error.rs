//! Typed error definitions for the kline feed.
//!
//! [`FeedError`] covers the fatal cases that end the process with a nonzero
//! exit code. [`ReadError`] ends a session but is not fatal. [`DecodeError`]
//! is recovered per frame.

use thiserror::Error;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;

/// Fatal errors raised while opening or subscribing a session.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// WebSocket handshake failed.
    #[error("dial: {0}")]
    Connect(#[source] tungstenite::Error),

    /// The subscribe frame could not be written.
    #[error("subscribe send: {0}")]
    Send(#[source] tungstenite::Error),

    /// The subscribe request could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Why the inbound half of a session stopped.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The peer sent a close frame.
    #[error("peer closed: {}", describe_close(.0))]
    Closed(Option<CloseFrame>),

    /// The transport failed mid-stream.
    #[error("transport: {0}")]
    Transport(#[from] tungstenite::Error),

    /// The stream ended without a close frame.
    #[error("stream ended")]
    EndOfStream,
}

/// Inbound frame could not be turned into a message. Recovered per frame.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty frame")]
    Empty,

    /// Bad gzip header or truncated stream.
    #[error("inflate: {0}")]
    Inflate(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outbound request could not be serialized.
#[derive(Debug, Error)]
#[error("encode: {0}")]
pub struct EncodeError(#[from] pub serde_json::Error);

fn describe_close(frame: &Option<CloseFrame>) -> String {
    match frame {
        Some(f) => format!("code={} reason={:?}", u16::from(f.code), f.reason.as_str()),
        None => "no close frame".to_string(),
    }
}
