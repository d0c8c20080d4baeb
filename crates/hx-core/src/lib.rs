//! # hx-core
//!
//! Core crate for the Huobi kline feed, providing:
//!
//! - **Configuration** (`config`) — JSON config deserialization with defaults
//! - **Error types** (`error`) — session, read, decode and encode errors via thiserror
//! - **WebSocket** (`ws`) — single-connection session loop with heartbeat and graceful close
//! - **Shutdown** (`shutdown`) — operator interrupt as a watch channel
//! - **Time utilities** (`time_util`) — wall-clock millis and heartbeat stamps
//! - **Logging** (`logging`) — tracing-based structured logging

pub mod config;
pub mod error;
pub mod logging;
pub mod shutdown;
pub mod time_util;
pub mod ws;

pub use error::{DecodeError, EncodeError, FeedError, ReadError};
