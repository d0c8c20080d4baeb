//! WebSocket session: one connection, one subscription, graceful close.

pub mod session;

pub use session::{OnFrameCallback, SessionConfig, SessionState, ShutdownCause, WsSession};
