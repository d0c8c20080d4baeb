//! Single WebSocket session with heartbeat and graceful close.
//!
//! A `WsSession` runs one connection from handshake to teardown:
//! 1. Connects to the endpoint (TLS for `wss`).
//! 2. Sends the subscription message.
//! 3. Spawns a reader task that hands every inbound payload to a callback.
//! 4. Supervises: periodic heartbeat writes, replies queued by the reader,
//!    and the shutdown future.
//! 5. On shutdown sends a close frame and waits a bounded grace period.
//!
//! There is no reconnect. The supervisor is the only writer; the reader
//! task only reads and is aborted at teardown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::error::{FeedError, ReadError};
use crate::time_util;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Replies the reader may queue for the supervisor before dropping new ones.
pub const REPLY_QUEUE: usize = 64;

/// Callback invoked by the reader for each inbound text or binary payload.
///
/// Returning `Some(text)` asks the supervisor to send `text` back as a text
/// frame (e.g. a pong). The reader never writes itself. Replies are dropped
/// when `REPLY_QUEUE` of them are already waiting.
pub type OnFrameCallback = Arc<dyn Fn(&[u8]) -> Option<String> + Send + Sync>;

/// Configuration for a single session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Full WebSocket URL (e.g. `wss://api.huobi.pro/ws`).
    pub url: String,
    /// Text frame sent once, right after the handshake.
    pub subscribe_msg: String,
    /// Period of the timestamp heartbeat. `None` disables it.
    pub heartbeat_interval: Option<Duration>,
    /// Wait for the peer after our close frame before giving up.
    pub close_grace: Duration,
}

/// Lifecycle of a session, published on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Subscribing,
    Streaming,
    Closing,
    Closed,
}

/// Which of the disjoint shutdown causes ended a streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// The reader stopped: peer close, transport error or end of stream.
    /// No close frame is sent.
    ReadTerminated,
    /// A heartbeat or queued reply could not be written. No close frame is sent.
    SendFailed,
    /// Shutdown future fired and a close frame was attempted.
    /// `peer_closed` is false if the grace period ran out first.
    Interrupted { peer_closed: bool },
}

/// One WebSocket connection driven from handshake to teardown.
pub struct WsSession {
    config: SessionConfig,
    on_frame: OnFrameCallback,
    state_tx: watch::Sender<SessionState>,
}

impl WsSession {
    pub fn new(config: SessionConfig, on_frame: OnFrameCallback) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Connecting);
        Self { config, on_frame, state_tx }
    }

    /// Observe state transitions. Can be called before [`run`](Self::run).
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Run the session until a read error, a send failure, or `shutdown`
    /// resolves.
    ///
    /// Returns `Err` only for handshake or subscribe failures. Every other
    /// ending is a clean [`ShutdownCause`].
    pub async fn run<F>(self, shutdown: F) -> Result<ShutdownCause, FeedError>
    where
        F: Future<Output = ()>,
    {
        self.set_state(SessionState::Connecting);
        info!("connecting to {}", self.config.url);

        let ws_stream = match tokio_tungstenite::connect_async(self.config.url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                self.set_state(SessionState::Closed);
                return Err(FeedError::Connect(e));
            }
        };
        info!("connected");

        let (mut ws_write, ws_read) = ws_stream.split();

        self.set_state(SessionState::Subscribing);
        debug!("subscribing: {}", self.config.subscribe_msg);
        let subscribe = Message::Text(self.config.subscribe_msg.clone().into());
        if let Err(e) = ws_write.send(subscribe).await {
            self.set_state(SessionState::Closed);
            return Err(FeedError::Send(e));
        }

        self.set_state(SessionState::Streaming);

        // Spawned only after the subscribe write so nothing inbound is
        // consumed ahead of it.
        let (reply_tx, mut reply_rx) = mpsc::channel::<String>(REPLY_QUEUE);
        let mut reader = tokio::spawn(read_loop(ws_read, self.on_frame.clone(), reply_tx));

        let mut heartbeat = self.config.heartbeat_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        tokio::pin!(shutdown);

        let cause = loop {
            tokio::select! {
                res = &mut reader => {
                    match res {
                        Ok(e) => info!("read: {e}"),
                        Err(e) => error!("reader task failed: {e}"),
                    }
                    break ShutdownCause::ReadTerminated;
                }

                _ = next_heartbeat(&mut heartbeat) => {
                    let stamp = time_util::heartbeat_stamp();
                    if let Err(e) = ws_write.send(Message::Text(stamp.into())).await {
                        error!("write: {e}");
                        break ShutdownCause::SendFailed;
                    }
                }

                Some(reply) = reply_rx.recv() => {
                    debug!("reply: {reply}");
                    if let Err(e) = ws_write.send(Message::Text(reply.into())).await {
                        error!("write reply: {e}");
                        break ShutdownCause::SendFailed;
                    }
                }

                _ = &mut shutdown => {
                    info!("interrupt");
                    self.set_state(SessionState::Closing);
                    break self.close_gracefully(&mut ws_write, &mut reader).await;
                }
            }
        };

        self.set_state(SessionState::Closing);
        reader.abort();
        drop(ws_write);
        self.set_state(SessionState::Closed);
        info!("session closed: {cause:?}");
        Ok(cause)
    }

    /// Send a normal-closure frame, then wait for the reader to see the
    /// peer's close or for the grace period to pass.
    async fn close_gracefully(
        &self,
        ws_write: &mut WsSink,
        reader: &mut JoinHandle<ReadError>,
    ) -> ShutdownCause {
        let frame = CloseFrame { code: CloseCode::Normal, reason: String::new().into() };
        if let Err(e) = ws_write.send(Message::Close(Some(frame))).await {
            warn!("write close: {e}");
            return ShutdownCause::Interrupted { peer_closed: false };
        }

        let grace = self.config.close_grace;
        tokio::select! {
            res = reader => {
                if let Ok(e) = res {
                    info!("read: {e}");
                }
                ShutdownCause::Interrupted { peer_closed: true }
            }
            _ = tokio::time::sleep(grace) => {
                warn!("peer did not close within {grace:?}");
                ShutdownCause::Interrupted { peer_closed: false }
            }
        }
    }

    fn set_state(&self, state: SessionState) {
        let prev = self.state_tx.send_replace(state);
        if prev != state {
            debug!("session state {prev:?} -> {state:?}");
        }
    }
}

/// Resolve on the next heartbeat tick, or never if heartbeats are disabled.
async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Reader task: forward payloads to the callback until the stream fails.
async fn read_loop(
    mut ws_read: WsSource,
    on_frame: OnFrameCallback,
    replies: mpsc::Sender<String>,
) -> ReadError {
    loop {
        let reply = match ws_read.next().await {
            Some(Ok(Message::Binary(data))) => on_frame(&data),
            Some(Ok(Message::Text(text))) => on_frame(text.as_bytes()),
            Some(Ok(Message::Close(frame))) => return ReadError::Closed(frame),
            Some(Ok(_)) => continue, // Ping, Pong, Frame
            Some(Err(e)) => return ReadError::Transport(e),
            None => return ReadError::EndOfStream,
        };

        // Never wait on the supervisor: once it is closing it stops draining
        // replies, and the reader must still reach the peer's close frame.
        if let Some(reply) = reply {
            match replies.try_send(reply) {
                Ok(()) => {}
                Err(TrySendError::Full(reply)) => warn!("reply queue full, dropping {reply}"),
                Err(TrySendError::Closed(_)) => return ReadError::EndOfStream,
            }
        }
    }
}
