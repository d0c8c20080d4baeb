//! Huobi kline feed — one topic over one websocket session.
//!
//! Inbound frames are gzip JSON. The frame handler built here runs on the
//! session's reader task: it inflates, decodes, logs one line per frame and
//! turns server pings into pong replies for the supervisor to send.

pub mod codec;
pub mod config;
pub mod protocol;

use std::future::Future;
use std::sync::Arc;

use hx_core::FeedError;
use hx_core::time_util;
use hx_core::ws::{OnFrameCallback, SessionConfig, ShutdownCause, WsSession};
use tracing::{debug, info, warn};

use self::config::HuobiConfig;
use self::protocol::{Inbound, ResponseEnvelope};

/// Something the frame handler saw, reported after it has been logged.
#[derive(Debug, Clone, PartialEq)]
pub enum KlineEvent {
    /// A decoded envelope. A fresh value per frame.
    Envelope(ResponseEnvelope),
    /// Server ping (answered if `reply_to_pings` is set).
    Ping(i64),
    /// The frame was discarded; the session carries on.
    DecodeFailed(String),
}

/// Observer for [`KlineEvent`]s, called on the reader task.
pub type OnKlineEvent = Arc<dyn Fn(KlineEvent) + Send + Sync>;

/// Build the session config: URL, encoded subscribe frame and timings.
pub fn session_config(cfg: &HuobiConfig) -> Result<SessionConfig, FeedError> {
    let request = protocol::build_subscribe(&cfg.topic, &cfg.correlation_id, cfg.freq_ms);
    let encoded = codec::encode_request(&request)?;
    // serde_json always emits UTF-8.
    let subscribe_msg = String::from_utf8_lossy(&encoded).into_owned();

    Ok(SessionConfig {
        url: cfg.url.clone(),
        subscribe_msg,
        heartbeat_interval: cfg.heartbeat_interval,
        close_grace: cfg.close_grace,
    })
}

/// Frame handler for a kline session.
pub fn frame_handler(reply_to_pings: bool, on_event: Option<OnKlineEvent>) -> OnFrameCallback {
    Arc::new(move |data: &[u8]| {
        let decoded = codec::inflate(data).and_then(|payload| protocol::decode_frame(&payload));

        let (event, reply) = match decoded {
            Ok(Inbound::Envelope(env)) => {
                if env.is_control() {
                    info!("recv: control message ts={}", env.ts);
                } else {
                    info!("recv: {env} lag_ms={}", time_util::now_ms() - env.ts);
                }
                (KlineEvent::Envelope(env), None)
            }
            Ok(Inbound::Ping(ping)) => {
                debug!("server ping {ping}");
                let reply = reply_to_pings.then(|| protocol::pong_reply(ping));
                (KlineEvent::Ping(ping), reply)
            }
            Err(e) => {
                warn!("decode: {e}");
                (KlineEvent::DecodeFailed(e.to_string()), None)
            }
        };

        if let Some(cb) = &on_event {
            cb(event);
        }
        reply
    })
}

/// Run one kline session until `shutdown` resolves or the connection drops.
pub async fn run<F>(
    cfg: &HuobiConfig,
    on_event: Option<OnKlineEvent>,
    shutdown: F,
) -> Result<ShutdownCause, FeedError>
where
    F: Future<Output = ()>,
{
    let session_cfg = session_config(cfg)?;
    info!("subscribing to {} (symbol={}, interval={})", cfg.topic, cfg.symbol, cfg.interval);
    let session = WsSession::new(session_cfg, frame_handler(cfg.reply_to_pings, on_event));
    session.run(shutdown).await
}
