//! Shared test-double server and fixtures for the kline session tests.

#![allow(dead_code)]

use std::future::Future;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flate2::Compression;
use flate2::write::GzEncoder;
use futures_util::StreamExt;
use hx_core::config::AppConfig;
use hx_md::huobi::config::HuobiConfig;
use hx_md::huobi::{KlineEvent, OnKlineEvent};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

pub const TOPIC: &str = "market.btcusdt.kline.1min";

pub type ServerWs = WebSocketStream<TcpStream>;

/// Accept exactly one websocket client on a free local port and run `script`
/// against it. Returns the port and the script's handle.
pub async fn spawn_server<F, Fut, T>(script: F) -> (u16, JoinHandle<T>)
where
    F: FnOnce(ServerWs) -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send,
    T: Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        script(ws).await
    });
    (port, handle)
}

/// Kline config pointed at the local test server.
pub fn local_config(port: u16, heartbeat: Option<Duration>) -> HuobiConfig {
    let mut app = AppConfig::default();
    app.endpoint.scheme = "ws".into();
    app.endpoint.host = format!("127.0.0.1:{port}");
    app.session.heartbeat_interval_ms = heartbeat.map(|d| d.as_millis() as u64).unwrap_or(0);
    HuobiConfig::from_app(&app).unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

pub fn gzip_frame(json: &serde_json::Value) -> Message {
    Message::Binary(gzip(json.to_string().as_bytes()).into())
}

pub fn sample_envelope() -> serde_json::Value {
    serde_json::json!({
        "ch": TOPIC,
        "ts": 1700000000,
        "tick": {
            "id": 1700000000,
            "open": 30000.0,
            "close": 30100.5,
            "low": 29950.0,
            "high": 30200.0,
            "amount": 12.5,
            "vol": 375000.0,
            "count": 42
        }
    })
}

/// Read the next client frame, which must be a JSON text frame.
pub async fn read_text_json(ws: &mut ServerWs) -> serde_json::Value {
    match ws.next().await {
        Some(Ok(Message::Text(text))) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected JSON text frame, got {other:?}"),
    }
}

/// Read client frames until the stream ends.
pub async fn drain(ws: &mut ServerWs) -> Vec<Message> {
    let mut frames = Vec::new();
    while let Some(Ok(msg)) = ws.next().await {
        frames.push(msg);
    }
    frames
}

pub fn collector() -> (OnKlineEvent, Arc<Mutex<Vec<KlineEvent>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let cb: OnKlineEvent = Arc::new(move |event| sink.lock().unwrap().push(event));
    (cb, seen)
}
