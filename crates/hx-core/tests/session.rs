//! Session loop lifecycle tests against an in-process websocket server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use hx_core::FeedError;
use hx_core::ws::{OnFrameCallback, SessionConfig, SessionState, ShutdownCause, WsSession};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

fn config(url: String, heartbeat: Option<Duration>) -> SessionConfig {
    SessionConfig {
        url,
        subscribe_msg: r#"{"sub":"topic","id":"id1"}"#.into(),
        heartbeat_interval: heartbeat,
        close_grace: Duration::from_secs(1),
    }
}

fn collecting_callback() -> (OnFrameCallback, Arc<Mutex<Vec<Vec<u8>>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let cb: OnFrameCallback = Arc::new(move |data: &[u8]| {
        sink.lock().unwrap().push(data.to_vec());
        None
    });
    (cb, seen)
}

#[tokio::test]
async fn handshake_failure_is_fatal() {
    // Grab a free port, then release it so nothing is listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (cb, _) = collecting_callback();
    let session = WsSession::new(config(format!("ws://{addr}/ws"), None), cb);
    let state = session.state();

    let res = session.run(std::future::pending()).await;
    assert!(matches!(res, Err(FeedError::Connect(_))));
    assert_eq!(*state.borrow(), SessionState::Closed);
}

#[tokio::test]
async fn subscribe_first_then_frames_reach_callback() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let first = ws.next().await.unwrap().unwrap();
        ws.send(Message::Binary(b"payload".to_vec().into())).await.unwrap();
        ws.send(Message::Text("hello".to_string().into())).await.unwrap();
        ws.close(None).await.unwrap();
        first
    });

    let (cb, seen) = collecting_callback();
    let session = WsSession::new(config(format!("ws://{addr}/ws"), None), cb);
    let state = session.state();

    let cause = session.run(std::future::pending()).await.unwrap();
    assert_eq!(cause, ShutdownCause::ReadTerminated);
    assert_eq!(*state.borrow(), SessionState::Closed);

    let first = server.await.unwrap();
    assert_eq!(first, Message::Text(r#"{"sub":"topic","id":"id1"}"#.to_string().into()));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.as_slice(), &[b"payload".to_vec(), b"hello".to_vec()]);
}

#[tokio::test]
async fn reply_from_callback_is_written_by_supervisor() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let _subscribe = ws.next().await.unwrap().unwrap();
        ws.send(Message::Binary(b"ping".to_vec().into())).await.unwrap();
        let reply = ws.next().await.unwrap().unwrap();
        ws.close(None).await.unwrap();
        reply
    });

    let cb: OnFrameCallback = Arc::new(|data: &[u8]| (data == b"ping").then(|| "pong".to_string()));
    let session = WsSession::new(config(format!("ws://{addr}/ws"), None), cb);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(session.run(async move {
        let _ = stop_rx.await;
    }));

    let reply = tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
    assert_eq!(reply, Message::Text("pong".to_string().into()));

    let _ = stop_tx.send(());
    let cause = tokio::time::timeout(Duration::from_secs(3), run).await.unwrap().unwrap().unwrap();
    assert!(matches!(cause, ShutdownCause::ReadTerminated | ShutdownCause::Interrupted { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn heartbeat_write_failure_ends_session_without_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let mut seen = vec![ws.next().await.unwrap().unwrap()];
        ws.send(Message::Binary(b"stall".to_vec().into())).await.unwrap();
        // Wait for one heartbeat, then reset the connection.
        seen.push(ws.next().await.unwrap().unwrap());
        ws.get_ref().set_linger(Some(Duration::ZERO)).unwrap();
        drop(ws);
        seen
    });

    // Keep the reader busy so the failure surfaces on the write side.
    let cb: OnFrameCallback = Arc::new(|_data: &[u8]| {
        std::thread::sleep(Duration::from_secs(2));
        None
    });
    let heartbeat = Some(Duration::from_millis(100));
    let session = WsSession::new(config(format!("ws://{addr}/ws"), heartbeat), cb);
    let state = session.state();

    let cause = tokio::time::timeout(Duration::from_secs(2), session.run(std::future::pending()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cause, ShutdownCause::SendFailed);
    assert_eq!(*state.borrow(), SessionState::Closed);

    let seen = server.await.unwrap();
    assert!(matches!(seen[1], Message::Text(_)), "expected heartbeat, got {:?}", seen[1]);
    assert!(!seen.iter().any(|m| matches!(m, Message::Close(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reply_backlog_does_not_hide_peer_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (burst_tx, burst_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let _subscribe = ws.next().await.unwrap().unwrap();
        for _ in 0..200 {
            ws.feed(Message::Binary(b"ping".to_vec().into())).await.unwrap();
        }
        ws.flush().await.unwrap();
        let _ = burst_tx.send(());
        // Echo the client's close once it arrives.
        while let Some(Ok(_)) = ws.next().await {}
    });

    // Slow enough that replies pile up once the supervisor stops draining.
    let cb: OnFrameCallback = Arc::new(|data: &[u8]| {
        std::thread::sleep(Duration::from_millis(1));
        (data == b"ping").then(|| "pong".to_string())
    });
    let session = WsSession::new(config(format!("ws://{addr}/ws"), None), cb);

    let shutdown = async move {
        let _ = burst_rx.await;
    };
    let cause = session.run(shutdown).await.unwrap();
    assert_eq!(cause, ShutdownCause::Interrupted { peer_closed: true });
    server.await.unwrap();
}
