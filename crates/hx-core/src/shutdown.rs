//! Operator interrupt as a shutdown signal.
//!
//! The OS handler is registered when [`interrupt_signal`] returns, not when
//! the returned receiver is first awaited, so an interrupt that lands while
//! the session is still connecting is not lost.

use std::io;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tracing::info;

/// Register the Ctrl+C / SIGINT handler now and report the first interrupt
/// on a watch channel (`true` once interrupted).
///
/// Must be called from within a tokio runtime.
pub fn interrupt_signal() -> io::Result<watch::Receiver<bool>> {
    #[cfg(unix)]
    let mut interrupt = signal(SignalKind::interrupt())?;
    #[cfg(windows)]
    let mut interrupt = tokio::signal::windows::ctrl_c()?;

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if interrupt.recv().await.is_some() {
            info!("interrupt received");
            let _ = tx.send(true);
        }
    });
    Ok(rx)
}

/// Resolve once `rx` reports an interrupt. Never resolves if the sender goes
/// away without one.
pub async fn interrupted(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
