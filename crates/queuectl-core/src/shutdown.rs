//! Graceful shutdown signalling.
//!
//! A [`Shutdown`] is a cancellation token plus the instant the request was
//! first observed, so the worker loop can enforce its grace deadline.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::signal::unix::{SignalKind, signal};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    requested_at: Arc<OnceLock<Instant>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent; the first call fixes `requested_at`.
    pub fn trigger(&self) {
        self.requested_at.get_or_init(Instant::now);
        self.token.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `None` until shutdown has been requested.
    pub fn requested_at(&self) -> Option<Instant> {
        if !self.is_requested() {
            return None;
        }
        Some(*self.requested_at.get_or_init(Instant::now))
    }

    /// Resolves once shutdown is requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Resolves `grace` after shutdown was requested, counted from `started`
    /// when the work began after the request.
    pub async fn grace_elapsed(&self, started: Instant, grace: Duration) {
        self.cancelled().await;
        if let Some(at) = self.requested_at() {
            tokio::time::sleep_until(at.max(started) + grace).await;
        }
    }
}

/// Install a handler that triggers `shutdown` on SIGTERM or SIGINT.
///
/// Must be called from within a tokio runtime.
pub fn install_signal_handler(shutdown: Shutdown) -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, draining");
            }
            _ = sigint.recv() => {
                tracing::info!("received SIGINT, draining");
            }
        }
        shutdown.trigger();
    });

    Ok(())
}
