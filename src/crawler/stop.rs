//! Cooperative stop requests
//!
//! A stop never interrupts the page being processed. The crawl loop checks the
//! flag between pages, so the record in flight is flushed and its links are
//! expanded before the crawl winds down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle used to ask a running crawl to stop
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop; calling it again has no further effect
    pub fn stop(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            tracing::info!("Stop requested, finishing the current page");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Spawns a task that turns Ctrl-C (and SIGTERM on unix) into a stop request
pub fn spawn_signal_listener(handle: StopHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        handle.stop();
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Cannot listen for SIGTERM: {}", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            return;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
