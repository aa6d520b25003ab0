//! Shutdown signalling for the daemon.
//!
//! The first trigger wins and its reason is kept in a `watch` channel, so a
//! waiter created after the trigger still resolves immediately.

use std::fmt;
use std::future::Future;

use tokio::signal;
use tokio::sync::watch;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT or Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// Triggered from inside the process.
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "interrupt",
            Self::Terminate => "terminate",
            Self::Requested => "requested",
        })
    }
}

pub struct Shutdown {
    tx: watch::Sender<Option<ShutdownReason>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Start shutdown for `reason`. Returns `false` if it had already
    /// started, in which case the earlier reason is kept.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.tx.borrow()
    }

    /// Resolves with the reason once shutdown has started.
    pub fn wait(&self) -> impl Future<Output = ShutdownReason> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            match rx.wait_for(Option::is_some).await {
                Ok(seen) => (*seen).unwrap_or(ShutdownReason::Requested),
                Err(_) => ShutdownReason::Requested,
            }
        }
    }

    /// Wait for SIGINT or SIGTERM and trigger shutdown with it.
    pub async fn listen_for_signals(&self) -> ShutdownReason {
        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "SIGTERM handler unavailable");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let reason = tokio::select! {
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Ctrl-C handler failed");
                }
                ShutdownReason::Interrupt
            }
            _ = terminate => ShutdownReason::Terminate,
        };

        if self.trigger(reason) {
            tracing::info!(%reason, "shutting down");
        }
        reason
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
