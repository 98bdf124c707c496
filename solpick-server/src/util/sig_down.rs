//! Graceful shutdown signal handling.
//!
//! [`SigDown`] listens for SIGTERM and SIGINT (Ctrl+C on Windows) and fires a
//! [`CancellationToken`] shared by the HTTP server and the background tasks
//! it owns. Background tasks are spawned on its [`TaskTracker`] so shutdown
//! can wait for them to finish.

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Shutdown coordinator.
pub struct SigDown {
    task_tracker: TaskTracker,
    cancellation_token: CancellationToken,
}

impl std::fmt::Debug for SigDown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigDown")
            .field("cancelled", &self.cancellation_token.is_cancelled())
            .field("tasks", &self.task_tracker.len())
            .finish()
    }
}

impl SigDown {
    /// Installs the signal handlers.
    ///
    /// # Errors
    ///
    /// Returns an [`std::io::Error`] if signal registration fails.
    #[allow(clippy::unnecessary_wraps)] // Result needed on Unix for signal registration
    pub fn try_new() -> Result<Self, std::io::Error> {
        let inner = CancellationToken::new();
        let outer = inner.clone();
        let task_tracker = TaskTracker::new();

        #[cfg(unix)]
        {
            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;
            task_tracker.spawn(async move {
                tokio::select! {
                    () = inner.cancelled() => {}
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, shutting down");
                        inner.cancel();
                    },
                    _ = sigint.recv() => {
                        tracing::info!("Received SIGINT, shutting down");
                        inner.cancel();
                    }
                }
            });
        }

        #[cfg(windows)]
        {
            task_tracker.spawn(async move {
                tokio::select! {
                    () = inner.cancelled() => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received Ctrl-C, shutting down");
                        inner.cancel();
                    }
                }
            });
        }

        Ok(Self {
            task_tracker,
            cancellation_token: outer,
        })
    }

    /// A clone of the shutdown token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Tracker for background tasks that must finish before exit.
    #[must_use]
    pub const fn task_tracker(&self) -> &TaskTracker {
        &self.task_tracker
    }

    /// Cancels everything and waits for tracked tasks to finish.
    ///
    /// Also used when the server stops for a reason other than a signal.
    pub async fn shutdown(&self) {
        self.cancellation_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_waits_for_tracked_tasks() {
        let sig_down = SigDown::try_new().unwrap();
        let token = sig_down.cancellation_token();
        let (tx, mut rx) = tokio::sync::oneshot::channel();
        sig_down.task_tracker().spawn(async move {
            token.cancelled().await;
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = tx.send(());
        });

        sig_down.shutdown().await;
        assert!(rx.try_recv().is_ok());
    }
}
