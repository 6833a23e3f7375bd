//! Shutdown signalling between the runner and its worker.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{AgentError, Result};

/// Create a connected trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), ShutdownSignal(rx))
}

/// Sending half: flips the shared flag once.
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

/// Receiving half, cheap to clone.
///
/// Dropping every [`ShutdownTrigger`] counts as a shutdown request.
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&mut self) {
        // Err means the trigger is gone, which is treated the same way.
        let _ = self.0.wait_for(|stop| *stop).await;
    }
}

/// Spawn a task that fires `trigger` on SIGINT (Ctrl+C) or SIGTERM.
///
/// Handlers are registered before this returns so a failure surfaces at
/// startup rather than when the first signal arrives.
pub(crate) fn spawn_signal_listener(trigger: ShutdownTrigger) -> Result<JoinHandle<()>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate()).map_err(AgentError::Signal)?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(AgentError::Signal)?;

        Ok(tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, shutting down...");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down...");
                }
            }
            trigger.trigger();
        }))
    }

    #[cfg(not(unix))]
    {
        Ok(tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received Ctrl+C, shutting down..."),
                Err(e) => {
                    tracing::error!(error = %AgentError::Signal(e), "Failed to listen for Ctrl+C");
                    return;
                }
            }
            trigger.trigger();
        }))
    }
}
