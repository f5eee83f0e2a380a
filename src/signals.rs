//! Termination signal listener. Handlers are registered up front so a signal
//! that arrives during startup is not lost.

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

#[cfg(unix)]
pub struct TerminationSignals {
    interrupt: Signal,
    terminate: Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    pub fn register() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Resolves with the name of the first SIGINT or SIGTERM received.
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(not(unix))]
pub struct TerminationSignals;

#[cfg(not(unix))]
impl TerminationSignals {
    pub fn register() -> std::io::Result<Self> {
        Ok(Self)
    }

    pub async fn recv(&mut self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "ctrl-c",
            Err(e) => {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending().await
            }
        }
    }
}
