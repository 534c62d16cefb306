//! Signal handling for graceful server shutdown.

use std::fmt;
use tokio::signal;
use tracing::info;

/// The signal that ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Completes on SIGINT or SIGTERM (Ctrl+C on Windows).
pub async fn wait_for_shutdown_signal() -> Result<ShutdownSignal, Box<dyn std::error::Error>> {
    let received = wait_for_signal_silent().await?;
    info!("📡 Received {} - initiating graceful shutdown", received);
    Ok(received)
}

/// Same as [`wait_for_shutdown_signal`] without logging.
pub async fn wait_for_signal_silent() -> Result<ShutdownSignal, Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        let received = tokio::select! {
            _ = sigint.recv() => ShutdownSignal::Interrupt,
            _ = sigterm.recv() => ShutdownSignal::Terminate,
        };
        Ok(received)
    }

    #[cfg(windows)]
    {
        signal::ctrl_c().await?;
        Ok(ShutdownSignal::Interrupt)
    }
}
