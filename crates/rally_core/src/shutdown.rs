//! Shutdown coordination shared by the sweeper and the network server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

/// Shared shutdown flag that background tasks can poll or await.
#[derive(Debug, Clone, Default)]
pub struct ShutdownState {
    initiated: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once shutdown has been requested.
    pub fn is_shutdown_initiated(&self) -> bool {
        self.initiated.load(Ordering::Acquire)
    }

    /// Requests shutdown and wakes every task waiting in [`wait`](Self::wait).
    pub fn initiate_shutdown(&self) {
        if !self.initiated.swap(true, Ordering::AcqRel) {
            info!("🛑 Shutdown initiated - background tasks will stop");
        }
        self.notify.notify_waiters();
    }

    /// Completes once shutdown has been requested.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_shutdown_initiated() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_after_initiate() {
        let state = ShutdownState::new();
        let waiter = {
            let state = state.clone();
            tokio::spawn(async move { state.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!state.is_shutdown_initiated());
        state.initiate_shutdown();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
        assert!(state.is_shutdown_initiated());
    }

    #[tokio::test]
    async fn test_wait_after_initiate_is_immediate() {
        let state = ShutdownState::new();
        state.initiate_shutdown();
        tokio::time::timeout(Duration::from_millis(100), state.wait())
            .await
            .expect("already shut down");
    }
}
