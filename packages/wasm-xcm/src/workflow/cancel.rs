//! Cancellation signal shared between a caller and its workflow runs

use std::sync::Arc;

use tokio::sync::watch;

/// Cooperative cancellation for workflow runs
///
/// Checked before every submission. A transaction already submitted is
/// awaited to its result.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        CancelHandle { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`CancelHandle::cancel`] has been called
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this only errors if it was dropped.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_wakes_waiters() {
        let handle = CancelHandle::new();
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.cancelled().await })
        };

        assert!(!handle.is_cancelled());
        handle.cancel();
        waiter.await.unwrap();
        assert!(handle.is_cancelled());
    }
}
