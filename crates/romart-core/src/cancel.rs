//! Cancellation token for cooperative cancellation of lookups and fetches.
//!
//! The token can be polled (`is_cancelled`) inside loops or awaited
//! (`cancelled`) inside `tokio::select!`, which is how the fetch client races
//! an in-flight request against caller cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cancellation token shared between a batch orchestrator and the requests
/// it issues.
///
/// Cloning is cheap; when `cancel()` is called on any clone, all clones
/// observe the cancellation and every pending `cancelled()` future resolves.
///
/// # Example
///
/// ```
/// use romart_core::cancel::CancellationToken;
///
/// let token = CancellationToken::new();
/// let token_clone = token.clone();
///
/// token_clone.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    /// Create a new cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every task awaiting [`Self::cancelled`].
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        // A `Notified` future receives `notify_waiters` wakeups from the moment
        // it is created, so the flag check below cannot miss a cancel.
        let notified = self.state.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Check cancellation and return an error if cancelled.
    pub fn check(&self) -> Result<(), CancelledError> {
        if self.is_cancelled() {
            Err(CancelledError)
        } else {
            Ok(())
        }
    }
}

/// Error returned when an operation is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelledError;

impl std::fmt::Display for CancelledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Operation was cancelled")
    }
}

impl std::error::Error for CancelledError {}

impl From<CancelledError> for crate::error::ArtworkError {
    fn from(_: CancelledError) -> Self {
        crate::error::ArtworkError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_token_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[test]
    fn test_clone_shares_state() {
        let token1 = CancellationToken::new();
        let token2 = token1.clone();

        token1.cancel();

        assert!(token1.is_cancelled());
        assert!(token2.is_cancelled());
        assert_eq!(token2.check(), Err(CancelledError));
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let token = CancellationToken::new();
        let waiter = token.clone();

        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
            true
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        let finished = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(finished);
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already-cancelled token should not block");
    }

    #[test]
    fn test_cancelled_error_display() {
        assert_eq!(CancelledError.to_string(), "Operation was cancelled");
    }
}
