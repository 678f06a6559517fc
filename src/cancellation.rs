//! Disposal signal handed to work running on behalf of a scope.
//!
//! Every `LifetimeScope` owns one token and cancels it while it is being
//! disposed. Disposal already walks the subtree children first, so a token
//! only tracks its own scope: a scope's token is cancelled no later than its
//! parent's.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Signals that the scope that issued this token is being disposed.
///
/// Clones share the same signal. Async entry points receive the token of
/// the scope that resolved them.
///
/// # Examples
///
/// ```
/// use arbor_di::ContainerBuilder;
///
/// let root = ContainerBuilder::new().build_scope().unwrap();
/// let child = root.create_child().unwrap();
/// let token = child.cancellation_token();
///
/// assert!(!token.is_cancelled());
/// root.dispose().unwrap();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Default)]
pub struct CancellationToken {
    signal: Arc<Signal>,
}

#[derive(Default)]
struct Signal {
    cancelled: AtomicBool,
    #[cfg(feature = "async")]
    waiters: tokio::sync::Notify,
}

impl CancellationToken {
    /// Creates a token not tied to any scope, for driving entry points by hand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the token and wakes every task waiting in
    /// [`cancelled`](Self::cancelled). Later calls do nothing.
    pub fn cancel(&self) {
        if self.signal.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        #[cfg(feature = "async")]
        self.signal.waiters.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.cancelled.load(Ordering::Acquire)
    }

    /// Completes once the token is cancelled.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[cfg(feature = "async")]
    /// # async fn example(scope: arbor_di::LifetimeScope) {
    /// let token = scope.cancellation_token();
    /// tokio::select! {
    ///     _ = tokio::time::sleep(std::time::Duration::from_secs(30)) => {}
    ///     _ = token.cancelled() => {}
    /// }
    /// # }
    /// ```
    #[cfg(feature = "async")]
    pub async fn cancelled(&self) {
        loop {
            // Registered before the flag is read so a concurrent cancel cannot slip between
            let notified = self.signal.waiters.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_signal() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn separate_tokens_are_independent() {
        let a = CancellationToken::new();
        let b = CancellationToken::new();
        a.cancel();
        assert!(!b.is_cancelled());
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn disposal_wakes_waiters() {
        let root = crate::ContainerBuilder::new().build_scope().unwrap();
        let child = root.create_child().unwrap();
        let token = child.cancellation_token();

        let waiter = tokio::spawn(async move {
            token.cancelled().await;
            true
        });
        tokio::task::yield_now().await;

        root.dispose().unwrap();
        let woke = tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(woke);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn already_cancelled_returns_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancelled().await;
    }
}
