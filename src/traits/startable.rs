//! Entry-point traits handed to the host after a scope is built.

use crate::cancellation::CancellationToken;
use crate::error::BoxError;

/// Synchronous entry point, started once by the host.
pub trait Startable: Send + Sync + 'static {
    fn start(&self);
}

/// Asynchronous entry point.
///
/// Receives the owning scope's cancellation token, which is cancelled when
/// that scope is disposed.
///
/// # Examples
///
/// ```
/// use arbor_di::{AsyncStartable, BoxError, CancellationToken};
/// use async_trait::async_trait;
///
/// struct Poller;
///
/// #[async_trait]
/// impl AsyncStartable for Poller {
///     async fn start_async(&self, token: CancellationToken) -> Result<(), BoxError> {
///         if token.is_cancelled() {
///             return Ok(());
///         }
///         // poll until cancelled...
///         Ok(())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait AsyncStartable: Send + Sync + 'static {
    async fn start_async(&self, token: CancellationToken) -> Result<(), BoxError>;
}
