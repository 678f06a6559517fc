//! Disposal trait for resource cleanup.

use crate::error::BoxError;

/// Trait for synchronous resource disposal.
///
/// Implement this for services that need structured teardown (flushing
/// caches, closing handles). A registration opts in with
/// `RegistrationBuilder::disposable`; the owning scope then calls `dispose`
/// once, in reverse construction order, when the scope is disposed.
///
/// A returned error (or a panic) does not stop the rest of the scope from
/// being released; it is reported in the aggregated `DisposeError`.
///
/// # Examples
///
/// ```
/// use arbor_di::{ContainerBuilder, Dispose, BoxError, Lifetime, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct Cache {
///     flushed: AtomicBool,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) -> Result<(), BoxError> {
///         self.flushed.store(true, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder
///     .register_factory(Lifetime::Scoped, |_| Ok(Cache::default()))
///     .unwrap()
///     .disposable();
///
/// let root = builder.build_scope().unwrap();
/// let cache = root.get_required::<Cache>();
/// root.dispose().unwrap();
/// assert!(cache.flushed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self) -> Result<(), BoxError>;
}
