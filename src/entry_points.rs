//! Entry-point activation.
//!
//! Registrations marked with `as_entry_point` / `as_async_entry_point` are
//! resolved once a scope is built and handed to the host in registration
//! order. The library never drives them itself beyond the `start` helpers.

use std::sync::Arc;

use crate::cancellation::CancellationToken;
use crate::error::BoxError;
use crate::traits::{AsyncStartable, Startable};

/// A resolved entry point.
#[derive(Clone)]
pub enum EntryPoint {
    Start(Arc<dyn Startable>),
    AsyncStart(Arc<dyn AsyncStartable>),
}

/// Entry points of one scope, in registration order.
///
/// # Examples
///
/// ```
/// use arbor_di::{ContainerBuilder, Lifetime, Startable};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct Game {
///     started: AtomicUsize,
/// }
///
/// impl Startable for Game {
///     fn start(&self) {
///         self.started.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder
///     .register_factory(Lifetime::Singleton, |_| Ok(Game::default()))
///     .unwrap()
///     .as_entry_point();
///
/// let scope = builder.build_scope().unwrap();
/// let entry_points = scope.entry_points().unwrap();
/// assert_eq!(entry_points.startables().len(), 1);
/// entry_points.start();
/// ```
#[derive(Clone, Default)]
pub struct EntryPoints {
    startables: Vec<Arc<dyn Startable>>,
    async_startables: Vec<Arc<dyn AsyncStartable>>,
}

impl EntryPoints {
    pub(crate) fn from_resolved(points: Vec<EntryPoint>) -> Self {
        let mut this = Self::default();
        for point in points {
            match point {
                EntryPoint::Start(s) => this.startables.push(s),
                EntryPoint::AsyncStart(s) => this.async_startables.push(s),
            }
        }
        this
    }

    pub fn startables(&self) -> &[Arc<dyn Startable>] {
        &self.startables
    }

    pub fn async_startables(&self) -> &[Arc<dyn AsyncStartable>] {
        &self.async_startables
    }

    pub fn is_empty(&self) -> bool {
        self.startables.is_empty() && self.async_startables.is_empty()
    }

    /// Starts every synchronous entry point in order.
    pub fn start(&self) {
        for s in &self.startables {
            s.start();
        }
    }

    /// Starts every async entry point in order, stopping at the first error.
    ///
    /// Entry points that have not run yet are skipped once `token` is cancelled.
    pub async fn start_async(&self, token: CancellationToken) -> Result<(), BoxError> {
        for s in &self.async_startables {
            if token.is_cancelled() {
                tracing::debug!("entry point start cancelled");
                break;
            }
            s.start_async(token.clone()).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryPoints")
            .field("startables", &self.startables.len())
            .field("async_startables", &self.async_startables.len())
            .finish()
    }
}
