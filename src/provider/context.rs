//! Resolver context handed to factories and injection plans.

use std::any::Any;
use std::sync::Arc;

use super::ScopeInner;
use crate::cancellation::CancellationToken;
use crate::error::DiResult;
use crate::internal::ResolutionPath;
use crate::key::Key;
use crate::traits::ResolverCore;

/// Context passed to factory functions for resolving dependencies.
///
/// Resolutions made through the context continue the request that is
/// building the current instance, so cycles through factories are detected
/// and reported instead of recursing forever. For a singleton, the context
/// is bound to the scope that declared it; for scoped and transient
/// registrations, to the requesting scope.
///
/// # Examples
///
/// ```
/// use arbor_di::{ContainerBuilder, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_instance(Database { url: "postgres://localhost".to_string() }).unwrap();
/// builder.register_factory(Lifetime::Transient, |ctx| {
///     Ok(UserService { db: ctx.get::<Database>()? })
/// }).unwrap();
///
/// let scope = builder.build_scope().unwrap();
/// assert_eq!(scope.get_required::<UserService>().db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    scope: &'a Arc<ScopeInner>,
    path: &'a ResolutionPath,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(scope: &'a Arc<ScopeInner>, path: &'a ResolutionPath) -> Self {
        Self { scope, path }
    }

    /// Name of the scope this context resolves from.
    pub fn scope_name(&self) -> &str {
        &self.scope.name
    }

    /// Token cancelled when the scope this context resolves from is disposed.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.scope.cancellation.clone()
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>> {
        super::resolve(self.scope, key, self.path)
    }

    fn resolve_many(&self, key: &Key) -> DiResult<Vec<Arc<dyn Any + Send + Sync>>> {
        super::resolve_all(self.scope, key, self.path)
    }

    fn contains(&self, key: &Key) -> bool {
        self.scope.container.contains(key)
    }
}
