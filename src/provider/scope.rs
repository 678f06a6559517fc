//! Lifetime scope tree.
//!
//! Each scope node owns one compiled container, the instances it cached and
//! the disposable ones among them, and its child nodes. Parents are held
//! weakly; children are owned. Disposal is strict post-order.
//!
//! Nodes never own their ancestors, so the tree has no reference cycles.
//! Every handle instead pins the root of its tree, which in turn owns each
//! attached node, keeping the whole ancestor chain of a live handle alive.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};

use super::{InstanceCache, ResolverContext};
use crate::ambient;
use crate::cancellation::CancellationToken;
use crate::collection::{ContainerBuilder, Installer, ScopeTemplate};
use crate::container::Container;
use crate::entry_points::EntryPoints;
use crate::error::{DiError, DiResult, DisposeError, DisposeFailure};
use crate::internal::{DisposeBag, ResolutionPath};
use crate::key::Key;
use crate::options::ContainerOptions;
use crate::registration::{AnyArc, DisposeHook};
use crate::traits::ResolverCore;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeState {
    Active,
    Disposed,
}

pub(crate) struct ScopeInner {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) container: Arc<Container>,
    parent: Option<Weak<ScopeInner>>,
    children: Mutex<Vec<Arc<ScopeInner>>>,
    pub(crate) cache: InstanceCache,
    disposables: Mutex<DisposeBag>,
    // Resolution holds a recursive read lock; disposal takes the write lock
    state: RwLock<ScopeState>,
    disposing: AtomicBool,
    pub(crate) cancellation: CancellationToken,
    entry_points: OnceCell<EntryPoints>,
}

impl ScopeInner {
    fn new(name: Option<String>, container: Arc<Container>, parent: Option<&Arc<ScopeInner>>) -> Arc<Self> {
        let id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);
        let name = name.unwrap_or_else(|| match parent {
            Some(p) => format!("{}/child-{}", p.name, id),
            None => "root".to_string(),
        });
        Arc::new(Self {
            id,
            name,
            container,
            parent: parent.map(Arc::downgrade),
            children: Mutex::new(Vec::new()),
            cache: InstanceCache::default(),
            disposables: Mutex::new(DisposeBag::default()),
            state: RwLock::new(ScopeState::Active),
            disposing: AtomicBool::new(false),
            cancellation: CancellationToken::new(),
            entry_points: OnceCell::new(),
        })
    }

    pub(crate) fn ensure_alive(&self) -> DiResult<()> {
        match *self.state.read_recursive() {
            ScopeState::Active => Ok(()),
            ScopeState::Disposed => Err(DiError::DisposedScope(self.name.clone())),
        }
    }

    /// Scope whose container declared the registration.
    ///
    /// Falls back to the tree root when no scope in the chain was built from
    /// that container, which happens for scopes created directly over a
    /// container compiled with a parent container.
    pub(crate) fn declaring_scope(self: &Arc<Self>, container: u64) -> DiResult<Arc<ScopeInner>> {
        let mut current = self.clone();
        loop {
            if current.container.id() == container {
                return Ok(current);
            }
            let next = match &current.parent {
                None => return Ok(current),
                Some(weak) => weak
                    .upgrade()
                    .ok_or_else(|| DiError::DisposedScope(format!("parent of '{}'", current.name)))?,
            };
            current = next;
        }
    }

    pub(crate) fn track(&self, contract: &'static str, instance: AnyArc, hook: DisposeHook) {
        self.disposables.lock().push(contract, instance, hook);
    }

    fn attach(self: &Arc<Self>, child: Arc<ScopeInner>) -> DiResult<()> {
        let mut children = self.children.lock();
        if self.disposing.load(Ordering::Acquire) {
            return Err(DiError::DisposedScope(self.name.clone()));
        }
        children.push(child);
        Ok(())
    }

    fn dispose(self: &Arc<Self>) -> Vec<DisposeFailure> {
        if self.disposing.swap(true, Ordering::AcqRel) {
            return Vec::new();
        }

        let mut failures = Vec::new();

        // Children first, most recently created first
        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().rev() {
            failures.extend(child.dispose());
        }

        // Wait out in-flight resolutions, then refuse new ones
        let mut bag = {
            let mut state = self.state.write();
            *state = ScopeState::Disposed;
            std::mem::take(&mut *self.disposables.lock())
        };
        self.cancellation.cancel();

        let tracked = bag.len();
        failures.extend(bag.run_all_reverse(&self.name));
        self.cache.clear();

        if let Some(parent) = self.parent.as_ref().and_then(Weak::upgrade) {
            parent.children.lock().retain(|c| !Arc::ptr_eq(c, self));
        }

        tracing::debug!(scope = %self.name, disposed = tracked, failures = failures.len(), "scope disposed");
        failures
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        let bag = self.disposables.get_mut();
        if !bag.is_empty() {
            tracing::warn!(
                scope = %self.name,
                undisposed = bag.len(),
                "scope dropped with undisposed instances; call dispose() before dropping"
            );
        }
    }
}

/// Handle to a node of the lifetime scope tree.
///
/// Cloning the handle does not create a new scope; use
/// [`create_child`](Self::create_child) for that.
///
/// # Lifetime Behavior
///
/// - **Singleton**: cached in the scope whose container declared it and
///   shared by that scope's whole subtree
/// - **Scoped**: cached in the scope that requested it
/// - **Transient**: created fresh on every resolution (no caching)
///
/// # Examples
///
/// ```
/// use arbor_di::{ContainerBuilder, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct DatabaseConnection(String);
///
/// struct UserService {
///     db: Arc<DatabaseConnection>,
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_factory(Lifetime::Scoped, |_| {
///     Ok(DatabaseConnection("connection-123".to_string()))
/// }).unwrap();
/// builder.register_factory(Lifetime::Transient, |ctx| {
///     Ok(UserService { db: ctx.get::<DatabaseConnection>()? })
/// }).unwrap();
///
/// let root = builder.build_scope().unwrap();
/// let request = root.create_child().unwrap();
///
/// // Services in the same scope share the scoped connection
/// let user1 = request.get_required::<UserService>();
/// let user2 = request.get_required::<UserService>();
/// assert!(Arc::ptr_eq(&user1.db, &user2.db));
///
/// // Another scope gets its own
/// let other = root.create_child().unwrap();
/// assert!(!Arc::ptr_eq(&user1.db, &other.get_required::<UserService>().db));
/// ```
#[derive(Clone)]
pub struct LifetimeScope {
    inner: Arc<ScopeInner>,
    // Root of the tree `inner` was attached to
    tree: Arc<ScopeInner>,
}

impl LifetimeScope {
    /// Creates a root scope over a compiled container.
    pub fn new(container: Arc<Container>) -> Self {
        Self::named(container, "root")
    }

    /// Creates a named root scope over a compiled container.
    pub fn named(container: Arc<Container>, name: impl Into<String>) -> Self {
        let inner = ScopeInner::new(Some(name.into()), container, None);
        tracing::debug!(scope = %inner.name, container = inner.container.id(), "root scope created");
        Self { tree: inner.clone(), inner }
    }

    fn relative(&self, inner: Arc<ScopeInner>) -> LifetimeScope {
        LifetimeScope { inner, tree: self.tree.clone() }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.inner.container
    }

    /// Parent scope; `None` for a root.
    pub fn parent(&self) -> Option<LifetimeScope> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| self.relative(inner))
    }

    /// Live children in creation order.
    pub fn children(&self) -> Vec<LifetimeScope> {
        self.inner
            .children
            .lock()
            .iter()
            .map(|inner| self.relative(inner.clone()))
            .collect()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposing.load(Ordering::Acquire)
    }

    /// Token cancelled when this scope (or any ancestor) is disposed.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancellation.clone()
    }

    /// Number of instances currently cached by this scope node.
    pub fn cached_instances(&self) -> usize {
        self.inner.cache.len()
    }

    /// Whether both handles refer to the same scope node.
    pub fn ptr_eq(&self, other: &LifetimeScope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Creates a child scope with no extra registrations.
    ///
    /// The child still consumes the top pending ambient entry, if any, and
    /// applies its installers.
    pub fn create_child(&self) -> DiResult<LifetimeScope> {
        self.child().build()
    }

    /// Creates a child scope configured by `installer`.
    ///
    /// # Examples
    ///
    /// ```
    /// use arbor_di::{ContainerBuilder, DiResult, Resolver};
    ///
    /// let root = ContainerBuilder::new().build_scope().unwrap();
    /// let child = root
    ///     .create_child_with(|b: &mut ContainerBuilder| -> DiResult<()> {
    ///         b.register_instance(7u32)?;
    ///         Ok(())
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(*child.get_required::<u32>(), 7);
    /// assert!(root.get::<u32>().is_err());
    /// ```
    pub fn create_child_with(&self, installer: impl Installer + 'static) -> DiResult<LifetimeScope> {
        self.child().install(installer).build()
    }

    /// Creates a child scope configured by a reusable template.
    pub fn create_child_from(&self, template: &dyn ScopeTemplate) -> DiResult<LifetimeScope> {
        self.child().template(template).build()
    }

    /// Starts building a child scope.
    ///
    /// The pending ambient entry (if any) is consumed here, on the calling
    /// thread.
    pub fn child(&self) -> ChildScopeBuilder<'_> {
        let mut builder = ContainerBuilder::with_options(self.inner.container.options().clone());
        let error = apply_pending(&mut builder, Some(self)).err();
        ChildScopeBuilder { parent: self, builder, name: None, error }
    }

    /// Creates a child scope whose registry is filled by an async loader.
    ///
    /// The ambient entry is consumed before the loader runs; the child is
    /// compiled and attached once the loader completes.
    #[cfg(feature = "async")]
    pub async fn create_child_async<F, Fut>(&self, loader: F) -> DiResult<LifetimeScope>
    where
        F: FnOnce(ContainerBuilder) -> Fut,
        Fut: std::future::Future<Output = DiResult<ContainerBuilder>>,
    {
        let mut builder = ContainerBuilder::with_options(self.inner.container.options().clone());
        apply_pending(&mut builder, Some(self))?;
        let mut builder = loader(builder).await?;
        self.attach_child(&mut builder, None)
    }

    /// Compiles `builder` against this scope's container and attaches the
    /// result as a new child.
    pub(crate) fn attach_child(&self, builder: &mut ContainerBuilder, name: Option<String>) -> DiResult<LifetimeScope> {
        self.inner.ensure_alive()?;
        let container = builder.build_with_parent(&self.inner.container)?;
        let child = ScopeInner::new(name, container, Some(&self.inner));
        self.inner.attach(child.clone())?;
        tracing::debug!(
            scope = %child.name,
            parent = %self.inner.name,
            container = child.container.id(),
            "child scope created"
        );
        Ok(self.relative(child))
    }

    /// Entry points registered in this scope's container, resolved once in
    /// registration order.
    pub fn entry_points(&self) -> DiResult<EntryPoints> {
        self.inner
            .entry_points
            .get_or_try_init(|| {
                let _state = self.enter()?;
                let path = self.new_path();
                let mut points = Vec::new();
                for reg in self.inner.container.registrations() {
                    if reg.entry_points.is_empty() {
                        continue;
                    }
                    let _frame = path.enter(&reg.self_binding.key)?;
                    let instance = super::activate(&self.inner, reg, &path)?;
                    for hook in &reg.entry_points {
                        points.push(hook(&instance)?);
                    }
                }
                Ok(EntryPoints::from_resolved(points))
            })
            .cloned()
    }

    /// Disposes this scope: children first (most recent first), then this
    /// scope's instances in reverse construction order, then detaches it
    /// from its parent.
    ///
    /// Idempotent. Failures of individual instances do not stop disposal;
    /// they are returned together.
    pub fn dispose(&self) -> Result<(), DisposeError> {
        let failures = self.inner.dispose();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DisposeError { failures })
        }
    }

    /// Runs `f` with a context bound to this scope, as a factory would see it.
    pub fn with_context<R>(&self, f: impl FnOnce(&ResolverContext<'_>) -> R) -> DiResult<R> {
        let _state = self.enter()?;
        let path = self.new_path();
        Ok(f(&ResolverContext::new(&self.inner, &path)))
    }

    fn enter(&self) -> DiResult<parking_lot::RwLockReadGuard<'_, ScopeState>> {
        let state = self.inner.state.read_recursive();
        match *state {
            ScopeState::Active => Ok(state),
            ScopeState::Disposed => Err(DiError::DisposedScope(self.inner.name.clone())),
        }
    }

    fn new_path(&self) -> ResolutionPath {
        ResolutionPath::new(self.inner.container.options().max_depth)
    }
}

impl ResolverCore for LifetimeScope {
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>> {
        let _state = self.enter()?;
        super::resolve(&self.inner, key, &self.new_path())
    }

    fn resolve_many(&self, key: &Key) -> DiResult<Vec<Arc<dyn Any + Send + Sync>>> {
        let _state = self.enter()?;
        super::resolve_all(&self.inner, key, &self.new_path())
    }

    fn contains(&self, key: &Key) -> bool {
        self.inner.container.contains(key)
    }
}

impl std::fmt::Debug for LifetimeScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifetimeScope")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("container", &self.inner.container.id())
            .field("children", &self.inner.children.lock().len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Applies the top pending ambient entry to `builder` and returns its parent.
///
/// A queued parent is ignored when the caller already has an explicit one.
pub(crate) fn apply_pending(
    builder: &mut ContainerBuilder,
    explicit_parent: Option<&LifetimeScope>,
) -> DiResult<Option<LifetimeScope>> {
    let Some(pending) = ambient::take_pending() else {
        return Ok(None);
    };
    for installer in pending.installers {
        installer.install(builder)?;
    }
    if explicit_parent.is_some() && pending.parent.is_some() {
        tracing::trace!("ignoring queued parent for child scope with an explicit parent");
    }
    Ok(pending.parent)
}

/// Builder for a child scope.
///
/// Installers and templates are applied immediately, in call order; the first
/// failure is reported by [`build`](Self::build).
///
/// # Examples
///
/// ```
/// use arbor_di::{ContainerBuilder, DiResult, Resolver};
///
/// let root = ContainerBuilder::new().build_scope().unwrap();
/// let request = root
///     .child()
///     .name("request-42")
///     .install(|b: &mut ContainerBuilder| -> DiResult<()> {
///         b.register_instance(42u64)?;
///         Ok(())
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(request.name(), "request-42");
/// assert_eq!(*request.get_required::<u64>(), 42);
/// ```
pub struct ChildScopeBuilder<'p> {
    parent: &'p LifetimeScope,
    builder: ContainerBuilder,
    name: Option<String>,
    error: Option<DiError>,
}

impl ChildScopeBuilder<'_> {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn options(mut self, options: ContainerOptions) -> Self {
        self.builder.set_options(options);
        self
    }

    pub fn install(mut self, installer: impl Installer + 'static) -> Self {
        if self.error.is_none() {
            if let Err(e) = Box::new(installer).install(&mut self.builder) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn template(mut self, template: &dyn ScopeTemplate) -> Self {
        if self.error.is_none() {
            if let Err(e) = template.configure(&mut self.builder) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn build(mut self) -> DiResult<LifetimeScope> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.parent.attach_child(&mut self.builder, self.name)
    }
}
