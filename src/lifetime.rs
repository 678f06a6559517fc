//! Instance lifetime definitions.

/// Lifetimes controlling where an instance is cached and who disposes it.
///
/// # Examples
///
/// ```rust
/// use arbor_di::{ContainerBuilder, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Database;
/// struct Repository;
/// struct RequestModel;
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_factory(Lifetime::Singleton, |_| Ok(Database)).unwrap();
/// builder.register_factory(Lifetime::Scoped, |_| Ok(Repository)).unwrap();
/// builder.register_factory(Lifetime::Transient, |_| Ok(RequestModel)).unwrap();
///
/// let root = builder.build_scope().unwrap();
/// let child = root.create_child().unwrap();
///
/// // Singleton: same instance across the whole tree
/// assert!(Arc::ptr_eq(&root.get_required::<Database>(), &child.get_required::<Database>()));
///
/// // Scoped: same within a scope, different across scopes
/// let repo = child.get_required::<Repository>();
/// assert!(Arc::ptr_eq(&repo, &child.get_required::<Repository>()));
/// assert!(!Arc::ptr_eq(&repo, &root.get_required::<Repository>()));
///
/// // Transient: always different
/// assert!(!Arc::ptr_eq(&child.get_required::<RequestModel>(), &child.get_required::<RequestModel>()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifetime {
    /// One instance per declaring scope subtree
    ///
    /// Cached in the scope whose container declared the registration and
    /// shared by every descendant scope. Its dependencies are resolved from
    /// the declaring scope, never from the requesting descendant.
    Singleton,
    /// One instance per scope node
    ///
    /// Cached in whichever scope requested it; sibling scopes get distinct
    /// instances even when the registration lives in their common parent.
    Scoped,
    /// New instance per resolution, never cached
    ///
    /// The container never tracks transient instances for disposal; the
    /// caller owns them.
    Transient,
}

impl std::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        };
        f.write_str(s)
    }
}
