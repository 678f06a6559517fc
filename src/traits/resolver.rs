//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::DiResult;
use crate::key::{key_of_trait, key_of_type, Key};
use crate::registration::{downcast_trait, downcast_type};

/// Core resolver trait for object-safe service resolution.
///
/// This trait provides the fundamental, type-erased resolution operations.
/// It is implemented by [`LifetimeScope`](crate::LifetimeScope), which starts
/// a fresh resolution path for every call, and by
/// [`ResolverContext`](crate::ResolverContext), which continues the path of
/// the resolution it was handed to.
///
/// Most users should use the [`Resolver`] trait instead, which provides
/// generic methods built on top of this trait.
pub trait ResolverCore {
    /// Resolves a single contract.
    ///
    /// When several registrations answer to the contract, the last one
    /// declared wins; local registrations shadow those of ancestors.
    ///
    /// # Returns
    ///
    /// * `Ok(AnyArc)` - `Arc<T>` for concrete contracts, `Arc<Arc<dyn Trait>>` for trait contracts
    /// * `Err(DiError)` - Unresolved, circular, disposed scope, factory failure, etc.
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// Resolves every registration of a contract.
    ///
    /// Ancestors' registrations come first, then local ones, each in
    /// declaration order. An unknown contract yields an empty vector.
    fn resolve_many(&self, key: &Key) -> DiResult<Vec<Arc<dyn Any + Send + Sync>>>;

    /// Whether any container in the chain registers the contract.
    fn contains(&self, key: &Key) -> bool;
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// Implemented for every [`ResolverCore`], so scopes and factory contexts
/// expose the same API.
///
/// # Examples
///
/// ```
/// use arbor_di::{ContainerBuilder, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_instance(42usize).unwrap();
/// builder.register_trait_instance::<dyn Logger>(Arc::new(ConsoleLogger)).unwrap();
///
/// let scope = builder.build_scope().unwrap();
///
/// // Resolve concrete types
/// let number = scope.get_required::<usize>();
/// assert_eq!(*number, 42);
///
/// // Resolve trait objects
/// let logger = scope.get_required_trait::<dyn Logger>();
/// assert_eq!(logger.log("ready"), "LOG: ready");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    ///
    /// # Examples
    ///
    /// ```
    /// use arbor_di::{ContainerBuilder, Resolver};
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.register_instance("configuration".to_string()).unwrap();
    ///
    /// let scope = builder.build_scope().unwrap();
    /// let config = scope.get::<String>().unwrap();
    /// assert_eq!(&*config, "configuration");
    /// ```
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast_type::<T>(self.resolve_any(&key_of_type::<T>())?)
    }

    /// Resolves a single trait implementation.
    ///
    /// Returns the most recently registered implementation for the trait `T`.
    /// For accessing all implementations, use [`get_all_trait`](Self::get_all_trait).
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast_trait::<T>(self.resolve_any(&key_of_trait::<T>())?)
    }

    /// Resolves every registration of a concrete type.
    fn get_all<T: Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_many(&key_of_type::<T>())?
            .into_iter()
            .map(downcast_type::<T>)
            .collect()
    }

    /// Resolves all registered implementations of a trait.
    ///
    /// # Examples
    ///
    /// ```
    /// use arbor_di::{ContainerBuilder, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Plugin: Send + Sync {
    ///     fn name(&self) -> &str;
    /// }
    ///
    /// struct PluginA;
    /// impl Plugin for PluginA {
    ///     fn name(&self) -> &str { "Plugin A" }
    /// }
    ///
    /// struct PluginB;
    /// impl Plugin for PluginB {
    ///     fn name(&self) -> &str { "Plugin B" }
    /// }
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.register_trait_instance::<dyn Plugin>(Arc::new(PluginA)).unwrap();
    /// builder.register_trait_instance::<dyn Plugin>(Arc::new(PluginB)).unwrap();
    ///
    /// let scope = builder.build_scope().unwrap();
    /// let plugins = scope.get_all_trait::<dyn Plugin>().unwrap();
    /// assert_eq!(plugins.len(), 2);
    /// assert_eq!(plugins[0].name(), "Plugin A");
    /// assert_eq!(plugins[1].name(), "Plugin B");
    /// ```
    fn get_all_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_many(&key_of_trait::<T>())?
            .into_iter()
            .map(downcast_trait::<T>)
            .collect()
    }

    /// Resolves a concrete service type, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be resolved (not found, circular
    /// dependency, disposed scope, etc.).
    fn get_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a trait implementation, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the trait cannot be resolved.
    fn get_required_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get_trait::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve trait {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a named concrete service type.
    ///
    /// # Examples
    ///
    /// ```
    /// use arbor_di::{ContainerBuilder, Resolver};
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.register_instance(5432u16).unwrap().named("db");
    /// builder.register_instance(6379u16).unwrap().named("cache");
    ///
    /// let scope = builder.build_scope().unwrap();
    /// assert_eq!(*scope.get_named::<u16>("cache").unwrap(), 6379);
    /// assert!(scope.get::<u16>().is_err());
    /// ```
    fn get_named<T: Send + Sync + 'static>(&self, name: &'static str) -> DiResult<Arc<T>> {
        downcast_type::<T>(self.resolve_any(&key_of_type::<T>().with_name(name))?)
    }

    /// Resolves a named concrete service type, panicking on failure.
    fn get_named_required<T: Send + Sync + 'static>(&self, name: &'static str) -> Arc<T> {
        self.get_named::<T>(name).unwrap_or_else(|e| {
            panic!("Failed to resolve named {} ({}): {}", std::any::type_name::<T>(), name, e)
        })
    }

    /// Resolves a named trait implementation.
    fn get_named_trait<T: ?Sized + Send + Sync + 'static>(&self, name: &'static str) -> DiResult<Arc<T>> {
        downcast_trait::<T>(self.resolve_any(&key_of_trait::<T>().with_name(name))?)
    }

    /// Resolves a named trait implementation, panicking on failure.
    fn get_named_trait_required<T: ?Sized + Send + Sync + 'static>(&self, name: &'static str) -> Arc<T> {
        self.get_named_trait::<T>(name).unwrap_or_else(|e| {
            panic!("Failed to resolve named trait {} ({}): {}", std::any::type_name::<T>(), name, e)
        })
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
