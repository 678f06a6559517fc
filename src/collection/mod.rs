//! Binding registry.
//!
//! This module contains the `ContainerBuilder` type, where registrations are
//! collected during configuration, and the `RegistrationBuilder` handle that
//! refines the registration just added.

use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::compiler;
use crate::container::Container;
use crate::descriptors::ServiceDescriptor;
use crate::entry_points::EntryPoint;
use crate::error::{BoxError, ConfigurationError, DiResult};
use crate::key::{key_of_trait, key_of_type};
use crate::lifetime::Lifetime;
use crate::options::ContainerOptions;
use crate::plan::{Injectable, InjectionPoint, TypePlan};
use crate::provider::{apply_pending, LifetimeScope, ResolverContext};
use crate::registration::{
    downcast_trait, downcast_type, seal, Activator, AnyArc, AnyBox, Builder, ContractBinding, OverrideTarget,
    ParameterOverride, Registration,
};
use crate::traits::{AsyncStartable, Dispose, Startable};

pub mod module_system;
pub use module_system::*;

type Unwrap<T> = fn(AnyArc) -> DiResult<Arc<T>>;

/// Append-only registry of bindings.
///
/// Registrations are kept in declaration order. For single lookups the last
/// registration of a contract wins; collection lookups return all of them.
/// Nothing is instantiated until a scope resolves it.
///
/// Compiling the builder ([`build`](Self::build) and friends) freezes it:
/// later registrations fail with [`ConfigurationError::Frozen`].
///
/// # Examples
///
/// ```rust
/// use arbor_di::{ContainerBuilder, ConfigurationError, DiError, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder
///     .register_factory(Lifetime::Singleton, |_| Ok(English))
///     .unwrap()
///     .as_trait::<dyn Greeter>(|e| e);
///
/// let scope = builder.build_scope().unwrap();
/// assert_eq!(scope.get_required_trait::<dyn Greeter>().greet(), "hello");
///
/// assert!(matches!(
///     builder.register_instance(1u8),
///     Err(DiError::Configuration(ConfigurationError::Frozen(_)))
/// ));
/// ```
pub struct ContainerBuilder {
    registrations: Vec<Registration>,
    options: ContainerOptions,
    frozen: bool,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    /// Creates a new empty builder with default options.
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        Self {
            registrations: Vec::new(),
            options,
            frozen: false,
        }
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ContainerOptions) {
        self.options = options;
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Descriptors of every registration, in declaration order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registrations.iter().map(ServiceDescriptor::from_registration).collect()
    }

    fn push<T: ?Sized + 'static>(
        &mut self,
        registration: Registration,
        unwrap: Unwrap<T>,
    ) -> DiResult<RegistrationBuilder<'_, T>> {
        if self.frozen {
            return Err(ConfigurationError::Frozen(registration.implementation).into());
        }
        tracing::trace!(
            implementation = registration.implementation,
            lifetime = %registration.lifetime,
            "registered"
        );
        let index = self.registrations.len();
        self.registrations.push(registration);
        Ok(RegistrationBuilder {
            registration: &mut self.registrations[index],
            unwrap,
            _marker: PhantomData,
        })
    }

    // ----- Plan Registrations -----

    /// Registers `T` through its own injection plan.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbor_di::{ContainerBuilder, Constructor, Injectable, Lifetime, Resolver, TypePlan};
    ///
    /// struct Clock;
    ///
    /// impl Injectable for Clock {
    ///     fn plan() -> TypePlan<Self> {
    ///         TypePlan::new().constructor(Constructor::new("new", |_| Ok(Clock)))
    ///     }
    /// }
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.register::<Clock>(Lifetime::Transient).unwrap();
    /// let scope = builder.build_scope().unwrap();
    /// assert!(scope.get::<Clock>().is_ok());
    /// ```
    pub fn register<T: Injectable>(&mut self, lifetime: Lifetime) -> DiResult<RegistrationBuilder<'_, T>> {
        self.register_plan(T::plan(), lifetime)
    }

    /// Registers `T` through an explicitly built plan.
    pub fn register_plan<T>(&mut self, plan: TypePlan<T>, lifetime: Lifetime) -> DiResult<RegistrationBuilder<'_, T>>
    where
        T: Send + Sync + 'static,
    {
        let (plan, members) = plan.into_parts();
        let mut registration = Registration::new(
            type_name::<T>(),
            key_of_type::<T>(),
            lifetime,
            Activator::Construct {
                builder: Builder::Plan(plan),
                seal: seal::<T>,
            },
        );
        registration.members = members;
        self.push(registration, downcast_type::<T>)
    }

    pub fn register_singleton<T: Injectable>(&mut self) -> DiResult<RegistrationBuilder<'_, T>> {
        self.register::<T>(Lifetime::Singleton)
    }

    pub fn register_scoped<T: Injectable>(&mut self) -> DiResult<RegistrationBuilder<'_, T>> {
        self.register::<T>(Lifetime::Scoped)
    }

    pub fn register_transient<T: Injectable>(&mut self) -> DiResult<RegistrationBuilder<'_, T>> {
        self.register::<T>(Lifetime::Transient)
    }

    // ----- Factory Registrations -----

    /// Registers a factory closure.
    ///
    /// The factory receives a [`ResolverContext`] for its dependencies and
    /// runs once per construction as dictated by `lifetime`.
    pub fn register_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> DiResult<RegistrationBuilder<'_, T>>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        let build = move |ctx: &ResolverContext<'_>| -> DiResult<AnyBox> { Ok(Box::new(factory(ctx)?)) };
        let registration = Registration::new(
            type_name::<T>(),
            key_of_type::<T>(),
            lifetime,
            Activator::Construct {
                builder: Builder::Factory(Arc::new(build)),
                seal: seal::<T>,
            },
        );
        self.push(registration, downcast_type::<T>)
    }

    /// Registers a factory producing a trait object.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arbor_di::{ContainerBuilder, Lifetime, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Rng: Send + Sync {
    ///     fn next(&self) -> u32;
    /// }
    /// struct Fixed;
    /// impl Rng for Fixed {
    ///     fn next(&self) -> u32 { 4 }
    /// }
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder
    ///     .register_trait_factory::<dyn Rng, _>(Lifetime::Transient, |_| Ok(Arc::new(Fixed)))
    ///     .unwrap();
    /// let scope = builder.build_scope().unwrap();
    /// assert_eq!(scope.get_required_trait::<dyn Rng>().next(), 4);
    /// ```
    pub fn register_trait_factory<T, F>(
        &mut self,
        lifetime: Lifetime,
        factory: F,
    ) -> DiResult<RegistrationBuilder<'_, T>>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let build = move |ctx: &ResolverContext<'_>| -> DiResult<AnyBox> { Ok(Box::new(factory(ctx)?)) };
        let registration = Registration::new(
            type_name::<T>(),
            key_of_trait::<T>(),
            lifetime,
            Activator::Construct {
                builder: Builder::Factory(Arc::new(build)),
                seal: seal::<Arc<T>>,
            },
        );
        self.push(registration, downcast_trait::<T>)
    }

    // ----- Instance Registrations -----

    /// Registers a pre-built instance.
    ///
    /// Instances are singletons of the registering scope and receive no
    /// member injection. They are only disposed when explicitly marked
    /// [`disposable`](RegistrationBuilder::disposable).
    pub fn register_instance<T: Send + Sync + 'static>(&mut self, value: T) -> DiResult<RegistrationBuilder<'_, T>> {
        self.register_instance_arc(Arc::new(value))
    }

    pub fn register_instance_arc<T: Send + Sync + 'static>(
        &mut self,
        value: Arc<T>,
    ) -> DiResult<RegistrationBuilder<'_, T>> {
        let registration = Registration::new(
            type_name::<T>(),
            key_of_type::<T>(),
            Lifetime::Singleton,
            Activator::Instance(value),
        );
        self.push(registration, downcast_type::<T>)
    }

    /// Registers a pre-built trait object instance.
    pub fn register_trait_instance<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        value: Arc<T>,
    ) -> DiResult<RegistrationBuilder<'_, T>> {
        let registration = Registration::new(
            type_name::<T>(),
            key_of_trait::<T>(),
            Lifetime::Singleton,
            Activator::Instance(Arc::new(value)),
        );
        self.push(registration, downcast_trait::<T>)
    }

    // ----- Modules -----

    /// Applies an installer to this builder.
    pub fn install(&mut self, installer: impl Installer + 'static) -> DiResult<&mut Self> {
        Box::new(installer).install(self)?;
        Ok(self)
    }

    /// Applies a reusable template to this builder.
    pub fn apply(&mut self, template: &dyn ScopeTemplate) -> DiResult<&mut Self> {
        template.configure(self)?;
        Ok(self)
    }

    // ----- Compilation -----

    /// Compiles the registrations into a root container.
    pub fn build(&mut self) -> DiResult<Arc<Container>> {
        self.compile(None)
    }

    /// Compiles the registrations into a container whose lookups fall back
    /// to `parent`.
    pub fn build_with_parent(&mut self, parent: &Arc<Container>) -> DiResult<Arc<Container>> {
        self.compile(Some(parent.clone()))
    }

    /// Compiles and wraps the result in a scope.
    ///
    /// Consumes the top pending ambient entry, if any: its installers are
    /// applied first, and when it names a parent the new scope is attached
    /// under that parent instead of becoming a root.
    pub fn build_scope(&mut self) -> DiResult<LifetimeScope> {
        match apply_pending(self, None)? {
            Some(parent) => parent.attach_child(self, None),
            None => Ok(LifetimeScope::new(self.build()?)),
        }
    }

    fn compile(&mut self, parent: Option<Arc<Container>>) -> DiResult<Arc<Container>> {
        let container = compiler::compile(self.registrations.clone(), self.options.clone(), parent)?;
        self.frozen = true;
        Ok(Arc::new(container))
    }
}

impl std::fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("registrations", &self.registrations.len())
            .field("options", &self.options)
            .field("frozen", &self.frozen)
            .finish()
    }
}

/// Refines the registration just added to a [`ContainerBuilder`].
///
/// Holding the handle borrows the builder mutably, so a registration can
/// only be refined before compilation.
///
/// # Examples
///
/// ```rust
/// use arbor_di::{ContainerBuilder, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// trait Storage: Send + Sync {}
/// trait Cache: Send + Sync {}
///
/// struct Memory;
/// impl Storage for Memory {}
/// impl Cache for Memory {}
///
/// let mut builder = ContainerBuilder::new();
/// builder
///     .register_factory(Lifetime::Singleton, |_| Ok(Memory))
///     .unwrap()
///     .as_self()
///     .as_trait::<dyn Storage>(|m| m)
///     .as_trait::<dyn Cache>(|m| m);
///
/// let scope = builder.build_scope().unwrap();
/// let memory = scope.get_required::<Memory>();
/// let storage = scope.get_required_trait::<dyn Storage>();
/// assert!(std::ptr::eq(
///     Arc::as_ptr(&memory) as *const u8,
///     Arc::as_ptr(&storage) as *const u8,
/// ));
/// ```
pub struct RegistrationBuilder<'a, T: ?Sized + 'static> {
    registration: &'a mut Registration,
    unwrap: Unwrap<T>,
    _marker: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> RegistrationBuilder<'_, T> {
    /// Exposes the implementation itself as a contract, in addition to any
    /// other contracts declared.
    pub fn as_self(self) -> Self {
        let own = self.registration.self_binding.clone();
        if !self.registration.contracts.iter().any(|c| c.key == own.key) {
            self.registration.contracts.push(own);
        }
        self
    }

    /// Exposes the implementation as the trait `I`.
    ///
    /// `cast` is normally the identity closure `|x| x`, which coerces
    /// `Arc<T>` into `Arc<I>`.
    pub fn as_trait<I: ?Sized + Send + Sync + 'static>(self, cast: fn(Arc<T>) -> Arc<I>) -> Self {
        let unwrap = self.unwrap;
        let binding = ContractBinding {
            key: key_of_trait::<I>(),
            cast: Arc::new(move |any| Ok(Arc::new(cast(unwrap(any)?)) as AnyArc)),
        };
        self.registration.contracts.push(binding);
        self
    }

    /// Makes this a keyed registration; every contract is qualified by `name`.
    pub fn named(self, name: &'static str) -> Self {
        self.registration.name = Some(name);
        self
    }

    /// Binds the parameter called `name` to `value`, bypassing resolution.
    pub fn with_parameter<V: Send + Sync + 'static>(self, name: &'static str, value: V) -> Self {
        self.add_override(OverrideTarget::Name(name), Arc::new(value))
    }

    /// Binds the trait parameter called `name` to `value`.
    pub fn with_trait_parameter<I: ?Sized + Send + Sync + 'static>(self, name: &'static str, value: Arc<I>) -> Self {
        self.add_override(OverrideTarget::Name(name), Arc::new(value))
    }

    /// Binds every parameter of type `V` to `value`.
    pub fn with_parameter_of<V: Send + Sync + 'static>(self, value: V) -> Self {
        self.add_override(OverrideTarget::Contract(key_of_type::<V>()), Arc::new(value))
    }

    /// Binds every parameter of trait `I` to `value`.
    pub fn with_trait_parameter_of<I: ?Sized + Send + Sync + 'static>(self, value: Arc<I>) -> Self {
        self.add_override(OverrideTarget::Contract(key_of_trait::<I>()), Arc::new(value))
    }

    fn add_override(self, target: OverrideTarget, value: AnyArc) -> Self {
        self.registration.overrides.push(ParameterOverride { target, value });
        self
    }

    /// Forces construction through the named constructor.
    pub fn with_constructor(self, name: &'static str) -> Self {
        self.registration.constructor_hint = Some(name);
        self
    }

    /// Has the owning scope dispose the instance.
    ///
    /// Applies to singleton, scoped and instance registrations; transient
    /// instances belong to the caller and are never tracked.
    pub fn disposable(self) -> Self
    where
        T: Dispose,
    {
        let unwrap = self.unwrap;
        self.registration.dispose = Some(Arc::new(move |any: &AnyArc| -> Result<(), BoxError> {
            unwrap(any.clone())?.dispose()
        }));
        self
    }
}

impl<T: Send + Sync + 'static> RegistrationBuilder<'_, T> {
    /// Adds a method or field injection point, applied after construction in
    /// declaration order.
    pub fn inject(self, point: InjectionPoint<T>) -> Self {
        self.registration.members.push(Arc::new(point));
        self
    }

    /// Hands the instance to the host as a synchronous entry point.
    pub fn as_entry_point(self) -> Self
    where
        T: Startable,
    {
        let unwrap = self.unwrap;
        self.registration
            .entry_points
            .push(Arc::new(move |any: &AnyArc| Ok(EntryPoint::Start(unwrap(any.clone())?))));
        self
    }

    /// Hands the instance to the host as an async entry point.
    pub fn as_async_entry_point(self) -> Self
    where
        T: AsyncStartable,
    {
        let unwrap = self.unwrap;
        self.registration
            .entry_points
            .push(Arc::new(move |any: &AnyArc| Ok(EntryPoint::AsyncStart(unwrap(any.clone())?))));
        self
    }
}
