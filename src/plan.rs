//! Injection plans: how an implementation is constructed and wired.
//!
//! A [`TypePlan`] lists the constructors an implementation offers and the
//! member injection points applied after construction. Types provide one
//! either statically through [`Injectable`] or at runtime through
//! `ContainerBuilder::register_plan`; the resolver consumes both the same way.

use std::any::type_name;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::{ConfigurationError, DiError, DiResult};
use crate::key::{key_of_trait, key_of_type, Key};
use crate::provider::ResolverContext;
use crate::registration::{downcast_trait, downcast_type, find_override, AnyArc, AnyBox, ParameterOverride};
use crate::traits::ResolverCore;

/// How a parameter is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Exactly one instance; unresolved is an error
    Single,
    /// Every registration under the contract, possibly none
    Collection,
    /// One instance when registered, otherwise `None`
    Optional,
}

/// A dependency declared by a constructor or injection point.
///
/// # Examples
///
/// ```rust
/// use arbor_di::{Param, ParamKind};
///
/// trait Weapon: Send + Sync {}
///
/// let p = Param::all_trait::<dyn Weapon>("weapons");
/// assert_eq!(p.kind(), ParamKind::Collection);
///
/// let p = Param::of::<u32>("port").named("http").checked();
/// assert_eq!(p.key().service_name(), Some("http"));
/// assert!(p.is_checked());
/// ```
#[derive(Debug, Clone)]
pub struct Param {
    name: &'static str,
    key: Key,
    kind: ParamKind,
    checked: bool,
}

impl Param {
    fn new(name: &'static str, key: Key, kind: ParamKind) -> Self {
        Self { name, key, kind, checked: false }
    }

    /// Single concrete dependency.
    pub fn of<T: Send + Sync + 'static>(name: &'static str) -> Self {
        Self::new(name, key_of_type::<T>(), ParamKind::Single)
    }

    /// Single trait dependency, e.g. `Param::of_trait::<dyn Logger>("logger")`.
    pub fn of_trait<T: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
        Self::new(name, key_of_trait::<T>(), ParamKind::Single)
    }

    /// Every concrete registration of `T`.
    pub fn all<T: Send + Sync + 'static>(name: &'static str) -> Self {
        Self::new(name, key_of_type::<T>(), ParamKind::Collection)
    }

    /// Every registration of the trait `T`.
    pub fn all_trait<T: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
        Self::new(name, key_of_trait::<T>(), ParamKind::Collection)
    }

    /// Resolve to `None` instead of failing when nothing is registered.
    pub fn optional(mut self) -> Self {
        self.kind = ParamKind::Optional;
        self
    }

    /// Depend on a keyed registration.
    pub fn named(mut self, service: &'static str) -> Self {
        self.key = self.key.with_name(service);
        self
    }

    /// Verify at compile time that the dependency is registered.
    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }
}

enum ArgValue {
    One(AnyArc),
    Missing,
    Many(Vec<AnyArc>),
}

/// Resolved arguments for one constructor or injection point.
///
/// Values are taken in parameter declaration order; each `take*` call
/// consumes the next argument and checks it against the requested type.
pub struct Args {
    owner: &'static str,
    values: std::vec::IntoIter<(&'static str, ArgValue)>,
}

impl Args {
    /// Resolves `params` against `ctx`, applying overrides first.
    pub(crate) fn resolve(
        ctx: &ResolverContext<'_>,
        owner: &'static str,
        params: &[Param],
        overrides: &[ParameterOverride],
    ) -> DiResult<Self> {
        let mut values = Vec::with_capacity(params.len());
        for param in params {
            let value = match (param.kind, find_override(overrides, param.name, &param.key)) {
                (ParamKind::Single | ParamKind::Optional, Some(value)) => ArgValue::One(value.clone()),
                (ParamKind::Single, None) => ArgValue::One(ctx.resolve_any(&param.key)?),
                (ParamKind::Optional, None) => {
                    if ctx.contains(&param.key) {
                        ArgValue::One(ctx.resolve_any(&param.key)?)
                    } else {
                        ArgValue::Missing
                    }
                }
                (ParamKind::Collection, _) => ArgValue::Many(ctx.resolve_many(&param.key)?),
            };
            values.push((param.name, value));
        }
        Ok(Self { owner, values: values.into_iter() })
    }

    fn next(&mut self, expected: &'static str) -> DiResult<(&'static str, ArgValue)> {
        self.values.next().ok_or_else(|| DiError::Factory {
            contract: self.owner,
            message: format!("no argument left for {expected}"),
        })
    }

    fn shape_mismatch(&self, param: &'static str, expected: &'static str) -> DiError {
        DiError::Factory {
            contract: self.owner,
            message: format!("parameter '{param}' does not hold {expected}"),
        }
    }

    /// Takes the next argument as a concrete dependency.
    pub fn take<T: Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        match self.next(type_name::<T>())? {
            (_, ArgValue::One(v)) => downcast_type::<T>(v),
            (param, _) => Err(self.shape_mismatch(param, type_name::<T>())),
        }
    }

    /// Takes the next argument as a trait dependency.
    pub fn take_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        match self.next(type_name::<T>())? {
            (_, ArgValue::One(v)) => downcast_trait::<T>(v),
            (param, _) => Err(self.shape_mismatch(param, type_name::<T>())),
        }
    }

    pub fn take_optional<T: Send + Sync + 'static>(&mut self) -> DiResult<Option<Arc<T>>> {
        match self.next(type_name::<T>())? {
            (_, ArgValue::One(v)) => downcast_type::<T>(v).map(Some),
            (_, ArgValue::Missing) => Ok(None),
            (param, ArgValue::Many(_)) => Err(self.shape_mismatch(param, type_name::<T>())),
        }
    }

    pub fn take_optional_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Option<Arc<T>>> {
        match self.next(type_name::<T>())? {
            (_, ArgValue::One(v)) => downcast_trait::<T>(v).map(Some),
            (_, ArgValue::Missing) => Ok(None),
            (param, ArgValue::Many(_)) => Err(self.shape_mismatch(param, type_name::<T>())),
        }
    }

    pub fn take_all<T: Send + Sync + 'static>(&mut self) -> DiResult<Vec<Arc<T>>> {
        match self.next(type_name::<T>())? {
            (_, ArgValue::Many(vs)) => vs.into_iter().map(downcast_type::<T>).collect(),
            (param, _) => Err(self.shape_mismatch(param, type_name::<T>())),
        }
    }

    pub fn take_all_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Vec<Arc<T>>> {
        match self.next(type_name::<T>())? {
            (_, ArgValue::Many(vs)) => vs.into_iter().map(downcast_trait::<T>).collect(),
            (param, _) => Err(self.shape_mismatch(param, type_name::<T>())),
        }
    }

    /// Number of arguments not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

type BuildFn<T> = Arc<dyn Fn(&mut Args) -> DiResult<T> + Send + Sync>;
type ApplyFn<T> = Arc<dyn Fn(&mut T, &mut Args) -> DiResult<()> + Send + Sync>;

/// One way of constructing `T` from resolved parameters.
///
/// # Examples
///
/// ```rust
/// use arbor_di::{Constructor, Param};
/// use std::sync::Arc;
///
/// struct Db;
/// struct Repo { db: Arc<Db> }
///
/// let ctor = Constructor::new("new", |args| Ok(Repo { db: args.take::<Db>()? }))
///     .param(Param::of::<Db>("db"));
/// assert_eq!(ctor.params().len(), 1);
/// ```
pub struct Constructor<T> {
    name: &'static str,
    params: SmallVec<[Param; 4]>,
    marked: bool,
    build: BuildFn<T>,
}

impl<T> Constructor<T> {
    pub fn new<F>(name: &'static str, build: F) -> Self
    where
        F: Fn(&mut Args) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            name,
            params: SmallVec::new(),
            marked: false,
            build: Arc::new(build),
        }
    }

    /// Appends a parameter; arguments are handed to `build` in this order.
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Marks this constructor as the one to inject through.
    pub fn inject(mut self) -> Self {
        self.marked = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_marked(&self) -> bool {
        self.marked
    }
}

/// Whether an injection point is a method call or a field assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    Field,
}

/// Method or field injected after construction, in declaration order.
pub struct InjectionPoint<T> {
    name: &'static str,
    kind: MemberKind,
    params: SmallVec<[Param; 4]>,
    apply: ApplyFn<T>,
}

impl<T: 'static> InjectionPoint<T> {
    /// Injection method; declare its parameters with [`param`](Self::param).
    pub fn method<F>(name: &'static str, apply: F) -> Self
    where
        F: Fn(&mut T, &mut Args) -> DiResult<()> + Send + Sync + 'static,
    {
        Self {
            name,
            kind: MemberKind::Method,
            params: SmallVec::new(),
            apply: Arc::new(apply),
        }
    }

    /// Field receiving a concrete dependency.
    pub fn field<V, F>(name: &'static str, assign: F) -> Self
    where
        V: Send + Sync + 'static,
        F: Fn(&mut T, Arc<V>) + Send + Sync + 'static,
    {
        let mut params = SmallVec::new();
        params.push(Param::of::<V>(name));
        Self {
            name,
            kind: MemberKind::Field,
            params,
            apply: Arc::new(move |target, args| {
                assign(target, args.take::<V>()?);
                Ok(())
            }),
        }
    }

    /// Field receiving a trait dependency.
    pub fn trait_field<V, F>(name: &'static str, assign: F) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
        F: Fn(&mut T, Arc<V>) + Send + Sync + 'static,
    {
        let mut params = SmallVec::new();
        params.push(Param::of_trait::<V>(name));
        Self {
            name,
            kind: MemberKind::Field,
            params,
            apply: Arc::new(move |target, args| {
                assign(target, args.take_trait::<V>()?);
                Ok(())
            }),
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }
}

/// Constructors and injection points of an implementation.
///
/// # Examples
///
/// ```rust
/// use arbor_di::{ContainerBuilder, Constructor, Injectable, Lifetime, Param, Resolver, TypePlan};
/// use std::sync::Arc;
///
/// struct Config { url: &'static str }
/// struct Client { config: Arc<Config> }
///
/// impl Injectable for Client {
///     fn plan() -> TypePlan<Self> {
///         TypePlan::new().constructor(
///             Constructor::new("new", |args| Ok(Client { config: args.take()? }))
///                 .param(Param::of::<Config>("config")),
///         )
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_instance(Config { url: "db://local" }).unwrap();
/// builder.register::<Client>(Lifetime::Singleton).unwrap();
///
/// let scope = builder.build_scope().unwrap();
/// assert_eq!(scope.get_required::<Client>().config.url, "db://local");
/// ```
pub struct TypePlan<T> {
    constructors: Vec<Constructor<T>>,
    members: Vec<InjectionPoint<T>>,
}

impl<T> Default for TypePlan<T> {
    fn default() -> Self {
        Self { constructors: Vec::new(), members: Vec::new() }
    }
}

impl<T: Send + Sync + 'static> TypePlan<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constructor(mut self, constructor: Constructor<T>) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn member(mut self, member: InjectionPoint<T>) -> Self {
        self.members.push(member);
        self
    }

    pub fn constructors(&self) -> &[Constructor<T>] {
        &self.constructors
    }

    pub fn members(&self) -> &[InjectionPoint<T>] {
        &self.members
    }

    pub(crate) fn into_parts(self) -> (Arc<dyn ErasedPlan>, Vec<Arc<dyn ErasedMember>>) {
        let plan: Arc<dyn ErasedPlan> = Arc::new(ConstructorSet {
            implementation: type_name::<T>(),
            constructors: self.constructors,
        });
        let members = self
            .members
            .into_iter()
            .map(|m| Arc::new(m) as Arc<dyn ErasedMember>)
            .collect();
        (plan, members)
    }
}

/// Types that describe their own injection plan.
pub trait Injectable: Sized + Send + Sync + 'static {
    fn plan() -> TypePlan<Self>;
}

/// Constructor as seen by compile-time validation and descriptors.
pub(crate) struct Signature<'a> {
    pub(crate) name: &'static str,
    pub(crate) marked: bool,
    pub(crate) params: &'a [Param],
}

pub(crate) trait ErasedPlan: Send + Sync {
    fn signatures(&self) -> Vec<Signature<'_>>;
    fn construct(
        &self,
        ctx: &ResolverContext<'_>,
        overrides: &[ParameterOverride],
        hint: Option<&'static str>,
    ) -> DiResult<AnyBox>;
}

pub(crate) trait ErasedMember: Send + Sync {
    fn name(&self) -> &'static str;
    fn params(&self) -> &[Param];
    fn apply(&self, target: &mut AnyBox, args: &mut Args) -> DiResult<()>;
}

struct ConstructorSet<T> {
    implementation: &'static str,
    constructors: Vec<Constructor<T>>,
}

impl<T: Send + Sync + 'static> ErasedPlan for ConstructorSet<T> {
    fn signatures(&self) -> Vec<Signature<'_>> {
        self.constructors
            .iter()
            .map(|c| Signature { name: c.name, marked: c.marked, params: &c.params })
            .collect()
    }

    fn construct(
        &self,
        ctx: &ResolverContext<'_>,
        overrides: &[ParameterOverride],
        hint: Option<&'static str>,
    ) -> DiResult<AnyBox> {
        let ctor = select_constructor(self.implementation, &self.constructors, ctx, overrides, hint)?;
        tracing::trace!(implementation = self.implementation, constructor = ctor.name, "constructing");
        let mut args = Args::resolve(ctx, self.implementation, &ctor.params, overrides)?;
        let value = (ctor.build)(&mut args)?;
        Ok(Box::new(value))
    }
}

impl<T: Send + Sync + 'static> ErasedMember for InjectionPoint<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn params(&self) -> &[Param] {
        &self.params
    }

    fn apply(&self, target: &mut AnyBox, args: &mut Args) -> DiResult<()> {
        let target = (**target)
            .downcast_mut::<T>()
            .ok_or(DiError::TypeMismatch(type_name::<T>()))?;
        (self.apply)(target, args)
    }
}

fn satisfiable(ctx: &ResolverContext<'_>, param: &Param, overrides: &[ParameterOverride]) -> bool {
    match param.kind {
        ParamKind::Collection | ParamKind::Optional => true,
        ParamKind::Single => {
            find_override(overrides, param.name, &param.key).is_some() || ctx.contains(&param.key)
        }
    }
}

/// Picks the constructor to inject through.
///
/// A hinted or marked constructor wins outright. Otherwise the constructor
/// with the most parameters that are all satisfiable is chosen; several of
/// equal size are ambiguous. When none is satisfiable the largest is used so
/// the first missing dependency surfaces as `Unresolved`.
fn select_constructor<'c, T>(
    implementation: &'static str,
    constructors: &'c [Constructor<T>],
    ctx: &ResolverContext<'_>,
    overrides: &[ParameterOverride],
    hint: Option<&'static str>,
) -> DiResult<&'c Constructor<T>> {
    if let Some(name) = hint {
        return constructors.iter().find(|c| c.name == name).ok_or_else(|| {
            ConfigurationError::UnknownConstructor { implementation, constructor: name }.into()
        });
    }
    if let Some(marked) = constructors.iter().find(|c| c.marked) {
        return Ok(marked);
    }
    if let [only] = constructors {
        return Ok(only);
    }

    let candidates: Vec<&Constructor<T>> = constructors
        .iter()
        .filter(|c| c.params.iter().all(|p| satisfiable(ctx, p, overrides)))
        .collect();

    let Some(widest) = candidates.iter().map(|c| c.params.len()).max() else {
        return constructors
            .iter()
            .max_by_key(|c| c.params.len())
            .ok_or_else(|| ConfigurationError::NoConstructor(implementation).into());
    };

    let mut best = candidates.into_iter().filter(|c| c.params.len() == widest);
    match (best.next(), best.next()) {
        (Some(only), None) => Ok(only),
        (Some(first), Some(second)) => {
            let mut names = vec![first.name, second.name];
            names.extend(best.map(|c| c.name));
            Err(DiError::AmbiguousConstructor { implementation, candidates: names })
        }
        (None, _) => Err(ConfigurationError::NoConstructor(implementation).into()),
    }
}
