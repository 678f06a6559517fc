//! Registration records.

use std::any::Any;
use std::sync::Arc;

use crate::entry_points::EntryPoint;
use crate::error::{BoxError, DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::plan::{ErasedMember, ErasedPlan};
use crate::provider::ResolverContext;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;
// Type-erased value between construction and member injection
pub(crate) type AnyBox = Box<dyn Any + Send + Sync>;

pub(crate) type FactoryFn = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyBox> + Send + Sync>;
pub(crate) type CastFn = Arc<dyn Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type DisposeHook = Arc<dyn Fn(&AnyArc) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type EntryHook = Arc<dyn Fn(&AnyArc) -> DiResult<EntryPoint> + Send + Sync>;
pub(crate) type SealFn = fn(AnyBox) -> DiResult<AnyArc>;

/// A contract a registration answers to, with the conversion from the stored
/// instance to the representation callers downcast.
///
/// Concrete contracts hold `Arc<T>`; trait contracts hold `Arc<Arc<dyn Trait>>`.
#[derive(Clone)]
pub(crate) struct ContractBinding {
    pub(crate) key: Key,
    pub(crate) cast: CastFn,
}

impl ContractBinding {
    pub(crate) fn identity(key: Key) -> Self {
        Self {
            key,
            cast: Arc::new(Ok),
        }
    }

    pub(crate) fn with_name(&self, name: Option<&'static str>) -> Self {
        match name {
            Some(name) => Self {
                key: self.key.clone().with_name(name),
                cast: self.cast.clone(),
            },
            None => self.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) enum Builder {
    Factory(FactoryFn),
    Plan(Arc<dyn ErasedPlan>),
}

#[derive(Clone)]
pub(crate) enum Activator {
    /// Pre-built instance; never constructed, never receives member injection
    Instance(AnyArc),
    /// Built by a factory or plan, then member-injected, then sealed into an Arc
    Construct { builder: Builder, seal: SealFn },
}

/// Where an override applies: a parameter name, or any parameter of a contract.
#[derive(Clone, Debug)]
pub(crate) enum OverrideTarget {
    Name(&'static str),
    Contract(Key),
}

/// Value bound to a constructor or member parameter, used verbatim.
#[derive(Clone)]
pub(crate) struct ParameterOverride {
    pub(crate) target: OverrideTarget,
    pub(crate) value: AnyArc,
}

/// Immutable registration record.
///
/// Mutable only through a `RegistrationBuilder` before compilation; the
/// compiler stamps `id` and `container` when it freezes the record.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) id: u64,
    pub(crate) container: u64,
    pub(crate) implementation: &'static str,
    pub(crate) self_binding: ContractBinding,
    pub(crate) contracts: Vec<ContractBinding>,
    pub(crate) name: Option<&'static str>,
    pub(crate) lifetime: Lifetime,
    pub(crate) activator: Activator,
    pub(crate) members: Vec<Arc<dyn ErasedMember>>,
    pub(crate) overrides: Vec<ParameterOverride>,
    pub(crate) constructor_hint: Option<&'static str>,
    pub(crate) dispose: Option<DisposeHook>,
    pub(crate) entry_points: Vec<EntryHook>,
}

impl Registration {
    pub(crate) fn new(
        implementation: &'static str,
        self_key: Key,
        lifetime: Lifetime,
        activator: Activator,
    ) -> Self {
        Self {
            id: 0,
            container: 0,
            implementation,
            self_binding: ContractBinding::identity(self_key),
            contracts: Vec::new(),
            name: None,
            lifetime,
            activator,
            members: Vec::new(),
            overrides: Vec::new(),
            constructor_hint: None,
            dispose: None,
            entry_points: Vec::new(),
        }
    }

    /// Contracts as exposed after compilation: explicit ones, or the
    /// implementation itself when none were declared, qualified by name.
    pub(crate) fn effective_contracts(&self) -> Vec<ContractBinding> {
        if self.contracts.is_empty() {
            vec![self.self_binding.with_name(self.name)]
        } else {
            self.contracts.iter().map(|c| c.with_name(self.name)).collect()
        }
    }

    /// Name used when attributing errors to this registration.
    pub(crate) fn contract_name(&self) -> &'static str {
        self.contracts
            .first()
            .unwrap_or(&self.self_binding)
            .key
            .display_name()
    }

    pub(crate) fn is_instance(&self) -> bool {
        matches!(self.activator, Activator::Instance(_))
    }

    pub(crate) fn plan(&self) -> Option<&Arc<dyn ErasedPlan>> {
        match &self.activator {
            Activator::Construct { builder: Builder::Plan(plan), .. } => Some(plan),
            _ => None,
        }
    }
}

/// Finds the override for a parameter: by name first, then by contract.
pub(crate) fn find_override<'o>(
    overrides: &'o [ParameterOverride],
    name: &str,
    key: &Key,
) -> Option<&'o AnyArc> {
    overrides
        .iter()
        .find(|o| matches!(o.target, OverrideTarget::Name(n) if n == name))
        .or_else(|| {
            overrides
                .iter()
                .find(|o| matches!(&o.target, OverrideTarget::Contract(k) if k == key))
        })
        .map(|o| &o.value)
}

pub(crate) fn seal<T: Send + Sync + 'static>(boxed: AnyBox) -> DiResult<AnyArc> {
    boxed
        .downcast::<T>()
        .map(|b| Arc::<T>::from(b) as AnyArc)
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

pub(crate) fn downcast_type<T: Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

// Trait contracts are stored as Arc<Arc<dyn Trait>> inside the Any
pub(crate) fn downcast_trait<T: ?Sized + Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}
