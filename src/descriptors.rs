//! Service descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{Activator, Builder, Registration};

/// How a registration produces its instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Pre-built instance
    Instance,
    /// User factory closure
    Factory,
    /// Constructor selection over an injection plan
    Plan,
}

/// Service descriptor for introspection and diagnostics
///
/// Snapshot of one registration, available from both the builder (before
/// compilation) and a compiled [`Container`](crate::Container).
///
/// # Examples
///
/// ```rust
/// use arbor_di::{Activation, ContainerBuilder, Lifetime};
/// use std::sync::Arc;
///
/// struct Database;
/// struct Repository;
///
/// trait Logger: Send + Sync {}
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {}
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_instance(Database).unwrap();
/// builder.register_factory(Lifetime::Scoped, |_| Ok(Repository)).unwrap();
/// builder.register_trait_instance::<dyn Logger>(Arc::new(ConsoleLogger)).unwrap();
/// builder.register_instance(42u32).unwrap().named("config_value");
///
/// let descriptors = builder.descriptors();
/// assert_eq!(descriptors.len(), 4);
///
/// let repo = descriptors.iter().find(|d| d.type_name().contains("Repository")).unwrap();
/// assert_eq!(repo.lifetime, Lifetime::Scoped);
/// assert_eq!(repo.activation, Activation::Factory);
///
/// let config = descriptors.iter().find(|d| d.is_named()).unwrap();
/// assert_eq!(config.service_name(), Some("config_value"));
/// assert_eq!(config.type_name(), "u32");
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// Contracts the registration answers to
    pub contracts: Vec<Key>,
    /// Implementation type name
    pub implementation: &'static str,
    /// Service lifetime
    pub lifetime: Lifetime,
    pub activation: Activation,
    /// Constructor names offered by the plan, empty for factories and instances
    pub constructors: Vec<&'static str>,
    pub disposable: bool,
    /// Number of entry-point markers (sync and async)
    pub entry_points: usize,
}

impl ServiceDescriptor {
    pub(crate) fn from_registration(reg: &Registration) -> Self {
        let activation = match &reg.activator {
            Activator::Instance(_) => Activation::Instance,
            Activator::Construct { builder: Builder::Factory(_), .. } => Activation::Factory,
            Activator::Construct { builder: Builder::Plan(_), .. } => Activation::Plan,
        };
        let constructors = reg
            .plan()
            .map(|p| p.signatures().iter().map(|s| s.name).collect())
            .unwrap_or_default();
        Self {
            contracts: reg.effective_contracts().into_iter().map(|c| c.key).collect(),
            implementation: reg.implementation,
            lifetime: reg.lifetime,
            activation,
            constructors,
            disposable: reg.dispose.is_some(),
            entry_points: reg.entry_points.len(),
        }
    }

    /// Registration name for keyed registrations
    pub fn service_name(&self) -> Option<&'static str> {
        self.contracts.first().and_then(Key::service_name)
    }

    /// Whether the registration is keyed
    pub fn is_named(&self) -> bool {
        self.service_name().is_some()
    }

    /// Name of the first contract, which is the implementation itself when
    /// no contracts were declared
    pub fn type_name(&self) -> &'static str {
        self.contracts
            .first()
            .map(Key::display_name)
            .unwrap_or(self.implementation)
    }

    /// Whether the registration answers to `key`
    pub fn provides(&self, key: &Key) -> bool {
        self.contracts.contains(key)
    }
}
