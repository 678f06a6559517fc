//! Compiled, immutable containers.

use std::sync::Arc;

use ahash::AHashMap;

use crate::descriptors::ServiceDescriptor;
use crate::key::Key;
use crate::options::ContainerOptions;
use crate::registration::{ContractBinding, Registration};

/// A registration reachable under one contract.
#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) registration: Arc<Registration>,
    pub(crate) binding: ContractBinding,
}

/// Immutable lookup table produced by compiling a `ContainerBuilder`.
///
/// Maps each contract to its registrations in declaration order and links
/// to at most one parent container. Lookups never lock and never mutate; a
/// container can be shared freely across threads and scopes.
///
/// # Examples
///
/// ```rust
/// use arbor_di::{ContainerBuilder, key_of_type};
///
/// let mut parent = ContainerBuilder::new();
/// parent.register_instance(1u8).unwrap();
/// let parent = parent.build().unwrap();
///
/// let mut child = ContainerBuilder::new();
/// child.register_instance(2u16).unwrap();
/// let child = child.build_with_parent(&parent).unwrap();
///
/// assert!(child.contains(&key_of_type::<u8>()));
/// assert!(child.contains(&key_of_type::<u16>()));
/// assert!(!parent.contains(&key_of_type::<u16>()));
/// ```
pub struct Container {
    id: u64,
    options: ContainerOptions,
    entries: AHashMap<Key, Vec<Entry>>,
    registrations: Vec<Arc<Registration>>,
    parent: Option<Arc<Container>>,
}

impl Container {
    pub(crate) fn new(
        id: u64,
        options: ContainerOptions,
        entries: AHashMap<Key, Vec<Entry>>,
        registrations: Vec<Arc<Registration>>,
        parent: Option<Arc<Container>>,
    ) -> Self {
        Self { id, options, entries, registrations, parent }
    }

    /// Process-unique identifier, used to locate the declaring scope of a
    /// singleton.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    pub fn parent(&self) -> Option<&Arc<Container>> {
        self.parent.as_ref()
    }

    /// Number of local registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Whether the contract is registered here or in any ancestor.
    pub fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key) || self.parent.as_ref().is_some_and(|p| p.contains(key))
    }

    /// Descriptors of the local registrations, in declaration order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registrations
            .iter()
            .map(|r| ServiceDescriptor::from_registration(r))
            .collect()
    }

    /// Last local registration for the contract, else the parent's.
    pub(crate) fn find(&self, key: &Key) -> Option<&Entry> {
        match self.entries.get(key).and_then(|e| e.last()) {
            Some(entry) => Some(entry),
            None => self.parent.as_ref().and_then(|p| p.find(key)),
        }
    }

    /// Every registration for the contract: ancestors first, then local.
    pub(crate) fn find_all(&self, key: &Key) -> Vec<Entry> {
        let mut all = match &self.parent {
            Some(parent) => parent.find_all(key),
            None => Vec::new(),
        };
        if let Some(local) = self.entries.get(key) {
            all.extend(local.iter().cloned());
        }
        all
    }

    pub(crate) fn registrations(&self) -> &[Arc<Registration>] {
        &self.registrations
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("registrations", &self.registrations.len())
            .field("parent", &self.parent.as_ref().map(|p| p.id))
            .finish()
    }
}
