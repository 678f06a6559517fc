//! Contract keys for the dependency injection container.

use std::any::TypeId;

/// Key identifying a contract callers may request by.
///
/// A contract is either a concrete type or a trait object type, optionally
/// qualified by a name for keyed registrations. Equality and hashing use the
/// `TypeId` (plus name for keyed variants); the type name is carried only for
/// diagnostics.
///
/// # Examples
///
/// ```rust
/// use arbor_di::{key_of_trait, key_of_type, Key};
///
/// trait Logger: Send + Sync {}
///
/// let concrete = key_of_type::<u32>();
/// assert_eq!(concrete.display_name(), "u32");
/// assert_eq!(concrete.service_name(), None);
///
/// let keyed = concrete.clone().with_name("port");
/// assert_eq!(keyed.service_name(), Some("port"));
/// assert_ne!(concrete, keyed);
///
/// let contract = key_of_trait::<dyn Logger>();
/// assert!(contract.is_trait());
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Concrete type key with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Trait object key (`dyn Trait`)
    Trait(TypeId, &'static str),
    /// Keyed concrete type: TypeId, type name, registration name
    TypeNamed(TypeId, &'static str, &'static str),
    /// Keyed trait object: TypeId, trait name, registration name
    TraitNamed(TypeId, &'static str, &'static str),
}

impl Key {
    /// Type or trait name for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name)
            | Key::Trait(_, name)
            | Key::TypeNamed(_, name, _)
            | Key::TraitNamed(_, name, _) => name,
        }
    }

    /// Registration name for keyed contracts.
    pub fn service_name(&self) -> Option<&'static str> {
        match self {
            Key::Type(..) | Key::Trait(..) => None,
            Key::TypeNamed(_, _, name) | Key::TraitNamed(_, _, name) => Some(name),
        }
    }

    /// Whether this key denotes a trait object contract.
    pub fn is_trait(&self) -> bool {
        matches!(self, Key::Trait(..) | Key::TraitNamed(..))
    }

    /// Returns the keyed variant of this contract. Re-naming replaces the old name.
    pub fn with_name(self, name: &'static str) -> Key {
        match self {
            Key::Type(id, ty) | Key::TypeNamed(id, ty, _) => Key::TypeNamed(id, ty, name),
            Key::Trait(id, ty) | Key::TraitNamed(id, ty, _) => Key::TraitNamed(id, ty, name),
        }
    }

    #[inline]
    fn type_id(&self) -> TypeId {
        match self {
            Key::Type(id, _) | Key::Trait(id, _) | Key::TypeNamed(id, _, _) | Key::TraitNamed(id, _, _) => *id,
        }
    }

    #[inline]
    fn discriminant(&self) -> u8 {
        match self {
            Key::Type(..) => 0,
            Key::Trait(..) => 1,
            Key::TypeNamed(..) => 2,
            Key::TraitNamed(..) => 3,
        }
    }
}

// TypeId-only comparison; names are diagnostics
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.discriminant() == other.discriminant()
            && self.type_id() == other.type_id()
            && self.service_name() == other.service_name()
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.discriminant().hash(state);
        self.type_id().hash(state);
        if let Some(name) = self.service_name() {
            name.hash(state);
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.service_name() {
            Some(name) => write!(f, "{}[{}]", self.display_name(), name),
            None => f.write_str(self.display_name()),
        }
    }
}

/// Key for a concrete type contract.
#[inline(always)]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Key for a trait object contract, e.g. `key_of_trait::<dyn Logger>()`.
#[inline(always)]
pub fn key_of_trait<T: ?Sized + 'static>() -> Key {
    Key::Trait(TypeId::of::<T>(), std::any::type_name::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Marker {}

    #[test]
    fn type_and_trait_keys_never_collide() {
        let a = Key::Type(TypeId::of::<u8>(), "u8");
        let b = Key::Trait(TypeId::of::<u8>(), "u8");
        assert_ne!(a, b);
    }

    #[test]
    fn names_ignored_for_unkeyed_equality() {
        let a = Key::Type(TypeId::of::<u8>(), "u8");
        let b = Key::Type(TypeId::of::<u8>(), "alias");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn keyed_contracts_differ_by_name() {
        let a = key_of_trait::<dyn Marker>().with_name("left");
        let b = key_of_trait::<dyn Marker>().with_name("right");
        assert_ne!(a, b);
        assert_eq!(a, key_of_trait::<dyn Marker>().with_name("left"));
        assert_eq!(a.to_string(), format!("{}[left]", std::any::type_name::<dyn Marker>()));
    }
}
