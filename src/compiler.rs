//! Compiles registrations into an immutable `Container`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;

use crate::container::{Container, Entry};
use crate::error::{ConfigurationError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::options::ContainerOptions;
use crate::plan::{Param, ParamKind, Signature};
use crate::registration::{find_override, Registration};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_REGISTRATION_ID: AtomicU64 = AtomicU64::new(1);

/// Freezes `registrations` into a container linked to `parent`.
///
/// Single pass in declaration order: each registration is validated,
/// stamped with a fresh id and indexed under its contracts; dependency and
/// captive checks then run against the local-and-parent union.
pub(crate) fn compile(
    registrations: Vec<Registration>,
    options: ContainerOptions,
    parent: Option<Arc<Container>>,
) -> DiResult<Container> {
    let container_id = NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed);
    let mut frozen = Vec::with_capacity(registrations.len());
    let mut entries: AHashMap<Key, Vec<Entry>> = AHashMap::new();

    for mut reg in registrations {
        validate_shape(&reg)?;
        reg.id = NEXT_REGISTRATION_ID.fetch_add(1, Ordering::Relaxed);
        reg.container = container_id;
        let reg = Arc::new(reg);
        for binding in reg.effective_contracts() {
            entries.entry(binding.key.clone()).or_default().push(Entry {
                registration: reg.clone(),
                binding,
            });
        }
        frozen.push(reg);
    }

    let container = Container::new(container_id, options, entries, frozen, parent);
    for reg in container.registrations() {
        validate_dependencies(&container, reg)?;
    }

    tracing::debug!(
        container = container_id,
        registrations = container.len(),
        parent = container.parent().map(|p| p.id()),
        "compiled container"
    );
    Ok(container)
}

fn validate_shape(reg: &Registration) -> DiResult<()> {
    if reg.is_instance() && !reg.members.is_empty() {
        return Err(ConfigurationError::InjectIntoInstance(reg.implementation).into());
    }
    let Some(plan) = reg.plan() else {
        return Ok(());
    };
    let signatures = plan.signatures();
    if signatures.is_empty() {
        return Err(ConfigurationError::NoConstructor(reg.implementation).into());
    }
    let marked: Vec<&'static str> = signatures.iter().filter(|s| s.marked).map(|s| s.name).collect();
    if marked.len() > 1 {
        return Err(ConfigurationError::MultipleInjectConstructors {
            implementation: reg.implementation,
            constructors: marked,
        }
        .into());
    }
    if let Some(hint) = reg.constructor_hint {
        if !signatures.iter().any(|s| s.name == hint) {
            return Err(ConfigurationError::UnknownConstructor {
                implementation: reg.implementation,
                constructor: hint,
            }
            .into());
        }
    }
    Ok(())
}

/// The constructor resolution will use when it can be known statically.
fn fixed_constructor<'a>(reg: &Registration, signatures: &'a [Signature<'a>]) -> Option<&'a Signature<'a>> {
    if let Some(hint) = reg.constructor_hint {
        return signatures.iter().find(|s| s.name == hint);
    }
    if let Some(marked) = signatures.iter().find(|s| s.marked) {
        return Some(marked);
    }
    match signatures {
        [only] => Some(only),
        _ => None,
    }
}

fn validate_dependencies(container: &Container, reg: &Registration) -> DiResult<()> {
    let options = container.options();
    let signatures = reg.plan().map(|p| p.signatures()).unwrap_or_default();
    let fixed = fixed_constructor(reg, &signatures);

    // Explicitly checked parameters are verified on every constructor
    for param in signatures.iter().flat_map(|s| s.params.iter()).filter(|p| p.is_checked()) {
        check_registered(container, reg, param)?;
    }

    let member_params = reg.members.iter().flat_map(|m| m.params().iter());
    let wired: Vec<&Param> = fixed
        .map(|s| s.params.iter())
        .into_iter()
        .flatten()
        .chain(member_params)
        .collect();

    for param in &wired {
        if param.is_checked() || options.validate_all_dependencies {
            check_registered(container, reg, param)?;
        }
    }

    if options.captive_dependency_check && reg.lifetime == Lifetime::Singleton {
        for param in &wired {
            check_captive(container, reg, param)?;
        }
    }
    Ok(())
}

fn check_registered(container: &Container, reg: &Registration, param: &Param) -> DiResult<()> {
    if param.kind() != ParamKind::Single
        || find_override(&reg.overrides, param.name(), param.key()).is_some()
        || container.contains(param.key())
    {
        return Ok(());
    }
    Err(ConfigurationError::MissingDependency {
        implementation: reg.implementation,
        parameter: param.name(),
        contract: param.key().display_name(),
    }
    .into())
}

fn check_captive(container: &Container, reg: &Registration, param: &Param) -> DiResult<()> {
    let reject_scoped = container.options().reject_captive_scoped;
    if find_override(&reg.overrides, param.name(), param.key()).is_some() {
        return Ok(());
    }
    let deps: Vec<Arc<Registration>> = match param.kind() {
        ParamKind::Collection => container
            .find_all(param.key())
            .into_iter()
            .map(|e| e.registration)
            .collect(),
        ParamKind::Single | ParamKind::Optional => container
            .find(param.key())
            .map(|e| e.registration.clone())
            .into_iter()
            .collect(),
    };

    for dep in deps {
        match dep.lifetime {
            Lifetime::Scoped if reject_scoped => {
                return Err(ConfigurationError::CaptiveScoped {
                    implementation: reg.implementation,
                    dependency: dep.implementation,
                }
                .into());
            }
            Lifetime::Transient if dep.dispose.is_some() => {
                return Err(ConfigurationError::CaptiveDisposable {
                    implementation: reg.implementation,
                    dependency: dep.implementation,
                }
                .into());
            }
            _ => {}
        }
    }
    Ok(())
}
