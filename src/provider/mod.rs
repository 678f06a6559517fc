//! Resolution engine and lifetime scopes.
//!
//! A request for a contract is answered by finding its registration in the
//! scope's container chain, then activating it according to its lifetime:
//! singletons are cached in the scope that declared them, scoped instances in
//! the requesting scope, and transients are built fresh every time.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::internal::ResolutionPath;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::plan::Args;
use crate::registration::{Activator, AnyArc, Builder, Registration};

mod cache;
mod context;
mod scope;

pub(crate) use cache::InstanceCache;
pub use context::ResolverContext;
pub use scope::{ChildScopeBuilder, LifetimeScope};
pub(crate) use scope::{apply_pending, ScopeInner};

/// Resolves one contract from `scope`, continuing `path`.
pub(crate) fn resolve(scope: &Arc<ScopeInner>, key: &Key, path: &ResolutionPath) -> DiResult<AnyArc> {
    let Some(entry) = scope.container.find(key) else {
        return Err(DiError::Unresolved {
            contract: key.display_name(),
            path: path.names(),
        });
    };
    let _frame = path.enter(key)?;
    tracing::trace!(contract = %key, scope = %scope.name, depth = path.depth(), "resolving");
    let instance = activate(scope, &entry.registration, path)?;
    (entry.binding.cast)(instance)
}

/// Resolves every registration of a contract, ancestors first.
pub(crate) fn resolve_all(scope: &Arc<ScopeInner>, key: &Key, path: &ResolutionPath) -> DiResult<Vec<AnyArc>> {
    let entries = scope.container.find_all(key);
    if entries.is_empty() {
        return Ok(Vec::new());
    }
    let _frame = path.enter(key)?;
    tracing::trace!(contract = %key, scope = %scope.name, count = entries.len(), "resolving all");
    entries
        .iter()
        .map(|entry| {
            let instance = activate(scope, &entry.registration, path)?;
            (entry.binding.cast)(instance)
        })
        .collect()
}

pub(crate) fn activate(scope: &Arc<ScopeInner>, reg: &Registration, path: &ResolutionPath) -> DiResult<AnyArc> {
    let _building = path.enter_registration(reg.id)?;
    match reg.lifetime {
        Lifetime::Transient => construct(scope, reg, path),
        Lifetime::Scoped => cached(scope, reg, path),
        Lifetime::Singleton => {
            let owner = scope.declaring_scope(reg.container)?;
            cached(&owner, reg, path)
        }
    }
}

/// Construct-once lookup in `owner`'s cache; tracks disposables on first build.
fn cached(owner: &Arc<ScopeInner>, reg: &Registration, path: &ResolutionPath) -> DiResult<AnyArc> {
    owner.ensure_alive()?;
    let cell = owner.cache.cell(reg.id);
    if let Some(hit) = cell.get() {
        tracing::trace!(implementation = reg.implementation, scope = %owner.name, "cache hit");
        return Ok(hit.clone());
    }
    let instance = cell.get_or_try_init(|| {
        let instance = construct(owner, reg, path)?;
        if let Some(hook) = &reg.dispose {
            owner.track(reg.contract_name(), instance.clone(), hook.clone());
        }
        Ok::<_, DiError>(instance)
    })?;
    Ok(instance.clone())
}

fn construct(scope: &Arc<ScopeInner>, reg: &Registration, path: &ResolutionPath) -> DiResult<AnyArc> {
    let (builder, seal) = match &reg.activator {
        Activator::Instance(instance) => return Ok(instance.clone()),
        Activator::Construct { builder, seal } => (builder, seal),
    };

    let ctx = ResolverContext::new(scope, path);
    let mut value = match builder {
        Builder::Factory(factory) => factory(&ctx)?,
        Builder::Plan(plan) => plan.construct(&ctx, &reg.overrides, reg.constructor_hint)?,
    };

    for member in &reg.members {
        let mut args = Args::resolve(&ctx, reg.implementation, member.params(), &reg.overrides)?;
        member.apply(&mut value, &mut args)?;
        tracing::trace!(implementation = reg.implementation, member = member.name(), "injected");
    }

    seal(value)
}
