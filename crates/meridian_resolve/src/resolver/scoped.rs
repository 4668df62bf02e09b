//! Scoped strategy: one instance per scope.

use super::{Factory, Lifetime, Resolver};
use crate::disposal;
use crate::error::ResolveError;
use crate::instance::{Instance, TypeInfo};
use crate::scope::Scope;
use crate::slot::Claim;

/// Returns the scope's instance, building it on first use.
pub(super) fn resolve(
    resolver: &Resolver,
    factory: &Factory,
    scope: &Scope,
    requested: &TypeInfo,
) -> Result<Instance, ResolveError> {
    if let Some(instance) = scope.cached(resolver.id())? {
        return resolver.reuse(instance, scope, requested);
    }
    create_and_cache(resolver, factory, scope, Lifetime::Scoped, requested)
}

/// Builds an instance owned and cached by `scope`.
///
/// Concurrent first-time callers on the same scope share one construction:
/// the first claims the cache slot, the rest wait for it to settle.
pub(super) fn create_and_cache(
    resolver: &Resolver,
    factory: &Factory,
    scope: &Scope,
    lifetime: Lifetime,
    requested: &TypeInfo,
) -> Result<Instance, ResolveError> {
    let owner = disposal::owning_scope(lifetime, scope);
    let slot = owner.slot_for(resolver.id())?;

    match slot.claim() {
        Claim::Ready(instance) => resolver.reuse(instance, scope, requested),
        Claim::Reentrant => Err(ResolveError::circular(requested, resolver.implementor())),
        Claim::Build(ticket) => {
            // Teardown may have happened while this caller waited on the slot.
            owner.ensure_live()?;
            let instance = resolver.build(factory, scope, requested)?;
            owner.adopt(ticket, instance, resolver.disposal())
        }
    }
}
