//! Transient strategy: a fresh instance on every call.

use super::{Factory, Lifetime, Resolver};
use crate::disposal;
use crate::error::ResolveError;
use crate::instance::{Instance, TypeInfo};
use crate::scope::Scope;

/// Builds a new instance and hands ownership to the requesting scope.
pub(super) fn resolve(
    resolver: &Resolver,
    factory: &Factory,
    scope: &Scope,
    requested: &TypeInfo,
) -> Result<Instance, ResolveError> {
    scope.ensure_live()?;

    let instance = resolver.build(factory, scope, requested)?;

    let owner = disposal::owning_scope(Lifetime::Transient, scope);
    owner.track(&instance, resolver.disposal())?;
    Ok(instance)
}
