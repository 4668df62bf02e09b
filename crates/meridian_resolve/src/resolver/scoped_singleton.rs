//! ScopedSingleton strategy: one instance per branch of the scope tree.
//!
//! The first scope to resolve becomes the owner for its subtree. Descendants
//! that resolve later find the owner's instance by walking up the parent
//! chain and cache a reference to it without taking ownership, so the
//! instance is disposed exactly once, with the scope that built it.

use super::{Factory, Lifetime, Resolver, scoped};
use crate::error::ResolveError;
use crate::instance::{Instance, TypeInfo};
use crate::resolver::ResolverId;
use crate::scope::Scope;

/// Returns the branch's instance, inheriting or building as needed.
pub(super) fn resolve(
    resolver: &Resolver,
    factory: &Factory,
    scope: &Scope,
    requested: &TypeInfo,
) -> Result<Instance, ResolveError> {
    if let Some(instance) = scope.cached(resolver.id())? {
        return resolver.reuse(instance, scope, requested);
    }

    if let Some(inherited) = find_in_ancestors(scope, resolver.id())? {
        let instance = scope.inherit(resolver.id(), inherited)?;
        tracing::trace!(
            resolver = %resolver.id(),
            scope = %scope.id(),
            "inherited from ancestor scope"
        );
        return resolver.reuse(instance, scope, requested);
    }

    scoped::create_and_cache(resolver, factory, scope, Lifetime::ScopedSingleton, requested)
}

/// Walks the parent chain for an instance some ancestor owns.
///
/// An ancestor still constructing the instance on another thread is waited
/// for. A disposed ancestor on the way up fails the resolution.
fn find_in_ancestors(scope: &Scope, id: ResolverId) -> Result<Option<Instance>, ResolveError> {
    let mut current = scope.parent();
    while let Some(ancestor) = current {
        if let Some(instance) = ancestor.settled(id)? {
            return Ok(Some(instance));
        }
        current = ancestor.parent();
    }
    Ok(None)
}
