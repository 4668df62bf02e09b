//! Per-resolver diagnostic hooks.
//!
//! A resolver may carry an `on_resolving` callback that observes every
//! resolution: it receives the requested service type and the requesting
//! scope. Hooks are for observability and interception; the value they return
//! is only used to report failure, never to change what gets built.
//!
//! Hooks are user code and may call back into the container, so they always
//! run while the resolver is marked active on the calling thread. A hook that
//! ends up resolving its own resolver fails with a circular-dependency error
//! attributed to that resolver, both when a new instance is about to be built
//! and when a cached one is returned.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use meridian_resolve::hook::ResolvingHook;
//!
//! let hook: ResolvingHook = Arc::new(|requested, scope| {
//!     tracing::info!(service = %requested, scope = %scope.id(), "resolving");
//!     Ok(())
//! });
//! # let _ = hook;
//! ```

use std::sync::Arc;

use crate::error::ResolveError;
use crate::guard;
use crate::instance::{Instance, TypeInfo};
use crate::resolver::Resolver;
use crate::scope::Scope;

/// Callback fired with `(requested_type, scope)` before a resolver returns.
pub type ResolvingHook = Arc<dyn Fn(&TypeInfo, &Scope) -> Result<(), ResolveError> + Send + Sync>;

/// Fires `hook`, if any.
///
/// Callers run this inside the resolver's cycle guard, immediately before
/// invoking the factory.
///
/// # Errors
///
/// Returns whatever the hook returns.
pub fn fire(
    hook: Option<&ResolvingHook>,
    requested: &TypeInfo,
    scope: &Scope,
) -> Result<(), ResolveError> {
    match hook {
        Some(hook) => hook(requested, scope),
        None => Ok(()),
    }
}

/// Fires the resolver's hook for an instance that is already cached.
///
/// No construction happens here, but the hook still runs under the
/// resolver's cycle guard so that a hook which resolves its own resolver is
/// reported as a cycle naming this resolver. Without a hook this is free.
///
/// # Errors
///
/// Returns [`ResolveError::CircularDependency`] on same-thread reentry, or
/// the hook's own error.
pub fn fire_for_cached(
    resolver: &Resolver,
    instance: Instance,
    requested: &TypeInfo,
    scope: &Scope,
) -> Result<Instance, ResolveError> {
    let Some(hook) = resolver.on_resolving() else {
        return Ok(instance);
    };

    guard::guarded(resolver.id(), requested, resolver.implementor(), || {
        hook(requested, scope)
    })?;
    Ok(instance)
}
