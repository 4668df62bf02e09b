//! Read-only service lookup bound to a scope.

use std::sync::Arc;

use crate::error::ResolveError;
use crate::scope::Scope;

/// Resolves services in a fixed scope without exposing the scope's lifecycle.
///
/// Handy for components that need to look services up lazily but must not
/// create child scopes or tear anything down.
#[derive(Debug, Clone)]
pub struct Locator {
    scope: Scope,
}

impl Locator {
    pub(crate) fn new(scope: Scope) -> Self {
        Self { scope }
    }

    /// Resolves the service `S` in the bound scope.
    ///
    /// # Errors
    ///
    /// See [`Scope::get`].
    pub fn get<S: Send + Sync + 'static>(&self) -> Result<Arc<S>, ResolveError> {
        self.scope.get::<S>()
    }

    /// Returns `true` if a resolver is registered for `S`.
    #[must_use]
    pub fn contains<S: ?Sized + 'static>(&self) -> bool {
        self.scope.contains::<S>()
    }

    /// The scope this locator resolves in.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}
