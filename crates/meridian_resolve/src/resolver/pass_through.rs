//! Built-in resolvers for the container, the requesting scope and its locator.

use super::{Lifetime, Resolver};
use crate::container::Container;
use crate::error::ResolveError;
use crate::guard::PassThroughGuard;
use crate::instance::{Instance, TypeInfo};
use crate::locator::Locator;
use crate::scope::Scope;

/// What a pass-through resolver hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassThrough {
    /// The [`Container`] the scope belongs to.
    Container,
    /// The requesting [`Scope`] itself.
    Scope,
    /// A [`Locator`] bound to the requesting scope.
    Locator,
}

impl PassThrough {
    /// Every built-in target, in registration order.
    pub const ALL: [PassThrough; 3] = [Self::Container, Self::Scope, Self::Locator];

    /// The service type this target is registered under.
    #[must_use]
    pub fn type_info(self) -> TypeInfo {
        match self {
            Self::Container => TypeInfo::of::<Container>(),
            Self::Scope => TypeInfo::of::<Scope>(),
            Self::Locator => TypeInfo::of::<Locator>(),
        }
    }

    /// The lifetime the returned object effectively has.
    #[must_use]
    pub fn lifetime(self) -> Lifetime {
        match self {
            Self::Container => Lifetime::Singleton,
            Self::Scope | Self::Locator => Lifetime::Scoped,
        }
    }
}

/// Hands back an object that already exists. No factory, hook, cache, or
/// disposer is involved.
pub(super) fn resolve(
    resolver: &Resolver,
    target: PassThrough,
    scope: &Scope,
    requested: &TypeInfo,
) -> Result<Instance, ResolveError> {
    let _flag = PassThroughGuard::enter(requested, resolver.implementor())?;
    let instance = match target {
        PassThrough::Container => Instance::new(scope.container()),
        PassThrough::Scope => Instance::new(scope.clone()),
        PassThrough::Locator => Instance::new(scope.locator()),
    };
    Ok(instance)
}
