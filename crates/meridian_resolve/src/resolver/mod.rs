//! Resolvers and their lifetime strategies.
//!
//! A [`Resolver`] is the compiled strategy for producing instances of one
//! registered implementation. It is immutable once built, apart from the
//! one-shot state of a Singleton, and is shared by every scope of its
//! container.
//!
//! # Lifetimes
//!
//! | Lifetime | Instances | Cached on | Owned (disposed) by |
//! |----------|-----------|-----------|---------------------|
//! | [`Transient`](Lifetime::Transient) | one per call | nothing | requesting scope |
//! | [`Scoped`](Lifetime::Scoped) | one per scope | requesting scope | requesting scope |
//! | [`ScopedSingleton`](Lifetime::ScopedSingleton) | one per scope branch | building scope and descendants that ask | building scope |
//! | [`Singleton`](Lifetime::Singleton) | one per container | the resolver | root scope |
//!
//! # Resolution contract
//!
//! [`Resolver::create`] is the only entry point. Every strategy that runs a
//! user factory or diagnostic hook does so inside the thread-local cycle
//! guard; a circular-dependency error crossing a resolver is extended with
//! that resolver's identity on the way out.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use meridian_resolve::container::ContainerBuilder;
//! use meridian_resolve::instance::{Instance, TypeInfo};
//! use meridian_resolve::resolver::{Lifetime, Resolver};
//!
//! struct Clock;
//!
//! let resolver = Resolver::new(
//!     Lifetime::Transient,
//!     TypeInfo::of::<Clock>(),
//!     Arc::new(|_scope| Ok(Instance::new(Clock))),
//! );
//!
//! let container = ContainerBuilder::new().build();
//! let scope = container.create_scope();
//! let first = resolver.create(&scope, &TypeInfo::of::<Clock>()).unwrap();
//! let second = resolver.create(&scope, &TypeInfo::of::<Clock>()).unwrap();
//! assert!(!first.ptr_eq(&second));
//! ```

mod pass_through;
mod scoped;
mod scoped_singleton;
mod singleton;
mod transient;

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::disposal::DisposalStrategy;
use crate::error::ResolveError;
use crate::guard;
use crate::hook::{self, ResolvingHook};
use crate::instance::{Instance, TypeInfo};
use crate::scope::Scope;

pub use pass_through::PassThrough;
use singleton::SingletonCell;

/// User factory producing an instance for a scope.
pub type Factory = Arc<dyn Fn(&Scope) -> Result<Instance, ResolveError> + Send + Sync>;

/// Stable identifier of a resolver, unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolverId(u64);

impl ResolverId {
    /// Allocates a fresh identifier.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResolverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resolver#{}", self.0)
    }
}

/// Creation and caching policy of a resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// A new instance on every resolution.
    Transient,
    /// One instance per scope.
    Scoped,
    /// One instance per branch of the scope tree, rooted where it was first
    /// resolved.
    ScopedSingleton,
    /// One instance for the whole container.
    Singleton,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transient => "transient",
            Self::Scoped => "scoped",
            Self::ScopedSingleton => "scoped-singleton",
            Self::Singleton => "singleton",
        };
        f.write_str(name)
    }
}

/// Per-lifetime strategy state.
enum ResolverKind {
    Transient(Factory),
    Scoped(Factory),
    ScopedSingleton(Factory),
    Singleton(SingletonCell),
    PassThrough(PassThrough),
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

/// The compiled strategy for producing instances of one implementation.
pub struct Resolver {
    id: ResolverId,
    implementor: TypeInfo,
    lifetime: Lifetime,
    disposal: DisposalStrategy,
    on_resolving: Option<ResolvingHook>,
    kind: ResolverKind,
}

impl Resolver {
    /// Creates a resolver that builds `implementor` with `factory`.
    ///
    /// Instances are disposed through their capability by default; see
    /// [`with_disposal`](Self::with_disposal).
    #[must_use]
    pub fn new(lifetime: Lifetime, implementor: TypeInfo, factory: Factory) -> Self {
        let kind = match lifetime {
            Lifetime::Transient => ResolverKind::Transient(factory),
            Lifetime::Scoped => ResolverKind::Scoped(factory),
            Lifetime::ScopedSingleton => ResolverKind::ScopedSingleton(factory),
            Lifetime::Singleton => ResolverKind::Singleton(SingletonCell::new(factory)),
        };
        Self {
            id: ResolverId::next(),
            implementor,
            lifetime,
            disposal: DisposalStrategy::default(),
            on_resolving: None,
            kind,
        }
    }

    /// Creates a built-in resolver that hands back the container, the
    /// requesting scope, or its locator.
    ///
    /// Pass-through resolvers run no user code, accept no hook, and never
    /// take ownership of what they return.
    #[must_use]
    pub fn pass_through(target: PassThrough) -> Self {
        Self {
            id: ResolverId::next(),
            implementor: target.type_info(),
            lifetime: target.lifetime(),
            disposal: DisposalStrategy::RenounceOwnership,
            on_resolving: None,
            kind: ResolverKind::PassThrough(target),
        }
    }

    /// Sets how built instances are released.
    ///
    /// Ignored for pass-through resolvers, which always renounce ownership.
    #[must_use]
    pub fn with_disposal(mut self, disposal: DisposalStrategy) -> Self {
        if !self.is_pass_through() {
            self.disposal = disposal;
        }
        self
    }

    /// Sets the diagnostic hook fired on every resolution.
    ///
    /// Ignored for pass-through resolvers.
    #[must_use]
    pub fn with_on_resolving(mut self, hook: ResolvingHook) -> Self {
        if !self.is_pass_through() {
            self.on_resolving = Some(hook);
        }
        self
    }

    /// Returns this resolver's identifier.
    #[must_use]
    pub fn id(&self) -> ResolverId {
        self.id
    }

    /// Returns the implementation type this resolver builds.
    #[must_use]
    pub fn implementor(&self) -> &TypeInfo {
        &self.implementor
    }

    /// Returns the creation and caching policy.
    #[must_use]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Returns the disposal strategy.
    #[must_use]
    pub fn disposal(&self) -> &DisposalStrategy {
        &self.disposal
    }

    /// Returns the diagnostic hook, if any.
    #[must_use]
    pub fn on_resolving(&self) -> Option<&ResolvingHook> {
        self.on_resolving.as_ref()
    }

    /// Returns `true` for the built-in container, scope and locator resolvers.
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        matches!(self.kind, ResolverKind::PassThrough(_))
    }

    /// Produces an instance for `scope`, building or reusing per the lifetime.
    ///
    /// `requested` is the service type the caller asked for; it is passed to
    /// the diagnostic hook and named in circular-dependency errors.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::ObjectDisposed`] if the current, an ancestor, or the
    ///   root scope is disposed at a checkpoint
    /// - [`ResolveError::CircularDependency`] on same-thread reentry
    /// - any other error returned by the factory or hook, unchanged
    pub fn create(&self, scope: &Scope, requested: &TypeInfo) -> Result<Instance, ResolveError> {
        match &self.kind {
            ResolverKind::Transient(factory) => transient::resolve(self, factory, scope, requested),
            ResolverKind::Scoped(factory) => scoped::resolve(self, factory, scope, requested),
            ResolverKind::ScopedSingleton(factory) => {
                scoped_singleton::resolve(self, factory, scope, requested)
            }
            ResolverKind::Singleton(cell) => singleton::resolve(self, cell, scope, requested),
            ResolverKind::PassThrough(target) => {
                pass_through::resolve(self, *target, scope, requested)
            }
        }
    }

    /// Runs hook and factory under the cycle guard.
    fn build(
        &self,
        factory: &Factory,
        scope: &Scope,
        requested: &TypeInfo,
    ) -> Result<Instance, ResolveError> {
        let instance = guard::guarded(self.id, requested, &self.implementor, || {
            hook::fire(self.on_resolving.as_ref(), requested, scope)?;
            factory(scope)
        })?;

        tracing::debug!(
            resolver = %self.id,
            implementor = self.implementor.name(),
            lifetime = %self.lifetime,
            scope = %scope.id(),
            "instance built"
        );
        Ok(instance)
    }

    /// Returns a cached instance after firing the hook.
    fn reuse(
        &self,
        instance: Instance,
        scope: &Scope,
        requested: &TypeInfo,
    ) -> Result<Instance, ResolveError> {
        tracing::trace!(
            resolver = %self.id,
            implementor = self.implementor.name(),
            lifetime = %self.lifetime,
            scope = %scope.id(),
            "cache hit"
        );
        hook::fire_for_cached(self, instance, requested, scope)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("id", &self.id)
            .field("implementor", &self.implementor.name())
            .field("lifetime", &self.lifetime)
            .field("disposal", &self.disposal)
            .field("on_resolving", &self.on_resolving.is_some())
            .finish()
    }
}
