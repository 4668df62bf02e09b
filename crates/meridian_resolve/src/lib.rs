//! The dependency-resolution engine for Meridian.
//!
//! `meridian_resolve` turns registered factories into instances, per scope,
//! with lifetime-correct caching and ownership:
//!
//! - [`resolver`] - Resolvers and the Transient, Scoped, ScopedSingleton and
//!   Singleton strategies
//! - [`guard`] - Thread-local circular-dependency detection
//! - [`hook`] - Per-resolver diagnostic callbacks
//! - [`disposal`] - Disposal strategies and scope ownership
//! - [`scope`] - Hierarchical resolution scopes
//! - [`container`] - Registration, configuration and the root scope
//! - [`locator`] - Read-only lookup bound to a scope
//! - [`instance`] - Type-erased instances and the [`Dispose`](instance::Dispose) capability
//! - [`error`] - The [`ResolveError`](error::ResolveError) taxonomy
//!
//! # Concurrency
//!
//! Everything here is synchronous and callable from any thread. Cached
//! lifetimes construct at most once per owning scope, no matter how many
//! threads ask at the same time. Scope locks are never held while user
//! factories run; construction is serialized per cache entry instead.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use meridian_resolve::prelude::*;
//!
//! struct Settings { retries: u32 }
//! struct Client { settings: Arc<Settings> }
//!
//! let mut builder = ContainerBuilder::new();
//! builder.singleton::<Settings>(|_| Ok(Instance::new(Settings { retries: 3 })));
//! builder.transient::<Client>(|scope| {
//!     Ok(Instance::new(Client { settings: scope.get::<Settings>()? }))
//! });
//! let container = builder.build();
//!
//! let scope = container.create_scope();
//! let client = scope.get::<Client>().unwrap();
//! assert_eq!(client.settings.retries, 3);
//! ```

/// Registration, configuration and the root scope.
pub mod container;

/// Disposal strategies and ownership handoff.
pub mod disposal;

/// Resolution errors.
pub mod error;

/// Thread-local cycle detection.
pub mod guard;

/// Diagnostic hooks.
pub mod hook;

/// Type-erased instances.
pub mod instance;

/// Scope-bound service lookup.
pub mod locator;

/// Resolvers and lifetime strategies.
pub mod resolver;

/// Hierarchical resolution scopes.
pub mod scope;

/// Per-entry construction slots.
pub mod slot;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::container::{Container, ContainerBuilder, ContainerConfig, Registration};
    pub use crate::disposal::DisposalStrategy;
    pub use crate::error::{BoxError, CycleChain, CycleLink, ResolveError};
    pub use crate::hook::ResolvingHook;
    pub use crate::instance::{Dispose, Instance, TypeInfo};
    pub use crate::locator::Locator;
    pub use crate::resolver::{Lifetime, PassThrough, Resolver, ResolverId};
    pub use crate::scope::{Scope, ScopeId};
}
