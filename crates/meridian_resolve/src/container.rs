//! Container assembly and the root scope.
//!
//! [`ContainerBuilder`] turns closures into resolvers and freezes them into a
//! [`Container`]. The container owns the resolver registry and the root
//! scope; every scope created from it shares both.
//!
//! The built-in [`Container`], [`Scope`] and
//! [`Locator`](crate::locator::Locator) services are always registered, as
//! pass-through resolvers that never take ownership of what they return.
//!
//! # Example
//!
//! ```
//! use meridian_resolve::container::{ContainerBuilder, ContainerConfig};
//! use meridian_resolve::disposal::DisposalStrategy;
//! use meridian_resolve::instance::{Dispose, Instance};
//!
//! struct Pool;
//!
//! impl Dispose for Pool {
//!     fn dispose(&self) {
//!         // close connections
//!     }
//! }
//!
//! struct Repository {
//!     pool: std::sync::Arc<Pool>,
//! }
//!
//! let mut builder = ContainerBuilder::with_config(ContainerConfig::new("app"));
//! builder.singleton::<Pool>(|_| Ok(Instance::disposable(Pool)));
//! builder.scoped::<Repository>(|scope| {
//!     Ok(Instance::new(Repository { pool: scope.get::<Pool>()? }))
//! });
//! let container = builder.build();
//!
//! let request = container.create_scope();
//! let repo = request.get::<Repository>().unwrap();
//! let pool = container.root().get::<Pool>().unwrap();
//! assert!(std::sync::Arc::ptr_eq(&repo.pool, &pool));
//!
//! request.dispose();
//! container.dispose();
//! ```

use core::any::TypeId;
use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::disposal::DisposalStrategy;
use crate::error::ResolveError;
use crate::hook::ResolvingHook;
use crate::instance::{Instance, TypeInfo};
use crate::resolver::{Factory, Lifetime, PassThrough, Resolver};
use crate::scope::Scope;

// ─────────────────────────────────────────────────────────────────────────────
// ContainerConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Container-wide settings.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    name: String,
    default_disposal: DisposalStrategy,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: String::from("meridian"),
            default_disposal: DisposalStrategy::UseCapability,
        }
    }
}

impl ContainerConfig {
    /// Creates a configuration with the given container name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::default().with_name(name)
    }

    /// Sets the name reported in log output.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the disposal strategy for registrations that do not choose one.
    #[must_use]
    pub fn with_default_disposal(mut self, disposal: DisposalStrategy) -> Self {
        self.default_disposal = disposal;
        self
    }

    /// The container name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The default disposal strategy.
    #[must_use]
    pub fn default_disposal(&self) -> &DisposalStrategy {
        &self.default_disposal
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Frozen map from service type to resolver.
pub(crate) struct Registry {
    config: ContainerConfig,
    resolvers: HashMap<TypeId, Arc<Resolver>>,
}

impl Registry {
    pub(crate) fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub(crate) fn get(&self, service: TypeId) -> Option<&Arc<Resolver>> {
        self.resolvers.get(&service)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Container
// ─────────────────────────────────────────────────────────────────────────────

/// The root owner of a resolver graph and its root scope.
///
/// Cloning a `Container` clones the handle.
#[derive(Clone)]
pub struct Container {
    registry: Arc<Registry>,
    root: Scope,
}

impl Container {
    pub(crate) fn from_parts(registry: Arc<Registry>, root: Scope) -> Self {
        Self { registry, root }
    }

    /// The root scope, which owns every Singleton.
    #[must_use]
    pub fn root(&self) -> &Scope {
        &self.root
    }

    /// Creates a child of the root scope.
    #[must_use]
    pub fn create_scope(&self) -> Scope {
        self.root.create_child()
    }

    /// The container's configuration.
    #[must_use]
    pub fn config(&self) -> &ContainerConfig {
        self.registry.config()
    }

    /// Returns the resolver registered for service `S`.
    #[must_use]
    pub fn resolver<S: ?Sized + 'static>(&self) -> Option<&Arc<Resolver>> {
        self.registry.get(TypeId::of::<S>())
    }

    /// Resolves `S` from the root scope.
    ///
    /// # Errors
    ///
    /// See [`Scope::get`].
    pub fn get<S: Send + Sync + 'static>(&self) -> Result<Arc<S>, ResolveError> {
        self.root.get::<S>()
    }

    /// Number of registered services, built-ins included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.resolvers.len()
    }

    /// Always `false`; the built-in services are always registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.resolvers.is_empty()
    }

    /// Disposes the root scope, releasing every Singleton it owns.
    pub fn dispose(&self) {
        self.root.dispose();
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.config().name())
            .field("services", &self.len())
            .field("root", &self.root.id())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ContainerBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// A pending service registration.
///
/// Returned by the [`ContainerBuilder`] registration methods for chaining.
pub struct Registration {
    service: TypeInfo,
    implementor: TypeInfo,
    lifetime: Lifetime,
    factory: Factory,
    disposal: Option<DisposalStrategy>,
    on_resolving: Option<ResolvingHook>,
}

impl Registration {
    /// Names the concrete type the factory builds, for diagnostics.
    ///
    /// Defaults to the service type.
    pub fn implemented_by<I: ?Sized + 'static>(&mut self) -> &mut Self {
        self.implementor = TypeInfo::of::<I>();
        self
    }

    /// Sets how built instances are released.
    pub fn with_disposal(&mut self, disposal: DisposalStrategy) -> &mut Self {
        self.disposal = Some(disposal);
        self
    }

    /// Sets a callback fired on every resolution of this service.
    pub fn on_resolving(
        &mut self,
        hook: impl Fn(&TypeInfo, &Scope) -> Result<(), ResolveError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.on_resolving = Some(Arc::new(hook));
        self
    }

    /// The registered service type.
    #[must_use]
    pub fn service(&self) -> &TypeInfo {
        &self.service
    }

    /// The registered lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    fn into_resolver(self, config: &ContainerConfig) -> Resolver {
        let disposal = self
            .disposal
            .unwrap_or_else(|| config.default_disposal().clone());
        let resolver =
            Resolver::new(self.lifetime, self.implementor, self.factory).with_disposal(disposal);
        match self.on_resolving {
            Some(hook) => resolver.with_on_resolving(hook),
            None => resolver,
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("service", &self.service.name())
            .field("implementor", &self.implementor.name())
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// Collects registrations and builds a [`Container`].
///
/// Registering the same service type twice replaces the earlier
/// registration.
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    config: ContainerConfig,
    registrations: Vec<Registration>,
}

impl ContainerBuilder {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with the given configuration.
    #[must_use]
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            config,
            registrations: Vec::new(),
        }
    }

    /// Registers `factory` as the producer of service `S`.
    pub fn register<S: ?Sized + 'static>(
        &mut self,
        lifetime: Lifetime,
        factory: impl Fn(&Scope) -> Result<Instance, ResolveError> + Send + Sync + 'static,
    ) -> &mut Registration {
        let service = TypeInfo::of::<S>();
        self.registrations.retain(|existing| existing.service != service);
        self.registrations.push(Registration {
            service,
            implementor: service,
            lifetime,
            factory: Arc::new(factory),
            disposal: None,
            on_resolving: None,
        });
        let last = self.registrations.len() - 1;
        &mut self.registrations[last]
    }

    /// Registers a service built anew on every resolution.
    pub fn transient<S: ?Sized + 'static>(
        &mut self,
        factory: impl Fn(&Scope) -> Result<Instance, ResolveError> + Send + Sync + 'static,
    ) -> &mut Registration {
        self.register::<S>(Lifetime::Transient, factory)
    }

    /// Registers a service built once per scope.
    pub fn scoped<S: ?Sized + 'static>(
        &mut self,
        factory: impl Fn(&Scope) -> Result<Instance, ResolveError> + Send + Sync + 'static,
    ) -> &mut Registration {
        self.register::<S>(Lifetime::Scoped, factory)
    }

    /// Registers a service shared by the scope branch that first resolves it.
    pub fn scoped_singleton<S: ?Sized + 'static>(
        &mut self,
        factory: impl Fn(&Scope) -> Result<Instance, ResolveError> + Send + Sync + 'static,
    ) -> &mut Registration {
        self.register::<S>(Lifetime::ScopedSingleton, factory)
    }

    /// Registers a service built once per container.
    pub fn singleton<S: ?Sized + 'static>(
        &mut self,
        factory: impl Fn(&Scope) -> Result<Instance, ResolveError> + Send + Sync + 'static,
    ) -> &mut Registration {
        self.register::<S>(Lifetime::Singleton, factory)
    }

    /// Returns `true` if service `S` has a pending registration.
    #[must_use]
    pub fn contains<S: ?Sized + 'static>(&self) -> bool {
        let service = TypeInfo::of::<S>();
        self.registrations
            .iter()
            .any(|registration| registration.service == service)
    }

    /// Freezes the registrations into a container.
    #[must_use]
    pub fn build(self) -> Container {
        let mut resolvers = HashMap::with_capacity(self.registrations.len() + PassThrough::ALL.len());

        for target in PassThrough::ALL {
            resolvers.insert(
                target.type_info().id(),
                Arc::new(Resolver::pass_through(target)),
            );
        }

        for registration in self.registrations {
            let service = registration.service.id();
            resolvers.insert(service, Arc::new(registration.into_resolver(&self.config)));
        }

        tracing::debug!(
            container = %self.config.name(),
            services = resolvers.len(),
            "container built"
        );

        let registry = Arc::new(Registry {
            config: self.config,
            resolvers,
        });
        let root = Scope::new_root(Arc::clone(&registry));
        Container::from_parts(registry, root)
    }
}
