//! Hierarchical resolution scopes.
//!
//! A [`Scope`] is a node in the resolution tree. Each scope owns:
//!
//! - a cache of instances keyed by resolver id (Scoped and ScopedSingleton),
//! - an ordered list of disposers for the instances it owns,
//! - a disposed flag,
//!
//! all behind one `RwLock`. Scopes link to their parent and to the container's
//! root scope, where Singleton ownership lives.
//!
//! ```text
//! root (Singletons are owned here)
//! ├── request A
//! │   └── unit of work A.1
//! └── request B
//! ```
//!
//! # Locking
//!
//! The cache and disposer list are mutated only under the write lock and read
//! under at least the read lock. The lock is never held while a factory runs;
//! construction is serialized per cache entry by its [`Slot`].
//!
//! # Example
//!
//! ```
//! use meridian_resolve::container::ContainerBuilder;
//! use meridian_resolve::instance::Instance;
//!
//! struct RequestId(u64);
//!
//! let mut builder = ContainerBuilder::new();
//! builder.scoped::<RequestId>(|scope| Ok(Instance::new(RequestId(scope.id().get()))));
//! let container = builder.build();
//!
//! let request = container.create_scope();
//! let first = request.get::<RequestId>().unwrap();
//! let second = request.get::<RequestId>().unwrap();
//! assert_eq!(first.0, second.0);
//!
//! request.dispose();
//! assert!(request.get::<RequestId>().is_err());
//! ```

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockUpgradableReadGuard, RwLockWriteGuard};

use crate::container::{Container, Registry};
use crate::disposal::{DisposalStrategy, Disposer};
use crate::error::ResolveError;
use crate::instance::{Instance, TypeInfo};
use crate::locator::Locator;
use crate::resolver::ResolverId;
use crate::slot::{BuildTicket, Slot};

/// Unique identifier for a scope, used in diagnostics and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// Lock-protected state of a scope.
#[derive(Default)]
pub(crate) struct ScopeState {
    pub(crate) disposed: bool,
    pub(crate) cache: HashMap<ResolverId, Arc<Slot>>,
    pub(crate) disposers: Vec<Disposer>,
}

struct ScopeNode {
    id: ScopeId,
    parent: Option<Scope>,
    /// `None` for the root scope itself.
    root: Option<Scope>,
    registry: Arc<Registry>,
    state: RwLock<ScopeState>,
}

/// A node in the resolution tree.
///
/// Cloning a `Scope` clones the handle; all clones refer to the same node.
#[derive(Clone)]
pub struct Scope {
    node: Arc<ScopeNode>,
}

impl Scope {
    pub(crate) fn new_root(registry: Arc<Registry>) -> Self {
        let scope = Self::with_links(None, None, registry);
        tracing::debug!(
            container = %scope.node.registry.config().name(),
            scope = %scope.id(),
            "root scope created"
        );
        scope
    }

    fn with_links(parent: Option<Scope>, root: Option<Scope>, registry: Arc<Registry>) -> Self {
        Self {
            node: Arc::new(ScopeNode {
                id: ScopeId::next(),
                parent,
                root,
                registry,
                state: RwLock::new(ScopeState::default()),
            }),
        }
    }

    /// Creates a child scope.
    ///
    /// The child sees ScopedSingleton instances already resolved by its
    /// ancestors and shares the container's Singletons.
    #[must_use]
    pub fn create_child(&self) -> Scope {
        let child = Self::with_links(
            Some(self.clone()),
            Some(self.root().clone()),
            Arc::clone(&self.node.registry),
        );
        tracing::debug!(
            container = %self.node.registry.config().name(),
            scope = %child.id(),
            parent = %self.id(),
            "scope created"
        );
        child
    }

    /// Returns this scope's identifier.
    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.node.id
    }

    /// Returns the parent scope, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<&Scope> {
        self.node.parent.as_ref()
    }

    /// Returns the container's root scope.
    #[must_use]
    pub fn root(&self) -> &Scope {
        self.node.root.as_ref().unwrap_or(self)
    }

    /// Returns `true` if this is the container's root scope.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.node.root.is_none()
    }

    /// Returns `true` once [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.node.state.read().disposed
    }

    /// Returns `true` if both handles refer to the same scope.
    #[must_use]
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Returns the container this scope belongs to.
    #[must_use]
    pub fn container(&self) -> Container {
        Container::from_parts(Arc::clone(&self.node.registry), self.root().clone())
    }

    /// Returns a read-only locator bound to this scope.
    #[must_use]
    pub fn locator(&self) -> Locator {
        Locator::new(self.clone())
    }

    /// Number of disposers this scope currently owns.
    #[must_use]
    pub fn disposer_count(&self) -> usize {
        self.node.state.read().disposers.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolves the resolver registered for `service` in this scope.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NotRegistered`] if nothing is registered for `service`
    /// - [`ResolveError::ObjectDisposed`] if a scope on the path is disposed
    /// - [`ResolveError::CircularDependency`] on same-thread reentry
    /// - any error returned by the factory or diagnostic hook
    pub fn resolve(&self, service: &TypeInfo) -> Result<Instance, ResolveError> {
        let resolver = self
            .node
            .registry
            .get(service.id())
            .ok_or(ResolveError::NotRegistered(service.name()))?;
        resolver.create(self, service)
    }

    /// Resolves the service `S` in this scope.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve), plus [`ResolveError::TypeMismatch`]
    /// if the registered factory produced something other than an `S`.
    pub fn get<S: Send + Sync + 'static>(&self) -> Result<Arc<S>, ResolveError> {
        let instance = self.resolve(&TypeInfo::of::<S>())?;
        instance.downcast::<S>().ok_or(ResolveError::TypeMismatch {
            expected: core::any::type_name::<S>(),
            actual: instance.type_name(),
        })
    }

    /// Returns `true` if a resolver is registered for `S`.
    #[must_use]
    pub fn contains<S: ?Sized + 'static>(&self) -> bool {
        self.node
            .registry
            .get(core::any::TypeId::of::<S>())
            .is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Teardown
    // ─────────────────────────────────────────────────────────────────────────

    /// Tears the scope down.
    ///
    /// Marks the scope disposed, drops its cache, and releases every instance
    /// it owns in reverse registration order. Calling this again is a no-op.
    /// Child scopes are not disposed; resolutions that reach a disposed
    /// ancestor fail with [`ResolveError::ObjectDisposed`].
    pub fn dispose(&self) {
        let disposers = {
            let mut state = self.node.state.write();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.cache.clear();
            core::mem::take(&mut state.disposers)
        };

        tracing::debug!(
            container = %self.node.registry.config().name(),
            scope = %self.id(),
            disposers = disposers.len(),
            "disposing scope"
        );

        for disposer in disposers.into_iter().rev() {
            disposer.release();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Engine surface
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, ScopeState> {
        self.node.state.read()
    }

    pub(crate) fn upgradable_state(&self) -> RwLockUpgradableReadGuard<'_, ScopeState> {
        self.node.state.upgradable_read()
    }

    pub(crate) fn write_state(&self) -> RwLockWriteGuard<'_, ScopeState> {
        self.node.state.write()
    }

    pub(crate) fn disposed_error(&self) -> ResolveError {
        ResolveError::ObjectDisposed { scope: self.id() }
    }

    /// Fails if the scope has been disposed.
    pub(crate) fn ensure_live(&self) -> Result<(), ResolveError> {
        if self.read_state().disposed {
            return Err(self.disposed_error());
        }
        Ok(())
    }

    /// Returns the published instance for `id` under the read lock.
    pub(crate) fn cached(&self, id: ResolverId) -> Result<Option<Instance>, ResolveError> {
        let state = self.read_state();
        if state.disposed {
            return Err(self.disposed_error());
        }
        Ok(state.cache.get(&id).and_then(|slot| slot.get()))
    }

    /// Like [`cached`](Self::cached), but waits out a construction of `id`
    /// that is in progress on another thread.
    ///
    /// The scope lock is released while waiting.
    pub(crate) fn settled(&self, id: ResolverId) -> Result<Option<Instance>, ResolveError> {
        let slot = {
            let state = self.read_state();
            if state.disposed {
                return Err(self.disposed_error());
            }
            state.cache.get(&id).map(Arc::clone)
        };
        let Some(slot) = slot else {
            return Ok(None);
        };
        let instance = slot.wait_settled();
        self.ensure_live()?;
        Ok(instance)
    }

    /// Returns the cache slot for `id`, inserting an empty one if absent.
    pub(crate) fn slot_for(&self, id: ResolverId) -> Result<Arc<Slot>, ResolveError> {
        let mut state = self.write_state();
        if state.disposed {
            return Err(self.disposed_error());
        }
        Ok(Arc::clone(state.cache.entry(id).or_default()))
    }

    /// Caches an instance owned by an ancestor without taking ownership.
    ///
    /// Returns the instance that ends up cached here, which is an earlier
    /// one if another thread got there first.
    pub(crate) fn inherit(
        &self,
        id: ResolverId,
        instance: Instance,
    ) -> Result<Instance, ResolveError> {
        let slot = {
            let mut state = self.write_state();
            if state.disposed {
                return Err(self.disposed_error());
            }
            match state.cache.get(&id) {
                Some(slot) => Arc::clone(slot),
                None => {
                    state
                        .cache
                        .insert(id, Arc::new(Slot::ready(instance.clone())));
                    return Ok(instance);
                }
            }
        };
        Ok(slot.publish_if_empty(instance))
    }

    /// Takes ownership of a freshly built instance and publishes it.
    ///
    /// The disposer is registered and the slot filled under one write lock,
    /// so teardown either sees both or neither. If the scope was disposed
    /// while the instance was being built, the instance is released at once.
    pub(crate) fn adopt(
        &self,
        ticket: BuildTicket<'_>,
        instance: Instance,
        strategy: &DisposalStrategy,
    ) -> Result<Instance, ResolveError> {
        let mut state = self.write_state();
        if state.disposed {
            drop(state);
            drop(ticket);
            self.discard(&instance, strategy);
            return Err(self.disposed_error());
        }
        if let Some(disposer) = strategy.disposer_for(&instance) {
            state.disposers.push(disposer);
        }
        ticket.fulfill(instance.clone());
        Ok(instance)
    }

    /// Registers the disposer for an uncached instance this scope owns.
    pub(crate) fn track(
        &self,
        instance: &Instance,
        strategy: &DisposalStrategy,
    ) -> Result<(), ResolveError> {
        let mut state = self.write_state();
        if state.disposed {
            drop(state);
            self.discard(instance, strategy);
            return Err(self.disposed_error());
        }
        if let Some(disposer) = strategy.disposer_for(instance) {
            state.disposers.push(disposer);
        }
        Ok(())
    }

    /// Releases an instance whose owning scope went away mid-construction.
    pub(crate) fn discard(&self, instance: &Instance, strategy: &DisposalStrategy) {
        tracing::warn!(
            scope = %self.id(),
            instance = instance.type_name(),
            "scope disposed during construction, releasing instance"
        );
        if let Some(disposer) = strategy.disposer_for(instance) {
            disposer.release();
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id())
            .field("parent", &self.parent().map(Scope::id))
            .field("root", &self.is_root())
            .finish_non_exhaustive()
    }
}
