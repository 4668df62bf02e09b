//! Singleton strategy: one instance for the container's lifetime.
//!
//! The instance is cached on the resolver itself. Every request, whichever
//! scope it arrives through, synchronizes on the root scope's lock:
//!
//! 1. read lock: fail if the root is disposed, return the instance if built;
//! 2. upgradable lock: re-check, then claim construction (at most one
//!    upgradable holder at a time, so claims are serialized while plain
//!    readers keep flowing);
//! 3. build with no root lock held;
//! 4. upgradable lock again, upgraded to write: register the disposer on the
//!    root scope, publish, and drop the one-shot factory.

use parking_lot::{Mutex, RwLockUpgradableReadGuard};

use super::{Factory, Lifetime, Resolver};
use crate::disposal;
use crate::error::ResolveError;
use crate::instance::{Instance, TypeInfo};
use crate::scope::Scope;
use crate::slot::{Claim, Slot};

/// One-shot factory and cached instance of a Singleton resolver.
pub(super) struct SingletonCell {
    /// Cleared after the first successful build.
    factory: Mutex<Option<Factory>>,
    slot: Slot,
}

impl SingletonCell {
    pub(super) fn new(factory: Factory) -> Self {
        Self {
            factory: Mutex::new(Some(factory)),
            slot: Slot::new(),
        }
    }

    #[cfg(test)]
    fn has_factory(&self) -> bool {
        self.factory.lock().is_some()
    }
}

/// Returns the container-wide instance, building it on first use.
pub(super) fn resolve(
    resolver: &Resolver,
    cell: &SingletonCell,
    scope: &Scope,
    requested: &TypeInfo,
) -> Result<Instance, ResolveError> {
    let root = disposal::owning_scope(Lifetime::Singleton, scope);

    {
        let state = root.read_state();
        if state.disposed {
            return Err(root.disposed_error());
        }
        if let Some(instance) = cell.slot.get() {
            drop(state);
            return resolver.reuse(instance, scope, requested);
        }
    }

    let claim = {
        let state = root.upgradable_state();
        if state.disposed {
            return Err(root.disposed_error());
        }
        cell.slot.try_claim()
    };
    // Another thread is building; wait for it without holding the root lock
    // it needs to publish.
    let claim = match claim {
        Some(claim) => claim,
        None => cell.slot.claim(),
    };

    let ticket = match claim {
        Claim::Ready(instance) => return resolver.reuse(instance, scope, requested),
        Claim::Reentrant => {
            return Err(ResolveError::circular(requested, resolver.implementor()));
        }
        Claim::Build(ticket) => ticket,
    };

    root.ensure_live()?;
    let Some(factory) = cell.factory.lock().clone() else {
        return Err(ResolveError::factory(format!(
            "singleton factory for {} was already consumed",
            resolver.implementor().name()
        )));
    };
    let instance = resolver.build(&factory, scope, requested)?;

    let state = root.upgradable_state();
    if state.disposed {
        drop(state);
        drop(ticket);
        root.discard(&instance, resolver.disposal());
        return Err(root.disposed_error());
    }
    let mut state = RwLockUpgradableReadGuard::upgrade(state);
    if let Some(disposer) = resolver.disposal().disposer_for(&instance) {
        state.disposers.push(disposer);
    }
    ticket.fulfill(instance.clone());
    cell.factory.lock().take();
    Ok(instance)
}
