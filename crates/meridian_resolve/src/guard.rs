//! Same-thread reentrancy detection.
//!
//! Two guards live here:
//!
//! - [`ActiveResolution`] tracks the resolvers under construction on the
//!   calling thread. Every resolver that runs user code (a factory or a
//!   diagnostic hook) enters it first, because that code may call back into
//!   the container.
//! - [`PassThroughGuard`] is a single per-thread flag for the built-in
//!   pass-through resolvers, which never run user code and so can never
//!   legitimately nest.
//!
//! Both are RAII guards: the thread state is restored when the guard drops,
//! whether the resolution succeeded, failed, or unwound.
//!
//! Resolving the same resolver from two threads at once is not a cycle; the
//! tracked state is per thread.

use core::cell::{Cell, RefCell};
use core::marker::PhantomData;

use hashbrown::HashSet;

use crate::error::ResolveError;
use crate::instance::TypeInfo;
use crate::resolver::ResolverId;

thread_local! {
    static ACTIVE: RefCell<HashSet<ResolverId>> = RefCell::new(HashSet::new());
    static PASS_THROUGH_ACTIVE: Cell<bool> = const { Cell::new(false) };
}

// ─────────────────────────────────────────────────────────────────────────────
// ActiveResolution
// ─────────────────────────────────────────────────────────────────────────────

/// Marks a resolver as under construction on the current thread.
///
/// The guard is `!Send`: it must be dropped on the thread that entered it.
#[derive(Debug)]
pub struct ActiveResolution {
    id: ResolverId,
    _not_send: PhantomData<*const ()>,
}

impl ActiveResolution {
    /// Adds `id` to the current thread's active set.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::CircularDependency`] naming
    /// `(dependency, implementor)` if `id` is already active on this thread.
    pub fn enter(
        id: ResolverId,
        dependency: &TypeInfo,
        implementor: &TypeInfo,
    ) -> Result<Self, ResolveError> {
        let inserted = ACTIVE.with(|active| active.borrow_mut().insert(id));
        if !inserted {
            return Err(ResolveError::circular(dependency, implementor));
        }

        Ok(Self {
            id,
            _not_send: PhantomData,
        })
    }

    /// Returns the guarded resolver id.
    #[must_use]
    pub fn id(&self) -> ResolverId {
        self.id
    }
}

impl Drop for ActiveResolution {
    fn drop(&mut self) {
        // The thread-local may already be gone during thread teardown.
        let _ = ACTIVE.try_with(|active| active.borrow_mut().remove(&self.id));
    }
}

/// Runs `body` while `id` is marked active on the current thread.
///
/// A circular-dependency error escaping `body` is extended with
/// `(dependency, implementor)` so the outermost error names every resolver on
/// the path. Other errors pass through unchanged.
///
/// # Errors
///
/// Returns [`ResolveError::CircularDependency`] if `id` is already active,
/// or whatever `body` returns.
pub fn guarded<T>(
    id: ResolverId,
    dependency: &TypeInfo,
    implementor: &TypeInfo,
    body: impl FnOnce() -> Result<T, ResolveError>,
) -> Result<T, ResolveError> {
    let _active = ActiveResolution::enter(id, dependency, implementor)?;
    body().map_err(|error| error.within(dependency, implementor))
}

/// Returns `true` if `id` is under construction on the current thread.
#[must_use]
pub fn is_active(id: ResolverId) -> bool {
    ACTIVE.with(|active| active.borrow().contains(&id))
}

/// Number of resolvers under construction on the current thread.
#[must_use]
pub fn active_count() -> usize {
    ACTIVE.with(|active| active.borrow().len())
}

// ─────────────────────────────────────────────────────────────────────────────
// PassThroughGuard
// ─────────────────────────────────────────────────────────────────────────────

/// Reentrancy flag for resolvers that never run user code.
///
/// Pass-through resolvers hand back an object that already exists (the
/// container, the requesting scope, its locator). Nothing on that path can
/// call back into the container, so any nesting is an engine bug and is
/// reported as a cycle.
#[derive(Debug)]
pub struct PassThroughGuard {
    _not_send: PhantomData<*const ()>,
}

impl PassThroughGuard {
    /// Sets the current thread's pass-through flag.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::CircularDependency`] if the flag is already set.
    pub fn enter(dependency: &TypeInfo, implementor: &TypeInfo) -> Result<Self, ResolveError> {
        if PASS_THROUGH_ACTIVE.with(|flag| flag.replace(true)) {
            return Err(ResolveError::circular(dependency, implementor));
        }
        Ok(Self {
            _not_send: PhantomData,
        })
    }
}

impl Drop for PassThroughGuard {
    fn drop(&mut self) {
        let _ = PASS_THROUGH_ACTIVE.try_with(|flag| flag.set(false));
    }
}
