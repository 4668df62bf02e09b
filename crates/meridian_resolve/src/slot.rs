//! Single-construction cells for cached instances.
//!
//! A [`Slot`] holds at most one instance and moves through
//! `Empty → Building → Ready`. Only the thread holding a [`BuildTicket`] may
//! construct; every other first-time caller blocks on the slot's condition
//! variable until the builder publishes or gives up. Giving up (dropping the
//! ticket without fulfilling it) returns the slot to `Empty` and wakes the
//! waiters, so one of them can make its own attempt.
//!
//! Scope and root locks are never held while a factory runs. The slot is what
//! serializes construction, which keeps a factory free to resolve other
//! services from the same scope.
//!
//! # Wait cycles
//!
//! Every blocked caller records which thread it is waiting on. Before
//! blocking, a caller follows those records from the slot's builder; if the
//! chain leads back to the caller, the builders are waiting on each other
//! across threads and the caller gets [`Claim::Reentrant`] instead of
//! blocking forever. Lock order is slot state, then the wait registry.

use std::sync::LazyLock;
use std::thread::{self, ThreadId};

use hashbrown::HashMap;
use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::instance::Instance;

/// Blocked threads, keyed by waiter.
static WAITS: LazyLock<Mutex<HashMap<ThreadId, Wait>>> = LazyLock::new(Mutex::default);

/// A thread blocked on a slot.
#[derive(Debug, Clone, Copy)]
struct Wait {
    slot: usize,
    builder: ThreadId,
}

/// Records that `waiter` blocks on `slot`, built by `builder`.
///
/// Returns `false`, recording nothing, if the builder is itself waiting
/// (directly or transitively) on `waiter`.
fn begin_wait(waiter: ThreadId, slot: usize, builder: ThreadId) -> bool {
    let mut waits = WAITS.lock();
    let mut next = Some(builder);
    let mut hops = 0;
    while let Some(thread) = next {
        if thread == waiter {
            return false;
        }
        if hops > waits.len() {
            break;
        }
        next = waits.get(&thread).map(|wait| wait.builder);
        hops += 1;
    }
    waits.insert(waiter, Wait { slot, builder });
    true
}

fn end_wait(waiter: ThreadId) {
    WAITS.lock().remove(&waiter);
}

/// Drops the records of everyone blocked on `slot`; its build has settled.
fn release_waiters(slot: usize) {
    WAITS.lock().retain(|_, wait| wait.slot != slot);
}

/// Construction state of a [`Slot`].
#[derive(Debug, Clone)]
enum SlotState {
    /// Nothing built yet, or the last attempt failed.
    Empty,
    /// A thread is running the factory.
    Building(ThreadId),
    /// The instance is published.
    Ready(Instance),
}

/// Outcome of [`Slot::claim`].
#[derive(Debug)]
pub enum Claim<'a> {
    /// Another caller already published an instance.
    Ready(Instance),
    /// The caller must build the instance and fulfill the ticket.
    Build(BuildTicket<'a>),
    /// The calling thread is already building this slot, or waiting for it
    /// would close a cycle of threads waiting on each other's builds.
    Reentrant,
}

/// A cell that is filled at most once per successful construction.
#[derive(Debug)]
pub struct Slot {
    state: Mutex<SlotState>,
    settled: Condvar,
}

impl Default for Slot {
    fn default() -> Self {
        Self::new()
    }
}

impl Slot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
            settled: Condvar::new(),
        }
    }

    /// Creates a slot that already holds `instance`.
    #[must_use]
    pub fn ready(instance: Instance) -> Self {
        Self {
            state: Mutex::new(SlotState::Ready(instance)),
            settled: Condvar::new(),
        }
    }

    /// Returns the published instance without blocking on a builder.
    #[must_use]
    pub fn get(&self) -> Option<Instance> {
        match &*self.state.lock() {
            SlotState::Ready(instance) => Some(instance.clone()),
            SlotState::Empty | SlotState::Building(_) => None,
        }
    }

    /// Returns `true` if an instance is published.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(&*self.state.lock(), SlotState::Ready(_))
    }

    /// Returns the published instance or the right to build it.
    ///
    /// Blocks while another thread is building, unless that thread is
    /// waiting on the caller.
    pub fn claim(&self) -> Claim<'_> {
        let current = thread::current().id();
        let mut state = self.state.lock();
        loop {
            let builder = match &*state {
                SlotState::Ready(instance) => return Claim::Ready(instance.clone()),
                SlotState::Building(owner) if *owner == current => return Claim::Reentrant,
                SlotState::Building(owner) => Some(*owner),
                SlotState::Empty => None,
            };
            if let Some(builder) = builder {
                if !self.wait_for(&mut state, current, builder) {
                    return Claim::Reentrant;
                }
                continue;
            }

            *state = SlotState::Building(current);
            return Claim::Build(BuildTicket {
                slot: self,
                fulfilled: false,
            });
        }
    }

    /// Like [`claim`](Self::claim), but returns `None` instead of blocking
    /// when another thread is building.
    ///
    /// Used while holding a lock the builder will need to publish.
    pub fn try_claim(&self) -> Option<Claim<'_>> {
        let current = thread::current().id();
        let mut state = self.state.lock();
        let empty = match &*state {
            SlotState::Ready(instance) => return Some(Claim::Ready(instance.clone())),
            SlotState::Building(owner) if *owner == current => return Some(Claim::Reentrant),
            SlotState::Building(_) => false,
            SlotState::Empty => true,
        };
        if !empty {
            return None;
        }

        *state = SlotState::Building(current);
        Some(Claim::Build(BuildTicket {
            slot: self,
            fulfilled: false,
        }))
    }

    /// Publishes `instance` unless another instance wins the slot first.
    ///
    /// Returns the instance that ends up published: `instance` itself, or the
    /// one already there. Waits for an in-flight build on another thread to
    /// settle. Used to copy an inherited instance into a descendant scope.
    pub fn publish_if_empty(&self, instance: Instance) -> Instance {
        let current = thread::current().id();
        let mut state = self.state.lock();
        loop {
            let builder = match &*state {
                SlotState::Ready(existing) => return existing.clone(),
                SlotState::Building(owner) if *owner == current => return instance,
                SlotState::Building(owner) => Some(*owner),
                SlotState::Empty => None,
            };
            if let Some(builder) = builder {
                if !self.wait_for(&mut state, current, builder) {
                    return instance;
                }
                continue;
            }

            *state = SlotState::Ready(instance.clone());
            self.settled.notify_all();
            return instance;
        }
    }

    /// Returns the published instance, first waiting out a build in
    /// progress on another thread.
    ///
    /// Returns `None` if the slot is empty, is being built by the calling
    /// thread, or waiting would close a cycle of waiting threads.
    pub fn wait_settled(&self) -> Option<Instance> {
        let current = thread::current().id();
        let mut state = self.state.lock();
        loop {
            let builder = match &*state {
                SlotState::Ready(instance) => return Some(instance.clone()),
                SlotState::Building(owner) if *owner != current => *owner,
                SlotState::Building(_) | SlotState::Empty => return None,
            };
            if !self.wait_for(&mut state, current, builder) {
                return None;
            }
        }
    }

    /// Blocks until the slot settles. Returns `false` without blocking if
    /// `builder` is waiting on `current`.
    fn wait_for(
        &self,
        state: &mut MutexGuard<'_, SlotState>,
        current: ThreadId,
        builder: ThreadId,
    ) -> bool {
        if !begin_wait(current, self.addr(), builder) {
            return false;
        }
        self.settled.wait(state);
        end_wait(current);
        true
    }

    fn addr(&self) -> usize {
        core::ptr::from_ref(self).addr()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BuildTicket
// ─────────────────────────────────────────────────────────────────────────────

/// Exclusive right to build a slot's instance.
///
/// Dropping the ticket without calling [`fulfill`](Self::fulfill) resets the
/// slot to empty and wakes waiting callers.
#[derive(Debug)]
pub struct BuildTicket<'a> {
    slot: &'a Slot,
    fulfilled: bool,
}

impl BuildTicket<'_> {
    /// Publishes the built instance and wakes waiting callers.
    pub fn fulfill(mut self, instance: Instance) {
        let mut state = self.slot.state.lock();
        *state = SlotState::Ready(instance);
        release_waiters(self.slot.addr());
        self.fulfilled = true;
        self.slot.settled.notify_all();
    }
}

impl Drop for BuildTicket<'_> {
    fn drop(&mut self) {
        if self.fulfilled {
            return;
        }
        let mut state = self.slot.state.lock();
        *state = SlotState::Empty;
        release_waiters(self.slot.addr());
        self.slot.settled.notify_all();
    }
}
