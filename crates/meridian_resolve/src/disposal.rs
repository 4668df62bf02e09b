//! Disposal ownership.
//!
//! When a resolver builds an instance, the disposal coordinator decides
//! whether anything must be released later and which scope owns that job:
//!
//! | Lifetime | Owning scope |
//! |----------|--------------|
//! | Transient | the requesting scope |
//! | Scoped | the requesting scope |
//! | ScopedSingleton | the scope that built it (never a scope that inherited it) |
//! | Singleton | the container's root scope |
//!
//! The [`DisposalStrategy`] decides what gets registered:
//!
//! - [`UseCapability`](DisposalStrategy::UseCapability) registers only
//!   instances carrying the [`Dispose`](crate::instance::Dispose) capability.
//! - [`UseCallback`](DisposalStrategy::UseCallback) always registers and runs
//!   the callback at teardown.
//! - [`RenounceOwnership`](DisposalStrategy::RenounceOwnership) registers
//!   nothing; the caller owns the instance.

use core::fmt;
use std::sync::Arc;

use crate::instance::{Dispose, Instance};
use crate::resolver::Lifetime;
use crate::scope::Scope;

/// Release action run in place of the disposal capability.
pub type ReleaseFn = Arc<dyn Fn(&Instance) + Send + Sync>;

/// How instances built by a resolver are released.
#[derive(Clone, Default)]
pub enum DisposalStrategy {
    /// Dispose the instance through its [`Dispose`] capability, if it has one.
    #[default]
    UseCapability,
    /// Run a callback with the instance at teardown.
    UseCallback(ReleaseFn),
    /// Never release the instance.
    RenounceOwnership,
}

impl DisposalStrategy {
    /// Creates a [`UseCallback`](Self::UseCallback) strategy.
    pub fn callback(release: impl Fn(&Instance) + Send + Sync + 'static) -> Self {
        Self::UseCallback(Arc::new(release))
    }

    /// Returns the disposer to register for `instance`, if any.
    #[must_use]
    pub fn disposer_for(&self, instance: &Instance) -> Option<Disposer> {
        let release = match self {
            Self::UseCapability => Release::Capability(Arc::clone(instance.capability()?)),
            Self::UseCallback(release) => Release::Callback(Arc::clone(release)),
            Self::RenounceOwnership => return None,
        };
        Some(Disposer {
            instance: instance.clone(),
            release,
        })
    }
}

impl fmt::Debug for DisposalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UseCapability => f.write_str("UseCapability"),
            Self::UseCallback(_) => f.write_str("UseCallback(..)"),
            Self::RenounceOwnership => f.write_str("RenounceOwnership"),
        }
    }
}

/// Returns the scope that owns instances of `lifetime` built for `requesting`.
#[must_use]
pub fn owning_scope(lifetime: Lifetime, requesting: &Scope) -> &Scope {
    match lifetime {
        Lifetime::Singleton => requesting.root(),
        Lifetime::Transient | Lifetime::Scoped | Lifetime::ScopedSingleton => requesting,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Disposer
// ─────────────────────────────────────────────────────────────────────────────

enum Release {
    Capability(Arc<dyn Dispose>),
    Callback(ReleaseFn),
}

/// An instance paired with the action that releases it.
pub struct Disposer {
    instance: Instance,
    release: Release,
}

impl Disposer {
    /// The instance this disposer releases.
    #[must_use]
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Runs the release action, consuming the disposer.
    pub fn release(self) {
        match self.release {
            Release::Capability(capability) => capability.dispose(),
            Release::Callback(callback) => callback(&self.instance),
        }
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.release {
            Release::Capability(_) => "capability",
            Release::Callback(_) => "callback",
        };
        f.debug_struct("Disposer")
            .field("instance", &self.instance)
            .field("release", &kind)
            .finish()
    }
}
