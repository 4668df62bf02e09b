//! Type-erased instances and type identities.
//!
//! Resolvers produce [`Instance`] values: cloneable shared handles to a
//! `Send + Sync` value. An instance may also carry the [`Dispose`] capability,
//! captured when it is constructed, which the disposal coordinator uses to
//! decide whether a scope must release it at teardown.
//!
//! # Example
//!
//! ```
//! use meridian_resolve::instance::{Dispose, Instance};
//!
//! struct Connection;
//!
//! impl Dispose for Connection {
//!     fn dispose(&self) {
//!         // close sockets, flush buffers, ...
//!     }
//! }
//!
//! let plain = Instance::new(42_u32);
//! assert!(!plain.is_disposable());
//!
//! let conn = Instance::disposable(Connection);
//! assert!(conn.is_disposable());
//! assert!(conn.downcast::<Connection>().is_some());
//! ```

use core::any::{Any, TypeId};
use core::fmt;
use std::sync::Arc;

/// Capability for instances that hold resources needing explicit release.
///
/// Scopes call [`dispose`](Self::dispose) once, at teardown, on every instance
/// they own.
pub trait Dispose: Send + Sync + 'static {
    /// Releases the resources held by this instance.
    fn dispose(&self);
}

// ─────────────────────────────────────────────────────────────────────────────
// TypeInfo
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime identity of a service or implementation type.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// Returns the identity of `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the type name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl core::hash::Hash for TypeInfo {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instance
// ─────────────────────────────────────────────────────────────────────────────

/// A resolved value, shared between every scope that caches it.
///
/// Cloning an `Instance` clones the handle, not the value. Two handles refer
/// to the same value when [`ptr_eq`](Self::ptr_eq) returns `true`.
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    capability: Option<Arc<dyn Dispose>>,
    type_name: &'static str,
}

impl Instance {
    /// Wraps a value that has no disposal capability.
    #[must_use]
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value that has no disposal capability.
    #[must_use]
    pub fn from_arc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            value,
            capability: None,
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Wraps a value that must be disposed by its owning scope.
    #[must_use]
    pub fn disposable<T: Dispose>(value: T) -> Self {
        Self::disposable_arc(Arc::new(value))
    }

    /// Wraps an already shared value that must be disposed by its owning scope.
    #[must_use]
    pub fn disposable_arc<T: Dispose>(value: Arc<T>) -> Self {
        Self {
            value: Arc::clone(&value) as Arc<dyn Any + Send + Sync>,
            capability: Some(value),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns `true` if the value exposes the [`Dispose`] capability.
    #[must_use]
    pub fn is_disposable(&self) -> bool {
        self.capability.is_some()
    }

    /// Returns the disposal capability, if any.
    #[must_use]
    pub fn capability(&self) -> Option<&Arc<dyn Dispose>> {
        self.capability.as_ref()
    }

    /// Returns a typed handle to the value, or `None` if it is not a `T`.
    #[must_use]
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// Returns `true` if the value is a `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.value.as_ref().is::<T>()
    }

    /// Returns `true` if both handles refer to the same value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(&other.value))
    }

    /// Returns the concrete type name of the value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("disposable", &self.is_disposable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Handle {
        released: AtomicUsize,
    }

    impl Dispose for Handle {
        fn dispose(&self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn plain_instance_has_no_capability() {
        let instance = Instance::new(String::from("hello"));
        assert!(!instance.is_disposable());
        assert!(instance.is::<String>());
        assert_eq!(instance.downcast::<String>().unwrap().as_str(), "hello");
    }

    #[test]
    fn downcast_to_wrong_type_is_none() {
        let instance = Instance::new(7_u8);
        assert!(instance.downcast::<u16>().is_none());
    }

    #[test]
    fn clones_share_identity() {
        let a = Instance::new(1_i32);
        let b = a.clone();
        let c = Instance::new(1_i32);

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn disposable_capability_targets_same_value() {
        let instance = Instance::disposable(Handle::default());
        instance.capability().unwrap().dispose();

        let handle = instance.downcast::<Handle>().unwrap();
        assert_eq!(handle.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn type_info_equality_ignores_name() {
        assert_eq!(TypeInfo::of::<Handle>(), TypeInfo::of::<Handle>());
        assert_ne!(TypeInfo::of::<Handle>(), TypeInfo::of::<String>());
        assert!(TypeInfo::of::<Handle>().name().ends_with("Handle"));
    }
}
