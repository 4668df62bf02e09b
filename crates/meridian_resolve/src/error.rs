//! Error types for dependency resolution.

use core::fmt;

use crate::instance::TypeInfo;
use crate::scope::ScopeId;

/// Boxed error produced by user factories.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Errors that can occur while resolving an instance.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A scope on the resolution path was torn down.
    #[error("scope {scope} has been disposed")]
    ObjectDisposed {
        /// The disposed scope that was observed.
        scope: ScopeId,
    },

    /// A resolver was re-entered on the same thread before it finished.
    #[error("circular dependency detected: {0}")]
    CircularDependency(CycleChain),

    /// No resolver is registered for the requested service type.
    #[error("no resolver registered for {0}")]
    NotRegistered(&'static str),

    /// The resolved instance is not of the requested service type.
    #[error("type mismatch: expected {expected}, resolved {actual}")]
    TypeMismatch {
        /// The requested service type.
        expected: &'static str,
        /// The type the resolver actually produced.
        actual: &'static str,
    },

    /// A user factory failed.
    #[error("factory failed: {0}")]
    Factory(#[source] BoxError),
}

impl ResolveError {
    /// Wraps a user error as a factory failure.
    pub fn factory(error: impl Into<BoxError>) -> Self {
        Self::Factory(error.into())
    }

    /// Creates a circular-dependency error for a single re-entered resolver.
    #[must_use]
    pub fn circular(dependency: &TypeInfo, implementor: &TypeInfo) -> Self {
        Self::CircularDependency(CycleChain::new(CycleLink::new(dependency, implementor)))
    }

    /// Returns `true` if this is a circular-dependency error.
    #[must_use]
    pub fn is_circular(&self) -> bool {
        matches!(self, Self::CircularDependency(_))
    }

    /// Returns `true` if this is an object-disposed error.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::ObjectDisposed { .. })
    }

    /// Returns the cycle chain if this is a circular-dependency error.
    #[must_use]
    pub fn cycle(&self) -> Option<&CycleChain> {
        match self {
            Self::CircularDependency(chain) => Some(chain),
            _ => None,
        }
    }

    /// Appends an enclosing resolver to a circular-dependency error.
    ///
    /// Every other variant is returned unchanged.
    #[must_use]
    pub fn within(self, dependency: &TypeInfo, implementor: &TypeInfo) -> Self {
        match self {
            Self::CircularDependency(mut chain) => {
                chain.push(CycleLink::new(dependency, implementor));
                Self::CircularDependency(chain)
            }
            other => other,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CycleChain
// ─────────────────────────────────────────────────────────────────────────────

/// One resolver on a circular-dependency path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleLink {
    /// The type the caller asked for.
    pub dependency: &'static str,
    /// The implementation the resolver builds.
    pub implementor: &'static str,
}

impl CycleLink {
    /// Creates a link from the requested and implementing types.
    #[must_use]
    pub fn new(dependency: &TypeInfo, implementor: &TypeInfo) -> Self {
        Self {
            dependency: dependency.name(),
            implementor: implementor.name(),
        }
    }
}

impl fmt::Display for CycleLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dependency == self.implementor {
            write!(f, "{}", self.implementor)
        } else {
            write!(f, "{} (as {})", self.implementor, self.dependency)
        }
    }
}

/// The resolvers involved in a cycle.
///
/// Links are stored innermost first: the first link is the resolver that was
/// re-entered, and each guard the error crosses on its way out appends the
/// resolver it protects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleChain {
    links: Vec<CycleLink>,
}

impl CycleChain {
    /// Creates a chain containing only the re-entered resolver.
    #[must_use]
    pub fn new(link: CycleLink) -> Self {
        Self { links: vec![link] }
    }

    /// Appends an enclosing resolver.
    pub fn push(&mut self, link: CycleLink) {
        self.links.push(link);
    }

    /// The resolver whose re-entry was detected.
    #[must_use]
    pub fn innermost(&self) -> &CycleLink {
        &self.links[0]
    }

    /// The resolver at the top of the chain.
    #[must_use]
    pub fn outermost(&self) -> &CycleLink {
        &self.links[self.links.len() - 1]
    }

    /// Links from the re-entered resolver outward.
    #[must_use]
    pub fn links(&self) -> &[CycleLink] {
        &self.links
    }

    /// Number of links in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Always `false`; a chain holds at least the re-entered resolver.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl fmt::Display for CycleChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, link) in self.links.iter().rev().enumerate() {
            if index > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{link}")?;
        }
        Ok(())
    }
}
