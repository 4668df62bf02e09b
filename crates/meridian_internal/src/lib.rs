//! # Meridian Internal Library
//!
//! Re-exports the core Meridian crates for convenience.

/// The dependency-resolution engine.
pub use meridian_resolve;

/// Ambient infrastructure.
pub use meridian_core;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use meridian_core::{TracingFormat, TracingSetup};
    pub use meridian_resolve::prelude::*;
}
