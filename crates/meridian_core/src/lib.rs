//! Core infrastructure for Meridian.
//!
//! - [`TracingSetup`] - Installs the `tracing` subscriber that renders the
//!   resolution engine's structured events
//!
//! # Example
//!
//! ```
//! use meridian_core::{TracingFormat, TracingSetup};
//! use meridian_resolve::container::{ContainerBuilder, ContainerConfig};
//! use meridian_resolve::instance::Instance;
//! use tracing::Level;
//!
//! TracingSetup::default()
//!     .with_resolver_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .init();
//!
//! let mut builder = ContainerBuilder::with_config(ContainerConfig::new("orders"));
//! builder.singleton::<u64>(|_| Ok(Instance::new(42_u64)));
//! let container = builder.build();
//! assert_eq!(*container.get::<u64>().unwrap(), 42);
//! ```

mod tracing_setup;

pub use tracing_setup::{RESOLVER_TARGET, TracingConfig, TracingFormat, TracingSetup};
