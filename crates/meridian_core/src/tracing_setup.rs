//! Tracing subscriber setup.
//!
//! The resolution engine logs through the `tracing` facade only; nothing is
//! printed until a subscriber is installed. [`TracingSetup`] installs one with
//! the usual knobs: a level, an output format, an optional filter string and
//! span events.
//!
//! Engine events are emitted under the `meridian_resolve` target:
//!
//! | Level | Event |
//! |-------|-------|
//! | `trace` | cache hits |
//! | `debug` | constructions, scope creation and disposal, container build |
//! | `warn` | instances released because their scope died mid-construction |
//!
//! # Example
//!
//! ```
//! use meridian_core::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! // Development: pretty output with resolver construction visible.
//! let dev = TracingSetup::default()
//!     .with_level(Level::INFO)
//!     .with_resolver_level(Level::DEBUG)
//!     .with_format(TracingFormat::Pretty);
//!
//! // Production: JSON output for log aggregation.
//! let prod = TracingSetup::default()
//!     .with_format(TracingFormat::Json)
//!     .with_env_filter("info,meridian_resolve=warn");
//!
//! assert_eq!(dev.directives(), "info,meridian_resolve=debug");
//! assert_eq!(prod.config().format, TracingFormat::Json);
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Log target of the resolution engine.
pub const RESOLVER_TARGET: &str = "meridian_resolve";

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// The effective settings of a [`TracingSetup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// Level for the resolution engine, if it differs from `level`.
    pub resolver_level: Option<Level>,
    /// The configured output format.
    pub format: TracingFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingSetup
// ─────────────────────────────────────────────────────────────────────────────

/// Builder that installs the global `tracing` subscriber.
///
/// Uses the [`tracing`] and [`tracing_subscriber`] crates under the hood.
///
/// # Environment Filter
///
/// [`with_env_filter`](Self::with_env_filter) takes a full directive string
/// and overrides both levels. [`env_filter`](Self::env_filter) reports an
/// unparsable string; [`init`](Self::init) falls back to the configured
/// levels and logs a warning through the subscriber it installed.
///
/// ```
/// use meridian_core::TracingSetup;
///
/// TracingSetup::new()
///     .with_env_filter("warn,meridian_resolve=trace")
/// # ;
/// ```
#[derive(Debug, Clone)]
pub struct TracingSetup {
    /// Maximum log level.
    level: Level,
    /// Maximum level for the `meridian_resolve` target.
    resolver_level: Option<Level>,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., "info,meridian_resolve=debug").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            resolver_level: None,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingSetup {
    /// Creates a `TracingSetup` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the maximum log level for resolution events only.
    #[must_use]
    pub fn with_resolver_level(mut self, level: Level) -> Self {
        self.resolver_level = Some(level);
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `level,target=level,...`
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the effective settings.
    #[must_use]
    pub fn config(&self) -> TracingConfig {
        TracingConfig {
            level: self.level,
            resolver_level: self.resolver_level,
            format: self.format,
        }
    }

    /// Filter directives derived from the configured levels.
    #[must_use]
    pub fn directives(&self) -> String {
        let base = self.level.as_str().to_ascii_lowercase();
        match self.resolver_level {
            Some(level) => format!(
                "{base},{RESOLVER_TARGET}={}",
                level.as_str().to_ascii_lowercase()
            ),
            None => base,
        }
    }

    /// Builds the filter the subscriber is installed with.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the custom filter string set with
    /// [`with_env_filter`](Self::with_env_filter) is invalid.
    pub fn env_filter(&self) -> Result<EnvFilter, ParseError> {
        match &self.env_filter {
            Some(filter) => EnvFilter::try_new(filter),
            None => Ok(EnvFilter::new(self.directives())),
        }
    }

    /// Installs the global subscriber.
    ///
    /// An invalid custom filter is replaced by the configured levels and
    /// reported as a warning once the subscriber is up.
    ///
    /// Returns `false` if a global subscriber was already installed, in which
    /// case the existing one is left in place.
    pub fn init(&self) -> bool {
        let (env_filter, rejected) = match self.env_filter() {
            Ok(filter) => (filter, None),
            Err(error) => (EnvFilter::new(self.directives()), Some(error)),
        };

        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        let installed = match self.format {
            TracingFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
        };

        if installed {
            tracing::info!(
                level = %self.level,
                format = ?self.format,
                "tracing initialized"
            );
            if let (Some(filter), Some(error)) = (&self.env_filter, rejected) {
                tracing::warn!(%filter, %error, "invalid tracing filter, using configured levels");
            }
        }
        installed
    }
}
