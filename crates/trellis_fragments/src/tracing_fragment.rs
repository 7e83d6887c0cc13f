//! Tracing and observability fragment.
//!
//! Provides [`TracingFragment`] which configures the `tracing` subscriber and
//! exposes the chosen configuration as the `tracing` capability.
//!
//! The fragment is named, so mounting it from several reusable fragments
//! installs the subscriber exactly once per assembled pipeline; later mounts
//! alias the first configuration.
//!
//! # Example
//!
//! ```
//! use trellis_compose::assembly::Pipeline;
//! use trellis_fragments::{TracingFormat, TracingFragment};
//! use tracing::Level;
//!
//! let mut pipeline = Pipeline::new();
//! pipeline
//!     .mount(
//!         TracingFragment::default()
//!             .with_level(Level::DEBUG)
//!             .with_format(TracingFormat::Compact),
//!     )
//!     .unwrap();
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use trellis_compose::assembly::ScopeBuilder;
use trellis_compose::error::AssemblyError;
use trellis_compose::fragment::{Fragment, FragmentIdentity};

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
// TracingConfig Capability
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing configuration, exposed as the `tracing` capability.
///
/// Hooks and handlers can read this to adapt their logging behavior to the
/// configured level.
///
/// # Example
///
/// ```ignore
/// let config = ctx.capability::<TracingConfig>("tracing")?;
/// if config.level <= Level::DEBUG {
///     tracing::debug!("verbose diagnostics enabled");
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingFragment
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging fragment.
///
/// Configures the `tracing` subscriber and exposes the configuration as a
/// capability. Uses the [`tracing`] and [`tracing_subscriber`] crates under
/// the hood.
///
/// # Capabilities Provided
///
/// | Capability | Value | Description |
/// |------------|-------|-------------|
/// | `tracing` | [`TracingConfig`] | Tracing configuration (read-only) |
///
/// # Configuration Options
///
/// ```
/// use trellis_fragments::{TracingFormat, TracingFragment};
/// use tracing::Level;
///
/// // Development: Pretty colored output with debug level
/// let dev = TracingFragment::default()
///     .with_level(Level::DEBUG)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);  // Show span enter/exit
///
/// // Production: JSON output for log aggregation
/// let prod = TracingFragment::default()
///     .with_level(Level::INFO)
///     .with_format(TracingFormat::Json)
///     .with_env_filter("trellis=info,hyper=warn");
/// ```
#[derive(Clone)]
pub struct TracingFragment {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., "trellis=debug,hyper=warn").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingFragment {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingFragment {
    /// Creates a new `TracingFragment` with default settings.
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

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`
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

    fn install_subscriber(&self) {
        let env_filter = match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        };

        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init().ok() ignores errors if a subscriber is already installed
        match self.format {
            TracingFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Compact => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
        }
    }
}

impl Fragment for TracingFragment {
    fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
        self.install_subscriber();
        scope.expose(
            "tracing",
            TracingConfig {
                level: self.level,
                format: self.format,
            },
        )?;
        tracing::info!(
            level = %self.level,
            format = ?self.format,
            "TracingFragment initialized"
        );
        Ok(())
    }

    fn identity(&self) -> Option<FragmentIdentity> {
        Some(FragmentIdentity::named("tracing"))
    }

    fn label(&self) -> &str {
        "tracing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_format_default_is_pretty() {
        let format = TracingFormat::default();
        assert_eq!(format, TracingFormat::Pretty);
    }

    #[test]
    fn tracing_fragment_default_level_is_info() {
        let fragment = TracingFragment::default();
        assert_eq!(fragment.level, Level::INFO);
    }

    #[test]
    fn tracing_fragment_with_level() {
        let fragment = TracingFragment::new().with_level(Level::DEBUG);
        assert_eq!(fragment.level, Level::DEBUG);
    }

    #[test]
    fn tracing_fragment_with_format() {
        let fragment = TracingFragment::new().with_format(TracingFormat::Json);
        assert_eq!(fragment.format, TracingFormat::Json);
    }

    #[test]
    fn tracing_fragment_with_env_filter() {
        let fragment = TracingFragment::new().with_env_filter("trellis=debug");
        assert_eq!(fragment.env_filter, Some("trellis=debug".to_string()));
    }

    #[test]
    fn tracing_fragment_is_named() {
        let identity = TracingFragment::default().identity().unwrap();
        assert_eq!(identity.name(), "tracing");
        assert!(identity.seed().is_none());
    }
}
