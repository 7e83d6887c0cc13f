//! Pipeline information fragment.
//!
//! Provides [`PipelineInfoFragment`] which exposes pipeline metadata as the
//! `pipeline_info` capability.

use trellis_compose::assembly::ScopeBuilder;
use trellis_compose::error::AssemblyError;
use trellis_compose::fragment::{Fragment, FragmentIdentity};

/// Pipeline runtime information, exposed as the `pipeline_info` capability.
///
/// # Example
///
/// ```ignore
/// let info = ctx.capability::<PipelineInfo>("pipeline_info")?;
/// tracing::info!("{} v{}", info.name, info.version);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineInfo {
    /// Application name.
    pub name: String,
    /// Application version string.
    pub version: &'static str,
    /// Whether running in debug mode.
    pub debug: bool,
}

impl Default for PipelineInfo {
    fn default() -> Self {
        Self {
            name: "trellis".to_string(),
            version: env!("CARGO_PKG_VERSION"),
            debug: cfg!(debug_assertions),
        }
    }
}

/// Fragment that exposes pipeline metadata.
///
/// # Capabilities Provided
///
/// | Capability | Value | Description |
/// |------------|-------|-------------|
/// | `pipeline_info` | [`PipelineInfo`] | Pipeline metadata |
///
/// The fragment is named and seeded by `(name, version)`: two mounts with
/// the same metadata share one registration, while differing metadata
/// registers independently.
#[derive(Debug, Default, Clone)]
pub struct PipelineInfoFragment {
    info: PipelineInfo,
}

impl PipelineInfoFragment {
    /// Creates a fragment exposing the given metadata.
    #[must_use]
    pub fn new(info: PipelineInfo) -> Self {
        Self { info }
    }
}

impl Fragment for PipelineInfoFragment {
    fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
        scope.expose("pipeline_info", self.info.clone())?;
        Ok(())
    }

    fn identity(&self) -> Option<FragmentIdentity> {
        Some(
            FragmentIdentity::named("pipeline-info")
                .with_seed(&(self.info.name.clone(), self.info.version)),
        )
    }

    fn label(&self) -> &str {
        "pipeline-info"
    }
}
