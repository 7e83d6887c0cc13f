//! Stock fragments for Trellis pipelines (Layer 2).
//!
//! Infrastructure fragments built on `trellis_compose`:
//!
//! - [`TracingFragment`] - `tracing` subscriber setup and configuration
//! - [`PipelineInfoFragment`] - pipeline metadata capability
//! - [`RequestIdFragment`] - sequential request ids as context fields
//! - [`DefaultFragments`] - the above, bundled
//!
//! # Example
//!
//! ```
//! use trellis_compose::assembly::Pipeline;
//! use trellis_fragments::DefaultFragments;
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.mount(DefaultFragments::default()).unwrap();
//! ```

mod pipeline_info;
mod request_id;
mod tracing_fragment;

pub use pipeline_info::{PipelineInfo, PipelineInfoFragment};
pub use request_id::{REQUEST_ID_COUNTER, REQUEST_ID_FIELD, RequestIdFragment};
pub use tracing_fragment::{TracingConfig, TracingFormat, TracingFragment};

use trellis_compose::assembly::ScopeBuilder;
use trellis_compose::error::AssemblyError;
use trellis_compose::fragment::Fragments;

/// The stock infrastructure fragments, mounted together.
///
/// Mounts [`PipelineInfoFragment`], [`TracingFragment`], and
/// [`RequestIdFragment`] directly at the mounting scope — no wrapper node,
/// so each behaves exactly as if mounted individually. All three are named,
/// so pipelines that also mount them elsewhere still register each exactly
/// once.
#[derive(Debug, Default, Clone)]
pub struct DefaultFragments {
    info: PipelineInfo,
}

impl DefaultFragments {
    /// Bundles the stock fragments with the given pipeline metadata.
    #[must_use]
    pub fn new(info: PipelineInfo) -> Self {
        Self { info }
    }
}

impl Fragments for DefaultFragments {
    fn mount_into(self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
        scope.mount((
            PipelineInfoFragment::new(self.info),
            TracingFragment::default(),
            RequestIdFragment,
        ))
    }
}
