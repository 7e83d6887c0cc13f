//! # Trellis Internal Library
//!
//! Re-exports the core Trellis crates for convenience.

/// Layer 1: the fragment composition and lifecycle-scoping engine.
pub use trellis_compose;

/// Layer 2: stock fragments built on the engine.
pub use trellis_fragments;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use trellis_compose::prelude::*;
    pub use trellis_fragments::{
        DefaultFragments, PipelineInfo, PipelineInfoFragment, RequestIdFragment, TracingConfig,
        TracingFormat, TracingFragment,
    };
}
