//! A composition engine for assembling request-processing pipelines in Rust.
//!

pub use trellis_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use trellis_internal::prelude::*;
}
