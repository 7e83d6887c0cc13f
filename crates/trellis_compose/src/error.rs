//! Assembly-time error taxonomy.
//!
//! Every variant is fatal at build time: it aborts the whole tree build (no
//! partial trees) and carries the path of the offending node so the
//! integrator can locate the failing composition step.

/// Errors raised while assembling a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// A fragment composed itself, directly or transitively.
    #[error("cyclic composition: '{fragment}' mounted again within its own registration at {path}")]
    CyclicComposition {
        /// Label of the fragment that closed the cycle.
        fragment: String,
        /// Node path where the cycle was detected.
        path: String,
    },

    /// A required capability or shared-state slot is not visible from the
    /// declaring node.
    #[error("missing dependency: '{name}' is not exposed by any ancestor of {path}")]
    MissingDependency {
        /// The capability or state-slot name that could not be resolved.
        name: String,
        /// Node path of the requiring declaration.
        path: String,
    },

    /// A route referenced a bundle name with no visible definition.
    #[error("missing bundle: '{name}' referenced at {path} is not defined")]
    MissingBundle {
        /// The referenced bundle name.
        name: String,
        /// Node path of the referencing route.
        path: String,
    },

    /// Two mounts share a name but carry seeds of different types.
    #[error(
        "ambiguous identity: fragment '{name}' at {path} was seeded with {second} \
         but an earlier mount used {first}"
    )]
    AmbiguousIdentity {
        /// The shared fragment name.
        name: String,
        /// Seed type of the first recorded mount.
        first: &'static str,
        /// Seed type of the conflicting mount.
        second: &'static str,
        /// Node path of the conflicting mount.
        path: String,
    },

    /// A capability name was exposed twice on the same node.
    #[error("capability '{name}' already exposed at {path}")]
    DuplicateCapability {
        /// The colliding capability name.
        name: String,
        /// Node path where the collision happened.
        path: String,
    },
}

impl AssemblyError {
    /// The node path the error was raised at.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::CyclicComposition { path, .. }
            | Self::MissingDependency { path, .. }
            | Self::MissingBundle { path, .. }
            | Self::AmbiguousIdentity { path, .. }
            | Self::DuplicateCapability { path, .. } => path,
        }
    }
}
