//! Fragments: the unit of pipeline composition.
//!
//! Fragments are the fundamental unit of composition in Trellis. Every piece
//! of pipeline behavior—hooks, shared state, capabilities, bundles, routes,
//! and nested fragments—is declared by a fragment against the
//! [`ScopeBuilder`] it is registered with.
//!
//! # Philosophy
//!
//! **Everything is a fragment.** A bare pipeline does nothing; behavior
//! arrives by mounting fragments, and where a fragment sits in the mount
//! tree decides exactly which routes observe its declarations.
//!
//! # Identity and reuse
//!
//! A fragment may carry a [`FragmentIdentity`]: a stable name plus an
//! optional [`Seed`]. Named fragments are registered at most once per
//! assembled tree for each distinct (name, seed) pair — a second mount with
//! the same identity skips registration entirely and reuses the first
//! instantiation's exports. Anonymous fragments are never deduplicated.
//!
//! # Example
//!
//! ```
//! use trellis_compose::assembly::{Pipeline, ScopeBuilder};
//! use trellis_compose::error::AssemblyError;
//! use trellis_compose::fragment::{Fragment, FragmentIdentity};
//!
//! struct Metrics {
//!     namespace: String,
//! }
//!
//! impl Fragment for Metrics {
//!     fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
//!         scope.share("metrics", Vec::<String>::new());
//!         scope.expose("metrics_namespace", self.namespace.clone())?;
//!         Ok(())
//!     }
//!
//!     fn identity(&self) -> Option<FragmentIdentity> {
//!         Some(FragmentIdentity::named("metrics").with_seed(&self.namespace))
//!     }
//! }
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.mount(Metrics { namespace: "api".into() }).unwrap();
//! ```

mod dedup;

pub use dedup::{DedupKey, DeduplicationRegistry};

use core::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

use variadics_please::all_tuples;

use crate::assembly::ScopeBuilder;
use crate::error::AssemblyError;

// ─────────────────────────────────────────────────────────────────────────────
// Seed / FragmentIdentity
// ─────────────────────────────────────────────────────────────────────────────

/// An opaque, hashable value distinguishing configurations of one named
/// fragment.
///
/// Two mounts sharing a name but carrying different seeds are distinct
/// identities and both register. The seeded value's type name is kept so
/// mounts mixing seed types under one name can be rejected instead of
/// silently colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed {
    hash: u64,
    type_name: &'static str,
}

impl Seed {
    /// Derives a seed from any hashable value.
    #[must_use]
    pub fn of<T: Hash + 'static>(value: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Type name of the seeded value, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Deduplication identity of a fragment: a stable name plus optional seed.
///
/// Absence of a seed is its own identity class: `named("db")` never matches
/// `named("db").with_seed(&cfg)`, whatever `cfg` hashes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentIdentity {
    pub(crate) name: String,
    pub(crate) seed: Option<Seed>,
}

impl FragmentIdentity {
    /// Creates an identity deduplicated by name alone.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seed: None,
        }
    }

    /// Adds a seed derived from the given value.
    #[must_use]
    pub fn with_seed<T: Hash + 'static>(mut self, value: &T) -> Self {
        self.seed = Some(Seed::of(value));
        self
    }

    /// The identity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The seed, if any.
    #[must_use]
    pub fn seed(&self) -> Option<Seed> {
        self.seed
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fragment Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A composable unit of hooks, shared state, capabilities, and routes.
///
/// Mounting a fragment creates a child node in the assembly tree and runs
/// [`register`](Self::register) against it, in order of code. Registration
/// is the fragment's single side-effecting moment: everything it declares is
/// tied to that node, and for named fragments the whole step runs at most
/// once per distinct identity in the assembled tree.
///
/// # Example
///
/// ```ignore
/// impl Fragment for AuthFragment {
///     fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
///         scope.require("db")?;
///         scope.expose("token_keys", self.keys.clone())?;
///         scope.hook(EventKind::PreHandle, HookScope::Scoped, check_token);
///         Ok(())
///     }
///
///     fn identity(&self) -> Option<FragmentIdentity> {
///         Some(FragmentIdentity::named("auth"))
///     }
/// }
/// ```
pub trait Fragment: Send + Sync + 'static {
    /// Declares this fragment's behavior against its assembly node.
    ///
    /// # Errors
    ///
    /// Any [`AssemblyError`] aborts the whole tree build.
    fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError>;

    /// Stable identity for deduplication.
    ///
    /// `None` (the default) means the fragment is anonymous: every mount
    /// re-runs registration.
    fn identity(&self) -> Option<FragmentIdentity> {
        None
    }

    /// Human-readable label used in node paths and diagnostics.
    ///
    /// Default implementation returns the type name.
    fn label(&self) -> &str {
        core::any::type_name::<Self>()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fragments Trait (for mount polymorphism)
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for values that can be mounted onto a scope.
///
/// Implemented for single [`Fragment`]s and for tuples of fragments, so
/// `mount()` accepts either. Tuple elements mount in order, each as its own
/// child node.
///
/// Users typically don't implement this trait directly.
pub trait Fragments {
    /// Mounts these fragments onto the given scope.
    ///
    /// # Errors
    ///
    /// Propagates the first [`AssemblyError`] raised by any mount.
    fn mount_into(self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError>;
}

/// Single fragments implement `Fragments` directly.
impl<F: Fragment> Fragments for F {
    fn mount_into(self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
        scope.mount_one(self)
    }
}

macro_rules! impl_fragments_for_tuple {
    ($(($F:ident, $f:ident)),*) => {
        impl<$($F: Fragment),*> Fragments for ($($F,)*) {
            fn mount_into(self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
                let ($($f,)*) = self;
                $(scope.mount_one($f)?;)*
                Ok(())
            }
        }
    };
}

// Generate implementations for tuples from 1 to 16 elements
all_tuples!(impl_fragments_for_tuple, 1, 16, F, f);
