//! Named hook/schema bundles: parameterized expansion and bulk application.
//!
//! A [`HookBundle`] packages schema and hook contributions so they can be
//! reused across routes. Two mechanisms consume bundles:
//!
//! - **Parameterized definitions** — a node defines a named bundle (fixed,
//!   or produced by a factory over a JSON parameter). A route referencing
//!   the name expands the definition into its own chain only; two routes
//!   referencing the same name with different parameters get independent
//!   expansions.
//! - **Guards** — a [`Guard`] applies a bundle to every route declared
//!   inside a sub-tree builder, as if each route had declared the
//!   contributions individually. Nested guards accumulate: a nested guard's
//!   contributions follow the outer guard's in declaration order, and no
//!   contribution ever overwrites another.
//!
//! # Example
//!
//! ```
//! use trellis_compose::bundle::HookBundle;
//! use trellis_compose::hook::{sync_hook, EventKind, Flow};
//!
//! let bundle = HookBundle::new()
//!     .schema(serde_json::json!({"type": "object"}))
//!     .hook(EventKind::PreHandle, sync_hook(|ctx| {
//!         ctx.set_field("guarded", true);
//!         Ok(Flow::Continue)
//!     }));
//! assert_eq!(bundle.hooks().len(), 1);
//! ```

use std::sync::Arc;

use crate::hook::{EventKind, HookBehavior, HookScope};

// ─────────────────────────────────────────────────────────────────────────────
// HookBundle
// ─────────────────────────────────────────────────────────────────────────────

/// One hook contribution inside a bundle: a stage and a behavior.
#[derive(Clone)]
pub struct HookContribution {
    pub(crate) event: EventKind,
    pub(crate) behavior: Arc<dyn HookBehavior>,
}

impl HookContribution {
    /// The stage this contribution targets.
    #[must_use]
    pub fn event(&self) -> EventKind {
        self.event
    }
}

impl core::fmt::Debug for HookContribution {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HookContribution")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

/// A reusable package of schema and hook contributions.
///
/// Bundles are inert data until expanded into a concrete route's chain.
/// Cloning a bundle clones contribution references, not behaviors.
#[derive(Clone, Default)]
pub struct HookBundle {
    pub(crate) schema: Option<serde_json::Value>,
    pub(crate) hooks: Vec<HookContribution>,
}

impl HookBundle {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bundle's schema contribution.
    #[must_use]
    pub fn schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Appends a hook contribution.
    #[must_use]
    pub fn hook(mut self, event: EventKind, behavior: impl HookBehavior) -> Self {
        self.hooks.push(HookContribution {
            event,
            behavior: Arc::new(behavior),
        });
        self
    }

    /// The hook contributions, in declaration order.
    #[must_use]
    pub fn hooks(&self) -> &[HookContribution] {
        &self.hooks
    }
}

impl core::fmt::Debug for HookBundle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HookBundle")
            .field("schema", &self.schema.is_some())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BundleDef
// ─────────────────────────────────────────────────────────────────────────────

/// A named bundle definition attached to a node.
///
/// Definitions are visible to the defining node and its descendants.
#[derive(Clone)]
pub enum BundleDef {
    /// A fixed bundle, expanded as-is for every reference.
    Fixed(HookBundle),
    /// A factory invoked per reference with the reference's parameter.
    Factory(Arc<dyn Fn(serde_json::Value) -> HookBundle + Send + Sync>),
}

impl BundleDef {
    /// Expands the definition for one route reference.
    ///
    /// A missing parameter reaches a factory as `serde_json::Value::Null`.
    #[must_use]
    pub fn expand(&self, param: Option<serde_json::Value>) -> HookBundle {
        match self {
            Self::Fixed(bundle) => bundle.clone(),
            Self::Factory(factory) => factory(param.unwrap_or(serde_json::Value::Null)),
        }
    }
}

impl core::fmt::Debug for BundleDef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Fixed(bundle) => f.debug_tuple("Fixed").field(bundle).finish(),
            Self::Factory(_) => f.debug_tuple("Factory").finish_non_exhaustive(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Guard
// ─────────────────────────────────────────────────────────────────────────────

/// Bulk application of a bundle to every route declared inside a sub-tree
/// builder.
///
/// By default the bundle's hooks reach exactly the routes declared inside
/// the guarded builder. An explicit scope override instead declares the
/// bundle's hooks on the current node with that visibility tier, so they
/// propagate beyond the sub-tree like ordinary hooks. The schema
/// contribution always applies to the guarded routes only.
#[derive(Clone, Debug)]
pub struct Guard {
    pub(crate) bundle: HookBundle,
    pub(crate) scope_override: Option<HookScope>,
}

impl Guard {
    /// Creates a guard applying the given bundle.
    #[must_use]
    pub fn new(bundle: HookBundle) -> Self {
        Self {
            bundle,
            scope_override: None,
        }
    }

    /// Propagates the bundle's hooks with an explicit visibility tier
    /// instead of confining them to the guarded routes.
    #[must_use]
    pub fn with_scope(mut self, scope: HookScope) -> Self {
        self.scope_override = Some(scope);
        self
    }
}
