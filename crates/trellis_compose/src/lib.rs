//! The fragment composition and lifecycle-scoping engine for Trellis (Layer 1).
//!
//! `trellis_compose` turns independently defined server fragments into one
//! request-processing pipeline:
//!
//! - [`fragment`] - Fragment trait, identity, and deduplication
//! - [`assembly`] - Mount tree, registration surface, and the freeze step
//! - [`hook`] - Staged behaviors with visibility tiers and halt signals
//! - [`route`] - Route specs, frozen hook chains, and the chain executor
//! - [`bundle`] - Named hook/schema bundles and guards
//! - [`state`] - Shared state slots and capability records
//! - [`context`] - The per-request context handed to hooks and handlers
//! - [`error`] - Assembly-time error taxonomy
//!
//! # Architecture
//!
//! This crate is Layer 1 of the Trellis architecture:
//!
//! - **Layer 1** (`trellis_compose`): the composition engine (this crate)
//! - **Layer 2** (`trellis_fragments`): stock fragments built on the engine
//! - **Layer 3** (integrations): transport, routing, and validation engines
//!   plugged in at the boundaries this crate exposes
//!
//! # Example
//!
//! ```
//! use trellis_compose::assembly::Pipeline;
//! use trellis_compose::error::AssemblyError;
//! use trellis_compose::fragment::{Fragment, FragmentIdentity};
//! use trellis_compose::assembly::ScopeBuilder;
//! use trellis_compose::hook::{sync_hook, EventKind, Flow, HookScope, Response};
//! use trellis_compose::route::{sync_handler, RouteSpec};
//!
//! struct Audit;
//!
//! impl Fragment for Audit {
//!     fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
//!         scope.share("audit_log", Vec::<String>::new());
//!         scope.hook(
//!             EventKind::PreHandle,
//!             HookScope::Global,
//!             sync_hook(|ctx| {
//!                 let path = ctx.request().path().to_string();
//!                 ctx.shared("audit_log")?.write::<Vec<String>>()?.push(path);
//!                 Ok(Flow::Continue)
//!             }),
//!         );
//!         Ok(())
//!     }
//!
//!     fn identity(&self) -> Option<FragmentIdentity> {
//!         Some(FragmentIdentity::named("audit"))
//!     }
//! }
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.mount(Audit).unwrap();
//! pipeline
//!     .configure(|scope| {
//!         scope.route(RouteSpec::get("/ping", sync_handler(|_| Ok(Response::ok()))))
//!     })
//!     .unwrap();
//! let app = pipeline.finalize();
//! assert_eq!(app.routes().len(), 1);
//! ```

/// Mount tree, registration surface, and the freeze step.
pub mod assembly;

/// Named hook/schema bundles and guards.
pub mod bundle;

/// The per-request context handed to hooks and handlers.
pub mod context;

/// Assembly-time error taxonomy.
pub mod error;

/// Fragment trait, identity, and deduplication.
pub mod fragment;

/// Staged behaviors with visibility tiers and halt signals.
pub mod hook;

/// Route specs, frozen hook chains, and the chain executor.
pub mod route;

/// Shared state slots and capability records.
pub mod state;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::assembly::{AssembledPipeline, NodeId, Pipeline, ScopeBuilder};
    pub use crate::bundle::{BundleDef, Guard, HookBundle};
    pub use crate::context::{Context, ContextError, Request};
    pub use crate::error::AssemblyError;
    pub use crate::fragment::{
        DedupKey, DeduplicationRegistry, Fragment, FragmentIdentity, Fragments, Seed,
    };
    pub use crate::hook::{
        BoxFuture, EventKind, Fault, Flow, Hook, HookBehavior, HookScope, Response, sync_hook,
    };
    pub use crate::route::{
        ChainEntry, ChainSource, Handler, HookChain, Route, RouteHandle, RouteSink, RouteSpec,
        SchemaValidator, ValidationFault, sync_handler,
    };
    pub use crate::state::{CapabilityRecord, CapabilityValue, StateError, StateSlot};
}
