//! Routes: declaration specs, frozen hook chains, and the chain executor.
//!
//! A [`RouteSpec`] describes a route at declaration time: method, path,
//! handler, plus schema and bundle references. Declaring it against a scope
//! captures the currently visible hooks into a [`HookChain`] and freezes the
//! result as a [`Route`]. After finalization, each route is reachable
//! through a [`RouteHandle`] that owns everything dispatch needs.
//!
//! # Execution semantics
//!
//! [`RouteHandle::dispatch`] walks the chain strictly sequentially: stage by
//! stage in [`EventKind`] order, by declaration order within a stage. Any
//! hook may halt with a terminal response, skipping everything after it.
//! Faults route to the chain's on-error group once; validation errors
//! produce a response without being treated as faults. Concurrency exists
//! only *between* requests — hooks of one request never overlap, even
//! across suspension points, and dropping the dispatch future (timeout,
//! disconnect) aborts that request's remaining chain without touching other
//! in-flight requests.

use std::sync::Arc;

use tracing::Instrument;

use crate::assembly::{NodeId, TreeData};
use crate::context::{Context, Request};
use crate::hook::{BoxFuture, EventKind, Fault, Flow, HookId, Response};

// ─────────────────────────────────────────────────────────────────────────────
// Validation boundary
// ─────────────────────────────────────────────────────────────────────────────

/// A recoverable validation failure from the external schema engine.
///
/// Terminates the current chain with a `400` response; never treated as a
/// systemic fault.
#[derive(Debug, Clone, thiserror::Error)]
#[error("validation failed: {message}")]
pub struct ValidationFault {
    message: String,
}

impl ValidationFault {
    /// Creates a validation fault with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The external schema validation engine.
///
/// Trellis only sequences the call at the pre-validate stage; it attaches no
/// meaning to schemas beyond passing them through.
pub trait SchemaValidator: Send + Sync + 'static {
    /// Validates raw payload bytes against one schema contribution.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationFault`] when the payload does not conform.
    fn validate(
        &self,
        schema: &serde_json::Value,
        payload: &[u8],
    ) -> Result<serde_json::Value, ValidationFault>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Handler
// ─────────────────────────────────────────────────────────────────────────────

/// The terminal behavior of a route.
///
/// Implemented by function items with the boxed signature, or created from
/// a synchronous closure via [`sync_handler`].
pub trait Handler: Send + Sync + 'static {
    /// Produces the route's response.
    ///
    /// # Errors
    ///
    /// Returns a [`Fault`] for unhandled errors.
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<Response, Fault>>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<Response, Fault>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<Response, Fault>> {
        self(ctx)
    }
}

/// A [`Handler`] that completes without suspending.
///
/// Created via [`sync_handler`].
pub struct SyncHandler<F>(F);

impl<F> Handler for SyncHandler<F>
where
    F: Fn(&mut Context) -> Result<Response, Fault> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<Response, Fault>> {
        let result = (self.0)(ctx);
        Box::pin(core::future::ready(result))
    }
}

/// Wraps a synchronous closure as a [`Handler`].
pub fn sync_handler<F>(f: F) -> SyncHandler<F>
where
    F: Fn(&mut Context) -> Result<Response, Fault> + Send + Sync + 'static,
{
    SyncHandler(f)
}

// ─────────────────────────────────────────────────────────────────────────────
// RouteSpec
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub(crate) enum SpecOp {
    Schema(serde_json::Value),
    Apply {
        bundle: String,
        param: Option<serde_json::Value>,
    },
}

/// A route definition, built up before declaration.
///
/// Method and path are opaque to the engine; matching belongs to the
/// external routing layer. Schema and bundle references are recorded in
/// call order and expanded at declaration time, in that order.
#[derive(Clone)]
pub struct RouteSpec {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) handler: Arc<dyn Handler>,
    pub(crate) ops: Vec<SpecOp>,
}

impl RouteSpec {
    /// Creates a spec with the given method, path, and terminal handler.
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        handler: impl Handler,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            handler: Arc::new(handler),
            ops: Vec::new(),
        }
    }

    /// Shorthand for a `GET` route.
    pub fn get(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new("GET", path, handler)
    }

    /// Shorthand for a `POST` route.
    pub fn post(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new("POST", path, handler)
    }

    /// Adds a schema contribution for the external validator.
    #[must_use]
    pub fn schema(mut self, schema: serde_json::Value) -> Self {
        self.ops.push(SpecOp::Schema(schema));
        self
    }

    /// References a named bundle without a parameter.
    #[must_use]
    pub fn apply(mut self, bundle: impl Into<String>) -> Self {
        self.ops.push(SpecOp::Apply {
            bundle: bundle.into(),
            param: None,
        });
        self
    }

    /// References a named bundle with a parameter.
    ///
    /// The parameter reaches the bundle's factory verbatim; two routes
    /// passing different parameters get independent expansions.
    #[must_use]
    pub fn apply_with(mut self, bundle: impl Into<String>, param: serde_json::Value) -> Self {
        self.ops.push(SpecOp::Apply {
            bundle: bundle.into(),
            param: Some(param),
        });
        self
    }
}

impl core::fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RouteSpec")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("ops", &self.ops.len())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookChain
// ─────────────────────────────────────────────────────────────────────────────

/// Provenance of one chain entry.
///
/// Chain equality compares provenance, not behavior identity: two captures
/// over identical tree state produce equal chains even when expansion
/// manufactured fresh behavior instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainSource {
    /// A hook declared on a node, by id.
    Node(HookId),
    /// A guard contribution: guard declaration index and position within it.
    Guard {
        /// Monotonic index of the guard declaration.
        guard: usize,
        /// Position within the guard's contributions.
        position: usize,
    },
    /// A bundle expansion: referenced name and position within the route's
    /// expansions.
    Bundle {
        /// The referenced bundle name.
        name: String,
        /// Position among this route's expanded contributions.
        position: usize,
    },
}

/// One resolved entry of a frozen chain.
#[derive(Clone)]
pub struct ChainEntry {
    pub(crate) event: EventKind,
    pub(crate) order: u64,
    pub(crate) source: ChainSource,
    pub(crate) behavior: Arc<dyn crate::hook::HookBehavior>,
}

impl ChainEntry {
    /// The stage this entry runs in.
    #[must_use]
    pub fn event(&self) -> EventKind {
        self.event
    }

    /// The ordering key the entry was captured with.
    #[must_use]
    pub fn order(&self) -> u64 {
        self.order
    }

    /// Where the entry came from.
    #[must_use]
    pub fn source(&self) -> &ChainSource {
        &self.source
    }
}

impl PartialEq for ChainEntry {
    fn eq(&self, other: &Self) -> bool {
        self.event == other.event && self.source == other.source
    }
}

impl core::fmt::Debug for ChainEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChainEntry")
            .field("event", &self.event)
            .field("order", &self.order)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// The frozen, fully ordered hook sequence a route executes.
///
/// Immutable once the route is declared: later hook declarations never
/// reach an existing chain.
#[derive(Debug, Clone, PartialEq)]
pub struct HookChain {
    stages: [Vec<ChainEntry>; 6],
}

impl HookChain {
    pub(crate) fn from_entries(entries: Vec<ChainEntry>) -> Self {
        let mut stages: [Vec<ChainEntry>; 6] = core::array::from_fn(|_| Vec::new());
        for entry in entries {
            stages[entry.event.index()].push(entry);
        }
        for stage in &mut stages {
            // Stable: equal orders keep their insertion sequence.
            stage.sort_by_key(ChainEntry::order);
        }
        Self { stages }
    }

    /// The entries of one stage, in execution order.
    #[must_use]
    pub fn stage(&self, event: EventKind) -> &[ChainEntry] {
        &self.stages[event.index()]
    }

    /// Total number of entries across all stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    /// Returns `true` if no hooks were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(Vec::is_empty)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Route / RouteHandle
// ─────────────────────────────────────────────────────────────────────────────

/// A finalized route: frozen chain, schema set, terminal handler.
pub struct Route {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) node: NodeId,
    pub(crate) order: u64,
    pub(crate) chain: HookChain,
    pub(crate) schemas: Vec<serde_json::Value>,
    pub(crate) handler: Arc<dyn Handler>,
}

impl Route {
    /// The route's method, verbatim.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The route's path pattern, verbatim.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The frozen hook chain.
    #[must_use]
    pub fn chain(&self) -> &HookChain {
        &self.chain
    }

    /// Schema contributions, in declaration order.
    #[must_use]
    pub fn schemas(&self) -> &[serde_json::Value] {
        &self.schemas
    }

    /// The declaration-order sequence number of this route.
    #[must_use]
    pub fn order(&self) -> u64 {
        self.order
    }
}

impl core::fmt::Debug for Route {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("node", &self.node)
            .field("hooks", &self.chain.len())
            .finish_non_exhaustive()
    }
}

/// The external routing layer's registration interface.
///
/// Trellis hands over `(method, path, handle)` triples; path matching and
/// transport are entirely the sink's concern.
pub trait RouteSink {
    /// Registers one finalized route.
    fn register(&mut self, method: &str, path: &str, route: RouteHandle);
}

/// A dispatchable reference to a finalized route.
///
/// Cheap to clone; each concurrent request dispatches through its own
/// logical task while sharing the frozen route and tree.
#[derive(Clone)]
pub struct RouteHandle {
    route: Arc<Route>,
    tree: Arc<TreeData>,
}

impl RouteHandle {
    pub(crate) fn new(route: Arc<Route>, tree: Arc<TreeData>) -> Self {
        Self { route, tree }
    }

    /// The underlying route.
    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// The route's method, verbatim.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.route.method
    }

    /// The route's path pattern, verbatim.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.route.path
    }

    /// Runs the route's chain and handler for one request.
    ///
    /// Always produces a response: halts and validation errors are
    /// recoverable outcomes, and unhandled faults degrade to a generic
    /// failure response after the on-error group had its chance. Dropping
    /// the returned future aborts this request's remaining chain only; no
    /// partial mutation is rolled back.
    pub async fn dispatch(&self, request: Request) -> Response {
        let span = tracing::debug_span!(
            "dispatch",
            method = %self.route.method,
            path = %self.route.path,
        );
        self.dispatch_inner(request).instrument(span).await
    }

    async fn dispatch_inner(&self, request: Request) -> Response {
        let mut ctx = Context::new(self.tree.clone(), self.route.node, request);

        for event in EventKind::BEFORE_HANDLER {
            match self.run_group(event, &mut ctx).await {
                Ok(None) => {}
                Ok(Some(response)) => return response,
                Err(fault) => return self.recover(ctx, fault).await,
            }
            if event == EventKind::PreValidate {
                if let Err(response) = self.validate(&mut ctx) {
                    return response;
                }
            }
        }

        let mut response = match self.route.handler.call(&mut ctx).await {
            Ok(response) => response,
            Err(fault) => return self.recover(ctx, fault).await,
        };

        match self.run_group(EventKind::PostHandle, &mut ctx).await {
            Ok(None) => {}
            Ok(Some(replacement)) => response = replacement,
            Err(fault) => return self.recover(ctx, fault).await,
        }

        tracing::debug!(status = response.status, "dispatch complete");
        response
    }

    /// Runs one stage group sequentially; `Some` means a hook halted.
    async fn run_group(
        &self,
        event: EventKind,
        ctx: &mut Context,
    ) -> Result<Option<Response>, Fault> {
        for entry in self.route.chain.stage(event) {
            match entry.behavior.invoke(ctx).await? {
                Flow::Continue => {}
                Flow::Halt(response) => return Ok(Some(response)),
            }
        }
        Ok(None)
    }

    /// Sequences the external validator over the route's schema set.
    fn validate(&self, ctx: &mut Context) -> Result<(), Response> {
        let Some(validator) = &self.tree.validator else {
            return Ok(());
        };
        for schema in &self.route.schemas {
            match validator.validate(schema, ctx.request().payload()) {
                Ok(value) => ctx.push_validated(value),
                Err(fault) => {
                    tracing::debug!(error = %fault, "validation rejected request");
                    return Err(Response::new(400).with_payload(fault.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Routes a fault through the on-error group, once.
    async fn recover(&self, mut ctx: Context, fault: Fault) -> Response {
        tracing::error!(fault = %fault, path = %self.route.path, "request fault");
        ctx.set_fault(fault);
        for entry in self.route.chain.stage(EventKind::OnError) {
            match entry.behavior.invoke(&mut ctx).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Halt(response)) => return response,
                Err(second) => {
                    tracing::error!(fault = %second, "on-error hook fault");
                    break;
                }
            }
        }
        Response::new(500).with_payload("internal error")
    }
}

impl core::fmt::Debug for RouteHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RouteHandle")
            .field("method", &self.route.method)
            .field("path", &self.route.path)
            .finish_non_exhaustive()
    }
}
