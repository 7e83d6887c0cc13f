//! Hooks: staged behaviors with declared visibility and execution order.
//!
//! A [`Hook`] is a pure data record `{event, scope, order, behavior}`. The
//! behavior itself is an async unit of work over the per-request [`Context`];
//! it never captures pipeline structure, which is what makes resolved chains
//! safe to reorder, compare, and test in isolation.
//!
//! # Stages
//!
//! Every hook belongs to exactly one [`EventKind`] stage. Within one route,
//! hooks execute grouped by stage, in stage order, then by declaration
//! `order` within a stage.
//!
//! # Example
//!
//! Behaviors are usually plain functions returning a [`BoxFuture`], or sync
//! closures wrapped with [`sync_hook`]:
//!
//! ```
//! use trellis_compose::hook::{sync_hook, Flow};
//!
//! let behavior = sync_hook(|ctx| {
//!     ctx.set_field("traced", true);
//!     Ok(Flow::Continue)
//! });
//! # let _ = behavior;
//! ```

use core::future::Future;
use core::pin::Pin;
use std::sync::Arc;

use crate::assembly::NodeId;
use crate::context::Context;

// ─────────────────────────────────────────────────────────────────────────────
// EventKind
// ─────────────────────────────────────────────────────────────────────────────

/// Pipeline stage a hook runs in.
///
/// The set is finite and ordered: request-time execution walks
/// [`PreParse`](Self::PreParse) through [`PostHandle`](Self::PostHandle),
/// [`OnError`](Self::OnError) runs at most once when a fault is raised, and
/// [`OnStop`](Self::OnStop) runs at pipeline teardown, never per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// Before the raw request is interpreted at all.
    PreParse,
    /// Before schema validation is sequenced.
    PreValidate,
    /// After validation, before the terminal handler.
    PreHandle,
    /// After the terminal handler produced a response.
    PostHandle,
    /// When a hook or the handler raised a fault.
    OnError,
    /// At whole-pipeline teardown.
    OnStop,
}

impl EventKind {
    /// All stages, in execution order.
    pub const ALL: [EventKind; 6] = [
        EventKind::PreParse,
        EventKind::PreValidate,
        EventKind::PreHandle,
        EventKind::PostHandle,
        EventKind::OnError,
        EventKind::OnStop,
    ];

    /// Stages that run before the terminal handler, in order.
    pub const BEFORE_HANDLER: [EventKind; 3] = [
        EventKind::PreParse,
        EventKind::PreValidate,
        EventKind::PreHandle,
    ];

    /// Returns the stage's position in execution order.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookScope
// ─────────────────────────────────────────────────────────────────────────────

/// Visibility tier of a hook, evaluated relative to the node that declares it.
///
/// Visibility is determined solely by the declared tier and the position of
/// the consuming node in the assembled tree, never by runtime values:
///
/// - [`Local`](Self::Local): routes declared on the defining node itself,
///   after the hook's declaration point.
/// - [`Scoped`](Self::Scoped): the defining node's sub-tree plus one hop up —
///   the node that mounted the defining node, and everything below it.
/// - [`Global`](Self::Global): every node that transitively mounted the
///   defining node (all ancestors) and every descendant, regardless of
///   distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookScope {
    /// Visible only to routes on the defining node.
    Local,
    /// Visible to the defining node's sub-tree and exactly one level above.
    Scoped,
    /// Visible to all ancestors and all descendants of the defining node.
    Global,
}

// ─────────────────────────────────────────────────────────────────────────────
// Response / Flow / Fault
// ─────────────────────────────────────────────────────────────────────────────

/// A terminal response produced by a halt, the handler, or fault recovery.
///
/// The engine attaches no meaning to the payload bytes; serialization is the
/// caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code handed back to the transport layer.
    pub status: u16,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
}

impl Response {
    /// Creates a response with the given status and an empty payload.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            payload: Vec::new(),
        }
    }

    /// Creates a `200` response with an empty payload.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Sets the payload bytes.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// Outcome of one hook invocation.
///
/// Returning [`Halt`](Self::Halt) stops chain execution immediately: all
/// later hooks and the handler are skipped and the carried [`Response`] is
/// returned. A halt from a post-handle hook replaces the handler's response.
#[derive(Debug)]
pub enum Flow {
    /// Continue with the next hook in the chain.
    Continue,
    /// Stop the chain and return this response.
    Halt(Response),
}

impl Flow {
    /// Shorthand for halting with the given status and payload.
    #[must_use]
    pub fn halt(status: u16, payload: impl Into<Vec<u8>>) -> Self {
        Flow::Halt(Response::new(status).with_payload(payload))
    }
}

/// An unhandled error raised inside a hook or handler body.
///
/// Faults are request-time: they terminate the current chain, are offered to
/// the route's `OnError` group once, and never affect other in-flight
/// requests. They are distinct from recoverable outcomes (validation errors
/// and halts), which produce a response without being treated as a fault.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct Fault {
    message: String,
}

impl Fault {
    /// Creates a fault with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The fault message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookBehavior
// ─────────────────────────────────────────────────────────────────────────────

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The async unit of work carried by a hook.
///
/// Behaviors receive the per-request [`Context`] mutably and decide whether
/// the chain continues or halts. The chain executor guarantees strictly
/// sequential invocation within one request: behavior *n + 1* never starts
/// before behavior *n* completed or halted, even across suspension points.
///
/// # Implementing
///
/// Function items with the boxed signature implement the trait directly:
///
/// ```
/// use trellis_compose::context::Context;
/// use trellis_compose::hook::{BoxFuture, Fault, Flow};
///
/// fn stamp(ctx: &mut Context) -> BoxFuture<'_, Result<Flow, Fault>> {
///     Box::pin(async move {
///         ctx.set_field("stamped", true);
///         Ok(Flow::Continue)
///     })
/// }
/// # let _ = stamp;
/// ```
///
/// For behaviors that never suspend, [`sync_hook`] wraps a plain closure.
pub trait HookBehavior: Send + Sync + 'static {
    /// Runs the behavior against the request context.
    ///
    /// # Errors
    ///
    /// Returns a [`Fault`] for unhandled errors; recoverable early returns
    /// use [`Flow::Halt`] instead.
    fn invoke<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<Flow, Fault>>;
}

impl<F> HookBehavior for F
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<Flow, Fault>> + Send + Sync + 'static,
{
    fn invoke<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<Flow, Fault>> {
        self(ctx)
    }
}

/// A [`HookBehavior`] that completes without suspending.
///
/// Created via [`sync_hook`].
pub struct SyncBehavior<F>(F);

impl<F> HookBehavior for SyncBehavior<F>
where
    F: Fn(&mut Context) -> Result<Flow, Fault> + Send + Sync + 'static,
{
    fn invoke<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<Flow, Fault>> {
        let result = (self.0)(ctx);
        Box::pin(core::future::ready(result))
    }
}

/// Wraps a synchronous closure as a [`HookBehavior`].
pub fn sync_hook<F>(f: F) -> SyncBehavior<F>
where
    F: Fn(&mut Context) -> Result<Flow, Fault> + Send + Sync + 'static,
{
    SyncBehavior(f)
}

// ─────────────────────────────────────────────────────────────────────────────
// Hook
// ─────────────────────────────────────────────────────────────────────────────

/// Index of a declared hook within one assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(pub(crate) usize);

impl HookId {
    /// Returns the underlying index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A declared hook: stage, visibility tier, declaration order, behavior.
///
/// `order` is drawn from the assembly-wide monotonic counter at declaration
/// time and is the sole ordering key within one stage across a resolved
/// chain.
pub struct Hook {
    pub(crate) id: HookId,
    pub(crate) event: EventKind,
    pub(crate) scope: HookScope,
    pub(crate) order: u64,
    pub(crate) node: NodeId,
    pub(crate) behavior: Arc<dyn HookBehavior>,
}

impl Hook {
    /// The stage this hook runs in.
    #[must_use]
    pub fn event(&self) -> EventKind {
        self.event
    }

    /// The declared visibility tier.
    #[must_use]
    pub fn scope(&self) -> HookScope {
        self.scope
    }

    /// The declaration-order sequence number.
    #[must_use]
    pub fn order(&self) -> u64 {
        self.order
    }

    /// The node this hook was declared on.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl core::fmt::Debug for Hook {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hook")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("scope", &self.scope)
            .field("order", &self.order)
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}
