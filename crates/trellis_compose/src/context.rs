//! The per-request context handed to hooks and handlers.
//!
//! A [`Context`] is the merged read/write view a request sees: every
//! capability and shared-state slot visible at the route's node, the raw
//! request, any payloads the external validator produced, and arbitrary
//! fields contributed by earlier hooks in the chain.
//!
//! Capability and state lookups hit tables resolved once at assembly time;
//! no tree walking happens at request time.
//!
//! # Example
//!
//! ```ignore
//! fn authorize(ctx: &mut Context) -> BoxFuture<'_, Result<Flow, Fault>> {
//!     Box::pin(async move {
//!         let pool = ctx.capability::<DbPool>("db")?;
//!         let user = pool.lookup(ctx.request().payload()).await?;
//!         ctx.set_field("user", user);
//!         Ok(Flow::Continue)
//!     })
//! }
//! ```

use std::sync::Arc;

use hashbrown::HashMap;

use crate::assembly::{NodeId, TreeData};
use crate::hook::Fault;
use crate::state::{CapabilityValue, StateError, StateSlot};

// ─────────────────────────────────────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────────────────────────────────────

/// The raw inbound request as handed over by the transport layer.
///
/// The engine does not parse paths or interpret methods; both are opaque
/// strings matched by the external routing layer before dispatch.
#[derive(Debug, Clone, Default)]
pub struct Request {
    method: String,
    path: String,
    payload: Vec<u8>,
}

impl Request {
    /// Creates a request with an empty payload.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            payload: Vec::new(),
        }
    }

    /// Sets the payload bytes.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// The request method, verbatim.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request path, verbatim.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ContextError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised by context lookups at request time.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// No capability with the requested name is visible at this route.
    #[error("capability not found: {0}")]
    UnknownCapability(String),

    /// The capability holds a value of a different type than requested.
    #[error("capability '{name}' is not a {requested}")]
    CapabilityType {
        /// Capability name.
        name: String,
        /// Type name the caller asked for.
        requested: &'static str,
    },

    /// A shared-state access failed.
    #[error(transparent)]
    State(#[from] StateError),
}

impl From<ContextError> for Fault {
    fn from(err: ContextError) -> Self {
        Fault::new(err.to_string())
    }
}

impl From<StateError> for Fault {
    fn from(err: StateError) -> Self {
        Fault::new(err.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// The merged execution view for one request.
///
/// Hooks receive the context mutably and in declaration order; the terminal
/// handler receives whatever the surviving hooks left behind. One context
/// never outlives its request, and contexts of concurrent requests are
/// fully independent apart from the shared-state slots they alias.
pub struct Context {
    tree: Arc<TreeData>,
    node: NodeId,
    request: Request,
    fields: HashMap<String, Box<dyn CapabilityValue>>,
    validated: Vec<serde_json::Value>,
    fault: Option<Fault>,
}

impl Context {
    pub(crate) fn new(tree: Arc<TreeData>, node: NodeId, request: Request) -> Self {
        Self {
            tree,
            node,
            request,
            fields: HashMap::new(),
            validated: Vec::new(),
            fault: None,
        }
    }

    /// The raw request.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Path of the node the dispatched route was declared on.
    #[must_use]
    pub fn node_path(&self) -> &str {
        &self.tree.nodes[self.node.0].path
    }

    // ─────────────────────────────────────────────────────────────────────
    // Capabilities
    // ─────────────────────────────────────────────────────────────────────

    /// Looks up a capability by name and downcasts it to `T`.
    ///
    /// # Errors
    ///
    /// [`ContextError::UnknownCapability`] if the name is not visible here,
    /// [`ContextError::CapabilityType`] if the stored value is not a `T`.
    pub fn capability<T: CapabilityValue>(&self, name: &str) -> Result<&T, ContextError> {
        let id = self.tree.nodes[self.node.0]
            .caps
            .get(name)
            .ok_or_else(|| ContextError::UnknownCapability(name.to_string()))?;
        self.tree.arena[id.index()]
            .value::<T>()
            .ok_or_else(|| ContextError::CapabilityType {
                name: name.to_string(),
                requested: core::any::type_name::<T>(),
            })
    }

    /// Returns `true` if a capability with the given name is visible here.
    #[must_use]
    pub fn has_capability(&self, name: &str) -> bool {
        self.tree.nodes[self.node.0].caps.contains_key(name)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Shared state
    // ─────────────────────────────────────────────────────────────────────

    /// Looks up a shared-state slot by name.
    ///
    /// The returned slot is shared by reference with every other request
    /// that resolves the declaring node; see [`StateSlot`] for the locking
    /// contract.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotFound`] (wrapped) if no slot with the name
    /// is visible at this route.
    pub fn shared(&self, name: &str) -> Result<&StateSlot, ContextError> {
        self.tree.nodes[self.node.0]
            .state
            .get(name)
            .ok_or_else(|| ContextError::State(StateError::NotFound(name.to_string())))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Hook-contributed fields
    // ─────────────────────────────────────────────────────────────────────

    /// Sets a per-request field, replacing any previous value under the name.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl CapabilityValue) {
        self.fields.insert(name.into(), Box::new(value));
    }

    /// Reads a per-request field contributed by an earlier hook.
    #[must_use]
    pub fn field<T: CapabilityValue>(&self, name: &str) -> Option<&T> {
        self.fields.get(name).and_then(|v| v.downcast_ref::<T>())
    }

    /// Returns `true` if a field with the given name was contributed.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Validation results / faults
    // ─────────────────────────────────────────────────────────────────────

    /// Payloads produced by the external validator, in schema order.
    #[must_use]
    pub fn validated(&self) -> &[serde_json::Value] {
        &self.validated
    }

    pub(crate) fn push_validated(&mut self, value: serde_json::Value) {
        self.validated.push(value);
    }

    /// The fault being handled, present only inside the on-error stage.
    #[must_use]
    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    pub(crate) fn set_fault(&mut self, fault: Fault) {
        self.fault = Some(fault);
    }
}

impl core::fmt::Debug for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Context")
            .field("node", &self.node)
            .field("method", &self.request.method)
            .field("path", &self.request.path)
            .field("fields", &self.fields.len())
            .finish_non_exhaustive()
    }
}
