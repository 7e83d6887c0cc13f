//! Pipeline assembly: the mount tree, registration surface, and freeze step.
//!
//! The [`Pipeline`] is the assembly root. Fragments are mounted onto it (or
//! onto each other) during a single assembly phase; every mount creates a
//! node in an arena-backed tree and runs the fragment's registration against
//! a [`ScopeBuilder`] for that node, eagerly and in order of code.
//!
//! Routes capture their hook chains at the moment they are declared — a
//! composition step never retroactively widens an already-declared route.
//! [`Pipeline::finalize`] then freezes the tree into an
//! [`AssembledPipeline`]: per-node capability and state tables are merged
//! once, routes become shareable handles, and the structure turns read-only
//! (shared state stays mutable at request time).
//!
//! # Example
//!
//! ```
//! use trellis_compose::assembly::Pipeline;
//! use trellis_compose::hook::{sync_hook, EventKind, Flow, HookScope, Response};
//! use trellis_compose::route::{sync_handler, RouteSpec};
//!
//! let mut pipeline = Pipeline::new();
//! pipeline
//!     .configure(|scope| {
//!         scope.hook(
//!             EventKind::PreHandle,
//!             HookScope::Global,
//!             sync_hook(|ctx| {
//!                 ctx.set_field("seen", true);
//!                 Ok(Flow::Continue)
//!             }),
//!         );
//!         scope.route(RouteSpec::get(
//!             "/health",
//!             sync_handler(|_ctx| Ok(Response::ok())),
//!         ))
//!     })
//!     .unwrap();
//! let app = pipeline.finalize();
//! assert_eq!(app.routes().len(), 1);
//! ```

mod visibility;

use core::any::TypeId;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::bundle::{BundleDef, Guard, HookBundle};
use crate::context::{Context, Request};
use crate::error::AssemblyError;
use crate::fragment::{DedupKey, DeduplicationRegistry, Fragment, Fragments};
use crate::hook::{EventKind, Hook, HookBehavior, HookId, HookScope};
use crate::route::{
    ChainEntry, ChainSource, HookChain, Route, RouteHandle, RouteSink, RouteSpec, SchemaValidator,
    SpecOp,
};
use crate::state::{CapabilityId, CapabilityRecord, CapabilityValue, StateSlot};

// ─────────────────────────────────────────────────────────────────────────────
// NodeId / NodeData
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier of a node in the assembly tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the underlying arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of the live assembly tree.
pub(crate) struct NodeData {
    pub(crate) path: String,
    pub(crate) parent: Option<NodeId>,
    /// Root-first ancestor path, cached at creation.
    pub(crate) ancestors: Vec<NodeId>,
    pub(crate) caps: HashMap<String, CapabilityId>,
    pub(crate) state: HashMap<String, StateSlot>,
    pub(crate) bundles: HashMap<String, BundleDef>,
}

impl NodeData {
    /// Appends a node under `parent` and returns its id.
    pub(crate) fn push(nodes: &mut Vec<NodeData>, label: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(nodes.len());
        let (ancestors, path) = match parent {
            Some(parent_id) => {
                let mut ancestors = nodes[parent_id.0].ancestors.clone();
                ancestors.push(parent_id);
                (ancestors, format!("{}/{}", nodes[parent_id.0].path, label))
            }
            None => (Vec::new(), label.to_string()),
        };
        nodes.push(NodeData {
            path,
            parent,
            ancestors,
            caps: HashMap::new(),
            state: HashMap::new(),
            bundles: HashMap::new(),
        });
        id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Core assembly state
// ─────────────────────────────────────────────────────────────────────────────

/// Bundle contributions staged by an active guard.
struct GuardFrame {
    /// Monotonic index of the guard declaration, for chain provenance.
    index: usize,
    schema: Option<serde_json::Value>,
    contributions: Vec<(u64, EventKind, Arc<dyn HookBehavior>)>,
}

/// Mutable assembly state shared by every [`ScopeBuilder`] of one pipeline.
struct Core {
    nodes: Vec<NodeData>,
    hooks: Vec<Hook>,
    arena: Vec<CapabilityRecord>,
    registry: DeduplicationRegistry,
    routes: Vec<Route>,
    guards: Vec<GuardFrame>,
    guard_count: usize,
    /// Fragment types currently registering, for cycle detection.
    mount_stack: Vec<TypeId>,
    /// Assembly-wide declaration counter; the sole ordering authority.
    counter: u64,
    validator: Option<Arc<dyn SchemaValidator>>,
}

impl Core {
    fn next_order(&mut self) -> u64 {
        let order = self.counter;
        self.counter += 1;
        order
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScopeBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// The registration surface a fragment declares itself against.
///
/// A `ScopeBuilder` is bound to one node of the assembly tree. Everything
/// declared through it — hooks, capabilities, shared state, bundles, routes,
/// nested mounts — attaches to that node, and the declaration order across
/// the whole assembly is recorded as the ordering contract for chain
/// capture.
pub struct ScopeBuilder<'a> {
    core: &'a mut Core,
    node: NodeId,
}

impl ScopeBuilder<'_> {
    /// Path of this scope's node, for diagnostics.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.core.nodes[self.node.0].path
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mounting
    // ─────────────────────────────────────────────────────────────────────

    /// Mounts one or more fragments as children of this node.
    ///
    /// Accepts a single [`Fragment`] or a tuple of fragments; tuple elements
    /// mount in order.
    ///
    /// # Errors
    ///
    /// Propagates any [`AssemblyError`] raised during registration; the
    /// whole build is considered aborted.
    pub fn mount<F: Fragments>(&mut self, fragments: F) -> Result<(), AssemblyError> {
        fragments.mount_into(self)
    }

    /// Mounts a single fragment, applying identity deduplication.
    pub(crate) fn mount_one<F: Fragment>(&mut self, fragment: F) -> Result<(), AssemblyError> {
        let type_id = TypeId::of::<F>();
        if self.core.mount_stack.contains(&type_id) {
            return Err(AssemblyError::CyclicComposition {
                fragment: fragment.label().to_string(),
                path: self.path().to_string(),
            });
        }

        let identity = fragment.identity();
        if let Some(identity) = &identity {
            let key = DedupKey::from(identity.clone());
            self.core.registry.check_seed_type(&key).map_err(|(first, second)| {
                AssemblyError::AmbiguousIdentity {
                    name: key.name().to_string(),
                    first,
                    second,
                    path: self.path().to_string(),
                }
            })?;
            if let Some(original) = self.core.registry.existing(&key) {
                tracing::debug!(
                    fragment = fragment.label(),
                    name = key.name(),
                    path = self.path(),
                    "fragment already registered, aliasing exports"
                );
                return self.adopt_exports(original);
            }
        }

        let child = NodeData::push(&mut self.core.nodes, fragment.label(), Some(self.node));
        tracing::debug!(path = %self.core.nodes[child.0].path, "mounting fragment");

        self.core.mount_stack.push(type_id);
        let result = fragment.register(&mut ScopeBuilder {
            core: &mut *self.core,
            node: child,
        });
        self.core.mount_stack.pop();
        result?;

        if let Some(identity) = identity {
            self.core.registry.record(DedupKey::from(identity), child);
            // Named fragments export their declarations to the mount site,
            // so reuse elsewhere in the tree observes the same instances.
            self.adopt_exports(child)?;
        }
        Ok(())
    }

    /// Copies `from`'s capability entries and state slots onto this node.
    fn adopt_exports(&mut self, from: NodeId) -> Result<(), AssemblyError> {
        let caps: Vec<(String, CapabilityId)> = self.core.nodes[from.0]
            .caps
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect();
        for (name, id) in caps {
            match self.core.nodes[self.node.0].caps.get(&name) {
                Some(existing) if *existing != id => {
                    return Err(AssemblyError::DuplicateCapability {
                        name,
                        path: self.path().to_string(),
                    });
                }
                _ => {
                    self.core.nodes[self.node.0].caps.insert(name, id);
                }
            }
        }

        let slots: Vec<(String, StateSlot)> = self.core.nodes[from.0]
            .state
            .iter()
            .map(|(name, slot)| (name.clone(), slot.clone()))
            .collect();
        for (name, slot) in slots {
            self.core.nodes[self.node.0].state.insert(name, slot);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Hooks
    // ─────────────────────────────────────────────────────────────────────

    /// Declares a hook on this node.
    ///
    /// The hook reaches exactly the routes its `scope` admits, and only
    /// those declared after this point.
    pub fn hook(
        &mut self,
        event: EventKind,
        scope: HookScope,
        behavior: impl HookBehavior,
    ) -> &mut Self {
        self.hook_dyn(event, scope, Arc::new(behavior));
        self
    }

    fn hook_dyn(&mut self, event: EventKind, scope: HookScope, behavior: Arc<dyn HookBehavior>) {
        let id = HookId(self.core.hooks.len());
        let order = self.core.next_order();
        self.core.hooks.push(Hook {
            id,
            event,
            scope,
            order,
            node: self.node,
            behavior,
        });
    }

    // ─────────────────────────────────────────────────────────────────────
    // Capabilities and shared state
    // ─────────────────────────────────────────────────────────────────────

    /// Exposes a named capability on this node.
    ///
    /// The capability becomes visible to this node's routes and
    /// descendants; a name already exposed by an ancestor is shadowed for
    /// the sub-tree.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::DuplicateCapability`] if this node already
    /// exposes the name.
    pub fn expose(
        &mut self,
        name: impl Into<String>,
        value: impl CapabilityValue,
    ) -> Result<&mut Self, AssemblyError> {
        let name = name.into();
        if self.core.nodes[self.node.0].caps.contains_key(&name) {
            return Err(AssemblyError::DuplicateCapability {
                name,
                path: self.path().to_string(),
            });
        }
        let id = CapabilityId(self.core.arena.len());
        self.core.arena.push(CapabilityRecord {
            name: name.clone().into(),
            provider: self.node,
            value: Arc::new(value),
        });
        self.core.nodes[self.node.0].caps.insert(name, id);
        Ok(self)
    }

    /// Declares a required capability or state slot.
    ///
    /// The check runs now, against what is visible at this point of the
    /// assembly — a dependency that is missing fails the build immediately
    /// rather than surfacing at request time.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::MissingDependency`] when neither this node
    /// nor any ancestor exposes the name.
    pub fn require(&mut self, name: &str) -> Result<&mut Self, AssemblyError> {
        let visible = self
            .ancestor_chain()
            .any(|node| {
                let data = &self.core.nodes[node.0];
                data.caps.contains_key(name) || data.state.contains_key(name)
            });
        if visible {
            Ok(self)
        } else {
            Err(AssemblyError::MissingDependency {
                name: name.to_string(),
                path: self.path().to_string(),
            })
        }
    }

    /// Declares a named shared-state slot on this node.
    ///
    /// The slot is shared by reference with every route and handler that
    /// resolves this node; see [`StateSlot`](crate::state::StateSlot) for
    /// the locking contract.
    pub fn share<T: Send + Sync + 'static>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> &mut Self {
        let name = name.into();
        let slot = StateSlot::new(name.clone(), value);
        self.core.nodes[self.node.0].state.insert(name, slot);
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Bundles and guards
    // ─────────────────────────────────────────────────────────────────────

    /// Defines a parameterized bundle under a name.
    ///
    /// Routes on this node or below may reference the name; each reference
    /// invokes the factory with its own parameter and expands into that
    /// route's chain only.
    pub fn define<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(serde_json::Value) -> HookBundle + Send + Sync + 'static,
    {
        self.core.nodes[self.node.0]
            .bundles
            .insert(name.into(), BundleDef::Factory(Arc::new(factory)));
        self
    }

    /// Defines a fixed (non-parameterized) bundle under a name.
    pub fn define_fixed(&mut self, name: impl Into<String>, bundle: HookBundle) -> &mut Self {
        self.core.nodes[self.node.0]
            .bundles
            .insert(name.into(), BundleDef::Fixed(bundle));
        self
    }

    /// Applies a bundle to every route declared inside `body`.
    ///
    /// Contributions accumulate: routes inside nested guards receive the
    /// outer guard's contributions first, then the inner's, in declaration
    /// order. With a scope override on the guard, its hooks are instead
    /// declared on this node with that visibility tier.
    ///
    /// # Errors
    ///
    /// Propagates any [`AssemblyError`] raised inside `body`.
    pub fn guard<F>(&mut self, guard: Guard, body: F) -> Result<(), AssemblyError>
    where
        F: FnOnce(&mut ScopeBuilder<'_>) -> Result<(), AssemblyError>,
    {
        let index = self.core.guard_count;
        self.core.guard_count += 1;

        let mut frame = GuardFrame {
            index,
            schema: guard.bundle.schema.clone(),
            contributions: Vec::new(),
        };
        for contribution in &guard.bundle.hooks {
            // Teardown hooks are node-level by nature, never per-route.
            if contribution.event == EventKind::OnStop {
                self.hook_dyn(EventKind::OnStop, HookScope::Local, contribution.behavior.clone());
                continue;
            }
            match guard.scope_override {
                Some(scope) => {
                    self.hook_dyn(contribution.event, scope, contribution.behavior.clone());
                }
                None => {
                    let order = self.core.next_order();
                    frame
                        .contributions
                        .push((order, contribution.event, contribution.behavior.clone()));
                }
            }
        }

        self.core.guards.push(frame);
        let result = body(self);
        self.core.guards.pop();
        result
    }

    fn lookup_bundle(&self, name: &str) -> Option<BundleDef> {
        for node in self.ancestor_chain() {
            if let Some(def) = self.core.nodes[node.0].bundles.get(name) {
                return Some(def.clone());
            }
        }
        None
    }

    // ─────────────────────────────────────────────────────────────────────
    // Routes
    // ─────────────────────────────────────────────────────────────────────

    /// Declares a route on this node, capturing its hook chain now.
    ///
    /// The captured chain contains every hook currently visible here,
    /// grouped by stage and ordered by declaration order, followed by guard
    /// contributions (at their guard's declaration point) and bundle
    /// expansions (at this route's declaration point). The chain is frozen:
    /// hooks declared after this call never apply to this route.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::MissingBundle`] if the spec references a
    /// bundle name with no visible definition.
    pub fn route(&mut self, spec: RouteSpec) -> Result<(), AssemblyError> {
        let order = self.core.next_order();
        let node = self.node;

        let mut entries: Vec<ChainEntry> = self
            .core
            .hooks
            .iter()
            .filter(|hook| hook.event != EventKind::OnStop)
            .filter(|hook| hook.order < order)
            .filter(|hook| visibility::observes(hook.scope, hook.node, node, &self.core.nodes))
            .map(|hook| ChainEntry {
                event: hook.event,
                order: hook.order,
                source: ChainSource::Node(hook.id),
                behavior: hook.behavior.clone(),
            })
            .collect();

        let mut schemas = Vec::new();
        for frame in &self.core.guards {
            if let Some(schema) = &frame.schema {
                schemas.push(schema.clone());
            }
            for (position, (contribution_order, event, behavior)) in
                frame.contributions.iter().enumerate()
            {
                entries.push(ChainEntry {
                    event: *event,
                    order: *contribution_order,
                    source: ChainSource::Guard {
                        guard: frame.index,
                        position,
                    },
                    behavior: behavior.clone(),
                });
            }
        }

        let mut expanded_position = 0usize;
        for op in &spec.ops {
            match op {
                SpecOp::Schema(schema) => schemas.push(schema.clone()),
                SpecOp::Apply { bundle, param } => {
                    let def = self.lookup_bundle(bundle).ok_or_else(|| {
                        AssemblyError::MissingBundle {
                            name: bundle.clone(),
                            path: self.path().to_string(),
                        }
                    })?;
                    let expansion = def.expand(param.clone());
                    if let Some(schema) = expansion.schema {
                        schemas.push(schema);
                    }
                    for contribution in expansion.hooks {
                        if contribution.event == EventKind::OnStop {
                            self.hook_dyn(EventKind::OnStop, HookScope::Local, contribution.behavior);
                            continue;
                        }
                        entries.push(ChainEntry {
                            event: contribution.event,
                            // Expansions anchor at the reference point: this
                            // route's declaration order.
                            order,
                            source: ChainSource::Bundle {
                                name: bundle.clone(),
                                position: expanded_position,
                            },
                            behavior: contribution.behavior,
                        });
                        expanded_position += 1;
                    }
                }
            }
        }

        let chain = HookChain::from_entries(entries);
        tracing::debug!(
            method = %spec.method,
            path = %spec.path,
            node = %self.path(),
            hooks = chain.len(),
            "route declared"
        );
        self.core.routes.push(Route {
            method: spec.method,
            path: spec.path,
            node,
            order,
            chain,
            schemas,
            handler: spec.handler,
        });
        Ok(())
    }

    /// Installs the external schema validator for the whole pipeline.
    ///
    /// The last installation wins; routes without schema contributions are
    /// unaffected.
    pub fn set_validator(&mut self, validator: Arc<dyn SchemaValidator>) -> &mut Self {
        self.core.validator = Some(validator);
        self
    }

    /// Nodes from self up to the root, nearest first.
    fn ancestor_chain(&self) -> impl Iterator<Item = NodeId> + '_ {
        let data = &self.core.nodes[self.node.0];
        core::iter::once(self.node).chain(data.ancestors.iter().rev().copied())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// The assembly root: mount fragments, then freeze into an
/// [`AssembledPipeline`].
///
/// # Example
///
/// ```ignore
/// let mut pipeline = Pipeline::new();
/// pipeline.mount((TracingFragment::default(), ApiFragment))?;
/// let app = pipeline.finalize();
/// ```
pub struct Pipeline {
    core: Core,
    root: NodeId,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pipeline").field("root", &self.root).finish()
    }
}

impl Pipeline {
    /// Creates an empty pipeline with a single root node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        let root = NodeData::push(&mut nodes, "root", None);
        Self {
            core: Core {
                nodes,
                hooks: Vec::new(),
                arena: Vec::new(),
                registry: DeduplicationRegistry::new(),
                routes: Vec::new(),
                guards: Vec::new(),
                guard_count: 0,
                mount_stack: Vec::new(),
                counter: 0,
                validator: None,
            },
            root,
        }
    }

    /// Mounts one or more fragments at the root.
    ///
    /// # Errors
    ///
    /// Any [`AssemblyError`] aborts the build; the pipeline should be
    /// discarded.
    pub fn mount<F: Fragments>(&mut self, fragments: F) -> Result<&mut Self, AssemblyError> {
        let root = self.root;
        fragments.mount_into(&mut ScopeBuilder {
            core: &mut self.core,
            node: root,
        })?;
        Ok(self)
    }

    /// Runs declarations directly against the root scope.
    ///
    /// # Errors
    ///
    /// Propagates any [`AssemblyError`] raised by the closure.
    pub fn configure<F>(&mut self, f: F) -> Result<&mut Self, AssemblyError>
    where
        F: FnOnce(&mut ScopeBuilder<'_>) -> Result<(), AssemblyError>,
    {
        let root = self.root;
        f(&mut ScopeBuilder {
            core: &mut self.core,
            node: root,
        })?;
        Ok(self)
    }

    /// Installs the external schema validator.
    pub fn set_validator(&mut self, validator: Arc<dyn SchemaValidator>) -> &mut Self {
        self.core.validator = Some(validator);
        self
    }

    /// Freezes the assembly into its immutable, dispatchable form.
    ///
    /// Per-node capability and state tables are merged along ancestor
    /// chains once, here; request-time lookup never walks the tree.
    #[must_use]
    pub fn finalize(self) -> AssembledPipeline {
        let Core {
            nodes,
            hooks,
            arena,
            routes,
            validator,
            ..
        } = self.core;

        let frozen = nodes
            .iter()
            .map(|node| {
                let mut caps = HashMap::new();
                let mut state = HashMap::new();
                // Merge root-first so the closest declaration wins.
                let sources = node
                    .ancestors
                    .iter()
                    .map(|id| &nodes[id.0])
                    .chain(core::iter::once(node));
                for source in sources {
                    for (name, id) in &source.caps {
                        caps.insert(name.clone(), *id);
                    }
                    for (name, slot) in &source.state {
                        state.insert(name.clone(), slot.clone());
                    }
                }
                FrozenNode {
                    path: node.path.clone(),
                    caps,
                    state,
                }
            })
            .collect();

        let stop_hooks = hooks
            .iter()
            .filter(|hook| hook.event == EventKind::OnStop)
            .map(|hook| StopHook {
                node: hook.node,
                behavior: hook.behavior.clone(),
            })
            .collect::<Vec<_>>();

        let tree = Arc::new(TreeData {
            nodes: frozen,
            arena,
            validator,
        });
        let routes: Vec<RouteHandle> = routes
            .into_iter()
            .map(|route| RouteHandle::new(Arc::new(route), tree.clone()))
            .collect();

        tracing::debug!(
            nodes = tree.nodes.len(),
            routes = routes.len(),
            hooks = hooks.len(),
            "pipeline finalized"
        );
        AssembledPipeline {
            tree,
            routes,
            stop_hooks,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Frozen tree / AssembledPipeline
// ─────────────────────────────────────────────────────────────────────────────

/// A node's resolved, request-time view.
pub(crate) struct FrozenNode {
    pub(crate) path: String,
    pub(crate) caps: HashMap<String, CapabilityId>,
    pub(crate) state: HashMap<String, StateSlot>,
}

/// The read-only structure shared by every route handle and request context.
pub(crate) struct TreeData {
    pub(crate) nodes: Vec<FrozenNode>,
    pub(crate) arena: Vec<CapabilityRecord>,
    pub(crate) validator: Option<Arc<dyn SchemaValidator>>,
}

/// A teardown hook retained for [`AssembledPipeline::shutdown`].
struct StopHook {
    node: NodeId,
    behavior: Arc<dyn HookBehavior>,
}

/// The frozen pipeline: finalized routes plus whole-tree teardown.
///
/// Assembled structures are immutable and need no runtime synchronization;
/// only shared-state slots remain mutable. Handles can be cloned freely and
/// dispatched from concurrent tasks.
pub struct AssembledPipeline {
    tree: Arc<TreeData>,
    routes: Vec<RouteHandle>,
    stop_hooks: Vec<StopHook>,
}

impl AssembledPipeline {
    /// The finalized routes, in declaration order.
    #[must_use]
    pub fn routes(&self) -> &[RouteHandle] {
        &self.routes
    }

    /// Hands every route to the external routing layer.
    pub fn install_into(&self, sink: &mut dyn RouteSink) {
        for route in &self.routes {
            sink.register(route.method(), route.path(), route.clone());
        }
    }

    /// Runs all on-stop hooks once, in declaration order.
    ///
    /// Teardown is whole-tree: scopes do not gate it, halts are ignored,
    /// and a faulting hook is logged without stopping the remainder.
    pub async fn shutdown(&self) {
        for stop in &self.stop_hooks {
            let mut ctx = Context::new(self.tree.clone(), stop.node, Request::default());
            if let Err(fault) = stop.behavior.invoke(&mut ctx).await {
                tracing::error!(fault = %fault, "on-stop hook fault");
            }
        }
        tracing::debug!(hooks = self.stop_hooks.len(), "pipeline shut down");
    }
}
