//! Three-tier hook visibility over the assembled tree.
//!
//! Visibility is a pure function of the declared tier and the positions of
//! the defining and consuming nodes. Ancestor paths are cached on each node
//! at creation, so every check is a path lookup, never a tree walk.
//!
//! The tiers, for a hook defined on node `D` and a route on node `C`:
//!
//! - `Local` — `C` is `D` or a descendant of `D`.
//! - `Scoped` — as `Local`, anchored one level up: `C` lies in the sub-tree
//!   of the node that mounted `D` (or of `D` itself at the root).
//! - `Global` — `C` lies in `D`'s sub-tree, or `C` transitively mounted `D`.
//!
//! Every tier is additionally gated on declaration order at chain capture;
//! that gate lives with the capture logic, not here.

use super::{NodeData, NodeId};
use crate::hook::HookScope;

/// Returns `true` if `candidate` is `node` or one of its ancestors.
pub(crate) fn is_ancestor_or_self(candidate: NodeId, node: NodeId, nodes: &[NodeData]) -> bool {
    candidate == node || nodes[node.0].ancestors.contains(&candidate)
}

/// Decides whether a route on `consumer` observes a hook declared on
/// `defining` with the given tier.
pub(crate) fn observes(
    scope: HookScope,
    defining: NodeId,
    consumer: NodeId,
    nodes: &[NodeData],
) -> bool {
    match scope {
        HookScope::Local => is_ancestor_or_self(defining, consumer, nodes),
        HookScope::Scoped => {
            let anchor = nodes[defining.0].parent.unwrap_or(defining);
            is_ancestor_or_self(anchor, consumer, nodes)
        }
        HookScope::Global => {
            is_ancestor_or_self(defining, consumer, nodes)
                || nodes[defining.0].ancestors.contains(&consumer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds the four-node chain `main → parent → current → child`
    /// (mounted innermost-last) and returns their ids in declaration order.
    fn chain() -> (Vec<NodeData>, [NodeId; 4]) {
        let mut nodes = Vec::new();
        let main = NodeData::push(&mut nodes, "main", None);
        let parent = NodeData::push(&mut nodes, "parent", Some(main));
        let current = NodeData::push(&mut nodes, "current", Some(parent));
        let child = NodeData::push(&mut nodes, "child", Some(current));
        (nodes, [child, current, parent, main])
    }

    #[test]
    fn local_reaches_self_and_descendants() {
        let (nodes, [child, current, parent, main]) = chain();

        assert!(observes(HookScope::Local, current, child, &nodes));
        assert!(observes(HookScope::Local, current, current, &nodes));
        assert!(!observes(HookScope::Local, current, parent, &nodes));
        assert!(!observes(HookScope::Local, current, main, &nodes));
    }

    #[test]
    fn scoped_extends_exactly_one_level_up() {
        let (nodes, [child, current, parent, main]) = chain();

        assert!(observes(HookScope::Scoped, current, child, &nodes));
        assert!(observes(HookScope::Scoped, current, current, &nodes));
        assert!(observes(HookScope::Scoped, current, parent, &nodes));
        assert!(!observes(HookScope::Scoped, current, main, &nodes));
    }

    #[test]
    fn global_reaches_all_ancestors_and_descendants() {
        let (nodes, [child, current, parent, main]) = chain();

        assert!(observes(HookScope::Global, current, child, &nodes));
        assert!(observes(HookScope::Global, current, current, &nodes));
        assert!(observes(HookScope::Global, current, parent, &nodes));
        assert!(observes(HookScope::Global, current, main, &nodes));
    }

    #[test]
    fn scoped_at_root_is_confined_to_the_tree() {
        let (nodes, [_, _, _, main]) = chain();

        // No parent to extend to: the anchor is the root itself.
        assert!(observes(HookScope::Scoped, main, main, &nodes));
    }

    #[test]
    fn sibling_subtrees_do_not_observe_global_hooks() {
        let mut nodes = Vec::new();
        let root = NodeData::push(&mut nodes, "root", None);
        let left = NodeData::push(&mut nodes, "left", Some(root));
        let right = NodeData::push(&mut nodes, "right", Some(root));

        // `right` never composed `left`, so `left`'s global hooks stay away.
        assert!(!observes(HookScope::Global, left, right, &nodes));
        assert!(observes(HookScope::Global, left, root, &nodes));
    }
}
