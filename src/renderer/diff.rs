//! Virtual tree diff engine.
//!
//! [`diff`] compares an old and a new virtual tree and produces a [`Patch`]:
//! a first-class function that mutates a concrete node into conformance
//! with the new tree. Virtual trees are never mutated; only the concrete
//! tree is.
//!
//! # Policy
//!
//! Applied in order:
//!
//! 1. No new node: the patch removes the concrete node.
//! 2. Either side is a text leaf: unequal values replace wholesale, equal
//!    values are a no-op.
//! 3. Tags differ: replace wholesale, regardless of how similar the
//!    attributes or children are.
//! 4. Tags match: compose an attribute patch and a children patch against
//!    the same concrete node, attributes first.
//!
//! Children are paired by position only; there is no keyed matching, so a
//! reordered child list diffs as a replacement at every shifted position.

use tracing::trace;

use super::backend::TreeBackend;
use super::materialize::{apply_attribute, materialize};
use crate::types::NodeId;
use crate::vdom::{AttrValue, VElement, VNode, listener_kind};

// =============================================================================
// Patch
// =============================================================================

/// A patch over one concrete node.
///
/// Applying it yields the node that now occupies the position: the same
/// node after in-place mutation, a replacement node after a wholesale swap,
/// or `None` when the node was removed. Patches compose: the children diff
/// nests one patch per child pair inside the parent's patch.
pub struct Patch(Box<dyn FnOnce(&mut dyn TreeBackend, NodeId) -> Option<NodeId>>);

impl Patch {
    fn new(f: impl FnOnce(&mut dyn TreeBackend, NodeId) -> Option<NodeId> + 'static) -> Self {
        Self(Box::new(f))
    }

    /// Apply the patch to `node`.
    pub fn apply(self, tree: &mut dyn TreeBackend, node: NodeId) -> Option<NodeId> {
        (self.0)(tree, node)
    }

    /// Leave the node untouched.
    fn keep() -> Self {
        Self::new(|_tree, node| Some(node))
    }

    /// Remove the node; nothing occupies the position afterwards.
    fn remove() -> Self {
        Self::new(|tree, node| {
            tree.remove_node(node);
            None
        })
    }

    /// Materialize `vnode` and swap it into the node's position.
    fn replace_with(vnode: VNode) -> Self {
        Self::new(move |tree, node| {
            let replacement = materialize(tree, &vnode);
            tree.replace_node(node, replacement);
            Some(replacement)
        })
    }
}

impl std::fmt::Debug for Patch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Patch")
    }
}

// =============================================================================
// Diff
// =============================================================================

/// Compute the patch turning a concrete rendering of `old` into `new`.
///
/// `new` being `None` means nothing occupies the position anymore; the
/// children diff leans on this to express truncation through the same
/// entry point.
pub fn diff(old: &VNode, new: Option<&VNode>) -> Patch {
    let Some(new) = new else {
        return Patch::remove();
    };

    match (old, new) {
        (VNode::Text(old_value), VNode::Text(new_value)) => {
            if old_value == new_value {
                Patch::keep()
            } else {
                Patch::replace_with(new.clone())
            }
        }
        // A leaf on one side only always replaces wholesale.
        (VNode::Text(_), VNode::Element(_)) | (VNode::Element(_), VNode::Text(_)) => {
            Patch::replace_with(new.clone())
        }
        (VNode::Element(old_el), VNode::Element(new_el)) => {
            if old_el.tag != new_el.tag {
                return Patch::replace_with(new.clone());
            }
            let attr_ops = diff_attributes(old_el, new_el);
            let patch_children = diff_children(&old_el.children, &new_el.children);
            Patch::new(move |tree, node| {
                for op in attr_ops {
                    op(tree, node);
                }
                patch_children(tree, node);
                Some(node)
            })
        }
    }
}

/// One attribute operation; never changes which node occupies the position.
type AttrOp = Box<dyn FnOnce(&mut dyn TreeBackend, NodeId)>;

/// Attribute diff: set operations for every new or changed key, in the new
/// map's iteration order, then remove operations for every dropped key, in
/// the old map's iteration order.
fn diff_attributes(old: &VElement, new: &VElement) -> Vec<AttrOp> {
    let mut ops: Vec<AttrOp> = Vec::new();

    for (key, value) in &new.attrs {
        if old.attrs.get(key) != Some(value) {
            let key = key.clone();
            let value = value.clone();
            ops.push(Box::new(move |tree, node| {
                apply_attribute(tree, node, &key, &value);
            }));
        }
    }

    for (key, value) in &old.attrs {
        if !new.attrs.contains_key(key) {
            let key = key.clone();
            let op: AttrOp = match value {
                // Nothing concrete to undo for a dropped reference callback.
                AttrValue::Ref(_) => Box::new(|_tree, _node| {}),
                AttrValue::Event(_) => Box::new(move |tree, node| {
                    tree.clear_event_listener(node, listener_kind(&key));
                }),
                AttrValue::Plain(_) => Box::new(move |tree, node| {
                    tree.remove_attribute(node, &key);
                }),
            };
            ops.push(op);
        }
    }

    ops
}

/// Children diff: one nested patch per positional pair, plus appends for
/// the new tail.
///
/// Pairs past the end of the new list resolve through `diff(old, None)` and
/// remove their concrete nodes; there is no separate truncation step. The
/// concrete child list is snapshotted before any patch runs so removals
/// cannot shift later pairs.
fn diff_children(
    old: &[VNode],
    new: &[VNode],
) -> Box<dyn FnOnce(&mut dyn TreeBackend, NodeId)> {
    let pair_patches: Vec<Patch> = old
        .iter()
        .enumerate()
        .map(|(i, old_child)| diff(old_child, new.get(i)))
        .collect();
    let appended: Vec<VNode> = new.get(old.len()..).unwrap_or_default().to_vec();

    Box::new(move |tree, parent| {
        if !appended.is_empty() {
            trace!(parent = %parent, count = appended.len(), "appending children");
        }
        let existing = tree.child_nodes(parent);
        for (patch, child) in pair_patches.into_iter().zip(existing) {
            patch.apply(tree, child);
        }
        for vnode in &appended {
            let node = materialize(tree, vnode);
            tree.append_child(parent, node);
        }
    })
}

// =============================================================================
// Tests
// =============================================================================
