//! First-time materialization of virtual trees.
//!
//! Turns a [`VNode`] into concrete nodes: a text leaf becomes a text node;
//! an element is created for its tag, every attribute is applied, then the
//! children are materialized and appended in order. The diff engine uses
//! the same entry point for wholesale replacements and appended children.

use super::backend::TreeBackend;
use crate::types::NodeId;
use crate::vdom::{AttrValue, VNode, listener_kind};

/// Materialize `vnode` into a detached concrete subtree.
pub fn materialize(tree: &mut dyn TreeBackend, vnode: &VNode) -> NodeId {
    match vnode {
        VNode::Text(value) => tree.create_text(&value.to_string()),
        VNode::Element(el) => {
            let node = tree.create_element(&el.tag);
            for (key, value) in &el.attrs {
                apply_attribute(tree, node, key, value);
            }
            for child in &el.children {
                let concrete = materialize(tree, child);
                tree.append_child(node, concrete);
            }
            node
        }
    }
}

/// Apply one attribute to a concrete node.
///
/// Three-way classification shared with the attribute diff: reference
/// callbacks fire with the node id, event bindings install a listener for
/// the key's kind, everything else goes through the generic setter.
pub(crate) fn apply_attribute(tree: &mut dyn TreeBackend, node: NodeId, key: &str, value: &AttrValue) {
    match value {
        AttrValue::Ref(callback) => callback.call(node),
        AttrValue::Event(handler) => {
            tree.set_event_listener(node, listener_kind(key), handler.clone());
        }
        AttrValue::Plain(plain) => tree.set_attribute(node, key, &plain.to_string()),
    }
}

// =============================================================================
// Tests
// =============================================================================
