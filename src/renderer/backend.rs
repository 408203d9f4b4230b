//! Concrete tree capability trait.
//!
//! The diff/patch engine is polymorphic over any backend exposing this
//! capability set; it never targets a literal browser document. Handles are
//! opaque [`NodeId`]s issued by the backend's create calls.
//!
//! Passing a handle the backend does not know is a programming error, not a
//! recoverable condition: implementations are expected to panic loudly
//! rather than swallow it.

use crate::types::{Callback, NodeId};

/// Capability set required of a concrete tree.
///
/// Object-safe: the engine works against `&mut dyn TreeBackend`.
pub trait TreeBackend {
    /// Create a detached element node for `tag`.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Create a detached text node.
    fn create_text(&mut self, text: &str) -> NodeId;

    /// Set a generic attribute.
    fn set_attribute(&mut self, node: NodeId, key: &str, value: &str);

    /// Remove a generic attribute. Unknown keys are a no-op.
    fn remove_attribute(&mut self, node: NodeId, key: &str);

    /// Install the listener for `kind`, replacing any previous listener of
    /// the same kind on this node.
    fn set_event_listener(&mut self, node: NodeId, kind: &str, handler: Callback);

    /// Remove the listener for `kind`, if any.
    fn clear_event_listener(&mut self, node: NodeId, kind: &str);

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: NodeId, child: NodeId);

    /// Put `new` in `old`'s position and discard `old`'s subtree.
    fn replace_node(&mut self, old: NodeId, new: NodeId);

    /// Detach and discard `node`'s subtree.
    fn remove_node(&mut self, node: NodeId);

    /// Children of `node` in creation order.
    fn child_nodes(&self, node: NodeId) -> Vec<NodeId>;

    /// Whether `node` is a live node of this tree.
    fn contains(&self, node: NodeId) -> bool;

    /// Whether `node` is an element (can hold children).
    fn is_element(&self, node: NodeId) -> bool;
}
