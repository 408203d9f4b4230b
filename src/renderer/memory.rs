//! In-memory concrete tree.
//!
//! Arena-backed [`TreeBackend`] used as the host-independent reference
//! backend and by the test-suite. Nodes live in a slab indexed by
//! [`NodeId`]; freed indices are pooled and reused.
//!
//! Event listeners are stored per node per kind; [`MemoryTree::dispatch`]
//! simulates an event from the host side. Dispatch snapshots the handler
//! before invoking it, so a handler may force a synchronous re-render that
//! mutates the tree.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use super::backend::TreeBackend;
use crate::types::{Callback, NodeEvent, NodeId};

#[derive(Debug, Clone, PartialEq)]
enum NodeKind {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
    },
    Text {
        value: String,
    },
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: IndexMap<String, Callback>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: IndexMap::new(),
        }
    }
}

// =============================================================================
// Memory Tree
// =============================================================================

/// Arena-backed concrete tree.
#[derive(Debug, Default)]
pub struct MemoryTree {
    nodes: Vec<Option<NodeData>>,
    free: Vec<u32>,
}

impl MemoryTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index as usize] = Some(data);
                NodeId(index)
            }
            None => {
                self.nodes.push(Some(data));
                NodeId(self.nodes.len() as u32 - 1)
            }
        }
    }

    fn node(&self, id: NodeId) -> &NodeData {
        self.nodes
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("unknown node {id}"))
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.nodes
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("unknown node {id}"))
    }

    /// Free `id` and its whole subtree.
    fn free_subtree(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.free_subtree(child);
        }
        self.nodes[id.0 as usize] = None;
        self.free.push(id.0);
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|c| *c != id);
        }
        self.node_mut(id).parent = None;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Tag of an element node.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text { .. } => None,
        }
    }

    /// Attribute value of an element node.
    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => attrs.get(key).map(String::as_str),
            NodeKind::Text { .. } => None,
        }
    }

    /// Attribute keys of an element node, in insertion order.
    pub fn attr_keys(&self, id: NodeId) -> Vec<String> {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => attrs.keys().cloned().collect(),
            NodeKind::Text { .. } => Vec::new(),
        }
    }

    /// Text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { value } => Some(value),
            NodeKind::Element { .. } => None,
        }
    }

    /// Concatenated text of the subtree, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        match &self.node(id).kind {
            NodeKind::Text { value } => value.clone(),
            NodeKind::Element { .. } => self
                .node(id)
                .children
                .iter()
                .map(|child| self.text_content(*child))
                .collect(),
        }
    }

    /// Number of children of `id`.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.node(id).children.len()
    }

    /// Number of listeners installed on `id` for `kind`.
    pub fn listener_count(&self, id: NodeId, kind: &str) -> usize {
        usize::from(self.node(id).listeners.contains_key(kind))
    }

    /// First element in the subtree of `root` carrying `key="value"`.
    pub fn find_by_attr(&self, root: NodeId, key: &str, value: &str) -> Option<NodeId> {
        if self.attr(root, key) == Some(value) {
            return Some(root);
        }
        self.node(root)
            .children
            .iter()
            .find_map(|child| self.find_by_attr(*child, key, value))
    }

    // =========================================================================
    // Event Dispatch
    // =========================================================================

    /// Simulate an event of `kind` on `node`.
    ///
    /// The handler snapshot is taken before invocation and the borrow on
    /// `tree` released, so the handler may publish, force a re-render, or
    /// otherwise mutate the tree. Returns whether a listener ran.
    pub fn dispatch(tree: &Rc<RefCell<Self>>, node: NodeId, kind: &str) -> bool {
        let handler = tree.borrow().node(node).listeners.get(kind).cloned();
        match handler {
            Some(handler) => {
                handler.call(&NodeEvent::new(kind, node));
                true
            }
            None => false,
        }
    }
}

impl TreeBackend for MemoryTree {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::new(NodeKind::Element {
            tag: tag.to_owned(),
            attrs: IndexMap::new(),
        }))
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::new(NodeKind::Text {
            value: text.to_owned(),
        }))
    }

    fn set_attribute(&mut self, node: NodeId, key: &str, value: &str) {
        match &mut self.node_mut(node).kind {
            NodeKind::Element { attrs, .. } => {
                attrs.insert(key.to_owned(), value.to_owned());
            }
            NodeKind::Text { .. } => panic!("set_attribute on text node {node}"),
        }
    }

    fn remove_attribute(&mut self, node: NodeId, key: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(node).kind {
            attrs.shift_remove(key);
        }
    }

    fn set_event_listener(&mut self, node: NodeId, kind: &str, handler: Callback) {
        self.node_mut(node).listeners.insert(kind.to_owned(), handler);
    }

    fn clear_event_listener(&mut self, node: NodeId, kind: &str) {
        self.node_mut(node).listeners.shift_remove(kind);
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    fn replace_node(&mut self, old: NodeId, new: NodeId) {
        let parent = self.node(old).parent;
        if let Some(parent) = parent {
            let position = self
                .node(parent)
                .children
                .iter()
                .position(|c| *c == old)
                .expect("old node not under its parent");
            self.detach(new);
            self.node_mut(parent).children[position] = new;
            self.node_mut(new).parent = Some(parent);
        }
        self.node_mut(old).parent = None;
        self.free_subtree(old);
    }

    fn remove_node(&mut self, node: NodeId) {
        self.detach(node);
        self.free_subtree(node);
    }

    fn child_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    fn contains(&self, node: NodeId) -> bool {
        self.nodes
            .get(node.0 as usize)
            .is_some_and(Option::is_some)
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.contains(node)
            && matches!(self.node(node).kind, NodeKind::Element { .. })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_create_and_append_preserves_order() {
        let mut tree = MemoryTree::new();
        let parent = tree.create_element("div");
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        tree.append_child(parent, a);
        tree.append_child(parent, b);

        assert_eq!(tree.child_nodes(parent), vec![a, b]);
        assert_eq!(tree.text_content(parent), "ab");
        assert!(tree.is_element(parent));
        assert!(!tree.is_element(a));
    }

    #[test]
    fn test_replace_node_keeps_position() {
        let mut tree = MemoryTree::new();
        let parent = tree.create_element("div");
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        let c = tree.create_text("c");
        tree.append_child(parent, a);
        tree.append_child(parent, b);

        tree.replace_node(a, c);
        assert_eq!(tree.child_nodes(parent), vec![c, b]);
        assert!(!tree.contains(a));
    }

    #[test]
    fn test_remove_node_frees_subtree() {
        let mut tree = MemoryTree::new();
        let parent = tree.create_element("div");
        let child = tree.create_element("span");
        let grandchild = tree.create_text("x");
        tree.append_child(parent, child);
        tree.append_child(child, grandchild);

        tree.remove_node(child);
        assert_eq!(tree.child_count(parent), 0);
        assert!(!tree.contains(child));
        assert!(!tree.contains(grandchild));
    }

    #[test]
    fn test_set_event_listener_replaces_same_kind() {
        let mut tree = MemoryTree::new();
        let node = tree.create_element("button");
        tree.set_event_listener(node, "click", Callback::new(|_| {}));
        tree.set_event_listener(node, "click", Callback::new(|_| {}));

        assert_eq!(tree.listener_count(node, "click"), 1);
        tree.clear_event_listener(node, "click");
        assert_eq!(tree.listener_count(node, "click"), 0);
    }

    #[test]
    fn test_dispatch_runs_listener_with_target() {
        let tree = Rc::new(RefCell::new(MemoryTree::new()));
        let node = tree.borrow_mut().create_element("button");

        let hits = Rc::new(Cell::new(0));
        let hits_inner = hits.clone();
        tree.borrow_mut().set_event_listener(
            node,
            "click",
            Callback::new(move |event| {
                assert_eq!(event.kind, "click");
                hits_inner.set(hits_inner.get() + 1);
            }),
        );

        assert!(MemoryTree::dispatch(&tree, node, "click"));
        assert!(!MemoryTree::dispatch(&tree, node, "keydown"));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_freed_ids_are_reused() {
        let mut tree = MemoryTree::new();
        let parent = tree.create_element("div");
        let a = tree.create_text("a");
        tree.append_child(parent, a);
        tree.remove_node(a);

        let b = tree.create_text("b");
        assert_eq!(a, b);
        assert!(tree.contains(b));
    }

    #[test]
    #[should_panic(expected = "unknown node")]
    fn test_unknown_node_panics() {
        let tree = MemoryTree::new();
        tree.child_count(NodeId(99));
    }

    #[test]
    fn test_find_by_attr() {
        let mut tree = MemoryTree::new();
        let root = tree.create_element("div");
        let inner = tree.create_element("span");
        tree.set_attribute(inner, "class", "label");
        tree.append_child(root, inner);

        assert_eq!(tree.find_by_attr(root, "class", "label"), Some(inner));
        assert_eq!(tree.find_by_attr(root, "class", "missing"), None);
    }
}
