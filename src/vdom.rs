//! Virtual node model.
//!
//! A virtual tree is the immutable description of desired UI output produced
//! by a component's render step. Every draw produces a fresh tree; the
//! renderer compares consecutive trees and mutates the concrete tree to
//! match (see [`crate::renderer::diff`]).
//!
//! # Example
//!
//! ```
//! use lumen_ui::vdom::{VElement, VNode};
//!
//! let tree: VNode = VElement::new("div")
//!     .attr("class", "container")
//!     .child(VElement::new("h1").child("Hello"))
//!     .child(42)
//!     .into();
//! ```

use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

use crate::types::{Callback, NodeId, Value};

/// Attribute keys with this prefix carry event bindings; the listener kind
/// is the remainder of the key (`event_click` installs a `click` listener).
pub const EVENT_PREFIX: &str = "event_";

/// Attribute key carrying the reference callback, invoked with the
/// materialized node's id.
pub const REF_KEY: &str = "refElement";

// =============================================================================
// Reference Callbacks
// =============================================================================

/// Callback invoked with the concrete node materialized for an element.
///
/// Like [`Callback`], compares by allocation identity.
#[derive(Clone)]
pub struct RefCallback(Rc<dyn Fn(NodeId)>);

impl RefCallback {
    /// Wrap a closure as a shared reference callback.
    pub fn new(f: impl Fn(NodeId) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback with the materialized node.
    pub fn call(&self, node: NodeId) {
        (self.0)(node);
    }
}

impl PartialEq for RefCallback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RefCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefCallback")
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Attribute payload, dispatched by variant rather than by inspecting the
/// value's shape at patch time.
///
/// `Plain` values compare by value; `Event` and `Ref` compare by callback
/// identity, so a listener created fresh on every render counts as changed.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Generic attribute, applied through the backend's attribute setter in
    /// its [`Value`] display form.
    Plain(Value),
    /// Event binding; the listener kind comes from the attribute key.
    Event(Callback),
    /// Reference callback (key [`REF_KEY`]).
    Ref(RefCallback),
}

/// Listener kind encoded in an event attribute key.
///
/// Keys without the prefix fall back to the whole key.
pub fn listener_kind(key: &str) -> &str {
    key.strip_prefix(EVENT_PREFIX).unwrap_or(key)
}

// =============================================================================
// Virtual Nodes
// =============================================================================

/// A node in a virtual tree: an element or a text leaf.
///
/// Text leaves carry scalar [`Value`]s (string, number, boolean) and render
/// as concrete text nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Element(VElement),
    Text(Value),
}

impl VNode {
    /// Construct an element node from its three fields.
    ///
    /// No validation is performed on the tag or attribute keys; malformed
    /// values surface as failures in the render/patch step.
    pub fn element(
        tag: impl Into<String>,
        attrs: IndexMap<String, AttrValue>,
        children: Vec<VNode>,
    ) -> Self {
        Self::Element(VElement {
            tag: tag.into(),
            attrs,
            children,
        })
    }

    /// Construct a text leaf.
    pub fn text(value: impl Into<Value>) -> Self {
        Self::Text(value.into())
    }

    /// The element payload, if this is an element.
    pub fn as_element(&self) -> Option<&VElement> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    /// Whether this node is a text leaf.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl From<VElement> for VNode {
    fn from(el: VElement) -> Self {
        Self::Element(el)
    }
}

impl From<Value> for VNode {
    fn from(value: Value) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for VNode {
    fn from(s: &str) -> Self {
        Self::Text(s.into())
    }
}

impl From<String> for VNode {
    fn from(s: String) -> Self {
        Self::Text(s.into())
    }
}

impl From<i32> for VNode {
    fn from(i: i32) -> Self {
        Self::Text(i.into())
    }
}

impl From<i64> for VNode {
    fn from(i: i64) -> Self {
        Self::Text(i.into())
    }
}

impl From<f64> for VNode {
    fn from(x: f64) -> Self {
        Self::Text(x.into())
    }
}

impl From<bool> for VNode {
    fn from(b: bool) -> Self {
        Self::Text(b.into())
    }
}

/// An element: a tag, an ordered attribute map, and ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct VElement {
    pub tag: String,
    pub attrs: IndexMap<String, AttrValue>,
    pub children: Vec<VNode>,
}

impl VElement {
    /// Start building an element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Set a plain attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs
            .insert(key.into(), AttrValue::Plain(value.into()));
        self
    }

    /// Install an event binding under the `event_<kind>` key.
    pub fn on(mut self, kind: &str, callback: Callback) -> Self {
        self.attrs
            .insert(format!("{EVENT_PREFIX}{kind}"), AttrValue::Event(callback));
        self
    }

    /// Install the reference callback under the [`REF_KEY`] key.
    pub fn node_ref(mut self, callback: RefCallback) -> Self {
        self.attrs
            .insert(REF_KEY.to_owned(), AttrValue::Ref(callback));
        self
    }

    /// Append a child node.
    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append every child in order.
    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_produces_conventional_keys() {
        let el = VElement::new("button")
            .attr("class", "primary")
            .on("click", Callback::new(|_| {}))
            .node_ref(RefCallback::new(|_| {}));

        let keys: Vec<&str> = el.attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["class", "event_click", "refElement"]);
        assert_eq!(listener_kind("event_click"), "click");
        assert_eq!(listener_kind("click"), "click");
    }

    #[test]
    fn test_primitive_children_become_text_leaves() {
        let el = VElement::new("div").child("label").child(7).child(false);
        assert!(el.children.iter().all(VNode::is_text));
        assert_eq!(el.children[1], VNode::Text(Value::Int(7)));
    }

    #[test]
    fn test_attr_equality_semantics() {
        let cb = Callback::new(|_| {});
        assert_eq!(
            AttrValue::Event(cb.clone()),
            AttrValue::Event(cb.clone())
        );
        assert_ne!(
            AttrValue::Event(cb),
            AttrValue::Event(Callback::new(|_| {}))
        );
        assert_eq!(
            AttrValue::Plain(Value::Int(1)),
            AttrValue::Plain(Value::Int(1))
        );
    }

    #[test]
    fn test_element_constructor_matches_builder() {
        let mut attrs = IndexMap::new();
        attrs.insert("class".to_owned(), AttrValue::Plain(Value::from("x")));
        let direct = VNode::element("div", attrs, vec![VNode::text("hi")]);
        let built: VNode = VElement::new("div").attr("class", "x").child("hi").into();
        assert_eq!(direct, built);
    }
}
