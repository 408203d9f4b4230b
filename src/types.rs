//! Core types for lumen-ui.
//!
//! These types define the foundation that everything builds on.
//! They flow through components, the virtual tree, and the renderer.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

// =============================================================================
// Node Handles
// =============================================================================

/// Opaque handle to a node in a concrete tree.
///
/// Backends hand these out from their create calls and accept them back in
/// every mutation call. A handle is only meaningful to the backend that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Raw index value, mainly useful for logging.
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An event delivered to a listener installed on a concrete node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEvent {
    /// Listener kind that fired (e.g. "click").
    pub kind: String,
    /// The node the listener was installed on.
    pub target: NodeId,
}

impl NodeEvent {
    /// Create an event of the given kind targeting `node`.
    pub fn new(kind: impl Into<String>, target: NodeId) -> Self {
        Self {
            kind: kind.into(),
            target,
        }
    }
}

// =============================================================================
// Callbacks
// =============================================================================

/// Shared handler invoked with a [`NodeEvent`].
///
/// Callbacks compare by allocation identity: two clones of the same
/// callback are equal, two separately created callbacks never are, even when
/// they run the same code. The diff engine relies on this to decide whether
/// a listener needs to be re-installed.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&NodeEvent)>);

impl Callback {
    /// Wrap a closure as a shared callback.
    pub fn new(f: impl Fn(&NodeEvent) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, event: &NodeEvent) {
        (self.0)(event);
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

// =============================================================================
// Values
// =============================================================================

/// Dynamic value stored in props, state, attributes and text leaves.
///
/// `Display` gives the rendered form used for text nodes and attribute
/// values: integers and floats print their shortest form, booleans print
/// `true`/`false`, strings print verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Handler passed through props so a parent can hand behavior to a
    /// child (e.g. a button's select callback).
    Callback(Callback),
}

impl Value {
    /// String payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float payload, if this is a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Callback payload, if this is a callback.
    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Self::Callback(cb) => Some(cb),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Callback(_) => f.write_str("[callback]"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Callback> for Value {
    fn from(cb: Callback) -> Self {
        Self::Callback(cb)
    }
}

// =============================================================================
// State Maps
// =============================================================================

/// Ordered string-keyed value map used for props and state.
///
/// Insertion order is preserved; the diff engine's attribute ordering and
/// the state-commit semantics both depend on it.
pub type StateMap = IndexMap<String, Value>;

/// Shallow merge: every pair of `partial` is inserted over `base`.
///
/// Existing keys keep their position and take the new value; new keys are
/// appended.
pub fn merge(base: &mut StateMap, partial: StateMap) {
    for (key, value) in partial {
        base.insert(key, value);
    }
}

/// Build a [`StateMap`] from `key => value` pairs.
///
/// ```
/// use lumen_ui::state_map;
///
/// let state = state_map! { "count" => 0, "label" => "Counter" };
/// assert_eq!(state.len(), 2);
/// ```
#[macro_export]
macro_rules! state_map {
    () => { $crate::types::StateMap::new() };
    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let mut map = $crate::types::StateMap::new();
        $( map.insert(::std::string::String::from($key), $crate::types::Value::from($value)); )+
        map
    }};
}

// =============================================================================
// Tests
// =============================================================================
