//! Component base and lifecycle.
//!
//! A component is a [`ComponentCore`] (props, state, named children, the
//! pending state queue) paired with a [`Behavior`], the set of lifecycle
//! hooks supplied by the application. The pair lives behind a shared
//! [`ComponentHandle`]; event callbacks created during render capture the
//! handle and feed state updates back through it.
//!
//! # Draw cycle
//!
//! The first `draw()` runs the mount sequence (`will_mount`, `render`,
//! `did_mount`). Every later `draw()` folds the queued state updates over
//! the current state, runs `will_update` with the pre-fold and folded
//! states, commits, renders, and runs `did_update`. State updates queued
//! through [`set_state`](ComponentHandle::set_state) never render
//! synchronously; they publish on the bus and the scheduler batches them.
//!
//! # Example
//!
//! ```
//! use lumen_ui::component::{Behavior, ComponentHandle, RenderCtx, StateUpdate};
//! use lumen_ui::events::EventBus;
//! use lumen_ui::state_map;
//! use lumen_ui::vdom::{VElement, VNode};
//!
//! struct Counter;
//!
//! impl Behavior for Counter {
//!     fn initial_state(&self, _props: &lumen_ui::types::StateMap) -> lumen_ui::types::StateMap {
//!         state_map! { "count" => 0 }
//!     }
//!
//!     fn render(&self, ctx: &RenderCtx<'_>) -> VNode {
//!         let count = ctx.state_value("count").cloned().unwrap();
//!         VElement::new("div")
//!             .on("click", ctx.handler(|handle, _event| {
//!                 handle.set_state(StateUpdate::new(|state| {
//!                     let count = state["count"].as_int().unwrap_or(0);
//!                     state_map! { "count" => count + 1 }
//!                 }));
//!             }))
//!             .child(count)
//!             .into()
//!     }
//! }
//!
//! let counter = ComponentHandle::new(Counter, state_map! {}, EventBus::new());
//! let tree = counter.draw();
//! assert!(tree.as_element().is_some());
//! ```

use std::cell::RefCell;
use std::mem;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::events::{EventBus, STATE_CHANGE};
use crate::types::{Callback, NodeEvent, StateMap, Value, merge};
use crate::vdom::VNode;

// =============================================================================
// State Updates
// =============================================================================

/// A queued state transition: current state in, partial state out.
///
/// The partial result is shallow-merged into the running state when the
/// queue is folded at the next draw.
pub struct StateUpdate(Box<dyn FnOnce(&StateMap) -> StateMap>);

impl StateUpdate {
    /// Queue a function-shaped update.
    pub fn new(f: impl FnOnce(&StateMap) -> StateMap + 'static) -> Self {
        Self(Box::new(f))
    }

    fn apply(self, state: &StateMap) -> StateMap {
        (self.0)(state)
    }
}

impl From<StateMap> for StateUpdate {
    /// An object-shaped update is wrapped at call time into a function
    /// merging the mapping over the state it is given.
    fn from(partial: StateMap) -> Self {
        Self::new(move |state| {
            let mut merged = state.clone();
            merge(&mut merged, partial);
            merged
        })
    }
}

impl std::fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StateUpdate")
    }
}

// =============================================================================
// Behavior
// =============================================================================

/// Lifecycle hooks of a component.
///
/// Everything except `render` defaults to a no-op. `render` must be pure
/// with respect to props and state: it receives them read-only through the
/// [`RenderCtx`] and returns a fresh virtual tree.
pub trait Behavior: 'static {
    /// Props merged under the constructor-supplied props.
    fn default_props(&self) -> StateMap {
        StateMap::new()
    }

    /// State the component starts with, derived from the merged props.
    fn initial_state(&self, _props: &StateMap) -> StateMap {
        StateMap::new()
    }

    /// Mount phase, before the first render. The core gives access to the
    /// bus and lets the hook register child components.
    fn will_mount(&mut self, _core: &mut ComponentCore) {}

    /// Produce the virtual tree for the current props and state.
    fn render(&self, ctx: &RenderCtx<'_>) -> VNode;

    /// Mount phase, after the first render.
    fn did_mount(&mut self) {}

    /// Update phase, before render: pre-fold state and the folded result.
    fn will_update(&mut self, _props: &StateMap, _prev: &StateMap, _next: &StateMap) {}

    /// Update phase, after render, with the committed state.
    fn did_update(&mut self, _props: &StateMap, _state: &StateMap) {}

    /// Unmount phase, when the component is removed from its parent.
    fn will_unmount(&mut self) {}
}

// =============================================================================
// Component Core
// =============================================================================

/// The data half of a component: props, state, named children, and the
/// queue of pending state transitions.
pub struct ComponentCore {
    props: StateMap,
    state: StateMap,
    children: IndexMap<String, ComponentHandle>,
    state_queue: Vec<StateUpdate>,
    events: EventBus,
    has_rendered: bool,
    self_handle: Weak<RefCell<ComponentInner>>,
}

impl ComponentCore {
    /// Current props.
    pub fn props(&self) -> &StateMap {
        &self.props
    }

    /// Current committed state.
    pub fn state(&self) -> &StateMap {
        &self.state
    }

    /// The bus this component publishes state changes on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Handle to this component, usable from lifecycle hooks to build
    /// callbacks or hand a reference to children.
    pub fn handle(&self) -> ComponentHandle {
        ComponentHandle {
            inner: self
                .self_handle
                .upgrade()
                .expect("component core outlived its handle"),
        }
    }

    /// Queue a state transition and request a batched re-render.
    pub fn set_state(&mut self, update: impl Into<StateUpdate>) {
        self.state_queue.push(update.into());
        self.events.publish(STATE_CHANGE, None, &[]);
    }

    /// Register a named child component. Empty names are silently dropped
    /// so a heterogeneous collection can be passed without guarding.
    pub fn add_child(&mut self, name: impl Into<String>, child: ComponentHandle) {
        let name = name.into();
        if name.is_empty() {
            return;
        }
        self.children.insert(name, child);
    }

    /// Register every named child in order.
    pub fn add_children(
        &mut self,
        children: impl IntoIterator<Item = (String, ComponentHandle)>,
    ) {
        for (name, child) in children {
            self.add_child(name, child);
        }
    }

    /// Unmount and drop the named child: runs the child's `will_unmount`,
    /// then removes it from the child map. Unknown names are a no-op.
    pub fn remove_child(&mut self, name: &str) {
        if let Some(child) = self.children.shift_remove(name) {
            child.will_unmount();
        }
    }

    /// The named child, if registered.
    pub fn child(&self, name: &str) -> Option<ComponentHandle> {
        self.children.get(name).cloned()
    }
}

struct ComponentInner {
    core: ComponentCore,
    behavior: Box<dyn Behavior>,
}

// =============================================================================
// Render Context
// =============================================================================

/// Read-only view of a component handed to `render`.
pub struct RenderCtx<'a> {
    core: &'a ComponentCore,
}

impl RenderCtx<'_> {
    /// Current props.
    pub fn props(&self) -> &StateMap {
        self.core.props()
    }

    /// Current state.
    pub fn state(&self) -> &StateMap {
        self.core.state()
    }

    /// Single prop value.
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.core.props.get(key)
    }

    /// Single state value.
    pub fn state_value(&self, key: &str) -> Option<&Value> {
        self.core.state.get(key)
    }

    /// The named child component, for embedding `child.draw()` output.
    pub fn child(&self, name: &str) -> Option<ComponentHandle> {
        self.core.child(name)
    }

    /// Handle to the component being rendered.
    pub fn handle(&self) -> ComponentHandle {
        self.core.handle()
    }

    /// Event callback capturing the component handle.
    pub fn handler(
        &self,
        f: impl Fn(&ComponentHandle, &NodeEvent) + 'static,
    ) -> Callback {
        let handle = self.handle();
        Callback::new(move |event| f(&handle, event))
    }
}

// =============================================================================
// Component Handle
// =============================================================================

/// Shared reference to a live component instance.
///
/// Cloning is cheap; all clones address the same instance. Parents own
/// their children through the core's child map and are responsible for
/// unmounting them.
#[derive(Clone)]
pub struct ComponentHandle {
    inner: Rc<RefCell<ComponentInner>>,
}

impl ComponentHandle {
    /// Construct a component from its behavior, constructor props, and the
    /// bus it publishes state changes on.
    ///
    /// Props are the behavior's defaults shallow-merged under `props`;
    /// state starts as the behavior's initial state.
    pub fn new(behavior: impl Behavior, props: StateMap, events: EventBus) -> Self {
        let mut merged_props = behavior.default_props();
        merge(&mut merged_props, props);
        let state = behavior.initial_state(&merged_props);

        let inner = Rc::new_cyclic(|self_handle| {
            RefCell::new(ComponentInner {
                core: ComponentCore {
                    props: merged_props,
                    state,
                    children: IndexMap::new(),
                    state_queue: Vec::new(),
                    events,
                    has_rendered: false,
                    self_handle: self_handle.clone(),
                },
                behavior: Box::new(behavior),
            })
        });
        Self { inner }
    }

    /// One draw cycle: mount lifecycle on the first call, update lifecycle
    /// afterwards. Returns the fresh virtual tree.
    pub fn draw(&self) -> VNode {
        let mut guard = self.inner.borrow_mut();
        let ComponentInner { core, behavior } = &mut *guard;

        if !core.has_rendered {
            core.has_rendered = true;
            behavior.will_mount(core);
            let tree = behavior.render(&RenderCtx { core: &*core });
            behavior.did_mount();
            return tree;
        }

        // Fold the queue left-to-right over a copy of the current state:
        // each entry sees the state accumulated so far and its partial
        // result is merged back in.
        let mut next = core.state.clone();
        for entry in mem::take(&mut core.state_queue) {
            let partial = entry.apply(&next);
            merge(&mut next, partial);
        }

        behavior.will_update(&core.props, &core.state, &next);
        merge(&mut core.state, next);
        let tree = behavior.render(&RenderCtx { core: &*core });
        behavior.did_update(&core.props, &core.state);
        tree
    }

    /// Queue a state transition and request a batched re-render. Never
    /// renders synchronously.
    pub fn set_state(&self, update: impl Into<StateUpdate>) {
        let events = {
            let mut guard = self.inner.borrow_mut();
            guard.core.state_queue.push(update.into());
            guard.core.events.clone()
        };
        // Published after the borrow is released: a force-priority handler
        // on the same bus may re-enter this component.
        events.publish(STATE_CHANGE, None, &[]);
    }

    /// Request a synchronous-priority re-render regardless of the queue.
    pub fn force_update(&self) {
        let events = self.inner.borrow().core.events.clone();
        events.publish(STATE_CHANGE, None, &[Value::Bool(true)]);
    }

    /// Shallow-merge new props in place: a parent pushing props into a
    /// live child without reconstructing it.
    pub fn update_props(&self, partial: StateMap) {
        merge(&mut self.inner.borrow_mut().core.props, partial);
    }

    /// Register a named child component.
    pub fn add_child(&self, name: impl Into<String>, child: ComponentHandle) {
        self.inner.borrow_mut().core.add_child(name, child);
    }

    /// Register every named child in order.
    pub fn add_children(&self, children: impl IntoIterator<Item = (String, ComponentHandle)>) {
        self.inner.borrow_mut().core.add_children(children);
    }

    /// Unmount and drop the named child.
    pub fn remove_child(&self, name: &str) {
        self.inner.borrow_mut().core.remove_child(name);
    }

    /// The named child, if registered.
    pub fn child(&self, name: &str) -> Option<ComponentHandle> {
        self.inner.borrow().core.child(name)
    }

    /// Snapshot of the current props.
    pub fn props(&self) -> StateMap {
        self.inner.borrow().core.props.clone()
    }

    /// Snapshot of the committed state.
    pub fn state(&self) -> StateMap {
        self.inner.borrow().core.state.clone()
    }

    fn will_unmount(&self) {
        self.inner.borrow_mut().behavior.will_unmount();
    }

    /// Depth-first `will_unmount` over this component and its children.
    /// Used by the scheduler when tearing a mount down.
    pub(crate) fn unmount_cascade(&self) {
        let children: Vec<ComponentHandle> = self
            .inner
            .borrow()
            .core
            .children
            .values()
            .cloned()
            .collect();
        for child in children {
            child.unmount_cascade();
        }
        self.will_unmount();
    }
}

impl std::fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ComponentHandle")
    }
}

// =============================================================================
// Tests
// =============================================================================
