//! # lumen-ui
//!
//! Minimal component framework with a virtual-tree diff renderer.
//!
//! Components produce immutable virtual trees; the renderer diffs
//! consecutive trees into composable patch functions and applies them to a
//! concrete tree behind the [`renderer::TreeBackend`] capability trait.
//! State changes flow through a per-mount publisher/subscriber bus and are
//! batched: any number of `set_state` calls in one turn collapse into a
//! single re-render at the next [`pipeline::MountHandle::flush`].
//!
//! ## Architecture
//!
//! ```text
//! Behavior::render → VNode tree → diff(old, new) → Patch → TreeBackend
//!        ▲                                                      │
//!        └── set_state → EventBus "stateChange" → scheduler ◄───┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - dynamic values, state maps, node handles, callbacks
//! - [`vdom`] - the virtual node model
//! - [`events`] - the publisher/subscriber bus
//! - [`renderer`] - backend trait, materialization, diff/patch engine
//! - [`component`] - component base, lifecycle hooks, state queue
//! - [`pipeline`] - mount API and the batching render scheduler
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use lumen_ui::component::{Behavior, RenderCtx, StateUpdate};
//! use lumen_ui::pipeline::{SharedTree, mount};
//! use lumen_ui::renderer::{MemoryTree, TreeBackend};
//! use lumen_ui::state_map;
//! use lumen_ui::types::StateMap;
//! use lumen_ui::vdom::{VElement, VNode};
//!
//! struct Counter;
//!
//! impl Behavior for Counter {
//!     fn initial_state(&self, _props: &StateMap) -> StateMap {
//!         state_map! { "count" => 0 }
//!     }
//!
//!     fn render(&self, ctx: &RenderCtx<'_>) -> VNode {
//!         let count = ctx.state_value("count").cloned().unwrap();
//!         VElement::new("div")
//!             .child(VElement::new("button")
//!                 .on("click", ctx.handler(|handle, _event| {
//!                     handle.set_state(StateUpdate::new(|state| {
//!                         let count = state["count"].as_int().unwrap_or(0);
//!                         state_map! { "count" => count + 1 }
//!                     }));
//!                 }))
//!                 .child("+"))
//!             .child(VElement::new("span").attr("class", "label").child(count))
//!             .into()
//!     }
//! }
//!
//! let tree = Rc::new(RefCell::new(MemoryTree::new()));
//! let root = tree.borrow_mut().create_element("root");
//! let shared: SharedTree = tree.clone();
//!
//! let handle = mount(Counter, shared, root, None).unwrap();
//! let label = tree.borrow().find_by_attr(handle.node(), "class", "label").unwrap();
//! assert_eq!(tree.borrow().text_content(label), "0");
//!
//! // Click twice in one turn; flush applies one batched re-render.
//! let button = tree.borrow().child_nodes(handle.node())[0];
//! MemoryTree::dispatch(&tree, button, "click");
//! MemoryTree::dispatch(&tree, button, "click");
//! handle.flush();
//!
//! let label = tree.borrow().find_by_attr(handle.node(), "class", "label").unwrap();
//! assert_eq!(tree.borrow().text_content(label), "2");
//! ```

pub mod component;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod renderer;
pub mod types;
pub mod vdom;

// Re-export the everyday surface.
pub use component::{Behavior, ComponentCore, ComponentHandle, RenderCtx, StateUpdate};
pub use error::MountError;
pub use events::{EventBus, Publish, STATE_CHANGE};
pub use pipeline::{MountHandle, SharedTree, mount};
pub use renderer::{MemoryTree, Patch, TreeBackend, diff, materialize};
pub use types::{Callback, NodeEvent, NodeId, StateMap, Value, merge};
pub use vdom::{AttrValue, RefCallback, VElement, VNode};
