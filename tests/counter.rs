//! End-to-end counter scenario.
//!
//! A counter root composes two select-button child components wired to
//! increment and decrement through callback props. Click events dispatched
//! in one synchronous batch must collapse into a single re-render.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;

use lumen_ui::component::{Behavior, ComponentCore, ComponentHandle, RenderCtx, StateUpdate};
use lumen_ui::pipeline::{MountHandle, SharedTree, mount};
use lumen_ui::renderer::{MemoryTree, TreeBackend};
use lumen_ui::state_map;
use lumen_ui::types::{Callback, NodeId, StateMap, Value};
use lumen_ui::vdom::{RefCallback, VElement, VNode};

/// Toggleable button that reports clicks through its `onSelect` prop.
struct SelectButton {
    /// Concrete node of the rendered button, captured through the
    /// reference callback so the test can dispatch events at it.
    node: Rc<Cell<Option<NodeId>>>,
}

impl Behavior for SelectButton {
    fn default_props(&self) -> StateMap {
        state_map! {
            "size" => "small",
            "kind" => "primary",
            "display" => "--",
            "isSelected" => false,
        }
    }

    fn initial_state(&self, props: &StateMap) -> StateMap {
        let selected = props["isSelected"].as_bool().unwrap_or(false);
        state_map! { "isSelected" => selected }
    }

    fn render(&self, ctx: &RenderCtx<'_>) -> VNode {
        let kind = ctx.prop("kind").cloned().unwrap();
        let size = ctx.prop("size").cloned().unwrap();
        let display = ctx.prop("display").cloned().unwrap();
        let selected = ctx
            .state_value("isSelected")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let mut class = format!("select-button select-button-kind-{kind} select-button-size-{size}");
        if selected {
            class.push_str(" select-button-selected");
        }

        let node = self.node.clone();
        VElement::new("button")
            .attr("class", class)
            .attr("aria-selected", selected)
            .on(
                "click",
                ctx.handler(|handle, event| {
                    handle.set_state(StateUpdate::new(|state| {
                        let selected = state["isSelected"].as_bool().unwrap_or(false);
                        state_map! { "isSelected" => !selected }
                    }));
                    if let Some(on_select) =
                        handle.props().get("onSelect").and_then(Value::as_callback)
                    {
                        on_select.call(event);
                    }
                }),
            )
            .node_ref(RefCallback::new(move |id| node.set(Some(id))))
            .child(display)
            .into()
    }
}

/// Counter root: a label plus an increment and a decrement button.
struct CounterApp {
    renders: Rc<Cell<u32>>,
    increment_node: Rc<Cell<Option<NodeId>>>,
    decrement_node: Rc<Cell<Option<NodeId>>>,
}

impl CounterApp {
    fn new() -> Self {
        Self {
            renders: Rc::default(),
            increment_node: Rc::default(),
            decrement_node: Rc::default(),
        }
    }
}

impl Behavior for CounterApp {
    fn initial_state(&self, _props: &StateMap) -> StateMap {
        state_map! { "count" => 0 }
    }

    fn will_mount(&mut self, core: &mut ComponentCore) {
        let events = core.events().clone();
        let step_callback = |handle: ComponentHandle, step: i64| {
            Callback::new(move |_event| {
                handle.set_state(StateUpdate::new(move |state| {
                    let count = state["count"].as_int().unwrap_or(0);
                    state_map! { "count" => count + step }
                }));
            })
        };
        let increment = step_callback(core.handle(), 1);
        let decrement = step_callback(core.handle(), -1);

        core.add_children([
            (
                "incrementButton".to_owned(),
                ComponentHandle::new(
                    SelectButton {
                        node: self.increment_node.clone(),
                    },
                    state_map! { "display" => "Increment", "onSelect" => increment },
                    events.clone(),
                ),
            ),
            (
                "decrementButton".to_owned(),
                ComponentHandle::new(
                    SelectButton {
                        node: self.decrement_node.clone(),
                    },
                    state_map! {
                        "display" => "Decrement",
                        "kind" => "secondary",
                        "onSelect" => decrement,
                    },
                    events,
                ),
            ),
        ]);
    }

    fn render(&self, ctx: &RenderCtx<'_>) -> VNode {
        self.renders.set(self.renders.get() + 1);
        let count = ctx.state_value("count").cloned().unwrap();

        VElement::new("div")
            .attr("class", "container")
            .child(
                VElement::new("header")
                    .attr("class", "header")
                    .child(VElement::new("h1").child("Counter")),
            )
            .child(
                VElement::new("main")
                    .attr("class", "body")
                    .child(
                        VElement::new("div")
                            .attr("class", "button-wrapper")
                            .child(ctx.child("incrementButton").unwrap().draw()),
                    )
                    .child(VElement::new("div").attr("class", "label").child(count))
                    .child(
                        VElement::new("div")
                            .attr("class", "button-wrapper")
                            .child(ctx.child("decrementButton").unwrap().draw()),
                    ),
            )
            .child(VElement::new("footer").attr("class", "footer"))
            .into()
    }
}

fn mount_counter() -> (
    Rc<RefCell<MemoryTree>>,
    MountHandle,
    Rc<Cell<u32>>,
    NodeId,
    NodeId,
) {
    let tree = Rc::new(RefCell::new(MemoryTree::new()));
    let root = tree.borrow_mut().create_element("root");
    let shared: SharedTree = tree.clone();

    let app = CounterApp::new();
    let renders = app.renders.clone();
    let increment = app.increment_node.clone();
    let decrement = app.decrement_node.clone();

    let handle = mount(app, shared, root, None).expect("mount succeeds");
    let increment = increment.get().expect("increment button materialized");
    let decrement = decrement.get().expect("decrement button materialized");
    (tree, handle, renders, increment, decrement)
}

fn label_text(tree: &Rc<RefCell<MemoryTree>>, handle: &MountHandle) -> String {
    let tree = tree.borrow();
    let label = tree
        .find_by_attr(handle.node(), "class", "label")
        .expect("label present");
    tree.text_content(label)
}

#[test]
fn batched_clicks_render_once() {
    let (tree, handle, renders, increment, decrement) = mount_counter();
    assert_eq!(renders.get(), 1);
    assert_eq!(label_text(&tree, &handle), "0");

    // Three increments and one decrement in the same synchronous batch.
    for _ in 0..3 {
        assert!(MemoryTree::dispatch(&tree, increment, "click"));
    }
    assert!(MemoryTree::dispatch(&tree, decrement, "click"));

    // Nothing re-rendered until the deferred re-render fires.
    assert_eq!(renders.get(), 1);
    assert_eq!(label_text(&tree, &handle), "0");

    assert!(handle.flush());

    assert_eq!(label_text(&tree, &handle), "2");
    assert_eq!(renders.get(), 2);
}

#[test]
fn child_state_commits_in_same_batch() {
    let (tree, handle, _renders, increment, _decrement) = mount_counter();

    // Odd number of clicks leaves the toggleable button selected.
    for _ in 0..3 {
        MemoryTree::dispatch(&tree, increment, "click");
    }
    handle.flush();

    let tree_ref = tree.borrow();
    assert_eq!(tree_ref.attr(increment, "aria-selected"), Some("true"));
    assert!(
        tree_ref
            .attr(increment, "class")
            .unwrap()
            .contains("select-button-selected")
    );
}

#[test]
fn buttons_carry_their_props() {
    let (tree, _handle, _renders, increment, decrement) = mount_counter();
    let tree = tree.borrow();

    assert_eq!(tree.text_content(increment), "Increment");
    assert_eq!(tree.text_content(decrement), "Decrement");
    assert!(
        tree.attr(decrement, "class")
            .unwrap()
            .contains("select-button-kind-secondary")
    );
    assert_eq!(tree.attr(increment, "aria-selected"), Some("false"));
}

#[test]
fn unmount_tears_the_tree_down() {
    let (tree, handle, _renders, _increment, _decrement) = mount_counter();
    let mounted = handle.node();
    let root_component = handle.root();

    handle.unmount();

    assert!(!tree.borrow().contains(mounted));
    // Further state changes are harmless after teardown.
    root_component.set_state(state_map! { "count" => 99 });
}
