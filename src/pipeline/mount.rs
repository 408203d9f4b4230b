//! Mount API - root wiring and the render scheduler.
//!
//! [`mount`] binds one root component to one node of a concrete tree. Each
//! call constructs its own bus and its own scheduler, so any number of
//! roots can be mounted independently, with no shared global state.
//!
//! # Batching
//!
//! `set_state` publishes on the [`STATE_CHANGE`] channel without a priority
//! flag; the scheduler only marks a re-render as pending. However many
//! components publish within the same turn, the mark is set once and the
//! next [`MountHandle::flush`] performs exactly one draw/diff/patch pass.
//! `force_update` publishes the priority flag and re-renders synchronously,
//! bypassing the pending mark.
//!
//! # Example
//!
//! ```ignore
//! use lumen_ui::pipeline::mount;
//!
//! let handle = mount(App, tree.clone(), root, None)?;
//!
//! // Host event loop: dispatch input, then flush once per turn.
//! loop {
//!     dispatch_host_events(&tree);
//!     handle.flush();
//! }
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::component::{Behavior, ComponentHandle};
use crate::error::MountError;
use crate::events::{BusHandler, EventBus, STATE_CHANGE};
use crate::renderer::backend::TreeBackend;
use crate::renderer::diff::diff;
use crate::renderer::materialize::materialize;
use crate::types::{NodeId, StateMap};
use crate::vdom::VNode;

/// Shared handle to a concrete tree, as accepted by [`mount`].
pub type SharedTree = Rc<RefCell<dyn TreeBackend>>;

/// Callback invoked once with the materialized root node.
pub type MountCallback = Box<dyn FnOnce(NodeId)>;

// =============================================================================
// Scheduler
// =============================================================================

/// Per-mount render state: the root component, the concrete tree, the last
/// committed virtual tree, the mounted node, and the pending mark.
struct Scheduler {
    root: ComponentHandle,
    tree: SharedTree,
    current: VNode,
    mounted: NodeId,
    pending: bool,
}

impl Scheduler {
    /// One draw/diff/patch pass against the committed tree.
    fn rerender(&mut self) {
        let next = self.root.draw();
        let patch = diff(&self.current, Some(&next));
        let applied = patch.apply(&mut *self.tree.borrow_mut(), self.mounted);
        if let Some(node) = applied {
            self.mounted = node;
        }
        self.current = next;
        trace!(mounted = %self.mounted, "re-render applied");
    }
}

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle returned by [`mount`].
///
/// Holds the scheduler and the bus subscription. The host drives batching
/// through [`flush`](Self::flush) and tears the mount down through
/// [`unmount`](Self::unmount).
pub struct MountHandle {
    scheduler: Rc<RefCell<Scheduler>>,
    events: EventBus,
    subscription: BusHandler,
}

impl MountHandle {
    /// Run the pending batched re-render, if any.
    ///
    /// Call when the turn's synchronous work is done; this is the firing
    /// point of the zero-delay debounce: all `set_state` calls issued since
    /// the last flush collapse into the single re-render performed here.
    /// Returns whether a re-render ran.
    pub fn flush(&self) -> bool {
        let mut scheduler = self.scheduler.borrow_mut();
        if !scheduler.pending {
            return false;
        }
        scheduler.pending = false;
        debug!("flushing batched re-render");
        scheduler.rerender();
        true
    }

    /// The concrete node currently occupied by the root component's tree.
    pub fn node(&self) -> NodeId {
        self.scheduler.borrow().mounted
    }

    /// The root component instance.
    pub fn root(&self) -> ComponentHandle {
        self.scheduler.borrow().root.clone()
    }

    /// The bus this mount's components publish on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Tear the mount down: unsubscribe from the bus, run `will_unmount`
    /// depth-first over the component tree, and remove the mounted node.
    pub fn unmount(self) {
        self.events.unsubscribe(STATE_CHANGE, &self.subscription);
        let (root, tree, mounted) = {
            let scheduler = self.scheduler.borrow();
            (
                scheduler.root.clone(),
                scheduler.tree.clone(),
                scheduler.mounted,
            )
        };
        root.unmount_cascade();
        tree.borrow_mut().remove_node(mounted);
        debug!(mounted = %mounted, "unmounted");
    }
}

// =============================================================================
// Mount
// =============================================================================

/// Mount `behavior` as the root component under `root`.
///
/// Validates the target, constructs the mount's bus and root component,
/// draws and materializes the initial tree, appends it under `root`, and
/// invokes `on_mounted` with the materialized node. Then subscribes the
/// scheduler on [`STATE_CHANGE`]: the priority flag re-renders immediately,
/// anything else sets the pending mark consumed by
/// [`MountHandle::flush`].
///
/// # Errors
///
/// [`MountError::UnknownRoot`] when `root` is not a live node of `tree`;
/// [`MountError::RootNotElement`] when it cannot hold children.
pub fn mount(
    behavior: impl Behavior,
    tree: SharedTree,
    root: NodeId,
    on_mounted: Option<MountCallback>,
) -> Result<MountHandle, MountError> {
    {
        let target = tree.borrow();
        if !target.contains(root) {
            return Err(MountError::UnknownRoot(root));
        }
        if !target.is_element(root) {
            return Err(MountError::RootNotElement(root));
        }
    }

    let events = EventBus::new();
    let component = ComponentHandle::new(behavior, StateMap::new(), events.clone());

    let current = component.draw();
    let mounted = {
        let mut target = tree.borrow_mut();
        let node = materialize(&mut *target, &current);
        target.append_child(root, node);
        node
    };
    debug!(root = %root, mounted = %mounted, "mounted root component");
    if let Some(callback) = on_mounted {
        callback(mounted);
    }

    let scheduler = Rc::new(RefCell::new(Scheduler {
        root: component,
        tree,
        current,
        mounted,
        pending: false,
    }));

    // The subscription holds the scheduler weakly: dropping the handle ends
    // the mount and later publishes fall through harmlessly.
    let weak: Weak<RefCell<Scheduler>> = Rc::downgrade(&scheduler);
    let subscription: BusHandler = Rc::new(move |publish| {
        let Some(scheduler) = weak.upgrade() else {
            return;
        };
        let mut scheduler = scheduler.borrow_mut();
        if publish.flag(0) {
            scheduler.pending = false;
            scheduler.rerender();
        } else {
            scheduler.pending = true;
        }
    });
    events.subscribe(STATE_CHANGE, subscription.clone());

    Ok(MountHandle {
        scheduler,
        events,
        subscription,
    })
}

// =============================================================================
// Tests
// =============================================================================
