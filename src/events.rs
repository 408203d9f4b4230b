//! Publisher/subscriber event bus.
//!
//! Named-channel dispatcher used to wire components to the render scheduler.
//! One bus instance is created per mount and handed to every component in
//! that tree; components publish on [`STATE_CHANGE`] to request a re-render.
//!
//! Handlers are invoked synchronously, in subscription order, against a
//! snapshot of the channel taken at publish time, so a handler may
//! subscribe or unsubscribe without disturbing the in-flight publish.
//! A panicking handler is isolated: the panic is logged and the remaining
//! handlers still run.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use tracing::{error, trace};

use crate::types::Value;

/// Channel the render scheduler listens on.
pub const STATE_CHANGE: &str = "stateChange";

/// One delivery to a bus handler.
///
/// Carries the channel name, an optional caller-supplied context (handlers
/// that need it downcast via [`Any`]), and the positional arguments.
pub struct Publish<'a> {
    pub channel: &'a str,
    pub context: Option<&'a dyn Any>,
    pub args: &'a [Value],
}

impl Publish<'_> {
    /// Positional argument, if present.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Boolean argument; absent or non-boolean reads as `false`.
    pub fn flag(&self, index: usize) -> bool {
        self.arg(index).and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Handler registered on a bus channel.
///
/// Removal is by allocation identity: pass a clone of the subscribed `Rc`
/// to [`EventBus::unsubscribe`].
pub type BusHandler = Rc<dyn Fn(&Publish<'_>)>;

// =============================================================================
// Event Bus
// =============================================================================

/// Named-channel publisher/subscriber dispatcher.
///
/// Cloning produces another handle to the same registry, so the bus can be
/// handed to every component of a mounted tree.
#[derive(Clone, Default)]
pub struct EventBus {
    channels: Rc<RefCell<HashMap<String, Vec<BusHandler>>>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to channel `name`, creating the channel if absent.
    ///
    /// An empty channel name is silently ignored, so subscribing is
    /// unconditionally safe from any lifecycle hook. Handlers are not
    /// deduplicated: subscribing the same handler twice yields two
    /// invocations per publish.
    pub fn subscribe(&self, name: &str, handler: BusHandler) {
        if name.is_empty() {
            return;
        }
        self.channels
            .borrow_mut()
            .entry(name.to_owned())
            .or_default()
            .push(handler);
    }

    /// Remove `handler` from channel `name`.
    ///
    /// A channel whose last handler is removed is deleted entirely. Unknown
    /// channels and handlers are a no-op.
    pub fn unsubscribe(&self, name: &str, handler: &BusHandler) {
        let mut channels = self.channels.borrow_mut();
        let Some(handlers) = channels.get_mut(name) else {
            return;
        };
        handlers.retain(|h| !Rc::ptr_eq(h, handler));
        if handlers.is_empty() {
            channels.remove(name);
        }
    }

    /// Invoke every handler registered on `name` at call time, in
    /// subscription order, passing `context` and `args`.
    ///
    /// Unknown channels are a no-op. Each invocation is isolated: a
    /// panicking handler is logged and does not prevent the handlers after
    /// it from running.
    pub fn publish(&self, name: &str, context: Option<&dyn Any>, args: &[Value]) {
        let handlers: Vec<BusHandler> = match self.channels.borrow().get(name) {
            Some(handlers) => handlers.clone(),
            None => return,
        };
        trace!(channel = name, handlers = handlers.len(), "publish");

        let publish = Publish {
            channel: name,
            context,
            args,
        };
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(&publish))).is_err() {
                error!(channel = name, "bus handler panicked; continuing");
            }
        }
    }

    /// Number of handlers currently registered on `name`.
    pub fn handler_count(&self, name: &str) -> usize {
        self.channels
            .borrow()
            .get(name)
            .map_or(0, Vec::len)
    }

    /// Whether a channel entry exists for `name`.
    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.borrow().contains_key(name)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting_handler(hits: &Rc<Cell<u32>>) -> BusHandler {
        let hits = hits.clone();
        Rc::new(move |_publish| hits.set(hits.get() + 1))
    }

    #[test]
    fn test_double_subscribe_runs_twice() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let handler = counting_handler(&hits);

        bus.subscribe("x", handler.clone());
        bus.subscribe("x", handler);
        bus.publish("x", None, &[]);

        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_unsubscribe_last_handler_removes_channel() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let handler = counting_handler(&hits);

        bus.subscribe("x", handler.clone());
        assert!(bus.has_channel("x"));

        bus.unsubscribe("x", &handler);
        assert!(!bus.has_channel("x"));

        // Publishing the now-unknown channel is a safe no-op.
        bus.publish("x", None, &[]);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let bus = EventBus::new();
        let handler: BusHandler = Rc::new(|_| {});
        bus.unsubscribe("missing", &handler);

        bus.subscribe("x", Rc::new(|_| {}));
        bus.unsubscribe("x", &handler);
        assert_eq!(bus.handler_count("x"), 1);
    }

    #[test]
    fn test_empty_channel_name_ignored() {
        let bus = EventBus::new();
        bus.subscribe("", Rc::new(|_| {}));
        assert!(!bus.has_channel(""));
    }

    #[test]
    fn test_publish_order_and_args() {
        let bus = EventBus::new();
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = seen.clone();
            bus.subscribe(
                "x",
                Rc::new(move |publish| {
                    let arg = publish.arg(0).cloned().unwrap();
                    seen.borrow_mut().push(format!("{tag}:{arg}"));
                }),
            );
        }
        bus.publish("x", None, &[Value::from(7)]);

        assert_eq!(*seen.borrow(), ["first:7", "second:7"]);
    }

    #[test]
    fn test_publish_isolates_panicking_handler() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        bus.subscribe("x", Rc::new(|_| panic!("handler failure")));
        bus.subscribe("x", counting_handler(&hits));
        bus.publish("x", None, &[]);

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_subscribe_during_publish_misses_inflight_batch() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let late = counting_handler(&hits);

        let bus_inner = bus.clone();
        bus.subscribe(
            "x",
            Rc::new(move |_| bus_inner.subscribe("x", late.clone())),
        );
        bus.publish("x", None, &[]);
        assert_eq!(hits.get(), 0);

        bus.publish("x", None, &[]);
        assert!(hits.get() >= 1);
    }

    #[test]
    fn test_context_is_delivered() {
        let bus = EventBus::new();
        let seen = Rc::new(Cell::new(0i64));
        let seen_inner = seen.clone();

        bus.subscribe(
            "x",
            Rc::new(move |publish| {
                let ctx = publish.context.and_then(|c| c.downcast_ref::<i64>());
                seen_inner.set(ctx.copied().unwrap_or(-1));
            }),
        );

        let context: i64 = 42;
        bus.publish("x", Some(&context), &[]);
        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn test_flag_defaults_false() {
        let publish = Publish {
            channel: "x",
            context: None,
            args: &[],
        };
        assert!(!publish.flag(0));

        let args = [Value::from(true)];
        let publish = Publish {
            channel: "x",
            context: None,
            args: &args,
        };
        assert!(publish.flag(0));
    }
}
