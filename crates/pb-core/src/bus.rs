//! Synchronous, single-threaded publish/subscribe hub.
//!
//! `dispatch` invokes every registered handler in registration order,
//! passing the same event, and runs to completion before returning —
//! the bus is the total order over the event stream. Handlers must not
//! dispatch again while a dispatch is in progress: re-entrancy would let
//! a handler observe a store mid-update, so it aborts loudly instead of
//! queueing.

use crate::event::Event;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by [`EventBus::register`]; pass back to `unregister`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

type Handler = Rc<dyn Fn(&Event)>;

pub struct EventBus {
    handlers: RefCell<Vec<(u64, Handler)>>,
    next_id: Cell<u64>,
    dispatching: Cell<bool>,
}

/// Clears the dispatch flag even when a handler panics, so the bus stays
/// usable (and strictly ordered) for whoever catches the unwind.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            dispatching: Cell::new(false),
        }
    }

    /// Register a handler. Handlers registered while a dispatch is running
    /// take effect from the next dispatch.
    pub fn register(&self, handler: impl Fn(&Event) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        Subscription(id)
    }

    pub fn unregister(&self, sub: Subscription) {
        self.handlers.borrow_mut().retain(|(id, _)| *id != sub.0);
    }

    /// Deliver `event` to every currently registered handler, in
    /// registration order, synchronously.
    ///
    /// # Panics
    ///
    /// Panics if called from within a handler that is itself running
    /// inside `dispatch` — re-entrant dispatch is a programming error
    /// that would break the ordering invariant.
    pub fn dispatch(&self, event: &Event) {
        if self.dispatching.replace(true) {
            panic!("ReentrantDispatchError: dispatch called while a dispatch is in progress");
        }
        let _guard = DispatchGuard(&self.dispatching);

        // Snapshot so handlers may register/unregister without holding
        // the borrow across their execution.
        let snapshot: Vec<Handler> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in snapshot {
            handler(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
