//! Change-notification capability for stores and entities.
//!
//! A [`ListenerSet`] is the generic observable piece every store owns by
//! composition: callbacks registered with no payload, notified after any
//! mutation that changed observable state. Listeners re-fetch from the
//! store; the notification itself carries nothing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle for removing a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Callback = Rc<dyn Fn()>;

#[derive(Default)]
pub struct ListenerSet {
    listeners: RefCell<Vec<(u64, Callback)>>,
    next_id: Cell<u64>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, callback: impl Fn() + 'static) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(callback)));
        ListenerId(id)
    }

    pub fn remove(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(lid, _)| *lid != id.0);
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Invoke every listener. Iterates a snapshot, so a listener may
    /// remove itself (or add others) while being notified.
    pub fn notify(&self) {
        let snapshot: Vec<Callback> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in snapshot {
            callback();
        }
    }
}

/// Implemented by every store: coarse-grained change notification at the
/// store level. Fine-grained (per-entity) listeners are store-specific.
pub trait Observable {
    fn listeners(&self) -> &ListenerSet;

    fn add_listener(&self, callback: impl Fn() + 'static) -> ListenerId {
        self.listeners().add(callback)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners().remove(id)
    }
}
