//! Store for the list of top-level groups available for navigation.
//!
//! Unlike the canvas stores this one is a membership list, so its
//! notifications are store-level only, and create/delete arrive as
//! batches.

use crate::error::ProtocolViolation;
use crate::event::Event;
use crate::id::EntityId;
use crate::model::RootGroupEntry;
use crate::observe::{ListenerSet, Observable};
use std::cell::RefCell;

pub struct RootGroupStore {
    groups: RefCell<Vec<RootGroupEntry>>,
    changed: ListenerSet,
}

impl RootGroupStore {
    pub fn new() -> Self {
        Self {
            groups: RefCell::new(Vec::new()),
            changed: ListenerSet::new(),
        }
    }

    /// The current list, in server-delivery order.
    pub fn groups(&self) -> Vec<RootGroupEntry> {
        self.groups.borrow().clone()
    }

    pub fn get(&self, id: EntityId) -> Option<RootGroupEntry> {
        self.groups.borrow().iter().find(|g| g.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.groups.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.borrow().is_empty()
    }

    pub fn apply(&self, event: &Event) {
        match event {
            Event::RootGroupCreate(entries) => self.create(entries),
            Event::RootGroupDelete(ids) => self.delete(ids),
            Event::ResetGraph => {
                self.groups.borrow_mut().clear();
                self.changed.notify();
            }
            _ => {}
        }
    }

    fn create(&self, entries: &[RootGroupEntry]) {
        {
            let mut groups = self.groups.borrow_mut();
            for entry in entries {
                if groups.iter().any(|g| g.id == entry.id) {
                    log::warn!(
                        "{}",
                        ProtocolViolation::DuplicateCreate {
                            kind: "root group",
                            id: entry.id.to_string(),
                        }
                    );
                    continue;
                }
                groups.push(entry.clone());
            }
        }
        self.changed.notify();
    }

    fn delete(&self, ids: &[EntityId]) {
        {
            let mut groups = self.groups.borrow_mut();
            for id in ids {
                let before = groups.len();
                groups.retain(|g| g.id != *id);
                if groups.len() == before {
                    log::warn!(
                        "{}",
                        ProtocolViolation::DeleteUnknown {
                            kind: "root group",
                            id: id.to_string(),
                        }
                    );
                }
            }
        }
        self.changed.notify();
    }
}

impl Default for RootGroupStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for RootGroupStore {
    fn listeners(&self) -> &ListenerSet {
        &self.changed
    }
}
