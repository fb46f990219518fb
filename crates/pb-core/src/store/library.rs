//! Store for the block-type catalog.
//!
//! The catalog is fetched over HTTP rather than streamed per-topic, so a
//! graph reset leaves it intact; only a fresh `LibraryLoaded` replaces it.

use crate::event::Event;
use crate::model::LibraryEntry;
use crate::observe::{ListenerSet, Observable};
use std::cell::RefCell;

pub struct LibraryStore {
    entries: RefCell<Vec<LibraryEntry>>,
    changed: ListenerSet,
}

impl LibraryStore {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            changed: ListenerSet::new(),
        }
    }

    pub fn entries(&self) -> Vec<LibraryEntry> {
        self.entries.borrow().clone()
    }

    pub fn get(&self, type_tag: &str) -> Option<LibraryEntry> {
        self.entries
            .borrow()
            .iter()
            .find(|e| e.type_tag == type_tag)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn apply(&self, event: &Event) {
        if let Event::LibraryLoaded(entries) = event {
            *self.entries.borrow_mut() = entries.clone();
            self.changed.notify();
        }
    }
}

impl Default for LibraryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for LibraryStore {
    fn listeners(&self) -> &ListenerSet {
        &self.changed
    }
}
