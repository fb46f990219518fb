//! Store for routes (the typed ports on blocks, groups, and sources).
//!
//! `value` and `blocked` are distinct channels: value updates arrive as
//! `update_value` and derive the route's `active` flag, while `blocked`
//! arrives as `update_status` and reports upstream back-pressure.

use crate::error::ProtocolViolation;
use crate::event::Event;
use crate::id::EntityId;
use crate::model::{Direction, Route};
use crate::observe::{ListenerId, ListenerSet, Observable};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub struct RouteStore {
    routes: RefCell<HashMap<EntityId, Route>>,
    entity_listeners: RefCell<HashMap<EntityId, Rc<ListenerSet>>>,
    changed: ListenerSet,
}

impl RouteStore {
    pub fn new() -> Self {
        Self {
            routes: RefCell::new(HashMap::new()),
            entity_listeners: RefCell::new(HashMap::new()),
            changed: ListenerSet::new(),
        }
    }

    pub fn get(&self, id: EntityId) -> Option<Route> {
        self.routes.borrow().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.borrow().is_empty()
    }

    /// Look up a route by its owner node, per-direction index, and
    /// direction — how connection endpoints address routes on the wire.
    pub fn find(&self, owner: EntityId, index: usize, direction: Direction) -> Option<Route> {
        self.routes
            .borrow()
            .values()
            .find(|r| r.owner == owner && r.index == index && r.direction == direction)
            .cloned()
    }

    /// All routes on a node, inputs first, each direction ordered by index.
    pub fn by_owner(&self, owner: EntityId) -> Vec<Route> {
        let mut routes: Vec<Route> = self
            .routes
            .borrow()
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        routes.sort_by_key(|r| (r.direction == Direction::Output, r.index));
        routes
    }

    pub fn observe(&self, id: EntityId, callback: impl Fn() + 'static) -> ListenerId {
        self.entity_listeners
            .borrow_mut()
            .entry(id)
            .or_insert_with(|| Rc::new(ListenerSet::new()))
            .add(callback)
    }

    pub fn unobserve(&self, id: EntityId, listener: ListenerId) {
        if let Some(set) = self.entity_listeners.borrow().get(&id) {
            set.remove(listener);
        }
    }

    fn notify_entity(&self, id: EntityId) {
        let set = self.entity_listeners.borrow().get(&id).map(Rc::clone);
        if let Some(set) = set {
            set.notify();
        }
    }

    pub fn apply(&self, event: &Event) {
        match event {
            Event::RouteCreate(route) => self.create(route.clone()),
            Event::RouteDelete { id } => self.delete(*id),
            Event::RouteValue { id, value } => self.set_value(*id, value.clone()),
            Event::RouteStatus { id, blocked } => self.set_blocked(*id, *blocked),
            Event::ResetGraph => self.clear(),
            _ => {}
        }
    }

    fn create(&self, route: Route) {
        let id = route.id;
        {
            let mut routes = self.routes.borrow_mut();
            if routes.contains_key(&id) {
                log::warn!(
                    "{}",
                    ProtocolViolation::DuplicateCreate { kind: "route", id: id.to_string() }
                );
                return;
            }
            routes.insert(id, route);
        }
        self.changed.notify();
    }

    fn delete(&self, id: EntityId) {
        if self.routes.borrow_mut().remove(&id).is_none() {
            log::warn!(
                "{}",
                ProtocolViolation::DeleteUnknown { kind: "route", id: id.to_string() }
            );
            return;
        }
        self.entity_listeners.borrow_mut().remove(&id);
        self.changed.notify();
    }

    fn clear(&self) {
        self.routes.borrow_mut().clear();
        self.entity_listeners.borrow_mut().clear();
        self.changed.notify();
    }

    fn set_value(&self, id: EntityId, value: Option<serde_json::Value>) {
        {
            let mut routes = self.routes.borrow_mut();
            match routes.get_mut(&id) {
                Some(route) => route.value = value,
                None => {
                    log::warn!("value update for unknown route {id}");
                    return;
                }
            }
        }
        self.notify_entity(id);
    }

    fn set_blocked(&self, id: EntityId, blocked: bool) {
        {
            let mut routes = self.routes.borrow_mut();
            match routes.get_mut(&id) {
                Some(route) => route.blocked = blocked,
                None => {
                    log::warn!("status update for unknown route {id}");
                    return;
                }
            }
        }
        self.notify_entity(id);
    }
}

impl Default for RouteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for RouteStore {
    fn listeners(&self) -> &ListenerSet {
        &self.changed
    }
}
