//! Store for edges: connections (route → route) and links (source → block).
//!
//! The normalization invariant lives here: a stored connection always has
//! its `from` endpoint resolving to an `output`-direction route and `to`
//! to an `input`, no matter which order the creator supplied them. The
//! route store is consulted to resolve endpoint directions.

use crate::error::ProtocolViolation;
use crate::event::Event;
use crate::id::EntityId;
use crate::model::{Connection, Direction, Edge, Link};
use crate::observe::{ListenerSet, Observable};
use crate::store::RouteStore;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub struct ConnectionStore {
    connections: RefCell<HashMap<EntityId, Connection>>,
    links: RefCell<HashMap<EntityId, Link>>,
    routes: Rc<RouteStore>,
    changed: ListenerSet,
}

impl ConnectionStore {
    pub fn new(routes: Rc<RouteStore>) -> Self {
        Self {
            connections: RefCell::new(HashMap::new()),
            links: RefCell::new(HashMap::new()),
            routes,
            changed: ListenerSet::new(),
        }
    }

    pub fn get(&self, id: EntityId) -> Option<Connection> {
        self.connections.borrow().get(&id).cloned()
    }

    pub fn get_link(&self, id: EntityId) -> Option<Link> {
        self.links.borrow().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.connections.borrow().len() + self.links.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.borrow().is_empty() && self.links.borrow().is_empty()
    }

    /// Every edge, for selection and rendering.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .connections
            .borrow()
            .values()
            .cloned()
            .map(Edge::Connection)
            .collect();
        edges.extend(self.links.borrow().values().cloned().map(Edge::Link));
        edges
    }

    /// Connections touching a node on either end.
    pub fn by_node(&self, node: EntityId) -> Vec<Connection> {
        self.connections
            .borrow()
            .values()
            .filter(|c| c.from.id == node || c.to.id == node)
            .cloned()
            .collect()
    }

    pub fn apply(&self, event: &Event) {
        match event {
            Event::ConnectionCreate(conn) => self.create(conn.clone()),
            Event::ConnectionDelete { id } => self.delete(*id),
            Event::LinkCreate(link) => self.create_link(link.clone()),
            Event::LinkDelete { id } => self.delete_link(*id),
            Event::ResetGraph => self.clear(),
            _ => {}
        }
    }

    /// Swap endpoints if they arrived input-first. When neither endpoint
    /// resolves against the route store (its create may not have arrived
    /// yet) the connection is kept as supplied, with a warning.
    fn normalize(&self, mut conn: Connection) -> Connection {
        let from_is_output = self
            .routes
            .find(conn.from.id, conn.from.route, Direction::Output)
            .is_some();
        if from_is_output {
            return conn;
        }
        let reversed = self
            .routes
            .find(conn.from.id, conn.from.route, Direction::Input)
            .is_some()
            && self
                .routes
                .find(conn.to.id, conn.to.route, Direction::Output)
                .is_some();
        if reversed {
            std::mem::swap(&mut conn.from, &mut conn.to);
        } else {
            log::warn!(
                "connection {}: endpoints do not resolve to known routes; keeping as supplied",
                conn.id
            );
        }
        conn
    }

    fn create(&self, conn: Connection) {
        let id = conn.id;
        {
            let mut connections = self.connections.borrow_mut();
            if connections.contains_key(&id) {
                log::warn!(
                    "{}",
                    ProtocolViolation::DuplicateCreate { kind: "connection", id: id.to_string() }
                );
                return;
            }
            let conn = self.normalize(conn);
            connections.insert(id, conn);
        }
        self.changed.notify();
    }

    fn delete(&self, id: EntityId) {
        if self.connections.borrow_mut().remove(&id).is_none() {
            log::warn!(
                "{}",
                ProtocolViolation::DeleteUnknown { kind: "connection", id: id.to_string() }
            );
            return;
        }
        self.changed.notify();
    }

    fn create_link(&self, link: Link) {
        let id = link.id;
        {
            let mut links = self.links.borrow_mut();
            if links.contains_key(&id) {
                log::warn!(
                    "{}",
                    ProtocolViolation::DuplicateCreate { kind: "link", id: id.to_string() }
                );
                return;
            }
            links.insert(id, link);
        }
        self.changed.notify();
    }

    fn delete_link(&self, id: EntityId) {
        if self.links.borrow_mut().remove(&id).is_none() {
            log::warn!(
                "{}",
                ProtocolViolation::DeleteUnknown { kind: "link", id: id.to_string() }
            );
            return;
        }
        self.changed.notify();
    }

    fn clear(&self) {
        self.connections.borrow_mut().clear();
        self.links.borrow_mut().clear();
        self.changed.notify();
    }
}

impl Observable for ConnectionStore {
    fn listeners(&self) -> &ListenerSet {
        &self.changed
    }
}
