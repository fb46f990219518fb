//! Store for canvas nodes: blocks, groups, and sources.
//!
//! One map covers all three families — they share position, label, and
//! parent semantics, and the canvas treats them uniformly — but create
//! events stay typed, so a group can never morph into a block via update.

use crate::error::ProtocolViolation;
use crate::event::{BlockPatch, Event, GroupPatch, SourcePatch};
use crate::id::EntityId;
use crate::model::{Node, Position, Translate};
use crate::observe::{ListenerId, ListenerSet, Observable};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub struct NodeStore {
    nodes: RefCell<HashMap<EntityId, Node>>,
    entity_listeners: RefCell<HashMap<EntityId, Rc<ListenerSet>>>,
    changed: ListenerSet,
}

impl NodeStore {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(HashMap::new()),
            entity_listeners: RefCell::new(HashMap::new()),
            changed: ListenerSet::new(),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────

    pub fn get(&self, id: EntityId) -> Option<Node> {
        self.nodes.borrow().get(&id).cloned()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.borrow().contains_key(&id)
    }

    pub fn all(&self) -> Vec<Node> {
        self.nodes.borrow().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    /// Nodes whose parent is `parent` — the visible children when
    /// `parent` is the focused group.
    pub fn by_parent(&self, parent: EntityId) -> Vec<Node> {
        self.nodes
            .borrow()
            .values()
            .filter(|n| n.parent() == Some(parent))
            .cloned()
            .collect()
    }

    /// Translate offset of a group, or zero for anything else.
    pub fn translate_of(&self, id: EntityId) -> Translate {
        match self.nodes.borrow().get(&id) {
            Some(Node::Group(g)) => g.translate,
            _ => Translate::default(),
        }
    }

    // ── Per-entity listeners ─────────────────────────────────────────────

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

    // ── Bus handler ──────────────────────────────────────────────────────

    pub fn apply(&self, event: &Event) {
        match event {
            Event::BlockCreate(block) => self.create(Node::Block(block.clone())),
            Event::GroupCreate(group) => self.create(Node::Group(group.clone())),
            Event::SourceCreate(source) => self.create(Node::Source(source.clone())),

            Event::BlockUpdate(patch) => self.update_block(patch),
            Event::GroupUpdate(patch) => self.update_group(patch),
            Event::SourceUpdate(patch) => self.update_source(patch),

            Event::BlockDelete { id } | Event::GroupDelete { id } | Event::SourceDelete { id } => {
                self.delete(*id)
            }

            Event::BlockPosition { id, position }
            | Event::GroupPosition { id, position }
            | Event::SourcePosition { id, position } => self.set_position(*id, *position),

            Event::BlockAlias { id, label }
            | Event::GroupAlias { id, label }
            | Event::SourceAlias { id, label } => self.set_label(*id, label),

            Event::SourceParam { id, param, value } => self.set_param(*id, param, value),

            Event::ChildAdd { group, child } => self.child_add(*group, *child),
            Event::ChildRemove { group, child } => self.child_remove(*group, *child),

            Event::GroupRouteAlias { group, route, alias } => {
                self.group_route(*group, *route, |r| r.alias = alias.clone())
            }
            Event::GroupRouteHidden { group, route, hidden } => {
                self.group_route(*group, *route, |r| r.hidden = *hidden)
            }

            Event::ResetGraph => self.clear(),
            _ => {}
        }
    }

    // ── Mutations ────────────────────────────────────────────────────────

    fn create(&self, node: Node) {
        let id = node.id();
        {
            let mut nodes = self.nodes.borrow_mut();
            if nodes.contains_key(&id) {
                log::warn!(
                    "{}",
                    ProtocolViolation::DuplicateCreate { kind: "node", id: id.to_string() }
                );
                return;
            }
            nodes.insert(id, node);
        }
        self.changed.notify();
    }

    fn delete(&self, id: EntityId) {
        let removed = self.nodes.borrow_mut().remove(&id);
        if removed.is_none() {
            log::warn!(
                "{}",
                ProtocolViolation::DeleteUnknown { kind: "node", id: id.to_string() }
            );
            return;
        }
        self.entity_listeners.borrow_mut().remove(&id);
        self.changed.notify();
    }

    fn clear(&self) {
        self.nodes.borrow_mut().clear();
        self.entity_listeners.borrow_mut().clear();
        self.changed.notify();
    }

    /// Run `mutate` against the entity if present; warn otherwise.
    /// Notifies the entity's own listeners on success and reports
    /// whether the entity was there at all.
    fn with_node(&self, id: EntityId, mutate: impl FnOnce(&mut Node)) -> bool {
        {
            let mut nodes = self.nodes.borrow_mut();
            match nodes.get_mut(&id) {
                Some(node) => mutate(node),
                None => {
                    log::warn!(
                        "{}",
                        ProtocolViolation::UpdateUnknown { kind: "node", id: id.to_string() }
                    );
                    return false;
                }
            }
        }
        self.notify_entity(id);
        true
    }

    fn update_block(&self, patch: &BlockPatch) {
        self.with_node(patch.id, |node| {
            if let Node::Block(b) = node {
                if let Some(t) = &patch.type_tag {
                    b.type_tag = t.clone();
                }
                if let Some(l) = &patch.label {
                    b.label = l.clone();
                }
                if let Some(p) = patch.parent {
                    b.parent = p;
                }
                if let Some(p) = patch.position {
                    b.position = p;
                }
                if let Some(i) = &patch.inputs {
                    b.inputs = i.clone();
                }
                if let Some(o) = &patch.outputs {
                    b.outputs = o.clone();
                }
            } else {
                log::warn!("block update for non-block node {}", patch.id);
            }
        });
    }

    fn update_group(&self, patch: &GroupPatch) {
        self.with_node(patch.id, |node| {
            if let Node::Group(g) = node {
                if let Some(l) = &patch.label {
                    g.label = l.clone();
                }
                if let Some(p) = patch.parent {
                    g.parent = p;
                }
                if let Some(p) = patch.position {
                    g.position = p;
                }
                if let Some(t) = patch.translate {
                    g.translate = t;
                }
            } else {
                log::warn!("group update for non-group node {}", patch.id);
            }
        });
    }

    fn update_source(&self, patch: &SourcePatch) {
        self.with_node(patch.id, |node| {
            if let Node::Source(s) = node {
                if let Some(l) = &patch.label {
                    s.label = l.clone();
                }
                if let Some(p) = patch.parent {
                    s.parent = p;
                }
                if let Some(p) = patch.position {
                    s.position = p;
                }
            } else {
                log::warn!("source update for non-source node {}", patch.id);
            }
        });
    }

    fn set_position(&self, id: EntityId, position: Position) {
        self.with_node(id, |node| node.set_position(position));
    }

    fn set_label(&self, id: EntityId, label: &str) {
        self.with_node(id, |node| match node {
            Node::Block(b) => b.label = label.to_string(),
            Node::Group(g) => g.label = label.to_string(),
            Node::Source(s) => s.label = label.to_string(),
        });
    }

    fn set_param(&self, id: EntityId, param: &str, value: &str) {
        self.with_node(id, |node| {
            if let Node::Source(s) = node {
                match s.params.iter_mut().find(|p| p.name == param) {
                    Some(p) => p.value = value.to_string(),
                    None => s.params.push(crate::model::SourceParam {
                        name: param.to_string(),
                        value: value.to_string(),
                    }),
                }
            } else {
                log::warn!("param update for non-source node {id}");
            }
        });
    }

    fn child_add(&self, group: EntityId, child: EntityId) {
        let known = self.with_node(group, |node| {
            if let Node::Group(g) = node {
                if !g.children.contains(&child) {
                    g.children.push(child);
                }
            } else {
                log::warn!("child add for non-group node {group}");
            }
        });
        if !known {
            return;
        }
        // The child's parent pointer follows the group membership.
        if self.contains(child) {
            self.with_node(child, |node| match node {
                Node::Block(b) => b.parent = Some(group),
                Node::Group(g) => g.parent = Some(group),
                Node::Source(s) => s.parent = Some(group),
            });
        }
        self.changed.notify();
    }

    fn child_remove(&self, group: EntityId, child: EntityId) {
        let known = self.with_node(group, |node| {
            if let Node::Group(g) = node {
                g.children.retain(|c| *c != child);
            } else {
                log::warn!("child remove for non-group node {group}");
            }
        });
        if known {
            self.changed.notify();
        }
    }

    fn group_route(
        &self,
        group: EntityId,
        route: EntityId,
        mutate: impl FnOnce(&mut crate::model::GroupRoute),
    ) {
        self.with_node(group, |node| {
            if let Node::Group(g) = node {
                match g.routes.iter_mut().find(|r| r.id == route) {
                    Some(r) => mutate(r),
                    None => log::warn!("group {group} has no proxied route {route}"),
                }
            } else {
                log::warn!("group route update for non-group node {group}");
            }
        });
    }
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for NodeStore {
    fn listeners(&self) -> &ListenerSet {
        &self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Block;
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;
    use std::cell::Cell;

    fn block(id: &str, x: f64, y: f64) -> Block {
        Block {
            id: EntityId::intern(id),
            type_tag: "delay".into(),
            label: String::new(),
            parent: None,
            position: Position::new(x, y),
            inputs: smallvec![],
            outputs: smallvec![],
        }
    }

    #[test]
    fn create_update_delete_lifecycle() {
        let store = NodeStore::new();
        let id = EntityId::intern("b1");

        store.apply(&Event::BlockCreate(block("b1", 1.0, 2.0)));
        assert_eq!(store.get(id).unwrap().position(), Position::new(1.0, 2.0));

        store.apply(&Event::BlockUpdate(BlockPatch {
            id,
            label: Some("renamed".into()),
            ..Default::default()
        }));
        let node = store.get(id).unwrap();
        assert_eq!(node.label(), "renamed");
        // Unpatched fields survive the merge.
        assert_eq!(node.position(), Position::new(1.0, 2.0));

        store.apply(&Event::BlockDelete { id });
        assert_eq!(store.get(id), None);
    }

    #[test]
    fn duplicate_create_keeps_existing() {
        let store = NodeStore::new();
        let id = EntityId::intern("dup");
        store.apply(&Event::BlockCreate(block("dup", 1.0, 1.0)));
        store.apply(&Event::BlockCreate(block("dup", 9.0, 9.0)));
        assert_eq!(store.get(id).unwrap().position(), Position::new(1.0, 1.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_and_delete_of_unknown_id_are_noops() {
        let store = NodeStore::new();
        let id = EntityId::intern("ghost");
        store.apply(&Event::BlockUpdate(BlockPatch { id, ..Default::default() }));
        store.apply(&Event::BlockDelete { id });
        assert!(store.is_empty());
    }

    #[test]
    fn update_with_null_parent_clears_it() {
        let store = NodeStore::new();
        let id = EntityId::intern("orphaned");
        let mut b = block("orphaned", 0.0, 0.0);
        b.parent = Some(EntityId::intern("g1"));
        store.apply(&Event::BlockCreate(b));

        // An absent key leaves the parent alone.
        store.apply(&Event::BlockUpdate(BlockPatch {
            id,
            label: Some("still owned".into()),
            ..Default::default()
        }));
        assert_eq!(store.get(id).unwrap().parent(), Some(EntityId::intern("g1")));

        // An explicit null detaches the node.
        store.apply(&Event::BlockUpdate(BlockPatch {
            id,
            parent: Some(None),
            ..Default::default()
        }));
        assert_eq!(store.get(id).unwrap().parent(), None);
    }

    #[test]
    fn position_event_notifies_entity_listener() {
        let store = NodeStore::new();
        let id = EntityId::intern("mover");
        store.apply(&Event::BlockCreate(block("mover", 0.0, 0.0)));

        let hits = Rc::new(Cell::new(0));
        {
            let hits = Rc::clone(&hits);
            store.observe(id, move || hits.set(hits.get() + 1));
        }
        store.apply(&Event::BlockPosition { id, position: Position::new(5.0, 6.0) });
        assert_eq!(hits.get(), 1);
        assert_eq!(store.get(id).unwrap().position(), Position::new(5.0, 6.0));
    }

    #[test]
    fn child_membership_updates_parent_pointer() {
        let store = NodeStore::new();
        let group = crate::model::Group {
            id: EntityId::intern("g1"),
            label: String::new(),
            parent: None,
            position: Position::default(),
            translate: Translate::default(),
            children: vec![],
            routes: vec![],
        };
        store.apply(&Event::GroupCreate(group));
        store.apply(&Event::BlockCreate(block("b1", 0.0, 0.0)));

        let gid = EntityId::intern("g1");
        let bid = EntityId::intern("b1");
        store.apply(&Event::ChildAdd { group: gid, child: bid });

        assert_eq!(store.get(bid).unwrap().parent(), Some(gid));
        assert_eq!(store.by_parent(gid).len(), 1);

        store.apply(&Event::ChildRemove { group: gid, child: bid });
        match store.get(gid).unwrap() {
            Node::Group(g) => assert!(g.children.is_empty()),
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn child_event_for_unknown_group_does_not_notify() {
        let store = NodeStore::new();
        let hits = Rc::new(Cell::new(0));
        {
            let hits = Rc::clone(&hits);
            store.add_listener(move || hits.set(hits.get() + 1));
        }
        let ghost = EntityId::intern("ghost");
        let child = EntityId::intern("b1");
        store.apply(&Event::ChildAdd { group: ghost, child });
        store.apply(&Event::ChildRemove { group: ghost, child });
        assert_eq!(hits.get(), 0, "nothing mutated, so nothing fires");
    }

    #[test]
    fn reset_graph_empties_the_store() {
        let store = NodeStore::new();
        store.apply(&Event::BlockCreate(block("b1", 0.0, 0.0)));
        store.apply(&Event::BlockCreate(block("b2", 0.0, 0.0)));
        store.apply(&Event::ResetGraph);
        assert!(store.is_empty());
    }
}
