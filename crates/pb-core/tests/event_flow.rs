//! Integration tests: wire frames → decode → bus dispatch → store state.
//!
//! Exercises the full `pb-core` pipeline the way the client wires it up:
//! every store registered on one bus, frames decoded and dispatched in
//! server-delivery order.

use pb_core::event::{decode_frame, Event};
use pb_core::id::EntityId;
use pb_core::model::Direction;
use pb_core::store::{ConnectionStore, LibraryStore, NodeStore, RootGroupStore, RouteStore};
use pb_core::EventBus;
use std::rc::Rc;

struct Graph {
    bus: Rc<EventBus>,
    nodes: Rc<NodeStore>,
    routes: Rc<RouteStore>,
    connections: Rc<ConnectionStore>,
    root_groups: Rc<RootGroupStore>,
    library: Rc<LibraryStore>,
}

/// One bus, every store subscribed — the same shape the client builds.
fn graph() -> Graph {
    let bus = Rc::new(EventBus::new());
    let nodes = Rc::new(NodeStore::new());
    let routes = Rc::new(RouteStore::new());
    let connections = Rc::new(ConnectionStore::new(Rc::clone(&routes)));
    let root_groups = Rc::new(RootGroupStore::new());
    let library = Rc::new(LibraryStore::new());

    {
        let nodes = Rc::clone(&nodes);
        bus.register(move |e| nodes.apply(e));
    }
    {
        let routes = Rc::clone(&routes);
        bus.register(move |e| routes.apply(e));
    }
    {
        let connections = Rc::clone(&connections);
        bus.register(move |e| connections.apply(e));
    }
    {
        let root_groups = Rc::clone(&root_groups);
        bus.register(move |e| root_groups.apply(e));
    }
    {
        let library = Rc::clone(&library);
        bus.register(move |e| library.apply(e));
    }

    Graph { bus, nodes, routes, connections, root_groups, library }
}

fn feed(g: &Graph, frames: &[&str]) {
    for frame in frames {
        g.bus.dispatch(&decode_frame(frame).expect("frame should decode"));
    }
}

// ─── Topic bootstrap ─────────────────────────────────────────────────────

#[test]
fn topic_bootstrap_populates_all_stores() {
    let g = graph();
    feed(&g, &[
        r#"{"action":"create","type":"block","data":{"block":{
            "id":"b1","type":"delay","label":"Delay","position":{"x":10,"y":20}}}}"#,
        r#"{"action":"create","type":"block","data":{"block":{
            "id":"b2","type":"pipe","label":"Pipe","position":{"x":200,"y":20}}}}"#,
        r#"{"action":"create","type":"route","data":{"route":{
            "id":"r_out","owner":"b1","name":"out","direction":"output","index":0}}}"#,
        r#"{"action":"create","type":"route","data":{"route":{
            "id":"r_in","owner":"b2","name":"in","direction":"input","index":0}}}"#,
        r#"{"action":"create","type":"connection","data":{"connection":{
            "id":"c1","from":{"id":"b1","route":0},"to":{"id":"b2","route":0}}}}"#,
    ]);

    assert_eq!(g.nodes.len(), 2);
    assert_eq!(g.routes.len(), 2);
    assert_eq!(g.connections.len(), 1);

    let conn = g.connections.get(EntityId::intern("c1")).unwrap();
    assert_eq!(conn.from.id, EntityId::intern("b1"));
    assert_eq!(conn.to.id, EntityId::intern("b2"));
}

#[test]
fn connection_supplied_input_first_is_normalized() {
    let g = graph();
    feed(&g, &[
        r#"{"action":"create","type":"route","data":{"route":{
            "id":"r_out","owner":"b1","name":"out","direction":"output","index":0}}}"#,
        r#"{"action":"create","type":"route","data":{"route":{
            "id":"r_in","owner":"b2","name":"in","direction":"input","index":0}}}"#,
        r#"{"action":"create","type":"connection","data":{"connection":{
            "id":"c1","from":{"id":"b2","route":0},"to":{"id":"b1","route":0}}}}"#,
    ]);

    let conn = g.connections.get(EntityId::intern("c1")).unwrap();
    assert_eq!(conn.from.id, EntityId::intern("b1"), "output end must be `from`");
    assert_eq!(conn.to.id, EntityId::intern("b2"), "input end must be `to`");
    assert_eq!(
        g.routes
            .find(conn.from.id, conn.from.route, Direction::Output)
            .unwrap()
            .id,
        EntityId::intern("r_out")
    );
}

// ─── Live updates ────────────────────────────────────────────────────────

#[test]
fn position_and_value_updates_flow_through() {
    let g = graph();
    feed(&g, &[
        r#"{"action":"create","type":"block","data":{"block":{
            "id":"b1","type":"delay","label":"Delay","position":{"x":0,"y":0}}}}"#,
        r#"{"action":"create","type":"route","data":{"route":{
            "id":"r1","owner":"b1","name":"in","direction":"input","index":0}}}"#,
        r#"{"action":"update_position","type":"block","data":{"block":{
            "id":"b1","position":{"x":30,"y":40}}}}"#,
        r#"{"action":"update_value","type":"route","data":{"route":{
            "id":"r1","value":7}}}"#,
    ]);

    let node = g.nodes.get(EntityId::intern("b1")).unwrap();
    assert_eq!(node.position().x, 30.0);
    assert_eq!(node.position().y, 40.0);
    assert!(g.routes.get(EntityId::intern("r1")).unwrap().active());
}

#[test]
fn out_of_order_frames_never_poison_later_ones() {
    let g = graph();
    // Update and delete before create: each warns and no-ops, then the
    // create lands normally.
    feed(&g, &[
        r#"{"action":"update_position","type":"block","data":{"block":{
            "id":"b1","position":{"x":1,"y":1}}}}"#,
        r#"{"action":"delete","type":"block","data":{"block":{"id":"b1"}}}"#,
        r#"{"action":"create","type":"block","data":{"block":{
            "id":"b1","type":"delay","label":"Delay","position":{"x":5,"y":5}}}}"#,
    ]);

    let node = g.nodes.get(EntityId::intern("b1")).unwrap();
    assert_eq!(node.position().x, 5.0);
}

// ─── Reset ───────────────────────────────────────────────────────────────

#[test]
fn reset_clears_graph_state_but_not_catalog() {
    let g = graph();
    g.bus.dispatch(&Event::LibraryLoaded(vec![pb_core::model::LibraryEntry {
        type_tag: "delay".into(),
        source: None,
    }]));
    feed(&g, &[
        r#"{"action":"create","type":"block","data":{"block":{
            "id":"b1","type":"delay","label":"Delay","position":{"x":0,"y":0}}}}"#,
        r#"{"action":"create","type":"route","data":{"route":{
            "id":"r1","owner":"b1","name":"in","direction":"input","index":0}}}"#,
        r#"{"action":"create","type":"root_group","data":{"root_group":[
            {"id":"g1","label":"Main"}]}}"#,
    ]);
    assert!(!g.nodes.is_empty());

    g.bus.dispatch(&Event::ResetGraph);

    assert!(g.nodes.is_empty());
    assert!(g.routes.is_empty());
    assert!(g.connections.is_empty());
    assert!(g.root_groups.is_empty());
    assert_eq!(g.library.len(), 1, "catalog is topic-independent");
}
