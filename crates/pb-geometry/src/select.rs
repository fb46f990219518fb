//! Rectangle (marquee) selection hit testing.
//!
//! Nodes hit on their translated position point; edges hit only when
//! BOTH anchor endpoints fall inside the rectangle — an edge crossing
//! the marquee with an endpoint outside is not selected.

use kurbo::{Point, Rect};
use pb_core::id::EntityId;
use pb_core::model::{Node, Translate};

/// An edge's id with its two anchor points, pre-computed by the caller
/// from route anchors (translate not yet applied).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeAnchors {
    pub id: EntityId,
    pub from: Point,
    pub to: Point,
}

fn translated(p: Point, translate: Translate) -> Point {
    Point::new(p.x + translate.x, p.y + translate.y)
}

/// Nodes whose translated position falls inside `rect`, in input order.
pub fn marquee_nodes(rect: Rect, translate: Translate, nodes: &[Node]) -> Vec<EntityId> {
    nodes
        .iter()
        .filter(|node| {
            let p = node.position();
            rect.contains(translated(Point::new(p.x, p.y), translate))
        })
        .map(Node::id)
        .collect()
}

/// Edges with both translated endpoints inside `rect`, in input order.
pub fn marquee_edges(rect: Rect, translate: Translate, edges: &[EdgeAnchors]) -> Vec<EntityId> {
    edges
        .iter()
        .filter(|edge| {
            rect.contains(translated(edge.from, translate))
                && rect.contains(translated(edge.to, translate))
        })
        .map(|edge| edge.id)
        .collect()
}
