//! Client-side entity model for the server-owned processing graph.
//!
//! Every entity is identified by a server-assigned [`EntityId`] and exists
//! on the client only between the server's `create` and `delete` events.
//! The stores own the entity instances; everything else reads snapshots.

use crate::id::EntityId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Geometry primitives ─────────────────────────────────────────────────

/// A node's position in canvas coordinates (before group translation).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Translate offset a focused group applies to all of its descendants.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translate {
    pub x: f64,
    pub y: f64,
}

// ─── Routes ──────────────────────────────────────────────────────────────

/// Which side of a node a route lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

/// A typed input/output port owned by a block, group, or source.
///
/// `value` is the last value the server pushed for this route (inputs
/// only carry values while set); `blocked` is a separate status channel
/// reporting that the owner is waiting on upstream delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: EntityId,
    /// The node this route belongs to.
    pub owner: EntityId,
    pub name: String,
    pub direction: Direction,
    /// Index within the owner's routes of the same direction; drives the
    /// vertical layout offset on the canvas.
    pub index: usize,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub blocked: bool,
}

impl Route {
    /// A route is active iff it currently holds a value.
    pub fn active(&self) -> bool {
        self.value.is_some()
    }
}

// ─── Canvas nodes ────────────────────────────────────────────────────────

/// A processing block: the basic unit of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: EntityId,
    /// Library type tag, e.g. `"delay"` or `"map"`.
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub label: String,
    /// Containing group, if any.
    #[serde(default)]
    pub parent: Option<EntityId>,
    pub position: Position,
    #[serde(default)]
    pub inputs: SmallVec<[EntityId; 4]>,
    #[serde(default)]
    pub outputs: SmallVec<[EntityId; 4]>,
}

/// A route a group re-exports from one of its children to the outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRoute {
    /// Id of the proxied inner route.
    pub id: EntityId,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub hidden: bool,
}

/// A container node. Children are rendered with the group's translate
/// offset applied; group routes proxy inner routes to the outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: EntityId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub parent: Option<EntityId>,
    pub position: Position,
    #[serde(default)]
    pub translate: Translate,
    #[serde(default)]
    pub children: Vec<EntityId>,
    #[serde(default)]
    pub routes: Vec<GroupRoute>,
}

/// A provider-defined parameter on a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceParam {
    pub name: String,
    pub value: String,
}

/// A leaf entity analogous to a block, configured by provider parameters
/// instead of routes-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub parent: Option<EntityId>,
    pub position: Position,
    #[serde(default)]
    pub params: Vec<SourceParam>,
}

/// Any entity that occupies a canvas position.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Block(Block),
    Group(Group),
    Source(Source),
}

impl Node {
    pub fn id(&self) -> EntityId {
        match self {
            Node::Block(b) => b.id,
            Node::Group(g) => g.id,
            Node::Source(s) => s.id,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Node::Block(b) => b.position,
            Node::Group(g) => g.position,
            Node::Source(s) => s.position,
        }
    }

    pub fn set_position(&mut self, position: Position) {
        match self {
            Node::Block(b) => b.position = position,
            Node::Group(g) => g.position = position,
            Node::Source(s) => s.position = position,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Node::Block(b) => &b.label,
            Node::Group(g) => &g.label,
            Node::Source(s) => &s.label,
        }
    }

    pub fn parent(&self) -> Option<EntityId> {
        match self {
            Node::Block(b) => b.parent,
            Node::Group(g) => g.parent,
            Node::Source(s) => s.parent,
        }
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// One end of a connection: a node id plus a route index on that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: EntityId,
    pub route: usize,
}

/// A directed edge between exactly one output route and one input route.
/// After store normalization `from` always resolves to the output side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: EntityId,
    pub from: Endpoint,
    pub to: Endpoint,
}

/// An edge binding a source to a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: EntityId,
    pub source: EntityId,
    pub block: EntityId,
}

/// Either kind of edge, for geometry and selection purposes.
#[derive(Debug, Clone, PartialEq)]
pub enum Edge {
    Connection(Connection),
    Link(Link),
}

impl Edge {
    pub fn id(&self) -> EntityId {
        match self {
            Edge::Connection(c) => c.id,
            Edge::Link(l) => l.id,
        }
    }
}

// ─── Navigation & catalog ────────────────────────────────────────────────

/// A top-level group available for navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootGroupEntry {
    pub id: EntityId,
    #[serde(default)]
    pub label: String,
}

/// A catalog entry describing a creatable block or source type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Set for source types: which provider backs them.
    #[serde(default)]
    pub source: Option<String>,
}
