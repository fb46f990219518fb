pub mod anchor;
pub mod curve;
pub mod select;

pub use anchor::{route_anchor, NodeGeometry};
pub use curve::{connection_curve, tool_curve};
pub use select::{marquee_edges, marquee_nodes, EdgeAnchors};

// Re-export the kurbo types that appear in this crate's signatures so
// downstream crates don't need a direct dependency.
pub use kurbo::{CubicBez, Point, Rect};
