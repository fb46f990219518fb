//! Route anchor positions: where a connection attaches to a node.
//!
//! Inputs anchor on the node's left edge, outputs on the right; each
//! route sits one `route_height` slot below the previous one of the
//! same direction, nudged by half the route marker's radius so the
//! curve meets the marker's center.

use kurbo::Point;
use pb_core::model::{Direction, Position, Translate};

/// Rendered dimensions of a node, shared by anchor layout and hit areas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeGeometry {
    pub width: f64,
    /// Radius of the circular route marker.
    pub route_radius: f64,
    /// Vertical distance between successive route slots.
    pub route_height: f64,
}

impl Default for NodeGeometry {
    fn default() -> Self {
        Self {
            width: 100.0,
            route_radius: 10.0,
            route_height: 25.0,
        }
    }
}

/// Canvas position of a route's anchor point.
///
/// `display_index` is the route's index among its node's routes of the
/// same direction; `translate` is the focused group's offset (zero when
/// no group translation applies).
pub fn route_anchor(
    position: Position,
    translate: Translate,
    geometry: NodeGeometry,
    direction: Direction,
    display_index: usize,
) -> Point {
    let input = direction == Direction::Input;
    let cx = geometry.route_radius * if input { -0.5 } else { 0.5 };
    let cy = geometry.route_radius * -0.5;
    let edge = if input { 0.0 } else { geometry.width };
    Point::new(
        edge + cx + position.x + translate.x,
        (1 + display_index) as f64 * geometry.route_height + cy + position.y + translate.y,
    )
}
