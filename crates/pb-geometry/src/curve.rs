//! Cubic Bezier construction for connection rendering.
//!
//! Control points sit a fixed horizontal distance from each endpoint,
//! signed so the curve bows out of the output side and into the input
//! side rather than crossing the node bodies.

use kurbo::{CubicBez, Point};
use pb_core::model::Direction;

/// Horizontal control-point offset from each endpoint.
const TENSION: f64 = 50.0;

/// Curve for a settled connection. `from` is the output anchor and `to`
/// the input anchor, as store normalization guarantees.
pub fn connection_curve(from: Point, to: Point) -> CubicBez {
    CubicBez::new(
        from,
        Point::new(from.x + TENSION, from.y),
        Point::new(to.x - TENSION, to.y),
        to,
    )
}

/// Curve for an in-progress connection gesture: one end fixed at a
/// route anchor, the free end tracking the pointer. The tension sign
/// follows the fixed route's direction, so the preview bows the same
/// way the settled curve will.
pub fn tool_curve(fixed: Point, fixed_direction: Direction, pointer: Point) -> CubicBez {
    match fixed_direction {
        Direction::Output => connection_curve(fixed, pointer),
        Direction::Input => CubicBez::new(
            fixed,
            Point::new(fixed.x - TENSION, fixed.y),
            Point::new(pointer.x + TENSION, pointer.y),
            pointer,
        ),
    }
}
