//! Tool system for canvas interactions.
//!
//! Each tool translates pointer events into outbound [`Request`]s. The
//! graph is server-owned, so tools never change store state; a gesture
//! ends in zero or more requests and the resulting events arrive back
//! over the push channel.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Select Tool |
//! |----------|-------------|
//! | **Shift** | Toggle node in/out of selection, keep the rest |

use crate::input::InputEvent;
use crate::requests::{CreateBlockRequest, CreateConnectionRequest, Request, RouteHit};
use pb_core::id::EntityId;
use pb_core::model::{Position, Translate};
use pb_geometry::{Point, Rect};

/// The active tool determines how input events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Select,
    Connect,
    Place,
}

/// What the pointer is over, resolved by the host against store state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    Node { id: EntityId, position: Position },
    Route(RouteHit),
}

/// Trait for tools that handle input and produce requests.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event, returning zero or more requests.
    fn handle(&mut self, event: &InputEvent, hit: Option<&Hit>) -> Vec<Request>;
}

// ─── Select Tool ─────────────────────────────────────────────────────────

pub struct SelectTool {
    /// Currently selected entities, in selection order.
    pub selected: Vec<EntityId>,
    /// Drag state: the grabbed node and its live position.
    dragging: Option<(EntityId, Position)>,
    moved: bool,
    last_x: f64,
    last_y: f64,
    marquee_start: Option<Point>,
    /// Current marquee rectangle, normalized. Updated during drag.
    pub marquee_rect: Option<Rect>,
    /// Set on pointer-up when a marquee gesture finished; the host takes
    /// it, computes hits against store state, and calls `set_selection`.
    finished_marquee: Option<Rect>,
}

impl Default for SelectTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectTool {
    pub fn new() -> Self {
        Self {
            selected: Vec::new(),
            dragging: None,
            moved: false,
            last_x: 0.0,
            last_y: 0.0,
            marquee_start: None,
            marquee_rect: None,
            finished_marquee: None,
        }
    }

    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selected.contains(&id)
    }

    /// Replace the selection with marquee hits (nodes first, then edges,
    /// each in store order).
    pub fn set_selection(&mut self, hits: Vec<EntityId>) {
        self.selected = hits;
    }

    /// The completed marquee rectangle, if the last pointer-up ended one.
    pub fn take_marquee(&mut self) -> Option<Rect> {
        self.finished_marquee.take()
    }

    /// Live position of the node being dragged, for rendering.
    pub fn drag_position(&self) -> Option<(EntityId, Position)> {
        self.dragging
    }

    fn toggle(&mut self, id: EntityId) {
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id);
        }
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<&Hit>) -> Vec<Request> {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => {
                self.marquee_start = None;
                self.marquee_rect = None;
                self.finished_marquee = None;

                match hit {
                    Some(Hit::Node { id, position }) => {
                        if modifiers.shift {
                            self.toggle(*id);
                        } else if !self.is_selected(*id) {
                            // Click on an unselected node replaces the
                            // selection; on a selected one it is kept
                            // so the drag moves it.
                            self.selected = vec![*id];
                        }
                        self.dragging = Some((*id, *position));
                        self.moved = false;
                        self.last_x = *x;
                        self.last_y = *y;
                    }
                    Some(Hit::Route(_)) => {}
                    None => {
                        // Empty space: start a marquee.
                        if !modifiers.shift {
                            self.selected.clear();
                        }
                        self.dragging = None;
                        let start = Point::new(*x, *y);
                        self.marquee_start = Some(start);
                        self.marquee_rect = Some(Rect::from_points(start, start));
                    }
                }
                vec![]
            }
            InputEvent::PointerMove { x, y, .. } => {
                if let Some(start) = self.marquee_start {
                    self.marquee_rect = Some(Rect::from_points(start, Point::new(*x, *y)));
                    return vec![];
                }
                if let Some((_, position)) = self.dragging.as_mut() {
                    position.x += x - self.last_x;
                    position.y += y - self.last_y;
                    self.last_x = *x;
                    self.last_y = *y;
                    self.moved = true;
                }
                vec![]
            }
            InputEvent::PointerUp { .. } => {
                if self.marquee_start.take().is_some() {
                    self.finished_marquee = self.marquee_rect.take();
                    return vec![];
                }
                match self.dragging.take() {
                    // One position request per completed drag.
                    Some((id, position)) if self.moved => {
                        self.moved = false;
                        vec![Request::MoveNode { id, position }]
                    }
                    _ => vec![],
                }
            }
            InputEvent::DoubleClick { .. } => vec![],
        }
    }
}

// ─── Connect Tool ────────────────────────────────────────────────────────

/// Two-phase connection gesture: the first route click arms the tool,
/// the second yields a normalized request and disarms it whatever the
/// click order or outcome.
pub struct ConnectTool {
    connecting: Option<RouteHit>,
}

impl Default for ConnectTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectTool {
    pub fn new() -> Self {
        Self { connecting: None }
    }

    /// The armed route, for drawing the in-progress curve.
    pub fn connecting(&self) -> Option<RouteHit> {
        self.connecting
    }

    /// Drop any in-progress gesture (topic switch, escape).
    pub fn cancel(&mut self) {
        self.connecting = None;
    }
}

impl Tool for ConnectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Connect
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<&Hit>) -> Vec<Request> {
        let route = match (event, hit) {
            (InputEvent::PointerDown { .. }, Some(Hit::Route(route))) => *route,
            _ => return vec![],
        };
        match self.connecting.take() {
            None => {
                self.connecting = Some(route);
                vec![]
            }
            Some(first) => {
                vec![Request::CreateConnection(CreateConnectionRequest::normalized(
                    first, route,
                ))]
            }
        }
    }
}

// ─── Library picker (block placement) ────────────────────────────────────

/// Double-click opens the type picker at the pointer; choosing a type
/// yields a create-block request positioned in the focused group's
/// coordinate space.
pub struct LibraryPicker {
    open_at: Option<Position>,
}

impl Default for LibraryPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryPicker {
    pub fn new() -> Self {
        Self { open_at: None }
    }

    pub fn open_at(&self) -> Option<Position> {
        self.open_at
    }

    /// Pick a type from the catalog. The picker position is in screen
    /// space, so the focused group's translate is subtracted to land
    /// the block where the user pointed.
    pub fn choose(
        &mut self,
        type_tag: &str,
        parent: EntityId,
        translate: Translate,
    ) -> Option<Request> {
        let at = self.open_at.take()?;
        Some(Request::CreateBlock(CreateBlockRequest {
            type_tag: type_tag.to_string(),
            parent,
            position: Position::new(at.x - translate.x, at.y - translate.y),
        }))
    }
}

impl Tool for LibraryPicker {
    fn kind(&self) -> ToolKind {
        ToolKind::Place
    }

    fn handle(&mut self, event: &InputEvent, _hit: Option<&Hit>) -> Vec<Request> {
        match event {
            InputEvent::DoubleClick { x, y } => {
                self.open_at = Some(Position::new(*x, *y));
            }
            // Any other click dismisses an open picker.
            InputEvent::PointerUp { .. } => {
                self.open_at = None;
            }
            _ => {}
        }
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use pb_core::model::Direction;
    use pretty_assertions::assert_eq;

    fn down(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerDown { x, y, modifiers: Modifiers::NONE }
    }

    fn down_shift(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerDown { x, y, modifiers: Modifiers { shift: true, alt: false } }
    }

    fn up(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerUp { x, y, modifiers: Modifiers::NONE }
    }

    fn node_hit(id: &str, x: f64, y: f64) -> Hit {
        Hit::Node { id: EntityId::intern(id), position: Position::new(x, y) }
    }

    fn route_hit(owner: &str, index: usize, direction: Direction) -> Hit {
        Hit::Route(RouteHit { owner: EntityId::intern(owner), index, direction })
    }

    #[test]
    fn plain_click_replaces_selection() {
        let mut tool = SelectTool::new();
        tool.handle(&down(0.0, 0.0), Some(&node_hit("a", 0.0, 0.0)));
        tool.handle(&up(0.0, 0.0), None);
        tool.handle(&down(0.0, 0.0), Some(&node_hit("b", 0.0, 0.0)));
        assert_eq!(tool.selected, vec![EntityId::intern("b")]);
    }

    #[test]
    fn shift_click_toggles_and_preserves_order() {
        let mut tool = SelectTool::new();
        for id in ["a", "b", "c"] {
            tool.handle(&down_shift(0.0, 0.0), Some(&node_hit(id, 0.0, 0.0)));
            tool.handle(&up(0.0, 0.0), None);
        }
        assert_eq!(
            tool.selected,
            vec![EntityId::intern("a"), EntityId::intern("b"), EntityId::intern("c")]
        );

        // Toggling the middle one out keeps the others in order.
        tool.handle(&down_shift(0.0, 0.0), Some(&node_hit("b", 0.0, 0.0)));
        assert_eq!(tool.selected, vec![EntityId::intern("a"), EntityId::intern("c")]);
    }

    #[test]
    fn marquee_rect_is_normalized_from_any_corner() {
        let mut tool = SelectTool::new();
        tool.handle(&down(50.0, 60.0), None);
        tool.handle(
            &InputEvent::PointerMove { x: 10.0, y: 20.0, modifiers: Modifiers::NONE },
            None,
        );
        assert_eq!(tool.marquee_rect, Some(Rect::new(10.0, 20.0, 50.0, 60.0)));

        tool.handle(&up(10.0, 20.0), None);
        assert_eq!(tool.take_marquee(), Some(Rect::new(10.0, 20.0, 50.0, 60.0)));
        assert_eq!(tool.take_marquee(), None);
    }

    #[test]
    fn drag_yields_one_move_request_on_release() {
        let mut tool = SelectTool::new();
        tool.handle(&down(100.0, 100.0), Some(&node_hit("a", 10.0, 10.0)));
        assert!(tool
            .handle(
                &InputEvent::PointerMove { x: 130.0, y: 90.0, modifiers: Modifiers::NONE },
                None
            )
            .is_empty());

        let requests = tool.handle(&up(130.0, 90.0), None);
        assert_eq!(
            requests,
            vec![Request::MoveNode {
                id: EntityId::intern("a"),
                position: Position::new(40.0, 0.0),
            }]
        );
    }

    #[test]
    fn click_without_drag_sends_nothing() {
        let mut tool = SelectTool::new();
        tool.handle(&down(0.0, 0.0), Some(&node_hit("a", 10.0, 10.0)));
        assert!(tool.handle(&up(0.0, 0.0), None).is_empty());
    }

    #[test]
    fn connect_normalizes_regardless_of_click_order() {
        let mut tool = ConnectTool::new();
        // Input clicked first, output second.
        assert!(tool
            .handle(&down(0.0, 0.0), Some(&route_hit("b2", 1, Direction::Input)))
            .is_empty());
        let requests = tool.handle(&down(0.0, 0.0), Some(&route_hit("b1", 0, Direction::Output)));

        match &requests[..] {
            [Request::CreateConnection(req)] => {
                assert_eq!(req.from.id, EntityId::intern("b1"), "output side must be `from`");
                assert_eq!(req.to.id, EntityId::intern("b2"));
                assert_eq!(req.to.route, 1);
            }
            other => panic!("expected one CreateConnection, got {other:?}"),
        }
        assert_eq!(tool.connecting(), None, "gesture must clear after the second click");
    }

    #[test]
    fn connect_cancel_disarms() {
        let mut tool = ConnectTool::new();
        tool.handle(&down(0.0, 0.0), Some(&route_hit("b1", 0, Direction::Output)));
        assert!(tool.connecting().is_some());
        tool.cancel();
        assert_eq!(tool.connecting(), None);
    }

    #[test]
    fn picker_choose_subtracts_group_translate() {
        let mut picker = LibraryPicker::new();
        picker.handle(&InputEvent::DoubleClick { x: 120.0, y: 80.0 }, None);

        let request = picker
            .choose("delay", EntityId::intern("root"), Translate { x: 20.0, y: -10.0 })
            .unwrap();
        match request {
            Request::CreateBlock(req) => {
                assert_eq!(req.type_tag, "delay");
                assert_eq!(req.position, Position::new(100.0, 90.0));
            }
            other => panic!("expected CreateBlock, got {other:?}"),
        }
        assert!(picker.open_at().is_none(), "choosing closes the picker");
    }

    #[test]
    fn pointer_up_dismisses_open_picker() {
        let mut picker = LibraryPicker::new();
        picker.handle(&InputEvent::DoubleClick { x: 1.0, y: 1.0 }, None);
        picker.handle(&up(5.0, 5.0), None);
        assert!(picker.open_at().is_none());
        assert!(picker.choose("delay", EntityId::intern("root"), Translate::default()).is_none());
    }
}
