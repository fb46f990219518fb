//! Outbound request payloads.
//!
//! The graph is server-owned: tools never mutate store state directly,
//! they yield requests for the HTTP channel and wait for the resulting
//! events to come back over the push channel.

use pb_core::id::EntityId;
use pb_core::model::{Direction, Endpoint, Position};
use serde::Serialize;

/// A clicked route, as captured by the connect gesture: enough to form
/// a wire endpoint plus the direction that decides which end it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteHit {
    pub owner: EntityId,
    pub index: usize,
    pub direction: Direction,
}

impl RouteHit {
    fn endpoint(&self) -> Endpoint {
        Endpoint { id: self.owner, route: self.index }
    }
}

/// Body of `POST blocks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateBlockRequest {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub parent: EntityId,
    pub position: Position,
}

/// Body of `POST connections`. Construct through [`normalized`] so the
/// `from` field always carries the output side.
///
/// [`normalized`]: CreateConnectionRequest::normalized
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateConnectionRequest {
    pub from: Endpoint,
    pub to: Endpoint,
}

impl CreateConnectionRequest {
    /// Pair two clicked routes into a request, output in `from` and
    /// input in `to` regardless of which was clicked first.
    pub fn normalized(first: RouteHit, second: RouteHit) -> Self {
        if first.direction == second.direction {
            // The server rejects these; send anyway and let it decide.
            log::warn!("pairing two {:?} routes", first.direction);
        }
        let from = if first.direction == Direction::Output { first } else { second };
        let to = if second.direction == Direction::Input { second } else { first };
        Self { from: from.endpoint(), to: to.endpoint() }
    }
}

/// One outbound request, ready for the HTTP channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    CreateBlock(CreateBlockRequest),
    CreateConnection(CreateConnectionRequest),
    /// `PUT blocks/{id}/position` with the node's final drag position.
    MoveNode { id: EntityId, position: Position },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn connection_request_wire_shape() {
        let req = CreateConnectionRequest {
            from: Endpoint { id: EntityId::intern("b1"), route: 0 },
            to: Endpoint { id: EntityId::intern("b2"), route: 1 },
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "from": {"id": "b1", "route": 0},
                "to": {"id": "b2", "route": 1}
            })
        );
    }

    #[test]
    fn block_request_uses_wire_type_key() {
        let req = CreateBlockRequest {
            type_tag: "delay".into(),
            parent: EntityId::intern("root"),
            position: Position::new(1.0, 2.0),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["type"], json!("delay"));
        assert_eq!(value["position"], json!({"x": 1.0, "y": 2.0}));
    }
}
