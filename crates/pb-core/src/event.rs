//! Typed events for the push channel.
//!
//! The wire carries JSON frames shaped `{action, type, data}` where `data`
//! nests the payload under the entity-type key, e.g.
//! `{"action":"create","type":"block","data":{"block":{...}}}`.
//!
//! Instead of switching on raw strings everywhere, each action × type
//! combination decodes into one variant of the closed [`Event`] enum, so
//! every store's handler is an exhaustive match the compiler checks.
//! Update payloads carry only the changed keys plus the immutable `id`.

use crate::error::DecodeError;
use crate::id::EntityId;
use crate::model::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use smallvec::SmallVec;

// ─── Partial update payloads ─────────────────────────────────────────────

/// For keys where an explicit `null` means "clear the field" rather than
/// "leave it alone". Serde's plain `Option` default collapses the two, so
/// these decode into a double `Option`: absent stays `None`, `null`
/// becomes `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Changed keys of a block `update`. Absent keys leave the field alone.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BlockPatch {
    pub id: EntityId,
    #[serde(rename = "type", default)]
    pub type_tag: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent: Option<Option<EntityId>>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub inputs: Option<SmallVec<[EntityId; 4]>>,
    #[serde(default)]
    pub outputs: Option<SmallVec<[EntityId; 4]>>,
}

/// Changed keys of a group `update`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GroupPatch {
    pub id: EntityId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent: Option<Option<EntityId>>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub translate: Option<Translate>,
}

/// Changed keys of a source `update`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SourcePatch {
    pub id: EntityId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent: Option<Option<EntityId>>,
    #[serde(default)]
    pub position: Option<Position>,
}

// ─── The event stream ────────────────────────────────────────────────────

/// Every event the bus can carry: one variant per action × entity-type
/// combination on the wire, plus the local control event `ResetGraph`
/// (topic switch) and `LibraryLoaded` (catalog fetched over the request
/// channel, replayed through the bus so ordering stays uniform).
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BlockCreate(Block),
    BlockUpdate(BlockPatch),
    BlockDelete { id: EntityId },
    BlockPosition { id: EntityId, position: Position },
    BlockAlias { id: EntityId, label: String },

    GroupCreate(Group),
    GroupUpdate(GroupPatch),
    GroupDelete { id: EntityId },
    GroupPosition { id: EntityId, position: Position },
    GroupAlias { id: EntityId, label: String },
    GroupRouteAlias { group: EntityId, route: EntityId, alias: String },
    GroupRouteHidden { group: EntityId, route: EntityId, hidden: bool },
    ChildAdd { group: EntityId, child: EntityId },
    ChildRemove { group: EntityId, child: EntityId },

    SourceCreate(Source),
    SourceUpdate(SourcePatch),
    SourceDelete { id: EntityId },
    SourcePosition { id: EntityId, position: Position },
    SourceAlias { id: EntityId, label: String },
    SourceParam { id: EntityId, param: String, value: String },

    RouteCreate(Route),
    RouteDelete { id: EntityId },
    RouteValue { id: EntityId, value: Option<serde_json::Value> },
    RouteStatus { id: EntityId, blocked: bool },

    ConnectionCreate(Connection),
    ConnectionDelete { id: EntityId },
    LinkCreate(Link),
    LinkDelete { id: EntityId },

    RootGroupCreate(Vec<RootGroupEntry>),
    RootGroupDelete(Vec<EntityId>),

    LibraryLoaded(Vec<LibraryEntry>),

    /// Server acknowledgment that a topic subscription took effect.
    /// Stores ignore it; it exists so subscribers can observe the
    /// boundary between topics in the stream itself.
    Subscribe { topic: String },

    /// All stores drop state derived from the previous topic.
    ResetGraph,
}

// ─── Frame decoding ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Frame {
    action: String,
    /// Absent on control frames (subscribe acknowledgments).
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct IdPayload {
    id: EntityId,
}

#[derive(Deserialize)]
struct PositionPayload {
    id: EntityId,
    position: Position,
}

#[derive(Deserialize)]
struct LabelPayload {
    id: EntityId,
    label: String,
}

#[derive(Deserialize)]
struct ChildPayload {
    group: IdPayload,
    child: IdPayload,
}

#[derive(Deserialize)]
struct GroupRouteAliasPayload {
    id: EntityId,
    route: EntityId,
    alias: String,
}

#[derive(Deserialize)]
struct GroupRouteHiddenPayload {
    id: EntityId,
    route: EntityId,
    hidden: bool,
}

#[derive(Deserialize)]
struct ValuePayload {
    id: EntityId,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct StatusPayload {
    id: EntityId,
    blocked: bool,
}

#[derive(Deserialize)]
struct ParamPayload {
    id: EntityId,
    param: String,
    value: String,
}

/// Pull the payload nested under `data.<key>` and deserialize it.
fn payload<T: DeserializeOwned>(data: &serde_json::Value, key: &str) -> Result<T, DecodeError> {
    let inner = data
        .get(key)
        .ok_or_else(|| DecodeError::MissingPayload(key.to_string()))?;
    Ok(serde_json::from_value(inner.clone())?)
}

/// Decode one inbound text frame into a typed event.
///
/// An unknown action/type pair or a shape mismatch is a [`DecodeError`];
/// the caller logs it and drops the frame without closing the channel.
pub fn decode_frame(text: &str) -> Result<Event, DecodeError> {
    let frame: Frame = serde_json::from_str(text)?;
    let data = &frame.data;

    let Some(kind) = frame.kind.as_deref() else {
        // Control frames carry no entity type.
        if frame.action == "subscribe" {
            let topic = frame
                .id
                .ok_or_else(|| DecodeError::MissingPayload("id".to_string()))?;
            return Ok(Event::Subscribe { topic });
        }
        return Err(DecodeError::UnknownEvent {
            kind: String::new(),
            action: frame.action,
        });
    };

    match (kind, frame.action.as_str()) {
        ("block", "create") => Ok(Event::BlockCreate(payload(data, "block")?)),
        ("block", "update") => Ok(Event::BlockUpdate(payload(data, "block")?)),
        ("block", "delete") => {
            let p: IdPayload = payload(data, "block")?;
            Ok(Event::BlockDelete { id: p.id })
        }
        ("block", "update_position") => {
            let p: PositionPayload = payload(data, "block")?;
            Ok(Event::BlockPosition { id: p.id, position: p.position })
        }
        ("block", "update_alias") => {
            let p: LabelPayload = payload(data, "block")?;
            Ok(Event::BlockAlias { id: p.id, label: p.label })
        }

        ("group", "create") => Ok(Event::GroupCreate(payload(data, "group")?)),
        ("group", "update") => Ok(Event::GroupUpdate(payload(data, "group")?)),
        ("group", "delete") => {
            let p: IdPayload = payload(data, "group")?;
            Ok(Event::GroupDelete { id: p.id })
        }
        ("group", "update_position") => {
            let p: PositionPayload = payload(data, "group")?;
            Ok(Event::GroupPosition { id: p.id, position: p.position })
        }
        ("group", "update_alias") => {
            let p: LabelPayload = payload(data, "group")?;
            Ok(Event::GroupAlias { id: p.id, label: p.label })
        }
        ("group", "update_group_route_alias") => {
            let p: GroupRouteAliasPayload = payload(data, "group")?;
            Ok(Event::GroupRouteAlias { group: p.id, route: p.route, alias: p.alias })
        }
        ("group", "update_group_route_hidden") => {
            let p: GroupRouteHiddenPayload = payload(data, "group")?;
            Ok(Event::GroupRouteHidden { group: p.id, route: p.route, hidden: p.hidden })
        }

        ("child", "create") => {
            let p: ChildPayload = serde_json::from_value(data.clone())?;
            Ok(Event::ChildAdd { group: p.group.id, child: p.child.id })
        }
        ("child", "delete") => {
            let p: ChildPayload = serde_json::from_value(data.clone())?;
            Ok(Event::ChildRemove { group: p.group.id, child: p.child.id })
        }

        ("source", "create") => Ok(Event::SourceCreate(payload(data, "source")?)),
        ("source", "update") => Ok(Event::SourceUpdate(payload(data, "source")?)),
        ("source", "delete") => {
            let p: IdPayload = payload(data, "source")?;
            Ok(Event::SourceDelete { id: p.id })
        }
        ("source", "update_position") => {
            let p: PositionPayload = payload(data, "source")?;
            Ok(Event::SourcePosition { id: p.id, position: p.position })
        }
        ("source", "update_alias") => {
            let p: LabelPayload = payload(data, "source")?;
            Ok(Event::SourceAlias { id: p.id, label: p.label })
        }
        ("source", "update_param") => {
            let p: ParamPayload = payload(data, "source")?;
            Ok(Event::SourceParam { id: p.id, param: p.param, value: p.value })
        }

        ("route", "create") => Ok(Event::RouteCreate(payload(data, "route")?)),
        ("route", "delete") => {
            let p: IdPayload = payload(data, "route")?;
            Ok(Event::RouteDelete { id: p.id })
        }
        ("route", "update_value") => {
            let p: ValuePayload = payload(data, "route")?;
            Ok(Event::RouteValue { id: p.id, value: p.value })
        }
        ("route", "update_status") => {
            let p: StatusPayload = payload(data, "route")?;
            Ok(Event::RouteStatus { id: p.id, blocked: p.blocked })
        }

        ("connection", "create") => Ok(Event::ConnectionCreate(payload(data, "connection")?)),
        ("connection", "delete") => {
            let p: IdPayload = payload(data, "connection")?;
            Ok(Event::ConnectionDelete { id: p.id })
        }
        ("link", "create") => Ok(Event::LinkCreate(payload(data, "link")?)),
        ("link", "delete") => {
            let p: IdPayload = payload(data, "link")?;
            Ok(Event::LinkDelete { id: p.id })
        }

        ("root_group", "create") => Ok(Event::RootGroupCreate(payload(data, "root_group")?)),
        ("root_group", "delete") => {
            let entries: Vec<IdPayload> = payload(data, "root_group")?;
            Ok(Event::RootGroupDelete(entries.into_iter().map(|e| e.id).collect()))
        }

        _ => Err(DecodeError::UnknownEvent {
            kind: kind.to_string(),
            action: frame.action,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_block_create() {
        let frame = r#"{
            "action": "create",
            "type": "block",
            "data": {"block": {
                "id": "b1",
                "type": "delay",
                "label": "",
                "position": {"x": 10.0, "y": 20.0},
                "inputs": ["b1_in_0"],
                "outputs": ["b1_out_0"]
            }}
        }"#;
        match decode_frame(frame).unwrap() {
            Event::BlockCreate(block) => {
                assert_eq!(block.id, EntityId::intern("b1"));
                assert_eq!(block.type_tag, "delay");
                assert_eq!(block.position, Position::new(10.0, 20.0));
                assert_eq!(block.inputs.len(), 1);
            }
            other => panic!("expected BlockCreate, got {other:?}"),
        }
    }

    #[test]
    fn decode_update_carries_only_changed_keys() {
        let frame = r#"{
            "action": "update",
            "type": "block",
            "data": {"block": {"id": "b1", "label": "renamed"}}
        }"#;
        match decode_frame(frame).unwrap() {
            Event::BlockUpdate(patch) => {
                assert_eq!(patch.id, EntityId::intern("b1"));
                assert_eq!(patch.label.as_deref(), Some("renamed"));
                assert_eq!(patch.position, None);
                assert_eq!(patch.type_tag, None);
            }
            other => panic!("expected BlockUpdate, got {other:?}"),
        }
    }

    #[test]
    fn decode_update_distinguishes_null_parent_from_absent() {
        let absent = r#"{
            "action": "update",
            "type": "block",
            "data": {"block": {"id": "b1", "label": "x"}}
        }"#;
        match decode_frame(absent).unwrap() {
            Event::BlockUpdate(patch) => assert_eq!(patch.parent, None),
            other => panic!("expected BlockUpdate, got {other:?}"),
        }

        let nulled = r#"{
            "action": "update",
            "type": "block",
            "data": {"block": {"id": "b1", "parent": null}}
        }"#;
        match decode_frame(nulled).unwrap() {
            Event::BlockUpdate(patch) => assert_eq!(patch.parent, Some(None)),
            other => panic!("expected BlockUpdate, got {other:?}"),
        }
    }

    #[test]
    fn decode_route_value_null_clears() {
        let frame = r#"{
            "action": "update_value",
            "type": "route",
            "data": {"route": {"id": "r1", "value": null}}
        }"#;
        assert_eq!(
            decode_frame(frame).unwrap(),
            Event::RouteValue { id: EntityId::intern("r1"), value: None }
        );
    }

    #[test]
    fn decode_root_group_batch() {
        let frame = r#"{
            "action": "create",
            "type": "root_group",
            "data": {"root_group": [{"id": "g1", "label": "main"}, {"id": "g2"}]}
        }"#;
        match decode_frame(frame).unwrap() {
            Event::RootGroupCreate(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].label, "main");
                assert_eq!(entries[1].label, "");
            }
            other => panic!("expected RootGroupCreate, got {other:?}"),
        }
    }

    #[test]
    fn decode_subscribe_acknowledgment() {
        assert_eq!(
            decode_frame(r#"{"action":"subscribe","id":"default"}"#).unwrap(),
            Event::Subscribe { topic: "default".into() }
        );
    }

    #[test]
    fn malformed_frame_is_an_error_not_a_panic() {
        assert!(decode_frame("not json").is_err());
        assert!(decode_frame(r#"{"action":"create","type":"widget","data":{}}"#).is_err());
        assert!(decode_frame(r#"{"action":"create","type":"block","data":{}}"#).is_err());
    }
}
