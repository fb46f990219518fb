//! Error taxonomy for the synchronization engine.
//!
//! Nothing in here is fatal to the client: protocol violations are warned
//! and skipped (the server is authoritative, and a duplicate or early
//! event is either a harmless re-delivery or a transient ordering
//! artifact), malformed frames are dropped with the connection left open,
//! and only re-entrant bus dispatch — a programming error — aborts loudly.

use thiserror::Error;

/// An inbound frame that could not be turned into a typed event.
/// The frame is dropped and stream processing continues.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("undecodable frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is missing its `{0}` payload")]
    MissingPayload(String),

    #[error("unknown event {kind}/{action}")]
    UnknownEvent { kind: String, action: String },
}

/// A store-level condition that violates the protocol's ordering
/// assumptions. Logged as a warning; the offending event is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("duplicate create for {kind} {id}; keeping existing")]
    DuplicateCreate { kind: &'static str, id: String },

    #[error("update for unknown {kind} {id}")]
    UpdateUnknown { kind: &'static str, id: String },

    #[error("delete for unknown {kind} {id}")]
    DeleteUnknown { kind: &'static str, id: String },
}
