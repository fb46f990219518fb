//! Per-entity-type stores.
//!
//! Each store owns the authoritative client-side map for one entity
//! family and mutates it only from bus events. Reads hand out clones:
//! callers must treat a snapshot as on-loan and re-fetch after the next
//! notification, because the store may delete or replace the underlying
//! entity at any event.
//!
//! All stores share the same tolerant semantics (the server is
//! authoritative): duplicate `create` warns and keeps the existing
//! entity untouched; `update`/`delete` for an unknown id warns and is a
//! no-op; `id` is immutable once created. Every observable mutation ends
//! with a synchronous notify.

mod connection;
mod library;
mod node;
mod rootgroup;
mod route;

pub use connection::ConnectionStore;
pub use library::LibraryStore;
pub use node::NodeStore;
pub use rootgroup::RootGroupStore;
pub use route::RouteStore;
