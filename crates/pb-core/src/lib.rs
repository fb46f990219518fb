pub mod bus;
pub mod error;
pub mod event;
pub mod id;
pub mod model;
pub mod observe;
pub mod store;

pub use bus::{EventBus, Subscription};
pub use error::{DecodeError, ProtocolViolation};
pub use event::{decode_frame, Event};
pub use id::EntityId;
pub use model::*;
pub use observe::{ListenerId, ListenerSet, Observable};
pub use store::{ConnectionStore, LibraryStore, NodeStore, RootGroupStore, RouteStore};
