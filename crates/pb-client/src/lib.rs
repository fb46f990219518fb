pub mod api;
pub mod pump;
pub mod router;

pub use api::{ApiClient, ApiError};
pub use pump::PumpEvent;
pub use router::{OutboundFrame, SubscriptionRouter};
