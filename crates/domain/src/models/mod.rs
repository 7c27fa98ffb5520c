//! Domain models for ZoneNotify.

pub mod location;
pub mod push_subscription;
pub mod user;
pub mod zone;

pub use location::{GeoPoint, LocationSample};
pub use push_subscription::NotificationEndpoint;
pub use user::User;
pub use zone::{OccupancyState, TriggerEvent, TriggerType, Zone};
