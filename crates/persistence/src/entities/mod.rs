//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod push_subscription;
pub mod user;
pub mod zone;

pub use push_subscription::PushSubscriptionEntity;
pub use user::UserEntity;
pub use zone::{InvalidColumn, ZoneEntity};
