//! Repository implementations for database operations.

pub mod push_subscription;
pub mod user;
pub mod zone;

pub use push_subscription::PushSubscriptionRepository;
pub use user::UserRepository;
pub use zone::ZoneRepository;
