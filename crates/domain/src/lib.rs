//! Domain layer for the ZoneNotify backend.
//!
//! This crate contains:
//! - Domain models (Zone, NotificationEndpoint, User, LocationSample)
//! - The geofence evaluation engine and notification dispatcher
//! - Store traits implemented by the persistence layer

pub mod models;
pub mod services;
