//! Domain services for ZoneNotify.
//!
//! The geofence engine, the notification dispatcher that consumes its events,
//! and the store contracts both depend on.

pub mod evaluation;
pub mod geometry;
pub mod location_update;
pub mod memory_store;
pub mod notification;
pub mod store;

pub use evaluation::{
    classify, should_fire, EngineError, EvaluationReport, GeofenceEngine, ZoneOutcome,
};
pub use geometry::distance_meters;
pub use location_update::{LocationUpdateOutcome, LocationUpdateService, TestNotificationError};
pub use memory_store::{InMemoryEndpointStore, InMemoryZoneStore};
pub use notification::{
    DeliveryOutcome, DeliveryReport, LogPushSender, MockPushSender, NotificationDispatcher,
    PushMessage, PushSender,
};
pub use store::{EndpointStore, StoreError, ZoneStore};
