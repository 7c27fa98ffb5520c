//! Store contracts consumed by the geofence engine and the dispatcher.
//!
//! Implemented over PostgreSQL in the persistence crate and in memory for tests.

use uuid::Uuid;

use crate::models::{NotificationEndpoint, OccupancyState, Zone};

/// Errors reported by a store.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// The record no longer exists (e.g. deleted concurrently).
    #[error("Record not found")]
    NotFound,

    /// The backing store failed.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Durable zone state the engine reads and writes.
#[async_trait::async_trait]
pub trait ZoneStore: Send + Sync {
    /// Zones owned by the user, most recently created first.
    async fn list_zones_for_user(&self, user_id: Uuid) -> Result<Vec<Zone>, StoreError>;

    /// Writes occupancy and the ever-triggered flag of one zone in a single atomic step.
    async fn update_zone_state(
        &self,
        zone_id: Uuid,
        occupancy_state: OccupancyState,
        ever_triggered: bool,
    ) -> Result<(), StoreError>;
}

/// Notification endpoints registered by users.
#[async_trait::async_trait]
pub trait EndpointStore: Send + Sync {
    async fn list_endpoints_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<NotificationEndpoint>, StoreError>;

    /// Removes an endpoint the push service reported as gone.
    async fn delete_endpoint(&self, endpoint_id: Uuid) -> Result<(), StoreError>;
}
