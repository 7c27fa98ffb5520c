//! In-memory store implementations.
//!
//! Used by tests and local development. Each store can be told to fail
//! specific operations so failure isolation can be exercised.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use super::store::{EndpointStore, StoreError, ZoneStore};
use crate::models::{NotificationEndpoint, OccupancyState, Zone};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct ZoneTable {
    zones: HashMap<Uuid, Zone>,
    failing_updates: HashSet<Uuid>,
    vanish_on_update: HashSet<Uuid>,
    listing_failure: Option<String>,
    update_calls: usize,
}

/// Zone store backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryZoneStore {
    inner: Mutex<ZoneTable>,
}

impl InMemoryZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given zones.
    pub fn with_zones(zones: impl IntoIterator<Item = Zone>) -> Self {
        let store = Self::new();
        for zone in zones {
            store.insert(zone);
        }
        store
    }

    pub fn insert(&self, zone: Zone) {
        lock(&self.inner).zones.insert(zone.id, zone);
    }

    pub fn get(&self, zone_id: Uuid) -> Option<Zone> {
        lock(&self.inner).zones.get(&zone_id).cloned()
    }

    pub fn remove(&self, zone_id: Uuid) -> Option<Zone> {
        lock(&self.inner).zones.remove(&zone_id)
    }

    /// Makes every update of this zone fail with a backend error.
    pub fn fail_updates_for(&self, zone_id: Uuid) {
        lock(&self.inner).failing_updates.insert(zone_id);
    }

    /// Deletes the zone right before its next update, as a concurrent delete would.
    pub fn delete_before_update(&self, zone_id: Uuid) {
        lock(&self.inner).vanish_on_update.insert(zone_id);
    }

    /// Makes listing fail with a backend error.
    pub fn fail_listing(&self, reason: impl Into<String>) {
        lock(&self.inner).listing_failure = Some(reason.into());
    }

    /// Number of `update_zone_state` calls received so far.
    pub fn update_calls(&self) -> usize {
        lock(&self.inner).update_calls
    }
}

#[async_trait::async_trait]
impl ZoneStore for InMemoryZoneStore {
    async fn list_zones_for_user(&self, user_id: Uuid) -> Result<Vec<Zone>, StoreError> {
        let table = lock(&self.inner);
        if let Some(reason) = &table.listing_failure {
            return Err(StoreError::Backend(reason.clone()));
        }

        let mut zones: Vec<Zone> = table
            .zones
            .values()
            .filter(|z| z.owner_id == user_id)
            .cloned()
            .collect();
        zones.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(zones)
    }

    async fn update_zone_state(
        &self,
        zone_id: Uuid,
        occupancy_state: OccupancyState,
        ever_triggered: bool,
    ) -> Result<(), StoreError> {
        let mut table = lock(&self.inner);
        table.update_calls += 1;

        if table.failing_updates.contains(&zone_id) {
            return Err(StoreError::Backend("simulated write failure".to_string()));
        }
        if table.vanish_on_update.remove(&zone_id) {
            table.zones.remove(&zone_id);
        }

        let zone = table.zones.get_mut(&zone_id).ok_or(StoreError::NotFound)?;
        zone.occupancy_state = occupancy_state;
        zone.ever_triggered = ever_triggered;
        zone.updated_at = chrono::Utc::now();
        Ok(())
    }
}

#[derive(Debug, Default)]
struct EndpointTable {
    endpoints: Vec<NotificationEndpoint>,
    listing_failure: Option<String>,
    deleted: Vec<Uuid>,
}

/// Endpoint store backed by a vector.
#[derive(Debug, Default)]
pub struct InMemoryEndpointStore {
    inner: Mutex<EndpointTable>,
}

impl InMemoryEndpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoints(endpoints: impl IntoIterator<Item = NotificationEndpoint>) -> Self {
        let store = Self::new();
        lock(&store.inner).endpoints.extend(endpoints);
        store
    }

    /// Endpoints currently stored.
    pub fn endpoints(&self) -> Vec<NotificationEndpoint> {
        lock(&self.inner).endpoints.clone()
    }

    /// IDs passed to `delete_endpoint`, in call order.
    pub fn deleted(&self) -> Vec<Uuid> {
        lock(&self.inner).deleted.clone()
    }

    pub fn fail_listing(&self, reason: impl Into<String>) {
        lock(&self.inner).listing_failure = Some(reason.into());
    }
}

#[async_trait::async_trait]
impl EndpointStore for InMemoryEndpointStore {
    async fn list_endpoints_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<NotificationEndpoint>, StoreError> {
        let table = lock(&self.inner);
        if let Some(reason) = &table.listing_failure {
            return Err(StoreError::Backend(reason.clone()));
        }
        Ok(table
            .endpoints
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_endpoint(&self, endpoint_id: Uuid) -> Result<(), StoreError> {
        let mut table = lock(&self.inner);
        table.deleted.push(endpoint_id);

        let before = table.endpoints.len();
        table.endpoints.retain(|e| e.id != endpoint_id);
        if table.endpoints.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
