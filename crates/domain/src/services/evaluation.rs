//! Geofence evaluation engine.
//!
//! For one location sample, every zone of the sample's user is classified as
//! inside or outside, compared against its recorded occupancy, and written
//! back. A zone fires only on the transition its trigger type names
//! (edge-triggered): ENTER on OUTSIDE→INSIDE, EXIT on INSIDE→OUTSIDE.
//!
//! Evaluations for the same user are serialized by a per-user async lock so
//! two samples never interleave their read-modify-write of a zone. Different
//! users run in parallel.

use std::sync::Arc;

use dashmap::DashMap;
use metrics::counter;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::geometry::distance_meters;
use super::store::{StoreError, ZoneStore};
use crate::models::{GeoPoint, LocationSample, OccupancyState, TriggerEvent, TriggerType, Zone};

/// Errors that abort a whole evaluation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to list zones for user: {0}")]
    ListZones(#[source] StoreError),
}

/// Occupancy for a sample at `distance` from a zone center. The boundary counts as inside.
pub fn classify(distance: f64, radius: f64) -> OccupancyState {
    if distance <= radius {
        OccupancyState::Inside
    } else {
        OccupancyState::Outside
    }
}

/// Edge-trigger rule.
pub fn should_fire(
    trigger_type: TriggerType,
    previous: OccupancyState,
    current: OccupancyState,
) -> bool {
    matches!(
        (trigger_type, previous, current),
        (TriggerType::Enter, OccupancyState::Outside, OccupancyState::Inside)
            | (TriggerType::Exit, OccupancyState::Inside, OccupancyState::Outside)
    )
}

/// Pure evaluation of one zone against one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneEvaluation {
    pub distance_meters: f64,
    pub current: OccupancyState,
    pub fired: bool,
    /// Sticky flag to persist: never goes back to false.
    pub ever_triggered: bool,
}

impl ZoneEvaluation {
    pub fn of(zone: &Zone, point: GeoPoint) -> Self {
        let distance = distance_meters(point, zone.center());
        let current = classify(distance, zone.radius_meters);
        let fired = should_fire(zone.trigger_type, zone.occupancy_state, current);

        Self {
            distance_meters: distance,
            current,
            fired,
            ever_triggered: zone.ever_triggered || fired,
        }
    }
}

/// What happened to a single zone during an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneOutcome {
    /// State written, no fire.
    Updated,
    /// State written and a trigger event emitted.
    Fired,
    /// Zone was deleted before its state could be written; skipped.
    Vanished,
    /// Writing state failed; skipped.
    PersistFailed(String),
}

/// Result of evaluating one sample.
#[derive(Debug, Clone, Default)]
pub struct EvaluationReport {
    pub outcomes: Vec<(Uuid, ZoneOutcome)>,
    pub events: Vec<TriggerEvent>,
}

impl EvaluationReport {
    pub fn outcome_for(&self, zone_id: Uuid) -> Option<&ZoneOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| *id == zone_id)
            .map(|(_, outcome)| outcome)
    }
}

/// Evaluates location samples against stored zones.
pub struct GeofenceEngine {
    store: Arc<dyn ZoneStore>,
    user_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl GeofenceEngine {
    pub fn new(store: Arc<dyn ZoneStore>) -> Self {
        Self {
            store,
            user_locks: DashMap::new(),
        }
    }

    /// Processes one sample and returns the trigger events that fired.
    ///
    /// Per-zone problems are absorbed; only failing to list the user's zones
    /// is an error.
    pub async fn process_location_update(
        &self,
        sample: &LocationSample,
    ) -> Result<Vec<TriggerEvent>, EngineError> {
        Ok(self.evaluate(sample).await?.events)
    }

    /// Like [`process_location_update`](Self::process_location_update) but
    /// also reports the per-zone outcomes.
    pub async fn evaluate(&self, sample: &LocationSample) -> Result<EvaluationReport, EngineError> {
        let user_id = sample.user_id;
        let lock = self.user_lock(user_id);

        let result = {
            let _guard = lock.lock().await;
            self.evaluate_locked(sample).await
        };

        drop(lock);
        self.release_user_lock(user_id);
        result
    }

    async fn evaluate_locked(&self, sample: &LocationSample) -> Result<EvaluationReport, EngineError> {
        let user_id = sample.user_id;
        let zones = self
            .store
            .list_zones_for_user(user_id)
            .await
            .map_err(EngineError::ListZones)?;

        let mut report = EvaluationReport::default();

        for zone in &zones {
            let eval = ZoneEvaluation::of(zone, sample.point);
            debug!(
                user_id = %user_id,
                zone_id = %zone.id,
                distance_meters = eval.distance_meters,
                radius_meters = zone.radius_meters,
                previous = %zone.occupancy_state,
                current = %eval.current,
                "Zone evaluated"
            );

            let outcome = match self
                .store
                .update_zone_state(zone.id, eval.current, eval.ever_triggered)
                .await
            {
                Ok(()) if eval.fired => {
                    info!(
                        user_id = %user_id,
                        zone_id = %zone.id,
                        trigger_type = %zone.trigger_type,
                        "Geofence triggered"
                    );
                    counter!("geofence_triggers_total", "trigger_type" => zone.trigger_type.as_str())
                        .increment(1);
                    report.events.push(TriggerEvent {
                        zone_id: zone.id,
                        owner_id: user_id,
                        message: zone.message.clone(),
                    });
                    ZoneOutcome::Fired
                }
                Ok(()) => ZoneOutcome::Updated,
                Err(StoreError::NotFound) => {
                    warn!(
                        user_id = %user_id,
                        zone_id = %zone.id,
                        "Zone disappeared during evaluation, skipping"
                    );
                    ZoneOutcome::Vanished
                }
                Err(StoreError::Backend(reason)) => {
                    warn!(
                        user_id = %user_id,
                        zone_id = %zone.id,
                        error = %reason,
                        "Failed to persist zone state, skipping"
                    );
                    ZoneOutcome::PersistFailed(reason)
                }
            };

            report.outcomes.push((zone.id, outcome));
        }

        Ok(report)
    }

    fn user_lock(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    // Drops the entry once nobody else holds or waits on it.
    fn release_user_lock(&self, user_id: Uuid) {
        self.user_locks
            .remove_if(&user_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of users with an evaluation in flight or queued.
    pub fn active_users(&self) -> usize {
        self.user_locks.len()
    }
}
