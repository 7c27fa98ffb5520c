//! Location update orchestration.
//!
//! Runs the geofence engine for a sample, dispatches the resulting events and
//! prunes endpoints the push service reported as gone.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::evaluation::{EngineError, GeofenceEngine};
use super::notification::{DeliveryReport, NotificationDispatcher, PushMessage, PushSender};
use super::store::{EndpointStore, StoreError, ZoneStore};
use crate::models::{LocationSample, TriggerEvent};

/// Result of handling one location sample.
#[derive(Debug, Clone, Default)]
pub struct LocationUpdateOutcome {
    pub events: Vec<TriggerEvent>,
    /// Delivery reports of all events, in event order.
    pub deliveries: Vec<DeliveryReport>,
    /// Endpoints deleted because they were reported gone.
    pub pruned_endpoints: Vec<Uuid>,
}

/// Errors from the test notification operation.
#[derive(Debug, thiserror::Error)]
pub enum TestNotificationError {
    #[error("No subscriptions found")]
    NoSubscriptions,

    #[error("Failed to load subscriptions: {0}")]
    Store(#[from] StoreError),
}

/// Ties the engine, the endpoint store and the dispatcher together.
pub struct LocationUpdateService {
    engine: GeofenceEngine,
    endpoints: Arc<dyn EndpointStore>,
    dispatcher: NotificationDispatcher,
}

impl LocationUpdateService {
    pub fn new(
        zones: Arc<dyn ZoneStore>,
        endpoints: Arc<dyn EndpointStore>,
        sender: Arc<dyn PushSender>,
    ) -> Self {
        Self {
            engine: GeofenceEngine::new(zones),
            endpoints,
            dispatcher: NotificationDispatcher::new(sender),
        }
    }

    pub fn engine(&self) -> &GeofenceEngine {
        &self.engine
    }

    /// Evaluates the sample, notifies the user of every fired zone and
    /// deletes gone endpoints. Only a zone listing failure is an error.
    pub async fn handle(&self, sample: &LocationSample) -> Result<LocationUpdateOutcome, EngineError> {
        let events = self.engine.process_location_update(sample).await?;
        let mut outcome = LocationUpdateOutcome {
            events,
            ..Default::default()
        };

        if outcome.events.is_empty() {
            return Ok(outcome);
        }

        let endpoints = match self.endpoints.list_endpoints_for_user(sample.user_id).await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                warn!(
                    user_id = %sample.user_id,
                    error = %e,
                    "Failed to load push endpoints, events not delivered"
                );
                return Ok(outcome);
            }
        };

        for event in &outcome.events {
            let reports = self.dispatcher.dispatch(event, &endpoints).await;
            outcome.deliveries.extend(reports);
        }

        let mut seen = HashSet::new();
        let gone: Vec<Uuid> = outcome
            .deliveries
            .iter()
            .filter(|r| r.terminal())
            .map(|r| r.endpoint_id)
            .filter(|id| seen.insert(*id))
            .collect();

        for endpoint_id in gone {
            match self.endpoints.delete_endpoint(endpoint_id).await {
                Ok(()) => {
                    warn!(user_id = %sample.user_id, endpoint_id = %endpoint_id, "Pruned gone push endpoint");
                    outcome.pruned_endpoints.push(endpoint_id);
                }
                Err(StoreError::NotFound) => {}
                Err(e) => warn!(
                    endpoint_id = %endpoint_id,
                    error = %e,
                    "Failed to prune push endpoint"
                ),
            }
        }

        info!(
            user_id = %sample.user_id,
            events = outcome.events.len(),
            deliveries = outcome.deliveries.len(),
            pruned = outcome.pruned_endpoints.len(),
            "Location update processed"
        );

        Ok(outcome)
    }

    /// Sends the fixed test notification to all endpoints of the user.
    pub async fn send_test_notification(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<DeliveryReport>, TestNotificationError> {
        let endpoints = self.endpoints.list_endpoints_for_user(user_id).await?;
        if endpoints.is_empty() {
            return Err(TestNotificationError::NoSubscriptions);
        }

        Ok(self
            .dispatcher
            .send_to_all(&endpoints, &PushMessage::test())
            .await)
    }
}
