//! Location domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// One observed position for a user. Only lives for the duration of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    pub user_id: Uuid,
    pub point: GeoPoint,
    pub observed_at: DateTime<Utc>,
}

impl LocationSample {
    /// A sample observed now.
    pub fn now(user_id: Uuid, lat: f64, lng: f64) -> Self {
        Self {
            user_id,
            point: GeoPoint::new(lat, lng),
            observed_at: Utc::now(),
        }
    }
}

/// Request payload for a location update.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationUpdateRequest {
    #[validate(nested)]
    pub location: Coordinates,
}

/// Coordinates submitted by the client.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct Coordinates {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub lat: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub lng: f64,
}

/// Response payload for a location update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdateResponse {
    pub success: bool,
    /// Number of reminders that fired for this sample.
    pub triggered: usize,
}
