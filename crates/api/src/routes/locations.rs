//! Location update endpoint.

use axum::{extract::State, Json};
use chrono::Utc;
use domain::models::location::{LocationUpdateRequest, LocationUpdateResponse};
use domain::models::{GeoPoint, LocationSample};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Evaluate a position sample against the caller's reminders.
///
/// POST /api/location/update
pub async fn update_location(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<LocationUpdateRequest>,
) -> Result<Json<LocationUpdateResponse>, ApiError> {
    request.validate()?;

    let sample = LocationSample {
        user_id: auth.user_id,
        point: GeoPoint::new(request.location.lat, request.location.lng),
        observed_at: Utc::now(),
    };

    let outcome = state.location_updates.handle(&sample).await?;

    Ok(Json(LocationUpdateResponse {
        success: true,
        triggered: outcome.events.len(),
    }))
}
