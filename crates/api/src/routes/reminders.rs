//! Reminder zone endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::zone::{CreateReminderRequest, ReminderResponse};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Response body for a deleted reminder.
#[derive(Debug, Serialize)]
pub struct DeleteReminderResponse {
    pub message: String,
}

/// List the caller's reminders, newest first.
///
/// GET /api/reminders
pub async fn list_reminders(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<Vec<ReminderResponse>>, ApiError> {
    let zones = state.zones.find_by_user_id(auth.user_id).await?;
    Ok(Json(zones.into_iter().map(ReminderResponse::from).collect()))
}

/// Create a reminder. New zones start OUTSIDE and untriggered.
///
/// POST /api/reminders
pub async fn create_reminder(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateReminderRequest>,
) -> Result<(StatusCode, Json<ReminderResponse>), ApiError> {
    request.validate()?;

    let zone = state
        .zones
        .create(
            auth.user_id,
            request.location.lat,
            request.location.lng,
            request.radius,
            request.trigger_type,
            request.message.trim(),
        )
        .await?;

    tracing::info!(
        user_id = %auth.user_id,
        zone_id = %zone.id,
        trigger_type = %zone.trigger_type,
        radius_meters = zone.radius_meters,
        "Reminder created"
    );

    Ok((StatusCode::CREATED, Json(zone.into())))
}

/// Delete one of the caller's reminders.
///
/// DELETE /api/reminders/:id
pub async fn delete_reminder(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(zone_id): Path<Uuid>,
) -> Result<Json<DeleteReminderResponse>, ApiError> {
    let zone = state
        .zones
        .find_by_id(zone_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Reminder not found".to_string()))?;

    if zone.owner_id != auth.user_id {
        tracing::warn!(
            user_id = %auth.user_id,
            zone_id = %zone_id,
            "Attempt to delete another user's reminder"
        );
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    if state.zones.delete(zone_id).await? == 0 {
        return Err(ApiError::NotFound("Reminder not found".to_string()));
    }

    tracing::info!(user_id = %auth.user_id, zone_id = %zone_id, "Reminder deleted");

    Ok(Json(DeleteReminderResponse {
        message: "Reminder deleted successfully".to_string(),
    }))
}
