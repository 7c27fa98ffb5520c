//! Push subscription endpoints.

use axum::{extract::State, Json};
use domain::models::push_subscription::{
    EndpointDeliveryResult, SubscribeRequest, SubscribeResponse, TestNotificationResponse,
};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Register (or take over) a browser push subscription.
///
/// POST /api/push/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, ApiError> {
    request.validate()?;

    let endpoint = state
        .subscriptions
        .upsert(
            auth.user_id,
            &request.endpoint,
            &request.keys.p256dh,
            &request.keys.auth,
        )
        .await?;

    tracing::info!(
        user_id = %auth.user_id,
        subscription_id = %endpoint.id,
        "Push subscription saved"
    );

    Ok(Json(SubscribeResponse {
        message: "Subscription saved successfully".to_string(),
    }))
}

/// Send the fixed test notification to every endpoint of the caller.
///
/// POST /api/push/test
pub async fn send_test(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<TestNotificationResponse>, ApiError> {
    let reports = state
        .location_updates
        .send_test_notification(auth.user_id)
        .await?;

    let results = reports
        .into_iter()
        .map(|report| EndpointDeliveryResult {
            success: report.success(),
            endpoint: report.endpoint,
        })
        .collect();

    Ok(Json(TestNotificationResponse {
        success: true,
        results,
    }))
}
