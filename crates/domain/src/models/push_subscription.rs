//! Push subscription (notification endpoint) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A user-owned Web Push subscription that trigger events are delivered to.
#[derive(Clone, PartialEq, Eq)]
pub struct NotificationEndpoint {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Push service URL; unique across all users.
    pub endpoint: String,
    /// Client P-256 public key, base64url.
    pub p256dh: String,
    /// Client auth secret, base64url.
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for NotificationEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationEndpoint")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("endpoint", &self.endpoint)
            .field("p256dh", &self.p256dh)
            .field("auth", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Browser `PushSubscription.toJSON()` payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[validate(url(message = "Endpoint must be a valid URL"))]
    pub endpoint: String,

    /// Epoch milliseconds or null in the browser payload; not stored.
    pub expiration_time: Option<f64>,

    #[validate(nested)]
    pub keys: SubscriptionKeys,
}

/// Encryption keys of a push subscription.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubscriptionKeys {
    #[validate(length(min = 1, message = "p256dh key is required"))]
    pub p256dh: String,

    #[validate(length(min = 1, message = "auth secret is required"))]
    pub auth: String,
}

/// Response payload for a subscription upsert.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeResponse {
    pub message: String,
}

/// Per-endpoint result of a test notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointDeliveryResult {
    pub endpoint: String,
    pub success: bool,
}

/// Response payload for a test notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestNotificationResponse {
    pub success: bool,
    pub results: Vec<EndpointDeliveryResult>,
}
