//! Push subscription repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::NotificationEndpoint;
use domain::services::{EndpointStore, StoreError};

use super::zone::to_store_error;
use crate::entities::PushSubscriptionEntity;
use crate::metrics::QueryTimer;

/// Repository for the push_subscriptions table.
#[derive(Clone)]
pub struct PushSubscriptionRepository {
    pool: PgPool,
}

impl PushSubscriptionRepository {
    /// Creates a new PushSubscriptionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a subscription, or take over an existing one with the same endpoint URL.
    ///
    /// Browsers reuse endpoint URLs across logins, so the latest subscriber
    /// owns the endpoint and its keys are refreshed.
    pub async fn upsert(
        &self,
        user_id: Uuid,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<NotificationEndpoint, sqlx::Error> {
        let timer = QueryTimer::new("upsert_push_subscription");
        let result = sqlx::query_as::<_, PushSubscriptionEntity>(
            r#"
            INSERT INTO push_subscriptions (user_id, endpoint, p256dh, auth)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (endpoint) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                p256dh = EXCLUDED.p256dh,
                auth = EXCLUDED.auth
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(endpoint)
        .bind(p256dh)
        .bind(auth)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.into())
    }

    /// All subscriptions of a user, oldest first.
    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<NotificationEndpoint>, sqlx::Error> {
        let timer = QueryTimer::new("find_push_subscriptions_by_user");
        let result = sqlx::query_as::<_, PushSubscriptionEntity>(
            r#"
            SELECT * FROM push_subscriptions
            WHERE user_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.into_iter().map(Into::into).collect())
    }

    /// Delete a subscription.
    /// Returns the number of rows deleted (0 or 1).
    pub async fn delete(&self, subscription_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_push_subscription");
        let result = sqlx::query(
            r#"
            DELETE FROM push_subscriptions WHERE id = $1
            "#,
        )
        .bind(subscription_id)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.rows_affected())
    }
}

#[async_trait::async_trait]
impl EndpointStore for PushSubscriptionRepository {
    async fn list_endpoints_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<NotificationEndpoint>, StoreError> {
        self.find_by_user_id(user_id).await.map_err(to_store_error)
    }

    async fn delete_endpoint(&self, endpoint_id: Uuid) -> Result<(), StoreError> {
        match self.delete(endpoint_id).await.map_err(to_store_error)? {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }
}
