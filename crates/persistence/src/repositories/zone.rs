//! Zone repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{OccupancyState, TriggerType, Zone};
use domain::services::{StoreError, ZoneStore};

use crate::entities::ZoneEntity;
use crate::metrics::QueryTimer;

fn to_domain(entity: ZoneEntity) -> Result<Zone, sqlx::Error> {
    Zone::try_from(entity).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

pub(crate) fn to_store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::Backend(other.to_string()),
    }
}

/// Repository for the reminders table.
#[derive(Clone)]
pub struct ZoneRepository {
    pool: PgPool,
}

impl ZoneRepository {
    /// Creates a new ZoneRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a zone. New zones start OUTSIDE and never triggered.
    pub async fn create(
        &self,
        owner_id: Uuid,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
        trigger_type: TriggerType,
        message: &str,
    ) -> Result<Zone, sqlx::Error> {
        let timer = QueryTimer::new("create_zone");
        let result = sqlx::query_as::<_, ZoneEntity>(
            r#"
            INSERT INTO reminders (user_id, latitude, longitude, radius_meters, trigger_type, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(latitude)
        .bind(longitude)
        .bind(radius_meters)
        .bind(trigger_type.as_str())
        .bind(message)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        to_domain(result?)
    }

    /// Find a zone by ID.
    pub async fn find_by_id(&self, zone_id: Uuid) -> Result<Option<Zone>, sqlx::Error> {
        let timer = QueryTimer::new("find_zone_by_id");
        let result = sqlx::query_as::<_, ZoneEntity>(
            r#"
            SELECT * FROM reminders WHERE id = $1
            "#,
        )
        .bind(zone_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result?.map(to_domain).transpose()
    }

    /// All zones of a user, most recently created first.
    pub async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Zone>, sqlx::Error> {
        let timer = QueryTimer::new("find_zones_by_user");
        let result = sqlx::query_as::<_, ZoneEntity>(
            r#"
            SELECT * FROM reminders
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        result?.into_iter().map(to_domain).collect()
    }

    /// Write occupancy and the ever-triggered flag in one statement.
    /// Returns the number of rows updated (0 or 1).
    pub async fn update_state(
        &self,
        zone_id: Uuid,
        occupancy_state: OccupancyState,
        ever_triggered: bool,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("update_zone_state");
        let result = sqlx::query(
            r#"
            UPDATE reminders SET
                occupancy_state = $2,
                ever_triggered = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(zone_id)
        .bind(occupancy_state.as_str())
        .bind(ever_triggered)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.rows_affected())
    }

    /// Delete a zone.
    /// Returns the number of rows deleted (0 or 1).
    pub async fn delete(&self, zone_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_zone");
        let result = sqlx::query(
            r#"
            DELETE FROM reminders WHERE id = $1
            "#,
        )
        .bind(zone_id)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.rows_affected())
    }
}

#[async_trait::async_trait]
impl ZoneStore for ZoneRepository {
    async fn list_zones_for_user(&self, user_id: Uuid) -> Result<Vec<Zone>, StoreError> {
        self.find_by_user_id(user_id).await.map_err(to_store_error)
    }

    async fn update_zone_state(
        &self,
        zone_id: Uuid,
        occupancy_state: OccupancyState,
        ever_triggered: bool,
    ) -> Result<(), StoreError> {
        match self
            .update_state(zone_id, occupancy_state, ever_triggered)
            .await
            .map_err(to_store_error)?
        {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert_eq!(to_store_error(sqlx::Error::RowNotFound), StoreError::NotFound);
    }

    #[test]
    fn test_other_errors_map_to_backend() {
        let err = to_store_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
