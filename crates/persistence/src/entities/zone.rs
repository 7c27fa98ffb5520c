//! Zone entity (database row mapping for the reminders table).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{OccupancyState, TriggerType, Zone};

/// Database row mapping for the reminders table.
#[derive(Debug, Clone, FromRow)]
pub struct ZoneEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub trigger_type: String,
    pub occupancy_state: String,
    pub ever_triggered: bool,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A column held a value the domain does not know.
#[derive(Debug, thiserror::Error)]
#[error("Invalid {column} value in reminders row: {value}")]
pub struct InvalidColumn {
    pub column: &'static str,
    pub value: String,
}

impl TryFrom<ZoneEntity> for Zone {
    type Error = InvalidColumn;

    fn try_from(entity: ZoneEntity) -> Result<Self, Self::Error> {
        let trigger_type =
            TriggerType::parse(&entity.trigger_type).ok_or_else(|| InvalidColumn {
                column: "trigger_type",
                value: entity.trigger_type.clone(),
            })?;
        let occupancy_state =
            OccupancyState::parse(&entity.occupancy_state).ok_or_else(|| InvalidColumn {
                column: "occupancy_state",
                value: entity.occupancy_state.clone(),
            })?;

        Ok(Self {
            id: entity.id,
            owner_id: entity.user_id,
            latitude: entity.latitude,
            longitude: entity.longitude,
            radius_meters: entity.radius_meters,
            trigger_type,
            occupancy_state,
            ever_triggered: entity.ever_triggered,
            message: entity.message,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_zone_entity() -> ZoneEntity {
        ZoneEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            latitude: 37.7749,
            longitude: -122.4194,
            radius_meters: 150.0,
            trigger_type: "ENTER".to_string(),
            occupancy_state: "OUTSIDE".to_string(),
            ever_triggered: false,
            message: "Pick up the dry cleaning".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_zone_entity_to_domain() {
        let entity = create_test_zone_entity();
        let zone = Zone::try_from(entity.clone()).unwrap();

        assert_eq!(zone.id, entity.id);
        assert_eq!(zone.owner_id, entity.user_id);
        assert_eq!(zone.latitude, entity.latitude);
        assert_eq!(zone.longitude, entity.longitude);
        assert_eq!(zone.radius_meters, entity.radius_meters);
        assert_eq!(zone.trigger_type, TriggerType::Enter);
        assert_eq!(zone.occupancy_state, OccupancyState::Outside);
        assert_eq!(zone.message, entity.message);
    }

    #[test]
    fn test_zone_entity_exit_inside() {
        let mut entity = create_test_zone_entity();
        entity.trigger_type = "EXIT".to_string();
        entity.occupancy_state = "INSIDE".to_string();
        entity.ever_triggered = true;

        let zone = Zone::try_from(entity).unwrap();
        assert_eq!(zone.trigger_type, TriggerType::Exit);
        assert_eq!(zone.occupancy_state, OccupancyState::Inside);
        assert!(zone.ever_triggered);
    }

    #[test]
    fn test_zone_entity_rejects_unknown_trigger() {
        let mut entity = create_test_zone_entity();
        entity.trigger_type = "DWELL".to_string();

        let err = Zone::try_from(entity).unwrap_err();
        assert_eq!(err.column, "trigger_type");
        assert_eq!(err.value, "DWELL");
    }

    #[test]
    fn test_zone_entity_rejects_unknown_state() {
        let mut entity = create_test_zone_entity();
        entity.occupancy_state = "unknown".to_string();

        assert!(Zone::try_from(entity).is_err());
    }
}
