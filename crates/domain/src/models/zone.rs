//! Zone (reminder geofence) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::location::GeoPoint;

/// A user's circular geofence with its last evaluated occupancy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub trigger_type: TriggerType,
    pub occupancy_state: OccupancyState,
    pub ever_triggered: bool,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Zone {
    /// Center of the zone.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Which transition direction fires a zone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerType {
    Enter,
    Exit,
}

impl TriggerType {
    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Enter => "ENTER",
            TriggerType::Exit => "EXIT",
        }
    }

    /// Parses from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ENTER" => Some(TriggerType::Enter),
            "EXIT" => Some(TriggerType::Exit),
            _ => None,
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the last processed sample was inside a zone.
///
/// Zones start `Outside`; there is no unknown state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OccupancyState {
    Inside,
    #[default]
    Outside,
}

impl OccupancyState {
    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OccupancyState::Inside => "INSIDE",
            OccupancyState::Outside => "OUTSIDE",
        }
    }

    /// Parses from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INSIDE" => Some(OccupancyState::Inside),
            "OUTSIDE" => Some(OccupancyState::Outside),
            _ => None,
        }
    }
}

impl std::fmt::Display for OccupancyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emitted when a zone fires. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    pub zone_id: Uuid,
    pub owner_id: Uuid,
    pub message: String,
}

/// Request payload for creating a reminder zone.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderRequest {
    #[validate(nested)]
    pub location: ReminderLocation,

    #[validate(custom(function = "shared::validation::validate_radius"))]
    pub radius: f64,

    #[validate(
        length(min = 1, max = 500, message = "Message must be 1-500 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub message: String,

    pub trigger_type: TriggerType,
}

/// Zone center as submitted by clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct ReminderLocation {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub lat: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub lng: f64,
}

/// Reminder as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location: ReminderLocation,
    pub radius: f64,
    pub message: String,
    pub trigger_type: TriggerType,
    pub occupancy_state: OccupancyState,
    pub ever_triggered: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Zone> for ReminderResponse {
    fn from(z: Zone) -> Self {
        Self {
            id: z.id,
            user_id: z.owner_id,
            location: ReminderLocation {
                lat: z.latitude,
                lng: z.longitude,
            },
            radius: z.radius_meters,
            message: z.message,
            trigger_type: z.trigger_type,
            occupancy_state: z.occupancy_state,
            ever_triggered: z.ever_triggered,
            created_at: z.created_at,
        }
    }
}
