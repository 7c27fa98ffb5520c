//! Common validation utilities.
//!
//! Coordinates are checked here, at ingestion. The geofence engine itself
//! treats whatever it receives as ordinary coordinates.

use validator::ValidationError;

/// Smallest radius a reminder zone may have, in meters.
pub const MIN_RADIUS_METERS: f64 = 1.0;

/// Largest radius a reminder zone may have, in meters.
pub const MAX_RADIUS_METERS: f64 = 100_000.0;

/// Validates that a latitude value is finite and within range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if lat.is_finite() && (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is finite and within range (-180 to 180).
pub fn validate_longitude(lng: f64) -> Result<(), ValidationError> {
    if lng.is_finite() && (-180.0..=180.0).contains(&lng) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates a zone radius in meters.
pub fn validate_radius(radius: f64) -> Result<(), ValidationError> {
    if radius.is_finite() && (MIN_RADIUS_METERS..=MAX_RADIUS_METERS).contains(&radius) {
        Ok(())
    } else {
        let mut err = ValidationError::new("radius_range");
        err.message = Some("Radius must be between 1 and 100000 meters".into());
        Err(err)
    }
}

/// Validates that a string is not blank after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}
