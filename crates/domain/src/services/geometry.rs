//! Great-circle distance between coordinates.

use geo::{HaversineDistance, Point};

use crate::models::GeoPoint;

/// Spherical (haversine) distance between two points in meters, using the
/// mean Earth radius.
///
/// No range validation: out-of-range coordinates are computed as-is.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    // Fixed operand order keeps the result bit-for-bit symmetric.
    let (first, second) = if (a.lat, a.lng) <= (b.lat, b.lng) {
        (a, b)
    } else {
        (b, a)
    };

    to_point(first).haversine_distance(&to_point(second))
}

fn to_point(p: GeoPoint) -> Point<f64> {
    Point::new(p.lng, p.lat)
}
