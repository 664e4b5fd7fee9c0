//! Great-circle distance and geofence evaluation. Pure functions, no I/O.

use super::entities::{Coordinate, Geofence};
use super::errors::DomainError;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two coordinates.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lng = (b.longitude() - a.longitude()).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude().to_radians().cos()
            * b.latitude().to_radians().cos()
            * (d_lng / 2.0).sin().powi(2);
    // Clamp: rounding can push h a hair above 1 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_M * c
}

/// Distance from raw degrees. Fails with `InvalidCoordinate` on out-of-range input.
pub fn distance_between(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Result<f64, DomainError> {
    let a = Coordinate::new(lat1, lng1)?;
    let b = Coordinate::new(lat2, lng2)?;
    Ok(distance_meters(a, b))
}

/// Inclusive: a point exactly on the boundary is inside.
pub fn is_inside(point: Coordinate, fence: &Geofence) -> bool {
    distance_meters(point, fence.center) <= fence.radius_meters
}

/// Meters beyond the radius, rounded to the nearest meter. Zero when inside.
pub fn excess_meters(point: Coordinate, fence: &Geofence) -> u64 {
    let excess = distance_meters(point, fence.center) - fence.radius_meters;
    if excess <= 0.0 { 0 } else { excess.round() as u64 }
}

impl Geofence {
    /// Returns the distance to the center, or `OutsideGeofence` when the point is outside.
    pub fn evaluate(&self, point: Coordinate) -> Result<f64, DomainError> {
        let distance = distance_meters(point, self.center);
        if distance <= self.radius_meters {
            Ok(distance)
        } else {
            Err(DomainError::OutsideGeofence {
                excess_meters: excess_meters(point, self),
            })
        }
    }
}
