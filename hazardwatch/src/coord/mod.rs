//! Geographic coordinate types and navigation mathematics.
//!
//! Provides the [`Position`] value type and great-circle distance
//! calculations used by the move gate and the zone selector. All
//! coordinates are WGS84 degrees.
//!
//! # Coordinate System
//!
//! - Latitude: degrees north (-90 to 90)
//! - Longitude: degrees east (-180 to 180)
//! - Distance: meters

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Degrees to radians conversion factor.
const DEG_TO_RAD: f64 = PI / 180.0;

/// A geographic position in WGS84 degrees.
///
/// Immutable value type produced by an external location source and
/// consumed by the evaluation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees north.
    pub latitude: f64,
    /// Longitude in degrees east.
    pub longitude: f64,
}

impl Position {
    /// Create a new position.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another position in meters.
    pub fn distance_to(&self, other: &Position) -> f64 {
        distance_meters(*self, *other)
    }

    /// Whether both coordinates are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Calculate the great-circle distance between two positions in meters.
///
/// Uses the haversine formula, which is accurate for the short to medium
/// distances the move gate cares about.
///
/// # Examples
///
/// ```
/// use hazardwatch::coord::{distance_meters, Position};
///
/// // 1 degree of latitude is approximately 111 km
/// let d = distance_meters(Position::new(0.0, 0.0), Position::new(1.0, 0.0));
/// assert!((d - 111_195.0).abs() < 500.0);
/// ```
pub fn distance_meters(from: Position, to: Position) -> f64 {
    let lat1_rad = from.latitude * DEG_TO_RAD;
    let lat2_rad = to.latitude * DEG_TO_RAD;
    let delta_lat = (to.latitude - from.latitude) * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    // Haversine formula
    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}
