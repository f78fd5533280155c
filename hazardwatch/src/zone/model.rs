//! Core data types for hazard zones.
//!
//! Types here mirror the records supplied by the external hazard feed.
//! The engine never mutates them; snapshots are replaced wholesale.

use serde::{Deserialize, Serialize};

use crate::coord::Position;

/// Axis-aligned geographic bounding box used as a cheap pre-filter.
///
/// Stored as (min_lon, min_lat, max_lon, max_lat) to match the feed's
/// four-tuple ordering. A malformed box (min > max on either axis) never
/// matches any point; it is treated as data noise, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Westernmost longitude.
    pub min_lon: f64,
    /// Southernmost latitude.
    pub min_lat: f64,
    /// Easternmost longitude.
    pub max_lon: f64,
    /// Northernmost latitude.
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Whether the box has well-formed ordering (min <= max on both axes).
    pub fn is_well_formed(&self) -> bool {
        self.min_lon <= self.max_lon && self.min_lat <= self.max_lat
    }

    /// Whether the box contains the given position.
    ///
    /// A malformed box contains nothing.
    pub fn contains(&self, position: &Position) -> bool {
        self.is_well_formed()
            && (self.min_lat..=self.max_lat).contains(&position.latitude)
            && (self.min_lon..=self.max_lon).contains(&position.longitude)
    }
}

/// A hazard zone record from the external feed.
///
/// Zones with an empty `id` are skipped entirely by the selector: without
/// a stable identifier the debounce tracker cannot key entry records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Stable unique identifier. Empty means the record is untrackable.
    #[serde(default)]
    pub id: String,

    /// Optional human-readable name for logging and display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Alert severity level; higher is more severe. Absent in the feed
    /// means lowest priority (0).
    #[serde(default)]
    pub alert_level: i32,

    /// Optional bounding box for the cheap containment pre-filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,

    /// Optional boundary geometry as a raw GeoJSON `Polygon` or
    /// `MultiPolygon` geometry object. Parsed on evaluation; parse
    /// failures are fail-safe non-containing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<serde_json::Value>,
}

impl Zone {
    /// Create a zone with an id and alert level and no geometry.
    ///
    /// Mostly useful in tests; real zones come from the feed via serde.
    pub fn new(id: impl Into<String>, alert_level: i32) -> Self {
        Self {
            id: id.into(),
            name: None,
            alert_level,
            bbox: None,
            boundary: None,
        }
    }

    /// Attach a bounding box.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Attach a GeoJSON boundary geometry.
    pub fn with_boundary(mut self, boundary: serde_json::Value) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Whether this zone carries a usable identifier.
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Display label: name if present, id otherwise.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod bounding_box {
        use super::*;

        #[test]
        fn test_contains_inside() {
            let bbox = BoundingBox::new(9.0, 53.0, 11.0, 54.0);
            assert!(bbox.contains(&Position::new(53.5, 10.0)));
        }

        #[test]
        fn test_contains_outside() {
            let bbox = BoundingBox::new(9.0, 53.0, 11.0, 54.0);
            assert!(!bbox.contains(&Position::new(52.0, 10.0)));
            assert!(!bbox.contains(&Position::new(53.5, 12.0)));
        }

        #[test]
        fn test_contains_on_edge() {
            // The bbox is only a pre-filter, so edge inclusion is fine here;
            // the precise boundary test decides final containment.
            let bbox = BoundingBox::new(9.0, 53.0, 11.0, 54.0);
            assert!(bbox.contains(&Position::new(53.0, 9.0)));
            assert!(bbox.contains(&Position::new(54.0, 11.0)));
        }

        #[test]
        fn test_malformed_box_matches_nothing() {
            let bbox = BoundingBox::new(11.0, 54.0, 9.0, 53.0);
            assert!(!bbox.is_well_formed());
            assert!(!bbox.contains(&Position::new(53.5, 10.0)));
        }

        mod properties {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                #[test]
                fn malformed_never_contains(
                    lat in -90.0f64..90.0,
                    lon in -180.0f64..180.0,
                ) {
                    // min/max swapped on both axes
                    let bbox = BoundingBox::new(10.0, 50.0, 5.0, 45.0);
                    prop_assert!(!bbox.contains(&Position::new(lat, lon)));
                }
            }
        }
    }

    mod zone {
        use super::*;

        #[test]
        fn test_deserialize_minimal() {
            let zone: Zone = serde_json::from_str(r#"{"id": "z1"}"#).unwrap();
            assert_eq!(zone.id, "z1");
            assert_eq!(zone.alert_level, 0);
            assert!(zone.bbox.is_none());
            assert!(zone.boundary.is_none());
        }

        #[test]
        fn test_deserialize_full() {
            let json = r#"{
                "id": "z2",
                "name": "Flood area",
                "alert_level": 3,
                "bbox": {"min_lon": 9.0, "min_lat": 53.0, "max_lon": 11.0, "max_lat": 54.0},
                "boundary": {"type": "Polygon", "coordinates": [[[9.0,53.0],[11.0,53.0],[11.0,54.0],[9.0,54.0],[9.0,53.0]]]}
            }"#;
            let zone: Zone = serde_json::from_str(json).unwrap();
            assert_eq!(zone.alert_level, 3);
            assert_eq!(zone.label(), "Flood area");
            assert!(zone.bbox.unwrap().is_well_formed());
            assert!(zone.boundary.is_some());
        }

        #[test]
        fn test_missing_id_is_untrackable() {
            let zone: Zone = serde_json::from_str(r#"{"alert_level": 2}"#).unwrap();
            assert!(!zone.has_id());
        }

        #[test]
        fn test_label_falls_back_to_id() {
            let zone = Zone::new("z3", 1);
            assert_eq!(zone.label(), "z3");
        }
    }
}
