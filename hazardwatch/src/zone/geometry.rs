//! GeoJSON boundary parsing and point-in-polygon containment.
//!
//! Zones carry their boundary as a raw GeoJSON `Polygon` or `MultiPolygon`
//! geometry object. Parsing is strict: anything malformed becomes a
//! [`GeometryError`] and the caller treats the zone as non-containing.
//!
//! # Containment Semantics
//!
//! The test is boundary-exclusive ("contains", not "covers"): a point
//! exactly on a ring edge or vertex is outside the zone. This also applies
//! to hole rings, so a point on a hole edge is outside too.

use serde::Deserialize;
use thiserror::Error;

use crate::coord::Position;

/// Errors produced while parsing a zone boundary.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The geometry `type` is not Polygon or MultiPolygon.
    #[error("unsupported geometry type: {0}")]
    UnsupportedType(String),

    /// The value is not a GeoJSON geometry object.
    #[error("malformed geometry: {0}")]
    Malformed(String),

    /// A coordinate is missing, non-numeric, or non-finite.
    #[error("invalid coordinate in ring {ring}: {reason}")]
    InvalidCoordinate { ring: usize, reason: String },

    /// A ring has fewer than 3 distinct vertices.
    #[error("degenerate ring with {0} distinct vertices")]
    DegenerateRing(usize),
}

/// Raw GeoJSON geometry shape, deserialized before validation.
#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
}

/// A point in ring space: (longitude, latitude).
type RingPoint = (f64, f64);

/// A validated ring: at least 3 distinct vertices, closing vertex removed.
type Ring = Vec<RingPoint>;

/// One polygon: an outer ring plus zero or more hole rings.
#[derive(Debug, Clone)]
struct PolygonRings {
    outer: Ring,
    holes: Vec<Ring>,
}

/// Where a point sits relative to a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RingSide {
    Inside,
    Outside,
    Boundary,
}

/// Parsed, validated boundary geometry for a zone.
///
/// Handles single polygons and multi-polygons, with holes excluded from
/// containment.
#[derive(Debug, Clone)]
pub struct ZoneGeometry {
    polygons: Vec<PolygonRings>,
}

impl ZoneGeometry {
    /// Parse a GeoJSON geometry value into validated rings.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] for anything other than a well-formed
    /// `Polygon` or `MultiPolygon` with finite coordinates and rings of at
    /// least 3 distinct vertices.
    pub fn from_geojson(value: &serde_json::Value) -> Result<Self, GeometryError> {
        let raw: RawGeometry = serde_json::from_value(value.clone()).map_err(|e| {
            // Distinguish an unknown geometry type from structural damage
            match value.get("type").and_then(|t| t.as_str()) {
                Some(t) if t != "Polygon" && t != "MultiPolygon" => {
                    GeometryError::UnsupportedType(t.to_string())
                }
                _ => GeometryError::Malformed(e.to_string()),
            }
        })?;

        let polygons = match raw {
            RawGeometry::Polygon { coordinates } => vec![validate_polygon(coordinates)?],
            RawGeometry::MultiPolygon { coordinates } => coordinates
                .into_iter()
                .map(validate_polygon)
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(Self { polygons })
    }

    /// Whether the geometry encloses no area at all.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Boundary-exclusive containment test.
    ///
    /// A point is contained when it is strictly inside some polygon's
    /// outer ring and strictly outside all of that polygon's holes.
    pub fn contains(&self, position: &Position) -> bool {
        let point = (position.longitude, position.latitude);
        self.polygons.iter().any(|polygon| {
            side_of_ring(point, &polygon.outer) == RingSide::Inside
                && polygon
                    .holes
                    .iter()
                    .all(|hole| side_of_ring(point, hole) == RingSide::Outside)
        })
    }
}

/// Validate one polygon's ring list: outer ring first, then holes.
fn validate_polygon(rings: Vec<Vec<Vec<f64>>>) -> Result<PolygonRings, GeometryError> {
    if rings.is_empty() {
        return Err(GeometryError::DegenerateRing(0));
    }

    let mut validated = Vec::with_capacity(rings.len());
    for (index, ring) in rings.into_iter().enumerate() {
        validated.push(validate_ring(index, ring)?);
    }

    let mut iter = validated.into_iter();
    let outer = iter.next().expect("at least one ring checked above");
    Ok(PolygonRings {
        outer,
        holes: iter.collect(),
    })
}

/// Validate a single ring: finite lon/lat pairs, >= 3 distinct vertices.
///
/// A GeoJSON closing vertex (last == first) is dropped.
fn validate_ring(ring_index: usize, raw: Vec<Vec<f64>>) -> Result<Ring, GeometryError> {
    let mut ring: Ring = Vec::with_capacity(raw.len());
    for point in raw {
        if point.len() < 2 {
            return Err(GeometryError::InvalidCoordinate {
                ring: ring_index,
                reason: format!("expected [lon, lat], got {} values", point.len()),
            });
        }
        let (lon, lat) = (point[0], point[1]);
        if !lon.is_finite() || !lat.is_finite() {
            return Err(GeometryError::InvalidCoordinate {
                ring: ring_index,
                reason: "non-finite coordinate".to_string(),
            });
        }
        ring.push((lon, lat));
    }

    // Drop the GeoJSON closing vertex, if present
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }

    let mut distinct = ring.clone();
    distinct.dedup();
    if distinct.len() < 3 {
        return Err(GeometryError::DegenerateRing(distinct.len()));
    }

    Ok(ring)
}

/// Classify a point against a ring with an even-odd crossing count.
///
/// Edge and vertex hits are detected first and reported as `Boundary` so
/// the caller can apply boundary-exclusive semantics.
fn side_of_ring(point: RingPoint, ring: &[RingPoint]) -> RingSide {
    let (x, y) = point;
    let mut inside = false;

    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[(i + 1) % ring.len()];

        if on_segment(point, (xi, yi), (xj, yj)) {
            return RingSide::Boundary;
        }

        // Even-odd rule: count edges crossing a horizontal ray to the east
        if (yi > y) != (yj > y) {
            let x_intersect = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_intersect {
                inside = !inside;
            }
        }
    }

    if inside {
        RingSide::Inside
    } else {
        RingSide::Outside
    }
}

/// Whether a point lies exactly on the segment from `a` to `b`.
fn on_segment(point: RingPoint, a: RingPoint, b: RingPoint) -> bool {
    let (px, py) = point;
    let (ax, ay) = a;
    let (bx, by) = b;

    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    if cross != 0.0 {
        return false;
    }

    px >= ax.min(bx) && px <= ax.max(bx) && py >= ay.min(by) && py <= ay.max(by)
}
