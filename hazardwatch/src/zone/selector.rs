//! Containment predicate and highest-priority zone selection.
//!
//! This is the front of the evaluation pipeline: every position update is
//! checked against the current zone snapshot and at most one winning zone
//! is handed to the dwell tracker.

use tracing::warn;

use super::geometry::ZoneGeometry;
use super::model::Zone;
use crate::coord::Position;

/// Whether a zone contains the given position.
///
/// Two-step test:
/// 1. Cheap reject: if the zone has a bounding box and the point is
///    outside it, the boundary geometry is never evaluated.
/// 2. Precise test: parse the GeoJSON boundary and run the
///    boundary-exclusive point-in-polygon test.
///
/// Fail-safe behavior: a zone with no boundary geometry, an unparseable
/// boundary, or an empty region never contains anything, so bad hazard
/// data can never spuriously activate danger mode. Parse failures are
/// logged at `warn` with the zone id.
pub fn zone_contains(position: &Position, zone: &Zone) -> bool {
    if let Some(bbox) = &zone.bbox {
        if !bbox.contains(position) {
            return false;
        }
    }

    let Some(boundary) = &zone.boundary else {
        return false;
    };

    match ZoneGeometry::from_geojson(boundary) {
        Ok(geometry) => !geometry.is_empty() && geometry.contains(position),
        Err(error) => {
            warn!(
                zone = %zone.label(),
                %error,
                "Unparseable zone boundary, treating as non-containing"
            );
            false
        }
    }
}

/// Select the highest-priority zone containing the position, if any.
///
/// Zones without an id are skipped entirely; the dwell tracker could not
/// key them. Among containing zones, the numerically greatest
/// `alert_level` wins. Ties are broken by input order: the
/// first-encountered zone at the winning level is returned. This is
/// deliberate and stable, so overlapping zones at the same level resolve
/// the same way on every evaluation of the same snapshot.
pub fn select_highest_priority<'a>(position: &Position, zones: &'a [Zone]) -> Option<&'a Zone> {
    let mut best: Option<&Zone> = None;

    for zone in zones {
        if !zone.has_id() {
            continue;
        }
        if !zone_contains(position, zone) {
            continue;
        }
        // Strict comparison keeps the first-encountered zone on ties
        match best {
            Some(current) if zone.alert_level <= current.alert_level => {}
            _ => best = Some(zone),
        }
    }

    best
}
