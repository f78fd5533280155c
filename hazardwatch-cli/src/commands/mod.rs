//! CLI command implementations.

pub mod check;
pub mod watch;

use std::fs;
use std::path::Path;

use hazardwatch::zone::Zone;

use crate::error::CliError;

/// Load a zone snapshot from a JSON file.
///
/// The file holds a JSON array of zone objects; each carries an `id`,
/// an `alert_level`, an optional `bbox` and an optional GeoJSON
/// `boundary` (Polygon or MultiPolygon).
pub fn load_zones(path: &Path) -> Result<Vec<Zone>, CliError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CliError::Zones(format!("cannot read {}: {}", path.display(), e)))?;
    let zones: Vec<Zone> = serde_json::from_str(&raw)
        .map_err(|e| CliError::Zones(format!("cannot parse {}: {}", path.display(), e)))?;

    let untracked = zones.iter().filter(|z| !z.has_id()).count();
    if untracked > 0 {
        tracing::warn!(
            count = untracked,
            "Zones without an id are ignored during selection"
        );
    }

    Ok(zones)
}
