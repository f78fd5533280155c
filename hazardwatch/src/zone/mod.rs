//! Hazard zone model and containment evaluation.
//!
//! A zone is a geographically bounded hazard area with a severity level.
//! Zones arrive as immutable snapshot lists from an external feed and are
//! evaluated against positions by the selector:
//!
//! ```text
//! Position ──► bbox pre-filter ──► GeoJSON boundary test ──► best zone
//! ```
//!
//! The precise boundary test is **boundary-exclusive**: a point exactly on
//! a ring edge counts as outside. Any parse failure or degenerate geometry
//! is fail-safe non-containing, so bad data never activates danger mode.

mod geometry;
mod model;
mod selector;

pub use geometry::{GeometryError, ZoneGeometry};
pub use model::{BoundingBox, Zone};
pub use selector::{select_highest_priority, zone_contains};
