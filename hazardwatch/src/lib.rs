//! Hazardwatch - geofence-driven danger mode for moving receivers
//!
//! This library tracks a position stream against a set of hazard zones
//! and drives an automatic "danger mode" from it: entering a zone and
//! dwelling there long enough activates the mode, leaving the zone
//! deactivates it, and manual operator control always wins over the
//! automatic path. A distance-gated refresh hook keeps the zone set
//! current as the receiver moves.
//!
//! The [`engine`] module ties everything together; the other modules
//! are usable on their own:
//!
//! - [`coord`]: positions and great-circle distance
//! - [`zone`]: zone model, GeoJSON boundaries, point-in-polygon tests
//! - [`dwell`]: debounced zone entry confirmation
//! - [`danger`]: the danger mode state machine
//! - [`refresh`]: the movement-gated refresh trigger

pub mod coord;
pub mod danger;
pub mod dwell;
pub mod engine;
pub mod logging;
pub mod refresh;
pub mod zone;

/// Library version as recorded in the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
