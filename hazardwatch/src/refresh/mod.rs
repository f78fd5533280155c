//! Move-triggered hazard data refresh gating.
//!
//! Hazard zones come from an external feed. Refetching on every GPS fix
//! would be wasteful, so the [`MoveGate`] only asks the external
//! collaborator to refresh when the entity has moved far enough from the
//! last fetch location. Whether the refresh succeeds, retries, or backs
//! off is entirely the collaborator's concern.

use tracing::debug;

use crate::coord::{distance_meters, Position};

/// External collaborator that fetches fresh hazard data.
///
/// `request_refresh` is fire-and-forget: no parameters beyond "refresh
/// now", no result. Implementations typically spawn the actual fetch and
/// push the resulting zone snapshot back into the engine.
pub trait HazardRefresher: Send + Sync {
    /// Ask the collaborator to refresh hazard data now.
    fn request_refresh(&self);
}

/// Distance function signature, injectable for testing.
pub type DistanceFn = fn(Position, Position) -> f64;

/// Default refresh displacement threshold: 5 km.
pub const DEFAULT_REFRESH_DISTANCE_M: f64 = 5_000.0;

/// Decides whether hazard data should be refetched based on displacement
/// since the last fetch.
///
/// The anchor starts unset, so the first position always triggers a
/// fetch. It only advances after a triggered fetch, which makes
/// `should_fetch` idempotent for small movements: repeated calls near the
/// anchor stay `false` until displacement exceeds the threshold.
#[derive(Debug)]
pub struct MoveGate {
    threshold_m: f64,
    distance: DistanceFn,
    anchor: Option<Position>,
}

impl MoveGate {
    /// Create a gate with the given displacement threshold in meters.
    pub fn new(threshold_m: f64) -> Self {
        Self {
            threshold_m,
            distance: distance_meters,
            anchor: None,
        }
    }

    /// Override the distance function (great-circle by default).
    pub fn with_distance_fn(mut self, distance: DistanceFn) -> Self {
        self.distance = distance;
        self
    }

    /// Whether a refresh should be triggered for this position.
    pub fn should_fetch(&self, current: &Position) -> bool {
        match &self.anchor {
            None => true,
            Some(anchor) => (self.distance)(*anchor, *current) > self.threshold_m,
        }
    }

    /// Trigger a refresh if the gate allows it.
    ///
    /// On trigger, calls the refresher and advances the anchor to
    /// `current`. Returns whether a refresh was requested.
    pub fn execute(&mut self, current: &Position, refresher: &dyn HazardRefresher) -> bool {
        if !self.should_fetch(current) {
            return false;
        }

        debug!(
            position = %current,
            first_fetch = self.anchor.is_none(),
            "Requesting hazard refresh"
        );
        refresher.request_refresh();
        self.anchor = Some(*current);
        true
    }

    /// Last position at which a refresh was triggered, for diagnostics.
    pub fn anchor(&self) -> Option<Position> {
        self.anchor
    }
}
