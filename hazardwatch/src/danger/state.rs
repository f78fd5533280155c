//! The danger state snapshot type.

use std::collections::HashSet;

use serde::Serialize;

use crate::zone::Zone;

/// Highest representable danger level; `set_danger_level` clamps to this.
pub const MAX_DANGER_LEVEL: u8 = 3;

/// A complete, immutable snapshot of danger mode.
///
/// `is_active` and `activating_zone` always change together: automatic
/// activation carries the confirming zone, manual activation clears it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DangerState {
    /// Whether danger mode is active.
    pub is_active: bool,

    /// The zone whose confirmation triggered the current automatic
    /// activation. `None` when inactive or manually activated.
    pub activating_zone: Option<Zone>,

    /// True when activation was user-initiated. While set, zone entry and
    /// exit events change nothing; only `manual_deactivate` clears it.
    pub manual_override: bool,

    /// Active behavior preset, orthogonal to the activation state.
    pub preset: String,

    /// Capability tags enabled for downstream consumers.
    pub capabilities: HashSet<String>,

    /// Danger level, clamped to `0..=MAX_DANGER_LEVEL`.
    pub danger_level: u8,
}

impl Default for DangerState {
    fn default() -> Self {
        Self {
            is_active: false,
            activating_zone: None,
            manual_override: false,
            preset: String::new(),
            capabilities: HashSet::new(),
            danger_level: 0,
        }
    }
}

impl DangerState {
    /// Id of the activating zone, if any.
    pub fn activating_zone_id(&self) -> Option<&str> {
        self.activating_zone.as_ref().map(|zone| zone.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_inactive() {
        let state = DangerState::default();
        assert!(!state.is_active);
        assert!(state.activating_zone.is_none());
        assert!(!state.manual_override);
        assert_eq!(state.danger_level, 0);
    }

    #[test]
    fn test_activating_zone_id() {
        let mut state = DangerState::default();
        assert!(state.activating_zone_id().is_none());

        state.activating_zone = Some(Zone::new("z1", 3));
        assert_eq!(state.activating_zone_id(), Some("z1"));
    }
}
