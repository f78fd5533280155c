//! The danger state machine.
//!
//! Three activation states with the transition table:
//!
//! ```text
//!              auto_activate(z)             manual_activate
//! INACTIVE ───────────────────► AUTO_ACTIVE(z) ──────────► MANUAL_ACTIVE
//!    ▲  ▲                          │     ▲                      │
//!    │  └── auto_deactivate ───────┘     └─ auto_activate(z')   │
//!    │          (zone exit)                 (last confirmation  │
//!    │                                       wins)              │
//!    └────────────────── manual_deactivate ─────────────────────┘
//! ```
//!
//! Manual activation suppresses all automatic transitions until the user
//! deactivates. Configuration mutators (preset, capabilities, danger
//! level) are orthogonal and always apply.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::state::{DangerState, MAX_DANGER_LEVEL};
use crate::zone::Zone;

/// Default capacity of the snapshot broadcast channel.
const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Owns the authoritative [`DangerState`] and publishes transitions.
///
/// Lives inside the engine's evaluation task; all mutation happens there.
/// Consumers observe through the shared snapshot cell or the broadcast
/// channel, both updated atomically per transition.
pub struct DangerStateMachine {
    state: DangerState,

    /// Pull access for external readers.
    shared: Arc<RwLock<DangerState>>,

    /// Push access; send errors (no subscribers) are ignored.
    updates_tx: broadcast::Sender<DangerState>,
}

impl DangerStateMachine {
    /// Create a machine in the inactive default state.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a machine with a specific broadcast channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let state = DangerState::default();
        let (updates_tx, _) = broadcast::channel(capacity);
        Self {
            shared: Arc::new(RwLock::new(state.clone())),
            state,
            updates_tx,
        }
    }

    /// Current state (engine-internal view).
    pub fn state(&self) -> &DangerState {
        &self.state
    }

    /// Shared cell handed to external readers for snapshot access.
    pub fn shared(&self) -> Arc<RwLock<DangerState>> {
        Arc::clone(&self.shared)
    }

    /// Subscribe to state snapshots; one message per transition.
    pub fn subscribe(&self) -> broadcast::Receiver<DangerState> {
        self.updates_tx.subscribe()
    }

    /// Sender handle for constructing additional subscriptions.
    pub fn updates_sender(&self) -> broadcast::Sender<DangerState> {
        self.updates_tx.clone()
    }

    /// Automatic activation from a confirmed zone.
    ///
    /// No-op while manually active, and while already auto-active for the
    /// same zone. A different confirmed zone replaces the current one
    /// (last confirmation wins).
    pub fn auto_activate(&mut self, zone: Zone) {
        if self.state.manual_override {
            debug!(zone = %zone.label(), "Auto-activation suppressed by manual override");
            return;
        }
        if self.state.is_active && self.state.activating_zone_id() == Some(zone.id.as_str()) {
            return;
        }

        info!(
            zone = %zone.label(),
            alert_level = zone.alert_level,
            "Danger mode auto-activated"
        );
        self.state.is_active = true;
        self.state.activating_zone = Some(zone);
        self.publish();
    }

    /// Automatic deactivation on zone exit.
    ///
    /// No-op while manually active (manual state is never cleared by zone
    /// exit) and while already inactive.
    pub fn auto_deactivate(&mut self) {
        if self.state.manual_override || !self.state.is_active {
            return;
        }

        info!("Danger mode auto-deactivated");
        self.state.is_active = false;
        self.state.activating_zone = None;
        self.publish();
    }

    /// User-initiated activation from any state.
    ///
    /// Clears the activating zone; subsequent zone entry and exit events
    /// change neither `is_active` nor `activating_zone`.
    pub fn manual_activate(&mut self) {
        if self.state.manual_override {
            return;
        }

        info!("Danger mode manually activated");
        self.state.is_active = true;
        self.state.activating_zone = None;
        self.state.manual_override = true;
        self.publish();
    }

    /// User-initiated deactivation; only leaves the manual state.
    pub fn manual_deactivate(&mut self) {
        if !self.state.manual_override {
            return;
        }

        info!("Danger mode manually deactivated");
        self.state.is_active = false;
        self.state.activating_zone = None;
        self.state.manual_override = false;
        self.publish();
    }

    /// Set the behavior preset. Always applies.
    pub fn set_preset(&mut self, preset: String) {
        if self.state.preset == preset {
            return;
        }
        debug!(preset = %preset, "Preset changed");
        self.state.preset = preset;
        self.publish();
    }

    /// Replace the capability tag set. Always applies.
    pub fn set_capabilities(&mut self, capabilities: HashSet<String>) {
        if self.state.capabilities == capabilities {
            return;
        }
        debug!(count = capabilities.len(), "Capabilities changed");
        self.state.capabilities = capabilities;
        self.publish();
    }

    /// Set the danger level, clamped into `0..=MAX_DANGER_LEVEL`.
    pub fn set_danger_level(&mut self, level: i32) {
        let clamped = level.clamp(0, MAX_DANGER_LEVEL as i32) as u8;
        if self.state.danger_level == clamped {
            return;
        }
        debug!(level = clamped, requested = level, "Danger level changed");
        self.state.danger_level = clamped;
        self.publish();
    }

    /// Write the snapshot cell and broadcast, as one logical update.
    fn publish(&self) {
        *self.shared.write() = self.state.clone();
        let _ = self.updates_tx.send(self.state.clone());
    }
}

impl Default for DangerStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(id: &str, level: i32) -> Zone {
        Zone::new(id, level)
    }

    #[test]
    fn test_auto_activate_from_inactive() {
        let mut machine = DangerStateMachine::new();
        machine.auto_activate(zone("z1", 3));

        assert!(machine.state().is_active);
        assert_eq!(machine.state().activating_zone_id(), Some("z1"));
        assert!(!machine.state().manual_override);
    }

    #[test]
    fn test_auto_activate_last_confirmation_wins() {
        let mut machine = DangerStateMachine::new();
        machine.auto_activate(zone("z1", 3));
        machine.auto_activate(zone("z2", 2));

        assert!(machine.state().is_active);
        assert_eq!(machine.state().activating_zone_id(), Some("z2"));
    }

    #[test]
    fn test_auto_deactivate_clears_zone() {
        let mut machine = DangerStateMachine::new();
        machine.auto_activate(zone("z1", 3));
        machine.auto_deactivate();

        assert!(!machine.state().is_active);
        assert!(machine.state().activating_zone.is_none());
    }

    #[test]
    fn test_auto_deactivate_when_inactive_is_noop() {
        let mut machine = DangerStateMachine::new();
        let mut rx = machine.subscribe();
        machine.auto_deactivate();

        assert!(!machine.state().is_active);
        assert!(rx.try_recv().is_err(), "no-op must not publish");
    }

    #[test]
    fn test_manual_activate_clears_activating_zone() {
        let mut machine = DangerStateMachine::new();
        machine.auto_activate(zone("z1", 3));
        machine.manual_activate();

        assert!(machine.state().is_active);
        assert!(machine.state().activating_zone.is_none());
        assert!(machine.state().manual_override);
    }

    #[test]
    fn test_manual_override_suppresses_auto_transitions() {
        let mut machine = DangerStateMachine::new();
        machine.manual_activate();

        machine.auto_activate(zone("z1", 3));
        assert!(machine.state().activating_zone.is_none(), "zone entry ignored");

        machine.auto_deactivate();
        assert!(machine.state().is_active, "zone exit ignored");
    }

    #[test]
    fn test_manual_deactivate_only_leaves_manual_state() {
        let mut machine = DangerStateMachine::new();

        // Not manually active: no-op
        machine.auto_activate(zone("z1", 3));
        machine.manual_deactivate();
        assert!(machine.state().is_active);

        machine.manual_activate();
        machine.manual_deactivate();
        assert!(!machine.state().is_active);
        assert!(!machine.state().manual_override);
    }

    #[test]
    fn test_danger_level_clamped() {
        let mut machine = DangerStateMachine::new();

        machine.set_danger_level(5);
        assert_eq!(machine.state().danger_level, 3);

        machine.set_danger_level(-1);
        assert_eq!(machine.state().danger_level, 0);

        machine.set_danger_level(2);
        assert_eq!(machine.state().danger_level, 2);
    }

    #[test]
    fn test_config_mutators_orthogonal_to_activation() {
        let mut machine = DangerStateMachine::new();
        machine.manual_activate();

        machine.set_preset("silent".to_string());
        machine.set_capabilities(["sms".to_string()].into_iter().collect());
        machine.set_danger_level(1);

        let state = machine.state();
        assert!(state.is_active);
        assert_eq!(state.preset, "silent");
        assert!(state.capabilities.contains("sms"));
        assert_eq!(state.danger_level, 1);
    }

    #[test]
    fn test_transitions_publish_complete_snapshots() {
        let mut machine = DangerStateMachine::new();
        let mut rx = machine.subscribe();

        machine.auto_activate(zone("z1", 3));
        let snapshot = rx.try_recv().unwrap();
        assert!(snapshot.is_active);
        assert_eq!(snapshot.activating_zone_id(), Some("z1"));

        machine.auto_deactivate();
        let snapshot = rx.try_recv().unwrap();
        assert!(!snapshot.is_active);
        assert!(snapshot.activating_zone.is_none());
    }

    #[test]
    fn test_shared_cell_tracks_state() {
        let mut machine = DangerStateMachine::new();
        let shared = machine.shared();

        machine.auto_activate(zone("z1", 3));
        assert!(shared.read().is_active);

        machine.auto_deactivate();
        assert!(!shared.read().is_active);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn danger_level_always_in_range(level in i32::MIN..i32::MAX) {
                let mut machine = DangerStateMachine::new();
                machine.set_danger_level(level);
                prop_assert!(machine.state().danger_level <= MAX_DANGER_LEVEL);
            }
        }
    }
}
