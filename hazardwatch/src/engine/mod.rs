//! The serialized evaluation pipeline.
//!
//! One engine task owns everything mutable: the zone snapshot, the dwell
//! tracker, the danger state machine, and the move gate. All inbound
//! mutation arrives as [`EngineCommand`]s on a single channel and is
//! processed in order, so entry records and danger state are never
//! touched concurrently:
//!
//! ```text
//! position ──► MoveGate ──► ZoneSelector ──► DwellTracker ──► DangerStateMachine
//!                 │(maybe)                        │ timers                │
//!                 ▼                               ▼                       ▼
//!          HazardRefresher             DwellElapsed channel      snapshot + broadcast
//! ```
//!
//! Dwell timers run as independent tokio tasks and synchronize by posting
//! their firing back onto the engine's event channel; the generation
//! guard in the tracker makes a firing that raced a cancellation inert.
//!
//! # Example
//!
//! ```ignore
//! use hazardwatch::engine::{EngineConfig, HazardEngine};
//!
//! let (handle, task) = HazardEngine::spawn(EngineConfig::default(), refresher, token)?;
//! handle.replace_zones(zones);
//! handle.update_position(position);
//! let state = handle.danger_state();
//! ```

mod config;

pub use config::{ConfigError, EngineConfig, DEFAULT_DWELL_MS};

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::coord::Position;
use crate::danger::{DangerState, DangerStateMachine};
use crate::dwell::{DwellElapsed, DwellTracker};
use crate::refresh::{HazardRefresher, MoveGate};
use crate::zone::{select_highest_priority, Zone};

/// Inbound mutations, processed in order by the engine task.
#[derive(Debug)]
pub enum EngineCommand {
    /// A position fix from the external location source.
    Position(Position),

    /// Replace the zone snapshot wholesale.
    ReplaceZones(Vec<Zone>),

    /// User-initiated activation.
    ManualActivate,

    /// User-initiated deactivation.
    ManualDeactivate,

    /// Change the behavior preset.
    SetPreset(String),

    /// Replace the capability tag set.
    SetCapabilities(HashSet<String>),

    /// Set the danger level (clamped to 0..=3).
    SetDangerLevel(i32),
}

/// Cloneable handle for feeding and observing a running engine.
///
/// Mutations are fire-and-forget sends onto the engine's command channel;
/// if the engine has shut down they are silently dropped. Reads go
/// through shared snapshot cells and never block the pipeline.
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::UnboundedSender<EngineCommand>,
    danger: Arc<RwLock<DangerState>>,
    updates_tx: broadcast::Sender<DangerState>,
    fetch_anchor: Arc<RwLock<Option<Position>>>,
}

impl EngineHandle {
    /// Feed a position fix into the pipeline.
    pub fn update_position(&self, position: Position) {
        let _ = self.command_tx.send(EngineCommand::Position(position));
    }

    /// Replace the zone snapshot. Takes effect on the next position fix.
    pub fn replace_zones(&self, zones: Vec<Zone>) {
        let _ = self.command_tx.send(EngineCommand::ReplaceZones(zones));
    }

    /// Activate danger mode manually (suppresses automatic transitions).
    pub fn manual_activate(&self) {
        let _ = self.command_tx.send(EngineCommand::ManualActivate);
    }

    /// Deactivate a manual activation.
    pub fn manual_deactivate(&self) {
        let _ = self.command_tx.send(EngineCommand::ManualDeactivate);
    }

    /// Change the behavior preset.
    pub fn set_preset(&self, preset: impl Into<String>) {
        let _ = self.command_tx.send(EngineCommand::SetPreset(preset.into()));
    }

    /// Replace the capability tag set.
    pub fn set_capabilities(&self, capabilities: HashSet<String>) {
        let _ = self
            .command_tx
            .send(EngineCommand::SetCapabilities(capabilities));
    }

    /// Set the danger level; out-of-range values are clamped to 0..=3.
    pub fn set_danger_level(&self, level: i32) {
        let _ = self.command_tx.send(EngineCommand::SetDangerLevel(level));
    }

    /// Current danger state snapshot.
    pub fn danger_state(&self) -> DangerState {
        self.danger.read().clone()
    }

    /// Subscribe to danger state transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<DangerState> {
        self.updates_tx.subscribe()
    }

    /// Last position at which a hazard refresh was triggered.
    pub fn fetch_anchor(&self) -> Option<Position> {
        *self.fetch_anchor.read()
    }
}

/// The evaluation pipeline task.
///
/// Constructed with [`HazardEngine::new`], driven by [`HazardEngine::run`]
/// (or both at once via [`HazardEngine::spawn`]). Consumes itself when
/// run; interaction happens through the [`EngineHandle`].
pub struct HazardEngine {
    zones: Vec<Zone>,
    tracker: DwellTracker,
    machine: DangerStateMachine,
    gate: MoveGate,
    refresher: Arc<dyn HazardRefresher>,
    command_rx: mpsc::UnboundedReceiver<EngineCommand>,
    elapsed_rx: mpsc::UnboundedReceiver<DwellElapsed>,
    shared_anchor: Arc<RwLock<Option<Position>>>,
}

impl HazardEngine {
    /// Create an engine and its handle.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid;
    /// configuration problems are rejected here, never at runtime.
    pub fn new(
        config: EngineConfig,
        refresher: Arc<dyn HazardRefresher>,
    ) -> Result<(Self, EngineHandle), ConfigError> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (elapsed_tx, elapsed_rx) = mpsc::unbounded_channel();

        let machine = DangerStateMachine::with_capacity(config.danger_channel_capacity);
        let shared_anchor = Arc::new(RwLock::new(None));

        let handle = EngineHandle {
            command_tx,
            danger: machine.shared(),
            updates_tx: machine.updates_sender(),
            fetch_anchor: Arc::clone(&shared_anchor),
        };

        let engine = Self {
            zones: Vec::new(),
            tracker: DwellTracker::new(config.dwell, elapsed_tx),
            machine,
            gate: MoveGate::new(config.refresh_distance_m),
            refresher,
            command_rx,
            elapsed_rx,
            shared_anchor,
        };

        Ok((engine, handle))
    }

    /// Create an engine and spawn its run loop onto the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid.
    pub fn spawn(
        config: EngineConfig,
        refresher: Arc<dyn HazardRefresher>,
        cancellation: CancellationToken,
    ) -> Result<(EngineHandle, JoinHandle<()>), ConfigError> {
        let (engine, handle) = Self::new(config, refresher)?;
        let task = tokio::spawn(engine.run(cancellation));
        Ok((handle, task))
    }

    /// Run the evaluation loop until cancellation or channel closure.
    ///
    /// On exit, all outstanding dwell timers are aborted.
    pub async fn run(mut self, cancellation: CancellationToken) {
        info!("Hazard engine started");

        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => break,

                elapsed = self.elapsed_rx.recv() => {
                    match elapsed {
                        Some(elapsed) => self.on_dwell_elapsed(elapsed),
                        None => {
                            // The tracker holds a sender for the engine's
                            // lifetime, so this is a scheduling failure
                            error!("Dwell timer channel closed unexpectedly, stopping engine");
                            break;
                        }
                    }
                }

                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            debug!("All engine handles dropped, stopping engine");
                            break;
                        }
                    }
                }
            }
        }

        self.tracker.shutdown();
        info!("Hazard engine stopped");
    }

    /// Apply one inbound command.
    fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Position(position) => self.on_position(position),
            EngineCommand::ReplaceZones(zones) => {
                debug!(count = zones.len(), "Zone snapshot replaced");
                self.zones = zones;
            }
            EngineCommand::ManualActivate => self.machine.manual_activate(),
            EngineCommand::ManualDeactivate => self.machine.manual_deactivate(),
            EngineCommand::SetPreset(preset) => self.machine.set_preset(preset),
            EngineCommand::SetCapabilities(capabilities) => {
                self.machine.set_capabilities(capabilities)
            }
            EngineCommand::SetDangerLevel(level) => self.machine.set_danger_level(level),
        }
    }

    /// One evaluation cycle for a position fix.
    fn on_position(&mut self, position: Position) {
        if !position.is_valid() {
            warn!(position = %position, "Discarding invalid position fix");
            return;
        }

        // Maybe trigger an external hazard refresh
        if self.gate.execute(&position, self.refresher.as_ref()) {
            *self.shared_anchor.write() = self.gate.anchor();
        }

        // Select the winning zone and update dwell bookkeeping
        let selected = select_highest_priority(&position, &self.zones);
        let exits = self.tracker.observe(selected);

        // A confirmed zone that lost selection retracts its activation.
        // Deactivation is immediate; only activation is debounced.
        for exit in exits {
            if exit.was_confirmed
                && self.machine.state().activating_zone_id() == Some(exit.zone_id.as_str())
            {
                self.machine.auto_deactivate();
            }
        }
    }

    /// Apply a dwell timer firing; stale firings are inert.
    fn on_dwell_elapsed(&mut self, elapsed: DwellElapsed) {
        if let Some(zone) = self.tracker.confirm(&elapsed) {
            self.machine.auto_activate(zone);
        }
    }
}
