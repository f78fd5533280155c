//! Dwell tracking: debounced zone confirmation.
//!
//! GPS fixes are noisy; a single sample inside a hazard zone must not
//! flip danger mode on. The dwell tracker requires a zone to stay the
//! selected candidate for a minimum continuous duration before it is
//! confirmed, and retracts immediately on exit.
//!
//! # State machine (per zone id)
//!
//! ```text
//! ABSENT ──enter──► ENTERED ──dwell elapsed──► CONFIRMED
//!    ▲                 │                           │
//!    └──────exit───────┴───────────exit────────────┘
//! ```
//!
//! # Timer synchronization
//!
//! Each entry spawns a tokio sleep task that posts a [`DwellElapsed`]
//! event back onto the engine's serialized channel. The tracker never
//! trusts a firing on its own: [`DwellTracker::confirm`] checks that the
//! entry still exists and carries the same generation number. Exits bump
//! nothing but remove the entry and abort the task, so a firing that was
//! already queued when the exit happened is inert. Re-entry always gets a
//! fresh generation and a fresh timer, never a stale one.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::zone::Zone;

/// Posted onto the engine channel when a dwell timer fires.
///
/// Carries the generation so a stale firing (entry cancelled or
/// re-entered in the meantime) can be detected and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DwellElapsed {
    /// Zone whose dwell timer fired.
    pub zone_id: String,
    /// Generation of the entry the timer was started for.
    pub generation: u64,
}

/// Reported when a zone stops being the selected candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DwellExit {
    /// Zone that was exited.
    pub zone_id: String,
    /// Whether the zone had already been confirmed when the exit
    /// happened. Confirmed exits require the engine to auto-deactivate.
    pub was_confirmed: bool,
}

/// Per-zone entry bookkeeping while the zone is the selected candidate.
#[derive(Debug)]
struct EntryRecord {
    zone: Zone,
    entered_at: Instant,
    generation: u64,
    confirmed: bool,
    timer: JoinHandle<()>,
}

/// Tracks zone entries and schedules cancellable dwell confirmations.
///
/// Owned exclusively by the engine's evaluation task; all methods take
/// `&mut self` and are called from that single task only.
#[derive(Debug)]
pub struct DwellTracker {
    /// Minimum continuous containment before confirmation.
    dwell: Duration,

    /// Entry records keyed by zone id. At most one pending confirmation
    /// per zone at a time.
    entries: HashMap<String, EntryRecord>,

    /// Monotonic generation counter shared across all zones.
    next_generation: u64,

    /// Where the timer tasks post their firings.
    elapsed_tx: mpsc::UnboundedSender<DwellElapsed>,
}

impl DwellTracker {
    /// Create a tracker with the given dwell threshold.
    ///
    /// Dwell timers post [`DwellElapsed`] events to `elapsed_tx`; the
    /// engine feeds them back through [`DwellTracker::confirm`].
    pub fn new(dwell: Duration, elapsed_tx: mpsc::UnboundedSender<DwellElapsed>) -> Self {
        Self {
            dwell,
            entries: HashMap::new(),
            next_generation: 0,
            elapsed_tx,
        }
    }

    /// Process one evaluation cycle's selector result.
    ///
    /// `current` is the zone currently containing the position (or `None`).
    /// Creates an entry and schedules a confirmation for a newly selected
    /// zone; leaves an already-entered zone's dwell clock running; exits
    /// every other tracked zone.
    ///
    /// # Returns
    ///
    /// The zones exited this cycle, with their confirmation status.
    pub fn observe(&mut self, current: Option<&Zone>) -> Vec<DwellExit> {
        let current_id = current.map(|zone| zone.id.as_str());

        // Exit everything that is no longer the selected candidate
        let exited_ids: Vec<String> = self
            .entries
            .keys()
            .filter(|id| Some(id.as_str()) != current_id)
            .cloned()
            .collect();

        let mut exits = Vec::with_capacity(exited_ids.len());
        for zone_id in exited_ids {
            let record = self.entries.remove(&zone_id).expect("key collected above");
            record.timer.abort();
            debug!(
                zone = %zone_id,
                confirmed = record.confirmed,
                dwelled_ms = record.entered_at.elapsed().as_millis(),
                "Zone exited"
            );
            exits.push(DwellExit {
                zone_id,
                was_confirmed: record.confirmed,
            });
        }

        // Enter the current zone if it is new; an existing entry keeps its
        // original dwell clock
        if let Some(zone) = current {
            if !self.entries.contains_key(&zone.id) {
                self.enter(zone.clone());
            } else {
                trace!(zone = %zone.id, "Zone still selected, dwell clock running");
            }
        }

        exits
    }

    /// Create an entry record and schedule its confirmation timer.
    fn enter(&mut self, zone: Zone) {
        self.next_generation += 1;
        let generation = self.next_generation;

        let timer = schedule_confirmation(
            zone.id.clone(),
            generation,
            self.dwell,
            self.elapsed_tx.clone(),
        );

        debug!(
            zone = %zone.label(),
            alert_level = zone.alert_level,
            dwell_ms = self.dwell.as_millis(),
            "Zone entered, confirmation scheduled"
        );

        self.entries.insert(
            zone.id.clone(),
            EntryRecord {
                zone,
                entered_at: Instant::now(),
                generation,
                confirmed: false,
                timer,
            },
        );
    }

    /// Apply a dwell timer firing.
    ///
    /// Promotes the entry to confirmed and returns its zone when the
    /// firing is current: the entry still exists, carries the same
    /// generation, and was not already confirmed. Stale firings (the
    /// entry was exited or re-entered since the timer was scheduled)
    /// return `None` and have no effect.
    pub fn confirm(&mut self, elapsed: &DwellElapsed) -> Option<Zone> {
        let record = self.entries.get_mut(&elapsed.zone_id)?;
        if record.generation != elapsed.generation || record.confirmed {
            trace!(
                zone = %elapsed.zone_id,
                generation = elapsed.generation,
                "Stale dwell firing ignored"
            );
            return None;
        }

        record.confirmed = true;
        debug!(
            zone = %record.zone.label(),
            dwelled_ms = record.entered_at.elapsed().as_millis(),
            "Zone confirmed after dwell"
        );
        Some(record.zone.clone())
    }

    /// Whether a zone currently has an entry record.
    pub fn is_entered(&self, zone_id: &str) -> bool {
        self.entries.contains_key(zone_id)
    }

    /// Whether a zone has been confirmed.
    pub fn is_confirmed(&self, zone_id: &str) -> bool {
        self.entries
            .get(zone_id)
            .map(|record| record.confirmed)
            .unwrap_or(false)
    }

    /// Number of currently tracked zones.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Abort all outstanding confirmation timers and drop all entries.
    pub fn shutdown(&mut self) {
        for (_, record) in self.entries.drain() {
            record.timer.abort();
        }
    }
}

impl Drop for DwellTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn the cancellable confirmation timer for one entry.
fn schedule_confirmation(
    zone_id: String,
    generation: u64,
    dwell: Duration,
    elapsed_tx: mpsc::UnboundedSender<DwellElapsed>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(dwell).await;
        // Receiver gone means the engine is shutting down; nothing to do
        let _ = elapsed_tx.send(DwellElapsed {
            zone_id,
            generation,
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DWELL: Duration = Duration::from_millis(5000);

    fn make_tracker() -> (DwellTracker, mpsc::UnboundedReceiver<DwellElapsed>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (DwellTracker::new(DWELL, tx), rx)
    }

    fn zone(id: &str, level: i32) -> Zone {
        Zone::new(id, level)
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_creates_entry_and_schedules_timer() {
        let (mut tracker, mut rx) = make_tracker();

        let exits = tracker.observe(Some(&zone("z1", 3)));
        assert!(exits.is_empty());
        assert!(tracker.is_entered("z1"));
        assert!(!tracker.is_confirmed("z1"));

        tokio::time::sleep(DWELL + Duration::from_millis(1)).await;
        let elapsed = rx.recv().await.unwrap();
        assert_eq!(elapsed.zone_id, "z1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_observation_keeps_original_clock() {
        let (mut tracker, mut rx) = make_tracker();
        let z = zone("z1", 3);

        tracker.observe(Some(&z));
        // Re-observe halfway through the dwell; the clock must not reset
        tokio::time::sleep(DWELL / 2).await;
        tracker.observe(Some(&z));

        // Remaining half of the original dwell completes the timer
        tokio::time::sleep(DWELL / 2 + Duration::from_millis(1)).await;
        let elapsed = rx.recv().await.unwrap();
        let confirmed = tracker.confirm(&elapsed).unwrap();
        assert_eq!(confirmed.id, "z1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_before_dwell_cancels_timer() {
        let (mut tracker, mut rx) = make_tracker();

        tracker.observe(Some(&zone("z1", 3)));
        tokio::time::sleep(DWELL / 2).await;

        let exits = tracker.observe(None);
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].zone_id, "z1");
        assert!(!exits[0].was_confirmed);
        assert!(!tracker.is_entered("z1"));

        // Past the original deadline: the aborted timer must not fire
        tokio::time::sleep(DWELL).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_promotes_entry() {
        let (mut tracker, mut rx) = make_tracker();

        tracker.observe(Some(&zone("z1", 3)));
        tokio::time::sleep(DWELL + Duration::from_millis(1)).await;

        let elapsed = rx.recv().await.unwrap();
        let confirmed = tracker.confirm(&elapsed).unwrap();
        assert_eq!(confirmed.id, "z1");
        assert!(tracker.is_confirmed("z1"));

        // A duplicate firing of the same generation is inert
        assert!(tracker.confirm(&elapsed).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_firing_after_exit_is_inert() {
        let (mut tracker, mut rx) = make_tracker();

        tracker.observe(Some(&zone("z1", 3)));
        // Let the timer fire and sit in the channel, then exit before the
        // engine would have processed the firing
        tokio::time::sleep(DWELL + Duration::from_millis(1)).await;
        tracker.observe(None);

        let elapsed = rx.recv().await.unwrap();
        assert!(tracker.confirm(&elapsed).is_none(), "cancellation must win");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentry_gets_fresh_generation() {
        let (mut tracker, mut rx) = make_tracker();
        let z = zone("z1", 3);

        tracker.observe(Some(&z));
        tokio::time::sleep(DWELL + Duration::from_millis(1)).await;
        let stale = rx.recv().await.unwrap();

        // Exit and immediately re-enter
        tracker.observe(None);
        tracker.observe(Some(&z));

        // The firing from the first entry must not confirm the second
        assert!(tracker.confirm(&stale).is_none());
        assert!(tracker.is_entered("z1"));
        assert!(!tracker.is_confirmed("z1"));

        // The fresh timer confirms normally
        tokio::time::sleep(DWELL + Duration::from_millis(1)).await;
        let fresh = rx.recv().await.unwrap();
        assert!(fresh.generation > stale.generation);
        assert!(tracker.confirm(&fresh).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_supersession_exits_previous_zone() {
        let (mut tracker, _rx) = make_tracker();

        tracker.observe(Some(&zone("z1", 1)));
        let exits = tracker.observe(Some(&zone("z2", 3)));

        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].zone_id, "z1");
        assert!(tracker.is_entered("z2"));
        assert!(!tracker.is_entered("z1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_of_confirmed_zone_reports_confirmed() {
        let (mut tracker, mut rx) = make_tracker();

        tracker.observe(Some(&zone("z1", 3)));
        tokio::time::sleep(DWELL + Duration::from_millis(1)).await;
        let elapsed = rx.recv().await.unwrap();
        tracker.confirm(&elapsed).unwrap();

        let exits = tracker.observe(None);
        assert_eq!(exits.len(), 1);
        assert!(exits[0].was_confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_all_timers() {
        let (mut tracker, mut rx) = make_tracker();

        tracker.observe(Some(&zone("z1", 3)));
        tracker.shutdown();
        assert_eq!(tracker.entry_count(), 0);

        tokio::time::sleep(DWELL * 2).await;
        assert!(rx.try_recv().is_err());
    }
}
