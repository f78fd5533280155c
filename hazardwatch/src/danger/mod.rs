//! Danger mode state: the single authoritative activation state.
//!
//! The state machine consumes confirmed-zone notifications from the dwell
//! tracker and manual calls from the user, and publishes every transition
//! atomically: external consumers only ever see complete [`DangerState`]
//! snapshots, via the shared cell (pull) or the broadcast channel (push).

mod machine;
mod state;

pub use machine::DangerStateMachine;
pub use state::{DangerState, MAX_DANGER_LEVEL};
