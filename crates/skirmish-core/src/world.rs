//! Interfaces to the host client.
//!
//! The pipeline never talks to the game directly. It reads one
//! [`CycleInput`] per cycle from a [`WorldState`] and hands validated
//! actions to an [`ActionDispatcher`]; both are implemented outside this
//! crate.

use skirmish_types::CycleInput;

use crate::safety::ValidatedAction;

/// Errors reported by host client collaborators.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Reading world state failed.
    #[error("failed to read world state: {reason}")]
    Capture {
        /// Explanation of what went wrong.
        reason: String,
    },

    /// A recorded or streamed cycle could not be decoded.
    #[error("malformed cycle input at cycle {cycle}: {reason}")]
    Malformed {
        /// Cycle the input was read for.
        cycle: u64,
        /// Decoder message.
        reason: String,
    },

    /// The dispatcher rejected an action.
    #[error("failed to dispatch action for cycle {cycle}: {reason}")]
    Dispatch {
        /// Cycle the action was meant for.
        cycle: u64,
        /// Explanation of what went wrong.
        reason: String,
    },
}

/// Read-only access to the world, one snapshot per cycle.
pub trait WorldState {
    /// Snapshot for `cycle`, or `None` once the world has no more cycles.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] if the snapshot could not be read.
    fn capture(&mut self, cycle: u64) -> Result<Option<CycleInput>, WorldError>;
}

/// Receiver of validated actions.
pub trait ActionDispatcher {
    /// Apply `action` to the world.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Dispatch`] if the action could not be applied.
    fn dispatch(&mut self, action: &ValidatedAction) -> Result<(), WorldError>;
}
