//! Recorded-world collaborators for running the bridge offline.
//!
//! A recording is JSON-lines: one serialized [`CycleInput`] per line, in
//! cycle order. Blank lines are skipped. [`LoggingDispatcher`] stands in
//! for the host client by logging every action it receives.

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;

use skirmish_core::safety::ValidatedAction;
use skirmish_core::world::{ActionDispatcher, WorldError, WorldState};
use skirmish_types::{ActionHead, CycleInput, options};
use tracing::{debug, info};

/// World that replays recorded cycle inputs.
#[derive(Debug, Clone, Default)]
pub struct ReplayWorld {
    inputs: VecDeque<CycleInput>,
}

impl ReplayWorld {
    /// Load a recording from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Capture`] if the file cannot be read and
    /// [`WorldError::Malformed`] for the first line that does not decode.
    pub fn from_file(path: &Path) -> Result<Self, WorldError> {
        let file = std::fs::File::open(path).map_err(|e| WorldError::Capture {
            reason: format!("cannot open {}: {e}", path.display()),
        })?;
        let world = Self::from_reader(std::io::BufReader::new(file))?;
        info!(path = %path.display(), cycles = world.remaining(), "Replay loaded");
        Ok(world)
    }

    /// Load a recording from any buffered reader.
    ///
    /// # Errors
    ///
    /// Same as [`ReplayWorld::from_file`]; the `cycle` of a malformed error
    /// is the 1-based line number.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, WorldError> {
        let mut inputs = VecDeque::new();
        for (number, line) in (1_u64..).zip(reader.lines()) {
            let line = line.map_err(|e| WorldError::Capture {
                reason: e.to_string(),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let input: CycleInput = serde_json::from_str(&line).map_err(|e| WorldError::Malformed {
                cycle: number,
                reason: e.to_string(),
            })?;
            inputs.push_back(input);
        }
        Ok(Self { inputs })
    }

    /// Build directly from inputs.
    pub fn from_inputs(inputs: impl IntoIterator<Item = CycleInput>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
        }
    }

    /// Cycles left to replay.
    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

impl WorldState for ReplayWorld {
    fn capture(&mut self, _cycle: u64) -> Result<Option<CycleInput>, WorldError> {
        Ok(self.inputs.pop_front())
    }
}

/// Dispatcher that logs actions instead of applying them.
#[derive(Debug, Clone, Default)]
pub struct LoggingDispatcher {
    dispatched: u64,
}

impl LoggingDispatcher {
    /// Actions received so far.
    pub const fn dispatched(&self) -> u64 {
        self.dispatched
    }
}

impl ActionDispatcher for LoggingDispatcher {
    fn dispatch(&mut self, action: &ValidatedAction) -> Result<(), WorldError> {
        self.dispatched = self.dispatched.saturating_add(1);
        if action.action.is_no_op() {
            debug!(cycle = action.cycle, "No-op action");
            return Ok(());
        }
        let selected: Vec<String> = ActionHead::ALL
            .iter()
            .filter_map(|&head| {
                let option = action.action.get(head);
                (option != options::NO_OP).then(|| format!("{}={option}", head.name()))
            })
            .collect();
        info!(
            cycle = action.cycle,
            engagement = %action.engagement,
            selected = ?selected,
            overridden = action.overridden.len(),
            "Action dispatched"
        );
        Ok(())
    }
}
