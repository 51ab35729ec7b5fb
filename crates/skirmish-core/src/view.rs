//! Borrowed view over everything the encoder and the mask builder read.
//!
//! Both consumers take the same view so the observation and the mask of a
//! cycle are always derived from identical state.

use skirmish_types::{ActorRole, AgentSnapshot, Position, TimerKey};

use crate::history::CombatHistory;
use crate::loadout::LoadoutFeatures;
use crate::opponent::OpponentView;
use crate::timers::TimerBook;

/// State of one cycle after events have been applied.
#[derive(Clone, Copy)]
pub struct CycleView<'a> {
    /// The agent's snapshot.
    pub agent: &'a AgentSnapshot,
    /// The agent's loadout features.
    pub agent_loadout: &'a LoadoutFeatures,
    /// The current opponent source.
    pub opponent: &'a dyn OpponentView,
    /// Timers of both actors.
    pub timers: &'a TimerBook,
    /// Engagement statistics.
    pub history: &'a CombatHistory,
    /// Cycles since the engagement started, zero when unbound.
    pub engagement_cycles: u64,
}

impl CycleView<'_> {
    /// Remaining cycles on `key` for `role`.
    pub fn remaining(&self, role: ActorRole, key: TimerKey) -> u32 {
        self.timers.get(role).remaining(key)
    }

    /// Whether `key` is running for `role`.
    pub fn has(&self, role: ActorRole, key: TimerKey) -> bool {
        self.timers.get(role).has(key)
    }

    /// The agent's tile.
    pub const fn agent_position(&self) -> Position {
        self.agent.actor.position
    }

    /// Tile distance to the opponent, `None` when unbound or on another plane.
    pub fn distance(&self) -> Option<u32> {
        let opponent = self.opponent.position()?;
        self.agent_position().distance(&opponent)
    }
}

impl core::fmt::Debug for CycleView<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CycleView")
            .field("agent", &self.agent.actor.id)
            .field("opponent", &self.opponent.actor_id())
            .field("engagement_cycles", &self.engagement_cycles)
            .finish_non_exhaustive()
    }
}
