//! Per-cycle observation pipeline.
//!
//! [`CyclePipeline::run_cycle`] is the synchronous part of every cycle. It
//! owns the timers, the combat history and the opponent proxy, and is
//! the only code that mutates them. Each cycle runs these phases in order:
//!
//! 1. Rebind the opponent proxy and handle the engagement boundary.
//! 2. Advance all timers and the opponent's resource estimates.
//! 3. Apply the events observed since the previous cycle.
//! 4. Encode the observation and build the action mask.
//! 5. Check both against the published contract.
//! 6. Close the cycle's damage accounting.

use std::sync::Arc;

use skirmish_types::{
    ActionMask, ActorRole, CombatEvent, CombatStyle, Consumable, ContractError, CycleInput,
    EngagementId, Equipment, ItemId, ObservationVector, TimerKey,
};
use tracing::{debug, info};

use crate::catalog::{CombatBonuses, ItemCatalog};
use crate::clock::ClockError;
use crate::config::SkirmishConfig;
use crate::encoder;
use crate::frames::FrameStack;
use crate::history::CombatHistory;
use crate::loadout::{self, LoadoutFeatures};
use crate::mask;
use crate::opponent::{OpponentProxy, OpponentView, RebindOutcome};
use crate::timers::{self, TimerBook};
use crate::view::CycleView;
use crate::world::WorldError;

/// Errors that abort a cycle.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// The produced snapshot violates the published contract.
    #[error("contract violation: {source}")]
    Contract {
        /// The violated constraint.
        #[from]
        source: ContractError,
    },

    /// The cycle clock failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A host client collaborator failed.
    #[error("world error: {source}")]
    World {
        /// The underlying collaborator error.
        #[from]
        source: WorldError,
    },
}

/// Tunables for [`CyclePipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Events kept per recent history window.
    pub window_capacity: usize,
    /// Observations kept for multi-frame requests.
    pub frame_stack: usize,
    /// Bonuses assumed for unobserved opponent slots.
    pub baseline: CombatBonuses,
}

impl PipelineSettings {
    /// Derive settings from configuration, resolving baseline item names
    /// against `catalog`.
    pub fn from_config(config: &SkirmishConfig, catalog: &ItemCatalog) -> Self {
        Self {
            window_capacity: config.history.window_capacity,
            frame_stack: config.decision.frame_stack,
            baseline: catalog.bonuses_for_names(&config.loadout.baseline_items),
        }
    }
}

/// Cycle output handed to the decision side.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSnapshot {
    /// Cycle index.
    pub cycle: u64,
    /// Engagement this snapshot belongs to, `None` when unbound.
    pub engagement: Option<EngagementId>,
    /// What happened to the opponent binding this cycle.
    pub rebind: RebindOutcome,
    /// This cycle's observation.
    pub observation: ObservationVector,
    /// This cycle's action mask.
    pub mask: ActionMask,
    /// The last `frame_stack` observations, oldest first.
    pub frames: Vec<ObservationVector>,
    /// Damage exchanged this cycle, from the agent's side.
    pub reward: f64,
}

#[derive(Debug, Clone, Copy)]
struct Engagement {
    id: EngagementId,
    started_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AgentGear {
    observed: Option<(Equipment, Vec<ItemId>)>,
    features: LoadoutFeatures,
}

/// Owner of all per-engagement state.
#[derive(Debug)]
pub struct CyclePipeline {
    catalog: Arc<ItemCatalog>,
    baseline: CombatBonuses,
    timers: TimerBook,
    history: CombatHistory,
    opponent: OpponentProxy,
    frames: FrameStack,
    engagement: Option<Engagement>,
    agent_gear: AgentGear,
    latest: Option<CycleSnapshot>,
}

/// Cycles between an attack and the next one when the weapon is unknown.
const fn default_attack_speed(style: CombatStyle) -> u32 {
    match style {
        CombatStyle::Melee => 4,
        CombatStyle::Ranged | CombatStyle::Magic => 5,
    }
}

impl CyclePipeline {
    /// Create a pipeline with empty state.
    pub fn new(catalog: Arc<ItemCatalog>, settings: PipelineSettings) -> Self {
        Self {
            catalog,
            baseline: settings.baseline,
            timers: TimerBook::new(),
            history: CombatHistory::new(settings.window_capacity),
            opponent: OpponentProxy::new(),
            frames: FrameStack::new(settings.frame_stack),
            engagement: None,
            agent_gear: AgentGear::default(),
            latest: None,
        }
    }

    /// Run one cycle against `input`.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::Contract`] if the encoded snapshot does not
    /// match the published contract. Debug builds panic instead.
    pub fn run_cycle(
        &mut self,
        cycle: u64,
        input: &CycleInput,
    ) -> Result<CycleSnapshot, CycleError> {
        let rebind = self.rebind(cycle, input);
        if let Some(target) = &input.target {
            self.opponent.observe(target, self.catalog.as_ref(), &self.baseline);
        }

        self.timers.advance();
        self.opponent.advance_cycle();

        self.refresh_agent_gear(input);
        for event in &input.events {
            self.apply_event(cycle, input, *event);
        }

        let engagement_cycles = self
            .engagement
            .map_or(0, |e| cycle.saturating_sub(e.started_at));
        let (observation, mask) = {
            let view = CycleView {
                agent: &input.agent,
                agent_loadout: self.agent_loadout(),
                opponent: &self.opponent,
                timers: &self.timers,
                history: &self.history,
                engagement_cycles,
            };
            (encoder::encode(&view), mask::build_mask(&view))
        };

        let checked = observation.validate().and_then(|()| mask.validate());
        debug_assert!(checked.is_ok(), "cycle {cycle} violates the contract: {checked:?}");
        checked?;

        self.frames.push(observation.clone());
        let reward = self.history.cycle_reward();
        self.history.on_cycle_end();

        let snapshot = CycleSnapshot {
            cycle,
            engagement: self.engagement.map(|e| e.id),
            rebind,
            observation,
            mask,
            frames: self.frames.frames(),
            reward,
        };
        self.latest = Some(snapshot.clone());
        Ok(snapshot)
    }

    fn rebind(&mut self, cycle: u64, input: &CycleInput) -> RebindOutcome {
        let outcome = self
            .opponent
            .rebind(input.target.as_ref(), self.catalog.as_ref(), &self.baseline);
        match outcome {
            RebindOutcome::Bound { id } => {
                let engagement = Engagement {
                    id: EngagementId::new(),
                    started_at: cycle,
                };
                self.history.reset();
                self.frames.reset();
                self.timers.clear(ActorRole::Opponent);
                info!(cycle, opponent = %id, engagement = %engagement.id, "engagement started");
                self.engagement = Some(engagement);
            }
            RebindOutcome::Switched { previous, id } => {
                debug!(cycle, previous = %previous, opponent = %id, "opponent identity switched");
            }
            RebindOutcome::Unbound { previous } => {
                self.timers.clear(ActorRole::Opponent);
                if let Some(engagement) = self.engagement.take() {
                    info!(
                        cycle,
                        opponent = %previous,
                        engagement = %engagement.id,
                        length = cycle.saturating_sub(engagement.started_at),
                        "engagement ended"
                    );
                }
            }
            RebindOutcome::Unchanged => {}
        }
        outcome
    }

    fn refresh_agent_gear(&mut self, input: &CycleInput) {
        let agent = &input.agent;
        let unchanged = self
            .agent_gear
            .observed
            .as_ref()
            .is_some_and(|(equipment, inventory)| {
                *equipment == agent.actor.equipment && *inventory == agent.inventory
            });
        if unchanged {
            return;
        }
        self.agent_gear = AgentGear {
            features: loadout::extract_own(
                &agent.actor.equipment,
                &agent.inventory,
                self.catalog.as_ref(),
            ),
            observed: Some((agent.actor.equipment.clone(), agent.inventory.clone())),
        };
    }

    const fn agent_loadout(&self) -> &LoadoutFeatures {
        &self.agent_gear.features
    }

    fn apply_event(&mut self, cycle: u64, input: &CycleInput, event: CombatEvent) {
        let bound = self.opponent.is_bound();
        let involves_opponent = match event {
            CombatEvent::AttackStarted { .. } | CombatEvent::Hit { .. } => true,
            CombatEvent::FreezeApplied { target: role, .. }
            | CombatEvent::Consumed { actor: role, .. }
            | CombatEvent::VengeanceCast { actor: role }
            | CombatEvent::VengeanceTriggered { actor: role } => role == ActorRole::Opponent,
        };
        if involves_opponent && !bound {
            debug!(cycle, ?event, "dropping opponent event while unbound");
            return;
        }

        match event {
            CombatEvent::AttackStarted { source, style, special } => {
                let speed = match source {
                    ActorRole::Agent => self.agent_loadout().weapon_attack_speed,
                    ActorRole::Opponent => self.opponent.loadout().weapon_attack_speed,
                };
                let speed = speed.unwrap_or_else(|| default_attack_speed(style));
                self.timers.get_mut(source).register(TimerKey::AttackCooldown, speed);
                if special && source == ActorRole::Opponent {
                    self.opponent.note_special_attack();
                }
            }
            CombatEvent::Hit { source, style, amount } => {
                let target = source.other();
                let overhead = match target {
                    ActorRole::Agent => input.agent.actor.overhead,
                    ActorRole::Opponent => self.opponent.overhead(),
                };
                self.history.record_hit(source, target, style, amount);
                self.history
                    .record_defense(target, style, overhead.protects() == Some(style));
                if let Some(prayed) = overhead.protects() {
                    self.history.record_prayer(target, prayed);
                }
            }
            CombatEvent::FreezeApplied { cycles: 0, .. } => {
                debug!(cycle, ?event, "ignoring zero-length freeze");
            }
            CombatEvent::FreezeApplied { target, cycles } => {
                let registry = self.timers.get_mut(target);
                registry.register(TimerKey::Freeze, cycles);
                registry.register(
                    TimerKey::FreezeImmunity,
                    cycles.saturating_add(timers::FREEZE_IMMUNITY_EXTRA),
                );
            }
            CombatEvent::Consumed { actor, consumable } => {
                let (key, duration) = match consumable {
                    Consumable::Food => (TimerKey::FoodCooldown, timers::FOOD_COOLDOWN),
                    Consumable::Karambwan => {
                        (TimerKey::KarambwanCooldown, timers::KARAMBWAN_COOLDOWN)
                    }
                    Consumable::Potion(_) => (TimerKey::PotionCooldown, timers::POTION_COOLDOWN),
                };
                self.timers.get_mut(actor).register(key, duration);
            }
            CombatEvent::VengeanceCast { actor } => {
                self.timers
                    .get_mut(actor)
                    .register(TimerKey::VengeanceCooldown, timers::VENGEANCE_COOLDOWN);
                if actor == ActorRole::Opponent {
                    self.opponent.set_vengeance(true);
                }
            }
            CombatEvent::VengeanceTriggered { actor } => {
                if actor == ActorRole::Opponent {
                    self.opponent.set_vengeance(false);
                }
            }
        }
    }

    /// Timers of both actors.
    pub const fn timers(&self) -> &TimerBook {
        &self.timers
    }

    /// Combat statistics of the current engagement.
    pub const fn history(&self) -> &CombatHistory {
        &self.history
    }

    /// The opponent proxy.
    pub const fn opponent(&self) -> &OpponentProxy {
        &self.opponent
    }

    /// Current engagement, `None` when unbound.
    pub fn engagement(&self) -> Option<EngagementId> {
        self.engagement.map(|e| e.id)
    }

    /// The most recent cycle output.
    pub const fn latest(&self) -> Option<&CycleSnapshot> {
        self.latest.as_ref()
    }

    /// The most recent observation.
    pub fn latest_observation(&self) -> Option<&ObservationVector> {
        self.latest.as_ref().map(|s| &s.observation)
    }

    /// The most recent action mask.
    pub fn latest_mask(&self) -> Option<&ActionMask> {
        self.latest.as_ref().map(|s| &s.mask)
    }
}
