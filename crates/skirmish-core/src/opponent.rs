//! Opponent delegation proxy.
//!
//! The proxy is the single access point for everything the pipeline knows
//! about the opponent. It delegates to either a neutral source (no target)
//! or a tracked source bound to one actor identity. Rebinding is the only
//! way the underlying source changes, and queries always answer from a
//! complete source: neutral defaults or the bound actor's data, never a
//! mix of the two.

use std::sync::Arc;

use skirmish_types::{ActorId, ActorSnapshot, Equipment, OverheadPrayer, Position};

use crate::catalog::{CombatBonuses, ItemLookup};
use crate::loadout::{self, LoadoutFeatures};

/// Special energy assumed for a freshly bound opponent.
pub const SPECIAL_ENERGY_FULL: u32 = 100;

/// Special energy regained per regeneration step.
pub const SPECIAL_REGEN_AMOUNT: u32 = 10;

/// Cycles between special energy regeneration steps.
pub const SPECIAL_REGEN_INTERVAL: u32 = 50;

/// Special cost assumed when the opponent's weapon is unknown.
pub const DEFAULT_SPECIAL_COST: u32 = 50;

/// Read-only view of the current opponent.
pub trait OpponentView {
    /// Identity of the bound opponent, `None` when unbound.
    fn actor_id(&self) -> Option<ActorId>;

    /// Whether an opponent is bound.
    fn is_bound(&self) -> bool {
        self.actor_id().is_some()
    }

    /// Health as a fraction of maximum.
    fn health_fraction(&self) -> f64;

    /// Estimated special energy, 0 to 100.
    fn special_energy(&self) -> u32;

    /// Current tile.
    fn position(&self) -> Option<Position>;

    /// Displayed overhead prayer.
    fn overhead(&self) -> OverheadPrayer;

    /// Whether the opponent is believed to have vengeance primed.
    fn vengeance_active(&self) -> bool;

    /// Loadout features of the opponent's visible gear.
    fn loadout(&self) -> &LoadoutFeatures;
}

/// Neutral stand-in used while no opponent is bound.
#[derive(Debug, Clone, Default)]
pub struct NeutralOpponent {
    loadout: Arc<LoadoutFeatures>,
}

impl OpponentView for NeutralOpponent {
    fn actor_id(&self) -> Option<ActorId> {
        None
    }

    fn health_fraction(&self) -> f64 {
        1.0
    }

    fn special_energy(&self) -> u32 {
        SPECIAL_ENERGY_FULL
    }

    fn position(&self) -> Option<Position> {
        None
    }

    fn overhead(&self) -> OverheadPrayer {
        OverheadPrayer::None
    }

    fn vengeance_active(&self) -> bool {
        false
    }

    fn loadout(&self) -> &LoadoutFeatures {
        &self.loadout
    }
}

/// Live view of one bound opponent identity.
#[derive(Debug, Clone)]
pub struct TrackedOpponent {
    snapshot: ActorSnapshot,
    equipment: Equipment,
    loadout: Arc<LoadoutFeatures>,
    health: f64,
    special_energy: u32,
    regen_progress: u32,
    vengeance_active: bool,
}

impl TrackedOpponent {
    fn bind(snapshot: &ActorSnapshot, catalog: &dyn ItemLookup, baseline: &CombatBonuses) -> Self {
        let loadout = loadout::extract(&snapshot.equipment, &[], catalog, baseline);
        Self {
            snapshot: snapshot.clone(),
            equipment: snapshot.equipment.clone(),
            loadout: Arc::new(loadout),
            health: snapshot.health.fraction().unwrap_or(1.0),
            special_energy: SPECIAL_ENERGY_FULL,
            regen_progress: 0,
            vengeance_active: false,
        }
    }

    fn observe(
        &mut self,
        snapshot: &ActorSnapshot,
        catalog: &dyn ItemLookup,
        baseline: &CombatBonuses,
    ) {
        if snapshot.equipment != self.equipment {
            self.loadout = Arc::new(loadout::extract(&snapshot.equipment, &[], catalog, baseline));
            self.equipment = snapshot.equipment.clone();
        }
        if let Some(health) = snapshot.health.fraction() {
            self.health = health;
        }
        self.snapshot = snapshot.clone();
    }
}

impl OpponentView for TrackedOpponent {
    fn actor_id(&self) -> Option<ActorId> {
        Some(self.snapshot.id)
    }

    fn health_fraction(&self) -> f64 {
        self.health
    }

    fn special_energy(&self) -> u32 {
        self.special_energy
    }

    fn position(&self) -> Option<Position> {
        Some(self.snapshot.position)
    }

    fn overhead(&self) -> OverheadPrayer {
        self.snapshot.overhead
    }

    fn vengeance_active(&self) -> bool {
        self.vengeance_active
    }

    fn loadout(&self) -> &LoadoutFeatures {
        &self.loadout
    }
}

#[derive(Debug, Clone)]
enum OpponentSource {
    Unbound(NeutralOpponent),
    Bound(Box<TrackedOpponent>),
}

/// What [`OpponentProxy::rebind`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebindOutcome {
    /// The target is the same as before (or still absent).
    Unchanged,
    /// An opponent was bound where there was none.
    Bound {
        /// The newly bound identity.
        id: ActorId,
    },
    /// The bound identity changed to a different actor.
    Switched {
        /// Identity bound before the switch.
        previous: ActorId,
        /// Identity bound now.
        id: ActorId,
    },
    /// The opponent went away.
    Unbound {
        /// Identity that was bound.
        previous: ActorId,
    },
}

/// Stable handle the pipeline queries for opponent state.
#[derive(Debug, Clone)]
pub struct OpponentProxy {
    source: OpponentSource,
}

impl Default for OpponentProxy {
    fn default() -> Self {
        Self::new()
    }
}

impl OpponentProxy {
    /// Create an unbound proxy.
    pub fn new() -> Self {
        Self {
            source: OpponentSource::Unbound(NeutralOpponent::default()),
        }
    }

    fn view(&self) -> &dyn OpponentView {
        match &self.source {
            OpponentSource::Unbound(neutral) => neutral,
            OpponentSource::Bound(tracked) => tracked.as_ref(),
        }
    }

    /// Point the proxy at `target`.
    ///
    /// Rebinding to the identity that is already bound does nothing; in
    /// particular cached loadout features are kept. A different identity
    /// replaces the tracked source wholesale, and `None` restores the
    /// neutral source.
    pub fn rebind(
        &mut self,
        target: Option<&ActorSnapshot>,
        catalog: &dyn ItemLookup,
        baseline: &CombatBonuses,
    ) -> RebindOutcome {
        let current = self.actor_id();
        match (current, target) {
            (None, None) => RebindOutcome::Unchanged,
            (Some(a), Some(t)) if a == t.id => RebindOutcome::Unchanged,
            (None, Some(t)) => {
                self.source =
                    OpponentSource::Bound(Box::new(TrackedOpponent::bind(t, catalog, baseline)));
                tracing::debug!(opponent = %t.id, "opponent bound");
                RebindOutcome::Bound { id: t.id }
            }
            (Some(previous), Some(t)) => {
                self.source =
                    OpponentSource::Bound(Box::new(TrackedOpponent::bind(t, catalog, baseline)));
                tracing::debug!(previous = %previous, opponent = %t.id, "opponent switched");
                RebindOutcome::Switched { previous, id: t.id }
            }
            (Some(previous), None) => {
                self.source = OpponentSource::Unbound(NeutralOpponent::default());
                tracing::debug!(previous = %previous, "opponent unbound");
                RebindOutcome::Unbound { previous }
            }
        }
    }

    /// Refresh the bound opponent from this cycle's snapshot.
    ///
    /// Loadout features are recomputed only when the observed equipment
    /// changed. Snapshots of any other identity are ignored.
    pub fn observe(
        &mut self,
        snapshot: &ActorSnapshot,
        catalog: &dyn ItemLookup,
        baseline: &CombatBonuses,
    ) {
        if let OpponentSource::Bound(tracked) = &mut self.source {
            if tracked.snapshot.id == snapshot.id {
                tracked.observe(snapshot, catalog, baseline);
            }
        }
    }

    /// Regenerate the special energy estimate by one cycle.
    pub fn advance_cycle(&mut self) {
        if let OpponentSource::Bound(tracked) = &mut self.source {
            tracked.regen_progress = tracked.regen_progress.saturating_add(1);
            if tracked.regen_progress >= SPECIAL_REGEN_INTERVAL {
                tracked.regen_progress = 0;
                tracked.special_energy = tracked
                    .special_energy
                    .saturating_add(SPECIAL_REGEN_AMOUNT)
                    .min(SPECIAL_ENERGY_FULL);
            }
        }
    }

    /// Account for a special attack by the bound opponent.
    ///
    /// Uses the worn weapon's cost when it is known.
    pub fn note_special_attack(&mut self) {
        if let OpponentSource::Bound(tracked) = &mut self.source {
            let cost = tracked.loadout.equipped_special_cost.unwrap_or(DEFAULT_SPECIAL_COST);
            tracked.special_energy = tracked.special_energy.saturating_sub(cost);
        }
    }

    /// Record whether the bound opponent has vengeance primed.
    pub fn set_vengeance(&mut self, active: bool) {
        if let OpponentSource::Bound(tracked) = &mut self.source {
            tracked.vengeance_active = active;
        }
    }

    /// Shared handle to the current loadout features.
    pub fn loadout_handle(&self) -> Arc<LoadoutFeatures> {
        match &self.source {
            OpponentSource::Unbound(neutral) => Arc::clone(&neutral.loadout),
            OpponentSource::Bound(tracked) => Arc::clone(&tracked.loadout),
        }
    }
}

impl OpponentView for OpponentProxy {
    fn actor_id(&self) -> Option<ActorId> {
        self.view().actor_id()
    }

    fn health_fraction(&self) -> f64 {
        self.view().health_fraction()
    }

    fn special_energy(&self) -> u32 {
        self.view().special_energy()
    }

    fn position(&self) -> Option<Position> {
        self.view().position()
    }

    fn overhead(&self) -> OverheadPrayer {
        self.view().overhead()
    }

    fn vengeance_active(&self) -> bool {
        self.view().vengeance_active()
    }

    fn loadout(&self) -> &LoadoutFeatures {
        match &self.source {
            OpponentSource::Unbound(neutral) => &neutral.loadout,
            OpponentSource::Bound(tracked) => &tracked.loadout,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::ItemCatalog;
    use skirmish_types::{HealthObservation, ItemId, Slot, SlotView};

    fn snapshot(id: u32) -> ActorSnapshot {
        ActorSnapshot {
            id: ActorId(id),
            position: Position { x: 1, y: 1, plane: 0 },
            health: HealthObservation::Bar { ratio: 20, scale: 30 },
            equipment: Equipment::from_slots([(Slot::Weapon, SlotView::Item(ItemId(13652)))]),
            overhead: OverheadPrayer::ProtectMagic,
        }
    }

    #[test]
    fn unbound_proxy_answers_neutral_defaults() {
        let proxy = OpponentProxy::new();
        assert!(!proxy.is_bound());
        assert!((proxy.health_fraction() - 1.0).abs() < f64::EPSILON);
        assert_eq!(proxy.special_energy(), SPECIAL_ENERGY_FULL);
        assert_eq!(proxy.overhead(), OverheadPrayer::None);
        assert_eq!(proxy.loadout(), &LoadoutFeatures::default());
    }

    #[test]
    fn rebinding_same_identity_keeps_cached_features() {
        let catalog = ItemCatalog::embedded().unwrap();
        let mut proxy = OpponentProxy::new();
        let target = snapshot(7);
        let first = proxy.rebind(Some(&target), &catalog, &CombatBonuses::default());
        assert_eq!(first, RebindOutcome::Bound { id: ActorId(7) });
        let before = proxy.loadout_handle();
        let again = proxy.rebind(Some(&target), &catalog, &CombatBonuses::default());
        assert_eq!(again, RebindOutcome::Unchanged);
        proxy.observe(&target, &catalog, &CombatBonuses::default());
        assert!(Arc::ptr_eq(&before, &proxy.loadout_handle()));
    }

    #[test]
    fn switching_identity_replaces_source() {
        let catalog = ItemCatalog::embedded().unwrap();
        let mut proxy = OpponentProxy::new();
        proxy.rebind(Some(&snapshot(1)), &catalog, &CombatBonuses::default());
        proxy.note_special_attack();
        proxy.set_vengeance(true);
        let mut other = snapshot(2);
        other.overhead = OverheadPrayer::ProtectMelee;
        other.equipment = Equipment::default();
        let outcome = proxy.rebind(Some(&other), &catalog, &CombatBonuses::default());
        assert_eq!(
            outcome,
            RebindOutcome::Switched {
                previous: ActorId(1),
                id: ActorId(2)
            }
        );
        assert_eq!(proxy.overhead(), OverheadPrayer::ProtectMelee);
        assert_eq!(proxy.special_energy(), SPECIAL_ENERGY_FULL);
        assert!(!proxy.vengeance_active());
        assert_eq!(proxy.loadout().weapon_style, None);
    }

    #[test]
    fn unbinding_restores_neutral_source() {
        let catalog = ItemCatalog::embedded().unwrap();
        let mut proxy = OpponentProxy::new();
        proxy.rebind(Some(&snapshot(3)), &catalog, &CombatBonuses::default());
        let outcome = proxy.rebind(None, &catalog, &CombatBonuses::default());
        assert_eq!(outcome, RebindOutcome::Unbound { previous: ActorId(3) });
        assert!(!proxy.is_bound());
        assert!((proxy.health_fraction() - 1.0).abs() < f64::EPSILON);
        assert!(proxy.position().is_none());
    }

    #[test]
    fn special_estimate_spends_and_regenerates() {
        let catalog = ItemCatalog::embedded().unwrap();
        let mut proxy = OpponentProxy::new();
        proxy.rebind(Some(&snapshot(4)), &catalog, &CombatBonuses::default());
        proxy.note_special_attack();
        proxy.note_special_attack();
        assert_eq!(proxy.special_energy(), 0);
        for _ in 0..SPECIAL_REGEN_INTERVAL {
            proxy.advance_cycle();
        }
        assert_eq!(proxy.special_energy(), SPECIAL_REGEN_AMOUNT);
    }

    #[test]
    fn unknown_health_keeps_last_estimate() {
        let catalog = ItemCatalog::embedded().unwrap();
        let mut proxy = OpponentProxy::new();
        let mut target = snapshot(5);
        proxy.rebind(Some(&target), &catalog, &CombatBonuses::default());
        target.health = HealthObservation::Unknown;
        proxy.observe(&target, &catalog, &CombatBonuses::default());
        assert!((proxy.health_fraction() - 20.0 / 30.0).abs() < 1e-9);
    }
}
