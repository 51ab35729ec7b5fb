//! Per-cycle read-only views of the two actors and the events observed
//! since the previous cycle.
//!
//! These are what the host client hands to the pipeline once per cycle.
//! The agent is fully observable; the opponent is only partially
//! observable, which is why most opponent fields are optional or carry an
//! explicit "hidden" marker rather than a sentinel number.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{ActorRole, CombatStyle, Consumable, OverheadPrayer, Slot};
use crate::ids::{ActorId, ItemId};

/// World tile coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// West-east tile coordinate.
    pub x: i32,
    /// South-north tile coordinate.
    pub y: i32,
    /// Height level.
    #[serde(default)]
    pub plane: u8,
}

impl Position {
    /// Chebyshev tile distance, or `None` when the planes differ.
    pub fn distance(&self, other: &Self) -> Option<u32> {
        if self.plane != other.plane {
            return None;
        }
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        Some(dx.max(dy))
    }

    /// Whether `other` is exactly one tile away on both axes.
    pub fn is_diagonal_to(&self, other: &Self) -> bool {
        self.plane == other.plane && self.x.abs_diff(other.x) == 1 && self.y.abs_diff(other.y) == 1
    }
}

/// What is known about an actor's health this cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum HealthObservation {
    /// Exact hitpoints (always available for the agent).
    Exact {
        /// Current hitpoints.
        current: u32,
        /// Maximum hitpoints.
        maximum: u32,
    },
    /// Health bar ratio shown above an actor.
    Bar {
        /// Filled segments.
        ratio: u32,
        /// Total segments of the bar.
        scale: u32,
    },
    /// No health signal this cycle.
    #[default]
    Unknown,
}

impl HealthObservation {
    /// Health as a fraction in `[0, 1]`, or `None` when unknown.
    pub fn fraction(&self) -> Option<f64> {
        let (num, den) = match *self {
            Self::Exact { current, maximum } => (current, maximum),
            Self::Bar { ratio, scale } => (ratio, scale),
            Self::Unknown => return None,
        };
        if den == 0 {
            return None;
        }
        Some((f64::from(num) / f64::from(den)).clamp(0.0, 1.0))
    }
}

/// Observation of a single equipment slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum SlotView {
    /// Slot is visibly empty.
    Empty,
    /// Item identifier is known exactly.
    Item(ItemId),
    /// Only a display name is available (e.g. from an examine or a model match).
    Named(String),
    /// Slot contents are not observable.
    #[default]
    Hidden,
}

/// Equipment as observed this cycle. Slots absent from the map are hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Equipment {
    slots: BTreeMap<Slot, SlotView>,
}

impl Equipment {
    /// Build an equipment view from explicit slot observations.
    pub fn from_slots(slots: impl IntoIterator<Item = (Slot, SlotView)>) -> Self {
        Self {
            slots: slots.into_iter().collect(),
        }
    }

    /// The observation for `slot`, [`SlotView::Hidden`] when unobserved.
    pub fn get(&self, slot: Slot) -> &SlotView {
        static HIDDEN: SlotView = SlotView::Hidden;
        self.slots.get(&slot).unwrap_or(&HIDDEN)
    }

    /// Record the observation for `slot`.
    pub fn set(&mut self, slot: Slot, view: SlotView) {
        self.slots.insert(slot, view);
    }

    /// Exact item identifier in `slot`, if known.
    pub fn item(&self, slot: Slot) -> Option<ItemId> {
        match self.get(slot) {
            SlotView::Item(id) => Some(*id),
            SlotView::Empty | SlotView::Named(_) | SlotView::Hidden => None,
        }
    }
}

/// Attributes common to both actors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    /// Host-assigned identity of the actor.
    pub id: ActorId,
    /// Current tile.
    pub position: Position,
    /// Health signal.
    #[serde(default)]
    pub health: HealthObservation,
    /// Observed equipment.
    #[serde(default)]
    pub equipment: Equipment,
    /// Displayed overhead prayer.
    #[serde(default)]
    pub overhead: OverheadPrayer,
}

/// Current (boosted or drained) skill levels of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    /// Attack level.
    pub attack: u32,
    /// Strength level.
    pub strength: u32,
    /// Defence level.
    pub defence: u32,
    /// Ranged level.
    pub ranged: u32,
    /// Magic level.
    pub magic: u32,
    /// Prayer level (unboosted).
    pub prayer: u32,
}

impl Default for Skills {
    fn default() -> Self {
        Self {
            attack: 99,
            strength: 99,
            defence: 99,
            ranged: 99,
            magic: 99,
            prayer: 99,
        }
    }
}

/// Consumables carried by the agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplies {
    /// Pieces of regular food.
    pub food: u32,
    /// Pieces of combo food.
    pub karambwans: u32,
    /// Brew doses.
    pub brew_doses: u32,
    /// Restore doses.
    pub restore_doses: u32,
    /// Melee combat boost doses.
    pub combat_doses: u32,
    /// Ranged boost doses.
    pub ranged_doses: u32,
}

/// Fully observable state of the locally controlled actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Shared actor attributes.
    pub actor: ActorSnapshot,
    /// Current skill levels.
    #[serde(default)]
    pub skills: Skills,
    /// Current prayer points.
    pub prayer_points: u32,
    /// Special attack energy, 0 to 100.
    pub special_energy: u32,
    /// Whether vengeance is currently primed.
    #[serde(default)]
    pub vengeance_active: bool,
    /// Consumables carried.
    #[serde(default)]
    pub supplies: Supplies,
    /// Carried (not worn) item identifiers.
    #[serde(default)]
    pub inventory: Vec<ItemId>,
}

/// A discrete occurrence observed since the previous cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum CombatEvent {
    /// An actor started an attack animation.
    AttackStarted {
        /// Who attacked.
        source: ActorRole,
        /// Style of the attack.
        style: CombatStyle,
        /// Whether it was a special attack.
        #[serde(default)]
        special: bool,
    },
    /// Damage was applied to the other actor.
    Hit {
        /// Who dealt the damage.
        source: ActorRole,
        /// Style of the attack that landed.
        style: CombatStyle,
        /// Damage amount (zero for a splash or a blocked hit).
        amount: u32,
    },
    /// A freezing spell landed.
    FreezeApplied {
        /// Who was frozen.
        target: ActorRole,
        /// Freeze duration in cycles.
        cycles: u32,
    },
    /// A consumable was used.
    Consumed {
        /// Who consumed it.
        actor: ActorRole,
        /// What was consumed.
        consumable: Consumable,
    },
    /// Vengeance was cast.
    VengeanceCast {
        /// Who cast it.
        actor: ActorRole,
    },
    /// A primed vengeance went off.
    VengeanceTriggered {
        /// Whose vengeance triggered.
        actor: ActorRole,
    },
}

/// Everything the host client reports for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleInput {
    /// The agent's state.
    pub agent: AgentSnapshot,
    /// The current hostile interaction target, if any.
    #[serde(default)]
    pub target: Option<ActorSnapshot>,
    /// Events observed since the previous cycle.
    #[serde(default)]
    pub events: Vec<CombatEvent>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_chebyshev_on_same_plane() {
        let a = Position { x: 10, y: 10, plane: 0 };
        let b = Position { x: 13, y: 8, plane: 0 };
        assert_eq!(a.distance(&b), Some(3));
        let c = Position { x: 10, y: 10, plane: 1 };
        assert_eq!(a.distance(&c), None);
    }

    #[test]
    fn diagonal_requires_unit_offset_on_both_axes() {
        let a = Position { x: 0, y: 0, plane: 0 };
        assert!(a.is_diagonal_to(&Position { x: 1, y: -1, plane: 0 }));
        assert!(!a.is_diagonal_to(&Position { x: 1, y: 0, plane: 0 }));
        assert!(!a.is_diagonal_to(&Position { x: 2, y: 2, plane: 0 }));
    }

    #[test]
    fn health_fraction_handles_every_signal() {
        let exact = HealthObservation::Exact { current: 50, maximum: 99 };
        let bar = HealthObservation::Bar { ratio: 15, scale: 30 };
        assert!((exact.fraction().unwrap_or(0.0) - 50.0 / 99.0).abs() < 1e-9);
        assert!((bar.fraction().unwrap_or(0.0) - 0.5).abs() < 1e-9);
        assert_eq!(HealthObservation::Unknown.fraction(), None);
        assert_eq!(HealthObservation::Bar { ratio: 1, scale: 0 }.fraction(), None);
    }

    #[test]
    fn absent_slots_read_as_hidden() {
        let eq = Equipment::from_slots([(Slot::Weapon, SlotView::Item(ItemId(4151)))]);
        assert_eq!(eq.item(Slot::Weapon), Some(ItemId(4151)));
        assert_eq!(eq.get(Slot::Head), &SlotView::Hidden);
    }

    #[test]
    fn cycle_input_parses_from_recording_json() {
        let json = r#"{
            "agent": {
                "actor": {"id": 1, "position": {"x": 3100, "y": 3520},
                          "health": {"kind": "exact", "current": 99, "maximum": 99}},
                "prayer_points": 99,
                "special_energy": 100
            },
            "target": {"id": 2, "position": {"x": 3101, "y": 3520}},
            "events": [
                {"type": "hit", "source": "opponent", "style": "magic", "amount": 20},
                {"type": "consumed", "actor": "agent", "consumable": {"kind": "food"}}
            ]
        }"#;
        let input: Result<CycleInput, _> = serde_json::from_str(json);
        assert!(input.is_ok(), "{input:?}");
        let input = input.unwrap();
        assert_eq!(input.events.len(), 2);
        assert_eq!(input.target.map(|t| t.health), Some(HealthObservation::Unknown));
        assert_eq!(input.agent.skills, Skills::default());
    }
}
