//! Enumeration types shared by the pipeline and the wire layer.

use serde::{Deserialize, Serialize};

/// Coarse combat style classification used for attacks, prayers, and gear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatStyle {
    /// Close-range weapon attacks.
    Melee,
    /// Projectile weapon attacks.
    Ranged,
    /// Spell attacks.
    Magic,
}

impl CombatStyle {
    /// All styles in their canonical order.
    pub const ALL: [Self; 3] = [Self::Melee, Self::Ranged, Self::Magic];

    /// Canonical position of this style (melee, ranged, magic).
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Melee => 0,
            Self::Ranged => 1,
            Self::Magic => 2,
        }
    }
}

/// Which side of the engagement an actor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// The locally controlled actor.
    Agent,
    /// Whichever actor is currently bound as the opponent.
    Opponent,
}

impl ActorRole {
    /// The opposite side of the engagement.
    pub const fn other(self) -> Self {
        match self {
            Self::Agent => Self::Opponent,
            Self::Opponent => Self::Agent,
        }
    }
}

/// Equipment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Helmet slot.
    Head,
    /// Cape slot.
    Cape,
    /// Amulet slot.
    Neck,
    /// Arrows and bolts.
    Ammo,
    /// Main-hand weapon.
    Weapon,
    /// Body armour.
    Body,
    /// Off-hand shield or book.
    Shield,
    /// Leg armour.
    Legs,
    /// Gloves.
    Hands,
    /// Boots.
    Feet,
    /// Ring.
    Ring,
}

impl Slot {
    /// All equipment slots in display order.
    pub const ALL: [Self; 11] = [
        Self::Head,
        Self::Cape,
        Self::Neck,
        Self::Ammo,
        Self::Weapon,
        Self::Body,
        Self::Shield,
        Self::Legs,
        Self::Hands,
        Self::Feet,
        Self::Ring,
    ];
}

/// Overhead prayer currently displayed by an actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverheadPrayer {
    /// No overhead prayer active.
    #[default]
    None,
    /// Protect from Magic.
    ProtectMagic,
    /// Protect from Missiles.
    ProtectRanged,
    /// Protect from Melee.
    ProtectMelee,
    /// Smite (drains opponent prayer).
    Smite,
    /// Redemption (heals on low health).
    Redemption,
}

impl OverheadPrayer {
    /// The style this prayer protects against, if it is a protection prayer.
    pub const fn protects(self) -> Option<CombatStyle> {
        match self {
            Self::ProtectMagic => Some(CombatStyle::Magic),
            Self::ProtectRanged => Some(CombatStyle::Ranged),
            Self::ProtectMelee => Some(CombatStyle::Melee),
            Self::None | Self::Smite | Self::Redemption => None,
        }
    }
}

/// Keys of the per-actor cooldown and status timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKey {
    /// Actor cannot move.
    Freeze,
    /// Actor cannot be frozen again.
    FreezeImmunity,
    /// Cycles until the actor's next attack can land.
    AttackCooldown,
    /// Cycles until regular food can be eaten again.
    FoodCooldown,
    /// Cycles until a combo food can be eaten again.
    KarambwanCooldown,
    /// Cycles until another potion dose can be drunk.
    PotionCooldown,
    /// Cycles until vengeance can be recast.
    VengeanceCooldown,
}

/// Potion families tracked by the action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotionKind {
    /// Healing brew (lowers combat stats).
    Brew,
    /// Stat and prayer restore.
    Restore,
    /// Melee combat boost.
    Combat,
    /// Ranged boost.
    Ranged,
}

/// Consumables whose use starts a cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "potion")]
pub enum Consumable {
    /// Regular food.
    Food,
    /// Combo food eaten on the same cycle as regular food.
    Karambwan,
    /// A potion dose.
    Potion(PotionKind),
}
