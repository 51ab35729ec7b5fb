//! The published observation and action contracts.
//!
//! The external decision service is trained against a fixed observation
//! layout and a fixed multi-head action space. Both are declared here as
//! ordered tables; an index never changes meaning once published. Adding a
//! field means appending to the end and bumping the fingerprint consumers
//! compare against.

/// Declares the ordered observation fields with their published names.
macro_rules! observation_fields {
    ( $( $variant:ident => $name:literal ),+ $(,)? ) => {
        /// One slot of the observation vector, in published index order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum ObservationField {
            $(
                #[doc = $name]
                $variant,
            )+
        }

        impl ObservationField {
            /// Every field in index order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant ),+ ];

            /// The published name of this field.
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )+
                }
            }
        }
    };
}

observation_fields! {
    AgentHealth => "agent_health",
    AgentPrayerPoints => "agent_prayer_points",
    AgentSpecialEnergy => "agent_special_energy",
    AgentFrozen => "agent_frozen",
    AgentFreezeTicks => "agent_freeze_ticks",
    AgentFreezeImmune => "agent_freeze_immune",
    AgentFreezeImmunityTicks => "agent_freeze_immunity_ticks",
    AgentAttackCooldown => "agent_attack_cooldown",
    AgentFoodCooldown => "agent_food_cooldown",
    AgentKarambwanCooldown => "agent_karambwan_cooldown",
    AgentPotionCooldown => "agent_potion_cooldown",
    AgentVengeanceActive => "agent_vengeance_active",
    AgentVengeanceCooldown => "agent_vengeance_cooldown",
    AgentPrayingMagic => "agent_praying_magic",
    AgentPrayingRanged => "agent_praying_ranged",
    AgentPrayingMelee => "agent_praying_melee",
    AgentPrayingSmite => "agent_praying_smite",
    AgentPrayingRedemption => "agent_praying_redemption",
    AgentWieldingMelee => "agent_wielding_melee",
    AgentWieldingRanged => "agent_wielding_ranged",
    AgentWieldingMagic => "agent_wielding_magic",
    AgentSpecialEquipped => "agent_special_equipped",
    AgentMeleeSpecialAvailable => "agent_melee_special_available",
    AgentRangedSpecialAvailable => "agent_ranged_special_available",
    AgentMagicSpecialAvailable => "agent_magic_special_available",
    AgentSetEffectActive => "agent_set_effect_active",
    AgentTankAvailable => "agent_tank_available",
    AgentFoodCount => "agent_food_count",
    AgentKarambwanCount => "agent_karambwan_count",
    AgentBrewDoses => "agent_brew_doses",
    AgentRestoreDoses => "agent_restore_doses",
    AgentCombatDoses => "agent_combat_doses",
    AgentRangedDoses => "agent_ranged_doses",
    AgentAttackLevel => "agent_attack_level",
    AgentStrengthLevel => "agent_strength_level",
    AgentDefenceLevel => "agent_defence_level",
    AgentRangedLevel => "agent_ranged_level",
    AgentMagicLevel => "agent_magic_level",
    AgentMeleeAccuracy => "agent_melee_accuracy",
    AgentRangedAccuracy => "agent_ranged_accuracy",
    AgentMagicAccuracy => "agent_magic_accuracy",
    AgentMeleeDamage => "agent_melee_damage",
    AgentRangedDamage => "agent_ranged_damage",
    AgentMagicDamage => "agent_magic_damage",
    AgentMeleeDefence => "agent_melee_defence",
    AgentRangedDefence => "agent_ranged_defence",
    AgentMagicDefence => "agent_magic_defence",
    OpponentPresent => "opponent_present",
    OpponentHealth => "opponent_health",
    OpponentSpecialEnergy => "opponent_special_energy",
    OpponentFrozen => "opponent_frozen",
    OpponentFreezeTicks => "opponent_freeze_ticks",
    OpponentFreezeImmune => "opponent_freeze_immune",
    OpponentFreezeImmunityTicks => "opponent_freeze_immunity_ticks",
    OpponentAttackCooldown => "opponent_attack_cooldown",
    OpponentFoodCooldown => "opponent_food_cooldown",
    OpponentPotionCooldown => "opponent_potion_cooldown",
    OpponentVengeanceActive => "opponent_vengeance_active",
    OpponentVengeanceCooldown => "opponent_vengeance_cooldown",
    OpponentPrayingMagic => "opponent_praying_magic",
    OpponentPrayingRanged => "opponent_praying_ranged",
    OpponentPrayingMelee => "opponent_praying_melee",
    OpponentPrayingSmite => "opponent_praying_smite",
    OpponentPrayingRedemption => "opponent_praying_redemption",
    OpponentWieldingMelee => "opponent_wielding_melee",
    OpponentWieldingRanged => "opponent_wielding_ranged",
    OpponentWieldingMagic => "opponent_wielding_magic",
    OpponentSpecialEquipped => "opponent_special_equipped",
    OpponentSetEffectActive => "opponent_set_effect_active",
    OpponentMeleeAccuracy => "opponent_melee_accuracy",
    OpponentRangedAccuracy => "opponent_ranged_accuracy",
    OpponentMagicAccuracy => "opponent_magic_accuracy",
    OpponentMeleeDamage => "opponent_melee_damage",
    OpponentRangedDamage => "opponent_ranged_damage",
    OpponentMagicDamage => "opponent_magic_damage",
    OpponentMeleeDefence => "opponent_melee_defence",
    OpponentRangedDefence => "opponent_ranged_defence",
    OpponentMagicDefence => "opponent_magic_defence",
    OpponentGearConfidence => "opponent_gear_confidence",
    Distance => "distance",
    UnderOpponent => "under_opponent",
    DiagonalToOpponent => "diagonal_to_opponent",
    InMeleeRange => "in_melee_range",
    AgentMeleeAttackRatio => "agent_melee_attack_ratio",
    AgentRangedAttackRatio => "agent_ranged_attack_ratio",
    AgentMagicAttackRatio => "agent_magic_attack_ratio",
    AgentRecentMeleeAttackRatio => "agent_recent_melee_attack_ratio",
    AgentRecentRangedAttackRatio => "agent_recent_ranged_attack_ratio",
    AgentRecentMagicAttackRatio => "agent_recent_magic_attack_ratio",
    OpponentMeleeAttackRatio => "opponent_melee_attack_ratio",
    OpponentRangedAttackRatio => "opponent_ranged_attack_ratio",
    OpponentMagicAttackRatio => "opponent_magic_attack_ratio",
    OpponentRecentMeleeAttackRatio => "opponent_recent_melee_attack_ratio",
    OpponentRecentRangedAttackRatio => "opponent_recent_ranged_attack_ratio",
    OpponentRecentMagicAttackRatio => "opponent_recent_magic_attack_ratio",
    OpponentPrayMeleeRatio => "opponent_pray_melee_ratio",
    OpponentPrayRangedRatio => "opponent_pray_ranged_ratio",
    OpponentPrayMagicRatio => "opponent_pray_magic_ratio",
    OpponentRecentPrayMeleeRatio => "opponent_recent_pray_melee_ratio",
    OpponentRecentPrayRangedRatio => "opponent_recent_pray_ranged_ratio",
    OpponentRecentPrayMagicRatio => "opponent_recent_pray_magic_ratio",
    AgentHitCorrectRatio => "agent_hit_correct_ratio",
    AgentRecentHitCorrectRatio => "agent_recent_hit_correct_ratio",
    TargetHitCorrectRatio => "target_hit_correct_ratio",
    RecentTargetHitCorrectRatio => "recent_target_hit_correct_ratio",
    DamageDealtScale => "damage_dealt_scale",
    EngagementLength => "engagement_length",
}

impl ObservationField {
    /// Position of this field in the observation vector.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Length of every observation vector.
pub const OBSERVATION_SIZE: usize = ObservationField::ALL.len();

/// The independent action categories, in published head order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionHead {
    /// Which style to attack with.
    Attack,
    /// Melee attack variant.
    MeleeAttackType,
    /// Ranged attack variant.
    RangedAttackType,
    /// Spell or magic special.
    MagicAttackType,
    /// Potion to drink.
    Potion,
    /// Eat regular food.
    Food,
    /// Eat combo food.
    Karambwan,
    /// Cast vengeance.
    Vengeance,
    /// Swap to defensive gear.
    Gear,
    /// Positioning relative to the opponent.
    Movement,
    /// Distance to keep when farcasting.
    FarcastDistance,
    /// Overhead prayer to switch to.
    Prayer,
}

/// Number of action heads.
pub const HEAD_COUNT: usize = 12;

/// Cardinality of each head, in head order. Index 0 is always the no-op.
pub const HEAD_SIZES: [usize; HEAD_COUNT] = [4, 3, 3, 4, 5, 2, 2, 2, 2, 5, 7, 6];

impl ActionHead {
    /// Every head in published order.
    pub const ALL: [Self; HEAD_COUNT] = [
        Self::Attack,
        Self::MeleeAttackType,
        Self::RangedAttackType,
        Self::MagicAttackType,
        Self::Potion,
        Self::Food,
        Self::Karambwan,
        Self::Vengeance,
        Self::Gear,
        Self::Movement,
        Self::FarcastDistance,
        Self::Prayer,
    ];

    /// Position of this head in the action vector.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Number of options in this head.
    pub const fn size(self) -> usize {
        HEAD_SIZES[self as usize]
    }

    /// Published head name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::MeleeAttackType => "melee_attack_type",
            Self::RangedAttackType => "ranged_attack_type",
            Self::MagicAttackType => "magic_attack_type",
            Self::Potion => "potion",
            Self::Food => "food",
            Self::Karambwan => "karambwan",
            Self::Vengeance => "vengeance",
            Self::Gear => "gear",
            Self::Movement => "movement",
            Self::FarcastDistance => "farcast_distance",
            Self::Prayer => "prayer",
        }
    }
}

/// Option indices within the heads, named for readability at call sites.
pub mod options {
    /// Universal no-op, valid in every head.
    pub const NO_OP: usize = 0;

    /// Attack head: melee.
    pub const ATTACK_MELEE: usize = 1;
    /// Attack head: ranged.
    pub const ATTACK_RANGED: usize = 2;
    /// Attack head: magic.
    pub const ATTACK_MAGIC: usize = 3;

    /// Melee/ranged type heads: basic attack.
    pub const TYPE_BASIC: usize = 1;
    /// Melee/ranged type heads: special attack.
    pub const TYPE_SPECIAL: usize = 2;

    /// Magic type head: freezing spell.
    pub const MAGIC_ICE: usize = 1;
    /// Magic type head: healing spell.
    pub const MAGIC_BLOOD: usize = 2;
    /// Magic type head: special attack.
    pub const MAGIC_SPECIAL: usize = 3;

    /// Potion head: brew.
    pub const POTION_BREW: usize = 1;
    /// Potion head: restore.
    pub const POTION_RESTORE: usize = 2;
    /// Potion head: melee combat boost.
    pub const POTION_COMBAT: usize = 3;
    /// Potion head: ranged boost.
    pub const POTION_RANGED: usize = 4;

    /// Binary heads (food, karambwan, vengeance, gear): act.
    pub const ACT: usize = 1;

    /// Movement head: step next to the opponent.
    pub const MOVE_ADJACENT: usize = 1;
    /// Movement head: step under the opponent.
    pub const MOVE_UNDER: usize = 2;
    /// Movement head: keep farcast distance.
    pub const MOVE_FARCAST: usize = 3;
    /// Movement head: step diagonal to the opponent.
    pub const MOVE_DIAGONAL: usize = 4;

    /// Smallest farcast distance encoded by option 1.
    pub const FARCAST_MIN_DISTANCE: usize = 2;

    /// Prayer head: protect from magic.
    pub const PRAY_MAGIC: usize = 1;
    /// Prayer head: protect from missiles.
    pub const PRAY_RANGED: usize = 2;
    /// Prayer head: protect from melee.
    pub const PRAY_MELEE: usize = 3;
    /// Prayer head: smite.
    pub const PRAY_SMITE: usize = 4;
    /// Prayer head: redemption.
    pub const PRAY_REDEMPTION: usize = 5;
}

/// Violations of the published contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// Observation vector length differs from [`OBSERVATION_SIZE`].
    #[error("observation length {actual} does not match contract size {expected}")]
    ObservationLength {
        /// Contract length.
        expected: usize,
        /// Length found.
        actual: usize,
    },

    /// Observation contains NaN or infinity.
    #[error("observation field {field} is not finite")]
    NonFinite {
        /// Published name of the offending field.
        field: &'static str,
    },

    /// Mask or action has the wrong number of heads.
    #[error("expected {expected} heads, found {actual}")]
    HeadCount {
        /// [`HEAD_COUNT`].
        expected: usize,
        /// Heads found.
        actual: usize,
    },

    /// A mask head has the wrong number of options.
    #[error("head {head} has {actual} options, contract size is {expected}")]
    HeadSize {
        /// Published head name.
        head: &'static str,
        /// Contract size.
        expected: usize,
        /// Options found.
        actual: usize,
    },

    /// A mask head does not allow its no-op.
    #[error("head {head} masks out its no-op")]
    NoOpMasked {
        /// Published head name.
        head: &'static str,
    },

    /// An action selects an index outside its head.
    #[error("head {head} selected option {selected}, but it has only {size}")]
    OptionOutOfRange {
        /// Published head name.
        head: &'static str,
        /// Selected index as received.
        selected: i64,
        /// Head cardinality.
        size: usize,
    },
}

/// Fingerprint of the contract as published to the decision service.
///
/// Must be updated together with any change to [`ObservationField`] or
/// [`HEAD_SIZES`].
pub const PUBLISHED_FINGERPRINT: u64 = 0xf4f3_0392_8497_6251;

/// FNV-1a fingerprint over every field name and head size.
///
/// Both sides of the wire can compare this value at startup to detect a
/// drifted contract before any observation is exchanged.
pub fn fingerprint() -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    fn mix(hash: u64, bytes: &[u8]) -> u64 {
        bytes
            .iter()
            .fold(hash, |h, b| (h ^ u64::from(*b)).wrapping_mul(PRIME))
    }

    let mut hash = OFFSET;
    for field in ObservationField::ALL {
        hash = mix(hash, field.name().as_bytes());
        hash = mix(hash, b";");
    }
    for head in ActionHead::ALL {
        hash = mix(hash, head.name().as_bytes());
        let size = u64::try_from(head.size()).unwrap_or(u64::MAX);
        hash = mix(hash, &size.to_le_bytes());
    }
    hash
}

/// [`fingerprint`] as 16 lowercase hex digits, the form sent on the wire.
pub fn fingerprint_hex() -> String {
    format!("{:016x}", fingerprint())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn field_indices_are_dense_and_ordered() {
        for (i, field) in ObservationField::ALL.iter().enumerate() {
            assert_eq!(field.index(), i, "{} out of order", field.name());
        }
        assert_eq!(OBSERVATION_SIZE, ObservationField::ALL.len());
    }

    #[test]
    fn field_names_are_unique() {
        let names: BTreeSet<&str> = ObservationField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names.len(), OBSERVATION_SIZE);
    }

    #[test]
    fn heads_match_size_table() {
        assert_eq!(ActionHead::ALL.len(), HEAD_COUNT);
        for (i, head) in ActionHead::ALL.iter().enumerate() {
            assert_eq!(head.index(), i);
            assert!(head.size() >= 2, "{} needs a no-op and one action", head.name());
        }
        assert_eq!(ActionHead::FarcastDistance.size(), 7);
        assert_eq!(ActionHead::Prayer.size(), 6);
    }

    #[test]
    fn fingerprint_matches_published_layout() {
        assert_eq!(
            fingerprint(),
            PUBLISHED_FINGERPRINT,
            "observation or head layout changed; update PUBLISHED_FINGERPRINT"
        );
        assert_eq!(fingerprint_hex(), "f4f3039284976251");
    }
}
