//! Observation encoder.
//!
//! Maps a [`CycleView`] to the fixed-length, normalized observation vector
//! the decision service was trained on. Encoding is pure: the same view
//! always yields the same vector. Every value is finite and lies in
//! `[0, 1]`.
//!
//! While no opponent is bound, only the agent's own groups are encoded.
//! Every opponent, geometry, and history field holds its neutral value:
//! opponent health and special energy read `1.0`, distance reads `1.0`
//! (far), the damage scale reads its even-trade identity, and everything
//! else reads `0.0`. A missing health signal reads as full health.

use skirmish_types::{
    ActorRole, CombatStyle, ObservationField as F, ObservationVector, OverheadPrayer, TimerKey,
};

use crate::catalog::CombatBonuses;
use crate::history::{DAMAGE_SCALE_MAX, DAMAGE_SCALE_MIN};
use crate::loadout::LoadoutFeatures;
use crate::opponent::SPECIAL_ENERGY_FULL;
use crate::view::CycleView;

/// Normalization caps.
pub mod caps {
    /// Cooldown and freeze timers, in cycles.
    pub const TICKS: f64 = 32.0;
    /// Tile distance.
    pub const DISTANCE: f64 = 15.0;
    /// Pieces of food.
    pub const FOOD: f64 = 28.0;
    /// Brew and restore doses.
    pub const HEALING_DOSES: f64 = 32.0;
    /// Combat and ranged boost doses.
    pub const BOOST_DOSES: f64 = 8.0;
    /// Boosted skill levels.
    pub const LEVEL: f64 = 118.0;
    /// Prayer points.
    pub const PRAYER_POINTS: f64 = 99.0;
    /// Accuracy bonuses.
    pub const ACCURACY: f64 = 200.0;
    /// Melee and ranged strength bonuses.
    pub const STRENGTH: f64 = 200.0;
    /// Magic damage bonus, in percent.
    pub const MAGIC_DAMAGE: f64 = 50.0;
    /// Defence bonuses.
    pub const DEFENCE: f64 = 400.0;
    /// Engagement length, in cycles.
    pub const ENGAGEMENT: f64 = 500.0;
}

/// `value / cap` clamped to `[0, 1]`.
pub fn normalize(value: f64, cap: f64) -> f64 {
    if cap <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / cap).clamp(0.0, 1.0)
}

fn ticks(remaining: u32) -> f64 {
    normalize(f64::from(remaining), caps::TICKS)
}

/// Encode one cycle.
pub fn encode(view: &CycleView<'_>) -> ObservationVector {
    let mut obs = ObservationVector::zeroed();
    encode_agent(&mut obs, view);
    if view.opponent.is_bound() {
        encode_opponent(&mut obs, view);
        encode_geometry(&mut obs, view);
        encode_history(&mut obs, view);
    } else {
        obs.set(F::OpponentHealth, 1.0);
        obs.set(F::OpponentSpecialEnergy, 1.0);
        obs.set(F::Distance, 1.0);
        obs.set(F::DamageDealtScale, scale_feature(1.0));
    }
    obs
}

/// Position of a [`crate::history::damage_scale`] value within its clamp range.
fn scale_feature(scale: f64) -> f64 {
    ((scale - DAMAGE_SCALE_MIN) / (DAMAGE_SCALE_MAX - DAMAGE_SCALE_MIN)).clamp(0.0, 1.0)
}

fn encode_agent(obs: &mut ObservationVector, view: &CycleView<'_>) {
    let agent = view.agent;
    let me = ActorRole::Agent;

    obs.set(F::AgentHealth, agent.actor.health.fraction().unwrap_or(1.0));
    obs.set(
        F::AgentPrayerPoints,
        normalize(f64::from(agent.prayer_points), caps::PRAYER_POINTS),
    );
    obs.set(
        F::AgentSpecialEnergy,
        normalize(f64::from(agent.special_energy), f64::from(SPECIAL_ENERGY_FULL)),
    );
    obs.set_flag(F::AgentFrozen, view.has(me, TimerKey::Freeze));
    obs.set(F::AgentFreezeTicks, ticks(view.remaining(me, TimerKey::Freeze)));
    obs.set_flag(F::AgentFreezeImmune, view.has(me, TimerKey::FreezeImmunity));
    obs.set(
        F::AgentFreezeImmunityTicks,
        ticks(view.remaining(me, TimerKey::FreezeImmunity)),
    );
    obs.set(F::AgentAttackCooldown, ticks(view.remaining(me, TimerKey::AttackCooldown)));
    obs.set(F::AgentFoodCooldown, ticks(view.remaining(me, TimerKey::FoodCooldown)));
    obs.set(
        F::AgentKarambwanCooldown,
        ticks(view.remaining(me, TimerKey::KarambwanCooldown)),
    );
    obs.set(F::AgentPotionCooldown, ticks(view.remaining(me, TimerKey::PotionCooldown)));
    obs.set_flag(F::AgentVengeanceActive, agent.vengeance_active);
    obs.set(
        F::AgentVengeanceCooldown,
        ticks(view.remaining(me, TimerKey::VengeanceCooldown)),
    );

    let [magic, ranged, melee, smite, redemption] = prayer_flags(agent.actor.overhead);
    obs.set_flag(F::AgentPrayingMagic, magic);
    obs.set_flag(F::AgentPrayingRanged, ranged);
    obs.set_flag(F::AgentPrayingMelee, melee);
    obs.set_flag(F::AgentPrayingSmite, smite);
    obs.set_flag(F::AgentPrayingRedemption, redemption);

    let gear = view.agent_loadout;
    obs.set_flag(F::AgentWieldingMelee, gear.weapon_style == Some(CombatStyle::Melee));
    obs.set_flag(F::AgentWieldingRanged, gear.weapon_style == Some(CombatStyle::Ranged));
    obs.set_flag(F::AgentWieldingMagic, gear.weapon_style == Some(CombatStyle::Magic));
    obs.set_flag(F::AgentSpecialEquipped, gear.special_equipped());
    obs.set_flag(
        F::AgentMeleeSpecialAvailable,
        gear.special_cost(CombatStyle::Melee).is_some(),
    );
    obs.set_flag(
        F::AgentRangedSpecialAvailable,
        gear.special_cost(CombatStyle::Ranged).is_some(),
    );
    obs.set_flag(
        F::AgentMagicSpecialAvailable,
        gear.special_cost(CombatStyle::Magic).is_some(),
    );
    obs.set_flag(F::AgentSetEffectActive, gear.set_effect_active());
    obs.set_flag(F::AgentTankAvailable, gear.tank_available);

    let supplies = &agent.supplies;
    obs.set(F::AgentFoodCount, normalize(f64::from(supplies.food), caps::FOOD));
    obs.set(F::AgentKarambwanCount, normalize(f64::from(supplies.karambwans), caps::FOOD));
    obs.set(
        F::AgentBrewDoses,
        normalize(f64::from(supplies.brew_doses), caps::HEALING_DOSES),
    );
    obs.set(
        F::AgentRestoreDoses,
        normalize(f64::from(supplies.restore_doses), caps::HEALING_DOSES),
    );
    obs.set(
        F::AgentCombatDoses,
        normalize(f64::from(supplies.combat_doses), caps::BOOST_DOSES),
    );
    obs.set(
        F::AgentRangedDoses,
        normalize(f64::from(supplies.ranged_doses), caps::BOOST_DOSES),
    );

    let skills = &agent.skills;
    obs.set(F::AgentAttackLevel, normalize(f64::from(skills.attack), caps::LEVEL));
    obs.set(F::AgentStrengthLevel, normalize(f64::from(skills.strength), caps::LEVEL));
    obs.set(F::AgentDefenceLevel, normalize(f64::from(skills.defence), caps::LEVEL));
    obs.set(F::AgentRangedLevel, normalize(f64::from(skills.ranged), caps::LEVEL));
    obs.set(F::AgentMagicLevel, normalize(f64::from(skills.magic), caps::LEVEL));

    let [acc, dmg, def] = bonus_fields(&gear.bonuses);
    set_triplet(obs, [F::AgentMeleeAccuracy, F::AgentRangedAccuracy, F::AgentMagicAccuracy], acc);
    set_triplet(obs, [F::AgentMeleeDamage, F::AgentRangedDamage, F::AgentMagicDamage], dmg);
    set_triplet(obs, [F::AgentMeleeDefence, F::AgentRangedDefence, F::AgentMagicDefence], def);
}

fn encode_opponent(obs: &mut ObservationVector, view: &CycleView<'_>) {
    let opponent = view.opponent;
    let them = ActorRole::Opponent;

    obs.set_flag(F::OpponentPresent, true);
    obs.set(F::OpponentHealth, opponent.health_fraction());
    obs.set(
        F::OpponentSpecialEnergy,
        normalize(f64::from(opponent.special_energy()), f64::from(SPECIAL_ENERGY_FULL)),
    );
    obs.set_flag(F::OpponentFrozen, view.has(them, TimerKey::Freeze));
    obs.set(F::OpponentFreezeTicks, ticks(view.remaining(them, TimerKey::Freeze)));
    obs.set_flag(F::OpponentFreezeImmune, view.has(them, TimerKey::FreezeImmunity));
    obs.set(
        F::OpponentFreezeImmunityTicks,
        ticks(view.remaining(them, TimerKey::FreezeImmunity)),
    );
    obs.set(
        F::OpponentAttackCooldown,
        ticks(view.remaining(them, TimerKey::AttackCooldown)),
    );
    obs.set(F::OpponentFoodCooldown, ticks(view.remaining(them, TimerKey::FoodCooldown)));
    obs.set(
        F::OpponentPotionCooldown,
        ticks(view.remaining(them, TimerKey::PotionCooldown)),
    );
    obs.set_flag(F::OpponentVengeanceActive, opponent.vengeance_active());
    obs.set(
        F::OpponentVengeanceCooldown,
        ticks(view.remaining(them, TimerKey::VengeanceCooldown)),
    );

    let [magic, ranged, melee, smite, redemption] = prayer_flags(opponent.overhead());
    obs.set_flag(F::OpponentPrayingMagic, magic);
    obs.set_flag(F::OpponentPrayingRanged, ranged);
    obs.set_flag(F::OpponentPrayingMelee, melee);
    obs.set_flag(F::OpponentPrayingSmite, smite);
    obs.set_flag(F::OpponentPrayingRedemption, redemption);

    let gear: &LoadoutFeatures = opponent.loadout();
    obs.set_flag(F::OpponentWieldingMelee, gear.weapon_style == Some(CombatStyle::Melee));
    obs.set_flag(F::OpponentWieldingRanged, gear.weapon_style == Some(CombatStyle::Ranged));
    obs.set_flag(F::OpponentWieldingMagic, gear.weapon_style == Some(CombatStyle::Magic));
    obs.set_flag(F::OpponentSpecialEquipped, gear.special_equipped());
    obs.set_flag(F::OpponentSetEffectActive, gear.set_effect_active());

    let [acc, dmg, def] = bonus_fields(&gear.bonuses);
    set_triplet(
        obs,
        [F::OpponentMeleeAccuracy, F::OpponentRangedAccuracy, F::OpponentMagicAccuracy],
        acc,
    );
    set_triplet(
        obs,
        [F::OpponentMeleeDamage, F::OpponentRangedDamage, F::OpponentMagicDamage],
        dmg,
    );
    set_triplet(
        obs,
        [F::OpponentMeleeDefence, F::OpponentRangedDefence, F::OpponentMagicDefence],
        def,
    );
    obs.set(F::OpponentGearConfidence, gear.confidence.clamp(0.0, 1.0));
}

fn encode_geometry(obs: &mut ObservationVector, view: &CycleView<'_>) {
    let distance = view.distance();
    obs.set(
        F::Distance,
        distance.map_or(1.0, |d| normalize(f64::from(d), caps::DISTANCE)),
    );
    obs.set_flag(F::UnderOpponent, distance == Some(0));
    let diagonal = view
        .opponent
        .position()
        .is_some_and(|p| view.agent_position().is_diagonal_to(&p));
    obs.set_flag(F::DiagonalToOpponent, diagonal);
    obs.set_flag(F::InMeleeRange, distance == Some(1) && !diagonal);
}

fn encode_history(obs: &mut ObservationVector, view: &CycleView<'_>) {
    let history = view.history;
    let (me, them) = (ActorRole::Agent, ActorRole::Opponent);

    set_styles(
        obs,
        [
            F::AgentMeleeAttackRatio,
            F::AgentRangedAttackRatio,
            F::AgentMagicAttackRatio,
        ],
        |s| history.style_ratio(me, s),
    );
    set_styles(
        obs,
        [
            F::AgentRecentMeleeAttackRatio,
            F::AgentRecentRangedAttackRatio,
            F::AgentRecentMagicAttackRatio,
        ],
        |s| history.recent_style_ratio(me, s),
    );
    set_styles(
        obs,
        [
            F::OpponentMeleeAttackRatio,
            F::OpponentRangedAttackRatio,
            F::OpponentMagicAttackRatio,
        ],
        |s| history.style_ratio(them, s),
    );
    set_styles(
        obs,
        [
            F::OpponentRecentMeleeAttackRatio,
            F::OpponentRecentRangedAttackRatio,
            F::OpponentRecentMagicAttackRatio,
        ],
        |s| history.recent_style_ratio(them, s),
    );
    set_styles(
        obs,
        [F::OpponentPrayMeleeRatio, F::OpponentPrayRangedRatio, F::OpponentPrayMagicRatio],
        |s| history.prayer_ratio(them, s),
    );
    set_styles(
        obs,
        [
            F::OpponentRecentPrayMeleeRatio,
            F::OpponentRecentPrayRangedRatio,
            F::OpponentRecentPrayMagicRatio,
        ],
        |s| history.recent_prayer_ratio(them, s),
    );

    obs.set(F::AgentHitCorrectRatio, history.hit_correct_ratio(me));
    obs.set(F::AgentRecentHitCorrectRatio, history.recent_hit_correct_ratio(me));
    obs.set(F::TargetHitCorrectRatio, history.hit_correct_ratio(them));
    obs.set(F::RecentTargetHitCorrectRatio, history.recent_hit_correct_ratio(them));

    obs.set(F::DamageDealtScale, scale_feature(history.damage_dealt_scale()));
    obs.set(
        F::EngagementLength,
        normalize(view.engagement_cycles as f64, caps::ENGAGEMENT),
    );
}

/// `[magic, ranged, melee, smite, redemption]`
const fn prayer_flags(prayer: OverheadPrayer) -> [bool; 5] {
    [
        matches!(prayer, OverheadPrayer::ProtectMagic),
        matches!(prayer, OverheadPrayer::ProtectRanged),
        matches!(prayer, OverheadPrayer::ProtectMelee),
        matches!(prayer, OverheadPrayer::Smite),
        matches!(prayer, OverheadPrayer::Redemption),
    ]
}

/// Normalized `[accuracy, damage, defence]`, each in style order.
fn bonus_fields(bonuses: &CombatBonuses) -> [[f64; 3]; 3] {
    let acc = CombatStyle::ALL.map(|s| normalize(bonuses.accuracy(s), caps::ACCURACY));
    let dmg = CombatStyle::ALL.map(|s| {
        let cap = match s {
            CombatStyle::Magic => caps::MAGIC_DAMAGE,
            CombatStyle::Melee | CombatStyle::Ranged => caps::STRENGTH,
        };
        normalize(bonuses.damage(s), cap)
    });
    let def = CombatStyle::ALL.map(|s| normalize(bonuses.defence(s), caps::DEFENCE));
    [acc, dmg, def]
}

fn set_triplet(obs: &mut ObservationVector, fields: [F; 3], values: [f64; 3]) {
    for (field, value) in fields.into_iter().zip(values) {
        obs.set(field, value);
    }
}

fn set_styles(obs: &mut ObservationVector, fields: [F; 3], value: impl Fn(CombatStyle) -> f64) {
    for (field, style) in fields.into_iter().zip(CombatStyle::ALL) {
        obs.set(field, value(style));
    }
}
