//! Action mask builder.
//!
//! Derives, for every head, which options are currently legal. The no-op
//! of every head is always legal. The builder reads the same
//! [`CycleView`] as the encoder, so a mask never disagrees with the
//! observation it is sent with.

use skirmish_types::{ActionHead, ActionMask, ActorRole, CombatStyle, TimerKey, options};

use crate::view::CycleView;

/// Magic level needed to cast any combat spell.
pub const MAGIC_ATTACK_LEVEL: u32 = 92;

/// Magic level needed for ice spells.
pub const ICE_SPELL_LEVEL: u32 = 94;

/// Magic level needed for blood spells.
pub const BLOOD_SPELL_LEVEL: u32 = 92;

/// Magic level needed for vengeance.
pub const VENGEANCE_MAGIC_LEVEL: u32 = 94;

/// Defence level needed for vengeance.
pub const VENGEANCE_DEFENCE_LEVEL: u32 = 40;

/// Prayer level needed for smite.
pub const SMITE_PRAYER_LEVEL: u32 = 52;

/// Prayer level needed for redemption.
pub const REDEMPTION_PRAYER_LEVEL: u32 = 49;

/// Build the mask for one cycle.
pub fn build_mask(view: &CycleView<'_>) -> ActionMask {
    let mut mask = ActionMask::no_ops_only();
    let agent = view.agent;
    let skills = &agent.skills;
    let gear = view.agent_loadout;
    let bound = view.opponent.is_bound();
    let me = ActorRole::Agent;

    let special_ready = |style: CombatStyle| {
        gear.special_cost(style)
            .is_some_and(|cost| agent.special_energy >= cost)
    };

    // attack
    let can_attack = bound && !view.has(me, TimerKey::AttackCooldown);
    mask.set(
        ActionHead::Attack,
        options::ATTACK_MELEE,
        can_attack && gear.can_wield(CombatStyle::Melee),
    );
    mask.set(
        ActionHead::Attack,
        options::ATTACK_RANGED,
        can_attack && gear.can_wield(CombatStyle::Ranged),
    );
    mask.set(
        ActionHead::Attack,
        options::ATTACK_MAGIC,
        can_attack && gear.can_wield(CombatStyle::Magic) && skills.magic >= MAGIC_ATTACK_LEVEL,
    );

    // attack types
    for (head, style) in [
        (ActionHead::MeleeAttackType, CombatStyle::Melee),
        (ActionHead::RangedAttackType, CombatStyle::Ranged),
    ] {
        mask.set(head, options::TYPE_BASIC, bound);
        mask.set(head, options::TYPE_SPECIAL, special_ready(style));
    }
    mask.set(
        ActionHead::MagicAttackType,
        options::MAGIC_ICE,
        bound && skills.magic >= ICE_SPELL_LEVEL,
    );
    mask.set(
        ActionHead::MagicAttackType,
        options::MAGIC_BLOOD,
        bound && skills.magic >= BLOOD_SPELL_LEVEL,
    );
    mask.set(
        ActionHead::MagicAttackType,
        options::MAGIC_SPECIAL,
        special_ready(CombatStyle::Magic),
    );

    // consumables
    let supplies = &agent.supplies;
    let potion_ready = !view.has(me, TimerKey::PotionCooldown);
    for (option, doses) in [
        (options::POTION_BREW, supplies.brew_doses),
        (options::POTION_RESTORE, supplies.restore_doses),
        (options::POTION_COMBAT, supplies.combat_doses),
        (options::POTION_RANGED, supplies.ranged_doses),
    ] {
        mask.set(ActionHead::Potion, option, potion_ready && doses > 0);
    }
    mask.set(
        ActionHead::Food,
        options::ACT,
        supplies.food > 0 && !view.has(me, TimerKey::FoodCooldown),
    );
    mask.set(
        ActionHead::Karambwan,
        options::ACT,
        supplies.karambwans > 0 && !view.has(me, TimerKey::KarambwanCooldown),
    );

    mask.set(
        ActionHead::Vengeance,
        options::ACT,
        skills.magic >= VENGEANCE_MAGIC_LEVEL
            && skills.defence >= VENGEANCE_DEFENCE_LEVEL
            && !view.has(me, TimerKey::VengeanceCooldown)
            && !agent.vengeance_active,
    );

    mask.set(ActionHead::Gear, options::ACT, gear.tank_available);

    // movement
    let can_move = bound && !view.has(me, TimerKey::Freeze);
    for option in 1..ActionHead::Movement.size() {
        mask.set(ActionHead::Movement, option, can_move);
    }
    for option in 1..ActionHead::FarcastDistance.size() {
        mask.set(ActionHead::FarcastDistance, option, can_move);
    }

    // prayer
    let has_points = agent.prayer_points > 0;
    for option in [options::PRAY_MAGIC, options::PRAY_RANGED, options::PRAY_MELEE] {
        mask.set(ActionHead::Prayer, option, has_points);
    }
    mask.set(
        ActionHead::Prayer,
        options::PRAY_SMITE,
        has_points && skills.prayer >= SMITE_PRAYER_LEVEL,
    );
    mask.set(
        ActionHead::Prayer,
        options::PRAY_REDEMPTION,
        has_points && skills.prayer >= REDEMPTION_PRAYER_LEVEL,
    );

    mask
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use skirmish_types::{
        ActorId, ActorSnapshot, AgentSnapshot, Equipment, HealthObservation, OverheadPrayer,
        Position, Skills, Supplies,
    };

    use super::*;
    use crate::history::CombatHistory;
    use crate::loadout::LoadoutFeatures;
    use crate::opponent::{NeutralOpponent, OpponentView};
    use crate::timers::TimerBook;

    const TILE: Position = Position { x: 3100, y: 3520, plane: 0 };

    struct Engaged(LoadoutFeatures);

    impl OpponentView for Engaged {
        fn actor_id(&self) -> Option<ActorId> {
            Some(ActorId(2))
        }

        fn health_fraction(&self) -> f64 {
            1.0
        }

        fn special_energy(&self) -> u32 {
            100
        }

        fn position(&self) -> Option<Position> {
            Some(Position { x: 3101, ..TILE })
        }

        fn overhead(&self) -> OverheadPrayer {
            OverheadPrayer::None
        }

        fn vengeance_active(&self) -> bool {
            false
        }

        fn loadout(&self) -> &LoadoutFeatures {
            &self.0
        }
    }

    struct Fixture {
        agent: AgentSnapshot,
        gear: LoadoutFeatures,
        bound: bool,
        timers: TimerBook,
        history: CombatHistory,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                agent: AgentSnapshot {
                    actor: ActorSnapshot {
                        id: ActorId(1),
                        position: TILE,
                        health: HealthObservation::Exact { current: 99, maximum: 99 },
                        equipment: Equipment::default(),
                        overhead: OverheadPrayer::None,
                    },
                    skills: Skills::default(),
                    prayer_points: 99,
                    special_energy: 100,
                    vengeance_active: false,
                    supplies: Supplies {
                        food: 1,
                        karambwans: 1,
                        brew_doses: 4,
                        restore_doses: 4,
                        combat_doses: 4,
                        ranged_doses: 4,
                    },
                    inventory: Vec::new(),
                },
                gear: LoadoutFeatures {
                    wieldable_styles: BTreeSet::from(CombatStyle::ALL),
                    special_costs: BTreeMap::from([
                        (CombatStyle::Melee, 50),
                        (CombatStyle::Ranged, 55),
                        (CombatStyle::Magic, 25),
                    ]),
                    ..LoadoutFeatures::default()
                },
                bound: true,
                timers: TimerBook::new(),
                history: CombatHistory::default(),
            }
        }

        fn start(&mut self, key: TimerKey, cycles: u32) {
            self.timers.get_mut(ActorRole::Agent).register(key, cycles);
        }

        fn mask(&self) -> ActionMask {
            let neutral = NeutralOpponent::default();
            let engaged = Engaged(LoadoutFeatures::default());
            let opponent: &dyn OpponentView = if self.bound { &engaged } else { &neutral };
            build_mask(&CycleView {
                agent: &self.agent,
                agent_loadout: &self.gear,
                opponent,
                timers: &self.timers,
                history: &self.history,
                engagement_cycles: 0,
            })
        }
    }

    #[test]
    fn no_op_is_legal_in_every_head() {
        let mut starved = Fixture::new();
        starved.bound = false;
        starved.agent.prayer_points = 0;
        starved.agent.supplies = Supplies::default();
        starved.gear = LoadoutFeatures::default();
        for fixture in [Fixture::new(), starved] {
            let mask = fixture.mask();
            for head in ActionHead::ALL {
                assert!(mask.allows(head, options::NO_OP), "{} no-op masked", head.name());
            }
        }
    }

    #[test]
    fn attack_needs_target_weapon_and_no_cooldown() {
        let mask = Fixture::new().mask();
        for option in [options::ATTACK_MELEE, options::ATTACK_RANGED, options::ATTACK_MAGIC] {
            assert!(mask.allows(ActionHead::Attack, option));
        }

        let mut cooling = Fixture::new();
        cooling.start(TimerKey::AttackCooldown, 2);
        assert!(!cooling.mask().allows(ActionHead::Attack, options::ATTACK_MELEE));

        let mut unbound = Fixture::new();
        unbound.bound = false;
        assert!(!unbound.mask().allows(ActionHead::Attack, options::ATTACK_MELEE));

        let mut melee_only = Fixture::new();
        melee_only.gear.wieldable_styles = BTreeSet::from([CombatStyle::Melee]);
        let mask = melee_only.mask();
        assert!(mask.allows(ActionHead::Attack, options::ATTACK_MELEE));
        assert!(!mask.allows(ActionHead::Attack, options::ATTACK_RANGED));
        assert!(!mask.allows(ActionHead::Attack, options::ATTACK_MAGIC));

        let mut low_magic = Fixture::new();
        low_magic.agent.skills.magic = 91;
        assert!(!low_magic.mask().allows(ActionHead::Attack, options::ATTACK_MAGIC));
    }

    #[test]
    fn spell_options_follow_magic_level() {
        // (magic level, bound, ice, blood)
        let cases = [
            (99, true, true, true),
            (ICE_SPELL_LEVEL, true, true, true),
            (93, true, false, true),
            (91, true, false, false),
            (99, false, false, false),
        ];
        for (magic, bound, ice, blood) in cases {
            let mut fixture = Fixture::new();
            fixture.agent.skills.magic = magic;
            fixture.bound = bound;
            let mask = fixture.mask();
            let spell = |option| mask.allows(ActionHead::MagicAttackType, option);
            assert_eq!(spell(options::MAGIC_ICE), ice, "{magic}");
            assert_eq!(spell(options::MAGIC_BLOOD), blood, "{magic}");
        }
    }

    #[test]
    fn special_attack_needs_enough_energy() {
        // (energy, melee special, ranged special, magic special)
        let cases = [
            (100, true, true, true),
            (55, true, true, true),
            (54, true, false, true),
            (49, false, false, true),
            (24, false, false, false),
        ];
        for (energy, melee, ranged, magic) in cases {
            let mut fixture = Fixture::new();
            fixture.agent.special_energy = energy;
            let mask = fixture.mask();
            let special = |head| mask.allows(head, options::TYPE_SPECIAL);
            assert_eq!(special(ActionHead::MeleeAttackType), melee, "{energy}");
            assert_eq!(special(ActionHead::RangedAttackType), ranged, "{energy}");
            assert_eq!(
                mask.allows(ActionHead::MagicAttackType, options::MAGIC_SPECIAL),
                magic,
                "{energy}"
            );
        }

        let mut no_special = Fixture::new();
        no_special.gear.special_costs.clear();
        let mask = no_special.mask();
        assert!(!mask.allows(ActionHead::MeleeAttackType, options::TYPE_SPECIAL));
        assert!(mask.allows(ActionHead::MeleeAttackType, options::TYPE_BASIC));
    }

    #[test]
    fn potions_need_doses_and_no_cooldown() {
        let mask = Fixture::new().mask();
        for option in 1..ActionHead::Potion.size() {
            assert!(mask.allows(ActionHead::Potion, option));
        }

        let doses: [(usize, fn(&mut Supplies)); 4] = [
            (options::POTION_BREW, |s: &mut Supplies| s.brew_doses = 0),
            (options::POTION_RESTORE, |s: &mut Supplies| s.restore_doses = 0),
            (options::POTION_COMBAT, |s: &mut Supplies| s.combat_doses = 0),
            (options::POTION_RANGED, |s: &mut Supplies| s.ranged_doses = 0),
        ];
        for (option, empty) in doses {
            let mut fixture = Fixture::new();
            empty(&mut fixture.agent.supplies);
            let mask = fixture.mask();
            for other in 1..ActionHead::Potion.size() {
                assert_eq!(mask.allows(ActionHead::Potion, other), other != option);
            }
        }

        let mut cooling = Fixture::new();
        cooling.start(TimerKey::PotionCooldown, 3);
        let mask = cooling.mask();
        assert!((1..ActionHead::Potion.size()).all(|o| !mask.allows(ActionHead::Potion, o)));
    }

    #[test]
    fn food_and_karambwan_have_separate_cooldowns() {
        let mut fixture = Fixture::new();
        fixture.start(TimerKey::FoodCooldown, 3);
        let mask = fixture.mask();
        assert!(!mask.allows(ActionHead::Food, options::ACT));
        assert!(mask.allows(ActionHead::Karambwan, options::ACT));

        let mut empty = Fixture::new();
        empty.agent.supplies.karambwans = 0;
        let mask = empty.mask();
        assert!(mask.allows(ActionHead::Food, options::ACT));
        assert!(!mask.allows(ActionHead::Karambwan, options::ACT));
    }

    #[test]
    fn vengeance_needs_levels_cooldown_and_no_active_cast() {
        // (magic, defence, on cooldown, already active, allowed)
        let cases = [
            (VENGEANCE_MAGIC_LEVEL, VENGEANCE_DEFENCE_LEVEL, false, false, true),
            (93, 99, false, false, false),
            (99, 39, false, false, false),
            (99, 99, true, false, false),
            (99, 99, false, true, false),
        ];
        for (magic, defence, cooling, active, allowed) in cases {
            let mut fixture = Fixture::new();
            fixture.agent.skills.magic = magic;
            fixture.agent.skills.defence = defence;
            fixture.agent.vengeance_active = active;
            if cooling {
                fixture.start(TimerKey::VengeanceCooldown, 10);
            }
            assert_eq!(
                fixture.mask().allows(ActionHead::Vengeance, options::ACT),
                allowed,
                "magic {magic} defence {defence} cooling {cooling} active {active}"
            );
        }
    }

    #[test]
    fn gear_switch_needs_a_tank_piece() {
        let mut fixture = Fixture::new();
        assert!(!fixture.mask().allows(ActionHead::Gear, options::ACT));
        fixture.gear.tank_available = true;
        assert!(fixture.mask().allows(ActionHead::Gear, options::ACT));
    }

    #[test]
    fn freeze_and_unbound_block_movement() {
        let mask = Fixture::new().mask();
        assert!(mask.allows(ActionHead::Movement, options::MOVE_UNDER));
        assert!(mask.allows(ActionHead::FarcastDistance, 1));

        let mut frozen = Fixture::new();
        frozen.start(TimerKey::Freeze, 4);
        let mask = frozen.mask();
        assert!((1..ActionHead::Movement.size()).all(|o| !mask.allows(ActionHead::Movement, o)));
        assert!(!mask.allows(ActionHead::FarcastDistance, 1));

        let mut unbound = Fixture::new();
        unbound.bound = false;
        assert!(!unbound.mask().allows(ActionHead::Movement, options::MOVE_ADJACENT));
    }

    #[test]
    fn prayers_follow_points_and_prayer_level() {
        // (points, prayer level, protect, smite, redemption)
        let cases = [
            (99, 99, true, true, true),
            (99, SMITE_PRAYER_LEVEL, true, true, true),
            (99, 51, true, false, true),
            (99, 48, true, false, false),
            (1, 99, true, true, true),
            (0, 99, false, false, false),
        ];
        for (points, level, protect, smite, redemption) in cases {
            let mut fixture = Fixture::new();
            fixture.agent.prayer_points = points;
            fixture.agent.skills.prayer = level;
            let mask = fixture.mask();
            for option in [options::PRAY_MAGIC, options::PRAY_RANGED, options::PRAY_MELEE] {
                assert_eq!(mask.allows(ActionHead::Prayer, option), protect, "{points}/{level}");
            }
            assert_eq!(mask.allows(ActionHead::Prayer, options::PRAY_SMITE), smite);
            assert_eq!(mask.allows(ActionHead::Prayer, options::PRAY_REDEMPTION), redemption);
        }
    }
}
