//! Loadout features derived from observed equipment.
//!
//! Extraction is a pure function of the equipment view, the carried items,
//! the catalog, and a baseline. Opponent equipment is partially hidden, so
//! the aggregate bonuses are blended towards the baseline in proportion to
//! how much of the loadout could actually be resolved.

use std::collections::{BTreeMap, BTreeSet};

use skirmish_types::{CombatStyle, Equipment, ItemId, Slot, SlotView};

use crate::catalog::{CombatBonuses, ItemDefinition, ItemLookup};

/// Summary of an actor's gear for one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadoutFeatures {
    /// Style of the worn weapon, if it resolved.
    pub weapon_style: Option<CombatStyle>,
    /// Attack speed of the worn weapon, if it resolved.
    pub weapon_attack_speed: Option<u32>,
    /// Special cost of the worn weapon, if it has a special attack.
    pub equipped_special_cost: Option<u32>,
    /// Styles with at least one weapon worn or carried.
    pub wieldable_styles: BTreeSet<CombatStyle>,
    /// Cheapest special attack available per style, worn or carried.
    pub special_costs: BTreeMap<CombatStyle, u32>,
    /// Sets whose worn piece count reaches their threshold.
    pub active_sets: BTreeSet<String>,
    /// A carried tank piece could be switched in.
    pub tank_available: bool,
    /// Blended bonuses used for encoding.
    pub bonuses: CombatBonuses,
    /// Fraction of slots whose contents are known, in `[0, 1]`.
    pub confidence: f64,
}

impl LoadoutFeatures {
    /// Whether the worn weapon has a special attack.
    pub const fn special_equipped(&self) -> bool {
        self.equipped_special_cost.is_some()
    }

    /// Cheapest special attack of `style` that could be used.
    pub fn special_cost(&self, style: CombatStyle) -> Option<u32> {
        self.special_costs.get(&style).copied()
    }

    /// Whether a weapon of `style` is worn or carried.
    pub fn can_wield(&self, style: CombatStyle) -> bool {
        self.wieldable_styles.contains(&style)
    }

    /// Whether any armour set effect is active.
    pub fn set_effect_active(&self) -> bool {
        !self.active_sets.is_empty()
    }
}

fn resolve<'a>(
    view: &SlotView,
    catalog: &'a dyn ItemLookup,
    visibility: Visibility,
) -> (bool, Option<&'a ItemDefinition>) {
    match view {
        SlotView::Empty => (true, None),
        SlotView::Hidden if visibility == Visibility::Full => (true, None),
        SlotView::Item(id) => {
            let item = catalog.by_id(*id);
            (item.is_some(), item)
        }
        SlotView::Named(name) => {
            let item = catalog.by_name(name);
            (item.is_some(), item)
        }
        SlotView::Hidden => (false, None),
    }
}

fn note_weapon(features: &mut LoadoutFeatures, item: &ItemDefinition) {
    let Some(style) = item.style else {
        return;
    };
    features.wieldable_styles.insert(style);
    if let Some(cost) = item.special_cost {
        features
            .special_costs
            .entry(style)
            .and_modify(|c| *c = (*c).min(cost))
            .or_insert(cost);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    /// Absent slots are unknown.
    Partial,
    /// Absent slots are empty.
    Full,
}

/// Extract loadout features of a partially observed actor.
///
/// `inventory` lists carried items; pass an empty slice for an actor whose
/// inventory is not observable. `baseline` supplies the bonuses assumed for
/// slots that could not be resolved.
pub fn extract(
    equipment: &Equipment,
    inventory: &[ItemId],
    catalog: &dyn ItemLookup,
    baseline: &CombatBonuses,
) -> LoadoutFeatures {
    extract_with(equipment, inventory, catalog, baseline, Visibility::Partial)
}

/// Extract loadout features of the agent, whose equipment is fully
/// observable: slots missing from `equipment` are treated as empty.
pub fn extract_own(
    equipment: &Equipment,
    inventory: &[ItemId],
    catalog: &dyn ItemLookup,
) -> LoadoutFeatures {
    extract_with(
        equipment,
        inventory,
        catalog,
        &CombatBonuses::default(),
        Visibility::Full,
    )
}

fn extract_with(
    equipment: &Equipment,
    inventory: &[ItemId],
    catalog: &dyn ItemLookup,
    baseline: &CombatBonuses,
    visibility: Visibility,
) -> LoadoutFeatures {
    let mut features = LoadoutFeatures::default();
    let mut observed = CombatBonuses::default();
    let mut resolved_slots = 0_u32;
    let mut set_pieces: BTreeMap<&str, u32> = BTreeMap::new();

    for slot in Slot::ALL {
        let (known, item) = resolve(equipment.get(slot), catalog, visibility);
        if known {
            resolved_slots = resolved_slots.saturating_add(1);
        }
        let Some(item) = item else {
            continue;
        };
        observed = observed.plus(&item.bonuses);
        if let Some(set) = &item.set {
            let count = set_pieces.entry(set.as_str()).or_insert(0);
            *count = count.saturating_add(1);
        }
        if slot == Slot::Weapon {
            features.weapon_style = item.style;
            features.weapon_attack_speed = item.attack_speed;
            features.equipped_special_cost = item.special_cost;
            note_weapon(&mut features, item);
        }
    }

    let mut carried_tank = 0_u32;
    for item in inventory.iter().filter_map(|id| catalog.by_id(*id)) {
        if item.slot == Slot::Weapon {
            note_weapon(&mut features, item);
        }
        if item.tank {
            carried_tank = carried_tank.saturating_add(1);
        }
    }
    features.tank_available = carried_tank > 0;

    features.active_sets = set_pieces
        .into_iter()
        .filter(|(set, pieces)| catalog.set_threshold(set).is_some_and(|t| *pieces >= t))
        .map(|(set, _)| set.to_owned())
        .collect();

    features.confidence = f64::from(resolved_slots) / Slot::ALL.len() as f64;
    features.bonuses = CombatBonuses::blend(&observed, baseline, features.confidence);
    features
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::ItemCatalog;

    const EPS: f64 = 1e-9;

    fn catalog() -> ItemCatalog {
        ItemCatalog::embedded().unwrap()
    }

    fn full_mage_equipment() -> Equipment {
        let mut eq = Equipment::from_slots(Slot::ALL.map(|s| (s, SlotView::Empty)));
        eq.set(Slot::Weapon, SlotView::Item(ItemId(4675)));
        eq.set(Slot::Body, SlotView::Item(ItemId(4091)));
        eq.set(Slot::Legs, SlotView::Named("Mystic robe bottom".to_owned()));
        eq
    }

    #[test]
    fn fully_observed_loadout_has_full_confidence() {
        let catalog = catalog();
        let features = extract(&full_mage_equipment(), &[], &catalog, &CombatBonuses::default());
        assert!((features.confidence - 1.0).abs() < EPS);
        assert_eq!(features.weapon_style, Some(CombatStyle::Magic));
        assert_eq!(features.weapon_attack_speed, Some(5));
        assert!(!features.special_equipped());
        // staff 15 + top 20 + bottom 15
        assert!((features.bonuses.magic_attack - 50.0).abs() < EPS);
    }

    #[test]
    fn hidden_slots_fall_back_to_baseline() {
        let catalog = catalog();
        let baseline = CombatBonuses {
            magic_attack: 100.0,
            ..CombatBonuses::default()
        };
        let features = extract(&Equipment::default(), &[], &catalog, &baseline);
        assert!(features.confidence.abs() < EPS);
        assert!((features.bonuses.magic_attack - 100.0).abs() < EPS);
        assert_eq!(features.weapon_style, None);
    }

    #[test]
    fn unknown_items_do_not_count_as_resolved() {
        let catalog = catalog();
        let eq = Equipment::from_slots([
            (Slot::Weapon, SlotView::Item(ItemId(999_999))),
            (Slot::Ring, SlotView::Empty),
        ]);
        let features = extract(&eq, &[], &catalog, &CombatBonuses::default());
        assert!((features.confidence - 1.0 / 11.0).abs() < EPS);
    }

    #[test]
    fn own_loadout_treats_absent_slots_as_empty() {
        let catalog = catalog();
        let eq = Equipment::from_slots([(Slot::Weapon, SlotView::Item(ItemId(4151)))]);
        let features = extract_own(&eq, &[], &catalog);
        assert!((features.confidence - 1.0).abs() < EPS);
        assert!((features.bonuses.melee_attack - 82.0).abs() < EPS);
    }

    #[test]
    fn carried_weapons_add_styles_and_specials() {
        let catalog = catalog();
        let inventory = [ItemId(11785), ItemId(5698), ItemId(13652), ItemId(4720)];
        let baseline = CombatBonuses::default();
        let features = extract(&full_mage_equipment(), &inventory, &catalog, &baseline);
        assert!(features.can_wield(CombatStyle::Magic));
        assert!(features.can_wield(CombatStyle::Ranged));
        assert!(features.can_wield(CombatStyle::Melee));
        assert_eq!(features.special_cost(CombatStyle::Ranged), Some(40));
        assert_eq!(features.special_cost(CombatStyle::Melee), Some(25));
        assert_eq!(features.special_cost(CombatStyle::Magic), None);
        assert!(features.tank_available);
    }

    #[test]
    fn set_effect_requires_threshold_pieces() {
        let catalog = catalog();
        let mut eq = Equipment::from_slots([
            (Slot::Head, SlotView::Item(ItemId(4716))),
            (Slot::Body, SlotView::Item(ItemId(4720))),
            (Slot::Legs, SlotView::Item(ItemId(4722))),
        ]);
        let partial = extract(&eq, &[], &catalog, &CombatBonuses::default());
        assert!(!partial.set_effect_active());
        eq.set(Slot::Weapon, SlotView::Item(ItemId(4718)));
        let full = extract(&eq, &[], &catalog, &CombatBonuses::default());
        assert!(full.set_effect_active());
        assert!(full.active_sets.contains("dharok"));
    }
}
