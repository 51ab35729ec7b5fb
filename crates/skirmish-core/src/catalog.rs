//! Item catalog: static item definitions and the bonuses they grant.
//!
//! The catalog resolves observed equipment (by identifier or by display
//! name) into [`ItemDefinition`]s. A default table is embedded at build
//! time from `data/items.yaml`; deployments can point
//! `loadout.catalog_path` at a replacement file with the same layout.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use skirmish_types::{CombatStyle, ItemId, Slot};

const EMBEDDED_CATALOG: &str = include_str!("../data/items.yaml");

/// Errors that can occur when loading an item catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Failed to read the catalog file from disk.
    #[error("failed to read item catalog: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse catalog YAML.
    #[error("failed to parse item catalog YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// Two entries share the same item identifier.
    #[error("duplicate item id {id} in catalog")]
    DuplicateId {
        /// The repeated identifier.
        id: ItemId,
    },

    /// An entry references a set with no declared threshold.
    #[error("item {id} references undeclared set {set:?}")]
    UnknownSet {
        /// The offending item.
        id: ItemId,
        /// The set name that is missing from `sets`.
        set: String,
    },
}

impl From<serde_yml::Error> for CatalogError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Aggregated combat bonuses of an item or a full loadout.
///
/// Accuracy and damage are offensive, defence is the bonus against
/// attacks of the given style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CombatBonuses {
    /// Melee accuracy bonus.
    pub melee_attack: f64,
    /// Ranged accuracy bonus.
    pub ranged_attack: f64,
    /// Magic accuracy bonus.
    pub magic_attack: f64,
    /// Melee strength bonus.
    pub melee_strength: f64,
    /// Ranged strength bonus.
    pub ranged_strength: f64,
    /// Magic damage bonus, in percent.
    pub magic_damage: f64,
    /// Defence against melee.
    pub melee_defence: f64,
    /// Defence against ranged.
    pub ranged_defence: f64,
    /// Defence against magic.
    pub magic_defence: f64,
}

impl CombatBonuses {
    /// Component-wise sum.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        Self {
            melee_attack: self.melee_attack + other.melee_attack,
            ranged_attack: self.ranged_attack + other.ranged_attack,
            magic_attack: self.magic_attack + other.magic_attack,
            melee_strength: self.melee_strength + other.melee_strength,
            ranged_strength: self.ranged_strength + other.ranged_strength,
            magic_damage: self.magic_damage + other.magic_damage,
            melee_defence: self.melee_defence + other.melee_defence,
            ranged_defence: self.ranged_defence + other.ranged_defence,
            magic_defence: self.magic_defence + other.magic_defence,
        }
    }

    /// Every component multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            melee_attack: self.melee_attack * factor,
            ranged_attack: self.ranged_attack * factor,
            magic_attack: self.magic_attack * factor,
            melee_strength: self.melee_strength * factor,
            ranged_strength: self.ranged_strength * factor,
            magic_damage: self.magic_damage * factor,
            melee_defence: self.melee_defence * factor,
            ranged_defence: self.ranged_defence * factor,
            magic_defence: self.magic_defence * factor,
        }
    }

    /// Confidence-weighted mix: `confidence * observed + (1 - confidence) * baseline`.
    ///
    /// `confidence` is clamped to `[0, 1]`.
    #[must_use]
    pub fn blend(observed: &Self, baseline: &Self, confidence: f64) -> Self {
        let c = confidence.clamp(0.0, 1.0);
        observed.scaled(c).plus(&baseline.scaled(1.0 - c))
    }

    /// Accuracy bonus for attacks of `style`.
    pub const fn accuracy(&self, style: CombatStyle) -> f64 {
        match style {
            CombatStyle::Melee => self.melee_attack,
            CombatStyle::Ranged => self.ranged_attack,
            CombatStyle::Magic => self.magic_attack,
        }
    }

    /// Damage bonus for attacks of `style`.
    pub const fn damage(&self, style: CombatStyle) -> f64 {
        match style {
            CombatStyle::Melee => self.melee_strength,
            CombatStyle::Ranged => self.ranged_strength,
            CombatStyle::Magic => self.magic_damage,
        }
    }

    /// Defence bonus against attacks of `style`.
    pub const fn defence(&self, style: CombatStyle) -> f64 {
        match style {
            CombatStyle::Melee => self.melee_defence,
            CombatStyle::Ranged => self.ranged_defence,
            CombatStyle::Magic => self.magic_defence,
        }
    }
}

/// Static definition of one item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemDefinition {
    /// Item identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Slot the item is worn in.
    pub slot: Slot,
    /// Attack style for weapons.
    #[serde(default)]
    pub style: Option<CombatStyle>,
    /// Cycles between attacks for weapons.
    #[serde(default)]
    pub attack_speed: Option<u32>,
    /// Special energy cost, for weapons with a special attack.
    #[serde(default)]
    pub special_cost: Option<u32>,
    /// Whether this is a defensive piece used for tank switches.
    #[serde(default)]
    pub tank: bool,
    /// Name of the armour set this piece belongs to.
    #[serde(default)]
    pub set: Option<String>,
    /// Bonuses granted while worn.
    #[serde(default)]
    pub bonuses: CombatBonuses,
}

impl ItemDefinition {
    /// Whether this is a weapon with a special attack.
    pub const fn has_special(&self) -> bool {
        self.special_cost.is_some()
    }
}

/// Read access to item definitions.
pub trait ItemLookup {
    /// Definition for an exact identifier.
    fn by_id(&self, id: ItemId) -> Option<&ItemDefinition>;

    /// Definition for a display name, compared after [`normalize_name`].
    fn by_name(&self, name: &str) -> Option<&ItemDefinition>;

    /// Number of pieces of `set` that must be worn for its effect.
    fn set_threshold(&self, set: &str) -> Option<u32>;
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    sets: BTreeMap<String, u32>,
    items: Vec<ItemDefinition>,
}

/// In-memory item table indexed by identifier and by normalized name.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: BTreeMap<ItemId, ItemDefinition>,
    names: BTreeMap<String, ItemId>,
    sets: BTreeMap<String, u32>,
}

impl ItemCatalog {
    /// The catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the embedded table is malformed.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::parse(EMBEDDED_CATALOG)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, or any
    /// error produced by [`ItemCatalog::parse`].
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a catalog from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Yaml`] on malformed YAML,
    /// [`CatalogError::DuplicateId`] if an identifier repeats, and
    /// [`CatalogError::UnknownSet`] if an item names an undeclared set.
    pub fn parse(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yml::from_str(yaml)?;
        let mut catalog = Self {
            sets: file.sets,
            ..Self::default()
        };
        for item in file.items {
            if let Some(set) = &item.set {
                if !catalog.sets.contains_key(set) {
                    return Err(CatalogError::UnknownSet {
                        id: item.id,
                        set: set.clone(),
                    });
                }
            }
            if catalog.items.contains_key(&item.id) {
                return Err(CatalogError::DuplicateId { id: item.id });
            }
            catalog.names.insert(normalize_name(&item.name), item.id);
            catalog.items.insert(item.id, item);
        }
        Ok(catalog)
    }

    /// Number of items in the catalog.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of the bonuses of every named item that resolves.
    ///
    /// Names that do not resolve are skipped and reported at debug level.
    pub fn bonuses_for_names(&self, names: &[String]) -> CombatBonuses {
        names.iter().fold(CombatBonuses::default(), |acc, name| {
            match self.by_name(name) {
                Some(item) => acc.plus(&item.bonuses),
                None => {
                    tracing::debug!(name = %name, "baseline item not in catalog");
                    acc
                }
            }
        })
    }
}

impl ItemLookup for ItemCatalog {
    fn by_id(&self, id: ItemId) -> Option<&ItemDefinition> {
        self.items.get(&id)
    }

    fn by_name(&self, name: &str) -> Option<&ItemDefinition> {
        self.names
            .get(&normalize_name(name))
            .and_then(|id| self.items.get(id))
    }

    fn set_threshold(&self, set: &str) -> Option<u32> {
        self.sets.get(set).copied()
    }
}

/// Canonical form of an item name for lookups.
///
/// Lowercases, drops parenthesised suffixes such as charge or poison
/// markers, and collapses every run of non-alphanumeric characters into a
/// single space. `"Dragon dagger(p++)"` and `"dragon  dagger"` normalize to
/// the same key.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0_u32;
    let mut pending_space = false;
    for ch in name.chars() {
        match ch {
            '(' => depth = depth.saturating_add(1),
            ')' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            c if c.is_alphanumeric() => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.extend(c.to_lowercase());
            }
            _ => pending_space = true,
        }
    }
    out
}
