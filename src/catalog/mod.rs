//! Unit catalog interface
//!
//! The generator never owns unit data. Every leaf lookup goes through a
//! [`UnitCatalog`], which answers table queries for a faction, era and set of
//! constraints, and reports how available a chassis or model is.

pub mod memory;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::{MissionRole, MovementMode, NetworkMask, UnitType, WeightClass};

pub use memory::InMemoryCatalog;

/// A concrete unit model known to the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Unique key, conventionally "<chassis> <model>"
    pub key: String,
    pub chassis: String,
    pub model: String,
    pub unit_type: UnitType,
    #[serde(default)]
    pub weight_class: Option<WeightClass>,
    pub movement_mode: MovementMode,
    #[serde(default)]
    pub roles: BTreeSet<MissionRole>,
    #[serde(default)]
    pub omni: bool,
    #[serde(default)]
    pub clan: bool,
    #[serde(default)]
    pub star_league: bool,
    /// Chassis (or model keys) this unit is commonly fielded with
    #[serde(default)]
    pub deployed_with: Vec<String>,
    #[serde(default)]
    pub introduced: i32,
}

impl UnitRecord {
    pub fn new(
        chassis: &str,
        model: &str,
        unit_type: UnitType,
        weight_class: Option<WeightClass>,
        movement_mode: MovementMode,
    ) -> Self {
        Self {
            key: format!("{} {}", chassis, model),
            chassis: chassis.to_string(),
            model: model.to_string(),
            unit_type,
            weight_class,
            movement_mode,
            roles: BTreeSet::new(),
            omni: false,
            clan: false,
            star_league: false,
            deployed_with: Vec::new(),
            introduced: 0,
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = MissionRole>) -> Self {
        self.roles.extend(roles);
        self
    }

    pub fn with_omni(mut self, omni: bool) -> Self {
        self.omni = omni;
        self
    }

    pub fn with_clan(mut self, clan: bool) -> Self {
        self.clan = clan;
        self
    }

    pub fn with_deployed_with(mut self, chassis: &[&str]) -> Self {
        self.deployed_with = chassis.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn introduced(mut self, year: i32) -> Self {
        self.introduced = year;
        self
    }

    /// Key of the chassis record this model belongs to
    pub fn chassis_key(&self) -> String {
        ChassisRecord::key_for(&self.chassis, self.unit_type, self.omni)
    }
}

/// A chassis family grouping several models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChassisRecord {
    pub name: String,
    pub unit_type: UnitType,
    #[serde(default)]
    pub omni: bool,
    #[serde(default)]
    pub introduced: i32,
    /// Availability by faction key
    #[serde(default)]
    pub availability: BTreeMap<String, Availability>,
}

impl ChassisRecord {
    pub fn key(&self) -> String {
        Self::key_for(&self.name, self.unit_type, self.omni)
    }

    pub fn key_for(name: &str, unit_type: UnitType, omni: bool) -> String {
        if omni {
            format!("{}[{:?}]Omni", name, unit_type)
        } else {
            format!("{}[{:?}]", name, unit_type)
        }
    }
}

/// Faction metadata used for table lookups and availability fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionRecord {
    pub key: String,
    #[serde(default)]
    pub name: String,
    /// Factions consulted when this one has no availability entry
    #[serde(default)]
    pub parent_factions: Vec<String>,
    /// Rating codes from worst to best
    #[serde(default)]
    pub rating_levels: Vec<String>,
    #[serde(default)]
    pub clan: bool,
}

impl FactionRecord {
    /// Catalog rating code for a ruleset rating level
    pub fn rating_code(&self, level: usize) -> Option<&str> {
        if self.rating_levels.is_empty() {
            return None;
        }
        let idx = level.min(self.rating_levels.len() - 1);
        Some(self.rating_levels[idx].as_str())
    }
}

/// Availability of a chassis or model to a faction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub rating: i32,
    /// Positive favours better rated forces, negative favours worse
    #[serde(default)]
    pub rating_adjustment: i32,
}

impl Availability {
    pub fn new(rating: i32) -> Self {
        Self {
            rating,
            rating_adjustment: 0,
        }
    }

    /// Availability shifted by a force's rating level out of `total_levels`
    pub fn adjust_for_rating(&self, level: Option<usize>, total_levels: i32) -> i32 {
        let Some(level) = level else {
            return self.rating;
        };
        if self.rating_adjustment == 0 {
            return self.rating;
        }
        let centred = level as i32 - (total_levels - 1) / 2;
        self.rating + self.rating_adjustment.signum() * centred
    }
}

/// Parameters of a single table lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableQuery {
    pub faction: String,
    pub unit_type: Option<UnitType>,
    pub year: i32,
    pub rating: Option<String>,
    pub weight_classes: Vec<WeightClass>,
    pub network: NetworkMask,
    pub movement_modes: BTreeSet<MovementMode>,
    pub roles: BTreeSet<MissionRole>,
    /// 3 = exact role match ... 0 = roles ignored
    pub role_strictness: u8,
}

/// One weighted row of a unit table
#[derive(Debug, Clone, PartialEq)]
pub struct TableEntry {
    pub unit: UnitRecord,
    pub weight: u32,
}

/// Weighted random table returned by [`UnitCatalog::find_table`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitTable {
    entries: Vec<TableEntry>,
}

impl UnitTable {
    pub fn new(entries: Vec<TableEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    /// Roll a unit, optionally restricted to entries passing `filter`
    pub fn generate_unit(
        &self,
        rng: &mut ChaCha8Rng,
        filter: Option<&dyn Fn(&UnitRecord) -> bool>,
    ) -> Option<&UnitRecord> {
        let candidates: Vec<&TableEntry> = self
            .entries
            .iter()
            .filter(|e| e.weight > 0)
            .filter(|e| filter.map_or(true, |f| f(&e.unit)))
            .collect();
        candidates
            .choose_weighted(rng, |e| e.weight)
            .ok()
            .copied()
            .map(|e| &e.unit)
    }
}

/// Query interface onto the unit catalog
pub trait UnitCatalog {
    fn faction(&self, key: &str) -> Option<&FactionRecord>;

    /// Era (start year) containing `year`
    fn era_for_year(&self, year: i32) -> i32;

    fn find_table(&self, query: &TableQuery) -> UnitTable;

    fn model(&self, key: &str) -> Option<&UnitRecord>;

    fn chassis(&self, key: &str) -> Option<&ChassisRecord>;

    fn chassis_availability(
        &self,
        era: i32,
        chassis_key: &str,
        faction: &str,
        year: i32,
    ) -> Option<Availability>;

    fn model_availability(&self, era: i32, model_key: &str, faction: &str) -> Option<Availability>;
}
