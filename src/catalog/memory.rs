//! In-memory unit catalog
//!
//! A small TOML-backed catalog used by the runner and the test suite. It
//! answers the same queries a full availability database would, with a much
//! simpler model: one availability number per faction and no per-era data.

use ahash::AHashMap;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::{
    Availability, ChassisRecord, FactionRecord, TableEntry, TableQuery, UnitCatalog, UnitRecord,
    UnitTable,
};
use crate::core::error::Result;
use crate::core::types::{MissionRole, MovementMode, UnitType, WeightClass};

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    eras: Vec<i32>,
    factions: AHashMap<String, FactionRecord>,
    models: Vec<UnitRecord>,
    model_index: AHashMap<String, usize>,
    chassis: AHashMap<String, ChassisRecord>,
    model_availability: AHashMap<(String, String), i32>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_eras(mut self, eras: &[i32]) -> Self {
        self.eras = eras.to_vec();
        self.eras.sort_unstable();
        self
    }

    pub fn with_faction(mut self, faction: FactionRecord) -> Self {
        self.add_faction(faction);
        self
    }

    /// Add a model available to each listed faction at the given rating
    pub fn with_model(mut self, unit: UnitRecord, availability: &[(&str, i32)]) -> Self {
        self.add_model(unit, availability.iter().map(|(f, a)| (f.to_string(), *a)));
        self
    }

    pub fn with_chassis(mut self, chassis: ChassisRecord) -> Self {
        self.chassis.insert(chassis.key(), chassis);
        self
    }

    pub fn add_faction(&mut self, faction: FactionRecord) {
        self.factions.insert(faction.key.clone(), faction);
    }

    pub fn add_model(&mut self, unit: UnitRecord, availability: impl IntoIterator<Item = (String, i32)>) {
        let chassis_key = unit.chassis_key();
        self.chassis.entry(chassis_key).or_insert_with(|| ChassisRecord {
            name: unit.chassis.clone(),
            unit_type: unit.unit_type,
            omni: unit.omni,
            introduced: unit.introduced,
            availability: BTreeMap::new(),
        });
        for (faction, rating) in availability {
            self.model_availability.insert((unit.key.clone(), faction), rating);
        }
        if let Some(&idx) = self.model_index.get(&unit.key) {
            self.models[idx] = unit;
        } else {
            self.model_index.insert(unit.key.clone(), self.models.len());
            self.models.push(unit);
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The faction followed by its parent factions, nearest first
    fn faction_chain<'a>(&'a self, faction: &'a str) -> Vec<&'a str> {
        let mut chain = vec![faction];
        if let Some(rec) = self.factions.get(faction) {
            chain.extend(rec.parent_factions.iter().map(String::as_str));
        }
        chain
    }

    fn table_weight(&self, unit: &UnitRecord, faction: &str) -> Option<u32> {
        self.faction_chain(faction)
            .into_iter()
            .find_map(|f| self.model_availability.get(&(unit.key.clone(), f.to_string())))
            .map(|&a| a.max(0) as u32)
    }

    /// Load a catalog from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse a catalog from TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let data: TomlCatalog = toml::from_str(content)?;

        let mut catalog = Self::new().with_eras(&data.eras);
        for faction in data.faction {
            catalog.add_faction(faction);
        }
        for chassis in data.chassis {
            catalog.chassis.insert(chassis.key(), chassis);
        }
        for model in data.model {
            let availability: Vec<(String, i32)> = model.availability.clone().into_iter().collect();
            catalog.add_model(model.into_record(), availability);
        }
        Ok(catalog)
    }
}

fn roles_match(requested: &BTreeSet<MissionRole>, unit: &UnitRecord, strictness: u8) -> bool {
    match strictness {
        3 => requested.is_subset(&unit.roles),
        2 => requested.is_empty() || !requested.is_disjoint(&unit.roles),
        _ => true,
    }
}

impl UnitCatalog for InMemoryCatalog {
    fn faction(&self, key: &str) -> Option<&FactionRecord> {
        self.factions.get(key)
    }

    fn era_for_year(&self, year: i32) -> i32 {
        self.eras
            .iter()
            .rev()
            .find(|&&e| e <= year)
            .copied()
            .unwrap_or(year)
    }

    fn find_table(&self, query: &TableQuery) -> UnitTable {
        let entries = self
            .models
            .iter()
            .filter(|u| query.unit_type.map_or(true, |ut| ut == u.unit_type))
            .filter(|u| u.introduced <= query.year)
            .filter(|u| {
                query.weight_classes.is_empty()
                    || u.weight_class.map_or(false, |wc| query.weight_classes.contains(&wc))
            })
            .filter(|u| query.movement_modes.is_empty() || query.movement_modes.contains(&u.movement_mode))
            .filter(|u| roles_match(&query.roles, u, query.role_strictness))
            .filter_map(|u| {
                let mut weight = self.table_weight(u, &query.faction)?;
                if query.role_strictness == 1 && !query.roles.is_disjoint(&u.roles) {
                    weight *= 2;
                }
                Some(TableEntry { unit: u.clone(), weight })
            })
            .collect();
        UnitTable::new(entries)
    }

    fn model(&self, key: &str) -> Option<&UnitRecord> {
        self.model_index.get(key).map(|&i| &self.models[i])
    }

    fn chassis(&self, key: &str) -> Option<&ChassisRecord> {
        self.chassis.get(key)
    }

    fn chassis_availability(
        &self,
        _era: i32,
        chassis_key: &str,
        faction: &str,
        year: i32,
    ) -> Option<Availability> {
        let chassis = self.chassis.get(chassis_key)?;
        if chassis.introduced > year {
            return None;
        }
        chassis.availability.get(faction).copied()
    }

    fn model_availability(&self, _era: i32, model_key: &str, faction: &str) -> Option<Availability> {
        self.model_availability
            .get(&(model_key.to_string(), faction.to_string()))
            .map(|&a| Availability::new(a))
    }
}

/// TOML representation of a catalog file
#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    eras: Vec<i32>,
    #[serde(default)]
    faction: Vec<FactionRecord>,
    #[serde(default)]
    chassis: Vec<ChassisRecord>,
    #[serde(default)]
    model: Vec<TomlModel>,
}

/// TOML representation of a single model
#[derive(Debug, Deserialize)]
struct TomlModel {
    chassis: String,
    model: String,
    unit_type: UnitType,
    #[serde(default)]
    weight_class: Option<WeightClass>,
    movement_mode: MovementMode,
    #[serde(default)]
    roles: BTreeSet<MissionRole>,
    #[serde(default)]
    omni: bool,
    #[serde(default)]
    clan: bool,
    #[serde(default)]
    star_league: bool,
    #[serde(default)]
    deployed_with: Vec<String>,
    #[serde(default)]
    introduced: i32,
    #[serde(default)]
    availability: BTreeMap<String, i32>,
}

impl TomlModel {
    fn into_record(self) -> UnitRecord {
        UnitRecord {
            key: format!("{} {}", self.chassis, self.model),
            chassis: self.chassis,
            model: self.model,
            unit_type: self.unit_type,
            weight_class: self.weight_class,
            movement_mode: self.movement_mode,
            roles: self.roles,
            omni: self.omni,
            clan: self.clan,
            star_league: self.star_league,
            deployed_with: self.deployed_with,
            introduced: self.introduced,
        }
    }
}
