//! Single-unit search
//!
//! Looks up one unit for a set of constraints, relaxing them step by step
//! when the catalog has nothing that fits:
//!
//! 1. role strictness, from exact (3) down to ignored (0)
//! 2. the role filter itself, then the movement-mode filter
//! 3. the weight class, following [`WeightClass::alternate`]
//!
//! The first unit found is returned.

use std::collections::BTreeSet;

use super::ForceGenerator;
use crate::catalog::{TableQuery, UnitRecord};
use crate::core::error::GenerationFailure;
use crate::core::types::{MissionRole, MovementMode, NetworkMask, NodeId, UnitType, WeightClass};
use crate::force::{ForceNode, ForceTree};
use crate::ruleset;

/// Last ladder step, exclusive
const LADDER_END: usize = 5;

/// Working copy of a node's constraints for one search
///
/// Searches never write back into the node, so callers can narrow a copy
/// (pin a chassis, drop the weight class) without touching the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub faction: String,
    pub unit_type: Option<UnitType>,
    pub year: i32,
    pub rating_level: Option<usize>,
    pub weight_class: Option<WeightClass>,
    pub use_weight_class: bool,
    pub movement_modes: BTreeSet<MovementMode>,
    pub roles: BTreeSet<MissionRole>,
    pub chassis: BTreeSet<String>,
    pub models: BTreeSet<String>,
    pub variants: BTreeSet<String>,
}

impl SearchCriteria {
    pub fn from_node(node: &ForceNode, rating_level: Option<usize>) -> Self {
        Self {
            faction: node.faction.clone(),
            unit_type: node.unit_type,
            year: node.year,
            rating_level,
            weight_class: node.weight_class,
            use_weight_class: node.use_weight_class(),
            movement_modes: node.movement_modes.clone(),
            roles: node.roles.clone(),
            chassis: node.chassis.clone(),
            models: node.models.clone(),
            variants: node.variants.clone(),
        }
    }

    /// Same constraints narrowed to one chassis, any weight
    pub fn pinned_to_chassis(&self, chassis: &str) -> Self {
        let mut criteria = self.clone();
        criteria.chassis.clear();
        criteria.chassis.insert(chassis.to_string());
        criteria.weight_class = None;
        criteria
    }

    fn primary_faction(&self) -> &str {
        self.faction.split(',').next().unwrap_or(&self.faction)
    }

    fn accepts(&self, unit: &UnitRecord, movement_modes: &BTreeSet<MovementMode>) -> bool {
        (movement_modes.is_empty() || movement_modes.contains(&unit.movement_mode))
            && (self.chassis.is_empty() || self.chassis.contains(&unit.chassis))
            && (self.variants.is_empty() || self.variants.contains(&unit.model))
            && (self.models.is_empty() || self.models.contains(&unit.key))
    }
}

impl ForceGenerator<'_> {
    /// Catalog rating code for a ruleset rating level of `faction`
    pub(crate) fn rating_code(&self, faction: &str, level: Option<usize>) -> Option<String> {
        let level = level?;
        self.catalog
            .faction(faction)
            .and_then(|f| f.rating_code(level))
            .map(str::to_string)
    }

    /// Catalog rating code for the node's own rating
    pub(crate) fn node_rating_code(&self, node: &ForceNode) -> Option<String> {
        self.rating_code(node.primary_faction(), ruleset::rating_level(self.rulesets, node))
    }

    /// Criteria for searching on behalf of `id`
    pub fn criteria_for(&self, tree: &ForceTree, id: NodeId) -> SearchCriteria {
        let node = tree.node(id);
        SearchCriteria::from_node(node, ruleset::rating_level(self.rulesets, node))
    }

    /// Find one unit satisfying `criteria`, relaxing constraints as needed
    pub fn search(&mut self, criteria: &SearchCriteria) -> Result<UnitRecord, GenerationFailure> {
        let rating = self.rating_code(criteria.primary_faction(), criteria.rating_level);

        let use_weight = criteria.use_weight_class;
        let mut roles: BTreeSet<MissionRole> = criteria
            .roles
            .iter()
            .copied()
            .filter(|r| r.fits_unit_type(criteria.unit_type))
            .collect();
        let mut movement_modes = criteria.movement_modes.clone();
        let mut weight = criteria.weight_class;
        let mut step = if use_weight && weight.is_some() { 0 } else { 4 };
        let mut failure = GenerationFailure::NoUnitFound {
            unit_type: criteria.unit_type,
        };

        while step < LADDER_END {
            for strictness in (0..=3u8).rev() {
                let query = TableQuery {
                    faction: criteria.faction.clone(),
                    unit_type: criteria.unit_type,
                    year: criteria.year,
                    rating: rating.clone(),
                    weight_classes: weight.filter(|_| use_weight).into_iter().collect(),
                    network: NetworkMask::NONE,
                    movement_modes: movement_modes.clone(),
                    roles: roles.clone(),
                    role_strictness: strictness,
                };
                tracing::trace!(?query, "Unit table query");

                let table = self.catalog.find_table(&query);
                let filter = |u: &UnitRecord| criteria.accepts(u, &movement_modes);
                let picked = table
                    .generate_unit(&mut self.rng, Some(&filter))
                    .map(|u| u.key.clone());
                if let Some(key) = picked {
                    match self.catalog.model(&key) {
                        Some(unit) => return Ok(unit.clone()),
                        None => {
                            tracing::debug!(model = %key, "Table returned a model the catalog does not know");
                            failure = GenerationFailure::UnknownModel(key);
                        }
                    }
                }

                if (!use_weight || step == 2) && !roles.is_empty() {
                    tracing::debug!(step, "Dropping role filter");
                    roles.clear();
                } else if (!use_weight || step == 1) && !movement_modes.is_empty() {
                    tracing::debug!(step, "Dropping movement mode filter");
                    movement_modes.clear();
                } else {
                    if use_weight {
                        if let Some(alt) = criteria.weight_class.and_then(|wc| wc.alternate(step)) {
                            tracing::debug!(step, weight_class = %alt, "Trying alternate weight class");
                            weight = Some(alt);
                        }
                    }
                    step += 1;
                }
            }
        }

        tracing::warn!(
            faction = %criteria.faction,
            unit_type = ?criteria.unit_type,
            year = criteria.year,
            "Could not find a unit"
        );
        Err(failure)
    }
}
