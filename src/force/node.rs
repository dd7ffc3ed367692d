//! Force node: one level of an order of battle
//!
//! A node carries the constraints used to generate it and, once generated,
//! the unit it resolved to. Nodes live in a [`ForceTree`](super::ForceTree)
//! arena and refer to each other by [`NodeId`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::UnitRecord;
use crate::core::error::GenerationFailure;
use crate::core::types::{
    Experience, ForceFlag, ForceFlags, GenerationRule, MissionRole, MovementMode, NodeId,
    OfficerId, SizeMod, UnitType, WeightClass,
};
use crate::formation::FormationType;

pub const DEFAULT_FACTION: &str = "IS";
pub const DEFAULT_YEAR: i32 = 3067;

/// Commanding or executive officer of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Officer {
    pub rank: Option<i32>,
    pub title: Option<String>,
    /// Node the officer was created for (the one they personally command)
    pub assignment: NodeId,
    pub gunnery: u8,
    pub piloting: u8,
}

impl Officer {
    /// Officer without rank or title, skilled according to the node's experience
    pub fn for_node(assignment: NodeId, experience: Experience) -> Self {
        let (gunnery, piloting) = experience.base_skills();
        Self {
            rank: None,
            title: None,
            assignment,
            gunnery,
            piloting,
        }
    }

    pub fn skill_total(&self) -> i32 {
        self.gunnery as i32 + self.piloting as i32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceNode {
    // Identity
    pub index: usize,
    pub name: Option<String>,
    pub position_index: Option<usize>,
    pub name_index: Option<usize>,

    // Classification
    pub faction: String,
    pub year: i32,
    pub echelon: Option<u8>,
    pub unit_type: Option<UnitType>,
    pub weight_class: Option<WeightClass>,
    pub movement_modes: BTreeSet<MovementMode>,
    pub roles: BTreeSet<MissionRole>,
    pub rating: Option<String>,
    pub experience: Experience,
    pub rank_system: Option<i32>,

    // Narrowing filters
    pub models: BTreeSet<String>,
    pub chassis: BTreeSet<String>,
    pub variants: BTreeSet<String>,

    // Structure
    pub augmented: bool,
    pub size_mod: SizeMod,
    pub flags: ForceFlags,
    pub formation_type: Option<FormationType>,
    pub generation_rule: Option<GenerationRule>,
    pub top_level: bool,
    pub element: bool,

    // Result
    pub unit: Option<UnitRecord>,
    pub failure: Option<GenerationFailure>,

    // Leadership
    pub commander: Option<OfficerId>,
    pub executive_officer: Option<OfficerId>,

    // Relationships (maintained by ForceTree)
    pub(crate) parent: Option<NodeId>,
    pub(crate) is_attachment: bool,
    pub(crate) subforces: Vec<NodeId>,
    pub(crate) attached: Vec<NodeId>,
}

impl Default for ForceNode {
    fn default() -> Self {
        Self {
            index: 0,
            name: None,
            position_index: None,
            name_index: None,
            faction: DEFAULT_FACTION.to_string(),
            year: DEFAULT_YEAR,
            echelon: None,
            unit_type: None,
            weight_class: None,
            movement_modes: BTreeSet::new(),
            roles: BTreeSet::new(),
            rating: None,
            experience: Experience::Regular,
            rank_system: None,
            models: BTreeSet::new(),
            chassis: BTreeSet::new(),
            variants: BTreeSet::new(),
            augmented: false,
            size_mod: SizeMod::Standard,
            flags: ForceFlags::new(),
            formation_type: None,
            generation_rule: None,
            top_level: false,
            element: false,
            unit: None,
            failure: None,
            commander: None,
            executive_officer: None,
            parent: None,
            is_attachment: false,
            subforces: Vec::new(),
            attached: Vec::new(),
        }
    }
}

impl ForceNode {
    pub fn new(faction: &str, year: i32) -> Self {
        Self {
            faction: faction.to_string(),
            year,
            ..Self::default()
        }
    }

    /// A single-unit leaf
    pub fn element(faction: &str, year: i32, unit_type: UnitType) -> Self {
        Self {
            unit_type: Some(unit_type),
            element: true,
            echelon: Some(crate::core::types::ECHELON_ELEMENT),
            ..Self::new(faction, year)
        }
    }

    pub fn with_unit_type(mut self, unit_type: UnitType) -> Self {
        self.unit_type = Some(unit_type);
        self
    }

    pub fn with_weight_class(mut self, weight_class: WeightClass) -> Self {
        self.weight_class = Some(weight_class);
        self
    }

    pub fn with_echelon(mut self, echelon: u8) -> Self {
        self.echelon = Some(echelon);
        self
    }

    pub fn with_rating(mut self, rating: &str) -> Self {
        self.rating = Some(rating.to_string());
        self
    }

    pub fn with_role(mut self, role: MissionRole) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_formation(mut self, formation: FormationType) -> Self {
        self.formation_type = Some(formation);
        self
    }

    pub fn with_generation_rule(mut self, rule: GenerationRule) -> Self {
        self.generation_rule = Some(rule);
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn subforces(&self) -> &[NodeId] {
        &self.subforces
    }

    pub fn attached(&self) -> &[NodeId] {
        &self.attached
    }

    pub fn is_attachment(&self) -> bool {
        self.is_attachment
    }

    /// Faction used for ruleset and availability lookups
    pub fn primary_faction(&self) -> &str {
        self.faction.split(',').next().unwrap_or(&self.faction)
    }

    pub fn use_weight_class(&self) -> bool {
        self.use_weight_class_for(self.unit_type)
    }

    /// Weight class matters for `unit_type` given this node's roles
    pub fn use_weight_class_for(&self, unit_type: Option<UnitType>) -> bool {
        let Some(ut) = unit_type else {
            return false;
        };
        !self.roles.iter().any(|r| r.is_artillery()) && ut.has_weight_class()
    }

    pub fn is_omni(&self) -> bool {
        self.flags.contains(ForceFlag::Omni)
    }

    pub fn is_resolved(&self) -> bool {
        self.unit.is_some()
    }

    pub fn weight_class_code(&self) -> &'static str {
        self.weight_class.map_or("", |wc| wc.code())
    }

    /// Echelon code, suffixed with `*` when augmented
    pub fn echelon_code(&self) -> String {
        let mut code = self.echelon.map(|e| e.to_string()).unwrap_or_default();
        if self.augmented {
            code.push('*');
        }
        code
    }

    /// Key of the resolved model, or empty when unresolved
    pub fn model_name(&self) -> &str {
        self.unit.as_ref().map_or("", |u| u.key.as_str())
    }

    /// Store a generated unit and copy its derived attributes onto the node
    pub fn set_unit(&mut self, unit: UnitRecord) {
        if self.use_weight_class() {
            self.weight_class = unit.weight_class;
        }
        self.element = true;
        self.movement_modes.clear();
        self.movement_modes.insert(unit.movement_mode);
        if self.unit_type.map_or(false, |ut| ut.is_omni_capable()) && unit.omni {
            self.flags.insert(ForceFlag::Omni);
        }
        for role in [
            MissionRole::Artillery,
            MissionRole::MissileArtillery,
            MissionRole::AntiMek,
            MissionRole::FieldGun,
        ] {
            if unit.roles.contains(&role) {
                self.roles.insert(role);
            }
        }
        self.failure = None;
        self.unit = Some(unit);
    }

    /// Whether a catalog unit passes this node's narrowing filters
    pub fn matches(&self, unit: &UnitRecord) -> bool {
        (self.chassis.is_empty() || self.chassis.contains(&unit.chassis))
            && (self.variants.is_empty() || self.variants.contains(&unit.model))
            && (self.models.is_empty() || self.models.contains(&unit.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_class_ignored_for_artillery() {
        let node = ForceNode::new("FS", 3025).with_unit_type(UnitType::Tank);
        assert!(node.use_weight_class());

        let arty = node.clone().with_role(MissionRole::Artillery);
        assert!(!arty.use_weight_class());

        let inf = ForceNode::new("FS", 3025).with_unit_type(UnitType::Infantry);
        assert!(!inf.use_weight_class());
    }

    #[test]
    fn test_set_unit_copies_derived_fields() {
        let mut node = ForceNode::element("CW", 3060, UnitType::Mek);
        node.movement_modes.insert(MovementMode::Quad);
        let unit = UnitRecord::new("Mad Cat", "Prime", UnitType::Mek, Some(WeightClass::Heavy), MovementMode::Biped)
            .with_omni(true)
            .with_roles([MissionRole::FireSupport, MissionRole::AntiMek]);
        node.set_unit(unit);

        assert!(node.is_resolved());
        assert_eq!(node.weight_class, Some(WeightClass::Heavy));
        assert_eq!(node.movement_modes.len(), 1);
        assert!(node.movement_modes.contains(&MovementMode::Biped));
        assert!(node.is_omni());
        assert!(node.roles.contains(&MissionRole::AntiMek));
        assert!(!node.roles.contains(&MissionRole::FireSupport));
        assert_eq!(node.model_name(), "Mad Cat Prime");
    }

    #[test]
    fn test_primary_faction_and_echelon_code() {
        let mut node = ForceNode::new("FS,DC", 3025).with_echelon(4);
        node.augmented = true;
        assert_eq!(node.primary_faction(), "FS");
        assert_eq!(node.echelon_code(), "4*");
    }
}
