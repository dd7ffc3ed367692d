//! TOML-defined rulesets
//!
//! One file per faction:
//!
//! ```toml
//! faction = "FS"
//! parent = "IS"
//! ratings = ["F", "D", "C", "B", "A"]
//!
//! [[echelon]]
//! echelon = 3
//! name = "Lance"
//! commander = { rank = 31, title = "Lieutenant" }
//! ```

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{CommandSlot, Ruleset, RulesetProvider};
use crate::core::error::Result;
use crate::core::types::UnitType;
use crate::force::ForceNode;

/// Rules for one echelon, optionally restricted to a unit type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchelonRule {
    pub echelon: u8,
    #[serde(default)]
    pub unit_type: Option<UnitType>,
    /// Only applies to augmented (or only to plain) forces when set
    #[serde(default)]
    pub augmented: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub commander: Option<CommandSlot>,
    #[serde(default)]
    pub xo: Option<CommandSlot>,
}

impl EchelonRule {
    pub fn new(echelon: u8, name: &str) -> Self {
        Self {
            echelon,
            unit_type: None,
            augmented: None,
            name: Some(name.to_string()),
            commander: None,
            xo: None,
        }
    }

    pub fn for_unit_type(mut self, unit_type: UnitType) -> Self {
        self.unit_type = Some(unit_type);
        self
    }

    pub fn with_commander(mut self, slot: CommandSlot) -> Self {
        self.commander = Some(slot);
        self
    }

    pub fn with_xo(mut self, slot: CommandSlot) -> Self {
        self.xo = Some(slot);
        self
    }

    fn applies_to(&self, node: &ForceNode) -> bool {
        node.echelon == Some(self.echelon)
            && self.unit_type.map_or(true, |ut| node.unit_type == Some(ut))
            && self.augmented.map_or(true, |a| a == node.augmented)
    }

    /// Higher is more specific
    fn specificity(&self) -> u8 {
        u8::from(self.unit_type.is_some()) * 2 + u8::from(self.augmented.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRuleset {
    pub faction: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Rating codes, worst first
    #[serde(default)]
    pub ratings: Vec<String>,
    #[serde(default, rename = "echelon")]
    pub echelons: Vec<EchelonRule>,
}

impl TableRuleset {
    pub fn new(faction: &str) -> Self {
        Self {
            faction: faction.to_string(),
            parent: None,
            ratings: Vec::new(),
            echelons: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn with_ratings(mut self, ratings: &[&str]) -> Self {
        self.ratings = ratings.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_echelon(mut self, rule: EchelonRule) -> Self {
        self.echelons.push(rule);
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Most specific matching rule that defines the field selected by `pick`
    fn find<'a, T>(&'a self, node: &ForceNode, pick: impl Fn(&'a EchelonRule) -> Option<T>) -> Option<T> {
        let mut candidates: Vec<&EchelonRule> =
            self.echelons.iter().filter(|r| r.applies_to(node)).collect();
        candidates.sort_by_key(|r| std::cmp::Reverse(r.specificity()));
        candidates.into_iter().find_map(pick)
    }
}

impl Ruleset for TableRuleset {
    fn faction(&self) -> &str {
        &self.faction
    }

    fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    fn commander_slot(&self, node: &ForceNode) -> Option<&CommandSlot> {
        self.find(node, |r| r.commander.as_ref())
    }

    fn xo_slot(&self, node: &ForceNode) -> Option<&CommandSlot> {
        // The XO belongs to the same rule as the commander
        self.find(node, |r| r.commander.as_ref().map(|_| r))
            .and_then(|r| r.xo.as_ref())
    }

    fn echelon_name(&self, node: &ForceNode) -> Option<String> {
        self.find(node, |r| r.name.clone())
    }

    fn rating_index(&self, rating: &str) -> Option<usize> {
        self.ratings.iter().position(|r| r == rating)
    }
}

/// Rulesets keyed by faction
#[derive(Debug, Clone, Default)]
pub struct RulesetLibrary {
    rulesets: AHashMap<String, TableRuleset>,
}

impl RulesetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ruleset(mut self, ruleset: TableRuleset) -> Self {
        self.insert(ruleset);
        self
    }

    pub fn insert(&mut self, ruleset: TableRuleset) {
        self.rulesets.insert(ruleset.faction.clone(), ruleset);
    }

    pub fn len(&self) -> usize {
        self.rulesets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rulesets.is_empty()
    }

    /// Load every `*.toml` file in a directory
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "toml"))
            .collect();
        paths.sort();

        let mut library = Self::new();
        for path in paths {
            let content = std::fs::read_to_string(&path)?;
            let ruleset = TableRuleset::from_toml_str(&content)?;
            tracing::debug!(faction = %ruleset.faction, path = %path.display(), "Loaded ruleset");
            library.insert(ruleset);
        }
        Ok(library)
    }
}

impl RulesetProvider for RulesetLibrary {
    fn find_ruleset(&self, faction: &str) -> Option<&dyn Ruleset> {
        self.rulesets.get(faction).map(|r| r as &dyn Ruleset)
    }
}
