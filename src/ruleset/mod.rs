//! Faction rulesets: command slots, echelon names and rating scales
//!
//! Rulesets form a chain through [`Ruleset::parent`]. Lookups that a
//! faction's own ruleset cannot answer fall through to its parents.

pub mod table;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::types::UnitType;
use crate::force::ForceNode;

pub use table::{EchelonRule, RulesetLibrary, TableRuleset};

/// Unit type a command slot prefers its holder to have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SlotUnitType {
    Exact(UnitType),
    /// Any type other than the commander's own
    Other,
}

impl SlotUnitType {
    /// Whether a subforce of `candidate` type satisfies this preference
    pub fn accepts(self, candidate: UnitType, commander_type: Option<UnitType>) -> bool {
        match self {
            SlotUnitType::Exact(ut) => ut == candidate,
            SlotUnitType::Other => commander_type != Some(candidate),
        }
    }
}

impl FromStr for SlotUnitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("other") {
            Ok(SlotUnitType::Other)
        } else {
            s.parse::<UnitType>().map(SlotUnitType::Exact)
        }
    }
}

impl TryFrom<String> for SlotUnitType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SlotUnitType> for String {
    fn from(slot: SlotUnitType) -> String {
        slot.to_string()
    }
}

impl fmt::Display for SlotUnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotUnitType::Exact(ut) => write!(f, "{:?}", ut),
            SlotUnitType::Other => f.write_str("other"),
        }
    }
}

/// Commanding or executive officer slot of an echelon
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandSlot {
    #[serde(default)]
    pub rank: Option<i32>,
    #[serde(default)]
    pub title: Option<String>,
    /// Subforce index the holder is drawn from. `None` uses the default.
    #[serde(default)]
    pub position: Option<usize>,
    #[serde(default)]
    pub unit_type: Option<SlotUnitType>,
}

pub trait Ruleset {
    /// Faction key this ruleset belongs to
    fn faction(&self) -> &str;

    /// Faction key of the ruleset consulted when this one has no answer
    fn parent(&self) -> Option<&str>;

    fn commander_slot(&self, node: &ForceNode) -> Option<&CommandSlot>;

    fn xo_slot(&self, node: &ForceNode) -> Option<&CommandSlot>;

    fn echelon_name(&self, node: &ForceNode) -> Option<String>;

    /// Position of a rating code on this ruleset's scale, worst first
    fn rating_index(&self, rating: &str) -> Option<usize>;
}

pub trait RulesetProvider {
    fn find_ruleset(&self, faction: &str) -> Option<&dyn Ruleset>;
}

/// The node's ruleset followed by its parents, nearest first
///
/// A chain that names a missing ruleset or loops back on itself is cut
/// short at that point.
pub fn ruleset_chain<'a>(provider: &'a dyn RulesetProvider, node: &ForceNode) -> Vec<&'a dyn Ruleset> {
    let mut chain: Vec<&'a dyn Ruleset> = Vec::new();
    let mut next = provider.find_ruleset(node.primary_faction());
    if next.is_none() {
        tracing::debug!(faction = %node.faction, "No ruleset for faction");
    }
    while let Some(rules) = next {
        if chain.iter().any(|r| r.faction() == rules.faction()) {
            tracing::warn!(faction = rules.faction(), "Ruleset chain loops back on itself");
            break;
        }
        chain.push(rules);
        next = match rules.parent() {
            Some(parent) => {
                let found = provider.find_ruleset(parent);
                if found.is_none() {
                    tracing::warn!(
                        faction = rules.faction(),
                        parent_faction = parent,
                        "Parent ruleset not found"
                    );
                }
                found
            }
            None => None,
        };
    }
    chain
}

/// Echelon name from the nearest ruleset that defines one
pub fn echelon_name(provider: &dyn RulesetProvider, node: &ForceNode) -> Option<String> {
    ruleset_chain(provider, node)
        .into_iter()
        .find_map(|r| r.echelon_name(node))
}

/// Rating level of the node, or `None` when unrated
pub fn rating_level(provider: &dyn RulesetProvider, node: &ForceNode) -> Option<usize> {
    let rating = node.rating.as_deref()?;
    ruleset_chain(provider, node)
        .into_iter()
        .find_map(|r| r.rating_index(rating))
}

/// Command slots from the nearest ruleset defining a commander for the node
pub fn command_slots<'a>(
    provider: &'a dyn RulesetProvider,
    node: &ForceNode,
) -> Option<(&'a CommandSlot, Option<&'a CommandSlot>)> {
    ruleset_chain(provider, node)
        .into_iter()
        .find_map(|r| r.commander_slot(node).map(|co| (co, r.xo_slot(node))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_unit_type_parse() {
        assert_eq!("other".parse::<SlotUnitType>(), Ok(SlotUnitType::Other));
        assert_eq!("Mek".parse::<SlotUnitType>(), Ok(SlotUnitType::Exact(UnitType::Mek)));
        assert!("Zeppelin".parse::<SlotUnitType>().is_err());
    }

    #[test]
    fn test_slot_unit_type_accepts() {
        let other = SlotUnitType::Other;
        assert!(other.accepts(UnitType::Tank, Some(UnitType::Mek)));
        assert!(!other.accepts(UnitType::Mek, Some(UnitType::Mek)));
        assert!(SlotUnitType::Exact(UnitType::Mek).accepts(UnitType::Mek, None));
    }
}
