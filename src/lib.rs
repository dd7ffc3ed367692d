//! Orbat - Order of Battle Force Generator

pub mod catalog;
pub mod command;
pub mod core;
pub mod force;
pub mod formation;
pub mod generation;
pub mod ruleset;

pub use crate::catalog::{InMemoryCatalog, UnitCatalog, UnitRecord};
pub use crate::core::{GenerationConfig, GenerationFailure, OrbatError, Result};
pub use crate::force::{ForceNode, ForceTree};
pub use crate::formation::{FormationBuilder, FormationType, TableFormationBuilder};
pub use crate::generation::{ForceGenerator, GenerationPlan};
pub use crate::ruleset::{RulesetLibrary, RulesetProvider, TableRuleset};
