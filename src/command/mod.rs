//! Chain of command
//!
//! Picks commanding and executive officers for every node from the faction
//! rulesets and rolls subforce attributes up into their parents.

pub mod assign;

pub use assign::{assign_commanders, rank_score};
