//! Force generation engine
//!
//! [`ForceGenerator`] walks a [`ForceTree`] depth first and fills every leaf
//! with a unit from the catalog. How each internal node hands work to its
//! children is decided once per node as a [`GenerationPlan`].
//!
//! Generation never fails as a whole. A leaf that cannot be filled keeps
//! `unit = None` and records a [`GenerationFailure`](crate::core::GenerationFailure).

pub mod group;
pub mod search;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::catalog::UnitCatalog;
use crate::command::assign_commanders;
use crate::core::config::GenerationConfig;
use crate::core::types::{GenerationRule, NodeId};
use crate::force::{assign_positions, ForceTree};
use crate::formation::FormationBuilder;
use crate::ruleset::RulesetProvider;

pub use search::SearchCriteria;

/// How a node delegates generation to its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationPlan {
    /// Single unit for the node itself
    Leaf,
    /// Formation over the direct subforces
    FormationOverSubforces,
    /// Formation over the members of every `group`-ruled child, one group per child
    CompoundGroups { groups: Vec<NodeId> },
    /// Formation over the `model`/`chassis`-ruled children, which then generate their own subforces
    CompoundRepresentatives {
        rule: GenerationRule,
        children: Vec<NodeId>,
    },
    /// One unit fixes the model or chassis for the whole subtree
    RepresentativeUnit(GenerationRule),
    /// Cohesive group over the subforces
    Group,
    /// Each subforce generates independently
    Unconstrained,
}

impl GenerationPlan {
    pub fn for_node(tree: &ForceTree, id: NodeId) -> Self {
        let node = tree.node(id);
        if node.element {
            return GenerationPlan::Leaf;
        }

        if node.formation_type.is_some() {
            if node.generation_rule == Some(GenerationRule::Group) {
                return GenerationPlan::FormationOverSubforces;
            }
            let ruled = |rule: GenerationRule| -> Vec<NodeId> {
                node.subforces()
                    .iter()
                    .copied()
                    .filter(|&s| tree.node(s).generation_rule == Some(rule))
                    .collect()
            };
            let groups = ruled(GenerationRule::Group);
            if !groups.is_empty() {
                return GenerationPlan::CompoundGroups { groups };
            }
            for rule in [GenerationRule::Model, GenerationRule::Chassis] {
                let children = ruled(rule);
                if !children.is_empty() {
                    return GenerationPlan::CompoundRepresentatives { rule, children };
                }
            }
            return GenerationPlan::FormationOverSubforces;
        }

        match node.generation_rule {
            Some(GenerationRule::Group) => GenerationPlan::Group,
            Some(rule) => GenerationPlan::RepresentativeUnit(rule),
            None => GenerationPlan::Unconstrained,
        }
    }
}

/// Generates forces against a catalog, formation builder and rulesets
pub struct ForceGenerator<'a> {
    pub(crate) catalog: &'a dyn UnitCatalog,
    pub(crate) formations: &'a dyn FormationBuilder,
    pub(crate) rulesets: &'a dyn RulesetProvider,
    pub(crate) config: GenerationConfig,
    pub(crate) rng: ChaCha8Rng,
}

impl<'a> ForceGenerator<'a> {
    pub fn new(
        catalog: &'a dyn UnitCatalog,
        formations: &'a dyn FormationBuilder,
        rulesets: &'a dyn RulesetProvider,
        config: GenerationConfig,
    ) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            catalog,
            formations,
            rulesets,
            config,
            rng,
        }
    }

    /// Replace the random source
    pub fn with_rng(mut self, rng: ChaCha8Rng) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate, staff and index the force rooted at `root`
    pub fn build(&mut self, tree: &mut ForceTree, root: NodeId) {
        self.generate_units(tree, root);
        assign_commanders(tree, root, self.rulesets);
        assign_positions(tree, root);
    }

    /// Fill every leaf below `id` with a unit
    pub fn generate_units(&mut self, tree: &mut ForceTree, id: NodeId) {
        self.inherit_narrowing(tree, id);

        let plan = GenerationPlan::for_node(tree, id);
        tracing::trace!(node = id.0, ?plan, "Generating node");
        match plan {
            GenerationPlan::Leaf => self.resolve_leaf(tree, id),
            GenerationPlan::FormationOverSubforces => {
                let subforces = tree.node(id).subforces.clone();
                if self.generate_and_assign_formation(tree, id, &subforces, false, 0) {
                    self.generate_pending(tree, &subforces);
                } else {
                    self.abandon_formation(tree, id);
                    let pending = self.pending(tree, &subforces);
                    self.generate_lance(tree, id, &pending);
                    self.generate_pending(tree, &subforces);
                }
            }
            GenerationPlan::CompoundGroups { groups } => {
                let mut members = Vec::new();
                for &group in &groups {
                    self.inherit_narrowing(tree, group);
                    members.extend(tree.node(group).subforces.iter().copied());
                }
                for &member in &members {
                    self.inherit_narrowing(tree, member);
                }
                let subforces = tree.node(id).subforces.clone();
                if self.generate_and_assign_formation(tree, id, &members, false, groups.len()) {
                    // Members that took a filter instead of a unit still need their own subtree
                    for &group in &groups {
                        let group_subs = tree.node(group).subforces.clone();
                        self.generate_pending(tree, &group_subs);
                        let attached = tree.node(group).attached.clone();
                        for sub in attached {
                            self.generate_units(tree, sub);
                        }
                    }
                    let rest: Vec<NodeId> = subforces.into_iter().filter(|s| !groups.contains(s)).collect();
                    self.generate_pending(tree, &rest);
                } else {
                    self.abandon_formation(tree, id);
                    self.generate_pending(tree, &subforces);
                }
            }
            GenerationPlan::CompoundRepresentatives { rule, children } => {
                for &child in &children {
                    self.inherit_narrowing(tree, child);
                }
                let by_chassis = rule == GenerationRule::Chassis;
                if !self.generate_and_assign_formation(tree, id, &children, by_chassis, 0) {
                    self.abandon_formation(tree, id);
                }
                let subforces = tree.node(id).subforces.clone();
                self.generate_pending(tree, &subforces);
            }
            GenerationPlan::RepresentativeUnit(rule) => {
                let criteria = self.criteria_for(tree, id);
                match self.search(&criteria) {
                    Ok(unit) => {
                        let node = tree.node_mut(id);
                        match rule {
                            GenerationRule::Chassis => node.chassis.insert(unit.chassis),
                            _ => node.models.insert(unit.key),
                        };
                    }
                    Err(failure) => {
                        tracing::debug!(node = id.0, %failure, "No representative unit, children generate unconstrained");
                    }
                }
                let subforces = tree.node(id).subforces.clone();
                for sub in subforces {
                    self.generate_units(tree, sub);
                }
            }
            GenerationPlan::Group => {
                let subforces = tree.node(id).subforces.clone();
                self.generate_lance(tree, id, &subforces);
                self.generate_pending(tree, &subforces);
            }
            GenerationPlan::Unconstrained => {
                let subforces = tree.node(id).subforces.clone();
                for sub in subforces {
                    self.generate_units(tree, sub);
                }
            }
        }

        let attached = tree.node(id).attached.clone();
        for sub in attached {
            self.generate_units(tree, sub);
        }
    }

    /// Merge the parent's chassis and model narrowing into a subforce
    pub(crate) fn inherit_narrowing(&self, tree: &mut ForceTree, id: NodeId) {
        let node = tree.node(id);
        if node.is_attachment {
            return;
        }
        let Some(parent) = node.parent else {
            return;
        };
        let (chassis, models) = {
            let p = tree.node(parent);
            (p.chassis.clone(), p.models.clone())
        };
        let node = tree.node_mut(id);
        node.chassis.extend(chassis);
        node.models.extend(models);
    }

    /// Recurse into subforces that have not been generated yet
    ///
    /// Leaves already filled (or given up on) by a group or formation are
    /// skipped, as are internal nodes a group resolved to a single unit.
    fn generate_pending(&mut self, tree: &mut ForceTree, subs: &[NodeId]) {
        for sub in self.pending(tree, subs) {
            self.generate_units(tree, sub);
        }
    }

    fn pending(&self, tree: &ForceTree, subs: &[NodeId]) -> Vec<NodeId> {
        subs.iter()
            .copied()
            .filter(|&s| {
                let node = tree.node(s);
                node.unit.is_none() && node.failure.is_none()
            })
            .collect()
    }

    fn abandon_formation(&self, tree: &mut ForceTree, id: NodeId) {
        let node = tree.node_mut(id);
        if let Some(formation) = node.formation_type.take() {
            tracing::warn!(
                node = id.0,
                formation = %formation.name,
                "Formation could not be built, falling back"
            );
        }
    }

    /// Single-unit search for a leaf, recording the result on the node
    pub(crate) fn resolve_leaf(&mut self, tree: &mut ForceTree, id: NodeId) {
        let criteria = self.criteria_for(tree, id);
        match self.search(&criteria) {
            Ok(unit) => tree.node_mut(id).set_unit(unit),
            Err(failure) => tree.node_mut(id).failure = Some(failure),
        }
    }
}
