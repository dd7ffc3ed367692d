//! Formation composition over a set of force nodes
//!
//! Nodes whose unit type the owner's formation allows are grouped by their
//! table parameters and handed to the [`FormationBuilder`](super::FormationBuilder)
//! as one batch. The resulting units are distributed back in order; every
//! node the formation does not cover is filled by group generation.

use crate::catalog::UnitRecord;
use crate::core::types::{ForceFlag, MissionRole, MovementMode, NetworkMask, NodeId, UnitType};
use crate::force::ForceTree;
use crate::generation::ForceGenerator;

use super::UnitParameters;

impl ForceGenerator<'_> {
    /// Build the owner's formation over `subs` and distribute the result
    ///
    /// Leaves receive their unit directly. Internal nodes receive the unit's
    /// model key, or its chassis when `by_chassis` is set, as a filter for
    /// their own subforces. `num_groups` overrides the builder's grouping
    /// when non-zero.
    ///
    /// Returns `false` without touching the tree when no node is eligible or
    /// the builder produced nothing. Nova formations are the exception: their
    /// infantry and battle armor are generated, and the base vehicles take
    /// their transport roles, before the base formation is built, and all of
    /// that stays in place when the base formation comes back empty.
    pub fn generate_and_assign_formation(
        &mut self,
        tree: &mut ForceTree,
        owner: NodeId,
        subs: &[NodeId],
        by_chassis: bool,
        num_groups: usize,
    ) -> bool {
        let Some(formation) = tree.node(owner).formation_type.clone() else {
            return false;
        };
        let (eligible, ineligible): (Vec<NodeId>, Vec<NodeId>) = subs.iter().partition(|&&s| {
            tree.node(s)
                .unit_type
                .map_or(false, |ut| formation.is_allowed_unit_type(ut))
        });
        if eligible.is_empty() {
            tracing::debug!(node = owner.0, formation = %formation.name, "No subforce fits the formation");
            return false;
        }

        let (targets, units) = if tree.node(owner).flags.contains(ForceFlag::Nova) {
            self.generate_nova_formation(tree, owner, &eligible, num_groups)
        } else {
            self.generate_formation(tree, owner, &eligible, num_groups)
        };
        if units.is_empty() {
            return false;
        }
        tracing::debug!(
            node = owner.0,
            formation = %formation.name,
            units = units.len(),
            slots = targets.len(),
            "Distributing formation"
        );

        let filled = units.len().min(targets.len());
        for (&target, unit) in targets.iter().zip(units) {
            let node = tree.node_mut(target);
            if node.subforces().is_empty() {
                node.set_unit(unit);
            } else if by_chassis {
                node.chassis.insert(unit.chassis);
            } else {
                node.models.insert(unit.key);
            }
        }

        self.generate_lance(tree, owner, &targets[filled..]);
        self.generate_lance(tree, owner, &ineligible);
        true
    }

    /// Group `nodes` by table parameters and ask the builder for their units
    ///
    /// Returns the nodes in the order the units are laid out: every node of
    /// the first parameter set in encounter order, then the second, and so on.
    pub(crate) fn generate_formation(
        &mut self,
        tree: &ForceTree,
        owner: NodeId,
        nodes: &[NodeId],
        num_groups: usize,
    ) -> (Vec<NodeId>, Vec<UnitRecord>) {
        let Some(formation) = tree.node(owner).formation_type.as_ref() else {
            return (Vec::new(), Vec::new());
        };

        let mut params: Vec<UnitParameters> = Vec::new();
        let mut members: Vec<Vec<NodeId>> = Vec::new();
        for &id in nodes {
            let node = tree.node(id);
            let p = UnitParameters {
                faction: node.faction.clone(),
                unit_type: node.unit_type,
                year: node.year,
                rating: self.node_rating_code(node),
                movement_modes: node.movement_modes.clone(),
                roles: node.roles.clone(),
            };
            match params.iter().position(|q| *q == p) {
                Some(i) => members[i].push(id),
                None => {
                    params.push(p);
                    members.push(vec![id]);
                }
            }
        }
        if params.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let counts: Vec<usize> = members.iter().map(Vec::len).collect();
        let units = self.formations.generate_formation(
            formation,
            &params,
            &counts,
            NetworkMask::NONE,
            num_groups,
            &mut self.rng,
        );
        (members.concat(), units)
    }

    /// Nova formations pair base units with the infantry they carry
    ///
    /// Infantry is generated first and decides the transport roles of the
    /// base vehicles. The formation rules apply to the base units only, and
    /// battle armor beyond the omni base units needs magnetic clamps.
    pub(crate) fn generate_nova_formation(
        &mut self,
        tree: &mut ForceTree,
        owner: NodeId,
        nodes: &[NodeId],
        num_groups: usize,
    ) -> (Vec<NodeId>, Vec<UnitRecord>) {
        let mut base = Vec::new();
        let mut battle_armor = Vec::new();
        let mut infantry = Vec::new();
        for &id in nodes {
            match tree.node(id).unit_type {
                Some(UnitType::BattleArmor) => battle_armor.push(id),
                Some(UnitType::Infantry) => infantry.push(id),
                _ => base.push(id),
            }
        }
        if base.is_empty() {
            return (Vec::new(), Vec::new());
        }

        if !infantry.is_empty() {
            self.generate_lance(tree, owner, &infantry);
            let mut foot = infantry
                .iter()
                .filter(|&&id| tree.node(id).movement_modes.contains(&MovementMode::InfLeg))
                .count();
            for &id in &base {
                let node = tree.node_mut(id);
                if matches!(node.unit_type, Some(UnitType::Tank | UnitType::Vtol)) {
                    if foot > 0 {
                        node.roles.insert(MissionRole::Apc);
                        foot -= 1;
                    } else {
                        node.roles.insert(MissionRole::InfSupport);
                    }
                }
            }
        }

        let (targets, units) = self.generate_formation(tree, owner, &base, num_groups);

        let omni = units.iter().filter(|u| u.omni).count();
        let mag_clamps = battle_armor.len().saturating_sub(omni);
        for &id in battle_armor.iter().take(mag_clamps) {
            tree.node_mut(id).flags.insert(ForceFlag::MagClamp);
        }
        self.generate_lance(tree, owner, &battle_armor);

        (targets, units)
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha8Rng;
    use std::cell::RefCell;

    use crate::catalog::{FactionRecord, InMemoryCatalog, UnitRecord};
    use crate::core::config::GenerationConfig;
    use crate::core::types::{ForceFlag, MissionRole, MovementMode, NetworkMask, NodeId, UnitType, WeightClass};
    use crate::force::{ForceNode, ForceTree};
    use crate::formation::{FormationBuilder, FormationType, TableFormationBuilder, UnitParameters};
    use crate::generation::ForceGenerator;
    use crate::ruleset::{RulesetLibrary, TableRuleset};

    /// Records the parameters it is asked for and builds nothing
    #[derive(Default)]
    struct SeenParams(RefCell<Vec<UnitParameters>>);

    impl FormationBuilder for SeenParams {
        fn generate_formation(
            &self,
            _formation: &FormationType,
            params: &[UnitParameters],
            _counts: &[usize],
            _network: NetworkMask,
            _num_groups: usize,
            _rng: &mut ChaCha8Rng,
        ) -> Vec<UnitRecord> {
            self.0.borrow_mut().extend_from_slice(params);
            Vec::new()
        }
    }

    fn lance(tree: &mut ForceTree, formation: &str, types: &[UnitType]) -> (NodeId, Vec<NodeId>) {
        let root = tree.add_root(
            ForceNode::new("CHH", 3067)
                .with_echelon(3)
                .with_formation(FormationType::named(formation).unwrap()),
        );
        let subs = types
            .iter()
            .enumerate()
            .map(|(i, &ut)| {
                let mut child = tree.create_child(root, i);
                child.element = true;
                child.unit_type = Some(ut);
                tree.add_subforce(root, child)
            })
            .collect();
        (root, subs)
    }

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_model(
                UnitRecord::new("Mad Cat", "Prime", UnitType::Mek, Some(WeightClass::Heavy), MovementMode::Biped)
                    .with_omni(true)
                    .with_clan(true),
                &[("CHH", 8)],
            )
            .with_model(
                UnitRecord::new("Elemental", "[Laser]", UnitType::BattleArmor, Some(WeightClass::Medium), MovementMode::InfJump)
                    .with_clan(true),
                &[("CHH", 8)],
            )
            .with_model(
                UnitRecord::new("Foot Point", "Laser", UnitType::Infantry, None, MovementMode::InfLeg),
                &[("CHH", 8)],
            )
            .with_model(
                UnitRecord::new("Fulcrum", "Prime", UnitType::Tank, Some(WeightClass::Heavy), MovementMode::Hover)
                    .with_roles([MissionRole::Apc]),
                &[("CHH", 8)],
            )
    }

    #[test]
    fn test_zero_eligible_fails_without_changes() {
        let catalog = catalog();
        let rules = RulesetLibrary::new();
        let builder = TableFormationBuilder::new(&catalog);
        let mut generator = ForceGenerator::new(&catalog, &builder, &rules, GenerationConfig::default());

        let mut tree = ForceTree::new();
        let (root, subs) = lance(&mut tree, "Aerospace Superiority", &[UnitType::Mek, UnitType::Mek]);
        let before = tree.clone();
        assert!(!generator.generate_and_assign_formation(&mut tree, root, &subs, false, 0));
        for &sub in &subs {
            assert_eq!(tree.node(sub).unit, before.node(sub).unit);
            assert!(tree.node(sub).failure.is_none());
        }
    }

    #[test]
    fn test_formation_fills_leaves_and_ineligible_siblings() {
        let catalog = catalog();
        let rules = RulesetLibrary::new();
        let builder = TableFormationBuilder::new(&catalog);
        let mut generator = ForceGenerator::new(&catalog, &builder, &rules, GenerationConfig::default().with_seed(3));

        let mut tree = ForceTree::new();
        let (root, subs) = lance(
            &mut tree,
            "Battle",
            &[UnitType::Mek, UnitType::Mek, UnitType::Infantry],
        );
        assert!(generator.generate_and_assign_formation(&mut tree, root, &subs, false, 0));
        assert_eq!(tree.node(subs[0]).model_name(), "Mad Cat Prime");
        assert_eq!(tree.node(subs[1]).model_name(), "Mad Cat Prime");
        // Infantry is outside a Battle formation and comes from group generation
        assert_eq!(tree.node(subs[2]).model_name(), "Foot Point Laser");
    }

    #[test]
    fn test_internal_nodes_receive_filters() {
        let catalog = catalog();
        let rules = RulesetLibrary::new();
        let builder = TableFormationBuilder::new(&catalog);
        let mut generator = ForceGenerator::new(&catalog, &builder, &rules, GenerationConfig::default());

        let mut tree = ForceTree::new();
        let (root, subs) = lance(&mut tree, "Battle", &[UnitType::Mek]);
        let child = tree.create_child(subs[0], 0);
        tree.node_mut(subs[0]).element = false;
        tree.add_subforce(subs[0], child);

        assert!(generator.generate_and_assign_formation(&mut tree, root, &subs, true, 0));
        assert!(tree.node(subs[0]).chassis.contains("Mad Cat"));
        assert!(tree.node(subs[0]).unit.is_none());
    }

    #[test]
    fn test_formation_rating_uses_catalog_scale() {
        let catalog = catalog().with_faction(FactionRecord {
            key: "CHH".into(),
            name: "Clan Hell's Horses".into(),
            parent_factions: Vec::new(),
            rating_levels: vec!["Low".into(), "High".into()],
            clan: true,
        });
        let rules = RulesetLibrary::new()
            .with_ruleset(TableRuleset::new("CHH").with_ratings(&["F", "D", "C", "B", "A"]));
        let builder = SeenParams::default();
        let mut generator = ForceGenerator::new(&catalog, &builder, &rules, GenerationConfig::default());

        let mut tree = ForceTree::new();
        let (root, subs) = lance(&mut tree, "Battle", &[UnitType::Mek, UnitType::Mek]);
        for &sub in &subs {
            tree.node_mut(sub).rating = Some("A".into());
        }
        generator.generate_formation(&tree, root, &subs, 0);

        // Level 4 of the ruleset clamps to the top of the two catalog levels
        let seen = builder.0.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].rating.as_deref(), Some("High"));
    }

    #[test]
    fn test_nova_without_base_units_keeps_infantry() {
        let catalog = InMemoryCatalog::new()
            .with_model(
                UnitRecord::new("Elemental", "[Laser]", UnitType::BattleArmor, Some(WeightClass::Medium), MovementMode::InfJump)
                    .with_clan(true),
                &[("CHH", 8)],
            )
            .with_model(
                UnitRecord::new("Foot Point", "Laser", UnitType::Infantry, None, MovementMode::InfLeg),
                &[("CHH", 8)],
            );
        let rules = RulesetLibrary::new();
        let builder = TableFormationBuilder::new(&catalog);
        let mut generator = ForceGenerator::new(&catalog, &builder, &rules, GenerationConfig::default());

        let mut tree = ForceTree::new();
        let (root, subs) = lance(
            &mut tree,
            "Nova",
            &[UnitType::Mek, UnitType::BattleArmor, UnitType::Infantry],
        );
        tree.node_mut(root).flags.insert(ForceFlag::Nova);

        assert!(!generator.generate_and_assign_formation(&mut tree, root, &subs, false, 0));
        assert!(tree.node(subs[0]).unit.is_none());
        assert!(tree.node(subs[1]).is_resolved());
        assert!(tree.node(subs[2]).is_resolved());
        // No omni base unit came back, so the battle armor rides on clamps
        assert!(tree.node(subs[1]).flags.contains(ForceFlag::MagClamp));
    }

    #[test]
    fn test_nova_clamps_and_transport_roles() {
        let catalog = catalog();
        let rules = RulesetLibrary::new();
        let builder = TableFormationBuilder::new(&catalog);
        let mut generator = ForceGenerator::new(&catalog, &builder, &rules, GenerationConfig::default());

        let mut tree = ForceTree::new();
        let (root, subs) = lance(
            &mut tree,
            "Nova",
            &[
                UnitType::Mek,
                UnitType::Tank,
                UnitType::BattleArmor,
                UnitType::BattleArmor,
                UnitType::BattleArmor,
                UnitType::Infantry,
            ],
        );
        tree.node_mut(root).flags.insert(ForceFlag::Nova);

        assert!(generator.generate_and_assign_formation(&mut tree, root, &subs, false, 0));
        assert!(subs.iter().all(|&s| tree.node(s).is_resolved()));

        // One foot unit, so the single vehicle carries it
        assert!(tree.node(subs[1]).roles.contains(&MissionRole::Apc));

        // Only the Mad Cat is omni: two of three battle armor need clamps
        let clamped: Vec<bool> = subs[2..5]
            .iter()
            .map(|&s| tree.node(s).flags.contains(ForceFlag::MagClamp))
            .collect();
        assert_eq!(clamped, vec![true, true, false]);
    }
}
