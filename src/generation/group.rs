//! Group generation
//!
//! Fills a list of sibling nodes so the group hangs together: after an
//! anchor unit is chosen, later members roll to take one of the units the
//! anchor is usually fielded with, or the anchor's own chassis. Better rated
//! forces pass these rolls more often.

use rand::Rng;

use super::ForceGenerator;
use crate::catalog::{ChassisRecord, UnitRecord};
use crate::core::types::{MissionRole, MovementMode, NodeId, UnitType, WeightClass};
use crate::force::ForceTree;
use crate::ruleset;

/// Weight classes still to be handed out within a group
#[derive(Debug, Clone, PartialEq)]
enum WeightPool {
    /// Weight class is not tracked for this group
    Unrestricted,
    /// One entry per member still to be filled
    Classes(Vec<Option<WeightClass>>),
}

impl WeightPool {
    fn contains(&self, weight: Option<WeightClass>) -> bool {
        match self {
            WeightPool::Unrestricted => true,
            WeightPool::Classes(classes) => classes.contains(&weight),
        }
    }

    fn remove(&mut self, weight: Option<WeightClass>) {
        if let WeightPool::Classes(classes) = self {
            if let Some(pos) = classes.iter().position(|&w| w == weight) {
                classes.remove(pos);
            }
        }
    }

    fn first(&self) -> Option<Option<WeightClass>> {
        match self {
            WeightPool::Unrestricted => Some(None),
            WeightPool::Classes(classes) => classes.first().copied(),
        }
    }
}

/// Per-group roll state
struct GroupRolls {
    era: i32,
    faction: String,
    year: i32,
    rating_level: Option<usize>,
    target: i32,
}

impl ForceGenerator<'_> {
    fn roll_2d6(&mut self) -> i32 {
        self.rng.gen_range(1..=6) + self.rng.gen_range(1..=6)
    }

    /// Availability modifier of a chassis, falling back through parent factions
    fn chassis_modifier(&self, rolls: &GroupRolls, chassis_key: &str) -> i32 {
        let primary = rolls.faction.split(',').next().unwrap_or(&rolls.faction);
        let mut factions = vec![primary.to_string()];
        if let Some(record) = self.catalog.faction(primary) {
            factions.extend(record.parent_factions.iter().cloned());
        }
        factions
            .iter()
            .find_map(|f| {
                self.catalog
                    .chassis_availability(rolls.era, chassis_key, f, rolls.year)
            })
            .map_or(0, |av| {
                av.adjust_for_rating(rolls.rating_level, self.config.total_rating_levels)
            })
    }

    fn passes(&mut self, rolls: &GroupRolls, modifier: i32) -> bool {
        self.roll_2d6() >= rolls.target - modifier
    }

    /// Store a unit on a group member and take its weight out of the pool
    fn accept(&self, tree: &mut ForceTree, sub: NodeId, unit: UnitRecord, pool: &mut WeightPool, use_weights: bool) {
        let node = tree.node_mut(sub);
        node.set_unit(unit);
        if use_weights {
            pool.remove(node.weight_class);
        }
    }

    /// Fill `subs` as one cohesive group on behalf of `context`
    ///
    /// `context` supplies the rating, role and narrowing of the group; the
    /// members need not be its direct children.
    pub fn generate_lance(&mut self, tree: &mut ForceTree, context: NodeId, subs: &[NodeId]) {
        let Some(&first) = subs.first() else {
            return;
        };
        for &sub in subs {
            self.inherit_narrowing(tree, sub);
        }

        let (narrow_chassis, narrow_models) = {
            let ctx = tree.node(context);
            (ctx.chassis.clone(), ctx.models.clone())
        };
        if !narrow_chassis.is_empty() || !narrow_models.is_empty() {
            for &sub in subs {
                let node = tree.node_mut(sub);
                node.chassis.extend(narrow_chassis.iter().cloned());
                node.models.extend(narrow_models.iter().cloned());
                self.resolve_leaf(tree, sub);
            }
            return;
        }

        // Combined arms groups take their type from the members, not the context
        let unit_type = tree.node(first).unit_type;
        let use_weights = tree.node(context).use_weight_class_for(unit_type);
        let mut pool = if use_weights {
            WeightPool::Classes(subs.iter().map(|&s| tree.node(s).weight_class).collect())
        } else {
            WeightPool::Unrestricted
        };

        let ctx = tree.node(context);
        let rating_level = ruleset::rating_level(self.rulesets, ctx);
        let mut rolls = GroupRolls {
            era: self.catalog.era_for_year(ctx.year),
            faction: ctx.faction.clone(),
            year: ctx.year,
            rating_level,
            target: match rating_level {
                Some(level) => self.config.base_target - level as i32,
                None => self.config.unrated_target,
            },
        };

        let mut anchor: Option<UnitRecord> = None;
        if let Some(ut) = unit_type {
            if !(ut == UnitType::Mek || (ut == UnitType::Aero && subs.len() > 3)) {
                let criteria = self.criteria_for(tree, first);
                anchor = self.search(&criteria).ok();
            }
            if matches!(ut, UnitType::Aero | UnitType::ConvFighter) {
                rolls.target -= self.config.fighter_modifier;
            }
            if tree.node(context).roles.contains(&MissionRole::Artillery) {
                let missile = anchor
                    .as_ref()
                    .map_or(false, |a| a.roles.contains(&MissionRole::MissileArtillery));
                if missile {
                    let ctx = tree.node_mut(context);
                    ctx.roles.remove(&MissionRole::Artillery);
                    ctx.roles.insert(MissionRole::MissileArtillery);
                } else {
                    rolls.target -= self.config.artillery_modifier;
                }
            }
        }
        tracing::debug!(
            context = context.0,
            members = subs.len(),
            target = rolls.target,
            anchor = ?anchor.as_ref().map(|a| &a.key),
            "Generating group"
        );

        for &sub in subs {
            let sub_type = tree.node(sub).unit_type;
            let mut found = false;

            let current_anchor = match &anchor {
                Some(a) if unit_type.is_none() || unit_type == sub_type => Some(a.clone()),
                _ => None,
            };

            match current_anchor {
                None => {
                    let criteria = self.criteria_for(tree, sub);
                    if let Ok(unit) = self.search(&criteria) {
                        tracing::debug!(anchor = %unit.key, "New group anchor");
                        anchor = Some(unit.clone());
                        self.accept(tree, sub, unit, &mut pool, use_weights);
                        found = true;
                    }
                }
                Some(base) => {
                    found = self.follow_deployed_with(tree, sub, &base, unit_type, &rolls, &mut pool, use_weights);
                    if !found && pool.contains(base.weight_class) {
                        found = self.follow_anchor(tree, sub, &base, unit_type, &rolls, &mut pool, use_weights);
                    }
                }
            }

            if !found {
                let current = tree.node(sub).weight_class;
                if !pool.contains(current) {
                    if let Some(pinned) = pool.first() {
                        tree.node_mut(sub).weight_class = pinned;
                    }
                }
                let criteria = self.criteria_for(tree, sub);
                let result = match self.search(&criteria) {
                    Ok(unit) => Ok(unit),
                    Err(_) => {
                        tree.node_mut(sub).movement_modes.clear();
                        let criteria = self.criteria_for(tree, sub);
                        self.search(&criteria)
                    }
                };
                match result {
                    Ok(unit) => self.accept(tree, sub, unit, &mut pool, use_weights),
                    Err(failure) => tree.node_mut(sub).failure = Some(failure),
                }
            }

            if unit_type.map_or(true, |ut| ut == UnitType::Mek) {
                anchor = None;
            }
        }
    }

    /// Try the units the anchor is commonly fielded with
    #[allow(clippy::too_many_arguments)]
    fn follow_deployed_with(
        &mut self,
        tree: &mut ForceTree,
        sub: NodeId,
        base: &UnitRecord,
        unit_type: Option<UnitType>,
        rolls: &GroupRolls,
        pool: &mut WeightPool,
        use_weights: bool,
    ) -> bool {
        let chassis_type = unit_type.unwrap_or(base.unit_type);
        for name in &base.deployed_with {
            let plain = ChassisRecord::key_for(name, chassis_type, false);
            let omni = ChassisRecord::key_for(name, chassis_type, true);
            let chassis_key = if self.catalog.chassis(&plain).is_some() {
                Some(plain)
            } else if self.catalog.chassis(&omni).is_some() {
                Some(omni)
            } else {
                None
            };

            if let Some(key) = chassis_key {
                let modifier = self.chassis_modifier(rolls, &key);
                if self.passes(rolls, modifier) {
                    let criteria = self.criteria_for(tree, sub).pinned_to_chassis(name);
                    if let Ok(unit) = self.search(&criteria) {
                        if pool.contains(unit.weight_class) {
                            tracing::debug!(unit = %unit.key, with = %base.key, "Deployed with anchor");
                            self.accept(tree, sub, unit, pool, use_weights);
                            return true;
                        }
                    }
                }
            } else if let Some(model) = self.catalog.model(name).cloned() {
                let available = self
                    .catalog
                    .model_availability(rolls.era, name, &rolls.faction)
                    .is_some();
                if available && pool.contains(model.weight_class) {
                    let modifier = self.chassis_modifier(rolls, &model.chassis_key());
                    if self.passes(rolls, modifier) {
                        tracing::debug!(unit = %model.key, with = %base.key, "Deployed with anchor");
                        self.accept(tree, sub, model, pool, use_weights);
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Reuse the anchor's chassis, or loosen towards its movement mode
    #[allow(clippy::too_many_arguments)]
    fn follow_anchor(
        &mut self,
        tree: &mut ForceTree,
        sub: NodeId,
        base: &UnitRecord,
        unit_type: Option<UnitType>,
        rolls: &GroupRolls,
        pool: &mut WeightPool,
        use_weights: bool,
    ) -> bool {
        let modifier = self.chassis_modifier(rolls, &base.chassis_key());
        if self.passes(rolls, modifier) {
            let mut criteria = self.criteria_for(tree, sub);
            criteria.chassis.insert(base.chassis.clone());
            criteria.weight_class = None;
            if let Ok(unit) = self.search(&criteria) {
                self.accept(tree, sub, unit, pool, use_weights);
                return true;
            }
        } else if unit_type == Some(UnitType::Tank)
            && self.passes(rolls, self.config.movement_mode_modifier)
        {
            if use_weights {
                let adopt = match base.movement_mode {
                    MovementMode::Hover => {
                        !pool.contains(Some(WeightClass::Heavy)) && !pool.contains(Some(WeightClass::Assault))
                    }
                    MovementMode::Wheeled => !pool.contains(Some(WeightClass::Assault)),
                    _ => false,
                };
                if adopt {
                    tree.node_mut(sub).movement_modes.insert(base.movement_mode);
                }
            }
        } else if unit_type == Some(UnitType::Infantry) {
            tree.node_mut(sub).movement_modes.insert(base.movement_mode);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::core::config::GenerationConfig;
    use crate::force::ForceNode;
    use crate::formation::TableFormationBuilder;
    use crate::ruleset::RulesetLibrary;

    #[test]
    fn test_weight_pool() {
        let mut pool = WeightPool::Classes(vec![Some(WeightClass::Heavy), Some(WeightClass::Light)]);
        assert!(pool.contains(Some(WeightClass::Heavy)));
        assert!(!pool.contains(Some(WeightClass::Medium)));
        pool.remove(Some(WeightClass::Heavy));
        assert!(!pool.contains(Some(WeightClass::Heavy)));
        assert_eq!(pool.first(), Some(Some(WeightClass::Light)));
        pool.remove(Some(WeightClass::Light));
        assert_eq!(pool.first(), None);

        let open = WeightPool::Unrestricted;
        assert!(open.contains(None));
        assert!(open.contains(Some(WeightClass::Colossal)));
    }

    fn tank(chassis: &str, wc: WeightClass, mode: MovementMode) -> UnitRecord {
        UnitRecord::new(chassis, "(Standard)", UnitType::Tank, Some(wc), mode)
    }

    #[test]
    fn test_vehicle_group_stays_within_pool() {
        let catalog = InMemoryCatalog::new()
            .with_model(
                tank("Vedette", WeightClass::Medium, MovementMode::Tracked).with_deployed_with(&["Scorpion"]),
                &[("FS", 6)],
            )
            .with_model(tank("Scorpion", WeightClass::Light, MovementMode::Tracked), &[("FS", 6)])
            .with_model(tank("Galleon", WeightClass::Light, MovementMode::Wheeled), &[("FS", 6)]);
        let rules = RulesetLibrary::new();
        let builder = TableFormationBuilder::new(&catalog);
        let mut generator = ForceGenerator::new(&catalog, &builder, &rules, GenerationConfig::default().with_seed(11));

        let mut tree = ForceTree::new();
        let root = tree.add_root(ForceNode::new("FS", 3025).with_unit_type(UnitType::Tank).with_echelon(3));
        let weights = [WeightClass::Medium, WeightClass::Light, WeightClass::Light, WeightClass::Medium];
        let subs: Vec<_> = weights
            .iter()
            .enumerate()
            .map(|(i, &wc)| {
                let mut child = tree.create_child(root, i);
                child.element = true;
                child.weight_class = Some(wc);
                tree.add_subforce(root, child)
            })
            .collect();

        generator.generate_lance(&mut tree, root, &subs);

        let mut produced: Vec<_> = subs.iter().map(|&s| tree.node(s).weight_class).collect();
        produced.sort();
        let mut expected: Vec<_> = weights.iter().map(|&w| Some(w)).collect();
        expected.sort();
        assert!(subs.iter().all(|&s| tree.node(s).is_resolved()));
        // Only Medium and Light units exist, so every member lands on a pool weight
        assert_eq!(produced, expected);
    }

    #[test]
    fn test_narrowed_context_resolves_each_member() {
        let catalog = InMemoryCatalog::new()
            .with_model(tank("Vedette", WeightClass::Medium, MovementMode::Tracked), &[("FS", 6)])
            .with_model(tank("Scorpion", WeightClass::Light, MovementMode::Tracked), &[("FS", 6)]);
        let rules = RulesetLibrary::new();
        let builder = TableFormationBuilder::new(&catalog);
        let mut generator = ForceGenerator::new(&catalog, &builder, &rules, GenerationConfig::default());

        let mut tree = ForceTree::new();
        let root = tree.add_root(ForceNode::new("FS", 3025).with_unit_type(UnitType::Tank));
        tree.node_mut(root).chassis.insert("Scorpion".into());
        let subs: Vec<_> = (0..3)
            .map(|i| {
                let mut child = tree.create_child(root, i);
                child.element = true;
                child.chassis.clear();
                tree.add_subforce(root, child)
            })
            .collect();

        generator.generate_lance(&mut tree, root, &subs);
        for sub in subs {
            assert!(tree.node(sub).chassis.contains("Scorpion"));
            assert_eq!(tree.node(sub).unit.as_ref().unwrap().chassis, "Scorpion");
        }
    }

    #[test]
    fn test_artillery_anchor_switches_to_missile_artillery() {
        let arrow = UnitRecord::new("Arrow IV Carrier", "(Standard)", UnitType::Tank, Some(WeightClass::Heavy), MovementMode::Tracked)
            .with_roles([MissionRole::Artillery, MissionRole::MissileArtillery]);
        let catalog = InMemoryCatalog::new().with_model(arrow, &[("FS", 6)]);
        let rules = RulesetLibrary::new();
        let builder = TableFormationBuilder::new(&catalog);
        let mut generator = ForceGenerator::new(&catalog, &builder, &rules, GenerationConfig::default());

        let mut tree = ForceTree::new();
        let root = tree.add_root(
            ForceNode::new("FS", 3025)
                .with_unit_type(UnitType::Tank)
                .with_role(MissionRole::Artillery),
        );
        let subs: Vec<_> = (0..2)
            .map(|i| {
                let mut child = tree.create_child(root, i);
                child.element = true;
                tree.add_subforce(root, child)
            })
            .collect();

        generator.generate_lance(&mut tree, root, &subs);
        let roles = &tree.node(root).roles;
        assert!(roles.contains(&MissionRole::MissileArtillery));
        assert!(!roles.contains(&MissionRole::Artillery));
        assert!(subs.iter().all(|&s| tree.node(s).is_resolved()));
    }
}
