//! Commander assignment and attribute roll-up
//!
//! Runs post-order: every subforce is staffed before its parent chooses a
//! commander from among the subforce commanders. Officers are shared, so a
//! lance commander promoted to lead the company keeps a single record that
//! ends up carrying the highest rank and title.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::core::types::{ForceFlag, MissionRole, MovementMode, NodeId, OfficerId, UnitType, WeightClass};
use crate::force::{ForceTree, Officer};
use crate::ruleset::{self, CommandSlot, RulesetProvider};

/// Seniority of a subforce when choosing who commands its parent
///
/// Heavier units, Meks and better crews score higher; a commander fielding
/// Star League or Clan technology gets a bonus.
pub fn rank_score(tree: &ForceTree, id: NodeId) -> i32 {
    let node = tree.node(id);
    let mut score = node.weight_class.map_or(0, |wc| wc.index() as i32);
    match node.unit_type {
        Some(UnitType::Mek) => score += 2,
        Some(UnitType::Infantry) => score -= 2,
        _ => {}
    }
    if let Some(co) = tree.commander_of(id) {
        score -= co.skill_total();
        if let Some(unit) = &tree.node(co.assignment).unit {
            if unit.star_league {
                score += 2;
            }
            if unit.clan {
                score += 5;
            }
        }
    }
    score
}

struct Seniority {
    id: NodeId,
    command: bool,
    rating_level: Option<usize>,
    score: i32,
}

impl Seniority {
    fn compare(&self, other: &Self) -> Ordering {
        other
            .command
            .cmp(&self.command)
            .then_with(|| other.rating_level.cmp(&self.rating_level))
            .then_with(|| other.score.cmp(&self.score))
    }
}

/// Subforces ordered most senior first; ties keep their original order
fn sort_by_seniority(tree: &ForceTree, rulesets: &dyn RulesetProvider, subs: &[NodeId]) -> Vec<NodeId> {
    let mut ranked: Vec<Seniority> = subs
        .iter()
        .map(|&id| {
            let node = tree.node(id);
            Seniority {
                id,
                command: node.roles.contains(&MissionRole::Command),
                rating_level: ruleset::rating_level(rulesets, node),
                score: rank_score(tree, id),
            }
        })
        .collect();
    ranked.sort_by(Seniority::compare);
    ranked.into_iter().map(|s| s.id).collect()
}

/// Assign commanders to `id` and everything below it
pub fn assign_commanders(tree: &mut ForceTree, id: NodeId, rulesets: &dyn RulesetProvider) {
    let subforces = tree.node(id).subforces().to_vec();
    for sub in subforces {
        assign_commanders(tree, sub, rulesets);
    }

    match ruleset::command_slots(rulesets, tree.node(id)) {
        Some((co_slot, xo_slot)) => staff(tree, id, rulesets, co_slot, xo_slot),
        None => {
            let node = tree.node(id);
            if !node.element {
                tracing::warn!(
                    node = id.0,
                    faction = %node.faction,
                    echelon = ?node.echelon,
                    "No command rules, assigning an unranked commander"
                );
            }
            let experience = node.experience;
            let officer = tree.add_officer(Officer::for_node(id, experience));
            tree.node_mut(id).commander = Some(officer);
            return;
        }
    }

    roll_up(tree, id);

    let attached = tree.node(id).attached().to_vec();
    for sub in attached {
        assign_commanders(tree, sub, rulesets);
    }
}

fn staff(
    tree: &mut ForceTree,
    id: NodeId,
    rulesets: &dyn RulesetProvider,
    co_slot: &CommandSlot,
    xo_slot: Option<&CommandSlot>,
) {
    let mut co: Option<OfficerId> = None;
    let mut xo: Option<OfficerId> = None;

    let subforces = tree.node(id).subforces().to_vec();
    if !subforces.is_empty() {
        let co_pos = co_slot.position.map_or(1, |p| p.min(1));
        let xo_pos = match xo_slot.map(|s| s.position) {
            None | Some(Some(0)) => 0,
            Some(None) => co_pos + 1,
            Some(Some(p)) => co_pos.max(p),
        };

        if co_pos + xo_pos > 0 {
            let sorted = sort_by_seniority(tree, rulesets, &subforces);
            if co_pos != 0 {
                let preferred = co_slot.unit_type.and_then(|pref| {
                    sorted
                        .iter()
                        .copied()
                        .find(|&s| tree.node(s).unit_type.map_or(false, |ut| pref.accepts(ut, None)))
                });
                if let Some(holder) = preferred.or_else(|| sorted.first().copied()) {
                    co = tree.node(holder).commander;
                    let subs = &mut tree.node_mut(id).subforces;
                    subs.retain(|&s| s != holder);
                    subs.insert(0, holder);
                }
            }

            if xo_pos != 0 {
                // Sharing a position means the XO comes from inside the CO's own subforce
                let pool = if co_pos == xo_pos {
                    tree.node(id)
                        .subforces()
                        .first()
                        .map(|&first| tree.node(first).subforces().to_vec())
                        .unwrap_or_default()
                } else {
                    tree.node(id).subforces().to_vec()
                };
                if pool.len() > co_pos {
                    let co_type = co.and_then(|o| tree.node(tree.officer(o).assignment).unit_type);
                    let preferred = xo_slot.and_then(|s| s.unit_type).and_then(|pref| {
                        pool[co_pos..]
                            .iter()
                            .copied()
                            .find(|&s| tree.node(s).unit_type.map_or(false, |ut| pref.accepts(ut, co_type)))
                    });
                    xo = preferred
                        .or_else(|| pool.get(1).copied())
                        .and_then(|holder| tree.node(holder).commander);
                }
            }
        }
    }

    let experience = tree.node(id).experience;
    let co = co.unwrap_or_else(|| tree.add_officer(Officer::for_node(id, experience)));
    let officer = tree.officer_mut(co);
    officer.rank = co_slot.rank;
    officer.title = co_slot.title.clone();
    tree.node_mut(id).commander = Some(co);

    if let Some(xo_slot) = xo_slot {
        let xo = xo.unwrap_or_else(|| tree.add_officer(Officer::for_node(id, experience)));
        let officer = tree.officer_mut(xo);
        officer.rank = xo_slot.rank;
        officer.title = xo_slot.title.clone();
        tree.node_mut(id).executive_officer = Some(xo);
    }
}

/// Derive an internal node's attributes from its subforces
fn roll_up(tree: &mut ForceTree, id: NodeId) {
    let node = tree.node(id);
    if node.element || node.subforces().is_empty() {
        return;
    }
    let subs: Vec<_> = node.subforces().iter().map(|&s| tree.node(s)).collect();

    let movement_modes: BTreeSet<MovementMode> = subs
        .iter()
        .flat_map(|s| s.movement_modes.iter().copied())
        .collect();
    let omni = subs
        .iter()
        .all(|s| s.unit_type.map_or(false, |ut| ut.is_omni_capable()) && s.is_omni());
    let artillery = subs.iter().all(|s| s.roles.iter().any(|r| r.is_artillery()));
    let missile_artillery = subs.iter().all(|s| s.roles.contains(&MissionRole::MissileArtillery));
    let field_gun = subs.iter().all(|s| s.roles.contains(&MissionRole::FieldGun));

    let weights: Vec<usize> = subs
        .iter()
        .filter(|s| s.use_weight_class())
        .filter_map(|s| s.weight_class)
        .map(WeightClass::index)
        .collect();
    let weight_class = if weights.is_empty() {
        None
    } else {
        let mean = weights.iter().sum::<usize>() as f64 / weights.len() as f64;
        WeightClass::from_index((mean + 0.5) as usize)
    };

    let node = tree.node_mut(id);
    node.movement_modes = movement_modes;
    if omni {
        node.flags.insert(ForceFlag::Omni);
    }
    if artillery {
        node.roles.insert(MissionRole::Artillery);
    }
    if missile_artillery {
        node.roles.insert(MissionRole::MissileArtillery);
    }
    if field_gun {
        node.roles.insert(MissionRole::FieldGun);
    }
    if weight_class.is_some() {
        node.weight_class = weight_class;
    }
}
