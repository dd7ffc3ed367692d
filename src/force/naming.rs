//! Position indices and name templates
//!
//! Names may contain placeholders that are filled in from the node's
//! `name_index` (or its parent's for the `:parent` variants):
//! `{ordinal}`, `{greek}`, `{phonetic}`, `{latin}`, `{roman}`,
//! `{cardinal}`, `{alpha}`, plus `{name:parent}` and `{formation}`.
//! A template ending in `:distinct}` is only numbered when a sibling shares it.

use ahash::AHashMap;

use super::ForceTree;
use crate::core::types::{MissionRole, NodeId, UnitType, AIR_ECHELON_NAMES, GROUND_ECHELON_NAMES};
use crate::ruleset::{self, RulesetProvider};

pub const ORDINALS: [&str; 10] = [
    "First", "Second", "Third", "Fourth", "Fifth", "Sixth", "Seventh", "Eighth", "Ninth", "Tenth",
];

pub const PHONETIC: [&str; 26] = [
    "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel", "India", "Juliett",
    "Kilo", "Lima", "Mike", "November", "Oscar", "Papa", "Quebec", "Romeo", "Sierra", "Tango",
    "Uniform", "Victor", "Whiskey", "X-ray", "Yankee", "Zulu",
];

pub const GREEK: [&str; 24] = [
    "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta", "Theta", "Iota", "Kappa",
    "Lambda", "Mu", "Nu", "Xi", "Omicron", "Pi", "Rho", "Sigma", "Tau", "Upsilon", "Phi", "Chi",
    "Psi", "Omega",
];

pub const LATIN: [&str; 10] = [
    "Prima", "Secunda", "Tertia", "Quarta", "Quinta", "Sexta", "Septima", "Octava", "Nona",
    "Decima",
];

pub const ROMAN: [&str; 10] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"];

const DISTINCT: &str = ":distinct";

/// Assign `position_index` and `name_index` to every node below `id`
///
/// Safe to call repeatedly: templates keep their `:distinct` marker.
pub fn assign_positions(tree: &mut ForceTree, id: NodeId) {
    let subforces = tree.node(id).subforces.clone();

    let mut index = 0;
    let mut distinct_count: AHashMap<String, usize> = AHashMap::new();
    for (i, &sub) in subforces.iter().enumerate() {
        let node = tree.node_mut(sub);
        node.position_index = Some(i + 1);
        let Some(name) = node.name.as_deref() else {
            continue;
        };
        if name.contains(":distinct}") {
            *distinct_count.entry(name.to_string()).or_default() += 1;
        } else if has_plain_placeholder(name) {
            node.name_index = Some(index);
            index += 1;
        }
    }

    let mut seen: AHashMap<String, usize> = AHashMap::new();
    for &sub in &subforces {
        let node = tree.node_mut(sub);
        if let Some(name) = node.name.clone() {
            if let Some(&count) = distinct_count.get(&name) {
                if count > 1 {
                    let n = seen.entry(name).or_default();
                    node.name_index = Some(*n);
                    *n += 1;
                } else {
                    node.name_index = None;
                }
            }
        }
        assign_positions(tree, sub);
    }

    let attached = tree.node(id).attached.clone();
    for sub in attached {
        assign_positions(tree, sub);
    }
}

/// A `{...}` placeholder with no `:` qualifier
fn has_plain_placeholder(name: &str) -> bool {
    name.match_indices('{').any(|(open, _)| {
        let rest = &name[open + 1..];
        match (rest.find('}'), rest.find(':')) {
            (Some(close), Some(colon)) => close < colon,
            (Some(_), None) => true,
            (None, _) => false,
        }
    })
}

/// Remove every `{...}` placeholder, and the following whitespace character when `eat_space` is set
fn strip_placeholders(text: &str, eat_space: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
        if eat_space {
            if let Some(c) = rest.chars().next().filter(|c| c.is_whitespace()) {
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn indexed(table: &[&str], index: usize) -> String {
    table
        .get(index)
        .map(|s| s.to_string())
        .unwrap_or_else(|| (index + 1).to_string())
}

fn alpha(index: usize) -> String {
    char::from_u32('A' as u32 + index as u32)
        .map(String::from)
        .unwrap_or_default()
}

fn fill_index(text: &str, suffix: &str, index: usize) -> String {
    let tag = |kind: &str| format!("{{{}{}}}", kind, suffix);
    text.replace(&tag("ordinal"), &indexed(&ORDINALS, index))
        .replace(&tag("greek"), &indexed(&GREEK, index))
        .replace(&tag("phonetic"), &indexed(&PHONETIC, index))
        .replace(&tag("latin"), &indexed(&LATIN, index))
        .replace(&tag("roman"), &indexed(&ROMAN, index))
        .replace(&tag("cardinal"), &(index + 1).to_string())
        .replace(&tag("alpha"), &alpha(index))
}

/// Echelon name from the rulesets, or the generic name for the echelon
fn echelon_name(tree: &ForceTree, id: NodeId, rulesets: &dyn RulesetProvider) -> Option<String> {
    let node = tree.node(id);
    ruleset::echelon_name(rulesets, node).or_else(|| {
        let echelon = node.echelon? as usize;
        let table: &[&str] = if node.unit_type.map_or(false, |ut| ut.is_aerospace()) {
            &AIR_ECHELON_NAMES
        } else {
            &GROUND_ECHELON_NAMES
        };
        table.get(echelon).map(|s| s.to_string())
    })
}

/// Render the node's name template
pub fn parse_name(tree: &ForceTree, id: NodeId, rulesets: &dyn RulesetProvider) -> String {
    let node = tree.node(id);
    let mut name = match &node.name {
        Some(name) => name.replace(DISTINCT, ""),
        None => match echelon_name(tree, id, rulesets) {
            Some(echelon) => format!("{{ordinal}} {}", echelon),
            None => return String::new(),
        },
    };

    if let Some(parent) = node.parent.map(|p| tree.node(p)) {
        if let Some(parent_index) = parent.name_index {
            name = fill_index(&name, ":parent", parent_index);
        }
        if name.contains("{name:parent}") {
            let parent_name = parent.name.as_deref().unwrap_or_default();
            let after_bracket = parent_name.rsplit('[').next().unwrap_or(parent_name);
            let inner = after_bracket.split(']').next().unwrap_or(after_bracket);
            name = name.replace("{name:parent}", inner);
        }
    }

    match node.name_index {
        None => name = strip_placeholders(&name, true),
        Some(index) => {
            name = fill_index(&name, "", index);
            if name.contains("{formation}") {
                match node.formation_type.as_ref().and_then(|f| f.short_category()) {
                    Some(category) => name = name.replace("{formation}", &category),
                    None => name = name.replace("{formation} ", ""),
                }
            }
        }
    }

    let name = strip_placeholders(&name, false).replace(['[', ']'], "");
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One-line summary: weight, type, role, echelon and formation
pub fn description(tree: &ForceTree, id: NodeId, rulesets: &dyn RulesetProvider) -> String {
    let node = tree.node(id);
    let mut out = String::new();
    if let Some(ut) = node.unit_type {
        if let Some(wc) = node.weight_class {
            out.push_str(wc.name());
            out.push(' ');
        }
        if node.roles.iter().any(|r| r.is_artillery()) {
            out.push_str(if ut == UnitType::Infantry { "Field" } else { "Mobile" });
        } else {
            out.push_str(ut.name());
        }
        out.push(' ');
    }

    let role = [
        (MissionRole::Recon, "Recon"),
        (MissionRole::FireSupport, "Fire Support"),
        (MissionRole::Artillery, "Artillery"),
        (MissionRole::Urban, "Urban"),
    ]
    .into_iter()
    .find(|(r, _)| node.roles.contains(r));
    if let Some((_, label)) = role {
        out.push_str(label);
    }

    if let Some(echelon) = ruleset::echelon_name(rulesets, node) {
        out.push(' ');
        out.push_str(&echelon);
    }
    if let Some(formation) = &node.formation_type {
        out.push_str(&format!(" ({})", formation.name));
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::WeightClass;
    use crate::force::ForceNode;
    use crate::formation::FormationType;
    use crate::ruleset::{EchelonRule, RulesetLibrary, TableRuleset};

    fn rulesets() -> RulesetLibrary {
        RulesetLibrary::new().with_ruleset(
            TableRuleset::new("FS")
                .with_echelon(EchelonRule::new(3, "Lance"))
                .with_echelon(EchelonRule::new(4, "Company")),
        )
    }

    fn company(names: &[Option<&str>]) -> (ForceTree, NodeId, Vec<NodeId>) {
        let mut tree = ForceTree::new();
        let root = tree.add_root(ForceNode::new("FS", 3025).with_echelon(4).with_name("[Davion] Guards"));
        let subs = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut child = tree.create_child(root, i);
                child.echelon = Some(3);
                child.name = name.map(str::to_string);
                tree.add_subforce(root, child)
            })
            .collect();
        (tree, root, subs)
    }

    #[test]
    fn test_plain_placeholder_detection() {
        assert!(has_plain_placeholder("{ordinal} Lance"));
        assert!(!has_plain_placeholder("{ordinal:parent} Lance"));
        assert!(!has_plain_placeholder("{phonetic:distinct} Lance"));
        assert!(!has_plain_placeholder("Command Lance"));
        assert!(has_plain_placeholder("{name:parent} {alpha}"));
    }

    #[test]
    fn test_positions_and_shared_counter() {
        let (mut tree, root, subs) = company(&[
            Some("{ordinal} Lance"),
            Some("Command Lance"),
            None,
            Some("{alpha} Lance"),
        ]);
        assign_positions(&mut tree, root);

        let positions: Vec<_> = subs.iter().map(|&s| tree.node(s).position_index).collect();
        assert_eq!(positions, vec![Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(tree.node(subs[0]).name_index, Some(0));
        assert_eq!(tree.node(subs[1]).name_index, None);
        assert_eq!(tree.node(subs[3]).name_index, Some(1));
        assert_eq!(parse_name(&tree, subs[3], &rulesets()), "B Lance");
    }

    #[test]
    fn test_distinct_names() {
        let (mut tree, root, subs) = company(&[
            Some("{phonetic:distinct} Striker"),
            Some("{phonetic:distinct} Striker"),
            Some("{greek:distinct} Recon"),
        ]);
        assign_positions(&mut tree, root);
        let lib = rulesets();

        assert_eq!(tree.node(subs[0]).name_index, Some(0));
        assert_eq!(tree.node(subs[1]).name_index, Some(1));
        assert_eq!(tree.node(subs[2]).name_index, None);
        assert_eq!(parse_name(&tree, subs[1], &lib), "Bravo Striker");
        assert_eq!(parse_name(&tree, subs[2], &lib), "Recon");
    }

    #[test]
    fn test_assign_positions_is_idempotent() {
        let (mut tree, root, subs) = company(&[
            Some("{phonetic:distinct} Striker"),
            Some("{ordinal} Lance"),
            Some("{phonetic:distinct} Striker"),
        ]);
        assign_positions(&mut tree, root);
        let first: Vec<_> = subs.iter().map(|&s| (tree.node(s).position_index, tree.node(s).name_index)).collect();
        assign_positions(&mut tree, root);
        let second: Vec<_> = subs.iter().map(|&s| (tree.node(s).position_index, tree.node(s).name_index)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unnamed_node_uses_echelon_name() {
        let (mut tree, root, subs) = company(&[None, None]);
        assign_positions(&mut tree, root);
        let lib = rulesets();
        // Unnamed siblings carry no name index, so the ordinal is dropped
        assert_eq!(parse_name(&tree, subs[0], &lib), "Lance");
        tree.node_mut(subs[1]).name_index = Some(1);
        assert_eq!(parse_name(&tree, subs[1], &lib), "Second Lance");
    }

    #[test]
    fn test_parent_placeholders() {
        let (mut tree, root, _) = company(&[]);
        tree.node_mut(root).name_index = Some(2);
        let mut child = tree.create_child(root, 0);
        child.name = Some("{name:parent} {roman:parent}-{cardinal}".into());
        child.name_index = Some(6);
        let child = tree.add_subforce(root, child);
        assert_eq!(parse_name(&tree, child, &rulesets()), "Davion III-7");
    }

    #[test]
    fn test_formation_placeholder() {
        let (mut tree, root, subs) = company(&[Some("{ordinal} {formation} Lance")]);
        assign_positions(&mut tree, root);
        tree.node_mut(subs[0]).formation_type = FormationType::named("Striker");
        assert_eq!(parse_name(&tree, subs[0], &rulesets()), "First Striker Lance");

        tree.node_mut(subs[0]).formation_type = None;
        assert_eq!(parse_name(&tree, subs[0], &rulesets()), "First Lance");
    }

    #[test]
    fn test_description() {
        let mut tree = ForceTree::new();
        let lance = tree.add_root(
            ForceNode::new("FS", 3025)
                .with_unit_type(UnitType::Mek)
                .with_weight_class(WeightClass::Heavy)
                .with_role(MissionRole::FireSupport)
                .with_echelon(3)
                .with_formation(FormationType::named("Fire").unwrap()),
        );
        assert_eq!(description(&tree, lance, &rulesets()), "Heavy Mek Fire Support Lance (Fire)");

        let guns = tree.add_root(
            ForceNode::new("FS", 3025)
                .with_unit_type(UnitType::Infantry)
                .with_role(MissionRole::Artillery)
                .with_echelon(3),
        );
        assert_eq!(description(&tree, guns, &rulesets()), "Field Artillery Lance");
    }
}
