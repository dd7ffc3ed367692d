//! Order of battle listings for presentation and export

use serde::Serialize;

use super::naming::{description, parse_name};
use super::ForceTree;
use crate::core::types::NodeId;
use crate::ruleset::RulesetProvider;

/// Serializable snapshot of one node and everything below it
#[derive(Debug, Clone, Serialize)]
pub struct ListingEntry {
    pub name: String,
    pub description: String,
    pub echelon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commander: Option<OfficerEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subforces: Vec<ListingEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attached: Vec<ListingEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfficerEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i32>,
    pub gunnery: u8,
    pub piloting: u8,
}

impl ListingEntry {
    pub fn build(tree: &ForceTree, id: NodeId, rulesets: &dyn RulesetProvider) -> Self {
        let node = tree.node(id);
        Self {
            name: parse_name(tree, id, rulesets),
            description: description(tree, id, rulesets),
            echelon: node.echelon_code(),
            unit: node.unit.as_ref().map(|u| u.key.clone()),
            weight_class: node.weight_class.map(|wc| wc.code().to_string()),
            commander: tree.commander_of(id).map(|o| OfficerEntry {
                title: o.title.clone(),
                rank: o.rank,
                gunnery: o.gunnery,
                piloting: o.piloting,
            }),
            failure: node.failure.as_ref().map(|f| f.to_string()),
            subforces: node
                .subforces()
                .iter()
                .map(|&s| Self::build(tree, s, rulesets))
                .collect(),
            attached: node
                .attached()
                .iter()
                .map(|&s| Self::build(tree, s, rulesets))
                .collect(),
        }
    }
}

/// Indented text listing; attachments are marked with `+`
pub fn render_listing(tree: &ForceTree, id: NodeId, rulesets: &dyn RulesetProvider) -> String {
    let mut out = String::new();
    render_into(&mut out, tree, id, rulesets, "");
    out
}

fn render_into(
    out: &mut String,
    tree: &ForceTree,
    id: NodeId,
    rulesets: &dyn RulesetProvider,
    indent: &str,
) {
    let node = tree.node(id);
    let mut line = format!("{}{}", indent, parse_name(tree, id, rulesets));
    if node.element {
        match (&node.unit, &node.failure) {
            (Some(unit), _) => line.push_str(&format!(" {} [{}]", unit.key, node.weight_class_code())),
            (None, Some(failure)) => line.push_str(&format!(" <{}>", failure)),
            (None, None) => line.push_str(" <pending>"),
        }
    } else {
        let desc = description(tree, id, rulesets);
        if !desc.is_empty() {
            line.push_str(&format!(" - {}", desc));
        }
    }
    if let Some(co) = tree.commander_of(id) {
        if let Some(title) = &co.title {
            line.push_str(&format!(" ({} {}/{})", title, co.gunnery, co.piloting));
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');

    let child_indent = format!("{}  ", indent);
    for &sub in node.subforces() {
        render_into(out, tree, sub, rulesets, &child_indent);
    }
    let attached_indent = format!("{} +", indent);
    for &sub in node.attached() {
        render_into(out, tree, sub, rulesets, &attached_indent);
    }
}
