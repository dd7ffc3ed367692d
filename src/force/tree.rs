//! Arena holding every node and officer of a generated force

use serde::{Deserialize, Serialize};

use super::node::{ForceNode, Officer};
use crate::catalog::UnitRecord;
use crate::core::error::{OrbatError, Result};
use crate::core::types::{MissionRole, NodeId, OfficerId};

/// Owns all nodes of one or more force hierarchies
///
/// Children are referenced by id from their parent's `subforces` or
/// `attached` list; a node's parent is recorded once, when it is added.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForceTree {
    nodes: Vec<ForceNode>,
    officers: Vec<Officer>,
    roots: Vec<NodeId>,
}

impl ForceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    fn push(&mut self, node: ForceNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Add a top-level force
    pub fn add_root(&mut self, mut node: ForceNode) -> NodeId {
        node.top_level = true;
        node.parent = None;
        let id = self.push(node);
        self.roots.push(id);
        id
    }

    /// Add `node` as the next subforce of `parent`
    pub fn add_subforce(&mut self, parent: NodeId, mut node: ForceNode) -> NodeId {
        node.parent = Some(parent);
        node.is_attachment = false;
        let id = self.push(node);
        self.nodes[parent.index()].subforces.push(id);
        id
    }

    /// Add `node` as an independently generated attachment of `parent`
    pub fn add_attached(&mut self, parent: NodeId, mut node: ForceNode) -> NodeId {
        node.parent = Some(parent);
        node.is_attachment = true;
        let id = self.push(node);
        self.nodes[parent.index()].attached.push(id);
        id
    }

    /// A fresh node inheriting the parent's constraints
    ///
    /// The command role, name, leadership and structure are not inherited.
    pub fn create_child(&self, parent: NodeId, index: usize) -> ForceNode {
        let p = self.node(parent);
        let mut roles = p.roles.clone();
        roles.remove(&MissionRole::Command);
        ForceNode {
            index,
            faction: p.faction.clone(),
            year: p.year,
            weight_class: p.weight_class,
            unit_type: p.unit_type,
            movement_modes: p.movement_modes.clone(),
            roles,
            models: p.models.clone(),
            chassis: p.chassis.clone(),
            variants: p.variants.clone(),
            augmented: p.augmented,
            rating: p.rating.clone(),
            experience: p.experience,
            flags: p.flags.clone(),
            rank_system: p.rank_system,
            top_level: false,
            ..ForceNode::default()
        }
    }

    /// Node by id. Ids are only handed out by this tree, so lookup cannot miss.
    pub fn node(&self, id: NodeId) -> &ForceNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ForceNode {
        &mut self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Result<&ForceNode> {
        self.nodes.get(id.index()).ok_or(OrbatError::NodeNotFound(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &ForceNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    pub fn add_officer(&mut self, officer: Officer) -> OfficerId {
        let id = OfficerId(self.officers.len() as u32);
        self.officers.push(officer);
        id
    }

    pub fn officer(&self, id: OfficerId) -> &Officer {
        &self.officers[id.0 as usize]
    }

    pub fn officer_mut(&mut self, id: OfficerId) -> &mut Officer {
        &mut self.officers[id.0 as usize]
    }

    pub fn commander_of(&self, id: NodeId) -> Option<&Officer> {
        self.node(id).commander.map(|o| self.officer(o))
    }

    pub fn executive_officer_of(&self, id: NodeId) -> Option<&Officer> {
        self.node(id).executive_officer.map(|o| self.officer(o))
    }

    /// Subforces followed by attachments
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let node = self.node(id);
        node.subforces.iter().chain(node.attached.iter()).copied()
    }

    /// Ids of `id` and every descendant, depth first, subforces before attachments
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let node = self.node(current);
            for child in node.attached.iter().rev().chain(node.subforces.iter().rev()) {
                stack.push(*child);
            }
        }
        out
    }

    /// Every resolved unit below `id`, in listing order
    pub fn collect_units(&self, id: NodeId) -> Vec<&UnitRecord> {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| {
                let node = self.node(n);
                if node.element {
                    node.unit.as_ref()
                } else {
                    None
                }
            })
            .collect()
    }

    /// Element nodes below `id` that did not resolve to a unit
    pub fn unresolved_leaves(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| {
                let node = self.node(n);
                node.element && node.unit.is_none()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MovementMode, UnitType, WeightClass};

    fn lance(tree: &mut ForceTree) -> NodeId {
        let root = tree.add_root(
            ForceNode::new("FS", 3025)
                .with_unit_type(UnitType::Mek)
                .with_echelon(3)
                .with_role(MissionRole::Command),
        );
        for i in 0..4 {
            let mut child = tree.create_child(root, i);
            child.element = true;
            tree.add_subforce(root, child);
        }
        root
    }

    #[test]
    fn test_create_child_inherits_constraints() {
        let mut tree = ForceTree::new();
        let root = tree.add_root(
            ForceNode::new("DC", 3050)
                .with_unit_type(UnitType::Tank)
                .with_weight_class(WeightClass::Heavy)
                .with_role(MissionRole::Command)
                .with_role(MissionRole::Recon)
                .with_rating("A"),
        );
        tree.node_mut(root).chassis.insert("Demolisher".into());
        tree.node_mut(root).movement_modes.insert(MovementMode::Tracked);

        let child = tree.create_child(root, 2);
        assert_eq!(child.index, 2);
        assert_eq!(child.faction, "DC");
        assert_eq!(child.weight_class, Some(WeightClass::Heavy));
        assert!(child.roles.contains(&MissionRole::Recon));
        assert!(!child.roles.contains(&MissionRole::Command));
        assert!(child.chassis.contains("Demolisher"));
        assert!(child.movement_modes.contains(&MovementMode::Tracked));
        assert!(!child.top_level);
        assert!(child.commander.is_none());
        assert!(child.subforces.is_empty());
    }

    #[test]
    fn test_parent_links() {
        let mut tree = ForceTree::new();
        let root = lance(&mut tree);
        let support = tree.create_child(root, 0);
        let attached = tree.add_attached(root, support);

        assert_eq!(tree.node(root).subforces().len(), 4);
        for &sub in tree.node(root).subforces() {
            assert_eq!(tree.node(sub).parent(), Some(root));
            assert!(!tree.node(sub).is_attachment());
        }
        assert!(tree.node(attached).is_attachment());
        assert_eq!(tree.children(root).count(), 5);
        assert!(tree.node(root).top_level);
    }

    #[test]
    fn test_unresolved_and_collect() {
        let mut tree = ForceTree::new();
        let root = lance(&mut tree);
        assert_eq!(tree.unresolved_leaves(root).len(), 4);
        assert!(tree.collect_units(root).is_empty());

        let first = tree.node(root).subforces()[0];
        let unit = UnitRecord::new("Atlas", "AS7-D", UnitType::Mek, Some(WeightClass::Assault), MovementMode::Biped);
        tree.node_mut(first).set_unit(unit);
        assert_eq!(tree.unresolved_leaves(root).len(), 3);
        assert_eq!(tree.collect_units(root)[0].chassis, "Atlas");
    }

    #[test]
    fn test_get_unknown_node() {
        let tree = ForceTree::new();
        assert!(matches!(tree.get(NodeId(3)), Err(OrbatError::NodeNotFound(_))));
    }
}
