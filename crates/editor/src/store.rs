use std::collections::HashMap;

use crate::error::GraphError;
use crate::geometry::Point;
use crate::node::{Node, NodeDataPatch, NodeId, NodeKind};

/// Authoritative set of placed nodes, indexed by id.
///
/// `order` is the paint order (later nodes draw on top) and the order nodes
/// are written to snapshots.
#[derive(Debug, Default, Clone)]
pub struct NodeStore {
    by_id: HashMap<NodeId, Node>,
    order: Vec<NodeId>,
    next_seq: u64,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Nodes in paint order, bottom first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Node> + '_ {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Creates a node of `kind` with default data at `position`.
    pub fn add_node(&mut self, kind: NodeKind, position: Point) -> NodeId {
        let id = self.fresh_id(kind);
        self.order.push(id.clone());
        self.by_id.insert(id.clone(), Node::new(id.clone(), kind, position));
        id
    }

    /// Inserts a fully formed node (loading a snapshot or template).
    pub fn insert(&mut self, node: Node) -> Result<(), GraphError> {
        if self.by_id.contains_key(&node.id) {
            return Err(GraphError::DuplicateNodeId(node.id));
        }
        self.order.push(node.id.clone());
        self.by_id.insert(node.id.clone(), node);
        Ok(())
    }

    /// Removes the node. Returns it, or `None` when it was not present.
    pub fn delete_node(&mut self, id: &str) -> Option<Node> {
        let node = self.by_id.remove(id)?;
        self.order.retain(|n| n.as_str() != id);
        Some(node)
    }

    pub fn update_node_data(&mut self, id: &str, patch: NodeDataPatch) -> Result<(), GraphError> {
        match self.by_id.get_mut(id) {
            Some(node) => node.apply(patch),
            None => Err(GraphError::NodeNotFound(NodeId::new(id))),
        }
    }

    /// Sets the position outright. Returns false when the node is absent.
    pub fn move_node(&mut self, id: &str, position: Point) -> bool {
        match self.by_id.get_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Moves `id` to the top of the paint order.
    pub fn raise(&mut self, id: &str) {
        if let Some(pos) = self.order.iter().position(|n| n.as_str() == id) {
            let id = self.order.remove(pos);
            self.order.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.order.clear();
    }

    fn fresh_id(&mut self, kind: NodeKind) -> NodeId {
        loop {
            self.next_seq += 1;
            let id = NodeId::new(format!("{}-{}", kind.as_str(), self.next_seq));
            if !self.by_id.contains_key(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeConfig, SkillConfig};

    #[test]
    fn add_assigns_unique_prefixed_ids() {
        let mut store = NodeStore::new();
        let a = store.add_node(NodeKind::Skill, Point::ZERO);
        let b = store.add_node(NodeKind::Skill, Point::ZERO);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("skill-"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn fresh_ids_avoid_inserted_nodes() {
        let mut store = NodeStore::new();
        store
            .insert(Node::new("trigger-1".into(), NodeKind::Trigger, Point::ZERO))
            .unwrap();
        let id = store.add_node(NodeKind::Trigger, Point::ZERO);
        assert_eq!(id.as_str(), "trigger-2");
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let mut store = NodeStore::new();
        let node = Node::new("x".into(), NodeKind::Api, Point::ZERO);
        store.insert(node.clone()).unwrap();
        assert_eq!(
            store.insert(node),
            Err(GraphError::DuplicateNodeId("x".into()))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_missing_is_noop() {
        let mut store = NodeStore::new();
        let id = store.add_node(NodeKind::Condition, Point::ZERO);
        assert!(store.delete_node(&id).is_some());
        assert!(store.delete_node(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn update_merges_config() {
        let mut store = NodeStore::new();
        let id = store.add_node(NodeKind::Skill, Point::ZERO);
        store
            .update_node_data(
                &id,
                NodeDataPatch::config(NodeConfig::Skill(SkillConfig {
                    skill_type: Some("x".into()),
                    template: None,
                })),
            )
            .unwrap();
        store
            .update_node_data(
                &id,
                NodeDataPatch::config(NodeConfig::Skill(SkillConfig {
                    skill_type: None,
                    template: Some("y".into()),
                })),
            )
            .unwrap();

        let config = &store.get(&id).unwrap().data.config;
        assert_eq!(
            config,
            &NodeConfig::Skill(SkillConfig {
                skill_type: Some("x".into()),
                template: Some("y".into()),
            })
        );
    }

    #[test]
    fn update_unknown_node_reports_not_found() {
        let mut store = NodeStore::new();
        assert_eq!(
            store.update_node_data("ghost", NodeDataPatch::name("x")),
            Err(GraphError::NodeNotFound("ghost".into()))
        );
    }

    #[test]
    fn raise_moves_to_top_of_paint_order() {
        let mut store = NodeStore::new();
        let a = store.add_node(NodeKind::Trigger, Point::ZERO);
        let b = store.add_node(NodeKind::Response, Point::ZERO);
        store.raise(&a);
        assert_eq!(store.ids(), &[b, a]);
    }
}
