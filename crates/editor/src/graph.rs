use tracing::debug;

use crate::connection::{Connection, ConnectionId, ConnectionStore};
use crate::error::GraphError;
use crate::geometry::Point;
use crate::node::{Node, NodeDataPatch, NodeId, NodeKind};
use crate::snapshot::GraphSnapshot;
use crate::store::NodeStore;

/// The node and connection stores together. Every mutation that spans both
/// (endpoint checks, cascade delete) goes through here so no connection can
/// reference a missing node.
#[derive(Debug, Default, Clone)]
pub struct AgentGraph {
    nodes: NodeStore,
    connections: ConnectionStore,
}

impl AgentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    pub fn connections(&self) -> &ConnectionStore {
        &self.connections
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn add_node(&mut self, kind: NodeKind, position: Point) -> NodeId {
        let id = self.nodes.add_node(kind, position);
        debug!(node = %id, %kind, "node added");
        id
    }

    /// Deletes the node and every connection touching it. Absent ids are a
    /// no-op returning `None`.
    pub fn delete_node(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.delete_node(id)?;
        let dropped = self.connections.remove_connections_touching(&node.id);
        debug!(node = %node.id, dropped, "node deleted");
        Some(node)
    }

    pub fn update_node_data(&mut self, id: &str, patch: NodeDataPatch) -> Result<(), GraphError> {
        self.nodes.update_node_data(id, patch).inspect_err(|err| {
            debug!(node = id, %err, "node update rejected");
        })
    }

    pub fn move_node(&mut self, id: &str, position: Point) -> bool {
        self.nodes.move_node(id, position)
    }

    pub fn raise(&mut self, id: &str) {
        self.nodes.raise(id);
    }

    pub fn add_connection(
        &mut self,
        source: &NodeId,
        target: &NodeId,
    ) -> Result<ConnectionId, GraphError> {
        let result = self.check_endpoints(source, target).and_then(|_| {
            self.connections
                .add_connection(source.clone(), target.clone())
        });
        match &result {
            Ok(id) => debug!(connection = %id, %source, %target, "connection added"),
            Err(err) => debug!(%source, %target, %err, "connection rejected"),
        }
        result
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.iter().cloned().collect(),
            connections: self.connections.iter().cloned().collect(),
        }
    }

    /// Rebuilds a graph from a snapshot. Entries that would break an
    /// invariant are skipped and reported.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> (Self, Vec<GraphError>) {
        let mut graph = Self::new();
        let mut skipped = Vec::new();

        for node in snapshot.nodes {
            if let Err(err) = graph.nodes.insert(node) {
                skipped.push(err);
            }
        }
        for connection in snapshot.connections {
            if let Err(err) = graph.insert_connection(connection) {
                skipped.push(err);
            }
        }
        (graph, skipped)
    }

    fn insert_connection(&mut self, connection: Connection) -> Result<ConnectionId, GraphError> {
        self.check_endpoints(&connection.source, &connection.target)?;
        self.connections.insert(connection)
    }

    fn check_endpoints(&self, source: &NodeId, target: &NodeId) -> Result<(), GraphError> {
        for id in [source, target] {
            if !self.nodes.contains(id) {
                return Err(GraphError::NodeNotFound(id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    fn two_nodes() -> (AgentGraph, NodeId, NodeId) {
        let mut graph = AgentGraph::new();
        let a = graph.add_node(NodeKind::Trigger, Point::new(100.0, 100.0));
        let b = graph.add_node(NodeKind::Skill, Point::new(400.0, 100.0));
        (graph, a, b)
    }

    #[test]
    fn cascade_delete_drops_connections() {
        let (mut graph, a, b) = two_nodes();
        graph.add_connection(&a, &b).unwrap();

        assert!(graph.delete_node(&a).is_some());
        assert!(graph.connections().is_empty());
        assert_eq!(graph.nodes().len(), 1);

        assert!(graph.delete_node(&a).is_none());
        assert_eq!(graph.nodes().len(), 1);
    }

    #[test]
    fn connection_to_missing_node_is_rejected() {
        let (mut graph, a, _) = two_nodes();
        let ghost = NodeId::new("ghost");
        assert_eq!(
            graph.add_connection(&a, &ghost),
            Err(GraphError::NodeNotFound(ghost))
        );
        assert!(graph.connections().is_empty());
    }

    #[test]
    #[traced_test]
    fn rejected_connection_is_logged() {
        let (mut graph, a, _) = two_nodes();
        assert!(graph.add_connection(&a, &a).is_err());
        assert!(logs_contain("connection rejected"));
    }

    #[test]
    fn snapshot_loading_skips_dangling_and_duplicate_edges() {
        let (mut graph, a, b) = two_nodes();
        graph.add_connection(&a, &b).unwrap();
        let mut snapshot = graph.snapshot();
        snapshot.connections.push(Connection {
            id: ConnectionId::new("dup"),
            source: a.clone(),
            target: b.clone(),
        });
        snapshot.connections.push(Connection {
            id: ConnectionId::new("dangling"),
            source: a.clone(),
            target: NodeId::new("gone"),
        });

        let (loaded, skipped) = AgentGraph::from_snapshot(snapshot);
        assert_eq!(skipped.len(), 2);
        assert_eq!(loaded.snapshot(), graph.snapshot());
    }

    #[test]
    fn snapshot_loading_rejects_reused_connection_id() {
        let mut graph = AgentGraph::new();
        for id in ["a", "b", "c"] {
            graph
                .nodes
                .insert(Node::new(NodeId::new(id), NodeKind::Skill, Point::ZERO))
                .unwrap();
        }
        let mut snapshot = graph.snapshot();
        for target in ["b", "c"] {
            snapshot.connections.push(Connection {
                id: ConnectionId::new("edge-1"),
                source: NodeId::new("a"),
                target: NodeId::new(target),
            });
        }

        let (mut loaded, skipped) = AgentGraph::from_snapshot(snapshot);
        assert_eq!(
            skipped,
            vec![GraphError::DuplicateConnectionId(ConnectionId::new("edge-1"))]
        );
        let listed: Vec<(&str, &str)> = loaded
            .connections()
            .iter()
            .map(|c| (c.source.as_str(), c.target.as_str()))
            .collect();
        assert_eq!(listed, vec![("a", "b")]);

        // The rejected pair stays free to connect under a fresh id.
        let id = loaded
            .add_connection(&NodeId::new("a"), &NodeId::new("c"))
            .unwrap();
        assert_ne!(id, ConnectionId::new("edge-1"));
        assert_eq!(loaded.connections().len(), 2);
    }
}
