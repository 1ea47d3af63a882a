use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::node::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directed edge from `source`'s output port to `target`'s input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: NodeId,
    pub target: NodeId,
}

impl Connection {
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

/// Owns every edge and keeps them free of self-loops and duplicate pairs.
///
/// Whether the endpoints exist is checked by [`crate::graph::AgentGraph`], which
/// owns both stores.
#[derive(Debug, Default, Clone)]
pub struct ConnectionStore {
    by_id: HashMap<ConnectionId, Connection>,
    pairs: HashSet<(NodeId, NodeId)>,
    order: Vec<ConnectionId>,
    next_seq: u64,
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.by_id.get(id)
    }

    pub fn contains_pair(&self, source: &NodeId, target: &NodeId) -> bool {
        self.pairs.contains(&(source.clone(), target.clone()))
    }

    /// Connections in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn add_connection(
        &mut self,
        source: NodeId,
        target: NodeId,
    ) -> Result<ConnectionId, GraphError> {
        let id = self.fresh_id();
        self.insert(Connection { id, source, target })
    }

    /// Inserts a connection that already carries an id (loading a snapshot).
    pub fn insert(&mut self, connection: Connection) -> Result<ConnectionId, GraphError> {
        if self.by_id.contains_key(&connection.id) {
            return Err(GraphError::DuplicateConnectionId(connection.id));
        }
        if connection.source == connection.target {
            return Err(GraphError::SelfLoop(connection.source));
        }
        let pair = (connection.source.clone(), connection.target.clone());
        if self.pairs.contains(&pair) {
            return Err(GraphError::DuplicateConnection {
                from: pair.0,
                to: pair.1,
            });
        }

        let id = connection.id.clone();
        self.pairs.insert(pair);
        self.order.push(id.clone());
        self.by_id.insert(id.clone(), connection);
        Ok(id)
    }

    /// Removes every connection with `node` as source or target.
    pub fn remove_connections_touching(&mut self, node: &NodeId) -> usize {
        let doomed: Vec<ConnectionId> = self
            .iter()
            .filter(|c| c.touches(node))
            .map(|c| c.id.clone())
            .collect();

        for id in &doomed {
            if let Some(c) = self.by_id.remove(id) {
                self.pairs.remove(&(c.source, c.target));
            }
        }
        self.order.retain(|id| self.by_id.contains_key(id));
        doomed.len()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.pairs.clear();
        self.order.clear();
    }

    fn fresh_id(&mut self) -> ConnectionId {
        loop {
            self.next_seq += 1;
            let id = ConnectionId::new(format!("edge-{}", self.next_seq));
            if !self.by_id.contains_key(&id) {
                return id;
            }
        }
    }
}
