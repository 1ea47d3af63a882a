use thiserror::Error;

use crate::connection::ConnectionId;
use crate::node::{ConfigField, NodeId, NodeKind};

/// A graph mutation that was refused. The graph is unchanged whenever one of
/// these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("node '{0}' cannot connect to itself")]
    SelfLoop(NodeId),

    #[error("a connection from '{from}' to '{to}' already exists")]
    DuplicateConnection { from: NodeId, to: NodeId },

    #[error("connection id '{0}' is already in use")]
    DuplicateConnectionId(ConnectionId),

    #[error("node '{0}' not found")]
    NodeNotFound(NodeId),

    #[error("node id '{0}' is already in use")]
    DuplicateNodeId(NodeId),

    #[error("cannot apply a {patch} config to a {node} node")]
    ConfigKindMismatch { node: NodeKind, patch: NodeKind },

    #[error("{field} does not apply to {kind} nodes")]
    FieldNotApplicable { kind: NodeKind, field: ConfigField },

    #[error("invalid value '{value}' for {field}")]
    InvalidFieldValue { field: ConfigField, value: String },

    #[error("unknown node type '{0}'")]
    UnknownKind(String),
}
