//! Starter graphs written in KDL.
//!
//! ```kdl
//! node "trigger-1" type="trigger" name="Incoming Message" x=100 y=100 {
//!     description "Fires for every user message"
//!     config event="message"
//! }
//! connect "trigger-1" "skill-1"
//! ```

use std::collections::HashSet;

use editor::{
    ConfigField, Connection, ConnectionId, GraphError, GraphSnapshot, Node, NodeConfig, NodeId,
    NodeKind, Point,
};
use kdl::{KdlDocument, KdlNode, KdlValue};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template is not valid KDL: {0}")]
    Parse(#[from] kdl::KdlError),

    #[error("node statement without an id")]
    MissingId,

    #[error("node '{0}' has no type")]
    MissingKind(String),

    #[error("node '{node}': {source}")]
    Node {
        node: String,
        #[source]
        source: GraphError,
    },

    #[error("node '{node}' has no config field '{field}'")]
    UnknownField { node: String, field: String },

    #[error("connect needs a source and a target")]
    MissingEndpoint,

    #[error("connection references unknown node '{0}'")]
    UnknownEndpoint(String),

    #[error("unexpected statement '{0}'")]
    UnexpectedStatement(String),
}

/// A bundled starter graph.
pub struct Template {
    pub name: &'static str,
    pub source: &'static str,
}

impl Template {
    pub fn snapshot(&self) -> Result<GraphSnapshot, TemplateError> {
        parse_template(self.source)
    }
}

pub const TEMPLATES: &[Template] = &[
    Template {
        name: "Support bot",
        source: include_str!("../templates/support-bot.kdl"),
    },
    Template {
        name: "Nightly report",
        source: include_str!("../templates/nightly-report.kdl"),
    },
];

pub fn parse_template(content: &str) -> Result<GraphSnapshot, TemplateError> {
    let doc = KdlDocument::parse(content)?;

    let mut snapshot = GraphSnapshot::default();
    let mut ids: HashSet<String> = HashSet::new();

    // Nodes first so `connect` may appear anywhere in the file.
    for statement in doc.nodes() {
        match statement.name().value() {
            "node" => {
                let node = parse_node(statement)?;
                if !ids.insert(node.id.to_string()) {
                    return Err(TemplateError::Node {
                        node: node.id.to_string(),
                        source: GraphError::DuplicateNodeId(node.id),
                    });
                }
                snapshot.nodes.push(node);
            }
            "connect" => {}
            other => return Err(TemplateError::UnexpectedStatement(other.to_string())),
        }
    }

    for statement in doc.nodes().iter().filter(|s| s.name().value() == "connect") {
        let mut endpoints = arguments(statement);
        let (Some(source), Some(target)) = (endpoints.next(), endpoints.next()) else {
            return Err(TemplateError::MissingEndpoint);
        };
        for endpoint in [&source, &target] {
            if !ids.contains(endpoint) {
                return Err(TemplateError::UnknownEndpoint(endpoint.clone()));
            }
        }
        let id = ConnectionId::new(format!("edge-{}", snapshot.connections.len() + 1));
        snapshot.connections.push(Connection {
            id,
            source: NodeId::new(source),
            target: NodeId::new(target),
        });
    }

    Ok(snapshot)
}

fn parse_node(statement: &KdlNode) -> Result<Node, TemplateError> {
    let id = arguments(statement).next().ok_or(TemplateError::MissingId)?;
    let kind: NodeKind = property(statement, "type")
        .ok_or_else(|| TemplateError::MissingKind(id.clone()))?
        .parse()
        .map_err(|source| TemplateError::Node {
            node: id.clone(),
            source,
        })?;

    let position = Point::new(
        number(statement, "x").unwrap_or(0.0),
        number(statement, "y").unwrap_or(0.0),
    );
    let mut node = Node::new(NodeId::new(id.clone()), kind, position);
    if let Some(name) = property(statement, "name") {
        node.data.name = name;
    }

    let Some(children) = statement.children() else {
        return Ok(node);
    };
    for child in children.nodes() {
        match child.name().value() {
            "description" => node.data.description = arguments(child).next(),
            "config" => {
                for (key, value) in properties(child) {
                    let field = ConfigField::from_key(&key).ok_or_else(|| {
                        TemplateError::UnknownField {
                            node: id.clone(),
                            field: key.clone(),
                        }
                    })?;
                    NodeConfig::field_patch(kind, field, &value)
                        .and_then(|patch| node.data.config.merge(patch))
                        .map_err(|source| TemplateError::Node {
                            node: id.clone(),
                            source,
                        })?;
                }
            }
            other => return Err(TemplateError::UnexpectedStatement(other.to_string())),
        }
    }
    Ok(node)
}

fn value_text(value: &KdlValue) -> Option<String> {
    if let Some(s) = value.as_string() {
        return Some(s.to_string());
    }
    if let Some(i) = value.as_integer() {
        return Some(i.to_string());
    }
    if let Some(f) = value.as_float() {
        return Some(f.to_string());
    }
    value.as_bool().map(|b| b.to_string())
}

/// Positional arguments as text.
fn arguments(node: &KdlNode) -> impl Iterator<Item = String> + '_ {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| value_text(e.value()))
}

fn properties(node: &KdlNode) -> impl Iterator<Item = (String, String)> + '_ {
    node.entries().iter().filter_map(|e| {
        let key = e.name()?.value().to_string();
        Some((key, value_text(e.value())?))
    })
}

fn property(node: &KdlNode, key: &str) -> Option<String> {
    properties(node).find(|(k, _)| k == key).map(|(_, v)| v)
}

fn number(node: &KdlNode, key: &str) -> Option<f32> {
    let entry = node
        .entries()
        .iter()
        .find(|e| e.name().map(|n| n.value() == key).unwrap_or(false))?;
    let value = entry.value();
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
        .map(|v| v as f32)
}
