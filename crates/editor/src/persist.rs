//! Persistence collaborators. The editor only produces and consumes
//! [`GraphSnapshot`]s; where they go is up to the sink the host wires in.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::snapshot::GraphSnapshot;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid graph document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Receives the graph on save.
pub trait GraphSink {
    fn save(&mut self, snapshot: &GraphSnapshot) -> Result<(), PersistError>;
}

/// Provides a previously saved graph.
pub trait GraphSource {
    fn load(&self) -> Result<Option<GraphSnapshot>, PersistError>;
}

/// Stores the graph as pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl GraphSink for JsonFileSink {
    fn save(&mut self, snapshot: &GraphSnapshot) -> Result<(), PersistError> {
        let json = snapshot.to_json()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        info!(
            path = %self.path.display(),
            nodes = snapshot.nodes.len(),
            connections = snapshot.connections.len(),
            "graph saved"
        );
        Ok(())
    }
}

impl GraphSource for JsonFileSink {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<GraphSnapshot>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => Ok(Some(GraphSnapshot::from_json(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Keeps every saved snapshot in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub saved: Vec<GraphSnapshot>,
}

impl GraphSink for MemorySink {
    fn save(&mut self, snapshot: &GraphSnapshot) -> Result<(), PersistError> {
        self.saved.push(snapshot.clone());
        Ok(())
    }
}

impl GraphSource for MemorySink {
    fn load(&self) -> Result<Option<GraphSnapshot>, PersistError> {
        Ok(self.saved.last().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::graph::AgentGraph;
    use crate::node::NodeKind;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("agentflow-editor-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn json_file_round_trips_graph() {
        let mut graph = AgentGraph::new();
        let a = graph.add_node(NodeKind::Trigger, Point::new(1.0, 2.0));
        let b = graph.add_node(NodeKind::Database, Point::new(3.0, 4.0));
        graph.add_connection(&a, &b).unwrap();
        let snapshot = graph.snapshot();

        let path = scratch_path("round-trip.json");
        let mut sink = JsonFileSink::new(&path);
        sink.save(&snapshot).unwrap();
        assert_eq!(sink.load().unwrap(), Some(snapshot));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let sink = JsonFileSink::new(scratch_path("never-written.json"));
        assert!(sink.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let path = scratch_path("corrupt.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        let sink = JsonFileSink::new(&path);
        assert!(matches!(sink.load(), Err(PersistError::Json(_))));
        let _ = fs::remove_file(&path);
    }
}
