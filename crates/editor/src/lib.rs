//! Headless core of the agent flow builder's graph canvas.
//!
//! The editor owns a graph of typed nodes and directed connections, a
//! pan/zoom [`Viewport`], the current selection and a pointer gesture
//! [`Router`](interaction::Router). Views translate their input into
//! [`PointerEvent`]s, hand them to [`Editor::handle`], and redraw from the
//! editor's accessors. Nothing here depends on a UI toolkit.
//!
//! Invariants held by every mutation path:
//! - no connection from a node to itself,
//! - at most one connection per (source, target) pair,
//! - every connection references nodes that exist; deleting a node deletes
//!   its connections.

pub mod arrange;
pub mod config;
pub mod connection;
pub mod edge;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod interaction;
pub mod node;
pub mod persist;
pub mod snapshot;
pub mod store;
pub mod viewport;

pub use config::{ConfigError, EditorConfig, PanModifier, ZoomLimits};
pub use connection::{Connection, ConnectionId};
pub use edge::EdgePath;
pub use editor::{EdgeView, Editor};
pub use error::GraphError;
pub use geometry::{Point, Rect, Size};
pub use graph::AgentGraph;
pub use interaction::{
    DraftConnection, Gesture, HitTarget, Modifiers, Outcome, PointerButton, PointerEvent,
};
pub use node::{
    ApiConfig, ConditionConfig, ConfigField, DatabaseConfig, DbOperation, HttpMethod, Node,
    NodeConfig, NodeData, NodeDataPatch, NodeId, NodeKind, ResponseConfig, SkillConfig,
    TriggerConfig, TriggerEvent,
};
pub use persist::{GraphSink, GraphSource, JsonFileSink, MemorySink, PersistError};
pub use snapshot::GraphSnapshot;
pub use viewport::{Viewport, ZoomDirection};
