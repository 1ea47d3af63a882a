//! gpui rendering of an agent graph: node cards, bezier edges, and the
//! pointer plumbing that feeds an [`editor::Editor`].

pub mod edge;
pub mod graph;
pub mod node;

pub use graph::{CancelGesture, CanvasEvent, DeleteSelected, GraphCanvas, KEY_CONTEXT};
pub use node::{NodePalette, kind_colors, render_node};
