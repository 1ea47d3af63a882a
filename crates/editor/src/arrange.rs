//! Automatic left-to-right layering of the graph.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::info;

use crate::config::EditorConfig;
use crate::geometry::Point;
use crate::graph::AgentGraph;
use crate::node::NodeId;

/// Top-left of the first column.
const ARRANGE_ORIGIN: Point = Point::new(50.0, 50.0);

/// Places every node in a column by its longest distance from a root, so
/// edges flow left to right. Graphs with a cycle fall back to a square grid.
pub fn arrange(graph: &mut AgentGraph, config: &EditorConfig) {
    let ids: Vec<NodeId> = graph.nodes().ids().to_vec();
    if ids.is_empty() {
        return;
    }

    let mut pg: DiGraph<usize, ()> = DiGraph::new();
    let indices: Vec<NodeIndex> = (0..ids.len()).map(|i| pg.add_node(i)).collect();
    let index_of: HashMap<&NodeId, NodeIndex> = ids.iter().zip(indices.iter().copied()).collect();

    for c in graph.connections().iter() {
        if let (Some(&s), Some(&t)) = (index_of.get(&c.source), index_of.get(&c.target)) {
            pg.add_edge(s, t, ());
        }
    }

    let column_width = config.node_size.width + config.arrange_gap.width;
    let row_height = config.node_size.height + config.arrange_gap.height;

    let positions: Vec<Point> = match toposort(&pg, None) {
        Ok(order) => {
            let mut layer = vec![0usize; ids.len()];
            for &n in &order {
                let depth = pg
                    .neighbors_directed(n, Direction::Incoming)
                    .map(|p| layer[pg[p]] + 1)
                    .max()
                    .unwrap_or(0);
                layer[pg[n]] = depth;
            }

            // Rows fill in topological order within each column.
            let mut rows_used: HashMap<usize, usize> = HashMap::new();
            let mut positions = vec![Point::ZERO; ids.len()];
            for &n in &order {
                let i = pg[n];
                let row = rows_used.entry(layer[i]).or_insert(0);
                positions[i] = ARRANGE_ORIGIN
                    + Point::new(layer[i] as f32 * column_width, *row as f32 * row_height);
                *row += 1;
            }
            positions
        }
        Err(_) => {
            let cols = (ids.len() as f32).sqrt().ceil() as usize;
            (0..ids.len())
                .map(|i| {
                    ARRANGE_ORIGIN
                        + Point::new(
                            (i % cols) as f32 * column_width,
                            (i / cols) as f32 * row_height,
                        )
                })
                .collect()
        }
    };

    for (id, position) in ids.iter().zip(positions) {
        graph.move_node(id, position);
    }
    info!(nodes = ids.len(), "graph arranged");
}
