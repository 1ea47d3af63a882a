use tracing::{debug, info};

use crate::arrange::arrange;
use crate::config::EditorConfig;
use crate::connection::{Connection, ConnectionId};
use crate::edge::{EdgePath, input_port_offset, output_port_offset};
use crate::error::GraphError;
use crate::geometry::{Point, Rect, Size};
use crate::graph::AgentGraph;
use crate::interaction::{DraftConnection, Gesture, HitTarget, Outcome, PointerEvent, Router, Scene};
use crate::node::{Node, NodeDataPatch, NodeId, NodeKind};
use crate::snapshot::GraphSnapshot;
use crate::viewport::Viewport;

/// An edge ready to draw, in canvas space.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeView {
    pub id: ConnectionId,
    pub source: NodeId,
    pub target: NodeId,
    pub path: EdgePath,
}

/// The graph canvas editor: graph, viewport, selection and the gesture
/// router behind one facade. Views feed it [`PointerEvent`]s and redraw from
/// its accessors.
#[derive(Debug, Clone)]
pub struct Editor {
    config: EditorConfig,
    graph: AgentGraph,
    viewport: Viewport,
    router: Router,
    selection: Option<NodeId>,
    added: usize,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            viewport: Viewport::new(config.zoom),
            config,
            graph: AgentGraph::new(),
            router: Router::new(),
            selection: None,
            added: 0,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn graph(&self) -> &AgentGraph {
        &self.graph
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn selection(&self) -> Option<&NodeId> {
        self.selection.as_ref()
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selection.as_ref().and_then(|id| self.graph.node(id))
    }

    pub fn gesture(&self) -> &Gesture {
        self.router.gesture()
    }

    pub fn draft(&self) -> Option<&DraftConnection> {
        self.router.draft()
    }

    /// Adds a node of `kind` at the next default placement and selects it.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let position = self.config.placement(self.added);
        self.added += 1;
        let id = self.graph.add_node(kind, position);
        self.selection = Some(id.clone());
        id
    }

    /// Deletes the node and its connections; clears the selection if it
    /// pointed at the node. Returns false when the id was unknown.
    pub fn delete_node(&mut self, id: &str) -> bool {
        if self.graph.delete_node(id).is_none() {
            return false;
        }
        if self.selection.as_deref() == Some(id) {
            self.selection = None;
        }
        if let Gesture::DraggingNode { node, .. } = self.router.gesture() {
            if node.as_str() == id {
                self.router.cancel();
            }
        }
        if let Some(draft) = self.router.draft() {
            if draft.source.as_str() == id {
                self.router.cancel();
            }
        }
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selection.clone() {
            Some(id) => self.delete_node(&id),
            None => false,
        }
    }

    pub fn update_node_data(&mut self, id: &str, patch: NodeDataPatch) -> Result<(), GraphError> {
        self.graph.update_node_data(id, patch)
    }

    pub fn move_node(&mut self, id: &str, position: Point) -> bool {
        self.graph.move_node(id, position)
    }

    pub fn add_connection(
        &mut self,
        source: &NodeId,
        target: &NodeId,
    ) -> Result<ConnectionId, GraphError> {
        self.graph.add_connection(source, target)
    }

    pub fn select(&mut self, id: Option<NodeId>) {
        self.selection = id.filter(|id| self.graph.node(id).is_some());
    }

    pub fn node_rect(&self, node: &Node) -> Rect {
        Rect::new(node.position, self.config.node_size)
    }

    /// Classifies a screen-space position. The topmost node wins; ports are
    /// checked before the body because they overhang its edges.
    pub fn hit_test(&self, screen: Point) -> HitTarget {
        let p = self.viewport.to_canvas(screen);
        let size = self.config.node_size;
        let radius = self.config.port_radius;

        for node in self.graph.nodes().iter().rev() {
            if p.distance(node.position + output_port_offset(size)) <= radius {
                return HitTarget::OutputPort(node.id.clone());
            }
            if p.distance(node.position + input_port_offset(size)) <= radius {
                return HitTarget::InputPort(node.id.clone());
            }
            if self.node_rect(node).contains(p) {
                return HitTarget::NodeBody(node.id.clone());
            }
        }
        HitTarget::Canvas
    }

    pub fn handle(&mut self, event: PointerEvent) -> Outcome {
        let hit = match &event {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position }
            | PointerEvent::Click { position } => self.hit_test(*position),
            PointerEvent::Move { .. } | PointerEvent::Wheel { .. } => HitTarget::Canvas,
        };

        let scene = Scene {
            graph: &mut self.graph,
            viewport: &mut self.viewport,
            selection: &mut self.selection,
            config: &self.config,
        };

        let outcome = match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => self
                .router
                .pointer_down(position, button, modifiers, hit, scene),
            PointerEvent::Move { position } => self.router.pointer_move(position, scene),
            PointerEvent::Up { .. } => self.router.pointer_up(hit, scene),
            PointerEvent::Click { .. } => self.router.click(hit, scene),
            PointerEvent::Wheel { direction } => self.router.wheel(direction, scene.viewport),
        };

        if let Outcome::Rejected(err) = &outcome {
            debug!(%err, "pointer action rejected");
        }
        outcome
    }

    /// Drops any in-progress gesture.
    pub fn cancel_gesture(&mut self) -> Outcome {
        self.router.cancel()
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    pub fn content_bounds(&self) -> Option<Rect> {
        Rect::union_all(self.graph.nodes().iter().map(|n| self.node_rect(n)))
    }

    pub fn fit_to_content(&mut self, container: Size) {
        if let Some(bounds) = self.content_bounds() {
            self.viewport.fit(bounds, container, self.config.fit_padding);
        }
    }

    pub fn arrange(&mut self) {
        arrange(&mut self.graph, &self.config);
    }

    fn edge_path(&self, from: Point, to: Point) -> EdgePath {
        EdgePath::between(
            from,
            to,
            self.config.edge_curvature,
            self.config.min_edge_handle,
        )
    }

    /// Committed edges from output port to input port, in canvas space.
    pub fn edges(&self) -> Vec<EdgeView> {
        let size = self.config.node_size;
        self.graph
            .connections()
            .iter()
            .filter_map(|c: &Connection| {
                let source = self.graph.node(&c.source)?;
                let target = self.graph.node(&c.target)?;
                Some(EdgeView {
                    id: c.id.clone(),
                    source: c.source.clone(),
                    target: c.target.clone(),
                    path: self.edge_path(
                        source.position + output_port_offset(size),
                        target.position + input_port_offset(size),
                    ),
                })
            })
            .collect()
    }

    /// Preview bezier of the in-progress connection, in canvas space.
    pub fn draft_path(&self) -> Option<EdgePath> {
        let draft = self.router.draft()?;
        let anchor = draft.anchor(&self.graph)?;
        Some(self.edge_path(anchor, draft.cursor))
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.snapshot()
    }

    /// Replaces the graph with `snapshot`, resetting selection and gesture.
    /// Returns the entries that were skipped.
    pub fn load(&mut self, snapshot: GraphSnapshot) -> Vec<GraphError> {
        let (graph, skipped) = AgentGraph::from_snapshot(snapshot);
        self.graph = graph;
        self.selection = None;
        self.router.cancel();
        self.added = 0;
        info!(
            nodes = self.graph.nodes().len(),
            connections = self.graph.connections().len(),
            skipped = skipped.len(),
            "graph loaded"
        );
        skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{Modifiers, PointerButton};
    use crate::viewport::ZoomDirection;

    fn down(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: PointerButton::Left,
            modifiers: Modifiers::default(),
        }
    }

    fn mv(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Move {
            position: Point::new(x, y),
        }
    }

    fn up(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Up {
            position: Point::new(x, y),
        }
    }

    fn click(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Click {
            position: Point::new(x, y),
        }
    }

    fn editor_with(positions: &[(NodeKind, Point)]) -> (Editor, Vec<NodeId>) {
        let mut editor = Editor::default();
        let ids = positions
            .iter()
            .map(|(kind, p)| {
                let id = editor.add_node(*kind);
                editor.move_node(&id, *p);
                id
            })
            .collect();
        editor.select(None);
        (editor, ids)
    }

    #[test]
    fn add_node_selects_and_cascades() {
        let mut editor = Editor::default();
        let a = editor.add_node(NodeKind::Trigger);
        let b = editor.add_node(NodeKind::Skill);
        assert_eq!(editor.selection(), Some(&b));
        let pa = editor.graph().node(&a).unwrap().position;
        let pb = editor.graph().node(&b).unwrap().position;
        assert_ne!(pa, pb);
    }

    #[test]
    fn hit_test_distinguishes_ports_and_body() {
        let (editor, ids) = editor_with(&[(NodeKind::Skill, Point::new(100.0, 100.0))]);
        let id = ids[0].clone();
        // Node is 200x72 at (100, 100); ports sit at mid-height.
        assert_eq!(editor.hit_test(Point::new(300.0, 136.0)), HitTarget::OutputPort(id.clone()));
        assert_eq!(editor.hit_test(Point::new(100.0, 136.0)), HitTarget::InputPort(id.clone()));
        assert_eq!(editor.hit_test(Point::new(150.0, 110.0)), HitTarget::NodeBody(id));
        assert_eq!(editor.hit_test(Point::new(20.0, 20.0)), HitTarget::Canvas);
    }

    #[test]
    fn hit_test_accounts_for_viewport() {
        let (mut editor, ids) = editor_with(&[(NodeKind::Skill, Point::new(100.0, 100.0))]);
        editor.viewport_mut().set_scale(2.0);
        editor.viewport_mut().set_offset(Point::new(-100.0, 0.0));
        // Canvas (150, 110) -> screen (200, 220).
        assert_eq!(
            editor.hit_test(Point::new(200.0, 220.0)),
            HitTarget::NodeBody(ids[0].clone())
        );
    }

    #[test]
    fn dragging_keeps_grab_offset() {
        let (mut editor, ids) = editor_with(&[(NodeKind::Trigger, Point::new(100.0, 100.0))]);
        editor.handle(down(130.0, 110.0));
        editor.handle(mv(230.0, 210.0));
        assert_eq!(editor.graph().node(&ids[0]).unwrap().position, Point::new(200.0, 200.0));
    }

    #[test]
    fn dragging_under_zoom_converts_to_canvas_space() {
        let (mut editor, ids) = editor_with(&[(NodeKind::Trigger, Point::new(100.0, 100.0))]);
        editor.viewport_mut().set_scale(2.0);
        // Node top-left renders at (200, 200).
        editor.handle(down(220.0, 210.0));
        editor.handle(mv(320.0, 210.0));
        assert_eq!(editor.graph().node(&ids[0]).unwrap().position, Point::new(150.0, 100.0));
    }

    #[test]
    fn press_on_empty_canvas_without_modifier_does_not_pan() {
        let mut editor = Editor::default();
        assert_eq!(editor.handle(down(10.0, 10.0)), Outcome::Unchanged);
        editor.handle(mv(60.0, 60.0));
        assert_eq!(editor.viewport().offset(), Point::ZERO);
    }

    #[test]
    fn middle_button_pans() {
        let mut editor = Editor::default();
        editor.handle(PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            button: PointerButton::Middle,
            modifiers: Modifiers::default(),
        });
        editor.handle(mv(40.0, 30.0));
        editor.handle(mv(50.0, 50.0));
        assert_eq!(editor.viewport().offset(), Point::new(40.0, 40.0));
        editor.handle(up(50.0, 50.0));
        assert!(editor.router.is_idle());
    }

    #[test]
    fn left_button_with_alt_pans() {
        let mut editor = Editor::default();
        editor.handle(PointerEvent::Down {
            position: Point::new(0.0, 0.0),
            button: PointerButton::Left,
            modifiers: Modifiers {
                alt: true,
                ..Default::default()
            },
        });
        assert!(matches!(editor.gesture(), Gesture::Panning { .. }));
    }

    #[test]
    fn second_press_during_gesture_is_ignored() {
        let (mut editor, _) = editor_with(&[(NodeKind::Trigger, Point::new(100.0, 100.0))]);
        editor.handle(down(130.0, 110.0));
        let before = editor.gesture().clone();
        let outcome = editor.handle(PointerEvent::Down {
            position: Point::new(500.0, 500.0),
            button: PointerButton::Middle,
            modifiers: Modifiers::default(),
        });
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(editor.gesture(), &before);
    }

    #[test]
    fn port_drag_connects_to_other_input() {
        let (mut editor, ids) = editor_with(&[
            (NodeKind::Trigger, Point::new(100.0, 100.0)),
            (NodeKind::Skill, Point::new(400.0, 100.0)),
        ]);
        editor.handle(down(300.0, 136.0));
        editor.handle(mv(350.0, 140.0));
        assert!(editor.draft_path().is_some());

        let outcome = editor.handle(up(400.0, 136.0));
        assert!(matches!(outcome, Outcome::Connected(_)));
        assert!(editor.draft().is_none());
        let edges = editor.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!((&edges[0].source, &edges[0].target), (&ids[0], &ids[1]));
    }

    #[test]
    fn port_drag_released_elsewhere_is_discarded() {
        let (mut editor, _) = editor_with(&[
            (NodeKind::Trigger, Point::new(100.0, 100.0)),
            (NodeKind::Skill, Point::new(400.0, 100.0)),
        ]);
        editor.handle(down(300.0, 136.0));
        assert_eq!(editor.handle(up(700.0, 700.0)), Outcome::Redraw);
        assert!(editor.graph().connections().is_empty());
    }

    #[test]
    fn port_drag_onto_own_input_is_rejected() {
        let (mut editor, ids) = editor_with(&[(NodeKind::Trigger, Point::new(100.0, 100.0))]);
        editor.handle(down(300.0, 136.0));
        assert_eq!(
            editor.handle(up(100.0, 136.0)),
            Outcome::Rejected(GraphError::SelfLoop(ids[0].clone()))
        );
        assert!(editor.graph().connections().is_empty());
        assert!(editor.draft().is_none());
    }

    #[test]
    fn duplicate_drag_is_reported_but_harmless() {
        let (mut editor, _) = editor_with(&[
            (NodeKind::Trigger, Point::new(100.0, 100.0)),
            (NodeKind::Skill, Point::new(400.0, 100.0)),
        ]);
        editor.handle(down(300.0, 136.0));
        editor.handle(up(400.0, 136.0));
        editor.handle(down(300.0, 136.0));
        let outcome = editor.handle(up(400.0, 136.0));
        assert!(matches!(
            outcome,
            Outcome::Rejected(GraphError::DuplicateConnection { .. })
        ));
        assert_eq!(editor.graph().connections().len(), 1);
    }

    #[test]
    fn click_selects_and_clears() {
        let (mut editor, ids) = editor_with(&[(NodeKind::Condition, Point::new(100.0, 100.0))]);
        assert_eq!(
            editor.handle(click(150.0, 120.0)),
            Outcome::SelectionChanged(Some(ids[0].clone()))
        );
        assert_eq!(editor.handle(click(150.0, 120.0)), Outcome::Unchanged);
        assert_eq!(editor.handle(click(900.0, 900.0)), Outcome::SelectionChanged(None));
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn drag_release_reports_move_only_when_node_moved() {
        let (mut editor, ids) = editor_with(&[(NodeKind::Trigger, Point::new(100.0, 100.0))]);
        editor.handle(down(130.0, 110.0));
        assert_eq!(editor.handle(up(130.0, 110.0)), Outcome::Redraw);

        editor.handle(down(130.0, 110.0));
        editor.handle(mv(180.0, 110.0));
        assert_eq!(editor.handle(up(180.0, 110.0)), Outcome::Moved(ids[0].clone()));
        assert!(editor.router.is_idle());
    }

    #[test]
    fn wheel_zooms_during_drag() {
        let (mut editor, _) = editor_with(&[(NodeKind::Trigger, Point::new(100.0, 100.0))]);
        editor.handle(down(130.0, 110.0));
        editor.handle(PointerEvent::Wheel {
            direction: ZoomDirection::Out,
        });
        assert!((editor.viewport().scale() - 0.9).abs() < 1e-6);
        assert!(matches!(editor.gesture(), Gesture::DraggingNode { .. }));
    }

    #[test]
    fn deleting_dragged_node_ends_gesture() {
        let (mut editor, ids) = editor_with(&[(NodeKind::Trigger, Point::new(100.0, 100.0))]);
        editor.handle(down(130.0, 110.0));
        editor.select(Some(ids[0].clone()));
        assert!(editor.delete_selected());
        assert!(editor.router.is_idle());
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn select_ignores_unknown_ids() {
        let mut editor = Editor::default();
        editor.select(Some(NodeId::new("ghost")));
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn fit_to_content_without_nodes_keeps_view() {
        let mut editor = Editor::default();
        editor.viewport_mut().set_scale(1.5);
        editor.fit_to_content(Size::new(800.0, 600.0));
        assert_eq!(editor.viewport().scale(), 1.5);
    }
}
