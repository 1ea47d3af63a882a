//! Pointer gesture state machine.
//!
//! Exactly one gesture is active at a time; a press that arrives while a
//! gesture is in progress is ignored. The wheel is handled outside the state
//! machine and zooms in every state.

use tracing::debug;

use crate::config::{EditorConfig, PanModifier};
use crate::connection::ConnectionId;
use crate::edge::output_port_offset;
use crate::error::GraphError;
use crate::geometry::Point;
use crate::graph::AgentGraph;
use crate::node::NodeId;
use crate::viewport::{Viewport, ZoomDirection};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub alt: bool,
    pub shift: bool,
    pub control: bool,
    pub platform: bool,
}

impl Modifiers {
    pub fn has(&self, modifier: PanModifier) -> bool {
        match modifier {
            PanModifier::Alt => self.alt,
            PanModifier::Shift => self.shift,
            PanModifier::Control => self.control,
            PanModifier::Platform => self.platform,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

/// Input events in screen space.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: PointerButton,
        modifiers: Modifiers,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
    },
    Click {
        position: Point,
    },
    Wheel {
        direction: ZoomDirection,
    },
}

/// What lies under the pointer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HitTarget {
    Canvas,
    NodeBody(NodeId),
    OutputPort(NodeId),
    InputPort(NodeId),
}

/// An edge being dragged out of an output port, not yet committed.
#[derive(Clone, Debug, PartialEq)]
pub struct DraftConnection {
    pub source: NodeId,
    /// Port position relative to the source node's top-left.
    pub port_offset: Point,
    /// Live pointer position in canvas space.
    pub cursor: Point,
}

impl DraftConnection {
    /// Canvas-space anchor on the source node, if it still exists.
    pub fn anchor(&self, graph: &AgentGraph) -> Option<Point> {
        graph
            .node(&self.source)
            .map(|n| n.position + self.port_offset)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    DraggingNode {
        node: NodeId,
        /// Screen-space pointer offset from the node's rendered top-left.
        grab: Point,
        /// Whether any move has changed the node's position yet.
        moved: bool,
    },
    DraggingConnection(DraftConnection),
    Panning {
        last: Point,
    },
}

/// What an event changed, so the view knows whether to redraw or notify.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Unchanged,
    Redraw,
    SelectionChanged(Option<NodeId>),
    Connected(ConnectionId),
    /// A node drag ended with the node somewhere new.
    Moved(NodeId),
    Rejected(GraphError),
}

/// Mutable state a gesture may touch.
pub struct Scene<'a> {
    pub graph: &'a mut AgentGraph,
    pub viewport: &'a mut Viewport,
    pub selection: &'a mut Option<NodeId>,
    pub config: &'a EditorConfig,
}

#[derive(Clone, Debug, Default)]
pub struct Router {
    gesture: Gesture,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    pub fn draft(&self) -> Option<&DraftConnection> {
        match &self.gesture {
            Gesture::DraggingConnection(draft) => Some(draft),
            _ => None,
        }
    }

    /// Abandons the current gesture. Node moves already made stay.
    pub fn cancel(&mut self) -> Outcome {
        if self.is_idle() {
            return Outcome::Unchanged;
        }
        debug!(gesture = ?self.gesture, "gesture cancelled");
        self.gesture = Gesture::Idle;
        Outcome::Redraw
    }

    pub fn pointer_down(
        &mut self,
        position: Point,
        button: PointerButton,
        modifiers: Modifiers,
        hit: HitTarget,
        scene: Scene<'_>,
    ) -> Outcome {
        if !self.is_idle() {
            return Outcome::Unchanged;
        }

        let next = match (button, hit) {
            (PointerButton::Left, HitTarget::NodeBody(id)) => {
                let Some(node) = scene.graph.node(&id) else {
                    return Outcome::Unchanged;
                };
                let grab = position - scene.viewport.to_screen(node.position);
                scene.graph.raise(&id);
                Gesture::DraggingNode {
                    node: id,
                    grab,
                    moved: false,
                }
            }
            (PointerButton::Left, HitTarget::OutputPort(id)) => Gesture::DraggingConnection(
                DraftConnection {
                    source: id,
                    port_offset: output_port_offset(scene.config.node_size),
                    cursor: scene.viewport.to_canvas(position),
                },
            ),
            (PointerButton::Middle, HitTarget::Canvas) => Gesture::Panning { last: position },
            (PointerButton::Left, HitTarget::Canvas) if modifiers.has(scene.config.pan_modifier) => {
                Gesture::Panning { last: position }
            }
            _ => return Outcome::Unchanged,
        };

        debug!(gesture = ?next, "gesture started");
        self.gesture = next;
        Outcome::Redraw
    }

    pub fn pointer_move(&mut self, position: Point, scene: Scene<'_>) -> Outcome {
        match &mut self.gesture {
            Gesture::Idle => Outcome::Unchanged,
            Gesture::DraggingNode { node, grab, moved } => {
                let target = scene.viewport.to_canvas(position - *grab);
                let before = scene.graph.node(node).map(|n| n.position);
                if scene.graph.move_node(node, target) {
                    *moved |= before != Some(target);
                    Outcome::Redraw
                } else {
                    Outcome::Unchanged
                }
            }
            Gesture::DraggingConnection(draft) => {
                draft.cursor = scene.viewport.to_canvas(position);
                Outcome::Redraw
            }
            Gesture::Panning { last } => {
                scene.viewport.pan_by(position - *last);
                *last = position;
                Outcome::Redraw
            }
        }
    }

    pub fn pointer_up(&mut self, hit: HitTarget, scene: Scene<'_>) -> Outcome {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => Outcome::Unchanged,
            Gesture::DraggingNode { node, moved, .. } => {
                debug!(%node, moved, "node drag released");
                if moved {
                    Outcome::Moved(node)
                } else {
                    Outcome::Redraw
                }
            }
            Gesture::Panning { .. } => Outcome::Redraw,
            Gesture::DraggingConnection(draft) => match hit {
                HitTarget::InputPort(target) => {
                    match scene.graph.add_connection(&draft.source, &target) {
                        Ok(id) => Outcome::Connected(id),
                        Err(err) => Outcome::Rejected(err),
                    }
                }
                _ => {
                    debug!(source = %draft.source, "draft connection discarded");
                    Outcome::Redraw
                }
            },
        }
    }

    /// Click-to-select. Only meaningful while idle.
    pub fn click(&mut self, hit: HitTarget, scene: Scene<'_>) -> Outcome {
        if !self.is_idle() {
            return Outcome::Unchanged;
        }
        let selected = match hit {
            HitTarget::Canvas => None,
            HitTarget::NodeBody(id) | HitTarget::OutputPort(id) | HitTarget::InputPort(id) => {
                Some(id)
            }
        };
        if *scene.selection == selected {
            return Outcome::Unchanged;
        }
        *scene.selection = selected.clone();
        Outcome::SelectionChanged(selected)
    }

    pub fn wheel(&mut self, direction: ZoomDirection, viewport: &mut Viewport) -> Outcome {
        if viewport.zoom(direction) {
            Outcome::Redraw
        } else {
            Outcome::Unchanged
        }
    }
}
