use editor::{
    EdgeView, Editor, GraphError, GraphSnapshot, Modifiers, NodeDataPatch, NodeId,
    NodeKind, Outcome, PointerButton, PointerEvent, ZoomDirection,
};
use gpui::*;
use gpui::{Context, IntoElement, ParentElement, Render, Styled, Window, canvas, div};
use gpui_component::ActiveTheme;
use tracing::debug;

use crate::edge::{EDGE_SEGMENTS, EdgeEmphasis, EdgeStroke, push_polyline};
use crate::node::{INPUT_PORT_COLOR, NodePalette, OUTPUT_PORT_COLOR, render_node};

actions!(graph_canvas, [DeleteSelected, CancelGesture]);

/// Key context the canvas registers, for binding [`DeleteSelected`] and
/// [`CancelGesture`].
pub const KEY_CONTEXT: &str = "GraphCanvas";

/// Events the canvas reports to its host.
#[derive(Clone, Debug)]
pub enum CanvasEvent {
    SelectionChanged(Option<NodeId>),
    /// Nodes or connections were added, removed, or edited.
    GraphChanged,
    /// A connection attempt was refused. The graph is unchanged.
    ConnectionRejected(GraphError),
}

impl EventEmitter<CanvasEvent> for GraphCanvas {}

/// gpui view over an [`Editor`]. All graph state lives in the editor; this
/// view only converts window input into pointer events and paints.
pub struct GraphCanvas {
    editor: Editor,
    pub container_offset: Point<Pixels>,
    pub container_size: Size<Pixels>,
    /// Where the current press started, for telling clicks from drags.
    press_start: Option<Point<Pixels>>,
    press_travelled: bool,
    focus_handle: FocusHandle,
}

fn to_canvas_point(p: Point<Pixels>) -> editor::Point {
    editor::Point::new((p.x / px(1.0)) as f32, (p.y / px(1.0)) as f32)
}

fn to_pixels(p: editor::Point) -> Point<Pixels> {
    point(px(p.x), px(p.y))
}

fn to_modifiers(m: &gpui::Modifiers) -> Modifiers {
    Modifiers {
        alt: m.alt,
        shift: m.shift,
        control: m.control,
        platform: m.platform,
    }
}

impl GraphCanvas {
    pub fn new(editor: Editor, cx: &mut Context<Self>) -> Self {
        Self {
            editor,
            container_offset: point(px(0.0), px(0.0)),
            container_size: size(px(0.0), px(0.0)),
            press_start: None,
            press_travelled: false,
            focus_handle: cx.focus_handle(),
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn add_node(&mut self, kind: NodeKind, cx: &mut Context<Self>) -> NodeId {
        let id = self.editor.add_node(kind);
        cx.emit(CanvasEvent::GraphChanged);
        cx.emit(CanvasEvent::SelectionChanged(Some(id.clone())));
        cx.notify();
        id
    }

    pub fn delete_selected(&mut self, cx: &mut Context<Self>) {
        if self.editor.delete_selected() {
            cx.emit(CanvasEvent::GraphChanged);
            cx.emit(CanvasEvent::SelectionChanged(None));
            cx.notify();
        }
    }

    pub fn update_node_data(
        &mut self,
        id: &str,
        patch: NodeDataPatch,
        cx: &mut Context<Self>,
    ) -> Result<(), GraphError> {
        self.editor.update_node_data(id, patch)?;
        cx.emit(CanvasEvent::GraphChanged);
        cx.notify();
        Ok(())
    }

    pub fn load(&mut self, snapshot: GraphSnapshot, cx: &mut Context<Self>) -> Vec<GraphError> {
        let skipped = self.editor.load(snapshot);
        cx.emit(CanvasEvent::GraphChanged);
        cx.emit(CanvasEvent::SelectionChanged(None));
        cx.notify();
        skipped
    }

    pub fn zoom(&mut self, direction: ZoomDirection, cx: &mut Context<Self>) {
        let outcome = self.editor.handle(PointerEvent::Wheel { direction });
        self.apply(outcome, cx);
    }

    pub fn reset_view(&mut self, cx: &mut Context<Self>) {
        self.editor.reset_view();
        cx.notify();
    }

    pub fn fit_to_content(&mut self, cx: &mut Context<Self>) {
        if self.container_size.width <= px(0.0) {
            return;
        }
        let container = editor::Size::new(
            (self.container_size.width / px(1.0)) as f32,
            (self.container_size.height / px(1.0)) as f32,
        );
        self.editor.fit_to_content(container);
        cx.notify();
    }

    pub fn arrange(&mut self, cx: &mut Context<Self>) {
        self.editor.arrange();
        self.fit_to_content(cx);
        cx.emit(CanvasEvent::GraphChanged);
        cx.notify();
    }

    fn apply(&mut self, outcome: Outcome, cx: &mut Context<Self>) {
        match outcome {
            Outcome::Unchanged => return,
            Outcome::Redraw => {}
            Outcome::SelectionChanged(selection) => {
                cx.emit(CanvasEvent::SelectionChanged(selection));
            }
            Outcome::Connected(_) | Outcome::Moved(_) => cx.emit(CanvasEvent::GraphChanged),
            Outcome::Rejected(err) => {
                debug!(%err, "connection rejected on canvas");
                cx.emit(CanvasEvent::ConnectionRejected(err));
            }
        }
        cx.notify();
    }

    /// Converts a window position to container-local canvas input.
    fn local(&self, position: Point<Pixels>) -> editor::Point {
        to_canvas_point(point(
            position.x - self.container_offset.x,
            position.y - self.container_offset.y,
        ))
    }

    fn on_press(&mut self, e: &MouseDownEvent, window: &mut Window, cx: &mut Context<Self>) {
        self.focus_handle.focus(window);
        let button = match e.button {
            MouseButton::Left => PointerButton::Left,
            MouseButton::Middle => PointerButton::Middle,
            _ => PointerButton::Right,
        };
        self.press_start = Some(e.position);
        self.press_travelled = false;
        let outcome = self.editor.handle(PointerEvent::Down {
            position: self.local(e.position),
            button,
            modifiers: to_modifiers(&e.modifiers),
        });
        self.apply(outcome, cx);
    }

    fn on_release(&mut self, e: &MouseUpEvent, cx: &mut Context<Self>) {
        let position = self.local(e.position);
        let outcome = self.editor.handle(PointerEvent::Up { position });
        self.apply(outcome, cx);

        let was_click = self.press_start.take().is_some() && !self.press_travelled;
        if was_click && e.button == MouseButton::Left {
            let outcome = self.editor.handle(PointerEvent::Click { position });
            self.apply(outcome, cx);
        }
    }

    fn on_pointer_move(&mut self, e: &MouseMoveEvent, cx: &mut Context<Self>) {
        // Release happened outside the canvas; finish the gesture here.
        if !matches!(self.editor.gesture(), editor::Gesture::Idle) && e.pressed_button.is_none() {
            self.press_start = None;
            let outcome = self.editor.handle(PointerEvent::Up {
                position: self.local(e.position),
            });
            self.apply(outcome, cx);
            return;
        }

        if let Some(start) = self.press_start {
            let slop = px(self.editor.config().click_slop);
            if (e.position.x - start.x).abs() > slop || (e.position.y - start.y).abs() > slop {
                self.press_travelled = true;
            }
        }

        let outcome = self.editor.handle(PointerEvent::Move {
            position: self.local(e.position),
        });
        self.apply(outcome, cx);
    }

    fn on_delete_selected(&mut self, _: &DeleteSelected, _: &mut Window, cx: &mut Context<Self>) {
        self.delete_selected(cx);
    }

    fn on_cancel_gesture(&mut self, _: &CancelGesture, _: &mut Window, cx: &mut Context<Self>) {
        self.press_start = None;
        let outcome = self.editor.cancel_gesture();
        self.apply(outcome, cx);
    }

    /// Edges in container-local screen space, flattened for painting.
    fn edge_strokes(&self) -> Vec<EdgeStroke> {
        let viewport = self.editor.viewport();
        let selected = self.editor.selection();
        let mut strokes: Vec<EdgeStroke> = self
            .editor
            .edges()
            .into_iter()
            .map(|edge: EdgeView| {
                let emphasis = match selected {
                    Some(id) if *id == edge.source => EdgeEmphasis::Outgoing,
                    Some(id) if *id == edge.target => EdgeEmphasis::Incoming,
                    _ => EdgeEmphasis::None,
                };
                let screen = edge.path.map(|p| viewport.to_screen(p));
                EdgeStroke {
                    points: screen.sample(EDGE_SEGMENTS).into_iter().map(to_pixels).collect(),
                    emphasis,
                }
            })
            .collect();

        if let Some(draft) = self.editor.draft_path() {
            let screen = draft.map(|p| viewport.to_screen(p));
            strokes.push(EdgeStroke {
                points: screen.sample(EDGE_SEGMENTS).into_iter().map(to_pixels).collect(),
                emphasis: EdgeEmphasis::Draft,
            });
        }
        strokes
    }
}

fn parameter_button<F>(
    label: &str,
    text_color: Hsla,
    border_color: Hsla,
    cx: &mut Context<GraphCanvas>,
    on_press: F,
) -> Div
where
    F: Fn(&mut GraphCanvas, &mut Context<GraphCanvas>) + 'static,
{
    div()
        .child(label.to_string())
        .px(px(8.0))
        .py(px(4.0))
        .text_color(text_color)
        .border(px(1.0))
        .border_color(border_color)
        .rounded(px(4.0))
        .cursor_pointer()
        .on_mouse_down(
            gpui::MouseButton::Left,
            cx.listener(move |this, _event: &gpui::MouseDownEvent, _window, cx| {
                // Keep the press from reaching the canvas underneath.
                cx.stop_propagation();
                on_press(this, cx);
            }),
        )
}

impl Render for GraphCanvas {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        // Track container bounds so window positions can be made local.
        let entity = cx.entity();
        let bounds_tracker = canvas(
            |_bounds, _window, _cx| (),
            move |bounds, _state, _window, cx| {
                cx.update_entity(&entity, |this, cx| {
                    let size_changed = this.container_size != bounds.size;
                    let first_layout = this.container_size.width <= px(0.0);
                    this.container_offset = bounds.origin;
                    this.container_size = bounds.size;
                    if size_changed && first_layout {
                        this.fit_to_content(cx);
                    }
                });
            },
        )
        .absolute()
        .size_full();

        // All edges in one paint pass, emphasized ones on top.
        let zoom = self.editor.viewport().scale();
        let strokes = self.edge_strokes();
        let edges_canvas = canvas(
            |_bounds, _window, _cx| (),
            move |bounds, _state, window, _cx| {
                let origin = bounds.origin;
                let thickness = (1.5f32 * zoom).max(1.0);

                let mut normal_path = gpui::Path::new(origin);
                let mut outgoing_path = gpui::Path::new(origin);
                let mut incoming_path = gpui::Path::new(origin);
                let mut draft_path = gpui::Path::new(origin);
                for stroke in &strokes {
                    let (path, width) = match stroke.emphasis {
                        EdgeEmphasis::None => (&mut normal_path, thickness),
                        EdgeEmphasis::Outgoing => (&mut outgoing_path, thickness * 2.0),
                        EdgeEmphasis::Incoming => (&mut incoming_path, thickness * 2.0),
                        EdgeEmphasis::Draft => (&mut draft_path, thickness),
                    };
                    push_polyline(path, origin, &stroke.points, width / 2.0);
                }
                window.paint_path(normal_path, rgb(0x6a6a6a));
                window.paint_path(outgoing_path, rgb(OUTPUT_PORT_COLOR));
                window.paint_path(incoming_path, rgb(INPUT_PORT_COLOR));
                window.paint_path(draft_path, rgba(0xff8844a0));
            },
        )
        .absolute()
        .size_full();

        let theme = cx.theme();
        let palette = NodePalette {
            text: theme.foreground,
            muted_text: theme.muted_foreground,
            border: theme.border,
            background: theme.secondary,
            selected_border: theme.ring,
        };
        let text_color = theme.foreground;
        let border_color = theme.border;
        let panel_bg = theme.background.opacity(0.9);

        let viewport = self.editor.viewport();
        let config = self.editor.config();
        let node_size = editor::Size::new(
            config.node_size.width * zoom,
            config.node_size.height * zoom,
        );
        let selected = self.editor.selection().cloned();
        let nodes: Vec<Div> = self
            .editor
            .graph()
            .nodes()
            .iter()
            .map(|node| {
                render_node(
                    node,
                    viewport.to_screen(node.position),
                    node_size,
                    zoom,
                    config.port_radius,
                    selected.as_ref() == Some(&node.id),
                    palette,
                )
            })
            .collect();

        let graph_layer = div()
            .relative()
            .size_full()
            .child(bounds_tracker)
            .child(edges_canvas)
            .children(nodes);

        let zoom_percent = (zoom * 100.0).round() as i32;
        let controls_panel = {
            let zoom_out = parameter_button("-", text_color, border_color, cx, |this, cx| {
                this.zoom(ZoomDirection::Out, cx);
            });
            let zoom_in = parameter_button("+", text_color, border_color, cx, |this, cx| {
                this.zoom(ZoomDirection::In, cx);
            });
            let fit = parameter_button("Fit", text_color, border_color, cx, |this, cx| {
                this.fit_to_content(cx);
            });
            let reset = parameter_button("Reset", text_color, border_color, cx, |this, cx| {
                this.reset_view(cx);
            });
            let arrange = parameter_button("Arrange", text_color, border_color, cx, |this, cx| {
                this.arrange(cx);
            });

            div()
                .absolute()
                .top(px(8.0))
                .left(px(8.0))
                .text_color(text_color)
                .bg(panel_bg)
                .border(px(1.0))
                .border_color(border_color)
                .rounded(px(6.0))
                .p(px(8.0))
                .flex()
                .items_center()
                .gap_2()
                .child(zoom_out)
                .child(format!("{}%", zoom_percent))
                .child(zoom_in)
                .child(div().w(px(8.0)))
                .child(fit)
                .child(reset)
                .child(arrange)
        };

        div()
            .id("graph-canvas")
            .size_full()
            .relative()
            .overflow_hidden()
            .track_focus(&self.focus_handle)
            .key_context(KEY_CONTEXT)
            .on_action(cx.listener(Self::on_delete_selected))
            .on_action(cx.listener(Self::on_cancel_gesture))
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, e: &MouseDownEvent, window, cx| this.on_press(e, window, cx)),
            )
            .on_mouse_down(
                MouseButton::Middle,
                cx.listener(|this, e: &MouseDownEvent, window, cx| this.on_press(e, window, cx)),
            )
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, e: &MouseUpEvent, _window, cx| this.on_release(e, cx)),
            )
            .on_mouse_up(
                MouseButton::Middle,
                cx.listener(|this, e: &MouseUpEvent, _window, cx| this.on_release(e, cx)),
            )
            .on_mouse_move(
                cx.listener(|this, e: &MouseMoveEvent, _window, cx| this.on_pointer_move(e, cx)),
            )
            .on_scroll_wheel(cx.listener(|this, e: &ScrollWheelEvent, _window, cx| {
                let dy = e.delta.pixel_delta(px(16.0)).y;
                if dy == px(0.0) {
                    return;
                }
                let direction = if dy > px(0.0) {
                    ZoomDirection::In
                } else {
                    ZoomDirection::Out
                };
                let outcome = this.editor.handle(PointerEvent::Wheel { direction });
                this.apply(outcome, cx);
            }))
            .child(graph_layer)
            .child(controls_panel)
    }
}
