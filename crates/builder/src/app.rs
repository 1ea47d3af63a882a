use anyhow::Context as _;
use editor::{Editor, GraphSink, GraphSnapshot, NodeKind};
use gpui::*;
use gpui_component::{
    ActiveTheme, Sizable as _, h_flex,
    button::{Button, ButtonVariants as _},
    resizable::{h_resizable, resizable_panel},
    v_flex,
};
use graphview::{CanvasEvent, GraphCanvas};
use tracing::{debug, error, info, warn};

use crate::properties::PropertiesPanel;
use crate::template::{TEMPLATES, Template};

/// Root view: node palette, canvas, and properties side by side under a
/// toolbar.
pub struct BuilderApp {
    canvas: Entity<GraphCanvas>,
    properties: Entity<PropertiesPanel>,
    sink: Box<dyn GraphSink>,
    status: SharedString,
    _subscriptions: Vec<Subscription>,
}

impl BuilderApp {
    pub fn new(
        editor: Editor,
        sink: Box<dyn GraphSink>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let canvas = cx.new(|cx| GraphCanvas::new(editor, cx));
        let properties = cx.new(|cx| PropertiesPanel::new(canvas.clone(), window, cx));
        let _subscriptions = vec![cx.subscribe_in(&canvas, window, Self::on_canvas_event)];

        Self {
            canvas,
            properties,
            sink,
            status: SharedString::default(),
            _subscriptions,
        }
    }

    fn on_canvas_event(
        &mut self,
        _canvas: &Entity<GraphCanvas>,
        event: &CanvasEvent,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        match event {
            CanvasEvent::SelectionChanged(selection) => {
                let selection = selection.clone();
                self.properties
                    .update(cx, |panel, cx| panel.show(selection, window, cx));
            }
            CanvasEvent::GraphChanged => {
                self.status = SharedString::default();
                cx.notify();
            }
            // Rejected connections leave no trace in the UI.
            CanvasEvent::ConnectionRejected(err) => debug!(%err, "connection not created"),
        }
    }

    fn save(&mut self, cx: &mut Context<Self>) -> anyhow::Result<usize> {
        let snapshot = self.canvas.read(cx).editor().snapshot();
        self.sink.save(&snapshot).context("failed to save graph")?;
        Ok(snapshot.nodes.len())
    }

    fn on_save(&mut self, cx: &mut Context<Self>) {
        self.status = match self.save(cx) {
            Ok(count) => format!("Saved {count} nodes").into(),
            Err(err) => {
                error!("{err:#}");
                "Save failed".into()
            }
        };
        cx.notify();
    }

    fn load_snapshot(&mut self, snapshot: GraphSnapshot, cx: &mut Context<Self>) {
        let skipped = self.canvas.update(cx, |canvas, cx| {
            let skipped = canvas.load(snapshot, cx);
            canvas.fit_to_content(cx);
            skipped
        });
        for err in skipped {
            warn!(%err, "graph entry skipped");
        }
    }

    fn load_template(&mut self, template: &Template, cx: &mut Context<Self>) {
        match template.snapshot() {
            Ok(snapshot) => {
                self.load_snapshot(snapshot, cx);
                info!(template = template.name, "template loaded");
            }
            Err(err) => error!(template = template.name, %err, "template failed to parse"),
        }
    }
}

impl Render for BuilderApp {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let background = theme.background;
        let foreground = theme.foreground;
        let muted = theme.muted_foreground;
        let border = theme.border;

        let toolbar = h_flex()
            .w_full()
            .p_2()
            .gap_2()
            .border_b_1()
            .border_color(border)
            .child(
                Button::new("new")
                    .label("New")
                    .small()
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.load_snapshot(GraphSnapshot::default(), cx);
                    })),
            )
            .children(TEMPLATES.iter().enumerate().map(|(ix, template)| {
                Button::new(("template", ix))
                    .label(template.name)
                    .small()
                    .ghost()
                    .on_click(cx.listener(move |this, _, _window, cx| {
                        this.load_template(&TEMPLATES[ix], cx);
                    }))
            }))
            .child(div().flex_1())
            .child(div().text_sm().text_color(muted).child(self.status.clone()))
            .child(
                Button::new("arrange")
                    .label("Arrange")
                    .small()
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.canvas.update(cx, |canvas, cx| canvas.arrange(cx));
                    })),
            )
            .child(
                Button::new("delete")
                    .label("Delete")
                    .small()
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.canvas.update(cx, |canvas, cx| canvas.delete_selected(cx));
                    })),
            )
            .child(
                Button::new("reset-view")
                    .label("Reset view")
                    .small()
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.canvas.update(cx, |canvas, cx| canvas.reset_view(cx));
                    })),
            )
            .child(
                Button::new("save")
                    .label("Save")
                    .small()
                    .primary()
                    .on_click(cx.listener(|this, _, _window, cx| this.on_save(cx))),
            );

        let palette = v_flex()
            .id("palette")
            .size_full()
            .p_3()
            .gap_2()
            .child(div().text_sm().text_color(muted).child("Add node"))
            .children(NodeKind::ALL.iter().map(|&kind| {
                Button::new(kind.as_str())
                    .label(kind.label())
                    .w_full()
                    .on_click(cx.listener(move |this, _, _window, cx| {
                        this.canvas.update(cx, |canvas, cx| {
                            canvas.add_node(kind, cx);
                        });
                    }))
            }));

        v_flex()
            .size_full()
            .bg(background)
            .text_color(foreground)
            .child(toolbar)
            .child(
                div().flex_1().min_h_0().child(
                    h_resizable("builder")
                        .child(resizable_panel().size(px(180.0)).child(palette))
                        .child(
                            resizable_panel().child(
                                div()
                                    .id("canvas")
                                    .relative()
                                    .size_full()
                                    .overflow_hidden()
                                    .child(self.canvas.clone()),
                            ),
                        )
                        .child(
                            resizable_panel()
                                .size(px(300.0))
                                .child(self.properties.clone()),
                        ),
                ),
            )
    }
}
