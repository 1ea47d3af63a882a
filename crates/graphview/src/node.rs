use editor::{Node, NodeKind};
use gpui::prelude::FluentBuilder;
use gpui::*;

/// Theme colors a node is drawn with.
#[derive(Clone, Copy)]
pub struct NodePalette {
    pub text: Hsla,
    pub muted_text: Hsla,
    pub border: Hsla,
    pub background: Hsla,
    pub selected_border: Hsla,
}

/// Badge background and label color for a node kind.
pub fn kind_colors(kind: NodeKind) -> (Rgba, Rgba) {
    match kind {
        NodeKind::Trigger => (rgb(0x4a3a6a), rgb(0xcc88ff)),
        NodeKind::Skill => (rgb(0x2a4a6a), rgb(0x88aacc)),
        NodeKind::Condition => (rgb(0x6a5a3a), rgb(0xffcc88)),
        NodeKind::Response => (rgb(0x3a5a3a), rgb(0x88cc88)),
        NodeKind::Api => (rgb(0x5a3a3a), rgb(0xff9988)),
        NodeKind::Database => (rgb(0x3a5a5a), rgb(0x88dddd)),
    }
}

pub const INPUT_PORT_COLOR: u32 = 0x4488ff;
pub const OUTPUT_PORT_COLOR: u32 = 0xff8844;

/// Renders one node at its screen position. `origin` is the node's top-left
/// in container-local pixels and `size` its scaled size.
pub fn render_node(
    node: &Node,
    origin: editor::Point,
    size: editor::Size,
    zoom: f32,
    port_radius: f32,
    selected: bool,
    palette: NodePalette,
) -> Div {
    let (badge_bg, badge_text) = kind_colors(node.kind());
    let port = port_radius * 2.0 * zoom;

    let header = div()
        .w_full()
        .px(px(8.0 * zoom))
        .pt(px(6.0 * zoom))
        .flex()
        .items_center()
        .gap(px(6.0 * zoom))
        .child(
            div()
                .px(px(4.0 * zoom))
                .py(px(1.0 * zoom))
                .bg(badge_bg)
                .rounded(px(2.0 * zoom))
                .text_size(px(9.0 * zoom))
                .text_color(badge_text)
                .child(format!("«{}»", node.kind())),
        )
        .child(
            div()
                .text_size(px(12.0 * zoom))
                .text_color(palette.text)
                .font_weight(FontWeight::MEDIUM)
                .overflow_hidden()
                .child(node.data.name.clone()),
        );

    let description = node.data.description.clone();

    let body = div()
        .size_full()
        .bg(palette.background)
        .border(px(2.0))
        .border_color(if selected {
            palette.selected_border
        } else {
            palette.border
        })
        .rounded(px(6.0 * zoom))
        .shadow_sm()
        .flex()
        .flex_col()
        .overflow_hidden()
        .child(header)
        .when_some(description, |this, text| {
            this.child(
                div()
                    .px(px(8.0 * zoom))
                    .pt(px(4.0 * zoom))
                    .text_size(px(10.0 * zoom))
                    .text_color(palette.muted_text)
                    .child(text),
            )
        });

    let port_top = px(size.height / 2.0 - port / 2.0);
    let input_port = div()
        .absolute()
        .left(px(-port / 2.0))
        .top(port_top)
        .size(px(port))
        .bg(rgb(INPUT_PORT_COLOR))
        .border(px(1.0))
        .border_color(palette.border)
        .rounded_full();
    let output_port = div()
        .absolute()
        .left(px(size.width - port / 2.0))
        .top(port_top)
        .size(px(port))
        .bg(rgb(OUTPUT_PORT_COLOR))
        .border(px(1.0))
        .border_color(palette.border)
        .rounded_full()
        .cursor_crosshair();

    div()
        .absolute()
        .left(px(origin.x))
        .top(px(origin.y))
        .w(px(size.width))
        .h(px(size.height))
        .cursor_move()
        .child(body)
        .child(input_port)
        .child(output_port)
}
