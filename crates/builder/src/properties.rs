//! Editing panel for the selected node.

use editor::{ConfigField, Node, NodeConfig, NodeDataPatch, NodeId};
use gpui::*;
use gpui_component::{
    ActiveTheme, v_flex,
    input::{Input, InputEvent, InputState},
};
use graphview::GraphCanvas;
use tracing::debug;

#[derive(Clone, Copy, Debug)]
enum Target {
    Name,
    Description,
    Field(ConfigField),
}

pub struct PropertiesPanel {
    canvas: Entity<GraphCanvas>,
    node: Option<NodeId>,
    name: Entity<InputState>,
    description: Entity<InputState>,
    fields: Vec<(ConfigField, Entity<InputState>)>,
    _subscriptions: Vec<Subscription>,
    _field_subscriptions: Vec<Subscription>,
}

fn field_hint(field: ConfigField) -> &'static str {
    match field {
        ConfigField::Event => "message | schedule | webhook | manual",
        ConfigField::Schedule => "cron expression",
        ConfigField::Method => "GET | POST | PUT | PATCH | DELETE",
        ConfigField::Operation => "read | write | update | delete",
        ConfigField::Url => "https://",
        _ => "",
    }
}

fn labeled(label: &'static str, input: Input, color: Hsla) -> Div {
    v_flex()
        .gap_1()
        .child(div().text_sm().text_color(color).child(label))
        .child(input)
}

impl PropertiesPanel {
    pub fn new(canvas: Entity<GraphCanvas>, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let name = cx.new(|cx| InputState::new(window, cx).placeholder("Node name"));
        let description =
            cx.new(|cx| InputState::new(window, cx).placeholder("Optional description"));
        let _subscriptions = vec![
            Self::watch(&name, Target::Name, cx),
            Self::watch(&description, Target::Description, cx),
        ];

        Self {
            canvas,
            node: None,
            name,
            description,
            fields: Vec::new(),
            _subscriptions,
            _field_subscriptions: Vec::new(),
        }
    }

    fn watch(state: &Entity<InputState>, target: Target, cx: &mut Context<Self>) -> Subscription {
        cx.subscribe(state, move |this, input, event: &InputEvent, cx| {
            if let InputEvent::Change = event {
                let value = input.read(cx).value().to_string();
                this.commit(target, value, cx);
            }
        })
    }

    /// Points the panel at `node`, or clears it.
    pub fn show(&mut self, node: Option<NodeId>, window: &mut Window, cx: &mut Context<Self>) {
        let node = node.and_then(|id| self.canvas.read(cx).editor().graph().node(&id).cloned());
        self.node = node.as_ref().map(|n| n.id.clone());
        self.fields.clear();
        self._field_subscriptions.clear();

        let Some(node) = node else {
            cx.notify();
            return;
        };

        let name = node.data.name.clone();
        let description = node.data.description.clone().unwrap_or_default();
        self.name
            .update(cx, |state, cx| state.set_value(name, window, cx));
        self.description
            .update(cx, |state, cx| state.set_value(description, window, cx));

        for &field in node.kind().config_fields() {
            let value = node.data.config.field_value(field).unwrap_or_default();
            let state = cx.new(|cx| {
                InputState::new(window, cx)
                    .placeholder(field_hint(field))
                    .default_value(value)
            });
            self._field_subscriptions
                .push(Self::watch(&state, Target::Field(field), cx));
            self.fields.push((field, state));
        }
        cx.notify();
    }

    /// Writes one edited value back to the graph.
    fn commit(&mut self, target: Target, value: String, cx: &mut Context<Self>) {
        let Some(id) = self.node.clone() else {
            return;
        };
        let Some(node) = self.canvas.read(cx).editor().graph().node(&id).cloned() else {
            return;
        };

        let Some(patch) = edit_patch(&node, target, value) else {
            return;
        };

        let result = self
            .canvas
            .update(cx, |canvas, cx| canvas.update_node_data(&id, patch, cx));
        if let Err(err) = result {
            debug!(%err, node = %id, "node update rejected");
        }
    }
}

/// Patch for one edited value, or `None` when nothing should change. Values
/// equal to what the node already holds are skipped, which also absorbs the
/// change events fired by `show`. An emptied config input unsets the field.
fn edit_patch(node: &Node, target: Target, value: String) -> Option<NodeDataPatch> {
    match target {
        Target::Name => (node.data.name != value).then(|| NodeDataPatch::name(value)),
        Target::Description => {
            let description = (!value.trim().is_empty()).then_some(value);
            (node.data.description != description)
                .then(|| NodeDataPatch::description(description))
        }
        Target::Field(field) => {
            let current = node.data.config.field_value(field);
            if value.trim().is_empty() {
                return current.is_some().then(|| NodeDataPatch::clear_field(field));
            }
            if current.as_deref() == Some(value.as_str()) {
                return None;
            }
            match NodeConfig::field_patch(node.kind(), field, &value) {
                Ok(config) => Some(NodeDataPatch::config(config)),
                Err(err) => {
                    // Half-typed enum values are expected while editing.
                    debug!(%err, node = %node.id, "config edit not applied");
                    None
                }
            }
        }
    }
}

impl Render for PropertiesPanel {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let muted = cx.theme().muted_foreground;
        let kind = self
            .node
            .as_ref()
            .and_then(|id| self.canvas.read(cx).editor().graph().node(id))
            .map(|node| node.kind());

        let panel = v_flex()
            .id("properties")
            .size_full()
            .p_3()
            .gap_3()
            .bg(cx.theme().background);

        let Some(kind) = kind else {
            return panel.child(
                div()
                    .text_sm()
                    .text_color(muted)
                    .child("Select a node to edit its properties"),
            );
        };

        panel
            .child(
                v_flex()
                    .gap_1()
                    .child(
                        div()
                            .font_weight(FontWeight::SEMIBOLD)
                            .child(format!("{} node", kind.label())),
                    )
                    .child(
                        div()
                            .text_xs()
                            .text_color(muted)
                            .child(kind.default_description()),
                    ),
            )
            .child(labeled("Name", Input::new(&self.name), muted))
            .child(labeled("Description", Input::new(&self.description), muted))
            .children(
                self.fields
                    .iter()
                    .map(|(field, state)| labeled(field.label(), Input::new(state), muted)),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use editor::{NodeKind, Point};

    fn api_node() -> Node {
        let mut node = Node::new(NodeId::new("api-1"), NodeKind::Api, Point::ZERO);
        node.apply(NodeDataPatch::config(
            NodeConfig::field_patch(NodeKind::Api, ConfigField::Url, "https://x.test").unwrap(),
        ))
        .unwrap();
        node
    }

    #[test]
    fn emptied_config_input_unsets_the_field() {
        let mut node = api_node();
        let patch = edit_patch(&node, Target::Field(ConfigField::Url), String::new()).unwrap();
        node.apply(patch).unwrap();
        assert_eq!(node.data.config.field_value(ConfigField::Url), None);

        // Already unset: nothing to do.
        assert!(edit_patch(&node, Target::Field(ConfigField::Url), "  ".into()).is_none());
    }

    #[test]
    fn unchanged_and_unparseable_values_are_skipped() {
        let node = api_node();
        assert!(edit_patch(&node, Target::Field(ConfigField::Url), "https://x.test".into()).is_none());
        assert!(edit_patch(&node, Target::Field(ConfigField::Method), "PO".into()).is_none());
        assert!(edit_patch(&node, Target::Name, node.data.name.clone()).is_none());
    }

    #[test]
    fn blank_description_becomes_none() {
        let node = api_node();
        assert_eq!(
            edit_patch(&node, Target::Description, " ".into()),
            Some(NodeDataPatch::description(None))
        );
    }
}
