use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::geometry::Point;

/// Stable identifier of a placed node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for NodeId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Trigger,
    Skill,
    Condition,
    Response,
    Api,
    Database,
}

impl NodeKind {
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Trigger,
        NodeKind::Skill,
        NodeKind::Condition,
        NodeKind::Response,
        NodeKind::Api,
        NodeKind::Database,
    ];

    /// Lowercase tag, also used as the id prefix of generated nodes.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::Skill => "skill",
            NodeKind::Condition => "condition",
            NodeKind::Response => "response",
            NodeKind::Api => "api",
            NodeKind::Database => "database",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Trigger => "Trigger",
            NodeKind::Skill => "Skill",
            NodeKind::Condition => "Condition",
            NodeKind::Response => "Response",
            NodeKind::Api => "API",
            NodeKind::Database => "Database",
        }
    }

    pub fn default_name(self) -> String {
        match self {
            NodeKind::Api => "New API Call".to_string(),
            kind => format!("New {}", kind.label()),
        }
    }

    pub fn default_description(self) -> &'static str {
        match self {
            NodeKind::Trigger => "Starts the flow when an event arrives",
            NodeKind::Skill => "Runs an agent skill",
            NodeKind::Condition => "Branches on an expression",
            NodeKind::Response => "Sends a reply back to the user",
            NodeKind::Api => "Calls an external HTTP API",
            NodeKind::Database => "Reads or writes a document collection",
        }
    }

    /// Config fields editable for this kind, in display order.
    pub fn config_fields(self) -> &'static [ConfigField] {
        match self {
            NodeKind::Trigger => &[ConfigField::Event, ConfigField::Schedule],
            NodeKind::Skill => &[ConfigField::SkillType, ConfigField::Template],
            NodeKind::Condition => &[ConfigField::Expression],
            NodeKind::Response => &[ConfigField::Template],
            NodeKind::Api => &[ConfigField::Method, ConfigField::Url],
            NodeKind::Database => &[ConfigField::Collection, ConfigField::Operation],
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| GraphError::UnknownKind(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerEvent {
    Message,
    Schedule,
    Webhook,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbOperation {
    Read,
    Write,
    Update,
    Delete,
}

// Enum config values round-trip through the same spelling serde uses.
macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }

            fn parse(s: &str) -> Option<Self> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Some($ty::$variant);
                    }
                )+
                None
            }
        }
    };
}

text_enum!(TriggerEvent {
    Message => "message",
    Schedule => "schedule",
    Webhook => "webhook",
    Manual => "manual",
});

text_enum!(HttpMethod {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
    Delete => "DELETE",
});

text_enum!(DbOperation {
    Read => "read",
    Write => "write",
    Update => "update",
    Delete => "delete",
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<TriggerEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<DbOperation>,
}

/// Per-kind node configuration. The variant is the node's kind.
///
/// The same type doubles as a patch: merging copies only the fields that are
/// set, so editing one field never erases its siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeConfig {
    Trigger(TriggerConfig),
    Skill(SkillConfig),
    Condition(ConditionConfig),
    Response(ResponseConfig),
    Api(ApiConfig),
    Database(DatabaseConfig),
}

fn merge_field<T>(dst: &mut Option<T>, src: Option<T>) {
    if src.is_some() {
        *dst = src;
    }
}

impl NodeConfig {
    pub fn empty(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Trigger => NodeConfig::Trigger(TriggerConfig::default()),
            NodeKind::Skill => NodeConfig::Skill(SkillConfig::default()),
            NodeKind::Condition => NodeConfig::Condition(ConditionConfig::default()),
            NodeKind::Response => NodeConfig::Response(ResponseConfig::default()),
            NodeKind::Api => NodeConfig::Api(ApiConfig::default()),
            NodeKind::Database => NodeConfig::Database(DatabaseConfig::default()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeConfig::Trigger(_) => NodeKind::Trigger,
            NodeConfig::Skill(_) => NodeKind::Skill,
            NodeConfig::Condition(_) => NodeKind::Condition,
            NodeConfig::Response(_) => NodeKind::Response,
            NodeConfig::Api(_) => NodeKind::Api,
            NodeConfig::Database(_) => NodeKind::Database,
        }
    }

    /// Merges the set fields of `patch` into `self`, one level deep.
    pub fn merge(&mut self, patch: NodeConfig) -> Result<(), GraphError> {
        match (self, patch) {
            (NodeConfig::Trigger(dst), NodeConfig::Trigger(src)) => {
                merge_field(&mut dst.event, src.event);
                merge_field(&mut dst.schedule, src.schedule);
            }
            (NodeConfig::Skill(dst), NodeConfig::Skill(src)) => {
                merge_field(&mut dst.skill_type, src.skill_type);
                merge_field(&mut dst.template, src.template);
            }
            (NodeConfig::Condition(dst), NodeConfig::Condition(src)) => {
                merge_field(&mut dst.expression, src.expression);
            }
            (NodeConfig::Response(dst), NodeConfig::Response(src)) => {
                merge_field(&mut dst.template, src.template);
            }
            (NodeConfig::Api(dst), NodeConfig::Api(src)) => {
                merge_field(&mut dst.method, src.method);
                merge_field(&mut dst.url, src.url);
            }
            (NodeConfig::Database(dst), NodeConfig::Database(src)) => {
                merge_field(&mut dst.collection, src.collection);
                merge_field(&mut dst.operation, src.operation);
            }
            (dst, src) => {
                return Err(GraphError::ConfigKindMismatch {
                    node: dst.kind(),
                    patch: src.kind(),
                });
            }
        }
        Ok(())
    }

    /// Unsets one field. Fails when `field` does not belong to this kind.
    pub fn clear_field(&mut self, field: ConfigField) -> Result<(), GraphError> {
        match (self, field) {
            (NodeConfig::Trigger(c), ConfigField::Event) => c.event = None,
            (NodeConfig::Trigger(c), ConfigField::Schedule) => c.schedule = None,
            (NodeConfig::Skill(c), ConfigField::SkillType) => c.skill_type = None,
            (NodeConfig::Skill(c), ConfigField::Template) => c.template = None,
            (NodeConfig::Condition(c), ConfigField::Expression) => c.expression = None,
            (NodeConfig::Response(c), ConfigField::Template) => c.template = None,
            (NodeConfig::Api(c), ConfigField::Method) => c.method = None,
            (NodeConfig::Api(c), ConfigField::Url) => c.url = None,
            (NodeConfig::Database(c), ConfigField::Collection) => c.collection = None,
            (NodeConfig::Database(c), ConfigField::Operation) => c.operation = None,
            (config, field) => {
                return Err(GraphError::FieldNotApplicable {
                    kind: config.kind(),
                    field,
                });
            }
        }
        Ok(())
    }

    /// Current value of `field` rendered as text, if set.
    pub fn field_value(&self, field: ConfigField) -> Option<String> {
        match (self, field) {
            (NodeConfig::Trigger(c), ConfigField::Event) => c.event.map(|e| e.as_str().to_string()),
            (NodeConfig::Trigger(c), ConfigField::Schedule) => c.schedule.clone(),
            (NodeConfig::Skill(c), ConfigField::SkillType) => c.skill_type.clone(),
            (NodeConfig::Skill(c), ConfigField::Template) => c.template.clone(),
            (NodeConfig::Condition(c), ConfigField::Expression) => c.expression.clone(),
            (NodeConfig::Response(c), ConfigField::Template) => c.template.clone(),
            (NodeConfig::Api(c), ConfigField::Method) => c.method.map(|m| m.as_str().to_string()),
            (NodeConfig::Api(c), ConfigField::Url) => c.url.clone(),
            (NodeConfig::Database(c), ConfigField::Collection) => c.collection.clone(),
            (NodeConfig::Database(c), ConfigField::Operation) => {
                c.operation.map(|o| o.as_str().to_string())
            }
            _ => None,
        }
    }

    /// Builds a single-field patch for a node of `kind` from text input.
    pub fn field_patch(kind: NodeKind, field: ConfigField, value: &str) -> Result<Self, GraphError> {
        let invalid = || GraphError::InvalidFieldValue {
            field,
            value: value.to_string(),
        };
        let text = Some(value.to_string());

        let patch = match (kind, field) {
            (NodeKind::Trigger, ConfigField::Event) => NodeConfig::Trigger(TriggerConfig {
                event: Some(TriggerEvent::parse(value).ok_or_else(invalid)?),
                ..Default::default()
            }),
            (NodeKind::Trigger, ConfigField::Schedule) => NodeConfig::Trigger(TriggerConfig {
                schedule: text,
                ..Default::default()
            }),
            (NodeKind::Skill, ConfigField::SkillType) => NodeConfig::Skill(SkillConfig {
                skill_type: text,
                ..Default::default()
            }),
            (NodeKind::Skill, ConfigField::Template) => NodeConfig::Skill(SkillConfig {
                template: text,
                ..Default::default()
            }),
            (NodeKind::Condition, ConfigField::Expression) => {
                NodeConfig::Condition(ConditionConfig { expression: text })
            }
            (NodeKind::Response, ConfigField::Template) => {
                NodeConfig::Response(ResponseConfig { template: text })
            }
            (NodeKind::Api, ConfigField::Method) => NodeConfig::Api(ApiConfig {
                method: Some(HttpMethod::parse(value).ok_or_else(invalid)?),
                ..Default::default()
            }),
            (NodeKind::Api, ConfigField::Url) => NodeConfig::Api(ApiConfig {
                url: text,
                ..Default::default()
            }),
            (NodeKind::Database, ConfigField::Collection) => NodeConfig::Database(DatabaseConfig {
                collection: text,
                ..Default::default()
            }),
            (NodeKind::Database, ConfigField::Operation) => NodeConfig::Database(DatabaseConfig {
                operation: Some(DbOperation::parse(value).ok_or_else(invalid)?),
                ..Default::default()
            }),
            _ => return Err(GraphError::FieldNotApplicable { kind, field }),
        };
        Ok(patch)
    }
}

/// A single editable config field, as listed by [`NodeKind::config_fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Event,
    Schedule,
    SkillType,
    Template,
    Expression,
    Method,
    Url,
    Collection,
    Operation,
}

impl ConfigField {
    pub fn label(self) -> &'static str {
        match self {
            ConfigField::Event => "Event",
            ConfigField::Schedule => "Schedule",
            ConfigField::SkillType => "Skill type",
            ConfigField::Template => "Template",
            ConfigField::Expression => "Expression",
            ConfigField::Method => "Method",
            ConfigField::Url => "URL",
            ConfigField::Collection => "Collection",
            ConfigField::Operation => "Operation",
        }
    }

    /// Field name as it appears in serialized config.
    pub fn key(self) -> &'static str {
        match self {
            ConfigField::Event => "event",
            ConfigField::Schedule => "schedule",
            ConfigField::SkillType => "skillType",
            ConfigField::Template => "template",
            ConfigField::Expression => "expression",
            ConfigField::Method => "method",
            ConfigField::Url => "url",
            ConfigField::Collection => "collection",
            ConfigField::Operation => "operation",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.key() == key)
    }

    pub const ALL: [ConfigField; 9] = [
        ConfigField::Event,
        ConfigField::Schedule,
        ConfigField::SkillType,
        ConfigField::Template,
        ConfigField::Expression,
        ConfigField::Method,
        ConfigField::Url,
        ConfigField::Collection,
        ConfigField::Operation,
    ];
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub config: NodeConfig,
}

impl NodeData {
    pub fn defaults(kind: NodeKind) -> Self {
        Self {
            name: kind.default_name(),
            description: Some(kind.default_description().to_string()),
            config: NodeConfig::empty(kind),
        }
    }
}

/// Partial update for [`NodeData`]. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDataPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub config: Option<NodeConfig>,
    /// Config fields to unset, applied after `config` is merged.
    pub cleared: Vec<ConfigField>,
}

impl NodeDataPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn description(description: Option<String>) -> Self {
        Self {
            description: Some(description),
            ..Default::default()
        }
    }

    pub fn config(config: NodeConfig) -> Self {
        Self {
            config: Some(config),
            ..Default::default()
        }
    }

    pub fn clear_field(field: ConfigField) -> Self {
        Self {
            cleared: vec![field],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Point,
    pub data: NodeData,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, position: Point) -> Self {
        Self {
            id,
            position,
            data: NodeData::defaults(kind),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.config.kind()
    }

    /// Applies `patch`. A config of the wrong kind is rejected before anything changes.
    pub fn apply(&mut self, patch: NodeDataPatch) -> Result<(), GraphError> {
        if let Some(config) = &patch.config {
            if config.kind() != self.kind() {
                return Err(GraphError::ConfigKindMismatch {
                    node: self.kind(),
                    patch: config.kind(),
                });
            }
        }

        if let Some(&field) = patch
            .cleared
            .iter()
            .find(|field| !self.kind().config_fields().contains(field))
        {
            return Err(GraphError::FieldNotApplicable {
                kind: self.kind(),
                field,
            });
        }

        if let Some(name) = patch.name {
            self.data.name = name;
        }
        if let Some(description) = patch.description {
            self.data.description = description;
        }
        if let Some(config) = patch.config {
            self.data.config.merge(config)?;
        }
        for field in patch.cleared {
            self.data.config.clear_field(field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_field_keys_match_serialized_names() {
        assert_eq!(ConfigField::from_key("skillType"), Some(ConfigField::SkillType));
        assert_eq!(ConfigField::from_key("skill_type"), None);

        let config = NodeConfig::Skill(SkillConfig {
            skill_type: Some("summarize".into()),
            template: None,
        });
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get(ConfigField::SkillType.key()).is_some());
    }

    #[test]
    fn default_names_follow_kind() {
        assert_eq!(NodeKind::Response.default_name(), "New Response");
        assert_eq!(NodeKind::Trigger.default_name(), "New Trigger");
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Database".parse::<NodeKind>().unwrap(), NodeKind::Database);
        assert!(matches!(
            "webhook".parse::<NodeKind>(),
            Err(GraphError::UnknownKind(_))
        ));
    }

    #[test]
    fn merge_keeps_existing_fields() {
        let mut config = NodeConfig::Skill(SkillConfig {
            skill_type: Some("x".into()),
            template: None,
        });
        config
            .merge(NodeConfig::Skill(SkillConfig {
                skill_type: None,
                template: Some("y".into()),
            }))
            .unwrap();
        assert_eq!(
            config,
            NodeConfig::Skill(SkillConfig {
                skill_type: Some("x".into()),
                template: Some("y".into()),
            })
        );
    }

    #[test]
    fn merge_rejects_other_kind() {
        let mut config = NodeConfig::empty(NodeKind::Api);
        let err = config.merge(NodeConfig::empty(NodeKind::Skill)).unwrap_err();
        assert_eq!(
            err,
            GraphError::ConfigKindMismatch {
                node: NodeKind::Api,
                patch: NodeKind::Skill,
            }
        );
        assert_eq!(config, NodeConfig::empty(NodeKind::Api));
    }

    #[test]
    fn apply_with_mismatched_config_changes_nothing() {
        let mut node = Node::new("n".into(), NodeKind::Condition, Point::ZERO);
        let before = node.clone();
        let patch = NodeDataPatch {
            name: Some("renamed".into()),
            config: Some(NodeConfig::empty(NodeKind::Trigger)),
            ..Default::default()
        };
        assert!(node.apply(patch).is_err());
        assert_eq!(node, before);
    }

    #[test]
    fn cleared_field_is_unset_and_others_kept() {
        let mut node = Node::new("n".into(), NodeKind::Api, Point::ZERO);
        node.apply(NodeDataPatch::config(
            NodeConfig::field_patch(NodeKind::Api, ConfigField::Url, "https://x.test").unwrap(),
        ))
        .unwrap();
        node.apply(NodeDataPatch::config(
            NodeConfig::field_patch(NodeKind::Api, ConfigField::Method, "GET").unwrap(),
        ))
        .unwrap();

        node.apply(NodeDataPatch::clear_field(ConfigField::Url)).unwrap();
        assert_eq!(node.data.config.field_value(ConfigField::Url), None);
        assert_eq!(
            node.data.config.field_value(ConfigField::Method).as_deref(),
            Some("GET")
        );
    }

    #[test]
    fn clearing_a_foreign_field_changes_nothing() {
        let mut node = Node::new("n".into(), NodeKind::Api, Point::ZERO);
        let before = node.clone();
        let patch = NodeDataPatch {
            name: Some("renamed".into()),
            cleared: vec![ConfigField::Expression],
            ..Default::default()
        };
        assert_eq!(
            node.apply(patch),
            Err(GraphError::FieldNotApplicable {
                kind: NodeKind::Api,
                field: ConfigField::Expression,
            })
        );
        assert_eq!(node, before);
    }

    #[test]
    fn field_patch_parses_enums() {
        let patch = NodeConfig::field_patch(NodeKind::Api, ConfigField::Method, "post").unwrap();
        assert_eq!(patch.field_value(ConfigField::Method).as_deref(), Some("POST"));

        let err = NodeConfig::field_patch(NodeKind::Trigger, ConfigField::Event, "sometimes");
        assert!(matches!(err, Err(GraphError::InvalidFieldValue { .. })));
    }

    #[test]
    fn field_patch_rejects_foreign_field() {
        let err = NodeConfig::field_patch(NodeKind::Condition, ConfigField::Url, "x");
        assert!(matches!(err, Err(GraphError::FieldNotApplicable { .. })));
    }

    #[test]
    fn config_serializes_with_kind_tag_and_camel_case() {
        let config = NodeConfig::Skill(SkillConfig {
            skill_type: Some("x".into()),
            template: None,
        });
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "skill", "skillType": "x" }));
    }
}
