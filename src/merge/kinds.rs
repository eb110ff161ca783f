use serde_json::{json, Map, Value};

use crate::schema::{Node, Shortcut, ZoneDef};
use crate::validation::{validate_node, Layer, ValidationWarning};

use super::engine::MergeKind;

/// Node definitions. Needs the known family names to attribute added nodes.
pub struct NodeMerge {
    families: Vec<String>,
}

impl NodeMerge {
    pub fn new<I, S>(families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            families: families.into_iter().map(Into::into).collect(),
        }
    }

    /// Family owning `id`: the longest family name that is `id` or one of
    /// its dotted prefixes, else the first segment.
    pub fn family_of(&self, id: &str) -> String {
        self.families
            .iter()
            .filter(|f| id == f.as_str() || id.starts_with(&format!("{}.", f)))
            .max_by_key(|f| f.len())
            .cloned()
            .unwrap_or_else(|| id.split('.').next().unwrap_or(id).to_string())
    }
}

impl MergeKind for NodeMerge {
    type Item = Node;

    fn name(&self) -> &'static str {
        "node"
    }

    fn to_value(&self, item: &Node) -> Value {
        item.to_definition()
    }

    fn validate(&self, layer: Layer, id: &str, raw: &Value) -> (Option<Node>, Vec<ValidationWarning>) {
        validate_node(layer, id, &self.family_of(id), raw)
    }

    fn normalize_patch(&self, mut patch: Map<String, Value>) -> Map<String, Value> {
        for alias in ["title", "prompt"] {
            if let Some(label) = patch.remove(alias) {
                patch.entry("label").or_insert(label);
            }
        }
        patch
    }
}

/// Named shortcuts.
pub struct ShortcutMerge;

impl MergeKind for ShortcutMerge {
    type Item = Shortcut;

    fn name(&self) -> &'static str {
        "shortcut"
    }

    fn to_value(&self, item: &Shortcut) -> Value {
        match item {
            Shortcut::Jump { target } => json!({"type": "jump", "target": target}),
            Shortcut::Chain { template } => json!({"type": "chain", "template": template}),
        }
    }

    fn validate(&self, layer: Layer, id: &str, raw: &Value) -> (Option<Shortcut>, Vec<ValidationWarning>) {
        if id.is_empty() || id.contains('.') || id.contains(char::is_whitespace) {
            return (
                None,
                vec![ValidationWarning::new(
                    layer,
                    "W501",
                    Some(id),
                    "shortcut alias must be a single non-empty segment",
                )],
            );
        }
        match serde_json::from_value::<Shortcut>(raw.clone()) {
            Ok(shortcut) => (Some(shortcut), vec![]),
            Err(err) => (
                None,
                vec![ValidationWarning::new(
                    layer,
                    "W501",
                    Some(id),
                    format!("invalid shortcut: {}", err),
                )],
            ),
        }
    }
}

/// Zone definitions.
pub struct ZoneMerge;

impl MergeKind for ZoneMerge {
    type Item = ZoneDef;

    fn name(&self) -> &'static str {
        "zone"
    }

    fn to_value(&self, item: &ZoneDef) -> Value {
        json!({"members": item.members, "description": item.description})
    }

    fn validate(&self, layer: Layer, id: &str, raw: &Value) -> (Option<ZoneDef>, Vec<ValidationWarning>) {
        match serde_json::from_value::<ZoneDef>(raw.clone()) {
            Ok(def) => (Some(def), vec![]),
            Err(err) => (
                None,
                vec![ValidationWarning::new(
                    layer,
                    "W403",
                    Some(id),
                    format!("invalid zone definition: {}", err),
                )],
            ),
        }
    }

    fn normalize_patch(&self, mut patch: Map<String, Value>) -> Map<String, Value> {
        if let Some(members) = patch.remove("zone_tree") {
            patch.entry("members").or_insert(members);
        }
        patch
    }
}
