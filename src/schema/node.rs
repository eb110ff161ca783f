use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::args::ArgsSchema;

/// Universal selector for the read-only menu view.
pub const MENU_SELECTOR: &str = "0";
/// Universal selector for the action view.
pub const ACTION_SELECTOR: &str = "1";
/// Selectors every node exposes implicitly; they may not be declared as options.
pub const RESERVED_SELECTORS: &[&str] = &[MENU_SELECTOR, ACTION_SELECTOR];

/// Raw node definition as authored in a family document or customization record.
///
/// Every field is optional here; [`validate_node`](crate::validation::validate_node)
/// decides whether the definition forms a [`Node`].
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct NodeDef {
    #[serde(rename = "type", default)]
    pub node_type: Option<String>,
    #[serde(default, alias = "title", alias = "prompt")]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub options: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub function_name: Option<String>,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub args_schema: Option<Value>,
    /// Unrecognised fields are kept but unused.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// External function reference of a callable node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub function_name: String,
    pub is_async: bool,
    pub args_schema: ArgsSchema,
}

/// Menu-vs-callable distinction, fixed at validation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    Menu { options: IndexMap<String, String> },
    Callable(Binding),
}

/// A validated node of the merged tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub family: String,
    pub label: String,
    pub description: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn is_callable(&self) -> bool {
        matches!(self.kind, NodeKind::Callable(_))
    }

    pub fn binding(&self) -> Option<&Binding> {
        match &self.kind {
            NodeKind::Callable(binding) => Some(binding),
            NodeKind::Menu { .. } => None,
        }
    }

    /// Declared options; callable nodes have none beyond the universal selectors.
    pub fn options(&self) -> Option<&IndexMap<String, String>> {
        match &self.kind {
            NodeKind::Menu { options } => Some(options),
            NodeKind::Callable(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Menu { .. } => "Menu",
            NodeKind::Callable(_) => "Callable",
        }
    }

    /// Final dot-separated segment of the id.
    pub fn name(&self) -> &str {
        self.id.rsplit('.').next().unwrap_or(&self.id)
    }

    /// Render back into the authored definition shape, so a partial patch can
    /// be merged over it and re-validated.
    pub fn to_definition(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), json!(self.kind_name()));
        obj.insert("label".into(), json!(self.label));
        obj.insert("description".into(), json!(self.description));
        match &self.kind {
            NodeKind::Menu { options } => {
                let opts: Map<String, Value> = options
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                obj.insert("options".into(), Value::Object(opts));
            }
            NodeKind::Callable(binding) => {
                obj.insert("function_name".into(), json!(binding.function_name));
                obj.insert("is_async".into(), json!(binding.is_async));
                obj.insert("args_schema".into(), binding.args_schema.to_value());
            }
        }
        Value::Object(obj)
    }
}
