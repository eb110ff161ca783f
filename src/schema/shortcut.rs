use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named shortcut.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shortcut {
    /// Alias for an address; consumed by the resolver's alias rule.
    Jump {
        #[serde(alias = "coordinate")]
        target: String,
    },
    /// Stored chain template, expanded by `chain <alias> [args]`.
    Chain { template: String },
}

impl Shortcut {
    pub fn jump(target: impl Into<String>) -> Self {
        Shortcut::Jump {
            target: target.into(),
        }
    }
}

/// Shortcuts document. Accepts `{ "shortcuts": {...} }` or a bare map.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ShortcutsDoc {
    #[serde(default)]
    pub shortcuts: IndexMap<String, Value>,
}

impl ShortcutsDoc {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut obj) => match obj.remove("shortcuts") {
                Some(Value::Object(inner)) => Self {
                    shortcuts: inner.into_iter().collect(),
                },
                _ => Self {
                    shortcuts: obj.into_iter().filter(|(k, _)| k != "path").collect(),
                },
            },
            _ => Self::default(),
        }
    }
}
