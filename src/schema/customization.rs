use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User-layer customization over one configuration kind.
///
/// Applied over the system layer in the order override, add, exclude.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct CustomizationRecord {
    /// Partial patches, shallow-merged over existing entries.
    #[serde(default, alias = "override")]
    pub override_nodes: IndexMap<String, Value>,
    /// Full entries, inserted or replacing existing ones.
    #[serde(default, alias = "add")]
    pub add_nodes: IndexMap<String, Value>,
    /// Entries removed after override and add.
    #[serde(default, alias = "exclude")]
    pub exclude_nodes: Vec<String>,
}

impl CustomizationRecord {
    pub fn is_empty(&self) -> bool {
        self.override_nodes.is_empty() && self.add_nodes.is_empty() && self.exclude_nodes.is_empty()
    }
}
