use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A family document: one rooted subtree of node definitions.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FamilyDoc {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: IndexMap<String, Value>,
}

impl FamilyDoc {
    /// Node definitions keyed by their qualified id, in document order.
    pub fn qualified_nodes(&self) -> impl Iterator<Item = (String, &Value)> {
        self.nodes
            .iter()
            .map(move |(key, def)| (qualify_key(&self.name, key), def))
    }
}

/// Qualify a node key with its family name unless it already is.
pub fn qualify_key(family: &str, key: &str) -> String {
    if key == family || key.starts_with(&format!("{}.", family)) {
        key.to_string()
    } else {
        format!("{}.{}", family, key)
    }
}

/// Where a family's definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyOrigin {
    System,
    User,
}

/// Family metadata retained after loading; its nodes live in the node store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Family {
    pub name: String,
    pub parent: Option<String>,
    pub domain: Option<String>,
    pub description: Option<String>,
    pub origin: FamilyOrigin,
    pub node_ids: Vec<String>,
}

impl Family {
    /// Id of the root node, which always equals the family name.
    pub fn root(&self) -> &str {
        &self.name
    }
}
