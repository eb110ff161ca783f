use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One named zone: a many-to-many grouping of node references.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ZoneDef {
    #[serde(default, alias = "zone_tree")]
    pub members: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Zones document: `{ "zones": { name -> ZoneDef } }`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ZoneConfig {
    #[serde(default)]
    pub zones: IndexMap<String, Value>,
}
