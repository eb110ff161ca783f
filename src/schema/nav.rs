use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Coordinate prefix used when neither the nav document nor the settings name one.
pub const DEFAULT_NAV_PREFIX: &str = "0";

/// Which families get numeric coordinates, and in what order.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NavConfig {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default, alias = "order")]
    pub nav_tree_order: Vec<String>,
    /// Lower values sort first; families without an entry get priority 0.
    #[serde(default, alias = "priorities")]
    pub family_priorities: IndexMap<String, i64>,
    /// Explicit `coordinate -> family` bindings.
    #[serde(default, alias = "coordinates")]
    pub coordinate_mapping: IndexMap<String, String>,
}

impl NavConfig {
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(DEFAULT_NAV_PREFIX)
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            nav_tree_order: Vec::new(),
            family_priorities: IndexMap::new(),
            coordinate_mapping: IndexMap::new(),
        }
    }
}
