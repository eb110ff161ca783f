//! Validation warning types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Configuration layer a warning originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    System,
    User,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::System => f.write_str("system"),
            Layer::User => f.write_str("user"),
        }
    }
}

/// A non-fatal load-time finding. The offending entry was dropped or
/// adjusted; loading continued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub layer: Layer,
    pub code: String,
    pub node_id: Option<String>,
    pub field_path: Option<String>,
    pub reason: String,
}

impl ValidationWarning {
    pub fn new(layer: Layer, code: &str, node_id: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            layer,
            code: code.to_string(),
            node_id: node_id.map(str::to_string),
            field_path: None,
            reason: reason.into(),
        }
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field_path = Some(field.to_string());
        self
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.layer)?;
        if let Some(id) = &self.node_id {
            write!(f, " {}", id)?;
        }
        if let Some(field) = &self.field_path {
            write!(f, " ({})", field)?;
        }
        write!(f, ": {}", self.reason)
    }
}

/// Filter helper over collected warnings.
pub fn with_code<'a>(
    warnings: &'a [ValidationWarning],
    code: &'a str,
) -> impl Iterator<Item = &'a ValidationWarning> + 'a {
    warnings.iter().filter(move |w| w.code == code)
}
