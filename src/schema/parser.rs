//! Config document parser: converts raw YAML/JSON/TOML text into config models.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::ShellError;

/// Supported config document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format (`.yaml` / `.yml`).
    Yaml,
    /// JSON format (`.json`).
    Json,
    /// TOML format (`.toml`).
    Toml,
}

impl ConfigFormat {
    /// Extensions tried, in order, when looking up a document by stem.
    pub const EXTENSIONS: &'static [&'static str] = &["json", "yaml", "yml", "toml"];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Parse a config document into a JSON value tree.
pub fn parse_value(content: &str, format: ConfigFormat) -> Result<serde_json::Value, ShellError> {
    match format {
        ConfigFormat::Yaml => {
            serde_saphyr::from_str(content).map_err(|e| ShellError::ConfigParse(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ShellError::ConfigParse(e.to_string()))
        }
        ConfigFormat::Toml => {
            let toml_val: toml::Value =
                toml::from_str(content).map_err(|e| ShellError::ConfigParse(e.to_string()))?;
            Ok(toml_value_to_json(toml_val))
        }
    }
}

/// Parse a config document into a typed model.
///
/// Documents always pass through [`serde_json::Value`] first so that fields
/// typed as `Value` (node definitions, patches) look the same whatever the
/// source format was.
pub fn parse_document<T: DeserializeOwned>(
    content: &str,
    format: ConfigFormat,
) -> Result<T, ShellError> {
    let value = parse_value(content, format)?;
    serde_json::from_value(value).map_err(|e| ShellError::ConfigParse(e.to_string()))
}

/// Convert a [`toml::Value`] into a [`serde_json::Value`].
///
/// TOML has no null; `Datetime` values are stringified.
fn toml_value_to_json(val: toml::Value) -> serde_json::Value {
    match val {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_value_to_json).collect())
        }
        toml::Value::Table(tbl) => {
            let map: serde_json::Map<String, serde_json::Value> = tbl
                .into_iter()
                .map(|(k, v)| (k, toml_value_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
    }
}
