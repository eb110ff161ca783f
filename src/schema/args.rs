use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON type accepted for an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Any,
}

impl ArgType {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Some(ArgType::String),
            "integer" | "int" => Some(ArgType::Integer),
            "number" | "float" => Some(ArgType::Number),
            "boolean" | "bool" => Some(ArgType::Boolean),
            "object" | "dict" => Some(ArgType::Object),
            "array" | "list" => Some(ArgType::Array),
            "any" => Some(ArgType::Any),
            _ => None,
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ArgType::String => value.is_string(),
            ArgType::Integer => value.is_i64() || value.is_u64(),
            ArgType::Number => value.is_number(),
            ArgType::Boolean => value.is_boolean(),
            ArgType::Object => value.is_object(),
            ArgType::Array => value.is_array(),
            ArgType::Any => true,
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgType::String => "string",
            ArgType::Integer => "integer",
            ArgType::Number => "number",
            ArgType::Boolean => "boolean",
            ArgType::Object => "object",
            ArgType::Array => "array",
            ArgType::Any => "any",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    pub required: bool,
}

/// Argument schema of a callable: ordered `field -> spec`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ArgsSchema {
    pub fields: IndexMap<String, FieldSpec>,
}

impl ArgsSchema {
    /// Parse the authored form: each field maps to a type name or to
    /// `{ "type": <name>, "required": bool }` (required defaults to true).
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| "args_schema must be an object".to_string())?;
        let mut fields = IndexMap::new();
        for (name, spec) in obj {
            let field = match spec {
                Value::String(type_name) => FieldSpec {
                    arg_type: ArgType::parse(type_name)
                        .ok_or_else(|| format!("unknown type '{}' for field '{}'", type_name, name))?,
                    required: true,
                },
                Value::Object(spec_obj) => {
                    let type_name = spec_obj
                        .get("type")
                        .and_then(Value::as_str)
                        .ok_or_else(|| format!("field '{}' has no type", name))?;
                    let arg_type = ArgType::parse(type_name).ok_or_else(|| {
                        format!("unknown type '{}' for field '{}'", type_name, name)
                    })?;
                    let required = match spec_obj.get("required") {
                        None => true,
                        Some(Value::Bool(b)) => *b,
                        Some(_) => return Err(format!("field '{}' has non-boolean required", name)),
                    };
                    FieldSpec { arg_type, required }
                }
                _ => return Err(format!("field '{}' spec must be a type name or object", name)),
            };
            fields.insert(name.clone(), field);
        }
        Ok(Self { fields })
    }

    pub fn to_value(&self) -> Value {
        let obj: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, spec)| {
                (
                    name.clone(),
                    json!({"type": spec.arg_type.to_string(), "required": spec.required}),
                )
            })
            .collect();
        Value::Object(obj)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
