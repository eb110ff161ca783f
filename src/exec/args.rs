use serde_json::Value;

use crate::error::ExecutionError;
use crate::schema::ArgsSchema;

/// Check caller arguments against a callable's schema.
///
/// Arguments must be a JSON object (`null` counts as empty). Required fields
/// must be present and non-null; present fields must match their type.
/// Extra fields are accepted.
pub fn validate_args(node_id: &str, schema: &ArgsSchema, args: &Value) -> Result<(), ExecutionError> {
    let empty = serde_json::Map::new();
    let obj = match args {
        Value::Object(obj) => obj,
        Value::Null => &empty,
        other => {
            return Err(ExecutionError::ArgValidation {
                node_id: node_id.to_string(),
                problems: vec![format!("arguments must be an object, got {}", json_type(other))],
            })
        }
    };

    let mut problems = Vec::new();
    for (field, spec) in &schema.fields {
        match obj.get(field) {
            None | Some(Value::Null) => {
                if spec.required {
                    problems.push(format!("missing required field '{}'", field));
                }
            }
            Some(value) => {
                if !spec.arg_type.matches(value) {
                    problems.push(format!(
                        "field '{}' expects {}, got {}",
                        field,
                        spec.arg_type,
                        json_type(value)
                    ));
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ExecutionError::ArgValidation {
            node_id: node_id.to_string(),
            problems,
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
