use indexmap::IndexMap;
use serde_json::Value;

use crate::schema::{ArgsSchema, Binding, Node, NodeDef, NodeKind, RESERVED_SELECTORS};

use super::types::{Layer, ValidationWarning};

/// Validate one raw node definition.
///
/// Returns the node when it is usable, plus every warning raised. A `None`
/// node means the definition was dropped; non-fatal adjustments (reserved
/// options, options on a callable) keep the node.
pub fn validate_node(
    layer: Layer,
    id: &str,
    family: &str,
    raw: &Value,
) -> (Option<Node>, Vec<ValidationWarning>) {
    let mut warnings = Vec::new();

    if !raw.is_object() {
        warnings.push(ValidationWarning::new(
            layer,
            "W100",
            Some(id),
            "node definition must be an object",
        ));
        return (None, warnings);
    }
    let def: NodeDef = match serde_json::from_value(raw.clone()) {
        Ok(def) => def,
        Err(err) => {
            warnings.push(ValidationWarning::new(
                layer,
                "W100",
                Some(id),
                format!("malformed node definition: {}", err),
            ));
            return (None, warnings);
        }
    };

    let label = def
        .label
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string);
    let description = def.description.clone().unwrap_or_default();

    let kind = match def.node_type.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("menu") => {
            if label.is_none() {
                warnings.push(
                    ValidationWarning::new(layer, "W102", Some(id), "menu node has no label")
                        .with_field("label"),
                );
                return (None, warnings);
            }
            let mut options = IndexMap::new();
            for (selector, target) in def.options.unwrap_or_default() {
                if RESERVED_SELECTORS.contains(&selector.as_str()) {
                    warnings.push(
                        ValidationWarning::new(
                            layer,
                            "W106",
                            Some(id),
                            format!("option selector '{}' is reserved, dropped", selector),
                        )
                        .with_field(&format!("options.{}", selector)),
                    );
                    continue;
                }
                options.insert(selector, target);
            }
            NodeKind::Menu { options }
        }
        Some("callable") => match validate_binding(layer, id, &def, &mut warnings) {
            Some(binding) => {
                if def.options.as_ref().is_some_and(|o| !o.is_empty()) {
                    warnings.push(
                        ValidationWarning::new(
                            layer,
                            "W107",
                            Some(id),
                            "callable node options are ignored",
                        )
                        .with_field("options"),
                    );
                }
                NodeKind::Callable(binding)
            }
            None => return (None, warnings),
        },
        Some(other) => {
            warnings.push(
                ValidationWarning::new(layer, "W101", Some(id), format!("unknown node type '{}'", other))
                    .with_field("type"),
            );
            return (None, warnings);
        }
        None => {
            warnings.push(
                ValidationWarning::new(layer, "W101", Some(id), "node has no type").with_field("type"),
            );
            return (None, warnings);
        }
    };

    let label = label.unwrap_or_else(|| id.rsplit('.').next().unwrap_or(id).to_string());
    let node = Node {
        id: id.to_string(),
        family: family.to_string(),
        label,
        description,
        kind,
    };
    (Some(node), warnings)
}

fn validate_binding(
    layer: Layer,
    id: &str,
    def: &NodeDef,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<Binding> {
    let function_name = def
        .function_name
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty());
    if function_name.is_none() {
        warnings.push(
            ValidationWarning::new(layer, "W103", Some(id), "callable node has no function_name")
                .with_field("function_name"),
        );
    }

    let args_schema = match &def.args_schema {
        None => {
            warnings.push(
                ValidationWarning::new(layer, "W104", Some(id), "callable node has no args_schema")
                    .with_field("args_schema"),
            );
            None
        }
        Some(raw) => match ArgsSchema::from_value(raw) {
            Ok(schema) => Some(schema),
            Err(reason) => {
                warnings.push(
                    ValidationWarning::new(layer, "W105", Some(id), reason).with_field("args_schema"),
                );
                None
            }
        },
    };

    Some(Binding {
        function_name: function_name?.to_string(),
        is_async: def.is_async,
        args_schema: args_schema?,
    })
}
