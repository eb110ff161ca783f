use indexmap::IndexMap;

use crate::schema::{Family, FamilyDoc, FamilyOrigin, Node};

use super::node::validate_node;
use super::types::{Layer, ValidationWarning};

/// A family whose nodes passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedFamily {
    pub family: Family,
    pub nodes: IndexMap<String, Node>,
}

/// Validate every node of a family document.
///
/// Invalid nodes are omitted with a warning. A family whose root node is
/// missing or invalid is rejected as a whole (`W002`).
pub fn validate_family(
    doc: &FamilyDoc,
    origin: FamilyOrigin,
) -> (Option<ValidatedFamily>, Vec<ValidationWarning>) {
    let layer = match origin {
        FamilyOrigin::System => Layer::System,
        FamilyOrigin::User => Layer::User,
    };
    let mut warnings = Vec::new();
    let mut nodes = IndexMap::new();

    for (id, raw) in doc.qualified_nodes() {
        let (node, node_warnings) = validate_node(layer, &id, &doc.name, raw);
        warnings.extend(node_warnings);
        if let Some(node) = node {
            if nodes.insert(id.clone(), node).is_some() {
                warnings.push(ValidationWarning::new(
                    layer,
                    "W108",
                    Some(&id),
                    "duplicate node id in family, later definition kept",
                ));
            }
        }
    }

    if !nodes.contains_key(&doc.name) {
        warnings.push(ValidationWarning::new(
            layer,
            "W002",
            Some(&doc.name),
            format!("family '{}' has no valid root node", doc.name),
        ));
        return (None, warnings);
    }

    let family = Family {
        name: doc.name.clone(),
        parent: doc.parent.clone(),
        domain: doc.domain.clone(),
        description: doc.description.clone(),
        origin,
        node_ids: nodes.keys().cloned().collect(),
    };
    (Some(ValidatedFamily { family, nodes }), warnings)
}
