use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::schema::CustomizationRecord;
use crate::validation::{Layer, ValidationWarning};

/// One configuration kind the merge engine can combine (nodes, shortcuts, zones).
pub trait MergeKind {
    type Item: Clone;

    /// Kind name used in logs.
    fn name(&self) -> &'static str;

    /// Render an item back into its authored form for patching.
    fn to_value(&self, item: &Self::Item) -> Value;

    /// Validate one authored entry.
    fn validate(
        &self,
        layer: Layer,
        id: &str,
        raw: &Value,
    ) -> (Option<Self::Item>, Vec<ValidationWarning>);

    /// Rewrite patch keys before they are merged, e.g. field aliases.
    fn normalize_patch(&self, patch: Map<String, Value>) -> Map<String, Value> {
        patch
    }
}

/// Output of one merge: surviving entries in a stable order, plus warnings.
#[derive(Debug, Clone)]
pub struct Merged<T> {
    pub entries: IndexMap<String, T>,
    pub warnings: Vec<ValidationWarning>,
}

/// Validate raw system-layer entries of a kind.
pub fn collect_system<K: MergeKind>(
    kind: &K,
    raw: &IndexMap<String, Value>,
) -> (IndexMap<String, K::Item>, Vec<ValidationWarning>) {
    let mut entries = IndexMap::new();
    let mut warnings = Vec::new();
    for (id, value) in raw {
        let (item, w) = kind.validate(Layer::System, id, value);
        warnings.extend(w);
        if let Some(item) = item {
            entries.insert(id.clone(), item);
        }
    }
    (entries, warnings)
}

/// Apply a user customization record over a system layer.
///
/// Order is fixed: override, then add, then exclude. The inputs are not
/// modified, so merging the same layers again yields the same output.
pub fn merge<K: MergeKind>(
    kind: &K,
    system: &IndexMap<String, K::Item>,
    custom: Option<&CustomizationRecord>,
) -> Merged<K::Item> {
    let mut entries = system.clone();
    let mut warnings = Vec::new();
    let Some(custom) = custom else {
        return Merged { entries, warnings };
    };

    for (id, patch) in &custom.override_nodes {
        let Some(current) = entries.get(id) else {
            warnings.push(ValidationWarning::new(
                Layer::User,
                "W201",
                Some(id),
                format!("override of missing {} entry ignored", kind.name()),
            ));
            continue;
        };
        let Value::Object(patch) = patch else {
            warnings.push(ValidationWarning::new(
                Layer::User,
                "W203",
                Some(id),
                "override patch must be an object, entry kept unpatched",
            ));
            continue;
        };
        let patched = apply_patch(kind.to_value(current), kind.normalize_patch(patch.clone()));
        let (item, item_warnings) = kind.validate(Layer::User, id, &patched);
        match item {
            Some(item) => {
                warnings.extend(item_warnings);
                entries.insert(id.clone(), item);
            }
            None => {
                let reasons: Vec<String> = item_warnings.iter().map(|w| w.to_string()).collect();
                warnings.push(ValidationWarning::new(
                    Layer::User,
                    "W203",
                    Some(id),
                    format!("override rejected, entry kept unpatched: {}", reasons.join("; ")),
                ));
            }
        }
    }

    for (id, full) in &custom.add_nodes {
        let (item, item_warnings) = kind.validate(Layer::User, id, full);
        match item {
            Some(item) => {
                warnings.extend(item_warnings);
                if entries.insert(id.clone(), item).is_some() {
                    debug!(kind = kind.name(), id = %id, "added entry replaces system entry");
                }
            }
            None => {
                warnings.extend(item_warnings);
                warnings.push(ValidationWarning::new(
                    Layer::User,
                    "W202",
                    Some(id),
                    format!("invalid added {} entry ignored", kind.name()),
                ));
            }
        }
    }

    for id in &custom.exclude_nodes {
        if entries.shift_remove(id).is_none() {
            warnings.push(ValidationWarning::new(
                Layer::User,
                "W204",
                Some(id),
                format!("excluded {} entry was not present", kind.name()),
            ));
        }
    }

    Merged { entries, warnings }
}

/// Shallow field merge of `patch` over `base`.
fn apply_patch(base: Value, patch: Map<String, Value>) -> Value {
    let mut obj = match base {
        Value::Object(obj) => obj,
        _ => Map::new(),
    };
    for (key, value) in patch {
        obj.insert(key, value);
    }
    Value::Object(obj)
}
