//! Default resolution - fills missing fields from schema defaults.
//!
//! Resolution never changes array lengths and never adds fields the schema
//! does not declare. An absent object is built from its children's defaults
//! only when those defaults alone satisfy every required field beneath it,
//! so filling can never introduce a `Required` validation error.

use serde_json::{Map, Value};

use crate::field::{FieldKind, FieldSpec, ObjectRules};
use crate::types::is_missing;

/// Fill missing parts of `value` from the defaults declared in `spec`.
///
/// `value` is `None` when the field is absent from its parent; the result is
/// `None` when it stays absent. Idempotent.
pub fn fill_defaults(spec: &FieldSpec, value: Option<&Value>) -> Option<Value> {
    if is_missing(value) {
        if let Some(default) = spec.default_value() {
            return match spec.kind() {
                FieldKind::Object(_) | FieldKind::Array(_) => fill_defaults(spec, Some(default)),
                _ => Some(default.clone()),
            };
        }
        return match spec.kind() {
            FieldKind::Object(rules) => materialize(rules)
                .map(Value::Object)
                .or_else(|| value.cloned()),
            _ => value.cloned(),
        };
    }

    match (spec.kind(), value) {
        (FieldKind::Object(rules), Some(Value::Object(map))) => {
            Some(Value::Object(fill_object(rules, map)))
        }
        (FieldKind::Array(rules), Some(Value::Array(items))) => {
            let items = items
                .iter()
                .map(|item| match item {
                    Value::Object(_) => fill_defaults(rules.items(), Some(item))
                        .unwrap_or_else(|| item.clone()),
                    other => other.clone(),
                })
                .collect();
            Some(Value::Array(items))
        }
        // Present scalars and values of the wrong shape are kept as-is.
        (_, other) => other.cloned(),
    }
}

/// Fill a whole record from the schema root.
pub fn fill_record(spec: &FieldSpec, record: &Value) -> Value {
    fill_defaults(spec, Some(record)).unwrap_or_else(|| record.clone())
}

fn fill_object(rules: &ObjectRules, map: &Map<String, Value>) -> Map<String, Value> {
    let mut result = Map::new();

    for (name, child) in rules.fields() {
        if let Some(filled) = fill_defaults(child, map.get(name)) {
            result.insert(name.to_string(), filled);
        }
    }

    // Keys the schema doesn't declare belong to the caller; carry them over.
    for (key, value) in map {
        if rules.get(key).is_none() {
            result.insert(key.clone(), value.clone());
        }
    }

    result
}

/// Build an absent object purely from defaults.
///
/// Returns `None` if nothing would be filled, or if some required field
/// beneath it has no default.
fn materialize(rules: &ObjectRules) -> Option<Map<String, Value>> {
    let mut map = Map::new();

    for (name, child) in rules.fields() {
        let filled = fill_defaults(child, None);
        if is_missing(filled.as_ref()) {
            if child.is_required() {
                return None;
            }
            continue;
        }
        if let Some(filled) = filled {
            map.insert(name.to_string(), filled);
        }
    }

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}
