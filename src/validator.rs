//! Record validation against a [`FieldSpec`] tree.
//!
//! Validation is total: every constraint of every reachable field is checked
//! and all failures are returned, in pre-order (a field's own constraints,
//! then its children in declaration order, then array elements by index).

use serde_json::Value;
use tracing::debug;

use crate::error::{ValidateError, ValidationError};
use crate::field::{ArrayRules, FieldKind, FieldSpec, NumberRules, ObjectRules, StringRules};
use crate::path::FieldPath;
use crate::types::{is_missing, json_type_name, ConstraintKind};

/// Validate `value` against `spec`, qualifying error paths with `path`.
///
/// `value` is `None` when the field is absent from its parent. An empty
/// result means the value satisfies every constraint.
pub fn validate(spec: &FieldSpec, value: Option<&Value>, path: &FieldPath) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validate_field(spec, value, path, &mut errors);
    errors
}

/// Validate a whole record from the schema root.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` carrying every error if the record
/// doesn't satisfy the schema.
pub fn check(spec: &FieldSpec, record: &Value) -> Result<(), ValidateError> {
    let errors = validate(spec, Some(record), &FieldPath::root());
    debug!(errors = errors.len(), "validated record");

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

// --- Internal implementation ---

fn validate_field(
    spec: &FieldSpec,
    value: Option<&Value>,
    path: &FieldPath,
    errors: &mut Vec<ValidationError>,
) {
    let present = match value {
        Some(value) if !is_missing(Some(value)) => value,
        _ => {
            if spec.is_required() {
                push(errors, spec, path, ConstraintKind::Required, || {
                    "field is required".to_string()
                });
            }
            return;
        }
    };

    let field_type = spec.field_type();
    if !field_type.accepts(present) {
        push(errors, spec, path, ConstraintKind::Type, || {
            format!("should be {}, got {}", field_type, json_type_name(present))
        });
        return;
    }

    match (spec.kind(), present) {
        (FieldKind::String(rules), Value::String(s)) => {
            validate_string(spec, rules, s, path, errors);
        }
        (FieldKind::Number(rules), Value::Number(n)) => {
            if let Some(n) = n.as_f64() {
                validate_number(spec, rules, n, path, errors);
            }
        }
        (FieldKind::Object(rules), Value::Object(map)) => {
            validate_object(rules, map, path, errors);
        }
        (FieldKind::Array(rules), Value::Array(items)) => {
            validate_array(spec, rules, items, path, errors);
        }
        // Shape mismatches were reported above.
        _ => {}
    }
}

fn validate_string(
    spec: &FieldSpec,
    rules: &StringRules,
    value: &str,
    path: &FieldPath,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(pattern) = &rules.pattern {
        if !pattern.is_match(value) {
            push(errors, spec, path, ConstraintKind::Pattern, || {
                format!("should match pattern \"{}\"", pattern.as_str())
            });
        }
    }

    if let Some(max) = rules.max_length {
        if value.chars().count() > max {
            push(errors, spec, path, ConstraintKind::MaxLength, || {
                format!("should NOT be longer than {} characters", max)
            });
        }
    }
}

fn validate_number(
    spec: &FieldSpec,
    rules: &NumberRules,
    value: f64,
    path: &FieldPath,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(min) = rules.minimum {
        if value < min {
            push(errors, spec, path, ConstraintKind::Minimum, || {
                format!("should be >= {}", min)
            });
        }
    }

    if let Some(max) = rules.maximum {
        if value > max {
            push(errors, spec, path, ConstraintKind::Maximum, || {
                format!("should be <= {}", max)
            });
        }
    }

    if let Some(allowed) = &rules.enum_values {
        if !allowed.iter().any(|candidate| *candidate == value) {
            push(errors, spec, path, ConstraintKind::Enum, || {
                "should be equal to one of the allowed values".to_string()
            });
        }
    }
}

fn validate_object(
    rules: &ObjectRules,
    map: &serde_json::Map<String, Value>,
    path: &FieldPath,
    errors: &mut Vec<ValidationError>,
) {
    for (name, child) in rules.fields() {
        validate_field(child, map.get(name), &path.key(name), errors);
    }
}

fn validate_array(
    spec: &FieldSpec,
    rules: &ArrayRules,
    items: &[Value],
    path: &FieldPath,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(min) = rules.min_items {
        if items.len() < min {
            push(errors, spec, path, ConstraintKind::MinItems, || {
                format!("should NOT have fewer than {} items", min)
            });
        }
    }

    if let Some(max) = rules.max_items {
        if items.len() > max {
            push(errors, spec, path, ConstraintKind::MaxItems, || {
                format!("should NOT have more than {} items", max)
            });
        }
    }

    // An element is always present, so null or "" is a type error here.
    for (i, item) in items.iter().enumerate() {
        let item_path = path.index(i);
        if item.is_object() {
            validate_field(rules.items(), Some(item), &item_path, errors);
        } else {
            push(errors, rules.items(), &item_path, ConstraintKind::Type, || {
                format!("should be object, got {}", json_type_name(item))
            });
        }
    }
}

/// Record one failure, preferring the field's override message.
fn push(
    errors: &mut Vec<ValidationError>,
    spec: &FieldSpec,
    path: &FieldPath,
    kind: ConstraintKind,
    fallback: impl FnOnce() -> String,
) {
    let message = spec
        .message(kind)
        .map(String::from)
        .unwrap_or_else(fallback);
    errors.push(ValidationError {
        path: path.clone(),
        kind,
        message,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn imsi_spec() -> FieldSpec {
        FieldSpec::object("")
            .field(
                "imsi",
                FieldSpec::string("IMSI*")
                    .required()
                    .pattern(r"^\d+$")
                    .max_length(15)
                    .message(ConstraintKind::Pattern, "Only digits are allowed"),
            )
            .build()
            .unwrap()
    }

    fn kinds(errors: &[ValidationError]) -> Vec<ConstraintKind> {
        errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn valid_record_has_no_errors() {
        let record = json!({ "imsi": "001010000000001" });
        let errors = validate(&imsi_spec(), Some(&record), &FieldPath::root());
        assert!(errors.is_empty());
    }

    #[test]
    fn missing_required_field() {
        let errors = validate(&imsi_spec(), Some(&json!({})), &FieldPath::root());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ConstraintKind::Required);
        assert_eq!(errors[0].message, "field is required");
        assert_eq!(errors[0].path.to_string(), "imsi");
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let errors = validate(&imsi_spec(), Some(&json!({ "imsi": "" })), &FieldPath::root());
        assert_eq!(kinds(&errors), [ConstraintKind::Required]);
    }

    #[test]
    fn string_constraints_fire_independently() {
        let errors = validate(
            &imsi_spec(),
            Some(&json!({ "imsi": "1234567890123456x" })),
            &FieldPath::root(),
        );
        assert_eq!(kinds(&errors), [ConstraintKind::Pattern, ConstraintKind::MaxLength]);
        assert_eq!(errors[0].message, "Only digits are allowed");
        assert_eq!(errors[1].message, "should NOT be longer than 15 characters");
    }

    #[test]
    fn max_length_counts_characters() {
        let spec = FieldSpec::string("name").max_length(3).build().unwrap();
        assert!(validate(&spec, Some(&json!("äöü")), &FieldPath::root()).is_empty());
    }

    #[test]
    fn wrong_type_stops_descent() {
        let errors = validate(&imsi_spec(), Some(&json!({ "imsi": 1234 })), &FieldPath::root());
        assert_eq!(kinds(&errors), [ConstraintKind::Type]);
        assert_eq!(errors[0].message, "should be string, got number");
    }

    #[test]
    fn number_constraints_fire_independently() {
        let spec = FieldSpec::number("Vulnerability*")
            .minimum(0.0)
            .maximum(1.0)
            .enum_values([1.0, 0.0])
            .build()
            .unwrap();

        let errors = validate(&spec, Some(&json!(2)), &FieldPath::root());
        assert_eq!(kinds(&errors), [ConstraintKind::Maximum, ConstraintKind::Enum]);
        assert_eq!(errors[0].message, "should be <= 1");

        let errors = validate(&spec, Some(&json!(0.5)), &FieldPath::root());
        assert_eq!(kinds(&errors), [ConstraintKind::Enum]);

        let errors = validate(&spec, Some(&json!(-1)), &FieldPath::root());
        assert_eq!(kinds(&errors), [ConstraintKind::Minimum, ConstraintKind::Enum]);
    }

    #[test]
    fn optional_missing_object_is_skipped() {
        let spec = FieldSpec::object("")
            .field(
                "ambr",
                FieldSpec::object("").field("downlink", FieldSpec::number("DL").required()),
            )
            .build()
            .unwrap();

        assert!(validate(&spec, Some(&json!({})), &FieldPath::root()).is_empty());

        let errors = validate(&spec, Some(&json!({ "ambr": {} })), &FieldPath::root());
        assert_eq!(errors[0].path.to_string(), "ambr.downlink");
    }

    #[test]
    fn array_checks_bounds_then_every_item() {
        let spec = FieldSpec::object("")
            .field(
                "flow",
                FieldSpec::array("Flows")
                    .max_items(2)
                    .message(ConstraintKind::MaxItems, "2 Flows are supported")
                    .items(
                        FieldSpec::object("")
                            .field("description", FieldSpec::string("d").required()),
                    ),
            )
            .build()
            .unwrap();

        let record = json!({ "flow": [{}, { "description": "x" }, {}] });
        let errors = validate(&spec, Some(&record), &FieldPath::root());

        let paths: Vec<_> = errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, ["flow", "flow[0].description", "flow[2].description"]);
        assert_eq!(errors[0].message, "2 Flows are supported");
    }

    #[test]
    fn non_object_array_items_are_type_errors() {
        let spec = FieldSpec::array("rules")
            .items(FieldSpec::object(""))
            .build()
            .unwrap();
        let errors = validate(&spec, Some(&json!([null, ""])), &FieldPath::root());
        assert_eq!(kinds(&errors), [ConstraintKind::Type, ConstraintKind::Type]);
        assert_eq!(errors[0].path.to_string(), "[0]");
        assert_eq!(errors[1].message, "should be object, got string");
    }

    #[test]
    fn check_wraps_errors() {
        let result = check(&imsi_spec(), &json!({}));
        match result {
            Err(ValidateError::Invalid { errors }) => assert_eq!(errors.len(), 1),
            _ => panic!("expected validation error"),
        }
        assert!(check(&imsi_spec(), &json!({ "imsi": "1" })).is_ok());
    }
}
