//! Integration tests for the subscriber schema engine.

use serde_json::{json, Value};
use subscriber_schema::{
    compose, fill_record, subscriber_overlay, subscriber_schema, validate, ConstraintKind,
    EditConfigController, FieldPath, FieldSpec, Mode, OverlayContext, ValidationError, Viewport,
};

fn schema() -> FieldSpec {
    subscriber_schema().unwrap()
}

fn errors_for(record: &Value) -> Vec<ValidationError> {
    validate(&schema(), Some(record), &FieldPath::root())
}

fn flow(description: &str) -> Value {
    json!({ "direction": 1, "description": description })
}

fn pcc_rule() -> Value {
    json!({
        "flow": [flow("permit out ip from any to any")],
        "qos": {
            "qci": 1,
            "arp": { "priority_level": 2, "pre_emption_capability": 0, "pre_emption_vulnerability": 1 },
            "mbr": { "downlink": 128, "uplink": 128 },
            "gbr": { "downlink": 64, "uplink": 64 }
        }
    })
}

fn valid_record() -> Value {
    json!({
        "imsi": "001010000000001",
        "security": {
            "k": "465B5CE8 B199B49F AA5F0A2E E238A6BC",
            "op": "5F1D289C 5D354D0A 140C2548 F5F3E3BA",
            "amf": "8000"
        },
        "ambr": { "downlink": 1024000, "uplink": 1024000 },
        "pdn": [{
            "apn": "internet",
            "qos": {
                "qci": 9,
                "arp": { "priority_level": 8, "pre_emption_capability": 1, "pre_emption_vulnerability": 1 }
            },
            "ambr": { "downlink": 1024000, "uplink": 1024000 },
            "pcc_rule": [pcc_rule()]
        }]
    })
}

fn required_count(errors: &[ValidationError]) -> usize {
    errors
        .iter()
        .filter(|e| e.kind == ConstraintKind::Required)
        .count()
}

// === Validation ===

mod validation {
    use super::*;

    #[test]
    fn valid_record_passes() {
        assert_eq!(errors_for(&valid_record()), []);
    }

    #[test]
    fn imsi_with_letters() {
        let mut record = valid_record();
        record["imsi"] = json!("12a3");

        let errors = errors_for(&record);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "imsi");
        assert_eq!(errors[0].kind, ConstraintKind::Pattern);
        assert_eq!(errors[0].message, "Only digits are allowed");
    }

    #[test]
    fn imsi_too_long() {
        let mut record = valid_record();
        record["imsi"] = json!("0010100000000012");

        let errors = errors_for(&record);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ConstraintKind::MaxLength);
    }

    #[test]
    fn empty_pdn_list() {
        let mut record = valid_record();
        record["pdn"] = json!([]);

        let errors = errors_for(&record);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "pdn");
        assert_eq!(errors[0].kind, ConstraintKind::MinItems);
        assert_eq!(errors[0].message, "At least 1 APN is required");
    }

    #[test]
    fn too_many_pdns() {
        let mut record = valid_record();
        let pdn = record["pdn"][0].clone();
        record["pdn"] = json!([pdn.clone(), pdn.clone(), pdn.clone(), pdn.clone(), pdn]);

        let errors = errors_for(&record);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "4 APNs are supported");
    }

    #[test]
    fn flow_description_must_permit_out() {
        let mut record = valid_record();
        record["pdn"][0]["pcc_rule"][0]["flow"] = json!([flow("permit out udp"), flow("deny out ip")]);

        let errors = errors_for(&record);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].path.to_string(),
            "pdn[0].pcc_rule[0].flow[1].description"
        );
        assert_eq!(errors[0].kind, ConstraintKind::Pattern);
        assert_eq!(errors[0].message, "Begin with reserved keyword 'permit out'.");
    }

    #[test]
    fn nine_pcc_rules() {
        let mut record = valid_record();
        record["pdn"][0]["pcc_rule"] = Value::Array(vec![pcc_rule(); 9]);

        let errors = errors_for(&record);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "pdn[0].pcc_rule");
        assert_eq!(errors[0].kind, ConstraintKind::MaxItems);
        assert_eq!(errors[0].message, "8 PCC Rules are supported");
    }

    #[test]
    fn pcc_rule_needs_a_flow() {
        let mut record = valid_record();
        record["pdn"][0]["pcc_rule"][0]["flow"] = json!([]);

        let errors = errors_for(&record);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "At least 1 Flow is required");
    }

    #[test]
    fn security_keys_must_be_hex() {
        let mut record = valid_record();
        record["security"]["op"] = json!("XYZ");
        record["security"]["amf"] = json!("");

        let errors = errors_for(&record);
        let found: Vec<_> = errors
            .iter()
            .map(|e| (e.path.to_string(), e.kind))
            .collect();
        assert_eq!(
            found,
            [
                ("security.op".to_string(), ConstraintKind::Pattern),
                ("security.amf".to_string(), ConstraintKind::Required),
            ]
        );
        assert_eq!(errors[0].message, "Only hexadecimal digits are allowed");
    }

    #[test]
    fn qci_outside_enum() {
        let mut record = valid_record();
        record["pdn"][0]["qos"]["qci"] = json!(10);

        let errors = errors_for(&record);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "pdn[0].qos.qci");
        assert_eq!(errors[0].kind, ConstraintKind::Enum);
    }

    #[test]
    fn priority_level_bounds() {
        let mut record = valid_record();
        record["pdn"][0]["qos"]["arp"]["priority_level"] = json!(16);
        record["pdn"][0]["pcc_rule"][0]["qos"]["arp"]["priority_level"] = json!(0);

        let kinds: Vec<_> = errors_for(&record).iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [ConstraintKind::Maximum, ConstraintKind::Minimum]);
    }

    #[test]
    fn rule_vulnerability_checks_range_and_enum() {
        let mut record = valid_record();
        record["pdn"][0]["pcc_rule"][0]["qos"]["arp"]["pre_emption_vulnerability"] = json!(2);
        record["pdn"][0]["qos"]["arp"]["pre_emption_vulnerability"] = json!(2);

        let found: Vec<_> = errors_for(&record)
            .iter()
            .map(|e| (e.path.to_string(), e.kind))
            .collect();
        assert_eq!(
            found,
            [
                (
                    "pdn[0].qos.arp.pre_emption_vulnerability".to_string(),
                    ConstraintKind::Enum
                ),
                (
                    "pdn[0].pcc_rule[0].qos.arp.pre_emption_vulnerability".to_string(),
                    ConstraintKind::Maximum
                ),
                (
                    "pdn[0].pcc_rule[0].qos.arp.pre_emption_vulnerability".to_string(),
                    ConstraintKind::Enum
                ),
            ]
        );
    }

    #[test]
    fn errors_are_complete_and_ordered() {
        let record = json!({
            "imsi": "abc",
            "security": {},
            "pdn": [{ "pcc_rule": [{ "flow": [{ "description": "deny" }] }] }, {}]
        });

        let paths: Vec<_> = errors_for(&record)
            .iter()
            .map(|e| e.path.to_string())
            .collect();
        assert_eq!(
            paths,
            [
                "imsi",
                "security.k",
                "security.op",
                "security.amf",
                "pdn[0].apn",
                "pdn[0].pcc_rule[0].flow[0].description",
                "pdn[1].apn",
            ]
        );
    }

    #[test]
    fn validation_is_deterministic() {
        let record = json!({ "imsi": "x", "pdn": [{}, {}] });
        assert_eq!(errors_for(&record), errors_for(&record));
    }
}

// === Defaults ===

mod defaults {
    use super::*;

    #[test]
    fn new_pdn_gets_qos_defaults() {
        let filled = fill_record(&schema(), &json!({ "pdn": [{ "apn": "internet" }] }));
        assert_eq!(
            filled["pdn"][0]["qos"],
            json!({
                "qci": 9,
                "arp": {
                    "priority_level": 8,
                    "pre_emption_capability": 1,
                    "pre_emption_vulnerability": 1
                }
            })
        );
        assert!(filled["pdn"][0].get("pcc_rule").is_none());
        assert!(filled["pdn"][0].get("ambr").is_none());
    }

    #[test]
    fn flow_gets_direction_and_description() {
        let record = json!({ "pdn": [{ "pcc_rule": [{ "flow": [{}] }] }] });
        let filled = fill_record(&schema(), &record);
        assert_eq!(
            filled["pdn"][0]["pcc_rule"][0]["flow"][0],
            json!({ "direction": 1, "description": "permit out ip from any to any" })
        );
    }

    #[test]
    fn arrays_are_never_extended() {
        let record = json!({ "pdn": [{ "pcc_rule": [{ "flow": [] }] }] });
        let filled = fill_record(&schema(), &record);
        assert_eq!(filled["pdn"].as_array().unwrap().len(), 1);
        assert_eq!(filled["pdn"][0]["pcc_rule"][0]["flow"], json!([]));
    }

    #[test]
    fn existing_values_win() {
        let filled = fill_record(&schema(), &valid_record());
        assert_eq!(filled, valid_record());
    }

    #[test]
    fn fill_is_idempotent() {
        let records = [
            json!({}),
            json!({ "imsi": "1", "pdn": [{}, { "qos": {} }] }),
            json!({ "pdn": [{ "pcc_rule": [{ "flow": [{}, { "direction": 2 }] }] }] }),
            valid_record(),
        ];
        for record in records {
            let once = fill_record(&schema(), &record);
            assert_eq!(fill_record(&schema(), &once), once);
        }
    }

    #[test]
    fn defaults_never_add_required_errors() {
        let records = [
            json!({}),
            json!({ "pdn": [{}] }),
            json!({ "pdn": [{ "qos": { "arp": {} } }] }),
            json!({ "pdn": [{ "pcc_rule": [{ "flow": [{}] }, { "qos": {} }] }] }),
            json!({ "security": { "k": "" }, "ambr": {} }),
        ];
        for record in records {
            let before = required_count(&errors_for(&record));
            let after = required_count(&errors_for(&fill_record(&schema(), &record)));
            assert!(after <= before, "{} -> {} for {}", before, after, record);
        }
    }

    #[test]
    fn defaults_satisfy_required_priority_level() {
        let record = json!({ "pdn": [{ "qos": { "arp": {} } }] });
        let before = errors_for(&record);
        assert!(before
            .iter()
            .any(|e| e.path.to_string() == "pdn[0].qos.arp.priority_level"));

        let after = errors_for(&fill_record(&schema(), &record));
        assert!(!after
            .iter()
            .any(|e| e.path.to_string() == "pdn[0].qos.arp.priority_level"));
    }
}

// === Overlay composition ===

mod overlay {
    use super::*;

    fn compose_for(mode: Mode, viewport: Viewport) -> subscriber_schema::OverlayEntry {
        compose(&subscriber_overlay(), OverlayContext::new(mode, viewport))
    }

    #[test]
    fn update_other_disables_imsi() {
        let overlay = compose_for(Mode::Update, Viewport::Other);
        let imsi = overlay.field("imsi").unwrap();
        assert_eq!(imsi.disabled, Some(true));
        assert_eq!(imsi.autofocus, None);
    }

    #[test]
    fn create_other_focuses_imsi() {
        let overlay = compose_for(Mode::Create, Viewport::Other);
        let imsi = overlay.field("imsi").unwrap();
        assert_eq!(imsi.autofocus, Some(true));
        assert_eq!(imsi.disabled, None);
    }

    #[test]
    fn create_small_equals_base() {
        assert_eq!(compose_for(Mode::Create, Viewport::Small), subscriber_overlay());
    }

    #[test]
    fn only_imsi_changes() {
        let base = subscriber_overlay();
        for (mode, viewport) in [(Mode::Update, Viewport::Small), (Mode::Create, Viewport::Other)] {
            let mut composed = compose(&base, OverlayContext::new(mode, viewport)).to_json();
            let mut expected = base.to_json();
            composed.as_object_mut().unwrap().remove("imsi");
            expected.as_object_mut().unwrap().remove("imsi");
            assert_eq!(composed, expected);
        }
    }

    #[test]
    fn compose_is_repeatable() {
        for mode in [Mode::Create, Mode::Update] {
            for viewport in [Viewport::Small, Viewport::Other] {
                assert_eq!(compose_for(mode, viewport), compose_for(mode, viewport));
            }
        }
    }

    #[test]
    fn qci_uses_inline_radio() {
        let overlay = subscriber_overlay().to_json();
        let expected = json!({ "widgetKind": "radio", "widgetOptions": { "inline": true } });
        assert_eq!(overlay["pdn"]["items"]["qos"]["qci"], expected);
        assert_eq!(
            overlay["pdn"]["items"]["pcc_rule"]["items"]["qos"]["qci"],
            expected
        );
    }
}

// === Schema grammar ===

mod grammar {
    use super::*;

    #[test]
    fn grammar_carries_messages() {
        let grammar = schema().to_json();
        assert_eq!(grammar["type"], "object");
        assert_eq!(
            grammar["properties"]["pdn"]["messages"],
            json!({ "minItems": "At least 1 APN is required", "maxItems": "4 APNs are supported" })
        );
        assert_eq!(
            grammar["properties"]["pdn"]["items"]["properties"]["qos"]["properties"]["qci"]["enum"],
            json!([1, 2, 3, 4, 5, 6, 7, 8, 9, 65, 66, 69, 70])
        );
    }

    #[test]
    fn grammar_reads_back_identically() {
        let schema = schema();
        assert_eq!(FieldSpec::from_json(&schema.to_json()).unwrap(), schema);
    }

    #[test]
    fn controller_round_trip() {
        let controller = EditConfigController::new().unwrap();
        let record = controller.prepare_submission(&valid_record()).unwrap();
        assert_eq!(record.imsi, "001010000000001");
        assert_eq!(record.pdn[0].pcc_rule[0].flow.len(), 1);
    }
}
