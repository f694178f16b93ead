//! The subscriber configuration schema and its base layout overlay.

use crate::error::SchemaDefinitionError;
use crate::field::{FieldBuilder, FieldSpec};
use crate::overlay::{OverlayEntry, WidgetKind};
use crate::types::ConstraintKind;

const HEX_PATTERN: &str = r"^[0-9a-fA-F\s]+$";
const HEX_MESSAGE: &str = "Only hexadecimal digits are allowed";

/// QoS Class Identifiers offered for selection.
pub const QCI_VALUES: [f64; 13] = [
    1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 65.0, 66.0, 69.0, 70.0,
];

/// Description every flow filter must start with.
pub const FLOW_PERMIT_PATTERN: &str = r"^permit\s+out";

/// Build the subscriber configuration schema.
///
/// # Errors
///
/// Returns `SchemaDefinitionError` if the definition is malformed.
pub fn subscriber_schema() -> Result<FieldSpec, SchemaDefinitionError> {
    subscriber_builder().build()
}

/// Unchecked builder for the subscriber schema, for callers that extend it.
pub fn subscriber_builder() -> FieldBuilder {
    FieldSpec::object("Subscriber Configuration")
        .field(
            "imsi",
            FieldSpec::string("IMSI*")
                .required()
                .pattern(r"^\d+$")
                .max_length(15)
                .message(ConstraintKind::Pattern, "Only digits are allowed"),
        )
        .field(
            "security",
            FieldSpec::object("")
                .field("k", hex_key("Subscriber Key (K)*"))
                .field("op", hex_key("Operator Key (OP)*"))
                .field("amf", hex_key("Authentication Management Field (AMF)*")),
        )
        .field(
            "ambr",
            bitrate_pair("UE-AMBR Downlink (Kbps)*", "UE-AMBR Uplink (Kbps)*", true),
        )
        .field(
            "pdn",
            FieldSpec::array("APN Configurations")
                .min_items(1)
                .max_items(4)
                .message(ConstraintKind::MinItems, "At least 1 APN is required")
                .message(ConstraintKind::MaxItems, "4 APNs are supported")
                .items(pdn_context()),
        )
}

fn hex_key(title: &str) -> FieldBuilder {
    FieldSpec::string(title)
        .required()
        .pattern(HEX_PATTERN)
        .message(ConstraintKind::Pattern, HEX_MESSAGE)
}

fn bitrate_pair(downlink: &str, uplink: &str, required: bool) -> FieldBuilder {
    let (mut dl, mut ul) = (FieldSpec::number(downlink), FieldSpec::number(uplink));
    if required {
        dl = dl.required();
        ul = ul.required();
    }
    FieldSpec::object("").field("downlink", dl).field("uplink", ul)
}

fn pdn_context() -> FieldBuilder {
    FieldSpec::object("")
        .field("apn", FieldSpec::string("Access Point Name (APN)*").required())
        .field("qos", qos(false))
        .field(
            "ambr",
            bitrate_pair("APN-AMBR Downlink (Kbps)", "APN-AMBR Uplink (Kbps)", false),
        )
        .field(
            "pcc_rule",
            FieldSpec::array("PCC Rules")
                .max_items(8)
                .message(ConstraintKind::MaxItems, "8 PCC Rules are supported")
                .items(pcc_rule()),
        )
}

fn pcc_rule() -> FieldBuilder {
    FieldSpec::object("")
        .field(
            "flow",
            FieldSpec::array("")
                .min_items(1)
                .max_items(8)
                .message(ConstraintKind::MinItems, "At least 1 Flow is required")
                .message(ConstraintKind::MaxItems, "8 Flows are supported")
                .items(flow()),
        )
        .field(
            "qos",
            qos(true)
                .field(
                    "mbr",
                    bitrate_pair("MBR Downlink (Kbps)", "MBR Uplink (Kbps)", false),
                )
                .field(
                    "gbr",
                    bitrate_pair("GBR Downlink (Kbps)", "GBR Uplink (Kbps)", false),
                ),
        )
}

fn flow() -> FieldBuilder {
    FieldSpec::object("")
        .field(
            "direction",
            FieldSpec::number("Flow Direction*")
                .enum_values([1.0, 2.0])
                .enum_names(["Downlink", "Uplink"])
                .default(1),
        )
        .field(
            "description",
            FieldSpec::string("Description*")
                .default("permit out ip from any to any")
                .required()
                .pattern(FLOW_PERMIT_PATTERN)
                .message(
                    ConstraintKind::Pattern,
                    "Begin with reserved keyword 'permit out'.",
                ),
        )
}

/// QCI plus ARP. PCC rules also bound the vulnerability flag to `[0, 1]`
/// on top of its enum.
fn qos(bounded_vulnerability: bool) -> FieldBuilder {
    let mut vulnerability = FieldSpec::number("Vulnerability*").default(1);
    if bounded_vulnerability {
        vulnerability = vulnerability.minimum(0.0).maximum(1.0);
    }
    vulnerability = vulnerability
        .enum_values([1.0, 0.0])
        .enum_names(["Disabled", "Enabled"]);

    FieldSpec::object("")
        .field(
            "qci",
            FieldSpec::number("QoS Class Identifier (QCI)*")
                .enum_values(QCI_VALUES)
                .default(9),
        )
        .field(
            "arp",
            FieldSpec::object("")
                .field(
                    "priority_level",
                    FieldSpec::number("ARP Priority Level (1-15)*")
                        .default(8)
                        .minimum(1.0)
                        .maximum(15.0)
                        .required(),
                )
                .field(
                    "pre_emption_capability",
                    FieldSpec::number("Capability*")
                        .enum_values([1.0, 0.0])
                        .enum_names(["Disabled", "Enabled"])
                        .default(1),
                )
                .field("pre_emption_vulnerability", vulnerability),
        )
}

/// Base layout overlay for the subscriber schema.
pub fn subscriber_overlay() -> OverlayEntry {
    OverlayEntry::new()
        .with_field("imsi", column(12))
        .with_field(
            "security",
            OverlayEntry::new()
                .with_field("k", column(12))
                .with_field("op", column(7))
                .with_field("amf", column(5)),
        )
        .with_field("ambr", half_columns())
        .with_field(
            "pdn",
            OverlayEntry::new().with_items(
                OverlayEntry::new()
                    .with_field("qos", qos_overlay())
                    .with_field("ambr", half_columns())
                    .with_field(
                        "pcc_rule",
                        OverlayEntry::new().with_items(
                            OverlayEntry::new()
                                .with_field(
                                    "flow",
                                    OverlayEntry::new().with_items(
                                        OverlayEntry::new()
                                            .with_field("direction", column(12))
                                            .with_field(
                                                "description",
                                                column(12).with_help_text(
                                                    "Hint: Flow-Description(TS29.212), IPFilterRule(RFC 3588)",
                                                ),
                                            ),
                                    ),
                                )
                                .with_field(
                                    "qos",
                                    qos_overlay()
                                        .with_field("mbr", half_columns())
                                        .with_field("gbr", half_columns()),
                                ),
                        ),
                    ),
            ),
        )
}

fn column(width: u8) -> OverlayEntry {
    OverlayEntry::new().with_class_name(format!("col-xs-{}", width))
}

fn half_columns() -> OverlayEntry {
    OverlayEntry::new()
        .with_field("downlink", column(6))
        .with_field("uplink", column(6))
}

fn qos_overlay() -> OverlayEntry {
    OverlayEntry::new()
        .with_field(
            "qci",
            OverlayEntry::new()
                .with_widget(WidgetKind::Radio)
                .with_widget_option("inline", true),
        )
        .with_field(
            "arp",
            OverlayEntry::new()
                .with_field("priority_level", column(6))
                .with_field("pre_emption_capability", column(3))
                .with_field("pre_emption_vulnerability", column(3)),
        )
}
