//! Typed subscriber record, decoded from a validated JSON value.
//!
//! Numbers follow the schema's number kind: rates and levels are `f64`.
//! Fields restricted to an integer enum decode to `u8` from any integral
//! JSON number, so `9` and `9.0` are the same QCI.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::field::number_value;

/// A subscriber as stored and dispatched by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriberRecord {
    pub imsi: String,
    pub security: Security,
    pub ambr: Bitrate,
    pub pdn: Vec<PdnContext>,
}

/// Authentication keys, as hexadecimal text (whitespace allowed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub k: String,
    pub op: String,
    pub amf: String,
}

/// Downlink/uplink rate pair in Kbps.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bitrate {
    #[serde(
        default,
        serialize_with = "optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub downlink: Option<f64>,
    #[serde(
        default,
        serialize_with = "optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub uplink: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdnContext {
    pub apn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qos: Option<Qos>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambr: Option<Bitrate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pcc_rule: Vec<PccRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Qos {
    #[serde(
        default,
        deserialize_with = "enum_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub qci: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arp: Option<Arp>,
}

/// Allocation and Retention Priority.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arp {
    #[serde(serialize_with = "number")]
    pub priority_level: f64,
    #[serde(
        default,
        deserialize_with = "enum_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_emption_capability: Option<u8>,
    #[serde(
        default,
        deserialize_with = "enum_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_emption_vulnerability: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PccRule {
    pub flow: Vec<Flow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qos: Option<PccQos>,
}

/// Rule QoS: the APN QoS plus maximum and guaranteed bit rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PccQos {
    #[serde(flatten)]
    pub base: Qos,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbr: Option<Bitrate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gbr: Option<Bitrate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<FlowDirection>,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "u8")]
pub enum FlowDirection {
    Downlink,
    Uplink,
}

impl TryFrom<f64> for FlowDirection {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value == 1.0 {
            Ok(FlowDirection::Downlink)
        } else if value == 2.0 {
            Ok(FlowDirection::Uplink)
        } else {
            Err(format!("unknown flow direction {}", value))
        }
    }
}

impl From<FlowDirection> for u8 {
    fn from(direction: FlowDirection) -> Self {
        match direction {
            FlowDirection::Downlink => 1,
            FlowDirection::Uplink => 2,
        }
    }
}

// Integral values print as JSON integers.
fn number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    number_value(*value).serialize(serializer)
}

fn optional_number<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(n) => number(n, serializer),
        None => serializer.serialize_none(),
    }
}

/// Optional `u8` code written as any integral JSON number.
fn enum_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    let Some(n) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if n.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&n) {
        Ok(Some(n as u8))
    } else {
        Err(de::Error::custom(format!("expected a code in 0..=255, got {}", n)))
    }
}

impl SubscriberRecord {
    /// Decode from a JSON value. Undeclared keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when a field is missing or has the
    /// wrong type.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
