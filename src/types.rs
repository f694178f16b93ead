//! Core types shared by the schema, validator and overlay modules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a candidate value counts as "not provided".
///
/// Absent keys, `null`, and the empty string are all treated as missing,
/// matching what a form renderer reports for a cleared input.
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Whether the dialog creates a new subscriber or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Create,
    Update,
}

impl Mode {
    /// Title shown on the enclosing dialog.
    pub fn form_title(&self) -> &'static str {
        match self {
            Mode::Create => "Create Subscriber",
            Mode::Update => "Edit Subscriber",
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Mode::Create),
            "update" => Ok(Mode::Update),
            other => Err(format!("unknown mode \"{}\": expected create or update", other)),
        }
    }
}

/// Viewport size category supplied by the viewport-classification collaborator.
///
/// Treated as an opaque signal; no pixel measurement happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    Small,
    #[default]
    Other,
}

impl FromStr for Viewport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "small" => Ok(Viewport::Small),
            "other" => Ok(Viewport::Other),
            other => Err(format!(
                "unknown viewport \"{}\": expected small or other",
                other
            )),
        }
    }
}

/// The two runtime signals an overlay is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OverlayContext {
    pub mode: Mode,
    pub viewport: Viewport,
}

impl OverlayContext {
    pub fn new(mode: Mode, viewport: Viewport) -> Self {
        Self { mode, viewport }
    }
}

/// Kind of a field in the schema grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Object,
    Array,
}

impl FieldType {
    /// Grammar keyword for this kind.
    pub fn keyword(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }

    /// Parse a grammar `type` value. Returns `None` for unknown kinds.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(FieldType::String),
            "number" => Some(FieldType::Number),
            "object" => Some(FieldType::Object),
            "array" => Some(FieldType::Array),
            _ => None,
        }
    }

    /// Whether a present JSON value has the shape this kind expects.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Constraint that a validation error refers to.
///
/// Also the key type of per-field message overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintKind {
    Required,
    Type,
    Pattern,
    MaxLength,
    Minimum,
    Maximum,
    Enum,
    MinItems,
    MaxItems,
}

impl ConstraintKind {
    /// Grammar keyword for this constraint (as used in `messages`).
    pub fn keyword(&self) -> &'static str {
        match self {
            ConstraintKind::Required => "required",
            ConstraintKind::Type => "type",
            ConstraintKind::Pattern => "pattern",
            ConstraintKind::MaxLength => "maxLength",
            ConstraintKind::Minimum => "minimum",
            ConstraintKind::Maximum => "maximum",
            ConstraintKind::Enum => "enum",
            ConstraintKind::MinItems => "minItems",
            ConstraintKind::MaxItems => "maxItems",
        }
    }

    /// Parse a `messages` key. Returns `None` for unknown keywords.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "required" => Some(ConstraintKind::Required),
            "type" => Some(ConstraintKind::Type),
            "pattern" => Some(ConstraintKind::Pattern),
            "maxLength" => Some(ConstraintKind::MaxLength),
            "minimum" => Some(ConstraintKind::Minimum),
            "maximum" => Some(ConstraintKind::Maximum),
            "enum" => Some(ConstraintKind::Enum),
            "minItems" => Some(ConstraintKind::MinItems),
            "maxItems" => Some(ConstraintKind::MaxItems),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
