//! Declarative field-constraint model.
//!
//! A [`FieldSpec`] describes one field: its kind, constraints, default and,
//! for containers, its children. Specs are assembled through a
//! [`FieldBuilder`], which checks the whole tree once at construction time:
//!
//! ```
//! use subscriber_schema::{ConstraintKind, FieldSpec};
//!
//! let spec = FieldSpec::object("Subscriber")
//!     .field(
//!         "imsi",
//!         FieldSpec::string("IMSI*")
//!             .required()
//!             .pattern(r"^\d+$")
//!             .max_length(15)
//!             .message(ConstraintKind::Pattern, "Only digits are allowed"),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(spec.field("imsi").unwrap().title(), "IMSI*");
//! ```

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{PathResolutionError, SchemaDefinitionError};
use crate::path::{FieldPath, PathSegment};
use crate::types::{json_type_name, ConstraintKind, FieldType};

/// A compiled regular expression that remembers its source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Immutable description of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    title: String,
    required: bool,
    default: Option<Value>,
    messages: BTreeMap<ConstraintKind, String>,
    kind: FieldKind,
}

/// Kind-specific constraints of a [`FieldSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String(StringRules),
    Number(NumberRules),
    Object(ObjectRules),
    Array(ArrayRules),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringRules {
    pub pattern: Option<Pattern>,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberRules {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub enum_values: Option<Vec<f64>>,
    /// Display labels, aligned index-for-index with `enum_values`.
    pub enum_names: Option<Vec<String>>,
}

/// Child fields of an object, in display order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectRules {
    fields: Vec<(String, FieldSpec)>,
}

impl ObjectRules {
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, spec)| spec)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRules {
    items: Box<FieldSpec>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

impl ArrayRules {
    /// Spec every element is checked against. Always an object.
    pub fn items(&self) -> &FieldSpec {
        &self.items
    }
}

impl FieldSpec {
    pub fn string(title: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(FieldType::String, title)
    }

    pub fn number(title: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(FieldType::Number, title)
    }

    pub fn object(title: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(FieldType::Object, title)
    }

    pub fn array(title: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(FieldType::Array, title)
    }

    /// Read a spec from its JSON grammar.
    ///
    /// # Errors
    ///
    /// Returns the first `SchemaDefinitionError` found in the document.
    pub fn from_json(value: &Value) -> Result<Self, SchemaDefinitionError> {
        FieldBuilder::from_json(value)?.build()
    }

    /// Read a spec from its JSON grammar, dropping malformed fields from
    /// their parent instead of failing.
    ///
    /// Returns the surviving spec (`None` if the root itself is malformed)
    /// and every definition error encountered. A root failure is always the
    /// last error.
    pub fn from_json_partial(value: &Value) -> (Option<Self>, Vec<SchemaDefinitionError>) {
        let mut errors = Vec::new();
        match parse_builder(value, &FieldPath::root(), Some(&mut errors)) {
            Ok(builder) => {
                let (spec, pruned) = builder.build_partial();
                errors.extend(pruned);
                (spec, errors)
            }
            Err(err) => {
                errors.push(err);
                (None, errors)
            }
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Override message for a constraint, if one is declared.
    pub fn message(&self, kind: ConstraintKind) -> Option<&str> {
        self.messages.get(&kind).map(String::as_str)
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn field_type(&self) -> FieldType {
        match self.kind {
            FieldKind::String(_) => FieldType::String,
            FieldKind::Number(_) => FieldType::Number,
            FieldKind::Object(_) => FieldType::Object,
            FieldKind::Array(_) => FieldType::Array,
        }
    }

    /// Direct child of an object spec.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        match &self.kind {
            FieldKind::Object(rules) => rules.get(name),
            _ => None,
        }
    }

    /// Follow `path` from this spec.
    ///
    /// Field steps select object children; index and wildcard steps select
    /// an array's item spec.
    ///
    /// # Errors
    ///
    /// Returns `PathResolutionError::NotFound` if any step does not exist.
    pub fn resolve(&self, path: &FieldPath) -> Result<&FieldSpec, PathResolutionError> {
        let mut current = self;
        for segment in path.segments() {
            let next = match (&current.kind, segment) {
                (FieldKind::Object(rules), PathSegment::Key(name)) => rules.get(name),
                (FieldKind::Array(rules), PathSegment::Index(_) | PathSegment::Wildcard) => {
                    Some(rules.items())
                }
                _ => None,
            };
            current = next.ok_or_else(|| PathResolutionError::NotFound {
                path: path.to_string(),
            })?;
        }
        Ok(current)
    }

    /// Emit the JSON grammar consumed by a rendering collaborator.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), self.field_type().keyword().into());
        map.insert("title".into(), self.title.clone().into());
        if self.required {
            map.insert("required".into(), Value::Bool(true));
        }

        match &self.kind {
            FieldKind::String(rules) => {
                if let Some(pattern) = &rules.pattern {
                    map.insert("pattern".into(), pattern.as_str().into());
                }
                if let Some(max) = rules.max_length {
                    map.insert("maxLength".into(), max.into());
                }
            }
            FieldKind::Number(rules) => {
                if let Some(min) = rules.minimum {
                    map.insert("minimum".into(), number_value(min));
                }
                if let Some(max) = rules.maximum {
                    map.insert("maximum".into(), number_value(max));
                }
                if let Some(values) = &rules.enum_values {
                    let values = values.iter().copied().map(number_value).collect();
                    map.insert("enum".into(), Value::Array(values));
                }
                if let Some(names) = &rules.enum_names {
                    map.insert("enumNames".into(), names.clone().into());
                }
            }
            FieldKind::Object(rules) => {
                let properties = rules
                    .fields()
                    .map(|(name, spec)| (name.to_string(), spec.to_json()))
                    .collect();
                map.insert("properties".into(), Value::Object(properties));
            }
            FieldKind::Array(rules) => {
                if let Some(min) = rules.min_items {
                    map.insert("minItems".into(), min.into());
                }
                if let Some(max) = rules.max_items {
                    map.insert("maxItems".into(), max.into());
                }
                map.insert("items".into(), rules.items().to_json());
            }
        }

        if let Some(default) = &self.default {
            map.insert("default".into(), default.clone());
        }
        if !self.messages.is_empty() {
            let messages = self
                .messages
                .iter()
                .map(|(kind, msg)| (kind.keyword().to_string(), Value::String(msg.clone())))
                .collect();
            map.insert("messages".into(), Value::Object(messages));
        }

        Value::Object(map)
    }
}

/// Render whole numbers without a trailing `.0`.
pub(crate) fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

fn display_path(path: &FieldPath) -> String {
    if path.is_root() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

/// Incremental, unchecked description of a field. See [`FieldSpec`].
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    field_type: FieldType,
    title: String,
    required: bool,
    default: Option<Value>,
    messages: BTreeMap<ConstraintKind, String>,
    pattern: Option<String>,
    max_length: Option<usize>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    enum_values: Option<Vec<f64>>,
    enum_names: Option<Vec<String>>,
    fields: Vec<(String, FieldBuilder)>,
    items: Option<Box<FieldBuilder>>,
    min_items: Option<usize>,
    max_items: Option<usize>,
}

impl FieldBuilder {
    pub fn new(field_type: FieldType, title: impl Into<String>) -> Self {
        Self {
            field_type,
            title: title.into(),
            required: false,
            default: None,
            messages: BTreeMap::new(),
            pattern: None,
            max_length: None,
            minimum: None,
            maximum: None,
            enum_values: None,
            enum_names: None,
            fields: Vec::new(),
            items: None,
            min_items: None,
            max_items: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn message(mut self, kind: ConstraintKind, message: impl Into<String>) -> Self {
        self.messages.insert(kind, message.into());
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    pub fn maximum(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }

    pub fn enum_values(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }

    pub fn enum_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.enum_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Append a child field. Declaration order is display order.
    pub fn field(mut self, name: impl Into<String>, child: FieldBuilder) -> Self {
        self.fields.push((name.into(), child));
        self
    }

    pub fn items(mut self, item: FieldBuilder) -> Self {
        self.items = Some(Box::new(item));
        self
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Check the whole tree and produce a spec.
    ///
    /// # Errors
    ///
    /// Returns the first `SchemaDefinitionError` found, in pre-order.
    pub fn build(self) -> Result<FieldSpec, SchemaDefinitionError> {
        let mut pruned = Vec::new();
        let spec = self.assemble(&FieldPath::root(), &mut pruned)?;
        match pruned.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(spec),
        }
    }

    /// Check the whole tree, dropping malformed fields from their parent.
    ///
    /// Returns the surviving spec (`None` if the root itself is malformed)
    /// and every definition error encountered.
    pub fn build_partial(self) -> (Option<FieldSpec>, Vec<SchemaDefinitionError>) {
        let mut errors = Vec::new();
        match self.assemble(&FieldPath::root(), &mut errors) {
            Ok(spec) => (Some(spec), errors),
            Err(err) => {
                errors.push(err);
                (None, errors)
            }
        }
    }

    fn assemble(
        self,
        path: &FieldPath,
        pruned: &mut Vec<SchemaDefinitionError>,
    ) -> Result<FieldSpec, SchemaDefinitionError> {
        self.check_applicable(path)?;

        if let Some(default) = &self.default {
            if !self.field_type.accepts(default) {
                return Err(SchemaDefinitionError::DefaultTypeMismatch {
                    path: display_path(path),
                    expected: self.field_type.to_string(),
                    actual: json_type_name(default).to_string(),
                });
            }
        }

        let kind = match self.field_type {
            FieldType::String => {
                let pattern = match &self.pattern {
                    Some(source) => Some(Pattern::new(source).map_err(|source_err| {
                        SchemaDefinitionError::InvalidPattern {
                            path: display_path(path),
                            pattern: source.clone(),
                            source: source_err,
                        }
                    })?),
                    None => None,
                };
                FieldKind::String(StringRules {
                    pattern,
                    max_length: self.max_length,
                })
            }
            FieldType::Number => {
                if let (Some(min), Some(max)) = (self.minimum, self.maximum) {
                    if min > max {
                        return Err(SchemaDefinitionError::InvalidBounds {
                            path: display_path(path),
                            message: format!("minimum {} exceeds maximum {}", min, max),
                        });
                    }
                }
                if let Some(names) = &self.enum_names {
                    let values = self.enum_values.as_ref().map_or(0, Vec::len);
                    if names.len() != values {
                        return Err(SchemaDefinitionError::EnumNamesMismatch {
                            path: display_path(path),
                            values,
                            names: names.len(),
                        });
                    }
                }
                FieldKind::Number(NumberRules {
                    minimum: self.minimum,
                    maximum: self.maximum,
                    enum_values: self.enum_values,
                    enum_names: self.enum_names,
                })
            }
            FieldType::Object => {
                let mut fields: Vec<(String, FieldSpec)> = Vec::with_capacity(self.fields.len());
                for (name, child) in self.fields {
                    if fields.iter().any(|(existing, _)| *existing == name) {
                        let err = SchemaDefinitionError::DuplicateField {
                            path: display_path(path),
                            name,
                        };
                        warn!(error = %err, "dropping field from schema");
                        pruned.push(err);
                        continue;
                    }
                    match child.assemble(&path.key(&name), pruned) {
                        Ok(spec) => fields.push((name, spec)),
                        Err(err) => {
                            warn!(error = %err, "dropping field from schema");
                            pruned.push(err);
                        }
                    }
                }
                FieldKind::Object(ObjectRules { fields })
            }
            FieldType::Array => {
                let Some(items) = self.items else {
                    return Err(SchemaDefinitionError::MissingItems {
                        path: display_path(path),
                    });
                };
                if items.field_type != FieldType::Object {
                    return Err(SchemaDefinitionError::ItemsNotObject {
                        path: display_path(path),
                        actual: items.field_type.to_string(),
                    });
                }
                if let (Some(min), Some(max)) = (self.min_items, self.max_items) {
                    if min > max {
                        return Err(SchemaDefinitionError::InvalidBounds {
                            path: display_path(path),
                            message: format!("minItems {} exceeds maxItems {}", min, max),
                        });
                    }
                }
                let items = items.assemble(&path.wildcard(), pruned)?;
                FieldKind::Array(ArrayRules {
                    items: Box::new(items),
                    min_items: self.min_items,
                    max_items: self.max_items,
                })
            }
        };

        Ok(FieldSpec {
            title: self.title,
            required: self.required,
            default: self.default,
            messages: self.messages,
            kind,
        })
    }

    fn check_applicable(&self, path: &FieldPath) -> Result<(), SchemaDefinitionError> {
        let keywords = [
            ("pattern", self.pattern.is_some(), FieldType::String),
            ("maxLength", self.max_length.is_some(), FieldType::String),
            ("minimum", self.minimum.is_some(), FieldType::Number),
            ("maximum", self.maximum.is_some(), FieldType::Number),
            ("enum", self.enum_values.is_some(), FieldType::Number),
            ("enumNames", self.enum_names.is_some(), FieldType::Number),
            ("properties", !self.fields.is_empty(), FieldType::Object),
            ("items", self.items.is_some(), FieldType::Array),
            ("minItems", self.min_items.is_some(), FieldType::Array),
            ("maxItems", self.max_items.is_some(), FieldType::Array),
        ];

        for (keyword, present, owner) in keywords {
            if present && owner != self.field_type {
                return Err(SchemaDefinitionError::NotApplicable {
                    path: display_path(path),
                    keyword: keyword.to_string(),
                    kind: self.field_type.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Read an unchecked builder from the JSON grammar.
    ///
    /// Unknown keywords are ignored so renderer-specific extensions pass
    /// through. Tree-level checks happen in [`FieldBuilder::build`].
    ///
    /// # Errors
    ///
    /// Returns `SchemaDefinitionError` for an unknown `type` or a keyword
    /// whose value has the wrong JSON type.
    pub fn from_json(value: &Value) -> Result<Self, SchemaDefinitionError> {
        parse_builder(value, &FieldPath::root(), None)
    }
}

// --- JSON grammar parsing ---

/// With `pruned` set, a malformed property is dropped from its object and
/// recorded there; otherwise the first fault is returned.
fn parse_builder(
    value: &Value,
    path: &FieldPath,
    mut pruned: Option<&mut Vec<SchemaDefinitionError>>,
) -> Result<FieldBuilder, SchemaDefinitionError> {
    let Some(map) = value.as_object() else {
        return Err(invalid_keyword(path, "type", "a field definition object"));
    };

    let type_name = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_keyword(path, "type", "string"))?;
    let field_type =
        FieldType::parse(type_name).ok_or_else(|| SchemaDefinitionError::UnknownType {
            path: display_path(path),
            value: type_name.to_string(),
        })?;

    let title = keyword_str(map, "title", path)?.unwrap_or_default();
    let mut builder = FieldBuilder::new(field_type, title);

    if let Some(required) = map.get("required") {
        builder.required = required
            .as_bool()
            .ok_or_else(|| invalid_keyword(path, "required", "boolean"))?;
    }
    builder.default = map.get("default").cloned();
    builder.pattern = keyword_str(map, "pattern", path)?;
    builder.max_length = keyword_usize(map, "maxLength", path)?;
    builder.minimum = keyword_f64(map, "minimum", path)?;
    builder.maximum = keyword_f64(map, "maximum", path)?;
    builder.min_items = keyword_usize(map, "minItems", path)?;
    builder.max_items = keyword_usize(map, "maxItems", path)?;

    if let Some(values) = map.get("enum") {
        let values = values
            .as_array()
            .and_then(|arr| arr.iter().map(Value::as_f64).collect::<Option<Vec<_>>>())
            .ok_or_else(|| invalid_keyword(path, "enum", "array of numbers"))?;
        builder.enum_values = Some(values);
    }

    if let Some(names) = map.get("enumNames") {
        let names = names
            .as_array()
            .and_then(|arr| {
                arr.iter()
                    .map(|v| v.as_str().map(String::from))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| invalid_keyword(path, "enumNames", "array of strings"))?;
        builder.enum_names = Some(names);
    }

    if let Some(messages) = map.get("messages") {
        let messages = messages
            .as_object()
            .ok_or_else(|| invalid_keyword(path, "messages", "object"))?;
        for (key, message) in messages {
            let kind = ConstraintKind::parse(key)
                .ok_or_else(|| invalid_keyword(path, "messages", "constraint keyword keys"))?;
            let message = message
                .as_str()
                .ok_or_else(|| invalid_keyword(path, "messages", "string values"))?;
            builder.messages.insert(kind, message.to_string());
        }
    }

    if let Some(properties) = map.get("properties") {
        let properties = properties
            .as_object()
            .ok_or_else(|| invalid_keyword(path, "properties", "object"))?;
        for (name, child) in properties {
            match parse_builder(child, &path.key(name), pruned.as_deref_mut()) {
                Ok(child) => builder.fields.push((name.clone(), child)),
                Err(err) => match pruned.as_deref_mut() {
                    Some(pruned) => {
                        warn!(error = %err, "dropping field from schema");
                        pruned.push(err);
                    }
                    None => return Err(err),
                },
            }
        }
    }

    if let Some(items) = map.get("items") {
        builder.items = Some(Box::new(parse_builder(items, &path.wildcard(), pruned)?));
    }

    Ok(builder)
}

fn invalid_keyword(path: &FieldPath, keyword: &str, expected: &str) -> SchemaDefinitionError {
    SchemaDefinitionError::InvalidKeyword {
        path: display_path(path),
        keyword: keyword.to_string(),
        expected: expected.to_string(),
    }
}

fn keyword_str(
    map: &Map<String, Value>,
    keyword: &str,
    path: &FieldPath,
) -> Result<Option<String>, SchemaDefinitionError> {
    map.get(keyword)
        .map(|v| {
            v.as_str()
                .map(String::from)
                .ok_or_else(|| invalid_keyword(path, keyword, "string"))
        })
        .transpose()
}

fn keyword_f64(
    map: &Map<String, Value>,
    keyword: &str,
    path: &FieldPath,
) -> Result<Option<f64>, SchemaDefinitionError> {
    map.get(keyword)
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| invalid_keyword(path, keyword, "number"))
        })
        .transpose()
}

fn keyword_usize(
    map: &Map<String, Value>,
    keyword: &str,
    path: &FieldPath,
) -> Result<Option<usize>, SchemaDefinitionError> {
    map.get(keyword)
        .map(|v| {
            v.as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| invalid_keyword(path, keyword, "non-negative integer"))
        })
        .transpose()
}
