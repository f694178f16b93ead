//! Presentation overlay and its context-sensitive composition.
//!
//! An overlay is a sparse tree mirroring the schema's shape: nested field
//! entries by name, array element entries under `items`. Absent entries
//! mean "use the renderer default".
//!
//! # Composition Rules
//!
//! | Mode | Viewport | Effect on the `imsi` entry |
//! |------|----------|----------------------------|
//! | `Update` | any | `disabled: true` |
//! | `Create` | `Other` | `autofocus: true` |
//! | `Create` | `Small` | none, overlay equals the base |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::SchemaDefinitionError;
use crate::field::FieldSpec;
use crate::path::{FieldPath, PathSegment};
use crate::types::{Mode, OverlayContext, Viewport};

/// Field the context rules act on: the subscriber's primary key.
pub const KEY_FIELD: &str = "imsi";

/// Keys an entry's JSON form uses for itself. A child field with one of
/// these names can't be told apart from the keyword.
pub const OVERLAY_KEYWORDS: [&str; 7] = [
    "className",
    "widgetKind",
    "widgetOptions",
    "helpText",
    "disabled",
    "autofocus",
    "items",
];

/// Widget a renderer should use instead of its default for the field kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    /// Choose-one buttons; with `inline: true` they sit on one row.
    Radio,
    Select,
    Textarea,
    Hidden,
}

impl WidgetKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            WidgetKind::Radio => "radio",
            WidgetKind::Select => "select",
            WidgetKind::Textarea => "textarea",
            WidgetKind::Hidden => "hidden",
        }
    }
}

/// Layout hints for one field, plus entries for its children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayEntry {
    pub class_name: Option<String>,
    pub widget_kind: Option<WidgetKind>,
    /// Widget-specific options; empty means none.
    pub widget_options: Map<String, Value>,
    pub help_text: Option<String>,
    pub disabled: Option<bool>,
    pub autofocus: Option<bool>,
    fields: Vec<(String, OverlayEntry)>,
    items: Option<Box<OverlayEntry>>,
}

impl OverlayEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_widget(mut self, widget: WidgetKind) -> Self {
        self.widget_kind = Some(widget);
        self
    }

    pub fn with_widget_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.widget_options.insert(key.into(), value.into());
        self
    }

    pub fn with_help_text(mut self, help: impl Into<String>) -> Self {
        self.help_text = Some(help.into());
        self
    }

    /// Set the entry for a child field, replacing any previous one.
    pub fn with_field(mut self, name: impl Into<String>, entry: OverlayEntry) -> Self {
        let name = name.into();
        *self.entry_mut(&name) = entry;
        self
    }

    /// Set the entry applied to every element of an array field.
    pub fn with_items(mut self, entry: OverlayEntry) -> Self {
        self.items = Some(Box::new(entry));
        self
    }

    pub fn field(&self, name: &str) -> Option<&OverlayEntry> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, entry)| entry)
    }

    pub fn items(&self) -> Option<&OverlayEntry> {
        self.items.as_deref()
    }

    /// Mutable entry for a child field, inserting an empty one if absent.
    pub fn entry_mut(&mut self, name: &str) -> &mut OverlayEntry {
        let pos = match self.fields.iter().position(|(field, _)| field == name) {
            Some(pos) => pos,
            None => {
                self.fields.push((name.to_string(), OverlayEntry::default()));
                self.fields.len() - 1
            }
        };
        &mut self.fields[pos].1
    }

    /// Entry at `path`, if the overlay has one.
    pub fn get(&self, path: &FieldPath) -> Option<&OverlayEntry> {
        let mut current = self;
        for segment in path.segments() {
            current = match segment {
                PathSegment::Key(name) => current.field(name)?,
                PathSegment::Index(_) | PathSegment::Wildcard => current.items()?,
            };
        }
        Some(current)
    }

    /// Emit the overlay keywords consumed by a rendering collaborator.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        if let Some(class_name) = &self.class_name {
            map.insert("className".into(), class_name.clone().into());
        }
        if let Some(widget) = self.widget_kind {
            map.insert("widgetKind".into(), widget.keyword().into());
        }
        if !self.widget_options.is_empty() {
            map.insert(
                "widgetOptions".into(),
                Value::Object(self.widget_options.clone()),
            );
        }
        if let Some(help) = &self.help_text {
            map.insert("helpText".into(), help.clone().into());
        }
        if let Some(disabled) = self.disabled {
            map.insert("disabled".into(), disabled.into());
        }
        if let Some(autofocus) = self.autofocus {
            map.insert("autofocus".into(), autofocus.into());
        }
        for (name, entry) in &self.fields {
            map.insert(name.clone(), entry.to_json());
        }
        if let Some(items) = &self.items {
            map.insert("items".into(), items.to_json());
        }
        Value::Object(map)
    }

    fn walk(&self, path: &FieldPath, visit: &mut impl FnMut(&FieldPath, &OverlayEntry)) {
        for (name, entry) in &self.fields {
            let child = path.key(name);
            visit(&child, entry);
            entry.walk(&child, visit);
        }
        if let Some(items) = &self.items {
            let child = path.wildcard();
            visit(&child, items);
            items.walk(&child, visit);
        }
    }
}

/// Override applied to the key field for a given context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextOverride {
    /// Editing an existing subscriber: the key can't change.
    DisableKeyField,
    /// Creating on a large screen: start typing in the key field.
    FocusKeyField,
    Unchanged,
}

impl ContextOverride {
    /// Pure lookup from the two context signals.
    pub fn select(context: OverlayContext) -> Self {
        match (context.mode, context.viewport) {
            (Mode::Update, _) => ContextOverride::DisableKeyField,
            (Mode::Create, Viewport::Other) => ContextOverride::FocusKeyField,
            (Mode::Create, Viewport::Small) => ContextOverride::Unchanged,
        }
    }
}

/// Derive the overlay for `context` from `base`.
///
/// `base` is left untouched; the override is merged into a copy of the key
/// field's entry, so its other hints (e.g. `className`) survive.
pub fn compose(base: &OverlayEntry, context: OverlayContext) -> OverlayEntry {
    let rule = ContextOverride::select(context);
    debug!(mode = ?context.mode, viewport = ?context.viewport, ?rule, "composing overlay");

    let mut overlay = base.clone();
    match rule {
        ContextOverride::DisableKeyField => overlay.entry_mut(KEY_FIELD).disabled = Some(true),
        ContextOverride::FocusKeyField => overlay.entry_mut(KEY_FIELD).autofocus = Some(true),
        ContextOverride::Unchanged => {}
    }
    overlay
}

/// Report overlay entries whose path does not exist in `schema`, and
/// child fields named like an overlay keyword.
pub fn check_overlay(schema: &FieldSpec, overlay: &OverlayEntry) -> Vec<SchemaDefinitionError> {
    let mut errors = Vec::new();
    overlay.walk(&FieldPath::root(), &mut |path, _| {
        if let Some(PathSegment::Key(name)) = path.segments().last() {
            if OVERLAY_KEYWORDS.contains(&name.as_str()) {
                errors.push(SchemaDefinitionError::ReservedOverlayName {
                    path: path.to_string(),
                    name: name.clone(),
                });
            }
        }
        if schema.resolve(path).is_err() {
            errors.push(SchemaDefinitionError::UnknownOverlayPath {
                path: path.to_string(),
            });
        }
    });
    errors
}
