//! Subscriber Schema
//!
//! Declarative configuration schema for a telecom subscriber record, with a
//! recursive validator, a default resolver, and a layout overlay that adapts
//! to the edit mode and viewport size.
//!
//! # Example
//!
//! ```
//! use subscriber_schema::{
//!     fill_record, validate, ConstraintKind, EditConfigController, FieldPath, Mode,
//!     OverlayContext, Viewport,
//! };
//! use serde_json::json;
//!
//! let controller = EditConfigController::new().unwrap();
//!
//! let record = json!({ "imsi": "12a3" });
//! let errors = validate(controller.schema(), Some(&record), &FieldPath::root());
//! assert_eq!(errors[0].path.to_string(), "imsi");
//! assert_eq!(errors[0].kind, ConstraintKind::Pattern);
//! assert_eq!(errors[0].message, "Only digits are allowed");
//!
//! // Defaults fill what's missing without adding array entries.
//! let filled = fill_record(controller.schema(), &json!({ "pdn": [{ "apn": "internet" }] }));
//! assert_eq!(filled["pdn"][0]["qos"]["qci"], 9);
//!
//! // Editing an existing subscriber locks its IMSI.
//! let overlay = controller.overlay(OverlayContext::new(Mode::Update, Viewport::Other));
//! assert_eq!(overlay.field("imsi").unwrap().disabled, Some(true));
//! ```
//!
//! # Grammar
//!
//! | Kind | Keywords |
//! |------|----------|
//! | all | `title`, `required`, `default`, `messages` |
//! | `string` | `pattern`, `maxLength` |
//! | `number` | `minimum`, `maximum`, `enum`, `enumNames` |
//! | `object` | `properties` |
//! | `array` | `items`, `minItems`, `maxItems` |
//!
//! Overlay entries use `className`, `widgetKind`, `widgetOptions`,
//! `helpText`, `disabled` and `autofocus`.

mod controller;
mod defaults;
mod error;
mod field;
mod loader;
mod overlay;
mod path;
mod record;
mod subscriber;
mod types;
mod validator;

pub use controller::{
    EditConfigController, EditInput, FormCallbacks, FormFlags, FormRenderer, FormView,
};
pub use defaults::{fill_defaults, fill_record};
pub use error::{
    LoadError, PathResolutionError, SchemaDefinitionError, SubmitError, ValidateError,
    ValidationError,
};
pub use field::{
    ArrayRules, FieldBuilder, FieldKind, FieldSpec, NumberRules, ObjectRules, Pattern,
    StringRules,
};
pub use loader::{load_json, load_json_str};
pub use overlay::{
    check_overlay, compose, ContextOverride, OverlayEntry, WidgetKind, KEY_FIELD, OVERLAY_KEYWORDS,
};
pub use path::{FieldPath, PathSegment};
pub use record::{
    Arp, Bitrate, Flow, FlowDirection, PccQos, PccRule, PdnContext, Qos, Security,
    SubscriberRecord,
};
pub use subscriber::{
    subscriber_builder, subscriber_overlay, subscriber_schema, FLOW_PERMIT_PATTERN, QCI_VALUES,
};
pub use types::{
    is_missing, json_type_name, ConstraintKind, FieldType, Mode, OverlayContext, Viewport,
};
pub use validator::{check, validate};
