//! Edit dialog orchestration.
//!
//! The controller owns the schema and base overlay, built once. Every call
//! recomputes the overlay from `(mode, viewport)`; nothing derived is cached.
//! Callbacks supplied by the caller reach the renderer as-is.

use serde_json::Value;
use tracing::{debug, warn};

use crate::defaults::fill_record;
use crate::error::{SchemaDefinitionError, SubmitError, ValidationError};
use crate::field::FieldSpec;
use crate::overlay::{check_overlay, compose, OverlayEntry};
use crate::record::SubscriberRecord;
use crate::subscriber::{subscriber_overlay, subscriber_schema};
use crate::types::{Mode, OverlayContext, Viewport};
use crate::validator::check;

/// Presentation flags passed straight through to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormFlags {
    pub visible: bool,
    pub disabled: bool,
    pub is_loading: bool,
    pub disable_submit_button: bool,
}

impl Default for FormFlags {
    fn default() -> Self {
        Self {
            visible: true,
            disabled: false,
            is_loading: false,
            disable_submit_button: false,
        }
    }
}

/// Inputs for one render of the edit dialog.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditInput<'a> {
    pub mode: Mode,
    pub viewport: Viewport,
    /// Current record for pre-filling, if any. Owned by the caller.
    pub record: Option<&'a Value>,
    pub flags: FormFlags,
}

impl<'a> EditInput<'a> {
    pub fn new(mode: Mode, viewport: Viewport) -> Self {
        Self {
            mode,
            viewport,
            ..Self::default()
        }
    }

    pub fn with_record(mut self, record: &'a Value) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_flags(mut self, flags: FormFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn context(&self) -> OverlayContext {
        OverlayContext::new(self.mode, self.viewport)
    }
}

/// Everything a renderer needs to draw the dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct FormView<'a> {
    pub title: &'static str,
    pub schema: &'a FieldSpec,
    pub overlay: OverlayEntry,
    pub record: Option<&'a Value>,
    pub flags: FormFlags,
}

type ValueCallback<'a> = Box<dyn FnMut(&Value) + 'a>;
type ErrorCallback<'a> = Box<dyn FnMut(&[ValidationError]) + 'a>;
type CustomValidate<'a> = Box<dyn Fn(&Value) -> Vec<ValidationError> + 'a>;

/// Caller-supplied event handlers, forwarded to the renderer untouched.
#[derive(Default)]
pub struct FormCallbacks<'a> {
    pub on_change: Option<ValueCallback<'a>>,
    pub on_submit: Option<ValueCallback<'a>>,
    pub on_error: Option<ErrorCallback<'a>>,
    /// Extra checks run by the renderer alongside schema validation.
    pub validate: Option<CustomValidate<'a>>,
    pub on_hide: Option<Box<dyn FnMut() + 'a>>,
}

impl<'a> FormCallbacks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_change(mut self, f: impl FnMut(&Value) + 'a) -> Self {
        self.on_change = Some(Box::new(f));
        self
    }

    pub fn on_submit(mut self, f: impl FnMut(&Value) + 'a) -> Self {
        self.on_submit = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&[ValidationError]) + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn validate(mut self, f: impl Fn(&Value) -> Vec<ValidationError> + 'a) -> Self {
        self.validate = Some(Box::new(f));
        self
    }

    pub fn on_hide(mut self, f: impl FnMut() + 'a) -> Self {
        self.on_hide = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for FormCallbacks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormCallbacks")
            .field("on_change", &self.on_change.is_some())
            .field("on_submit", &self.on_submit.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("validate", &self.validate.is_some())
            .field("on_hide", &self.on_hide.is_some())
            .finish()
    }
}

/// Rendering collaborator: draws the form and drives its callbacks.
pub trait FormRenderer {
    type Output;

    fn render(&mut self, view: FormView<'_>, callbacks: FormCallbacks<'_>) -> Self::Output;
}

/// Produces the `(schema, overlay)` pair for the subscriber edit dialog.
#[derive(Debug, Clone)]
pub struct EditConfigController {
    schema: FieldSpec,
    base_overlay: OverlayEntry,
}

impl EditConfigController {
    /// Controller for the subscriber schema and its base overlay.
    ///
    /// # Errors
    ///
    /// Returns `SchemaDefinitionError` if the schema or overlay is malformed.
    pub fn new() -> Result<Self, SchemaDefinitionError> {
        Self::with_parts(subscriber_schema()?, subscriber_overlay())
    }

    /// Controller for any schema/overlay pair.
    ///
    /// # Errors
    ///
    /// Returns the first `check_overlay` fault: an overlay entry for a field
    /// the schema doesn't have, or one named like an overlay keyword.
    pub fn with_parts(
        schema: FieldSpec,
        base_overlay: OverlayEntry,
    ) -> Result<Self, SchemaDefinitionError> {
        let mut errors = check_overlay(&schema, &base_overlay);
        for err in &errors {
            warn!(error = %err, "overlay does not match schema");
        }
        if !errors.is_empty() {
            return Err(errors.remove(0));
        }

        Ok(Self {
            schema,
            base_overlay,
        })
    }

    pub fn schema(&self) -> &FieldSpec {
        &self.schema
    }

    pub fn base_overlay(&self) -> &OverlayEntry {
        &self.base_overlay
    }

    /// Overlay for the given context, recomputed on every call.
    pub fn overlay(&self, context: OverlayContext) -> OverlayEntry {
        compose(&self.base_overlay, context)
    }

    pub fn view<'a>(&'a self, input: EditInput<'a>) -> FormView<'a> {
        debug!(mode = ?input.mode, viewport = ?input.viewport, "building form view");
        FormView {
            title: input.mode.form_title(),
            schema: &self.schema,
            overlay: self.overlay(input.context()),
            record: input.record,
            flags: input.flags,
        }
    }

    /// Hand the view and the caller's callbacks to `renderer`.
    pub fn render<R: FormRenderer>(
        &self,
        renderer: &mut R,
        input: EditInput<'_>,
        callbacks: FormCallbacks<'_>,
    ) -> R::Output {
        renderer.render(self.view(input), callbacks)
    }

    /// Fill defaults, validate and decode a record ready for dispatch.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::Validate` with every validation error, or
    /// `SubmitError::Decode` if the filled record doesn't fit the typed
    /// layout.
    pub fn prepare_submission(&self, record: &Value) -> Result<SubscriberRecord, SubmitError> {
        let filled = fill_record(&self.schema, record);
        check(&self.schema, &filled)?;
        SubscriberRecord::from_value(&filled).map_err(|source| SubmitError::Decode { source })
    }
}
