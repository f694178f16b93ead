//! Error types for schema construction, validation and record loading.

use std::path::PathBuf;
use thiserror::Error;

use crate::path::FieldPath;
use crate::types::ConstraintKind;

/// A malformed schema definition, detected while building a `FieldSpec`.
#[derive(Debug, Clone, Error)]
pub enum SchemaDefinitionError {
    #[error("array at {path} has no item spec")]
    MissingItems { path: String },

    #[error("array items at {path} must be an object, got {actual}")]
    ItemsNotObject { path: String, actual: String },

    #[error("invalid pattern \"{pattern}\" at {path}: {source}")]
    InvalidPattern {
        path: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("enumNames at {path} has {names} entries but enum has {values}")]
    EnumNamesMismatch {
        path: String,
        values: usize,
        names: usize,
    },

    #[error("invalid bounds at {path}: {message}")]
    InvalidBounds { path: String, message: String },

    #[error("keyword \"{keyword}\" at {path} does not apply to {kind} fields")]
    NotApplicable {
        path: String,
        keyword: String,
        kind: String,
    },

    #[error("duplicate field \"{name}\" at {path}")]
    DuplicateField { path: String, name: String },

    #[error("default at {path} should be {expected}, got {actual}")]
    DefaultTypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("unknown field type \"{value}\" at {path}")]
    UnknownType { path: String, value: String },

    #[error("invalid \"{keyword}\" at {path}: expected {expected}")]
    InvalidKeyword {
        path: String,
        keyword: String,
        expected: String,
    },

    #[error("overlay entry at {path} has no matching schema field")]
    UnknownOverlayPath { path: String },

    #[error("overlay field \"{name}\" at {path} collides with an overlay keyword")]
    ReservedOverlayName { path: String, name: String },
}

impl SchemaDefinitionError {
    /// Path of the field the fault was found on.
    pub fn path(&self) -> &str {
        match self {
            Self::MissingItems { path }
            | Self::ItemsNotObject { path, .. }
            | Self::InvalidPattern { path, .. }
            | Self::EnumNamesMismatch { path, .. }
            | Self::InvalidBounds { path, .. }
            | Self::NotApplicable { path, .. }
            | Self::DuplicateField { path, .. }
            | Self::DefaultTypeMismatch { path, .. }
            | Self::UnknownType { path, .. }
            | Self::InvalidKeyword { path, .. }
            | Self::UnknownOverlayPath { path }
            | Self::ReservedOverlayName { path, .. } => path,
        }
    }
}

/// A path that does not exist in the schema tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathResolutionError {
    #[error("path not found: {path}")]
    NotFound { path: String },
}

/// Single validation error with path context.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidationError {
    /// Path of the offending field, e.g. `pdn[0].pcc_rule`.
    pub path: FieldPath,
    /// Constraint that failed.
    pub kind: ConstraintKind,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_root() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Errors for callers that want validation as a `Result`.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<ValidationError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Errors while preparing a record for submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error("record does not match the subscriber layout: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
}

impl SubmitError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SubmitError::Validate(e) => e.exit_code(),
            SubmitError::Decode { .. } => 2,
        }
    }
}

/// Errors while loading JSON documents from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}
