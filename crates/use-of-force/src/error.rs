//! Error types for use-of-force.
//!
//! This module defines all error types used throughout the crate, providing
//! enough context for a form to be re-rendered or a command to explain itself.

use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationError;

/// The main error type for use-of-force operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Document Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read an input document.
    #[error("failed to read document {path}: {source}")]
    DocumentRead {
        /// Path of the document.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Form Errors ===
    /// The named report section does not exist.
    #[error("unknown report section: {0}")]
    UnknownSection(String),

    /// User input failed form validation.
    #[error("{} validation error(s): {}", .errors.len(), summarise(.errors))]
    Validation {
        /// Per-field errors, in form order.
        errors: Vec<ValidationError>,
    },

    /// A report was submitted before every section was complete.
    #[error("report is incomplete: {}", .sections.join(", "))]
    ReportIncomplete {
        /// Sections that are not yet complete.
        sections: Vec<String>,
    },

    // === Lifecycle Errors ===
    /// An operation is not allowed in the entity's current status.
    #[error("cannot {action} {entity} with status {status}")]
    InvalidTransition {
        /// Kind of entity ("report" or "statement").
        entity: &'static str,
        /// Current status of the entity.
        status: String,
        /// The attempted action.
        action: &'static str,
    },

    /// The user does not hold a role allowing the action.
    #[error("permission denied: {action}")]
    PermissionDenied {
        /// The attempted action.
        action: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for use-of-force operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

fn summarise(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a validation error from per-field errors.
    #[must_use]
    pub fn validation(errors: Vec<ValidationError>) -> Self {
        Self::Validation { errors }
    }

    /// Create an invalid transition error.
    #[must_use]
    pub fn invalid_transition(
        entity: &'static str,
        status: impl std::fmt::Display,
        action: &'static str,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            status: status.to_string(),
            action,
        }
    }

    /// Create a permission denied error.
    #[must_use]
    pub fn permission_denied(action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Check if this error carries per-field validation errors.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error is a permission issue.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// The per-field errors, if this is a validation error.
    #[must_use]
    pub fn field_errors(&self) -> &[ValidationError] {
        match self {
            Self::Validation { errors } => errors,
            _ => &[],
        }
    }
}
