//! Error types shared by the public-forms crates.
//!
//! [`PublicFormsError`] covers the failure modes that can escape a content
//! block's lifecycle: missing target rows, store failures, configuration
//! mistakes and unknown variations. Form validation failures are *not* part
//! of this enum's normal flow; they surface as `is_valid() == false` with
//! per-field error lists, and only become a [`ValidationError`] when a
//! caller explicitly asks for one.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// A validation error with optional field-level errors.
///
/// # Examples
///
/// ```
/// use public_forms_core::error::ValidationError;
///
/// let err = ValidationError::new("This field is required.", "required");
/// assert_eq!(err.to_string(), "This field is required.");
///
/// let mut field_errors = std::collections::BTreeMap::new();
/// field_errors.insert("title".to_string(), vec!["This field is required.".to_string()]);
/// let err = ValidationError::with_field_errors(field_errors);
/// assert_eq!(err.to_string(), "title: This field is required.");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "invalid").
    pub code: String,
    /// Per-field messages, keyed by field name.
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Creates a `ValidationError` holding per-field messages.
    pub fn with_field_errors(field_errors: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            message: String::new(),
            code: "invalid".to_string(),
            field_errors,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            return write!(f, "{}", self.message);
        }
        let mut first = true;
        for (field, errors) in &self.field_errors {
            for error in errors {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {error}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The error type for every fallible public-forms operation.
///
/// Each variant maps to an HTTP status code via [`PublicFormsError::status_code`].
#[derive(Error, Debug)]
pub enum PublicFormsError {
    // ── Store errors ─────────────────────────────────────────────────

    /// The targeted row does not exist.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// A generic store error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A store integrity constraint was violated.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    // ── Validation ───────────────────────────────────────────────────

    /// Raised only when a caller explicitly converts form errors.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The plugin is wired up incorrectly (excluded content type, bad inline).
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// A content block names a variation nobody registered.
    #[error("Unknown renderer variation: {0}")]
    UnknownVariation(String),

    /// A target reference names a model label nobody registered.
    #[error("Unknown content type: {0}")]
    UnknownContentType(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // ── Security ─────────────────────────────────────────────────────

    /// A potentially malicious operation was detected.
    #[error("Suspicious operation: {0}")]
    SuspiciousOperation(String),
}

impl PublicFormsError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `ValidationError`, `SuspiciousOperation` -> 400
    /// - `DoesNotExist` -> 404
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ValidationError(_) | Self::SuspiciousOperation(_) => 400,
            Self::DoesNotExist(_) => 404,
            Self::DatabaseError(_)
            | Self::IntegrityError(_)
            | Self::ConfigurationError(_)
            | Self::ImproperlyConfigured(_)
            | Self::UnknownVariation(_)
            | Self::UnknownContentType(_)
            | Self::SerializationError(_)
            | Self::IoError(_) => 500,
        }
    }
}

impl From<ValidationError> for PublicFormsError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

impl From<serde_json::Error> for PublicFormsError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, PublicFormsError>`.
pub type PublicFormsResult<T> = Result<T, PublicFormsError>;
