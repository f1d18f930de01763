//! Error types for the model runtime.
//!
//! Absence is never an error and validation failures are values
//! ([`ValidationReport`]); `ModelError` covers contract violations surfaced
//! through the fallible `try_*` entry points, schema registration problems,
//! JSON mapping problems, and validation failures a caller asked to turn
//! into an error.

use thiserror::Error;

use crate::validation::ValidationReport;
use crate::verify::SchemaError;

/// Errors produced by the model runtime.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The field name is not declared on the type.
    #[error("unknown field {field} on {model_type}")]
    UnknownField {
        /// Qualified type name.
        model_type: String,
        /// Requested field name.
        field: String,
    },

    /// A value does not conform to the field's declared type or cardinality.
    #[error("type mismatch for {model_type}.{field}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Qualified type name.
        model_type: String,
        /// Field name.
        field: String,
        /// Declared type.
        expected: String,
        /// Kind of the supplied value.
        found: String,
    },

    /// Two objects that must share a type do not.
    #[error("model type mismatch: expected {expected}, found {found}")]
    ModelTypeMismatch {
        /// Qualified name of the expected type.
        expected: String,
        /// Qualified name of the supplied type.
        found: String,
    },

    /// No registered type matches the name.
    #[error("unknown model type: {0}")]
    UnknownType(String),

    /// A type failed structural verification.
    #[error("invalid schema: {}", render_schema_errors(.0))]
    InvalidSchema(Vec<SchemaError>),

    /// A JSON document does not fit the declared field type.
    #[error("invalid JSON for {model_type}.{field}: expected {expected}, found {found}")]
    Json {
        /// Qualified type name.
        model_type: String,
        /// Field name.
        field: String,
        /// Declared type.
        expected: String,
        /// Offending JSON value.
        found: String,
    },

    /// A JSON document for a model object is not an object.
    #[error("expected a JSON object for {0}")]
    JsonNotObject(String),

    /// Validation produced failures.
    #[error("validation failed for {subject}: {report}")]
    Validation {
        /// Function or type that was validated.
        subject: String,
        /// Every result of the failed run.
        report: ValidationReport,
    },
}

/// Convenience alias for results with [`ModelError`].
pub type Result<T> = std::result::Result<T, ModelError>;

fn render_schema_errors(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
