//! Validation results, validator traits and the built-in validators.
//!
//! Every check produces a [`ValidationResult`], successful or not; a run
//! never stops at the first failure. Validators are strategies looked up
//! per type through [`ModelMeta`](crate::ModelMeta) and composed by the
//! [`ValidationPipeline`].

mod cardinality;
mod checks;
mod exists;
mod format;
mod pipeline;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::object::ModelObject;
use crate::path::Path;

pub use cardinality::CardinalityValidator;
pub use checks::{check_cardinality, check_number, check_string};
pub use exists::{OnlyExists, OnlyExistsValidator};
pub use format::TypeFormatValidator;
pub use pipeline::{PipelineConfig, ValidationPipeline, ValidationReport};

/// Field names passed to an only-exists check.
pub type FieldSet = BTreeSet<String>;

/// Builds a [`FieldSet`] from string literals.
///
/// ```
/// use modelkit_core::validation::field_set;
///
/// let fields = field_set(["street", "city"]);
/// assert!(fields.contains("city"));
/// ```
pub fn field_set<I, S>(names: I) -> FieldSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

/// Kind of validation that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationType {
    /// Presence count within the field's bounds.
    Cardinality,
    /// Numeric range, digits, string length and pattern.
    TypeFormat,
    /// Exactly a given set of fields is present.
    OnlyExists,
}

impl fmt::Display for ValidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cardinality => "CARDINALITY",
            Self::TypeFormat => "TYPE_FORMAT",
            Self::OnlyExists => "ONLY_EXISTS",
        })
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Simple name of the validated type.
    pub model_type: String,
    /// Validation kind.
    pub kind: ValidationType,
    /// Location of the checked field or object.
    pub path: Path,
    /// Why the check failed; `None` on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl ValidationResult {
    /// A passing result.
    pub fn success(model_type: impl Into<String>, kind: ValidationType, path: Path) -> Self {
        Self::new(model_type, kind, path, None)
    }

    /// A failing result.
    pub fn failure(
        model_type: impl Into<String>,
        kind: ValidationType,
        path: Path,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(model_type, kind, path, Some(reason.into()))
    }

    /// A result that fails iff `failure_reason` is set.
    pub fn new(
        model_type: impl Into<String>,
        kind: ValidationType,
        path: Path,
        failure_reason: Option<String>,
    ) -> Self {
        Self {
            model_type: model_type.into(),
            kind,
            path,
            failure_reason,
        }
    }

    /// Returns `true` if the check passed.
    pub fn is_success(&self) -> bool {
        self.failure_reason.is_none()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure_reason {
            None => write!(f, "{} {} passed at {}", self.model_type, self.kind, self.path),
            Some(reason) => write!(
                f,
                "{} {} failed at {}: {reason}",
                self.model_type, self.kind, self.path
            ),
        }
    }
}

/// A check over one object that yields one result per comparison.
pub trait Validator: Send + Sync {
    /// Validates `object`, located at `path`.
    fn validate(&self, path: &Path, object: &dyn ModelObject) -> Vec<ValidationResult>;
}

/// A check parameterized by a caller-supplied argument.
pub trait ValidatorWithArg<A: ?Sized>: Send + Sync {
    /// Validates `object`, located at `path`, against `arg`.
    fn validate(&self, path: &Path, object: &dyn ModelObject, arg: &A) -> ValidationResult;
}
