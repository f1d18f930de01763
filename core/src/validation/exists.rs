use std::fmt;
use std::sync::Arc;

use crate::object::ModelObject;
use crate::path::Path;

use super::{FieldSet, ValidationResult, ValidationType, Validator, ValidatorWithArg};

/// Checks that exactly a given set of fields is present.
///
/// Used for choice groups: the set of fields holding a value must equal the
/// target set, no more and no less.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use modelkit_core::*;
/// use modelkit_core::validation::{OnlyExistsValidator, ValidatorWithArg, field_set};
///
/// let address = Arc::new(
///     ModelType::new("Address")
///         .with_field(Field::string("street"))
///         .with_field(Field::string("city"))
///         .with_field(Field::string("zipCode")),
/// );
/// let value = ModelBuilder::new(&address)
///     .with("street", "Main")
///     .with("city", "York")
///     .with("zipCode", "Y01")
///     .build();
///
/// let result = OnlyExistsValidator.validate(
///     &Path::new("Address"),
///     &value,
///     &field_set(["street", "city"]),
/// );
/// assert_eq!(
///     result.failure_reason.as_deref(),
///     Some("[street, city] should only be set. Set fields: [street, city, zipCode]")
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlyExistsValidator;

impl ValidatorWithArg<FieldSet> for OnlyExistsValidator {
    fn validate(&self, path: &Path, object: &dyn ModelObject, fields: &FieldSet) -> ValidationResult {
        let set = object.set_field_names();
        let exact = set.len() == fields.len() && set.iter().all(|name| fields.contains(*name));
        let model_type = object.type_name();
        if exact {
            return ValidationResult::success(model_type, ValidationType::OnlyExists, path.clone());
        }

        let declared = object.model_type().fields();
        let mut target: Vec<&str> = declared
            .iter()
            .map(|field| field.name.as_str())
            .filter(|name| fields.contains(*name))
            .collect();
        target.extend(
            fields
                .iter()
                .map(String::as_str)
                .filter(|name| object.model_type().field_index(name).is_none()),
        );
        ValidationResult::failure(
            model_type,
            ValidationType::OnlyExists,
            path.clone(),
            format!(
                "[{}] should only be set. Set fields: [{}]",
                target.join(", "),
                set.join(", ")
            ),
        )
    }
}

/// An only-exists check bound to its target fields, usable as a
/// [`Validator`].
#[derive(Clone)]
pub struct OnlyExists {
    validator: Arc<dyn ValidatorWithArg<FieldSet>>,
    fields: FieldSet,
}

impl OnlyExists {
    /// Binds `validator` to `fields`.
    pub fn new(validator: Arc<dyn ValidatorWithArg<FieldSet>>, fields: FieldSet) -> Self {
        Self { validator, fields }
    }

    /// The target field set.
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }
}

impl Validator for OnlyExists {
    fn validate(&self, path: &Path, object: &dyn ModelObject) -> Vec<ValidationResult> {
        vec![self.validator.validate(path, object, &self.fields)]
    }
}

impl fmt::Debug for OnlyExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnlyExists")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ModelBuilder;
    use crate::types::{Field, ModelType};
    use crate::validation::field_set;

    fn address() -> Arc<ModelType> {
        Arc::new(
            ModelType::new("Address")
                .with_field(Field::string("street"))
                .with_field(Field::string("city"))
                .with_field(Field::string("zipCode")),
        )
    }

    #[test]
    fn test_exact_set_succeeds() {
        let builder = ModelBuilder::new(&address()).with("city", "York").with("street", "Main");
        let result =
            OnlyExistsValidator.validate(&Path::new("Address"), &builder, &field_set(["street", "city"]));
        assert!(result.is_success());
        assert_eq!(result.kind, ValidationType::OnlyExists);
        assert_eq!(result.path.to_string(), "Address");
    }

    #[test]
    fn test_missing_field_fails() {
        let builder = ModelBuilder::new(&address()).with("street", "Main");
        let result =
            OnlyExistsValidator.validate(&Path::new("Address"), &builder, &field_set(["street", "city"]));
        assert_eq!(
            result.failure_reason.as_deref(),
            Some("[street, city] should only be set. Set fields: [street]")
        );
    }

    #[test]
    fn test_unknown_target_names_are_listed_last() {
        let builder = ModelBuilder::new(&address()).with("street", "Main");
        let result = OnlyExistsValidator.validate(
            &Path::new("Address"),
            &builder,
            &field_set(["country", "street"]),
        );
        assert_eq!(
            result.failure_reason.as_deref(),
            Some("[street, country] should only be set. Set fields: [street]")
        );
    }

    #[test]
    fn test_bound_validator() {
        let bound = OnlyExists::new(Arc::new(OnlyExistsValidator), field_set(["street"]));
        let builder = ModelBuilder::new(&address()).with("street", "Main");
        let results = bound.validate(&Path::new("Address"), &builder);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_success());
    }
}
