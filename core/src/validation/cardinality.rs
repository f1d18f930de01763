use crate::object::ModelObject;
use crate::path::Path;
use crate::value::Value;

use super::{ValidationResult, ValidationType, Validator, check_cardinality};

/// Checks every declared field's presence count against its cardinality.
///
/// Emits one result per field, at the field's path.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardinalityValidator;

impl Validator for CardinalityValidator {
    fn validate(&self, path: &Path, object: &dyn ModelObject) -> Vec<ValidationResult> {
        let model_type = object.model_type();
        model_type
            .fields()
            .iter()
            .zip(object.values())
            .map(|(field, value)| {
                let count = value.as_ref().map_or(0, Value::count);
                ValidationResult::new(
                    model_type.name(),
                    ValidationType::Cardinality,
                    path.child(&field.name),
                    check_cardinality(&field.name, count, field.cardinality),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::object::ModelBuilder;
    use crate::types::{Field, ModelType};

    fn person() -> Arc<ModelType> {
        Arc::new(
            ModelType::new("Person")
                .with_field(Field::string("firstName").required())
                .with_field(Field::string("aliases").with_cardinality(0, Some(2)))
                .with_field(Field::int("age")),
        )
    }

    #[test]
    fn test_one_result_per_field() {
        let builder = ModelBuilder::new(&person());
        let results = CardinalityValidator.validate(&Path::new("Person"), &builder);
        let paths: Vec<String> = results.iter().map(|r| r.path.to_string()).collect();
        assert_eq!(paths, ["Person.firstName", "Person.aliases", "Person.age"]);
        assert_eq!(
            results[0].failure_reason.as_deref(),
            Some("'firstName' is a required field but does not exist.")
        );
        assert!(results[1].is_success());
        assert!(results[2].is_success());
    }

    #[test]
    fn test_list_length_is_counted() {
        let builder = ModelBuilder::new(&person())
            .with("firstName", "Ada")
            .with("aliases", vec!["a", "b", "c"]);
        let results = CardinalityValidator.validate(&Path::new("Person"), &builder);
        assert!(results[0].is_success());
        assert_eq!(
            results[1].failure_reason.as_deref(),
            Some("Maximum of 2 'aliases' are expected but found 3.")
        );
    }
}
