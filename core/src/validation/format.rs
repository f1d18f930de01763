use rust_decimal::Decimal;

use crate::object::ModelObject;
use crate::path::Path;
use crate::types::Field;
use crate::value::Value;

use super::{ValidationResult, ValidationType, Validator, check_number, check_string};

/// Checks range, digit, length and pattern constraints.
///
/// Emits one result per constrained field. Absent values pass; whether
/// they may be absent is a cardinality question. Each element of a list is
/// checked and the failures are reported together.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeFormatValidator;

impl Validator for TypeFormatValidator {
    fn validate(&self, path: &Path, object: &dyn ModelObject) -> Vec<ValidationResult> {
        let model_type = object.model_type();
        model_type
            .fields()
            .iter()
            .zip(object.values())
            .filter(|(field, _)| !field.constraints.is_empty())
            .map(|(field, value)| {
                ValidationResult::new(
                    model_type.name(),
                    ValidationType::TypeFormat,
                    path.child(&field.name),
                    value.as_ref().and_then(|value| check_value(field, value)),
                )
            })
            .collect()
    }
}

fn check_value(field: &Field, value: &Value) -> Option<String> {
    match value {
        Value::List(items) => {
            let failures: Vec<String> = items
                .iter()
                .filter_map(|item| check_value(field, item))
                .collect();
            (!failures.is_empty()).then(|| failures.join(" "))
        }
        Value::Int(i) => check_number(&field.name, &Decimal::from(*i), &field.constraints),
        Value::Number(n) => check_number(&field.name, n, &field.constraints),
        Value::String(s) => check_string(&field.name, s, &field.constraints),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::object::ModelBuilder;
    use crate::types::{ModelType, Pattern};

    fn account() -> Arc<ModelType> {
        Arc::new(
            ModelType::new("Account")
                .with_field(Field::string("id").required())
                .with_field(Field::int("age").with_min_value(0).with_max_value(150))
                .with_field(
                    Field::string("codes")
                        .many()
                        .with_pattern(Pattern::new("[A-Z]{3}").unwrap()),
                ),
        )
    }

    #[test]
    fn test_only_constrained_fields_are_reported() {
        let builder = ModelBuilder::new(&account());
        let results = TypeFormatValidator.validate(&Path::new("Account"), &builder);
        let paths: Vec<String> = results.iter().map(|r| r.path.to_string()).collect();
        assert_eq!(paths, ["Account.age", "Account.codes"]);
        assert!(results.iter().all(ValidationResult::is_success));
    }

    #[test]
    fn test_range_failure_reports_value_and_bound() {
        let builder = ModelBuilder::new(&account()).with("age", 200);
        let results = TypeFormatValidator.validate(&Path::new("Account"), &builder);
        assert_eq!(
            results[0].failure_reason.as_deref(),
            Some("Expected a number less than or equal to 150 for 'age', but found 200.")
        );
    }

    #[test]
    fn test_list_elements_are_checked_individually() {
        let builder = ModelBuilder::new(&account()).with("codes", vec!["ABC", "ab", "XYZ", "1"]);
        let results = TypeFormatValidator.validate(&Path::new("Account"), &builder);
        assert_eq!(
            results[1].failure_reason.as_deref(),
            Some(
                "Field 'codes' with value 'ab' does not match the pattern /[A-Z]{3}/. \
                 Field 'codes' with value '1' does not match the pattern /[A-Z]{3}/."
            )
        );
    }
}
