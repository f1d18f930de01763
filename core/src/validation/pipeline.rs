use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::meta::ModelMeta;
use crate::object::{ModelObject, ModelValue};
use crate::path::Path;
use crate::process::Processor;
use crate::registry::SchemaRegistry;
use crate::types::Field;
use crate::value::Value;

use super::{
    CardinalityValidator, FieldSet, OnlyExistsValidator, TypeFormatValidator, ValidationResult,
    Validator, ValidatorWithArg,
};

/// Which validation kinds the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run cardinality checks.
    pub cardinality: bool,
    /// Run type-format checks.
    pub type_format: bool,
    /// Also validate nested model objects.
    pub recurse_nested: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cardinality: true,
            type_format: true,
            recurse_nested: true,
        }
    }
}

/// All results of one validation run, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    results: Vec<ValidationResult>,
}

impl ValidationReport {
    /// Wraps a list of results.
    pub fn new(results: Vec<ValidationResult>) -> Self {
        Self { results }
    }

    /// Every result, passing or failing.
    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    /// Consumes the report, returning its results.
    pub fn into_results(self) -> Vec<ValidationResult> {
        self.results
    }

    /// Failing results only.
    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|result| !result.is_success())
    }

    /// Returns `true` if no check failed.
    pub fn is_success(&self) -> bool {
        self.results.iter().all(ValidationResult::is_success)
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if nothing was checked.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Turns failures into [`ModelError::Validation`] about `subject`.
    ///
    /// # Errors
    ///
    /// Returns the error if any check failed.
    pub fn into_result(self, subject: impl Into<String>) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ModelError::Validation {
                subject: subject.into(),
                report: self,
            })
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failures: Vec<&ValidationResult> = self.failures().collect();
        if failures.is_empty() {
            return write!(f, "{} checks passed", self.results.len());
        }
        write!(f, "{} of {} checks failed", failures.len(), self.results.len())?;
        for failure in failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

/// Runs the configured validation kinds over an object tree.
///
/// Validators are taken from the registry's metadata for each visited
/// object's type; unregistered types use the built-in validators.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use modelkit_core::*;
///
/// let person = Arc::new(
///     ModelType::new("Person")
///         .with_field(Field::string("firstName").required())
///         .with_field(Field::int("age").with_min_value(0)),
/// );
/// let value = ModelBuilder::new(&person).with("age", -3).build();
///
/// let report = ValidationPipeline::default().validate(&value);
/// let reasons: Vec<_> = report
///     .failures()
///     .filter_map(|r| r.failure_reason.as_deref())
///     .collect();
/// assert_eq!(
///     reasons,
///     [
///         "'firstName' is a required field but does not exist.",
///         "Expected a number greater than or equal to 0 for 'age', but found -3.",
///     ]
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationPipeline<'r> {
    registry: Option<&'r SchemaRegistry>,
    config: PipelineConfig,
}

impl<'r> ValidationPipeline<'r> {
    /// A pipeline that resolves validators through `registry`.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry: Some(registry),
            config: PipelineConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validates `object` and, if configured, every nested object.
    pub fn validate(&self, object: &dyn ModelObject) -> ValidationReport {
        let root = Path::new(object.type_name());
        let mut results = Vec::new();
        self.check(&root, object, &mut results);

        if self.config.recurse_nested {
            let mut nested = NestedValidator {
                pipeline: self,
                results: &mut results,
            };
            for (field, value) in object.model_type().fields().iter().zip(object.values()) {
                let path = root.child(&field.name);
                for (path, model) in nested_models(&path, value.as_ref()) {
                    nested.pipeline.check(&path, model, nested.results);
                    model.process_at(&path, &mut nested);
                }
            }
        }

        let report = ValidationReport::new(results);
        debug!(
            model_type = object.model_type().qualified_name(),
            checks = report.len(),
            failures = report.failures().count(),
            "validated model object"
        );
        report
    }

    /// Checks that exactly `fields` are set on `object`.
    pub fn validate_only_exists(&self, object: &dyn ModelObject, fields: &FieldSet) -> ValidationResult {
        let path = Path::new(object.type_name());
        match self.meta(object) {
            Some(meta) => meta.only_exists_validator().validate(&path, object, fields),
            None => OnlyExistsValidator.validate(&path, object, fields),
        }
    }

    /// Validates independent values in parallel, keeping input order.
    pub fn validate_batch(&self, values: &[ModelValue]) -> Vec<ValidationReport> {
        use rayon::prelude::*;

        values
            .par_iter()
            .map(|value| self.validate(value))
            .collect()
    }

    fn meta(&self, object: &dyn ModelObject) -> Option<&'r ModelMeta> {
        self.registry
            .and_then(|registry| registry.meta_for(object.model_type()))
    }

    fn check(&self, path: &Path, object: &dyn ModelObject, results: &mut Vec<ValidationResult>) {
        let meta = self.meta(object);
        if self.config.cardinality {
            results.extend(match meta {
                Some(meta) => meta.validator().validate(path, object),
                None => CardinalityValidator.validate(path, object),
            });
        }
        if self.config.type_format {
            results.extend(match meta {
                Some(meta) => meta.type_format_validator().validate(path, object),
                None => TypeFormatValidator.validate(path, object),
            });
        }
    }
}

/// Validates the model objects held by each visited field.
struct NestedValidator<'p, 'r> {
    pipeline: &'p ValidationPipeline<'r>,
    results: &'p mut Vec<ValidationResult>,
}

impl Processor for NestedValidator<'_, '_> {
    fn process(&mut self, path: &Path, _field: &Field, value: Option<&Value>, _owner: &ModelValue) {
        for (path, model) in nested_models(path, value) {
            self.pipeline.check(&path, model, self.results);
        }
    }
}

/// Model objects directly held by a field, with their paths.
fn nested_models<'v>(path: &Path, value: Option<&'v Value>) -> Vec<(Path, &'v ModelValue)> {
    match value {
        Some(Value::Model(model)) => vec![(path.clone(), model)],
        Some(Value::List(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.as_model().map(|model| (path.index(index), model)))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::object::ModelBuilder;
    use crate::types::ModelType;
    use crate::validation::{ValidationType, field_set};

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                ModelType::new("Address")
                    .with_field(Field::string("street").required())
                    .with_field(Field::string("city").required().with_max_length(5)),
            )
            .unwrap();
        registry
            .register(
                ModelType::new("Person")
                    .with_field(Field::string("name").required())
                    .with_field(Field::model("address", "Address"))
                    .with_field(Field::model("previous", "Address").many()),
            )
            .unwrap();
        registry
    }

    fn person(registry: &SchemaRegistry) -> ModelValue {
        let address = registry.get("Address").unwrap();
        let home = ModelBuilder::new(address).with("street", "Main").build();
        let old = ModelBuilder::new(address)
            .with("street", "Low Rd")
            .with("city", "Bradford")
            .build();
        registry
            .builder("Person")
            .unwrap()
            .with("name", "Ada")
            .with("address", home)
            .with("previous", vec![old])
            .build()
    }

    #[test]
    fn test_nested_objects_are_validated_in_traversal_order() {
        let registry = registry();
        let report = ValidationPipeline::new(&registry).validate(&person(&registry));

        let paths: Vec<(String, ValidationType)> = report
            .results()
            .iter()
            .map(|r| (r.path.to_string(), r.kind))
            .collect();
        let expected = [
            ("Person.name", ValidationType::Cardinality),
            ("Person.address", ValidationType::Cardinality),
            ("Person.previous", ValidationType::Cardinality),
            ("Person.address.street", ValidationType::Cardinality),
            ("Person.address.city", ValidationType::Cardinality),
            ("Person.address.city", ValidationType::TypeFormat),
            ("Person.previous(0).street", ValidationType::Cardinality),
            ("Person.previous(0).city", ValidationType::Cardinality),
            ("Person.previous(0).city", ValidationType::TypeFormat),
        ];
        let expected: Vec<_> = expected.iter().map(|(p, k)| (p.to_string(), *k)).collect();
        assert_eq!(paths, expected);

        let failures: Vec<_> = report.failures().map(|r| r.path.to_string()).collect();
        assert_eq!(failures, ["Person.address.city", "Person.previous(0).city"]);
    }

    #[test]
    fn test_config_disables_kinds_and_nesting() {
        let registry = registry();
        let config = PipelineConfig {
            type_format: false,
            recurse_nested: false,
            ..PipelineConfig::default()
        };
        let report = ValidationPipeline::new(&registry)
            .with_config(config)
            .validate(&person(&registry));
        assert_eq!(report.len(), 3);
        assert!(report.is_success());
    }

    #[test]
    fn test_into_result() {
        let registry = registry();
        let empty = registry.builder("Person").unwrap().build();
        let err = ValidationPipeline::new(&registry)
            .validate(&empty)
            .into_result("Person")
            .unwrap_err();
        let ModelError::Validation { subject, report } = err else {
            panic!("expected a validation error");
        };
        assert_eq!(subject, "Person");
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_only_exists_through_pipeline() {
        let registry = registry();
        let value = person(&registry);
        let pipeline = ValidationPipeline::new(&registry);
        assert!(
            pipeline
                .validate_only_exists(&value, &field_set(["name", "address", "previous"]))
                .is_success()
        );
        assert!(!pipeline.validate_only_exists(&value, &field_set(["name"])).is_success());
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let registry = registry();
        let complete = person(&registry);
        let empty = registry.builder("Person").unwrap().build();
        let values = vec![complete.clone(), empty, complete];

        let reports = ValidationPipeline::new(&registry).validate_batch(&values);
        let failing: Vec<usize> = reports.iter().map(|r| r.failures().count()).collect();
        assert_eq!(failing, [2, 1, 2]);
    }

    #[test]
    fn test_unregistered_types_use_default_validators() {
        let loose = Arc::new(ModelType::new("Loose").with_field(Field::string("id").required()));
        let report = ValidationPipeline::new(&registry()).validate(&ModelBuilder::new(&loose));
        assert_eq!(report.failures().count(), 1);
    }
}
