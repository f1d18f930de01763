//! Evaluation shell for functions that produce model objects.
//!
//! A [`ModelFunction`] computes an output builder from its input. The
//! [`FunctionShell`] turns that builder into a validated value: an absent
//! or empty result is `Ok(None)`, anything else is built and must pass
//! validation.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{ModelError, Result};
use crate::object::{ModelBuilder, ModelObject, ModelValue};
use crate::registry::SchemaRegistry;
use crate::types::ModelType;
use crate::validation::ValidationPipeline;
use crate::value::Value;

/// A function whose result is a model object.
pub trait ModelFunction {
    /// Input consumed by one evaluation.
    type Input: ?Sized;

    /// Name used in logs and validation errors.
    fn name(&self) -> &str;

    /// Declared type of the result.
    fn output_type(&self) -> &Arc<ModelType>;

    /// Computes the result builder, or `None` for no result.
    ///
    /// # Errors
    ///
    /// Implementations report inputs they cannot assign.
    fn evaluate_builder(&self, input: &Self::Input) -> Result<Option<ModelBuilder>>;
}

/// Evaluates functions and validates their results.
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
///         .with_field(Field::string("lastName").required())
///         .with_field(Field::int("age")),
/// );
/// let create = AssignOutput::new("CreatePerson", Arc::clone(&person)).with_rename("personAge", "age");
///
/// let shell = FunctionShell::default();
/// let inputs = Inputs::new()
///     .with("firstName", "Ada")
///     .with("lastName", "Lovelace")
///     .with("personAge", 36);
/// let value = shell.evaluate(&create, &inputs).unwrap().unwrap();
/// assert_eq!(value.get("age"), Some(&Value::from(36)));
///
/// // Nothing assigned: no result and no validation.
/// assert_eq!(shell.evaluate(&create, &Inputs::new()).unwrap(), None);
///
/// // A missing required field fails validation.
/// let partial = Inputs::new().with("firstName", "Ada");
/// assert!(matches!(
///     shell.evaluate(&create, &partial),
///     Err(ModelError::Validation { .. })
/// ));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionShell<'r> {
    pipeline: ValidationPipeline<'r>,
}

impl<'r> FunctionShell<'r> {
    /// A shell validating through `registry`.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self::with_pipeline(ValidationPipeline::new(registry))
    }

    /// A shell validating with an explicit pipeline.
    pub fn with_pipeline(pipeline: ValidationPipeline<'r>) -> Self {
        Self { pipeline }
    }

    /// Evaluates `function` and validates its result.
    ///
    /// # Errors
    ///
    /// Returns the function's own error, [`ModelError::ModelTypeMismatch`]
    /// if the result is not of the declared output type, or
    /// [`ModelError::Validation`] with every result if validation fails.
    pub fn evaluate<F>(&self, function: &F, input: &F::Input) -> Result<Option<ModelValue>>
    where
        F: ModelFunction + ?Sized,
    {
        let Some(mut builder) = function.evaluate_builder(input)? else {
            trace!(function = function.name(), "no result");
            return Ok(None);
        };
        if !builder.prune().has_data() {
            trace!(function = function.name(), "result holds no data");
            return Ok(None);
        }

        let expected = function.output_type();
        if !builder.model_type().same_type(expected) {
            return Err(ModelError::ModelTypeMismatch {
                expected: expected.qualified_name().to_string(),
                found: builder.model_type().qualified_name().to_string(),
            });
        }

        let value = builder.build();
        let report = self.pipeline.validate(&value);
        debug!(
            function = function.name(),
            failures = report.failures().count(),
            "evaluated function"
        );
        report.into_result(function.name())?;
        Ok(Some(value))
    }
}

/// Named input values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    values: BTreeMap<String, Value>,
}

impl Inputs {
    /// No inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Adds an input if present.
    pub fn with_option<V: Into<Value>>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    /// Looks up an input.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Inputs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Copies inputs onto the output fields of the same (or renamed) name.
///
/// Inputs without a matching output field are ignored.
#[derive(Debug, Clone)]
pub struct AssignOutput {
    name: String,
    output_type: Arc<ModelType>,
    renames: BTreeMap<String, String>,
}

impl AssignOutput {
    /// Creates the function for `output_type`.
    pub fn new(name: impl Into<String>, output_type: Arc<ModelType>) -> Self {
        Self {
            name: name.into(),
            output_type,
            renames: BTreeMap::new(),
        }
    }

    /// Assigns input `input` to output field `field`.
    pub fn with_rename(mut self, input: impl Into<String>, field: impl Into<String>) -> Self {
        self.renames.insert(input.into(), field.into());
        self
    }
}

impl ModelFunction for AssignOutput {
    type Input = Inputs;

    fn name(&self) -> &str {
        &self.name
    }

    fn output_type(&self) -> &Arc<ModelType> {
        &self.output_type
    }

    fn evaluate_builder(&self, input: &Inputs) -> Result<Option<ModelBuilder>> {
        let mut builder = ModelBuilder::new(&self.output_type);
        for (name, value) in input.iter() {
            let field = self.renames.get(name).map_or(name, String::as_str);
            if self.output_type.field_index(field).is_none() {
                trace!(function = %self.name, input = name, "input has no output field");
                continue;
            }
            builder.try_set(field, value.clone())?;
        }
        Ok(Some(builder))
    }
}

/// Adapts a closure into a [`ModelFunction`].
///
/// ```
/// use std::sync::Arc;
/// use modelkit_core::*;
///
/// let total = Arc::new(ModelType::new("Total").with_field(Field::int("sum")));
/// let sum = FnFunction::new("Sum", Arc::clone(&total), |items: &[i64]| {
///     let builder = ModelBuilder::new(&total).with("sum", items.iter().sum::<i64>());
///     Ok(Some(builder))
/// });
///
/// let value = FunctionShell::default().evaluate(&sum, &[1, 2, 3][..]).unwrap().unwrap();
/// assert_eq!(value.get("sum"), Some(&Value::from(6)));
/// ```
pub struct FnFunction<I: ?Sized, F> {
    name: String,
    output_type: Arc<ModelType>,
    evaluate: F,
    input: PhantomData<fn(&I)>,
}

impl<I: ?Sized, F> FnFunction<I, F>
where
    F: Fn(&I) -> Result<Option<ModelBuilder>>,
{
    /// Wraps `evaluate` as a function named `name`.
    pub fn new(name: impl Into<String>, output_type: Arc<ModelType>, evaluate: F) -> Self {
        Self {
            name: name.into(),
            output_type,
            evaluate,
            input: PhantomData,
        }
    }
}

impl<I: ?Sized, F> ModelFunction for FnFunction<I, F>
where
    F: Fn(&I) -> Result<Option<ModelBuilder>>,
{
    type Input = I;

    fn name(&self) -> &str {
        &self.name
    }

    fn output_type(&self) -> &Arc<ModelType> {
        &self.output_type
    }

    fn evaluate_builder(&self, input: &I) -> Result<Option<ModelBuilder>> {
        (self.evaluate)(input)
    }
}

impl<I: ?Sized, F> fmt::Debug for FnFunction<I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFunction")
            .field("name", &self.name)
            .field("output_type", &self.output_type.qualified_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    fn person() -> Arc<ModelType> {
        Arc::new(
            ModelType::new("Person")
                .with_field(Field::string("firstName").required())
                .with_field(Field::string("lastName").required())
                .with_field(Field::int("age").with_min_value(0)),
        )
    }

    fn create_person() -> AssignOutput {
        AssignOutput::new("CreatePerson", person()).with_rename("personAge", "age")
    }

    #[test]
    fn test_absent_age_is_left_unset() {
        let inputs = Inputs::new()
            .with("firstName", "Ada")
            .with("lastName", "Lovelace")
            .with_option("personAge", None::<i64>);
        let value = FunctionShell::default()
            .evaluate(&create_person(), &inputs)
            .unwrap()
            .unwrap();
        assert_eq!(value.get("age"), None);
        assert_eq!(value.set_field_names(), ["firstName", "lastName"]);
    }

    #[test]
    fn test_validation_failure_carries_every_result() {
        let inputs = Inputs::new()
            .with("firstName", "Ada")
            .with("lastName", "Lovelace")
            .with("personAge", -1);
        let err = FunctionShell::default()
            .evaluate(&create_person(), &inputs)
            .unwrap_err();
        let ModelError::Validation { subject, report } = err else {
            panic!("expected a validation error");
        };
        assert_eq!(subject, "CreatePerson");
        assert_eq!(report.len(), 4);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_ill_typed_input_is_an_error() {
        let inputs = Inputs::new().with("firstName", 7);
        assert!(matches!(
            create_person().evaluate_builder(&inputs),
            Err(ModelError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_wrong_output_type_is_rejected() {
        let other = Arc::new(ModelType::new("Other").with_field(Field::string("x")));
        let declared = person();
        let function = FnFunction::new("Broken", declared, |_: &()| {
            Ok(Some(ModelBuilder::new(&other).with("x", "y")))
        });
        assert!(matches!(
            FunctionShell::default().evaluate(&function, &()),
            Err(ModelError::ModelTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_none_result_skips_validation() {
        let function = FnFunction::new("Nothing", person(), |_: &()| Ok(None));
        assert_eq!(FunctionShell::default().evaluate(&function, &()).unwrap(), None);
    }
}
