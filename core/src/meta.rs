//! Per-type metadata: the type plus its validation strategies.

use std::fmt;
use std::sync::Arc;

use crate::object::ModelBuilder;
use crate::types::ModelType;
use crate::validation::{
    CardinalityValidator, FieldSet, OnlyExists, OnlyExistsValidator, TypeFormatValidator,
    Validator, ValidatorWithArg,
};

/// Metadata record for one model type.
///
/// Holds the validators the pipeline uses for objects of this type. The
/// defaults are the built-in cardinality, type-format and only-exists
/// validators; each can be swapped with the `with_*` methods.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use modelkit_core::*;
/// use modelkit_core::validation::{Validator, field_set};
///
/// let address = Arc::new(
///     ModelType::new("Address")
///         .with_field(Field::string("street"))
///         .with_field(Field::string("city")),
/// );
/// let meta = ModelMeta::new(Arc::clone(&address));
///
/// let value = meta.builder().with("street", "Main").build();
/// let results = meta
///     .only_exists(field_set(["street"]))
///     .validate(&Path::new("Address"), &value);
/// assert!(results[0].is_success());
/// ```
#[derive(Clone)]
pub struct ModelMeta {
    model_type: Arc<ModelType>,
    validator: Arc<dyn Validator>,
    type_format_validator: Arc<dyn Validator>,
    only_exists_validator: Arc<dyn ValidatorWithArg<FieldSet>>,
}

impl ModelMeta {
    /// Creates metadata with the default validators.
    pub fn new(model_type: Arc<ModelType>) -> Self {
        Self {
            model_type,
            validator: Arc::new(CardinalityValidator),
            type_format_validator: Arc::new(TypeFormatValidator),
            only_exists_validator: Arc::new(OnlyExistsValidator),
        }
    }

    /// The described type.
    pub fn model_type(&self) -> &Arc<ModelType> {
        &self.model_type
    }

    /// A new, empty builder for the type.
    pub fn builder(&self) -> ModelBuilder {
        ModelBuilder::new(&self.model_type)
    }

    /// The cardinality validator.
    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.validator
    }

    /// The type-format validator.
    pub fn type_format_validator(&self) -> &Arc<dyn Validator> {
        &self.type_format_validator
    }

    /// The only-exists validator.
    pub fn only_exists_validator(&self) -> &Arc<dyn ValidatorWithArg<FieldSet>> {
        &self.only_exists_validator
    }

    /// The only-exists validator bound to `fields`.
    pub fn only_exists(&self, fields: FieldSet) -> OnlyExists {
        OnlyExists::new(Arc::clone(&self.only_exists_validator), fields)
    }

    /// Replaces the cardinality validator.
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    /// Replaces the type-format validator.
    pub fn with_type_format_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.type_format_validator = validator;
        self
    }

    /// Replaces the only-exists validator.
    pub fn with_only_exists_validator(
        mut self,
        validator: Arc<dyn ValidatorWithArg<FieldSet>>,
    ) -> Self {
        self.only_exists_validator = validator;
        self
    }
}

impl fmt::Debug for ModelMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelMeta")
            .field("model_type", &self.model_type.qualified_name())
            .finish_non_exhaustive()
    }
}
