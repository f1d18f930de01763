//! Registry of model types and their metadata.
//!
//! A [`SchemaRegistry`] maps qualified type names to [`ModelMeta`] records.
//! It is assembled once at startup and read-only afterwards; [`install`]
//! publishes one instance process-wide.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::error::{ModelError, Result};
use crate::meta::ModelMeta;
use crate::object::ModelBuilder;
use crate::types::ModelType;
use crate::validation::{FieldSet, Validator, ValidatorWithArg};
use crate::verify::{SchemaError, resolve_reference, verify_model_type};

static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();

/// Publishes `registry` as the process-wide registry.
///
/// Only the first call succeeds; later calls get their registry back.
pub fn install(
    registry: SchemaRegistry,
) -> std::result::Result<&'static SchemaRegistry, SchemaRegistry> {
    let mut offered = Some(registry);
    let installed = GLOBAL.get_or_init(|| offered.take().unwrap_or_default());
    match offered {
        None => {
            debug!(types = installed.len(), "installed global schema registry");
            Ok(installed)
        }
        Some(rejected) => {
            warn!("global schema registry is already installed");
            Err(rejected)
        }
    }
}

/// The process-wide registry, if one was installed.
pub fn global() -> Option<&'static SchemaRegistry> {
    GLOBAL.get()
}

/// Ordered map from qualified type name to metadata.
///
/// # Examples
///
/// ```
/// use modelkit_core::*;
///
/// let mut registry = SchemaRegistry::new();
/// registry
///     .register(
///         ModelType::new("Address")
///             .with_namespace("com.example")
///             .with_field(Field::string("city").required()),
///     )
///     .unwrap();
///
/// assert!(registry.contains("com.example.Address"));
/// assert!(registry.resolve("Address", Some("com.example")).is_some());
///
/// let builder = registry.builder("com.example.Address").unwrap();
/// assert_eq!(builder.type_name(), "Address");
/// assert!(registry.builder("Person").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: BTreeMap<String, ModelMeta>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifies and registers a type with default validators.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidSchema`] if the type fails verification
    /// or its qualified name is already registered.
    pub fn register(&mut self, model_type: ModelType) -> Result<&ModelMeta> {
        self.register_meta(ModelMeta::new(Arc::new(model_type)))
    }

    /// Verifies and registers a prepared metadata record.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn register_meta(&mut self, meta: ModelMeta) -> Result<&ModelMeta> {
        let mut errors = verify_model_type(meta.model_type());
        let name = meta.model_type().qualified_name().to_string();
        if self.types.contains_key(&name) {
            errors.push(SchemaError::DuplicateType(name.clone()));
        }
        if !errors.is_empty() {
            return Err(ModelError::InvalidSchema(errors));
        }

        debug!(
            model_type = %name,
            fields = meta.model_type().field_count(),
            "registered model type"
        );
        Ok(self.types.entry(name).or_insert(meta))
    }

    /// Looks up a type by qualified name, falling back to reference
    /// resolution for bare names.
    pub fn get(&self, name: &str) -> Option<&Arc<ModelType>> {
        self.meta(name)
            .map(ModelMeta::model_type)
            .or_else(|| self.resolve(name, None))
    }

    /// Resolves a field's type reference as seen from `namespace`.
    ///
    /// A bare name is looked up in `namespace` first, then at the top
    /// level. Without a namespace it may also name the single registered
    /// type with that simple name.
    pub fn resolve(&self, reference: &str, namespace: Option<&str>) -> Option<&Arc<ModelType>> {
        resolve_reference(
            reference,
            namespace,
            |name| self.types.get(name).map(ModelMeta::model_type),
            self.types.values().map(ModelMeta::model_type),
        )
    }

    /// Metadata by qualified name.
    pub fn meta(&self, name: &str) -> Option<&ModelMeta> {
        self.types.get(name)
    }

    /// Metadata for `model_type`, if that type is registered.
    pub fn meta_for(&self, model_type: &ModelType) -> Option<&ModelMeta> {
        self.meta(model_type.qualified_name())
    }

    /// A new builder for the named type.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownType`] if no type matches.
    pub fn builder(&self, name: &str) -> Result<ModelBuilder> {
        self.get(name)
            .map(ModelBuilder::new)
            .ok_or_else(|| ModelError::UnknownType(name.to_string()))
    }

    /// Replaces the cardinality validator of a registered type.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownType`] if the type is not registered.
    pub fn set_validator(&mut self, name: &str, validator: Arc<dyn Validator>) -> Result<()> {
        self.configure(name, |meta| meta.with_validator(validator))
    }

    /// Replaces the type-format validator of a registered type.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownType`] if the type is not registered.
    pub fn set_type_format_validator(
        &mut self,
        name: &str,
        validator: Arc<dyn Validator>,
    ) -> Result<()> {
        self.configure(name, |meta| meta.with_type_format_validator(validator))
    }

    /// Replaces the only-exists validator of a registered type.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownType`] if the type is not registered.
    pub fn set_only_exists_validator(
        &mut self,
        name: &str,
        validator: Arc<dyn ValidatorWithArg<FieldSet>>,
    ) -> Result<()> {
        self.configure(name, |meta| meta.with_only_exists_validator(validator))
    }

    /// Rewrites the metadata of a registered type.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownType`] if the type is not registered.
    pub fn configure(
        &mut self,
        name: &str,
        configure: impl FnOnce(ModelMeta) -> ModelMeta,
    ) -> Result<()> {
        let meta = self
            .types
            .get_mut(name)
            .ok_or_else(|| ModelError::UnknownType(name.to_string()))?;
        *meta = configure(meta.clone());
        debug!(model_type = name, "reconfigured validators");
        Ok(())
    }

    /// Registered types in qualified-name order.
    pub fn types(&self) -> impl Iterator<Item = &Arc<ModelType>> {
        self.types.values().map(ModelMeta::model_type)
    }

    /// Returns `true` if the qualified name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
