//! Immutable model values and their mutable builders.
//!
//! [`ModelValue`] and [`ModelBuilder`] store one slot per declared field in
//! a shared, copy-on-write vector. `build()` hands the current slots to a
//! new value without copying, and the builder copies them on its next
//! mutation, so a built value never observes later builder changes. The
//! same sharing makes `to_builder()` cheap: nested values stay shared until
//! something actually rewrites them.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::path::PathSegment;
use crate::types::{Field, ModelType};
use crate::value::Value;

type Slots = Arc<Vec<Option<Value>>>;

/// Read-only contract shared by values and builders.
///
/// Object safe, so validators can accept either through `&dyn ModelObject`.
pub trait ModelObject {
    /// The object's type.
    fn model_type(&self) -> &Arc<ModelType>;

    /// One slot per declared field, in declaration order.
    fn values(&self) -> &[Option<Value>];

    /// Simple type name.
    fn type_name(&self) -> &str {
        self.model_type().name()
    }

    /// Returns the field's value, or `None` when it is unset or not
    /// declared.
    fn get(&self, field: &str) -> Option<&Value> {
        let index = self.model_type().field_index(field)?;
        self.values()[index].as_ref()
    }

    /// Returns `true` if the field holds a value.
    fn is_set(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Returns `true` if any field holds data, looking through nested
    /// objects.
    fn has_data(&self) -> bool {
        self.values().iter().flatten().any(Value::has_data)
    }

    /// Names of the fields that hold a value, in declaration order.
    fn set_field_names(&self) -> Vec<&str> {
        self.model_type()
            .fields()
            .iter()
            .zip(self.values())
            .filter(|(_, value)| value.is_some())
            .map(|(field, _)| field.name.as_str())
            .collect()
    }

    /// Resolves a path relative to this object (without its root segment).
    fn resolve(&self, segments: &[PathSegment]) -> Option<&Value> {
        let (first, mut rest) = segments.split_first()?;
        let PathSegment::Field(name) = first else {
            return None;
        };
        let mut current = self.get(name)?;
        while let Some((segment, tail)) = rest.split_first() {
            current = match (segment, current) {
                (PathSegment::Index(index), Value::List(items)) => items.get(*index)?,
                (PathSegment::Field(name), Value::Model(model)) => model.get(name)?,
                _ => return None,
            };
            rest = tail;
        }
        Some(current)
    }
}

/// An immutable instance of a [`ModelType`].
///
/// Created by [`ModelBuilder::build`]. Cloning is cheap. Equality and
/// hashing are structural over the type and every field.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use modelkit_core::{Field, ModelBuilder, ModelObject, ModelType};
///
/// let address = Arc::new(
///     ModelType::new("Address")
///         .with_field(Field::string("street").required())
///         .with_field(Field::string("city").required()),
/// );
///
/// let value = ModelBuilder::new(&address)
///     .with("street", "1 Main St")
///     .with("city", "Springfield")
///     .build();
///
/// assert_eq!(value.get("city").and_then(|v| v.as_str()), Some("Springfield"));
/// assert_eq!(value.to_builder().build(), value);
/// assert_eq!(value.to_string(), "Address {street=1 Main St, city=Springfield}");
/// ```
#[derive(Clone)]
pub struct ModelValue {
    model_type: Arc<ModelType>,
    values: Slots,
}

impl ModelValue {
    /// Returns a new, empty builder for `model_type`.
    pub fn builder(model_type: &Arc<ModelType>) -> ModelBuilder {
        ModelBuilder::new(model_type)
    }

    /// Returns an independent builder holding this value's fields.
    pub fn to_builder(&self) -> ModelBuilder {
        ModelBuilder {
            model_type: Arc::clone(&self.model_type),
            values: Arc::clone(&self.values),
        }
    }
}

impl ModelObject for ModelValue {
    fn model_type(&self) -> &Arc<ModelType> {
        &self.model_type
    }

    fn values(&self) -> &[Option<Value>] {
        &self.values
    }
}

/// The mutable counterpart of a [`ModelValue`].
///
/// Setters check values against the declared field type. [`set`](Self::set)
/// treats an unknown field or an ill-typed value as a programming error and
/// panics; [`try_set`](Self::try_set) reports it instead.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use modelkit_core::{Field, ModelBuilder, ModelObject, ModelType, Value};
///
/// let person = Arc::new(
///     ModelType::new("Person")
///         .with_field(Field::string("firstName").required())
///         .with_field(Field::int("age")),
/// );
///
/// let mut builder = ModelBuilder::new(&person);
/// builder.set("firstName", "Ada");
/// let snapshot = builder.build();
///
/// builder.set("age", 36);
/// assert_eq!(snapshot.get("age"), None);
/// assert_eq!(builder.get("age"), Some(&Value::Int(36)));
///
/// assert!(builder.try_set("age", "old").is_err());
/// ```
#[derive(Clone)]
pub struct ModelBuilder {
    model_type: Arc<ModelType>,
    values: Slots,
}

impl ModelBuilder {
    /// Creates a builder with every field unset.
    pub fn new(model_type: &Arc<ModelType>) -> Self {
        Self {
            model_type: Arc::clone(model_type),
            values: Arc::new(vec![None; model_type.field_count()]),
        }
    }

    /// Sets a field.
    ///
    /// # Panics
    ///
    /// Panics if the field is not declared or the value does not fit its
    /// type.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.set_option(field, Some(value))
    }

    /// Sets a field, or unsets it for `None`.
    ///
    /// # Panics
    ///
    /// Panics if the field is not declared or the value does not fit its
    /// type.
    pub fn set_option<V: Into<Value>>(&mut self, field: &str, value: Option<V>) -> &mut Self {
        if let Err(err) = self.try_set_option(field, value.map(Into::into)) {
            panic!("{err}");
        }
        self
    }

    /// Unsets a field.
    ///
    /// # Panics
    ///
    /// Panics if the field is not declared.
    pub fn clear(&mut self, field: &str) -> &mut Self {
        self.set_option(field, None::<Value>)
    }

    /// Consuming variant of [`set`](Self::set) for construction chains.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Consuming variant of [`set_option`](Self::set_option).
    pub fn with_option<V: Into<Value>>(mut self, field: &str, value: Option<V>) -> Self {
        self.set_option(field, value);
        self
    }

    /// Sets a field, reporting contract violations as errors.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownField`] or [`ModelError::TypeMismatch`].
    pub fn try_set(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.try_set_option(field, Some(value.into()))
    }

    /// Sets or unsets a field, reporting contract violations as errors.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownField`] or [`ModelError::TypeMismatch`].
    pub fn try_set_option(&mut self, field: &str, value: Option<Value>) -> Result<&mut Self> {
        let index = self
            .model_type
            .field_index(field)
            .ok_or_else(|| ModelError::UnknownField {
                model_type: self.model_type.qualified_name().to_string(),
                field: field.to_string(),
            })?;
        let value = match value {
            Some(value) => value.conform(&self.model_type, &self.model_type.fields()[index])?,
            None => None,
        };
        self.put(index, value);
        Ok(self)
    }

    /// Freezes the current fields into a value.
    ///
    /// The builder stays usable; later changes do not reach the value.
    pub fn build(&self) -> ModelValue {
        ModelValue {
            model_type: Arc::clone(&self.model_type),
            values: Arc::clone(&self.values),
        }
    }

    /// Returns an independent copy of this builder.
    pub fn to_builder(&self) -> ModelBuilder {
        self.clone()
    }

    /// Returns a builder for the nested object in `field`, if one is set.
    pub fn nested_builder(&self, field: &str) -> Option<ModelBuilder> {
        self.get(field)
            .and_then(Value::as_model)
            .map(ModelValue::to_builder)
    }

    /// Removes nested objects that hold no data.
    ///
    /// Nested objects are pruned recursively first; an object left without
    /// data is unset, and emptied lists become unset. Scalars are untouched.
    pub fn prune(&mut self) -> &mut Self {
        for index in 0..self.values.len() {
            let pruned = match &self.values[index] {
                Some(Value::Model(model)) => prune_model(model),
                Some(Value::List(items)) if items.iter().any(|i| i.as_model().is_some()) => {
                    prune_list(items)
                }
                _ => continue,
            };
            if pruned != self.values[index] {
                self.put(index, pruned);
            }
        }
        self
    }

    pub(crate) fn put(&mut self, index: usize, value: Option<Value>) {
        Arc::make_mut(&mut self.values)[index] = value;
    }

    pub(crate) fn take(&mut self, index: usize) -> Option<Value> {
        Arc::make_mut(&mut self.values)[index].take()
    }
}

fn prune_model(model: &ModelValue) -> Option<Value> {
    let mut builder = model.to_builder();
    builder.prune();
    builder.has_data().then(|| Value::Model(builder.build()))
}

fn prune_list(items: &[Value]) -> Option<Value> {
    let kept: Vec<Value> = items
        .iter()
        .filter_map(|item| match item {
            Value::Model(model) => prune_model(model),
            other => Some(other.clone()),
        })
        .collect();
    (!kept.is_empty()).then_some(Value::List(kept))
}

impl ModelObject for ModelBuilder {
    fn model_type(&self) -> &Arc<ModelType> {
        &self.model_type
    }

    fn values(&self) -> &[Option<Value>] {
        &self.values
    }
}

fn same_contents(a: &dyn ModelObject, b: &dyn ModelObject) -> bool {
    a.model_type().same_type(b.model_type()) && a.values() == b.values()
}

fn hash_contents<H: Hasher>(object: &dyn ModelObject, state: &mut H) {
    object.model_type().qualified_name().hash(state);
    object.values().hash(state);
}

fn write_fields(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    fields: &[Field],
    values: &[Option<Value>],
) -> fmt::Result {
    write!(f, "{label} {{")?;
    for (position, (field, value)) in fields.iter().zip(values).enumerate() {
        if position > 0 {
            f.write_str(", ")?;
        }
        match value {
            Some(value) => write!(f, "{}={value}", field.name)?,
            None => write!(f, "{}=null", field.name)?,
        }
    }
    f.write_str("}")
}

impl PartialEq for ModelValue {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.values, &other.values) && self.model_type.same_type(&other.model_type))
            || same_contents(self, other)
    }
}

impl Eq for ModelValue {}

impl Hash for ModelValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_contents(self, state);
    }
}

impl PartialEq for ModelBuilder {
    fn eq(&self, other: &Self) -> bool {
        same_contents(self, other)
    }
}

impl Eq for ModelBuilder {}

impl Hash for ModelBuilder {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_contents(self, state);
    }
}

impl fmt::Display for ModelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fields(f, self.model_type.name(), self.model_type.fields(), &self.values)
    }
}

impl fmt::Display for ModelBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = format!("{}Builder", self.model_type.name());
        write_fields(f, &label, self.model_type.fields(), &self.values)
    }
}

impl fmt::Debug for ModelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct(self.model_type.qualified_name());
        for (field, value) in self.model_type.fields().iter().zip(self.values.iter()) {
            debug.field(&field.name, value);
        }
        debug.finish()
    }
}

impl fmt::Debug for ModelBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBuilder")
            .field("model_type", &self.model_type.qualified_name())
            .field("values", &self.values)
            .finish()
    }
}
