//! Field values.
//!
//! A [`Value`] is what a single field slot holds: a scalar, a nested model
//! object, or a list of either for multi-valued fields. Values are checked
//! against the field's declared type when they are set on a builder.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{ModelError, Result};
use crate::object::{ModelObject, ModelValue};
use crate::types::{Field, FieldType, ModelType, PrimitiveType};

/// A field value.
///
/// # Examples
///
/// ```
/// use modelkit_core::Value;
///
/// let name = Value::from("Ada");
/// assert_eq!(name.as_str(), Some("Ada"));
///
/// let scores = Value::from(vec![3, 5]);
/// assert_eq!(scores.count(), 2);
/// assert_eq!(Value::from(7).as_number().map(|n| n.to_string()), Some("7".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// `string`
    String(String),
    /// `int`
    Int(i64),
    /// `number`
    Number(Decimal),
    /// `boolean`
    Boolean(bool),
    /// `date`
    Date(NaiveDate),
    /// A nested model object.
    Model(ModelValue),
    /// Values of a multi-valued field.
    List(Vec<Value>),
}

impl Value {
    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::Date(_) => "date",
            Self::Model(_) => "model",
            Self::List(_) => "list",
        }
    }

    /// Returns the string, if this is a `string`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer, if this is an `int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a decimal, widening `int`.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Int(i) => Some(Decimal::from(*i)),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the flag, if this is a `boolean`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the date, if this is a `date`.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the nested object, if this is a model value.
    pub fn as_model(&self) -> Option<&ModelValue> {
        match self {
            Self::Model(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the elements, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Number of values this slot contributes to cardinality checks.
    pub fn count(&self) -> usize {
        match self {
            Self::List(items) => items.len(),
            _ => 1,
        }
    }

    /// Returns `true` unless this is a model object (or list of them) with
    /// no data anywhere below it.
    pub fn has_data(&self) -> bool {
        match self {
            Self::Model(model) => model.has_data(),
            Self::List(items) => items.iter().any(Value::has_data),
            _ => true,
        }
    }

    /// Checks this value against `field` of `owner` and normalizes it.
    ///
    /// An `int` assigned to a `number` field is widened, a single value
    /// assigned to a multi-valued field becomes a one-element list, and an
    /// empty list becomes absence.
    pub(crate) fn conform(self, owner: &ModelType, field: &Field) -> Result<Option<Value>> {
        if field.is_multi() {
            let items = match self {
                Self::List(items) => items,
                single => vec![single],
            };
            let items = items
                .into_iter()
                .map(|item| item.conform_item(owner, field))
                .collect::<Result<Vec<_>>>()?;
            return Ok((!items.is_empty()).then_some(Self::List(items)));
        }

        if matches!(self, Self::List(_)) {
            return Err(mismatch(owner, field, "list"));
        }
        self.conform_item(owner, field).map(Some)
    }

    fn conform_item(self, owner: &ModelType, field: &Field) -> Result<Value> {
        match (&field.field_type, self) {
            (FieldType::Primitive(PrimitiveType::String), value @ Self::String(_))
            | (FieldType::Primitive(PrimitiveType::Int), value @ Self::Int(_))
            | (FieldType::Primitive(PrimitiveType::Number), value @ Self::Number(_))
            | (FieldType::Primitive(PrimitiveType::Boolean), value @ Self::Boolean(_))
            | (FieldType::Primitive(PrimitiveType::Date), value @ Self::Date(_)) => Ok(value),
            (FieldType::Primitive(PrimitiveType::Number), Self::Int(i)) => {
                Ok(Self::Number(Decimal::from(i)))
            }
            (FieldType::Model(reference), Self::Model(model))
                if model
                    .model_type()
                    .matches_reference(reference, owner.namespace()) =>
            {
                Ok(Self::Model(model))
            }
            (_, Self::Model(model)) => {
                Err(mismatch(owner, field, model.model_type().qualified_name()))
            }
            (_, other) => Err(mismatch(owner, field, other.kind())),
        }
    }
}

fn mismatch(owner: &ModelType, field: &Field, found: &str) -> ModelError {
    ModelError::TypeMismatch {
        model_type: owner.qualified_name().to_string(),
        field: field.name.clone(),
        expected: format!("{} ({})", field.field_type, field.cardinality),
        found: found.to_string(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Model(m) => write!(f, "{m}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (position, item) in items.iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<ModelValue> for Value {
    fn from(value: ModelValue) -> Self {
        Self::Model(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}
