//! JSON mapping for model objects.
//!
//! Objects serialize as JSON objects keyed by field name, holding only the
//! fields that are set. Numbers are written as strings so no precision is
//! lost, and dates use `YYYY-MM-DD`. Reading accepts numbers either as JSON
//! numbers or as strings.

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value as Json;

use crate::error::{ModelError, Result};
use crate::object::{ModelBuilder, ModelObject, ModelValue};
use crate::registry::SchemaRegistry;
use crate::types::{Field, FieldType, ModelType, PrimitiveType};
use crate::value::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Number(n) => serializer.collect_str(n),
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::Date(d) => serializer.collect_str(&d.format(DATE_FORMAT)),
            Self::Model(model) => model.serialize(serializer),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

fn serialize_object<S: Serializer>(
    object: &dyn ModelObject,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let set: Vec<(&Field, &Value)> = object
        .model_type()
        .fields()
        .iter()
        .zip(object.values())
        .filter_map(|(field, value)| value.as_ref().map(|value| (field, value)))
        .collect();
    let mut map = serializer.serialize_map(Some(set.len()))?;
    for (field, value) in set {
        map.serialize_entry(&field.name, value)?;
    }
    map.end()
}

impl Serialize for ModelValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_object(self, serializer)
    }
}

impl Serialize for ModelBuilder {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_object(self, serializer)
    }
}

impl ModelBuilder {
    /// Reads a builder of `model_type` from a JSON object.
    ///
    /// Nested type references are resolved through `registry`. `null`
    /// members leave their field unset.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::JsonNotObject`] for a non-object document,
    /// [`ModelError::UnknownField`] for members the type does not declare,
    /// [`ModelError::Json`] for values of the wrong shape, and
    /// [`ModelError::UnknownType`] for nested types the registry cannot
    /// resolve.
    ///
    /// # Examples
    ///
    /// ```
    /// use modelkit_core::*;
    ///
    /// let mut registry = SchemaRegistry::new();
    /// registry
    ///     .register(
    ///         ModelType::new("Payment")
    ///             .with_field(Field::number("amount"))
    ///             .with_field(Field::date("due")),
    ///     )
    ///     .unwrap();
    /// let payment = registry.get("Payment").unwrap();
    ///
    /// let json = serde_json::json!({ "amount": 12.50, "due": "2024-03-01" });
    /// let value = ModelValue::from_json(payment, &registry, &json).unwrap();
    /// assert_eq!(
    ///     serde_json::to_value(&value).unwrap(),
    ///     serde_json::json!({ "amount": "12.5", "due": "2024-03-01" })
    /// );
    /// ```
    pub fn from_json(
        model_type: &Arc<ModelType>,
        registry: &SchemaRegistry,
        json: &Json,
    ) -> Result<Self> {
        let Json::Object(members) = json else {
            return Err(ModelError::JsonNotObject(
                model_type.qualified_name().to_string(),
            ));
        };

        let mut builder = ModelBuilder::new(model_type);
        for (name, member) in members {
            let field = model_type
                .field(name)
                .ok_or_else(|| ModelError::UnknownField {
                    model_type: model_type.qualified_name().to_string(),
                    field: name.clone(),
                })?;
            let value = match member {
                Json::Null => None,
                Json::Array(items) if field.is_multi() => Some(Value::List(
                    items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(|item| read_item(model_type, field, item, registry))
                        .collect::<Result<_>>()?,
                )),
                item => Some(read_item(model_type, field, item, registry)?),
            };
            builder.try_set_option(name, value)?;
        }
        Ok(builder)
    }
}

impl ModelValue {
    /// Reads a value of `model_type` from a JSON object.
    ///
    /// # Errors
    ///
    /// Same as [`ModelBuilder::from_json`].
    pub fn from_json(
        model_type: &Arc<ModelType>,
        registry: &SchemaRegistry,
        json: &Json,
    ) -> Result<Self> {
        ModelBuilder::from_json(model_type, registry, json).map(|builder| builder.build())
    }
}

fn read_item(
    owner: &ModelType,
    field: &Field,
    json: &Json,
    registry: &SchemaRegistry,
) -> Result<Value> {
    let value = match (&field.field_type, json) {
        (FieldType::Primitive(PrimitiveType::String), Json::String(s)) => Some(Value::from(s.as_str())),
        (FieldType::Primitive(PrimitiveType::Int), Json::Number(n)) => n.as_i64().map(Value::Int),
        (FieldType::Primitive(PrimitiveType::Number), Json::Number(n)) => {
            read_decimal(&n.to_string()).map(Value::Number)
        }
        (FieldType::Primitive(PrimitiveType::Number), Json::String(s)) => {
            read_decimal(s).map(Value::Number)
        }
        (FieldType::Primitive(PrimitiveType::Boolean), Json::Bool(b)) => Some(Value::Boolean(*b)),
        (FieldType::Primitive(PrimitiveType::Date), Json::String(s)) => {
            NaiveDate::parse_from_str(s, DATE_FORMAT).ok().map(Value::Date)
        }
        (FieldType::Model(reference), Json::Object(_)) => {
            let nested = registry
                .resolve(reference, owner.namespace())
                .ok_or_else(|| ModelError::UnknownType(reference.clone()))?;
            return ModelValue::from_json(nested, registry, json).map(Value::Model);
        }
        _ => None,
    };

    value.ok_or_else(|| ModelError::Json {
        model_type: owner.qualified_name().to_string(),
        field: field.name.clone(),
        expected: field.field_type.to_string(),
        found: json.to_string(),
    })
}

fn read_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
