//! Path-addressed traversal of model objects.
//!
//! A [`Processor`] is called once per declared field of every visited
//! object, in declaration order, with the [`Path`] of that field. Nested
//! objects are visited depth-first right after the field that holds them,
//! so the sequence of paths is fully determined by the object's shape.
//! [`BuilderProcessor`] walks builders the same way and may rewrite the
//! fields it visits.

use std::sync::Arc;

use crate::object::{ModelBuilder, ModelObject, ModelValue};
use crate::path::Path;
use crate::types::Field;
use crate::value::Value;

/// Visitor over the fields of a [`ModelValue`] tree.
pub trait Processor {
    /// Called for one field of `owner`. `value` is `None` when unset.
    fn process(&mut self, path: &Path, field: &Field, value: Option<&Value>, owner: &ModelValue);
}

impl<F> Processor for F
where
    F: FnMut(&Path, &Field, Option<&Value>, &ModelValue),
{
    fn process(&mut self, path: &Path, field: &Field, value: Option<&Value>, owner: &ModelValue) {
        self(path, field, value, owner)
    }
}

/// Visitor over the fields of a [`ModelBuilder`] tree that may mutate the
/// owner.
pub trait BuilderProcessor {
    /// Called for one field of `owner`.
    fn process(&mut self, path: &Path, field: &Field, owner: &mut ModelBuilder);
}

impl<F> BuilderProcessor for F
where
    F: FnMut(&Path, &Field, &mut ModelBuilder),
{
    fn process(&mut self, path: &Path, field: &Field, owner: &mut ModelBuilder) {
        self(path, field, owner)
    }
}

impl ModelValue {
    /// Walks this value and every nested value, rooted at the type name.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use modelkit_core::{Field, ModelBuilder, ModelType, ModelValue, Path, Value};
    ///
    /// let address = Arc::new(ModelType::new("Address").with_field(Field::string("city")));
    /// let person = Arc::new(
    ///     ModelType::new("Person")
    ///         .with_field(Field::string("name"))
    ///         .with_field(Field::model("address", "Address")),
    /// );
    /// let value = ModelBuilder::new(&person)
    ///     .with("address", ModelBuilder::new(&address).with("city", "York").build())
    ///     .build();
    ///
    /// let mut seen = Vec::new();
    /// value.process(&mut |path: &Path, _: &Field, _: Option<&Value>, _: &ModelValue| {
    ///     seen.push(path.to_string());
    /// });
    /// assert_eq!(seen, ["Person.name", "Person.address", "Person.address.city"]);
    /// ```
    pub fn process<P: Processor + ?Sized>(&self, processor: &mut P) {
        self.process_at(&Path::new(self.type_name()), processor);
    }

    /// Walks this value as if it were located at `path`.
    pub fn process_at<P: Processor + ?Sized>(&self, path: &Path, processor: &mut P) {
        for (field, value) in self.model_type().fields().iter().zip(self.values()) {
            let path = path.child(&field.name);
            processor.process(&path, field, value.as_ref(), self);
            match value {
                Some(Value::Model(nested)) => nested.process_at(&path, processor),
                Some(Value::List(items)) => {
                    for (index, item) in items.iter().enumerate() {
                        if let Value::Model(nested) = item {
                            nested.process_at(&path.index(index), processor);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

impl ModelBuilder {
    /// Walks this builder and every nested object, rooted at the type name.
    ///
    /// Nested objects are visited as builders and written back after their
    /// subtree has been processed.
    pub fn process<P: BuilderProcessor + ?Sized>(&mut self, processor: &mut P) -> &mut Self {
        let root = Path::new(self.type_name());
        self.process_at(&root, processor);
        self
    }

    /// Walks this builder as if it were located at `path`.
    pub fn process_at<P: BuilderProcessor + ?Sized>(&mut self, path: &Path, processor: &mut P) {
        let model_type = Arc::clone(self.model_type());
        for (index, field) in model_type.fields().iter().enumerate() {
            let path = path.child(&field.name);
            processor.process(&path, field, self);

            let nested = match &self.values()[index] {
                Some(Value::Model(_)) => true,
                Some(Value::List(items)) => items.iter().any(|item| item.as_model().is_some()),
                _ => false,
            };
            if !nested {
                continue;
            }

            let rewritten = match self.take(index) {
                Some(Value::Model(model)) => {
                    Some(Value::Model(process_nested(&model, &path, processor)))
                }
                Some(Value::List(items)) => Some(Value::List(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(position, item)| match item {
                            Value::Model(model) => Value::Model(process_nested(
                                &model,
                                &path.index(position),
                                processor,
                            )),
                            other => other,
                        })
                        .collect(),
                )),
                other => other,
            };
            self.put(index, rewritten);
        }
    }
}

fn process_nested<P: BuilderProcessor + ?Sized>(
    model: &ModelValue,
    path: &Path,
    processor: &mut P,
) -> ModelValue {
    let mut builder = model.to_builder();
    builder.process_at(path, processor);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelType;

    fn types() -> (Arc<ModelType>, Arc<ModelType>) {
        let address = Arc::new(
            ModelType::new("Address")
                .with_field(Field::string("street"))
                .with_field(Field::string("city")),
        );
        let person = Arc::new(
            ModelType::new("Person")
                .with_field(Field::string("name"))
                .with_field(Field::model("address", "Address"))
                .with_field(Field::model("previous", "Address").many())
                .with_field(Field::int("age")),
        );
        (address, person)
    }

    fn sample() -> ModelValue {
        let (address, person) = types();
        let home = ModelBuilder::new(&address).with("city", "York").build();
        let old = ModelBuilder::new(&address).with("street", "Low Rd").build();
        ModelBuilder::new(&person)
            .with("name", "Ada")
            .with("address", home)
            .with("previous", vec![old])
            .build()
    }

    #[test]
    fn test_value_traversal_order() {
        let mut seen = Vec::new();
        sample().process(&mut |path: &Path, _: &Field, value: Option<&Value>, _: &ModelValue| {
            seen.push((path.to_string(), value.is_some()));
        });

        let expected = [
            ("Person.name", true),
            ("Person.address", true),
            ("Person.address.street", false),
            ("Person.address.city", true),
            ("Person.previous", true),
            ("Person.previous(0).street", true),
            ("Person.previous(0).city", false),
            ("Person.age", false),
        ];
        let expected: Vec<_> = expected.iter().map(|(p, s)| (p.to_string(), *s)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_owner_is_the_visited_object() {
        let mut owners = Vec::new();
        sample().process(&mut |_: &Path, _: &Field, _: Option<&Value>, owner: &ModelValue| {
            owners.push(owner.type_name().to_string());
        });
        assert_eq!(owners.iter().filter(|o| *o == "Address").count(), 4);
        assert_eq!(owners.iter().filter(|o| *o == "Person").count(), 4);
    }

    #[test]
    fn test_builder_processor_rewrites_nested_fields() {
        let mut builder = sample().to_builder();
        builder.process(&mut |_: &Path, field: &Field, owner: &mut ModelBuilder| {
            if field.name == "city" && !owner.is_set("city") {
                owner.set("city", "Unknown");
            }
        });

        let value = builder.build();
        let old = value.get("previous").and_then(Value::as_list).unwrap()[0]
            .as_model()
            .unwrap()
            .clone();
        assert_eq!(old.get("city"), Some(&Value::from("Unknown")));
        let home = value.get("address").and_then(Value::as_model).unwrap();
        assert_eq!(home.get("city"), Some(&Value::from("York")));
    }

    #[test]
    fn test_builder_traversal_matches_value_traversal() {
        let value = sample();
        let mut from_value = Vec::new();
        value.process(&mut |path: &Path, _: &Field, _: Option<&Value>, _: &ModelValue| {
            from_value.push(path.clone());
        });

        let mut from_builder = Vec::new();
        value
            .to_builder()
            .process(&mut |path: &Path, _: &Field, _: &mut ModelBuilder| {
                from_builder.push(path.clone());
            });
        assert_eq!(from_value, from_builder);
    }
}
