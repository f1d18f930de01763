//! Structural verification of model types.
//!
//! Catches schema mistakes such as duplicate fields, impossible
//! cardinalities, constraints on the wrong kind of field and dangling type
//! references before any value is built against them.
//!
//! # Examples
//!
//! ```
//! use modelkit_core::*;
//!
//! let ok = ModelType::new("Address").with_field(Field::string("street").required());
//! assert!(verify_model_type(&ok).is_empty());
//!
//! let bad = ModelType::new("Address")
//!     .with_field(Field::string("street"))
//!     .with_field(Field::int("street").with_max_length(3));
//! let errors = verify_model_type(&bad);
//! assert!(errors.iter().any(|e| matches!(e, SchemaError::DuplicateField { .. })));
//! assert!(errors.iter().any(|e| matches!(e, SchemaError::InapplicableConstraint { .. })));
//! ```

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::registry::SchemaRegistry;
use crate::types::{FieldType, ModelType, PrimitiveType};

/// Structural problems in a type definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Type name is empty or whitespace-only.
    #[error("model type name cannot be empty")]
    EmptyTypeName,
    /// Two types share a qualified name.
    #[error("duplicate model type: {0}")]
    DuplicateType(String),
    /// A field name is empty or whitespace-only.
    #[error("field name cannot be empty in {0}")]
    EmptyFieldName(String),
    /// Two fields of one type share a name.
    #[error("duplicate field {field} in {model_type}")]
    DuplicateField {
        /// Qualified type name.
        model_type: String,
        /// Repeated field name.
        field: String,
    },
    /// `max` is zero or below `min`.
    #[error("invalid cardinality {cardinality} for {model_type}.{field}")]
    InvalidCardinality {
        /// Qualified type name.
        model_type: String,
        /// Field name.
        field: String,
        /// Rendered bound.
        cardinality: String,
    },
    /// A lower bound exceeds its upper bound.
    #[error("{constraint} bounds are inverted for {model_type}.{field}")]
    InvertedBounds {
        /// Qualified type name.
        model_type: String,
        /// Field name.
        field: String,
        /// `value` or `length`.
        constraint: &'static str,
    },
    /// A constraint does not apply to the field's type.
    #[error("{constraint} constraint does not apply to {field_type} field {model_type}.{field}")]
    InapplicableConstraint {
        /// Qualified type name.
        model_type: String,
        /// Field name.
        field: String,
        /// Declared type.
        field_type: String,
        /// `numeric` or `string`.
        constraint: &'static str,
    },
    /// A model field references a type that is not known.
    #[error("unresolved type reference {reference} in {model_type}.{field}")]
    UnresolvedType {
        /// Qualified type name.
        model_type: String,
        /// Field name.
        field: String,
        /// The reference as written.
        reference: String,
    },
}

/// Verifies a single type in isolation.
///
/// Type references are not checked here; see [`verify_types`] and
/// [`verify_registry`].
pub fn verify_model_type(model_type: &ModelType) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    if model_type.name().trim().is_empty() {
        errors.push(SchemaError::EmptyTypeName);
        return errors;
    }

    let owner = model_type.qualified_name();
    let mut seen: HashSet<&str> = HashSet::new();
    for field in model_type.fields() {
        if field.name.trim().is_empty() {
            errors.push(SchemaError::EmptyFieldName(owner.to_string()));
            continue;
        }
        if !seen.insert(&field.name) {
            errors.push(SchemaError::DuplicateField {
                model_type: owner.to_string(),
                field: field.name.clone(),
            });
        }

        let cardinality = field.cardinality;
        if cardinality.max.is_some_and(|max| max == 0 || max < cardinality.min) {
            errors.push(SchemaError::InvalidCardinality {
                model_type: owner.to_string(),
                field: field.name.clone(),
                cardinality: cardinality.to_string(),
            });
        }

        let constraints = &field.constraints;
        let primitive = field.field_type.primitive();
        let numeric = primitive.is_some_and(PrimitiveType::is_numeric);
        let textual = primitive == Some(PrimitiveType::String);
        for (present, applies, constraint) in [
            (constraints.has_numeric(), numeric, "numeric"),
            (constraints.has_textual(), textual, "string"),
        ] {
            if present && !applies {
                errors.push(SchemaError::InapplicableConstraint {
                    model_type: owner.to_string(),
                    field: field.name.clone(),
                    field_type: field.field_type.to_string(),
                    constraint,
                });
            }
        }

        let values_inverted = matches!(
            (constraints.min_value, constraints.max_value),
            (Some(min), Some(max)) if min > max
        );
        let lengths_inverted = matches!(
            (constraints.min_length, constraints.max_length),
            (Some(min), Some(max)) if min > max
        );
        for (inverted, constraint) in [(values_inverted, "value"), (lengths_inverted, "length")] {
            if inverted {
                errors.push(SchemaError::InvertedBounds {
                    model_type: owner.to_string(),
                    field: field.name.clone(),
                    constraint,
                });
            }
        }
    }

    errors
}

/// Verifies a set of types that will be registered together.
///
/// Checks every type, rejects duplicate qualified names and requires each
/// model reference to resolve to a type of the set, with the same rules as
/// [`SchemaRegistry::resolve`].
pub fn verify_types(types: &[ModelType]) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut by_name: HashMap<&str, &ModelType> = HashMap::new();

    for model_type in types {
        errors.extend(verify_model_type(model_type));
        if by_name
            .insert(model_type.qualified_name(), model_type)
            .is_some()
        {
            errors.push(SchemaError::DuplicateType(
                model_type.qualified_name().to_string(),
            ));
        }
    }

    let unique: Vec<&ModelType> = by_name.values().copied().collect();
    for model_type in types {
        errors.extend(unresolved_references(model_type, |reference, namespace| {
            resolve_reference(
                reference,
                namespace,
                |name| by_name.get(name).copied(),
                unique.iter().copied(),
            )
            .is_some()
        }));
    }

    errors
}

/// Verifies every registered type and its references.
pub fn verify_registry(registry: &SchemaRegistry) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    for model_type in registry.types() {
        errors.extend(verify_model_type(model_type));
        errors.extend(unresolved_references(model_type, |reference, namespace| {
            registry.resolve(reference, namespace).is_some()
        }));
    }
    errors
}

fn unresolved_references(
    model_type: &ModelType,
    resolves: impl Fn(&str, Option<&str>) -> bool,
) -> Vec<SchemaError> {
    model_type
        .fields()
        .iter()
        .filter_map(|field| match &field.field_type {
            FieldType::Model(reference) if !resolves(reference, model_type.namespace()) => {
                Some(SchemaError::UnresolvedType {
                    model_type: model_type.qualified_name().to_string(),
                    field: field.name.clone(),
                    reference: reference.clone(),
                })
            }
            _ => None,
        })
        .collect()
}

/// Qualified names a reference may denote, most specific first.
///
/// A dotted reference is taken as qualified. A bare name is looked up in the
/// referring type's namespace, then at the top level.
pub(crate) fn reference_candidates<'a>(
    reference: &'a str,
    namespace: Option<&'a str>,
) -> impl Iterator<Item = String> + 'a {
    let scoped = namespace
        .filter(|_| !reference.contains('.'))
        .map(|namespace| format!("{namespace}.{reference}"));
    scoped.into_iter().chain(std::iter::once(reference.to_string()))
}

/// Resolves a model reference written in a type of `namespace`.
///
/// Candidates from [`reference_candidates`] are tried first. A bare
/// reference from a type without namespace then falls back to the single
/// type with that simple name; an ambiguous simple name resolves nothing.
pub(crate) fn resolve_reference<'t, T: Borrow<ModelType> + 't>(
    reference: &str,
    namespace: Option<&str>,
    lookup: impl Fn(&str) -> Option<&'t T>,
    types: impl IntoIterator<Item = &'t T>,
) -> Option<&'t T> {
    if let Some(found) = reference_candidates(reference, namespace).find_map(|name| lookup(&name)) {
        return Some(found);
    }
    if namespace.is_some() || reference.contains('.') {
        return None;
    }
    let mut matches = types
        .into_iter()
        .filter(|model_type| <T as Borrow<ModelType>>::borrow(model_type).name() == reference);
    match (matches.next(), matches.next()) {
        (Some(model_type), None) => Some(model_type),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    #[test]
    fn test_empty_type_name() {
        assert_eq!(
            verify_model_type(&ModelType::new("  ")),
            vec![SchemaError::EmptyTypeName]
        );
    }

    #[test]
    fn test_invalid_cardinality() {
        let model_type = ModelType::new("T")
            .with_field(Field::string("zero").with_cardinality(0, Some(0)))
            .with_field(Field::string("inverted").with_cardinality(3, Some(2)))
            .with_field(Field::string("fine").with_cardinality(2, None));
        let errors = verify_model_type(&model_type);
        assert_eq!(errors.len(), 2);
        assert!(
            errors
                .iter()
                .all(|e| matches!(e, SchemaError::InvalidCardinality { .. }))
        );
    }

    #[test]
    fn test_numeric_constraint_on_string_field() {
        let model_type = ModelType::new("T").with_field(Field::string("code").with_digits(3));
        let errors = verify_model_type(&model_type);
        assert_eq!(
            errors[0].to_string(),
            "numeric constraint does not apply to string field T.code"
        );
    }

    #[test]
    fn test_inverted_bounds() {
        let model_type = ModelType::new("T")
            .with_field(Field::int("n").with_min_value(5).with_max_value(1))
            .with_field(Field::string("s").with_min_length(4).with_max_length(2));
        let errors = verify_model_type(&model_type);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_verify_types_resolves_namespaced_references() {
        let address = ModelType::new("Address").with_namespace("com.example");
        let person = ModelType::new("Person")
            .with_namespace("com.example")
            .with_field(Field::model("home", "Address"))
            .with_field(Field::model("work", "com.example.Address"))
            .with_field(Field::model("other", "org.Address"));

        let errors = verify_types(&[address, person]);
        assert_eq!(
            errors,
            vec![SchemaError::UnresolvedType {
                model_type: "com.example.Person".into(),
                field: "other".into(),
                reference: "org.Address".into(),
            }]
        );
    }

    #[test]
    fn test_verify_types_scopes_bare_references_to_the_namespace() {
        let address = ModelType::new("Address").with_namespace("org.other");
        let person = ModelType::new("Person")
            .with_namespace("com.example")
            .with_field(Field::model("home", "Address"));
        let order = ModelType::new("Order").with_field(Field::model("ship_to", "Address"));

        let errors = verify_types(&[address, person, order]);
        assert_eq!(
            errors,
            vec![SchemaError::UnresolvedType {
                model_type: "com.example.Person".into(),
                field: "home".into(),
                reference: "Address".into(),
            }]
        );
    }

    #[test]
    fn test_verify_types_agrees_with_registry() {
        let types = [
            ModelType::new("Address").with_namespace("org.other"),
            ModelType::new("Address").with_namespace("com.example"),
            ModelType::new("Order").with_field(Field::model("ship_to", "Address")),
        ];
        let mut registry = SchemaRegistry::new();
        for model_type in types.clone() {
            registry.register(model_type).unwrap();
        }
        assert_eq!(verify_types(&types), verify_registry(&registry));
        assert_eq!(verify_types(&types).len(), 1);
    }

    #[test]
    fn test_verify_types_rejects_duplicates() {
        let errors = verify_types(&[ModelType::new("A"), ModelType::new("A")]);
        assert_eq!(errors, vec![SchemaError::DuplicateType("A".into())]);
    }

    #[test]
    fn test_reference_candidates() {
        let scoped: Vec<_> = reference_candidates("Address", Some("com.example")).collect();
        assert_eq!(scoped, ["com.example.Address", "Address"]);
        let qualified: Vec<_> = reference_candidates("org.Address", Some("com.example")).collect();
        assert_eq!(qualified, ["org.Address"]);
    }
}
