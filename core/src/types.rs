//! Schema type definitions for modeled data shapes.
//!
//! A [`ModelType`] is an ordered table of [`Field`] descriptors. Each field
//! declares its value type, cardinality bounds and optional format
//! constraints. Types are built once (by hand or from a schema document) and
//! shared as `Arc<ModelType>` by every value and builder of that type.
//!
//! The name-to-index table is computed when fields are added, so field
//! lookups never need runtime reflection.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::verify::reference_candidates;

/// Version of the schema contract (semver).
///
/// Embedded in schema documents and lock files to track compatibility.
pub const SCHEMA_CONTRACT_VERSION: &str = "1.0.0";

/// Built-in scalar types a field can hold.
///
/// # Examples
///
/// ```
/// use modelkit_core::PrimitiveType;
///
/// assert_eq!(PrimitiveType::from_keyword("number"), Some(PrimitiveType::Number));
/// assert_eq!(PrimitiveType::Int.keyword(), "int");
/// assert_eq!(PrimitiveType::from_keyword("Address"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    /// UTF-8 text.
    String,
    /// 64-bit signed integer.
    Int,
    /// Arbitrary-precision decimal.
    Number,
    /// `true` / `false`.
    Boolean,
    /// Calendar date without time zone.
    Date,
}

impl PrimitiveType {
    /// Returns the schema keyword for this primitive.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
        }
    }

    /// Parses a schema keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "string" => Some(Self::String),
            "int" => Some(Self::Int),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            _ => None,
        }
    }

    /// Returns `true` for `int` and `number`.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Number)
    }
}

/// Declared value type of a field.
///
/// Serialized as a single string: a primitive keyword, or otherwise the name
/// of another model type.
///
/// # Examples
///
/// ```
/// use modelkit_core::{FieldType, PrimitiveType};
///
/// assert_eq!(FieldType::from("int".to_string()), FieldType::Primitive(PrimitiveType::Int));
/// assert_eq!(
///     FieldType::from("com.example.Address".to_string()),
///     FieldType::Model("com.example.Address".into())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// A scalar value.
    Primitive(PrimitiveType),
    /// A nested model object, referenced by (qualified or simple) type name.
    Model(String),
}

impl FieldType {
    /// Returns the primitive type, if this is not a model reference.
    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self {
            Self::Primitive(primitive) => Some(*primitive),
            Self::Model(_) => None,
        }
    }

    /// Returns the referenced model type name, if any.
    pub fn model_reference(&self) -> Option<&str> {
        match self {
            Self::Primitive(_) => None,
            Self::Model(reference) => Some(reference),
        }
    }

    /// Returns `true` if this field holds nested model objects.
    pub fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }
}

impl From<String> for FieldType {
    fn from(keyword: String) -> Self {
        match PrimitiveType::from_keyword(&keyword) {
            Some(primitive) => Self::Primitive(primitive),
            None => Self::Model(keyword),
        }
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.to_string()
    }
}

impl From<PrimitiveType> for FieldType {
    fn from(primitive: PrimitiveType) -> Self {
        Self::Primitive(primitive)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(primitive) => f.write_str(primitive.keyword()),
            Self::Model(reference) => f.write_str(reference),
        }
    }
}

/// Allowed number of values for a field, `min..=max`.
///
/// `max == None` means unbounded. Fields whose `max` exceeds one hold a list.
///
/// # Examples
///
/// ```
/// use modelkit_core::Cardinality;
///
/// assert!(Cardinality::REQUIRED.is_required());
/// assert!(!Cardinality::OPTIONAL.is_multi());
/// assert!(Cardinality::MANY.is_multi());
/// assert_eq!(Cardinality::MANY.to_string(), "0..*");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cardinality {
    /// Minimum number of values.
    pub min: u32,
    /// Maximum number of values (`None` = unbounded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl Cardinality {
    /// `0..1`
    pub const OPTIONAL: Self = Self::new(0, Some(1));
    /// `1..1`
    pub const REQUIRED: Self = Self::new(1, Some(1));
    /// `0..*`
    pub const MANY: Self = Self::new(0, None);

    /// Creates a cardinality bound.
    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Returns `true` if the field holds a list of values.
    pub fn is_multi(&self) -> bool {
        !matches!(self.max, Some(max) if max <= 1)
    }

    /// Returns `true` if at least one value is required.
    pub fn is_required(&self) -> bool {
        self.min > 0
    }

    /// Returns `true` if `count` values satisfy this bound.
    pub fn contains(&self, count: usize) -> bool {
        let above_min = count >= self.min as usize;
        let below_max = self.max.is_none_or(|max| count <= max as usize);
        above_min && below_max
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::OPTIONAL
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

/// A compiled string pattern that must match the whole value.
///
/// Serialized as the source pattern; an invalid expression fails
/// deserialization.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source` anchored at both ends.
    ///
    /// # Errors
    ///
    /// Returns the [`regex::Error`] if `source` is not a valid expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use modelkit_core::Pattern;
    ///
    /// let zip = Pattern::new("[0-9]{5}").unwrap();
    /// assert!(zip.is_match("12345"));
    /// assert!(!zip.is_match("123456"));
    /// ```
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Returns the pattern as written in the schema.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the entire `value` matches.
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::new(&source).map_err(serde::de::Error::custom)
    }
}

/// Format and range constraints checked by the type-format validator.
///
/// Numeric constraints apply to `int` and `number` fields, textual ones to
/// `string` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    /// Inclusive lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<Decimal>,
    /// Inclusive upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<Decimal>,
    /// Maximum number of significant digits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digits: Option<u32>,
    /// Maximum number of digits after the decimal point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraction_digits: Option<u32>,
    /// Minimum length in characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length in characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Whole-value pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
}

impl Constraints {
    /// Returns `true` if no constraint is set.
    pub fn is_empty(&self) -> bool {
        !self.has_numeric() && !self.has_textual()
    }

    /// Returns `true` if any numeric constraint is set.
    pub fn has_numeric(&self) -> bool {
        self.min_value.is_some()
            || self.max_value.is_some()
            || self.digits.is_some()
            || self.fraction_digits.is_some()
    }

    /// Returns `true` if any string constraint is set.
    pub fn has_textual(&self) -> bool {
        self.min_length.is_some() || self.max_length.is_some() || self.pattern.is_some()
    }
}

/// A field descriptor: name, value type, cardinality and constraints.
///
/// Use the typed constructors ([`string`](Field::string),
/// [`int`](Field::int), [`model`](Field::model), ...) and chain the
/// cardinality and constraint methods.
///
/// # Examples
///
/// ```
/// use modelkit_core::{Cardinality, Field, FieldType, PrimitiveType};
///
/// let age = Field::int("age").with_min_value(0);
/// assert_eq!(age.field_type, FieldType::Primitive(PrimitiveType::Int));
/// assert_eq!(age.cardinality, Cardinality::OPTIONAL);
///
/// let street = Field::string("street").required();
/// assert!(street.is_required());
///
/// let aliases = Field::string("aliases").many();
/// assert!(aliases.is_multi());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name, unique within its type.
    pub name: String,
    /// Declared value type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Allowed number of values.
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Format and range constraints.
    #[serde(default, skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
}

impl Field {
    /// Creates an optional field of the given type.
    pub fn new(name: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            cardinality: Cardinality::OPTIONAL,
            constraints: Constraints::default(),
        }
    }

    /// Creates an optional `string` field.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, PrimitiveType::String)
    }

    /// Creates an optional `int` field.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, PrimitiveType::Int)
    }

    /// Creates an optional `number` field.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, PrimitiveType::Number)
    }

    /// Creates an optional `boolean` field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, PrimitiveType::Boolean)
    }

    /// Creates an optional `date` field.
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, PrimitiveType::Date)
    }

    /// Creates an optional field holding a nested model object.
    pub fn model(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::new(name, FieldType::Model(reference.into()))
    }

    /// Marks the field as required (`1..1`).
    pub fn required(mut self) -> Self {
        self.cardinality = Cardinality::REQUIRED;
        self
    }

    /// Marks the field as optional (`0..1`).
    pub fn optional(mut self) -> Self {
        self.cardinality = Cardinality::OPTIONAL;
        self
    }

    /// Marks the field as an unbounded list (`0..*`).
    pub fn many(mut self) -> Self {
        self.cardinality = Cardinality::MANY;
        self
    }

    /// Sets explicit cardinality bounds.
    pub fn with_cardinality(mut self, min: u32, max: Option<u32>) -> Self {
        self.cardinality = Cardinality::new(min, max);
        self
    }

    /// Sets the inclusive lower bound.
    pub fn with_min_value(mut self, min: impl Into<Decimal>) -> Self {
        self.constraints.min_value = Some(min.into());
        self
    }

    /// Sets the inclusive upper bound.
    pub fn with_max_value(mut self, max: impl Into<Decimal>) -> Self {
        self.constraints.max_value = Some(max.into());
        self
    }

    /// Limits the number of significant digits.
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.constraints.digits = Some(digits);
        self
    }

    /// Limits the number of fractional digits.
    pub fn with_fraction_digits(mut self, digits: u32) -> Self {
        self.constraints.fraction_digits = Some(digits);
        self
    }

    /// Sets the minimum string length.
    pub fn with_min_length(mut self, length: usize) -> Self {
        self.constraints.min_length = Some(length);
        self
    }

    /// Sets the maximum string length.
    pub fn with_max_length(mut self, length: usize) -> Self {
        self.constraints.max_length = Some(length);
        self
    }

    /// Requires string values to match `pattern`.
    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.constraints.pattern = Some(pattern);
        self
    }

    /// Returns `true` if the field holds a list.
    pub fn is_multi(&self) -> bool {
        self.cardinality.is_multi()
    }

    /// Returns `true` if the field must be present.
    pub fn is_required(&self) -> bool {
        self.cardinality.is_required()
    }
}

/// A named schema: an ordered table of fields.
///
/// Fields are append-only during construction and immutable afterwards. The
/// type is identified by its qualified name (`namespace.name`).
///
/// # Examples
///
/// ```
/// use modelkit_core::{Field, ModelType};
///
/// let address = ModelType::new("Address")
///     .with_namespace("com.example")
///     .with_field(Field::string("street").required())
///     .with_field(Field::string("city").required())
///     .with_field(Field::string("zipCode").required());
///
/// assert_eq!(address.qualified_name(), "com.example.Address");
/// assert_eq!(address.field_index("city"), Some(1));
/// assert!(address.field("country").is_none());
/// assert!(address.matches_reference("Address", Some("com.example")));
/// assert!(!address.matches_reference("Address", Some("org.other")));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ModelTypeDef")]
pub struct ModelType {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    fields: Vec<Field>,
    #[serde(skip)]
    qualified: String,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ModelType {
    /// Creates a type with no namespace and no fields.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            qualified: name.clone(),
            name,
            namespace: None,
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Places the type in a namespace (e.g. `com.example`).
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.qualified = if namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{namespace}.{}", self.name)
        };
        self.namespace = Some(namespace).filter(|ns| !ns.is_empty());
        self
    }

    /// Appends a field.
    ///
    /// A duplicate name keeps the first field reachable by name while the
    /// later one still occupies its own position, so by-name and
    /// by-position access disagree on such a type. Registration rejects it;
    /// call [`verify_model_type`](crate::verify_model_type) before using an
    /// unregistered type.
    pub fn with_field(mut self, field: Field) -> Self {
        self.index
            .entry(field.name.clone())
            .or_insert(self.fields.len());
        self.fields.push(field);
        self
    }

    /// Simple type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// `namespace.name`, or the simple name without a namespace.
    pub fn qualified_name(&self) -> &str {
        &self.qualified
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of declared fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.field_index(name).map(|index| &self.fields[index])
    }

    /// Position of a field in declaration order.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns `true` if `reference`, written in a type of namespace `from`,
    /// may denote this type.
    ///
    /// A bare reference from a namespaced type matches the namespace-scoped
    /// or top-level name only; from a type without namespace it also matches
    /// by simple name.
    pub fn matches_reference(&self, reference: &str, from: Option<&str>) -> bool {
        reference_candidates(reference, from).any(|name| name == self.qualified)
            || (from.is_none() && !reference.contains('.') && reference == self.name)
    }

    /// Returns `true` if both describe the same concrete type.
    pub fn same_type(&self, other: &ModelType) -> bool {
        std::ptr::eq(self, other) || self.qualified == other.qualified
    }
}

impl PartialEq for ModelType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.namespace == other.namespace && self.fields == other.fields
    }
}

impl Eq for ModelType {}

#[derive(Deserialize)]
struct ModelTypeDef {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    fields: Vec<Field>,
}

impl From<ModelTypeDef> for ModelType {
    fn from(def: ModelTypeDef) -> Self {
        let mut model_type = ModelType::new(def.name);
        if let Some(namespace) = def.namespace {
            model_type = model_type.with_namespace(namespace);
        }
        def.fields
            .into_iter()
            .fold(model_type, ModelType::with_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> ModelType {
        ModelType::new("Person")
            .with_namespace("test")
            .with_field(Field::string("firstName").required())
            .with_field(Field::string("lastName").required())
            .with_field(Field::number("age"))
            .with_field(Field::boolean("isActive"))
    }

    #[test]
    fn test_field_defaults_to_optional() {
        let field = Field::string("name");
        assert_eq!(field.cardinality, Cardinality::OPTIONAL);
        assert!(field.constraints.is_empty());
        assert!(!field.is_multi());
    }

    #[test]
    fn test_cardinality_contains() {
        assert!(Cardinality::REQUIRED.contains(1));
        assert!(!Cardinality::REQUIRED.contains(0));
        assert!(!Cardinality::REQUIRED.contains(2));
        assert!(Cardinality::MANY.contains(42));
        assert!(Cardinality::new(2, Some(3)).is_multi());
    }

    #[test]
    fn test_field_index_follows_declaration_order() {
        let person = person();
        assert_eq!(person.field_index("firstName"), Some(0));
        assert_eq!(person.field_index("isActive"), Some(3));
        assert_eq!(person.field_count(), 4);
    }

    #[test]
    fn test_duplicate_field_keeps_first_index() {
        let ty = ModelType::new("Dup")
            .with_field(Field::string("a"))
            .with_field(Field::int("a"));
        assert_eq!(ty.field_index("a"), Some(0));
        assert_eq!(ty.field_count(), 2);
    }

    #[test]
    fn test_qualified_name_and_references() {
        let person = person();
        assert_eq!(person.qualified_name(), "test.Person");
        assert!(person.matches_reference("test.Person", Some("org.other")));
        assert!(person.matches_reference("Person", Some("test")));
        assert!(person.matches_reference("Person", None));
        assert!(!person.matches_reference("Person", Some("org.other")));
        assert!(!person.matches_reference("com.example.Person", None));
    }

    #[test]
    fn test_empty_namespace_is_ignored() {
        let ty = ModelType::new("SimpleType").with_namespace("");
        assert_eq!(ty.namespace(), None);
        assert_eq!(ty.qualified_name(), "SimpleType");
    }

    #[test]
    fn test_json_roundtrip_rebuilds_index() {
        let zip = Field::string("zipCode").with_pattern(Pattern::new("[0-9]{5}").unwrap());
        let original = person().with_field(zip);

        let json = serde_json::to_string(&original).unwrap();
        let parsed: ModelType = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, original);
        assert_eq!(parsed.qualified_name(), "test.Person");
        assert_eq!(parsed.field_index("zipCode"), Some(4));
    }

    #[test]
    fn test_deserialize_schema_table() {
        let json = r#"{
            "name": "TestType",
            "namespace": "test",
            "fields": [
                { "name": "stringProperty", "type": "string", "cardinality": { "min": 1, "max": 1 } },
                { "name": "intProperty", "type": "int", "constraints": { "min_value": 0 } },
                { "name": "tags", "type": "string", "cardinality": { "min": 0 } },
                { "name": "owner", "type": "Person" }
            ]
        }"#;
        let ty: ModelType = serde_json::from_str(json).unwrap();

        let int_property = ty.field("intProperty").unwrap();
        assert_eq!(int_property.constraints.min_value, Some(Decimal::ZERO));
        assert_eq!(int_property.cardinality, Cardinality::OPTIONAL);
        assert!(ty.field("tags").unwrap().is_multi());
        assert_eq!(
            ty.field("owner").unwrap().field_type,
            FieldType::Model("Person".into())
        );
    }

    #[test]
    fn test_invalid_pattern_fails_deserialization() {
        let json = r#"{ "name": "code", "type": "string", "constraints": { "pattern": "[" } }"#;
        assert!(serde_json::from_str::<Field>(json).is_err());
    }
}
