//! Serialized tables of model types.
//!
//! A [`SchemaDocument`] is the hand-off format between the schema compiler
//! and the runtime: a versioned list of [`ModelType`] definitions in JSON or
//! YAML.
//!
//! # Example YAML
//!
//! ```yaml
//! schema_version: "1.0.0"
//! version: "1.0"
//! name: people
//! types:
//!   - name: Address
//!     namespace: com.example
//!     fields:
//!       - name: street
//!         type: string
//!         cardinality: { min: 1, max: 1 }
//!       - name: zipCode
//!         type: string
//!         constraints: { pattern: "[0-9]{5}" }
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use modelkit_core::{
    ModelType, SCHEMA_CONTRACT_VERSION, SchemaError, SchemaRegistry, verify_registry, verify_types,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SchemaLoadError};

/// On-disk encoding of a schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `*.json`
    Json,
    /// `*.yaml` or `*.yml`
    Yaml,
}

impl DocumentFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// A versioned bundle of model types.
///
/// # Examples
///
/// ```
/// use modelkit_core::{Field, ModelType};
/// use modelkit_schema::SchemaDocument;
///
/// let document = SchemaDocument::new("1.0")
///     .with_name("people")
///     .with_type(ModelType::new("Address").with_field(Field::string("city").required()));
///
/// assert_eq!(document.type_count(), 1);
/// assert!(document.verify().is_empty());
///
/// let registry = document.into_registry().unwrap();
/// assert!(registry.contains("Address"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Schema contract version (from [`SCHEMA_CONTRACT_VERSION`]).
    #[serde(default = "contract_version")]
    pub schema_version: String,
    /// Document version.
    pub version: String,
    /// Optional document name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Type definitions, in any order.
    #[serde(default)]
    pub types: Vec<ModelType>,
}

fn contract_version() -> String {
    SCHEMA_CONTRACT_VERSION.to_string()
}

impl SchemaDocument {
    /// Creates an empty document for the current contract version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            schema_version: contract_version(),
            version: version.into(),
            name: None,
            types: Vec::new(),
        }
    }

    /// Sets the document name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a type definition.
    pub fn with_type(mut self, model_type: ModelType) -> Self {
        self.types.push(model_type);
        self
    }

    /// Number of type definitions.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::JsonError`] on malformed input.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::YamlError`] on malformed input.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Loads a document, choosing the format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::UnsupportedFormat`] for unknown
    /// extensions, I/O errors, and parse errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)
            .ok_or_else(|| SchemaLoadError::UnsupportedFormat(path.to_path_buf()))?;
        let reader = BufReader::new(std::fs::File::open(path)?);
        let document: Self = match format {
            DocumentFormat::Json => serde_json::from_reader(reader)?,
            DocumentFormat::Yaml => serde_yaml::from_reader(reader)?,
        };
        debug!(
            path = %path.display(),
            types = document.type_count(),
            "loaded schema document"
        );
        Ok(document)
    }

    /// Saves the document, choosing the format from the file extension.
    ///
    /// JSON is written pretty-printed.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::UnsupportedFormat`] for unknown
    /// extensions, I/O errors, and serialization errors.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)
            .ok_or_else(|| SchemaLoadError::UnsupportedFormat(path.to_path_buf()))?;
        let writer = BufWriter::new(std::fs::File::create(path)?);
        match format {
            DocumentFormat::Json => serde_json::to_writer_pretty(writer, self)?,
            DocumentFormat::Yaml => serde_yaml::to_writer(writer, self)?,
        }
        Ok(())
    }

    /// Checks that the document's contract version has the same major
    /// version as this build.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::IncompatibleVersion`] otherwise.
    pub fn check_compatibility(&self) -> Result<()> {
        let major = |version: &str| version.split('.').next().map(str::to_string);
        if major(&self.schema_version) == major(SCHEMA_CONTRACT_VERSION) {
            Ok(())
        } else {
            Err(SchemaLoadError::IncompatibleVersion {
                found: self.schema_version.clone(),
                supported: SCHEMA_CONTRACT_VERSION.to_string(),
            })
        }
    }

    /// Verifies the type definitions as one set.
    pub fn verify(&self) -> Vec<SchemaError> {
        verify_types(&self.types)
    }

    /// Verifies the document and registers every type.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::IncompatibleVersion`] or
    /// [`SchemaLoadError::InvalidSchema`].
    pub fn into_registry(self) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::new();
        self.register_into(&mut registry)?;
        Ok(registry)
    }

    /// Adds the document's types to `registry`.
    ///
    /// References may point at types already in `registry`. The document is
    /// applied as a whole: on error `registry` is left unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`into_registry`](Self::into_registry); a type that is
    /// already registered is reported as a duplicate.
    pub fn register_into(self, registry: &mut SchemaRegistry) -> Result<()> {
        self.check_compatibility()?;

        let mut staged = registry.clone();
        let mut errors = Vec::new();
        for model_type in self.types {
            if let Err(err) = staged.register(model_type) {
                match SchemaLoadError::registration(err) {
                    SchemaLoadError::InvalidSchema(found) => errors.extend(found),
                    other => return Err(other),
                }
            }
        }
        if errors.is_empty() {
            errors = verify_registry(&staged);
        }
        if !errors.is_empty() {
            return Err(SchemaLoadError::InvalidSchema(errors));
        }

        *registry = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelkit_core::Field;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/types.yml")),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("types.json")),
            Some(DocumentFormat::Json)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("types.toml")), None);
    }

    #[test]
    fn test_parse_yaml() {
        let document = SchemaDocument::from_yaml_str(
            r#"
version: "2"
types:
  - name: Person
    fields:
      - name: age
        type: int
        constraints: { min_value: "0" }
      - name: aliases
        type: string
        cardinality: { min: 0 }
"#,
        )
        .unwrap();

        assert_eq!(document.schema_version, SCHEMA_CONTRACT_VERSION);
        let person = &document.types[0];
        assert_eq!(person.field("age").unwrap().constraints.min_value, Some(0.into()));
        assert!(person.field("aliases").unwrap().is_multi());
    }

    #[test]
    fn test_invalid_pattern_is_a_parse_error() {
        let err = SchemaDocument::from_json_str(
            r#"{"version":"1","types":[{"name":"T","fields":[{"name":"x","type":"string","constraints":{"pattern":"("}}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaLoadError::JsonError(_)));
    }

    #[test]
    fn test_incompatible_contract_version() {
        let mut document = SchemaDocument::new("1");
        document.schema_version = "9.0.0".into();
        assert!(matches!(
            document.into_registry(),
            Err(SchemaLoadError::IncompatibleVersion { .. })
        ));
    }

    fn address(namespace: &str) -> ModelType {
        ModelType::new("Address")
            .with_namespace(namespace)
            .with_field(Field::string("city").required())
    }

    fn person() -> ModelType {
        ModelType::new("Person")
            .with_namespace("com.example")
            .with_field(Field::model("home", "Address"))
    }

    #[test]
    fn test_register_into_resolves_against_existing_types() {
        let mut registry = SchemaDocument::new("1")
            .with_type(address("com.example"))
            .into_registry()
            .unwrap();

        SchemaDocument::new("2")
            .with_type(person())
            .register_into(&mut registry)
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("com.example.Person"));
    }

    #[test]
    fn test_failed_register_into_leaves_registry_unchanged() {
        let mut registry = SchemaDocument::new("1")
            .with_type(ModelType::new("B"))
            .into_registry()
            .unwrap();

        let err = SchemaDocument::new("2")
            .with_type(ModelType::new("A"))
            .with_type(ModelType::new("B"))
            .register_into(&mut registry)
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid schema: duplicate model type: B");
        assert!(!registry.contains("A"));
        assert_eq!(registry.len(), 1);

        let err = SchemaDocument::new("3")
            .with_type(address("org.other"))
            .with_type(person())
            .register_into(&mut registry)
            .unwrap_err();
        assert!(matches!(err, SchemaLoadError::InvalidSchema(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_document_and_catalog_resolve_alike() {
        let document = SchemaDocument::new("1")
            .with_type(address("org.other"))
            .with_type(person());
        assert!(!document.verify().is_empty());
        assert!(document.clone().into_registry().is_err());
        assert!(
            crate::SchemaCatalog::from_documents([document], crate::CatalogSource::Documents)
                .is_err()
        );
    }

    #[test]
    fn test_unresolved_reference_is_rejected() {
        let document = SchemaDocument::new("1")
            .with_type(ModelType::new("Person").with_field(Field::model("home", "Address")));
        let Err(SchemaLoadError::InvalidSchema(errors)) = document.into_registry() else {
            panic!("expected an invalid schema");
        };
        assert_eq!(errors.len(), 1);
    }
}
