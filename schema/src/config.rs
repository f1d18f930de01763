//! Runtime configuration for loading schemas and validating values.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! sources:
//!   - kind: directory
//!     path: /etc/modelkit/schemas
//!   - kind: file
//!     path: schemas/people.yaml
//! validation:
//!   cardinality: true
//!   type_format: true
//!   recurse_nested: false
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use modelkit_core::{PipelineConfig, SchemaRegistry, ValidationPipeline};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::loader::{CatalogBuilder, CatalogSource, SchemaCatalog};

/// One entry of the schema fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// A single schema document.
    File {
        /// Document path.
        path: PathBuf,
    },
    /// A directory of schema documents.
    Directory {
        /// Directory path.
        path: PathBuf,
    },
}

impl From<&SourceConfig> for CatalogSource {
    fn from(source: &SourceConfig) -> Self {
        match source {
            SourceConfig::File { path } => CatalogSource::File(path.clone()),
            SourceConfig::Directory { path } => CatalogSource::Directory(path.clone()),
        }
    }
}

/// Top-level runtime configuration.
///
/// Loaded from a YAML file (typically `modelkit.yml`).
///
/// # Examples
///
/// ```no_run
/// use modelkit_schema::RuntimeConfig;
///
/// let config = RuntimeConfig::load("modelkit.yml").unwrap();
/// let catalog = config.catalog().unwrap();
/// let pipeline = config.pipeline(catalog.registry());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Configuration format version (e.g. `"1.0"`).
    pub version: String,
    /// Schema sources, tried in order.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    /// Validation kinds to run.
    #[serde(default)]
    pub validation: PipelineConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            sources: Vec::new(),
            validation: PipelineConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::SchemaLoadError::IoError) if the file
    /// cannot be read, or [`YamlError`](crate::SchemaLoadError::YamlError)
    /// if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::SchemaLoadError::IoError) if the file
    /// cannot be written, or [`YamlError`](crate::SchemaLoadError::YamlError)
    /// if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Appends a source to the fallback chain.
    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.sources.push(source);
        self
    }

    /// A catalog builder over the configured sources.
    pub fn catalog_builder(&self) -> CatalogBuilder {
        self.sources
            .iter()
            .fold(SchemaCatalog::builder(), |builder, source| {
                builder.source(source.into())
            })
    }

    /// Loads the catalog from the configured sources.
    ///
    /// # Errors
    ///
    /// Returns [`NoSourcesAvailable`](crate::SchemaLoadError::NoSourcesAvailable)
    /// if no source loads.
    pub fn catalog(&self) -> Result<SchemaCatalog> {
        self.catalog_builder().build()
    }

    /// A validation pipeline over `registry` with the configured kinds.
    pub fn pipeline<'r>(&self, registry: &'r SchemaRegistry) -> ValidationPipeline<'r> {
        ValidationPipeline::new(registry).with_config(self.validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_are_missing() {
        let config: RuntimeConfig = serde_yaml::from_str("version: \"1.0\"\n").unwrap();
        assert!(config.sources.is_empty());
        assert_eq!(config.validation, PipelineConfig::default());
    }

    #[test]
    fn test_parse_sources_and_partial_validation() {
        let config: RuntimeConfig = serde_yaml::from_str(
            r#"
version: "1.0"
sources:
  - kind: directory
    path: /etc/modelkit/schemas
  - kind: file
    path: people.yaml
validation:
  recurse_nested: false
"#,
        )
        .unwrap();

        assert_eq!(
            config.sources,
            vec![
                SourceConfig::Directory {
                    path: "/etc/modelkit/schemas".into()
                },
                SourceConfig::File {
                    path: "people.yaml".into()
                },
            ]
        );
        assert!(config.validation.cardinality);
        assert!(!config.validation.recurse_nested);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modelkit.yml");
        let config = RuntimeConfig::default().with_source(SourceConfig::File {
            path: "people.yaml".into(),
        });
        config.save(&path).unwrap();
        assert_eq!(RuntimeConfig::load(&path).unwrap(), config);
    }
}
