//! Schema catalog loading with builder pattern and fallback chains.
//!
//! A [`SchemaCatalog`] is a verified [`SchemaRegistry`] plus a record of
//! where its types came from.
//!
//! # Loading patterns
//!
//! ```no_run
//! use modelkit_schema::SchemaCatalog;
//!
//! // A directory of JSON and YAML schema documents
//! let catalog = SchemaCatalog::from_dir("schemas/").unwrap();
//! assert!(catalog.registry().get("com.example.Person").is_some());
//!
//! // A single document
//! let catalog = SchemaCatalog::from_file("schemas/people.yaml").unwrap();
//!
//! // A fallback chain: the first source that loads wins
//! let catalog = SchemaCatalog::builder()
//!     .from_dir("/etc/modelkit/schemas/")
//!     .from_file("schemas/people.yaml")
//!     .build()
//!     .unwrap();
//!
//! // Publish for the whole process
//! catalog.install().unwrap();
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use modelkit_core::{ModelType, SchemaRegistry, registry, verify_registry};
use tracing::{debug, warn};

use crate::document::{DocumentFormat, SchemaDocument};
use crate::error::{Result, SchemaLoadError};

/// Describes where a [`SchemaCatalog`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// A single schema document.
    File(PathBuf),
    /// A directory of schema documents.
    Directory(PathBuf),
    /// Documents supplied in memory.
    Documents,
    /// A fallback chain of sources.
    Multiple(Vec<CatalogSource>),
}

/// Verified registry of model types loaded from schema documents.
#[derive(Debug)]
pub struct SchemaCatalog {
    registry: SchemaRegistry,
    source: CatalogSource,
}

impl SchemaCatalog {
    /// Returns a new [`CatalogBuilder`] for configuring a fallback chain.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Loads a single JSON or YAML document.
    ///
    /// # Errors
    ///
    /// Returns I/O and parse errors, [`SchemaLoadError::IncompatibleVersion`]
    /// and [`SchemaLoadError::InvalidSchema`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = SchemaDocument::load(path)?;
        Self::from_documents([document], CatalogSource::File(path.to_path_buf()))
    }

    /// Loads every `*.json`, `*.yaml` and `*.yml` document in a directory.
    ///
    /// Files are read in name order; other files are ignored. References may
    /// cross documents.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file).
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() && DocumentFormat::from_path(&file_path).is_some() {
                files.push(file_path);
            }
        }
        files.sort();

        let documents = files
            .iter()
            .map(SchemaDocument::load)
            .collect::<Result<Vec<_>>>()?;
        Self::from_documents(documents, CatalogSource::Directory(path.to_path_buf()))
    }

    /// Builds a catalog from documents already in memory.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::IncompatibleVersion`] or
    /// [`SchemaLoadError::InvalidSchema`].
    pub fn from_documents(
        documents: impl IntoIterator<Item = SchemaDocument>,
        source: CatalogSource,
    ) -> Result<Self> {
        let mut registry = SchemaRegistry::new();
        for document in documents {
            document.check_compatibility()?;
            for model_type in document.types {
                registry
                    .register(model_type)
                    .map_err(SchemaLoadError::registration)?;
            }
        }

        let errors = verify_registry(&registry);
        if !errors.is_empty() {
            return Err(SchemaLoadError::InvalidSchema(errors));
        }

        debug!(?source, types = registry.len(), "loaded schema catalog");
        Ok(Self { registry, source })
    }

    /// The loaded registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Consumes the catalog, returning its registry.
    pub fn into_registry(self) -> SchemaRegistry {
        self.registry
    }

    /// Looks up a type by qualified name.
    pub fn get(&self, name: &str) -> Option<&Arc<ModelType>> {
        self.registry.get(name)
    }

    /// Returns `true` if the qualified name is loaded.
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Number of loaded types.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if no type was loaded.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Where the catalog was loaded from.
    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    /// Publishes the registry process-wide.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::AlreadyInstalled`] if a registry was
    /// installed before.
    pub fn install(self) -> Result<&'static SchemaRegistry> {
        registry::install(self.registry).map_err(|_| SchemaLoadError::AlreadyInstalled)
    }
}

/// Builder for a [`SchemaCatalog`] with a fallback chain.
///
/// Sources are tried in the order they are added. The first successful load
/// wins; if all fail, [`SchemaLoadError::NoSourcesAvailable`] is returned.
///
/// # Example
///
/// ```no_run
/// use modelkit_schema::SchemaCatalog;
///
/// let catalog = SchemaCatalog::builder()
///     .from_dir("/opt/schemas/")
///     .from_file("/opt/schemas.yaml")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    sources: Vec<CatalogSource>,
}

impl CatalogBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory of schema documents as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(CatalogSource::Directory(path.into()));
        self
    }

    /// Adds a single schema document as a source.
    pub fn from_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(CatalogSource::File(path.into()));
        self
    }

    /// Adds an already-described source.
    pub fn source(mut self, source: CatalogSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Attempts to load from the configured sources in order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::NoSourcesAvailable`] if no source loads.
    pub fn build(self) -> Result<SchemaCatalog> {
        if self.sources.is_empty() {
            return Err(SchemaLoadError::NoSourcesAvailable);
        }

        for source in &self.sources {
            let result = match source {
                CatalogSource::Directory(path) => SchemaCatalog::from_dir(path),
                CatalogSource::File(path) => SchemaCatalog::from_file(path),
                CatalogSource::Documents | CatalogSource::Multiple(_) => continue,
            };

            match result {
                Ok(mut catalog) => {
                    catalog.source = CatalogSource::Multiple(self.sources.clone());
                    return Ok(catalog);
                }
                Err(err) => warn!(?source, error = %err, "schema source failed"),
            }
        }

        Err(SchemaLoadError::NoSourcesAvailable)
    }
}
