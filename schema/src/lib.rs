//! Schema document loading, runtime configuration and fingerprints for
//! modelkit.
//!
//! This crate moves [`ModelType`](modelkit_core::ModelType) tables in and
//! out of JSON and YAML documents, assembles them into a verified
//! [`SchemaRegistry`](modelkit_core::SchemaRegistry) through fallback
//! chains, and tracks definition changes with checksummed locks.
//!
//! # Quick start
//!
//! ```no_run
//! use modelkit_schema::{RuntimeConfig, SchemaCatalog, SchemaLock};
//!
//! // Load every document in a directory
//! let catalog = SchemaCatalog::from_dir("schemas/").unwrap();
//! if let Some(person) = catalog.get("com.example.Person") {
//!     println!("Person has {} fields", person.field_count());
//! }
//!
//! // Or follow the sources listed in a runtime configuration
//! let config = RuntimeConfig::load("modelkit.yml").unwrap();
//! let catalog = config.catalog().unwrap();
//! let pipeline = config.pipeline(catalog.registry());
//!
//! // Record the loaded definitions
//! SchemaLock::from_registry(catalog.registry())
//!     .unwrap()
//!     .save("schemas.lock.json")
//!     .unwrap();
//! ```

mod config;
mod document;
mod error;
mod loader;
mod lock;

pub use config::{RuntimeConfig, SourceConfig};
pub use document::{DocumentFormat, SchemaDocument};
pub use error::{Result, SchemaLoadError};
pub use loader::{CatalogBuilder, CatalogSource, SchemaCatalog};
pub use lock::{SchemaLock, TypeFingerprint};
