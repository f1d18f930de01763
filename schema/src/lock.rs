//! Schema fingerprints for detecting definition changes.
//!
//! A [`SchemaLock`] records a SHA-256 checksum of every registered type's
//! canonical JSON definition. Comparing the lock of a deployed schema with a
//! freshly loaded one tells which types changed.
//!
//! # Examples
//!
//! ```no_run
//! use modelkit_schema::{SchemaCatalog, SchemaLock};
//!
//! let catalog = SchemaCatalog::from_dir("schemas/").unwrap();
//! let current = SchemaLock::from_registry(catalog.registry()).unwrap();
//!
//! let previous = SchemaLock::load("schemas.lock.json").unwrap();
//! for name in previous.diff(&current) {
//!     println!("changed: {name}");
//! }
//! current.save("schemas.lock.json").unwrap();
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::Utc;
use modelkit_core::{ModelType, SCHEMA_CONTRACT_VERSION, SchemaRegistry};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Fingerprint of one type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFingerprint {
    /// Number of declared fields.
    pub fields: usize,
    /// SHA-256 hex digest of the canonical JSON definition.
    pub checksum: String,
}

impl TypeFingerprint {
    /// Fingerprints `model_type`.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError`](crate::SchemaLoadError::JsonError) if the
    /// definition cannot be serialized.
    pub fn of(model_type: &ModelType) -> Result<Self> {
        let canonical = serde_json::to_vec(model_type)?;
        Ok(Self {
            fields: model_type.field_count(),
            checksum: format!("{:x}", Sha256::digest(&canonical)),
        })
    }
}

/// Fingerprints of every type in a registry.
///
/// Persisted as pretty-printed JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaLock {
    /// Schema contract version (mirrors [`SCHEMA_CONTRACT_VERSION`]).
    pub schema_version: String,
    /// RFC 3339 timestamp of when the lock was computed.
    pub generated_at: String,
    /// Fingerprints keyed by qualified type name.
    pub types: BTreeMap<String, TypeFingerprint>,
}

impl SchemaLock {
    /// Fingerprints every registered type.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError`](crate::SchemaLoadError::JsonError) if a
    /// definition cannot be serialized.
    pub fn from_registry(registry: &SchemaRegistry) -> Result<Self> {
        let types = registry
            .types()
            .map(|model_type| {
                TypeFingerprint::of(model_type)
                    .map(|fingerprint| (model_type.qualified_name().to_string(), fingerprint))
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            schema_version: SCHEMA_CONTRACT_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            types,
        })
    }

    /// Loads a lock from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::SchemaLoadError::IoError) if the file
    /// cannot be read, or [`JsonError`](crate::SchemaLoadError::JsonError)
    /// if the content is not valid lock JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let lock = serde_json::from_reader(reader)?;
        Ok(lock)
    }

    /// Saves the lock as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::SchemaLoadError::IoError) if the file
    /// cannot be written, or [`JsonError`](crate::SchemaLoadError::JsonError)
    /// if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Qualified names of the types that differ between `self` and `other`.
    ///
    /// A type differs if it exists on one side only or its checksum
    /// changed. A different contract version marks every type as changed.
    /// Names are returned sorted.
    pub fn diff(&self, other: &SchemaLock) -> Vec<String> {
        let all = self.types.keys().chain(other.types.keys());
        let mut changed: Vec<String> = if self.schema_version != other.schema_version {
            all.cloned().collect()
        } else {
            all.filter(|name| {
                match (self.types.get(name.as_str()), other.types.get(name.as_str())) {
                    (Some(a), Some(b)) => a.checksum != b.checksum,
                    _ => true,
                }
            })
            .cloned()
            .collect()
        };
        changed.sort();
        changed.dedup();
        changed
    }

    /// Fingerprint of a type.
    pub fn get(&self, name: &str) -> Option<&TypeFingerprint> {
        self.types.get(name)
    }

    /// Returns `true` if the lock has an entry for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of fingerprinted types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type is fingerprinted.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelkit_core::Field;

    fn registry(city_required: bool) -> SchemaRegistry {
        let city = if city_required {
            Field::string("city").required()
        } else {
            Field::string("city")
        };
        let mut registry = SchemaRegistry::new();
        registry
            .register(ModelType::new("Address").with_field(city))
            .unwrap();
        registry
            .register(ModelType::new("Tag").with_field(Field::string("label")))
            .unwrap();
        registry
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = SchemaLock::from_registry(&registry(true)).unwrap();
        let b = SchemaLock::from_registry(&registry(true)).unwrap();
        assert_eq!(a.types, b.types);
        assert_eq!(a.get("Address").unwrap().checksum.len(), 64);
        assert!(a.diff(&b).is_empty());
    }

    #[test]
    fn test_diff_reports_changed_added_removed() {
        let old = SchemaLock::from_registry(&registry(true)).unwrap();
        let mut new = SchemaLock::from_registry(&registry(false)).unwrap();
        new.types.remove("Tag");
        new.types.insert(
            "Extra".into(),
            TypeFingerprint {
                fields: 0,
                checksum: "00".into(),
            },
        );
        assert_eq!(old.diff(&new), ["Address", "Extra", "Tag"]);
    }

    #[test]
    fn test_contract_change_marks_everything() {
        let old = SchemaLock::from_registry(&registry(true)).unwrap();
        let mut new = old.clone();
        new.schema_version = "2.0.0".into();
        assert_eq!(old.diff(&new), ["Address", "Tag"]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemas.lock.json");
        let lock = SchemaLock::from_registry(&registry(true)).unwrap();
        lock.save(&path).unwrap();
        assert_eq!(SchemaLock::load(&path).unwrap(), lock);
    }
}
