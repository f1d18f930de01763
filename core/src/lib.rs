//! Runtime for schema-defined model objects.
//!
//! This crate provides the building blocks that every modeled data type
//! shares:
//!
//! - [`ModelType`] / [`Field`]: the schema of a type, ordered fields with
//!   cardinality bounds and format constraints.
//! - [`ModelValue`] / [`ModelBuilder`]: immutable values with structural
//!   equality and their mutable builders, joined by the [`ModelObject`]
//!   read contract.
//! - [`Processor`] / [`BuilderProcessor`]: path-addressed traversal of
//!   nested object trees.
//! - [`merge`]: gap-filling merge of two builders, configurable through a
//!   [`MergeStrategy`].
//! - [`ValidationPipeline`]: cardinality, type-format and only-exists
//!   checks, with validators looked up per type in a [`SchemaRegistry`].
//! - [`FunctionShell`]: evaluates a [`ModelFunction`] and validates its
//!   result.
//!
//! Structural problems in a schema are caught by [`verify_model_type`] and
//! [`verify_registry`] before any value is built.
//!
//! # Example
//!
//! ```
//! use modelkit_core::*;
//! use modelkit_core::validation::field_set;
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register(
//!         ModelType::new("Person")
//!             .with_field(Field::string("firstName").required())
//!             .with_field(Field::string("lastName").required())
//!             .with_field(Field::int("age")),
//!     )
//!     .unwrap();
//!
//! let ada = registry
//!     .builder("Person")
//!     .unwrap()
//!     .with("firstName", "Ada")
//!     .with("lastName", "Lovelace")
//!     .build();
//!
//! let pipeline = ValidationPipeline::new(&registry);
//! assert!(pipeline.validate(&ada).is_success());
//! assert!(pipeline.validate_only_exists(&ada, &field_set(["firstName", "lastName"])).is_success());
//!
//! let only_first = pipeline.validate_only_exists(&ada, &field_set(["firstName"]));
//! assert_eq!(
//!     only_first.failure_reason.as_deref(),
//!     Some("[firstName] should only be set. Set fields: [firstName, lastName]")
//! );
//! ```

mod error;
mod function;
mod json;
mod merge;
mod meta;
mod object;
mod path;
mod process;
pub mod registry;
mod types;
pub mod validation;
mod value;
mod verify;

pub use error::{ModelError, Result};
pub use function::{AssignOutput, FnFunction, FunctionShell, Inputs, ModelFunction};
pub use merge::{MergeStrategy, merge, merge_with, try_merge, try_merge_with};
pub use meta::ModelMeta;
pub use object::{ModelBuilder, ModelObject, ModelValue};
pub use path::{Path, PathParseError, PathSegment};
pub use process::{BuilderProcessor, Processor};
pub use registry::SchemaRegistry;
pub use types::{
    Cardinality, Constraints, Field, FieldType, ModelType, Pattern, PrimitiveType,
    SCHEMA_CONTRACT_VERSION,
};
pub use validation::{
    PipelineConfig, ValidationPipeline, ValidationReport, ValidationResult, ValidationType,
};
pub use value::Value;
pub use verify::{SchemaError, verify_model_type, verify_registry, verify_types};
