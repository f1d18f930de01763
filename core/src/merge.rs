//! Gap-filling merge of two builders of the same type.
//!
//! [`merge`] walks the base builder with a [`BuilderProcessor`] and looks up
//! the same relative path in the overlay. A field is only ever taken from
//! the overlay when the base leaves a gap (or when the strategy prefers the
//! overlay for scalars); nested objects present on both sides are merged
//! field by field.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use modelkit_core::*;
//!
//! let address = Arc::new(
//!     ModelType::new("Address")
//!         .with_field(Field::string("street"))
//!         .with_field(Field::string("city")),
//! );
//!
//! let mut base = ModelBuilder::new(&address).with("street", "Main");
//! let overlay = ModelBuilder::new(&address)
//!     .with("street", "High")
//!     .with("city", "York");
//!
//! merge(&mut base, &overlay);
//! assert_eq!(base.get("street"), Some(&Value::from("Main")));
//! assert_eq!(base.get("city"), Some(&Value::from("York")));
//! ```

use tracing::{debug, trace};

use crate::error::{ModelError, Result};
use crate::object::{ModelBuilder, ModelObject};
use crate::path::Path;
use crate::process::BuilderProcessor;
use crate::types::Field;
use crate::value::Value;

/// Merge behavior for scalars present on both sides.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use modelkit_core::*;
///
/// let t = Arc::new(ModelType::new("T").with_field(Field::string("label")));
/// let overlay = ModelBuilder::new(&t).with("label", "overlay");
///
/// let mut kept = ModelBuilder::new(&t).with("label", "base");
/// merge_with(&mut kept, &overlay, MergeStrategy::PreferBase);
/// assert_eq!(kept.get("label"), Some(&Value::from("base")));
///
/// let mut replaced = ModelBuilder::new(&t).with("label", "base");
/// merge_with(&mut replaced, &overlay, MergeStrategy::PreferOverlay);
/// assert_eq!(replaced.get("label"), Some(&Value::from("overlay")));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Keep base values; the overlay only fills gaps.
    #[default]
    PreferBase,
    /// Present overlay scalars replace base scalars.
    PreferOverlay,
}

/// Merges `overlay` into `base` with [`MergeStrategy::PreferBase`].
///
/// # Panics
///
/// Panics if the builders have different types. Use [`try_merge`] to get an
/// error instead.
pub fn merge<'a>(base: &'a mut ModelBuilder, overlay: &ModelBuilder) -> &'a mut ModelBuilder {
    merge_with(base, overlay, MergeStrategy::default())
}

/// Merges `overlay` into `base` with an explicit strategy.
///
/// # Panics
///
/// Panics if the builders have different types.
pub fn merge_with<'a>(
    base: &'a mut ModelBuilder,
    overlay: &ModelBuilder,
    strategy: MergeStrategy,
) -> &'a mut ModelBuilder {
    if let Err(err) = try_merge_with(base, overlay, strategy) {
        panic!("{err}");
    }
    base
}

/// Merges `overlay` into `base`, reporting a type mismatch as an error.
///
/// # Errors
///
/// Returns [`ModelError::ModelTypeMismatch`] when the builders have
/// different types. `base` is left untouched in that case.
pub fn try_merge<'a>(
    base: &'a mut ModelBuilder,
    overlay: &ModelBuilder,
) -> Result<&'a mut ModelBuilder> {
    try_merge_with(base, overlay, MergeStrategy::default())
}

/// Strategy-aware variant of [`try_merge`].
///
/// # Errors
///
/// Returns [`ModelError::ModelTypeMismatch`] when the builders have
/// different types.
pub fn try_merge_with<'a>(
    base: &'a mut ModelBuilder,
    overlay: &ModelBuilder,
    strategy: MergeStrategy,
) -> Result<&'a mut ModelBuilder> {
    if !base.model_type().same_type(overlay.model_type()) {
        return Err(ModelError::ModelTypeMismatch {
            expected: base.model_type().qualified_name().to_string(),
            found: overlay.model_type().qualified_name().to_string(),
        });
    }
    debug!(
        model_type = base.model_type().qualified_name(),
        ?strategy,
        "merging builders"
    );
    base.process(&mut Merger { overlay, strategy });
    Ok(base)
}

impl ModelBuilder {
    /// Method form of [`merge`].
    pub fn merge(&mut self, overlay: &ModelBuilder) -> &mut Self {
        merge(self, overlay)
    }

    /// Method form of [`merge_with`].
    pub fn merge_with(&mut self, overlay: &ModelBuilder, strategy: MergeStrategy) -> &mut Self {
        merge_with(self, overlay, strategy)
    }
}

/// Fills fields of the walked builder from the overlay at the same path.
struct Merger<'o> {
    overlay: &'o ModelBuilder,
    strategy: MergeStrategy,
}

impl BuilderProcessor for Merger<'_> {
    fn process(&mut self, path: &Path, field: &Field, owner: &mut ModelBuilder) {
        let Some(incoming) = self.overlay.resolve(&path.segments()[1..]) else {
            return;
        };
        let Some(index) = owner.model_type().field_index(&field.name) else {
            return;
        };

        let merged = match owner.get(&field.name) {
            None => incoming.clone(),
            // Nested objects are merged when the walk descends into them.
            Some(Value::Model(_)) => return,
            Some(Value::List(current)) => match merge_list(current, incoming) {
                Some(list) => list,
                None => return,
            },
            Some(_) if self.strategy == MergeStrategy::PreferOverlay => incoming.clone(),
            Some(_) => return,
        };
        trace!(%path, "filled from overlay");
        owner.put(index, Some(merged));
    }
}

/// Combines two lists for the same field.
///
/// Basic values from `incoming` that are missing from `current` are
/// appended. Model lists keep `current` element-wise (elements are merged
/// later by the walk) and receive `incoming`'s surplus elements. Returns
/// `None` when `current` stays as it is.
fn merge_list(current: &[Value], incoming: &Value) -> Option<Value> {
    let Value::List(incoming) = incoming else {
        return None;
    };

    let additions: Vec<&Value> = if current.iter().any(|item| item.as_model().is_some()) {
        incoming.iter().skip(current.len()).collect()
    } else {
        incoming.iter().filter(|item| !current.contains(item)).collect()
    };
    if additions.is_empty() {
        return None;
    }

    let mut merged = current.to_vec();
    merged.extend(additions.into_iter().cloned());
    Some(Value::List(merged))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::ModelType;

    fn address() -> Arc<ModelType> {
        Arc::new(
            ModelType::new("Address")
                .with_field(Field::string("street"))
                .with_field(Field::string("city"))
                .with_field(Field::string("zipCode")),
        )
    }

    fn person() -> Arc<ModelType> {
        Arc::new(
            ModelType::new("Person")
                .with_field(Field::string("firstName"))
                .with_field(Field::int("age"))
                .with_field(Field::string("aliases").many())
                .with_field(Field::model("address", "Address"))
                .with_field(Field::model("previous", "Address").many()),
        )
    }

    fn addr(street: Option<&str>, city: Option<&str>) -> Value {
        ModelBuilder::new(&address())
            .with_option("street", street)
            .with_option("city", city)
            .build()
            .into()
    }

    #[test]
    fn test_base_wins_when_both_set() {
        let person = person();
        let mut a = ModelBuilder::new(&person).with("firstName", "Ada");
        let b = ModelBuilder::new(&person).with("firstName", "Grace").with("age", 36);
        a.merge(&b);
        assert_eq!(a.get("firstName"), Some(&Value::from("Ada")));
        assert_eq!(a.get("age"), Some(&Value::from(36)));
    }

    #[test]
    fn test_overlay_absence_keeps_base() {
        let person = person();
        let mut a = ModelBuilder::new(&person).with("age", 20);
        let b = ModelBuilder::new(&person);
        a.merge(&b);
        assert_eq!(a.get("age"), Some(&Value::from(20)));
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let person = person();
        let mut a = ModelBuilder::new(&person).with("address", addr(Some("Main"), None));
        let b = ModelBuilder::new(&person).with("address", addr(Some("High"), Some("York")));
        a.merge(&b);
        assert_eq!(a.get("address"), Some(&addr(Some("Main"), Some("York"))));
    }

    #[test]
    fn test_basic_lists_are_unioned() {
        let person = person();
        let mut a = ModelBuilder::new(&person).with("aliases", vec!["A", "B"]);
        let b = ModelBuilder::new(&person).with("aliases", vec!["B", "C"]);
        a.merge(&b);
        assert_eq!(a.get("aliases"), Some(&Value::from(vec!["A", "B", "C"])));
    }

    #[test]
    fn test_model_lists_merge_by_index() {
        let person = person();
        let mut a = ModelBuilder::new(&person).with("previous", vec![addr(Some("Main"), None)]);
        let b = ModelBuilder::new(&person).with(
            "previous",
            vec![addr(None, Some("York")), addr(Some("Low Rd"), None)],
        );
        a.merge(&b);
        assert_eq!(
            a.get("previous"),
            Some(&Value::from(vec![
                addr(Some("Main"), Some("York")),
                addr(Some("Low Rd"), None),
            ]))
        );
    }

    #[test]
    fn test_prefer_overlay_replaces_scalars_only() {
        let person = person();
        let mut a = ModelBuilder::new(&person)
            .with("firstName", "Ada")
            .with("aliases", vec!["A"])
            .with("address", addr(Some("Main"), None));
        let b = ModelBuilder::new(&person)
            .with("firstName", "Grace")
            .with("aliases", vec!["B"])
            .with("address", addr(Some("High"), Some("York")));
        a.merge_with(&b, MergeStrategy::PreferOverlay);

        assert_eq!(a.get("firstName"), Some(&Value::from("Grace")));
        assert_eq!(a.get("aliases"), Some(&Value::from(vec!["A", "B"])));
        assert_eq!(a.get("address"), Some(&addr(Some("High"), Some("York"))));
    }

    #[test]
    fn test_type_mismatch_is_error() {
        let mut a = ModelBuilder::new(&person());
        let b = ModelBuilder::new(&address());
        let err = try_merge(&mut a, &b).unwrap_err();
        assert!(matches!(err, ModelError::ModelTypeMismatch { .. }));
    }

    #[test]
    #[should_panic(expected = "model type mismatch")]
    fn test_merge_panics_on_type_mismatch() {
        let mut a = ModelBuilder::new(&person());
        merge(&mut a, &ModelBuilder::new(&address()));
    }

    #[test]
    fn test_merge_does_not_touch_overlay() {
        let person = person();
        let mut a = ModelBuilder::new(&person).with("address", addr(Some("Main"), None));
        let b = ModelBuilder::new(&person).with("address", addr(None, Some("York")));
        let before = b.clone();
        a.merge(&b);
        assert_eq!(b, before);
    }
}
