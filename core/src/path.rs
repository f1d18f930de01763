//! Paths addressing fields inside a model object tree.
//!
//! A [`Path`] starts at a root segment (usually the root type name) and is
//! extended by field names and list indexes as a processor descends:
//! `Person.address.city`, `Person.aliases(1)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// A named field (or the root).
    Field(String),
    /// An element of a list field.
    Index(usize),
}

/// Error returned when parsing a malformed path string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    /// A `.`-separated segment has no field name.
    #[error("empty path segment in {0:?}")]
    EmptySegment(String),
    /// An index suffix is not `(<digits>)`.
    #[error("invalid index in path segment {0:?}")]
    InvalidIndex(String),
}

/// Ordered sequence of segments from a root.
///
/// # Examples
///
/// ```
/// use modelkit_core::Path;
///
/// let path = Path::new("Person").child("aliases").index(1);
/// assert_eq!(path.to_string(), "Person.aliases(1)");
///
/// let parsed: Path = "Person.address.city".parse().unwrap();
/// assert_eq!(parsed.last_field(), Some("city"));
/// assert_eq!(parsed.parent().unwrap().to_string(), "Person.address");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Creates a path with a single root segment.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Field(root.into())],
        }
    }

    /// Returns a new path extended by a field name.
    pub fn child(&self, field: &str) -> Self {
        self.extended(PathSegment::Field(field.to_string()))
    }

    /// Returns a new path extended by a list index.
    pub fn index(&self, index: usize) -> Self {
        self.extended(PathSegment::Index(index))
    }

    fn extended(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// Returns the path without its last segment.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.segments.split_last()?;
        Some(Self {
            segments: init.to_vec(),
        })
    }

    /// All segments, root first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for a path with no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Name of the last field segment, skipping trailing indexes.
    pub fn last_field(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|segment| match segment {
            PathSegment::Field(name) => Some(name.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    /// Returns `true` if `prefix` is a leading part of this path.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if position == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "({index})")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        if s.is_empty() {
            return Ok(Self { segments });
        }

        for part in s.split('.') {
            let (name, mut indexes) = match part.find('(') {
                Some(open) => part.split_at(open),
                None => (part, ""),
            };
            if name.is_empty() {
                return Err(PathParseError::EmptySegment(s.to_string()));
            }
            segments.push(PathSegment::Field(name.to_string()));

            while !indexes.is_empty() {
                let close = indexes
                    .find(')')
                    .ok_or_else(|| PathParseError::InvalidIndex(part.to_string()))?;
                let index = indexes[1..close]
                    .parse::<usize>()
                    .map_err(|_| PathParseError::InvalidIndex(part.to_string()))?;
                segments.push(PathSegment::Index(index));
                indexes = &indexes[close + 1..];
                if !indexes.is_empty() && !indexes.starts_with('(') {
                    return Err(PathParseError::InvalidIndex(part.to_string()));
                }
            }
        }

        Ok(Self { segments })
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_does_not_mutate_parent() {
        let root = Path::new("Address");
        let street = root.child("street");
        assert_eq!(root.len(), 1);
        assert_eq!(street.to_string(), "Address.street");
    }

    #[test]
    fn test_parse_roundtrip_with_indexes() {
        let text = "Order.lines(2).product.codes(0)(1)";
        let path: Path = text.parse().unwrap();
        assert_eq!(path.to_string(), text);
        assert_eq!(path.len(), 7);
        assert_eq!(path.last_field(), Some("codes"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            "a..b".parse::<Path>(),
            Err(PathParseError::EmptySegment("a..b".into()))
        );
        assert!(matches!(
            "a(x)".parse::<Path>(),
            Err(PathParseError::InvalidIndex(_))
        ));
        assert!(matches!(
            "a(1".parse::<Path>(),
            Err(PathParseError::InvalidIndex(_))
        ));
    }

    #[test]
    fn test_starts_with() {
        let path: Path = "Person.address.city".parse().unwrap();
        assert!(path.starts_with(&Path::new("Person").child("address")));
        assert!(!path.starts_with(&Path::new("Address")));
    }

    #[test]
    fn test_serializes_as_string() {
        let path = Path::new("Person").child("age");
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"Person.age\"");
    }
}
