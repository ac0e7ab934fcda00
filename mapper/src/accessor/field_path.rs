use std::fmt;

use itertools::Itertools;

use crate::constants::PATH_DELIMITER;

/// Non-empty, dot-delimited sequence of field names
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parse `inner.value` style paths; empty paths and empty segments are rejected
    pub fn parse(raw: &str) -> Option<Self> {
        let segments: Vec<String> = raw
            .trim()
            .split(PATH_DELIMITER)
            .map(|segment| segment.trim().to_string())
            .collect();
        if segments.iter().any(String::is_empty) {
            return None;
        }
        Some(Self(segments))
    }

    /// `container.path`: read the container first, then the nested path on it
    pub fn within(container: &Self, path: &Self) -> Self {
        Self(container.0.iter().chain(path.0.iter()).cloned().collect())
    }

    /// All segments in order
    pub fn segments(&self) -> &[String] { &self.0 }

    /// Number of segments
    pub fn len(&self) -> usize { self.0.len() }

    /// Whether the path has no segments
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// First segment
    pub fn root(&self) -> &str { self.0.first().map_or("", String::as_str) }

    /// Last segment together with the segments leading to it
    pub fn split_leaf(&self) -> (&[String], &str) {
        self.0
            .split_last()
            .map_or((&[][..], ""), |(leaf, containers)| (containers, leaf.as_str()))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join(&PATH_DELIMITER.to_string()))
    }
}
