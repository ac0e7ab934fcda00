use crate::accessor::FieldPath;
use crate::constants::PATH_DELIMITER;
use crate::type_info::{FieldType, ValueType};

/// One possible source for a destination field
#[derive(Debug, Clone)]
pub struct Candidate {
    source_type: fn() -> ValueType,
    path:        String,
    container:   Option<String>,
}

impl Candidate {
    /// Read `path` from sources of type `T`
    pub fn new<T: FieldType>(path: impl Into<String>) -> Self {
        Self {
            source_type: T::value_type,
            path:        path.into(),
            container:   None,
        }
    }

    /// Read the path on the value of `container` instead of on the source itself
    #[must_use]
    pub fn container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into()).filter(|container| !container.trim().is_empty());
        self
    }

    /// Declared source type this candidate applies to
    pub fn source_type(&self) -> ValueType { (self.source_type)() }

    /// Field path as declared
    pub fn path(&self) -> &str { &self.path }

    /// Container field, if any
    pub fn container_name(&self) -> Option<&str> { self.container.as_deref() }

    /// Raw effective path, `container.path` when a container is set
    pub fn effective_path(&self) -> String {
        self.container.as_ref().map_or_else(
            || self.path.clone(),
            |container| format!("{container}{PATH_DELIMITER}{}", self.path),
        )
    }

    /// Parsed effective path; `None` when either part is malformed
    pub fn source_path(&self) -> Option<FieldPath> {
        let path = FieldPath::parse(&self.path)?;
        match &self.container {
            Some(container) => FieldPath::parse(container).map(|container| FieldPath::within(&container, &path)),
            None => Some(path),
        }
    }
}

/// Mapping metadata for one destination field: candidates in priority order
#[derive(Debug, Clone)]
pub struct FieldMapping {
    target:     String,
    candidates: Vec<Candidate>,
}

impl FieldMapping {
    /// Metadata for the destination path `target` (a field name, or a dotted nested path)
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target:     target.into(),
            candidates: Vec::new(),
        }
    }

    /// Append a candidate; earlier candidates win
    #[must_use]
    pub fn candidate(mut self, candidate: Candidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// Destination path as declared
    pub fn target(&self) -> &str { &self.target }

    /// First segment of the destination path
    pub fn target_root(&self) -> Option<&str> {
        self.target
            .split(PATH_DELIMITER)
            .next()
            .map(str::trim)
            .filter(|root| !root.is_empty())
    }

    /// Candidates in declaration order
    pub fn candidates(&self) -> &[Candidate] { &self.candidates }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_prefixes_source_path() {
        let candidate = Candidate::new::<String>("value").container("inner");
        assert_eq!(candidate.effective_path(), "inner.value");
        assert_eq!(
            candidate.source_path().map(|path| path.to_string()).as_deref(),
            Some("inner.value")
        );
        assert_eq!(candidate.container_name(), Some("inner"));
    }

    #[test]
    fn test_blank_container_is_ignored() {
        let candidate = Candidate::new::<String>("value").container("  ");
        assert_eq!(candidate.container_name(), None);
        assert_eq!(candidate.effective_path(), "value");
    }

    #[test]
    fn test_malformed_path_has_no_source_path() {
        assert!(Candidate::new::<String>("a..b").source_path().is_none());
        assert!(Candidate::new::<String>("").source_path().is_none());
    }

    #[test]
    fn test_target_root_of_nested_target() {
        let mapping = FieldMapping::new("address.city").candidate(Candidate::new::<String>("city"));
        assert_eq!(mapping.target_root(), Some("address"));
        assert_eq!(mapping.candidates().len(), 1);
        assert_eq!(FieldMapping::new("").target_root(), None);
    }
}
