use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered reference -> document path mapping produced by one localization run.
///
/// Insertion order is preserved. A reference is recorded at most once; several
/// references may share a document path when their content was deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementMapping {
    entries: Vec<(String, String)>,
    by_reference: HashMap<String, usize>,
    by_path: HashMap<String, usize>,
}

impl ReplacementMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `reference -> document_path`.
    ///
    /// Returns `false` and leaves the mapping untouched when the reference is
    /// already present.
    pub fn insert(&mut self, reference: impl Into<String>, document_path: impl Into<String>) -> bool {
        let reference = reference.into();
        if self.by_reference.contains_key(&reference) {
            return false;
        }
        let document_path = document_path.into();
        let idx = self.entries.len();
        self.by_reference.insert(reference.clone(), idx);
        self.by_path.entry(document_path.clone()).or_insert(idx);
        self.entries.push((reference, document_path));
        true
    }

    pub fn contains_reference(&self, reference: &str) -> bool {
        self.by_reference.contains_key(reference)
    }

    pub fn get(&self, reference: &str) -> Option<&str> {
        self.by_reference
            .get(reference)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    /// First reference recorded with `document_path`, if any.
    pub fn owner_of(&self, document_path: &str) -> Option<&str> {
        self.by_path
            .get(document_path)
            .map(|&idx| self.entries[idx].0.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(r, p)| (r.as_str(), p.as_str()))
    }

    pub fn document_paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, p)| p.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(String, String)> {
        self.entries
    }
}

impl Serialize for ReplacementMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (reference, path) in &self.entries {
            map.serialize_entry(reference, path)?;
        }
        map.end()
    }
}

/// Joins a forward-slash directory and a filename into a document path.
pub fn join_document_path(dir: &str, filename: &str) -> String {
    if dir.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_value() {
        let mut mapping = ReplacementMapping::new();
        assert!(mapping.insert("a", "images/a.png"));
        assert!(!mapping.insert("a", "images/other.png"));
        assert_eq!(mapping.get("a"), Some("images/a.png"));
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn owner_is_first_reference_for_path() {
        let mut mapping = ReplacementMapping::new();
        mapping.insert("a", "images/x.png");
        mapping.insert("b", "images/x.png");
        assert_eq!(mapping.owner_of("images/x.png"), Some("a"));
        assert_eq!(mapping.owner_of("images/y.png"), None);
    }

    #[test]
    fn join_handles_empty_and_trailing_slash() {
        assert_eq!(join_document_path("", "x.png"), "x.png");
        assert_eq!(join_document_path("images", "x.png"), "images/x.png");
        assert_eq!(join_document_path("/static/img/", "x.png"), "/static/img/x.png");
    }
}
