use crate::digest::sha256_hex;
use crate::{join_document_path, ReplacementMapping};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub filename: String,
    pub document_path: String,
}

/// Keeps distinct references from sharing a document path.
///
/// A filename whose path already belongs to another reference is prefixed
/// with `sha256_hex(reference) + "_"`. The renamed path is checked again and
/// the prefix reapplied until the path is free.
pub struct PathResolver<'a> {
    document_dir: &'a str,
    mapping: &'a ReplacementMapping,
}

impl<'a> PathResolver<'a> {
    pub fn new(document_dir: &'a str, mapping: &'a ReplacementMapping) -> Self {
        Self {
            document_dir,
            mapping,
        }
    }

    pub fn resolve(&self, reference: &str, filename: &str) -> ResolvedPath {
        let mut filename = filename.to_string();
        let mut document_path = join_document_path(self.document_dir, &filename);
        let mut prefix: Option<String> = None;

        while self.is_taken_by_other(&document_path, reference) {
            let prefix = prefix.get_or_insert_with(|| sha256_hex(reference.as_bytes()));
            filename = format!("{prefix}_{filename}");
            document_path = join_document_path(self.document_dir, &filename);
        }

        ResolvedPath {
            filename,
            document_path,
        }
    }

    fn is_taken_by_other(&self, document_path: &str, reference: &str) -> bool {
        self.mapping
            .owner_of(document_path)
            .is_some_and(|owner| owner != reference)
    }
}
