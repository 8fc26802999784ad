use std::collections::HashMap;

use crate::digest::{sha256, sha256_hex};
use crate::ReplacementMapping;

/// Result of a deduplication check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupDecision {
    /// The content is already stored under this filename; do not write it again.
    Reuse(String),
    /// New content; continue with this filename.
    Fresh(String),
}

impl DedupDecision {
    pub fn filename(&self) -> &str {
        match self {
            DedupDecision::Reuse(name) | DedupDecision::Fresh(name) => name,
        }
    }

    pub fn is_reuse(&self) -> bool {
        matches!(self, DedupDecision::Reuse(_))
    }
}

pub trait Deduplicator: Send {
    fn deduplicate(
        &mut self,
        reference: &str,
        proposed_filename: &str,
        content: &[u8],
        mapping: &ReplacementMapping,
    ) -> DedupDecision;

    /// Called after a `Fresh` decision with the filename the content was
    /// finally written under, which differs when a collision forced a rename.
    fn confirm(&mut self, _final_filename: &str) {}
}

/// Remembers the first filename chosen for each content digest within a run.
#[derive(Debug, Default)]
pub struct ContentHashDeduplicator {
    seen: HashMap<[u8; 32], String>,
    pending: Option<[u8; 32]>,
}

impl ContentHashDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deduplicator for ContentHashDeduplicator {
    fn deduplicate(
        &mut self,
        _reference: &str,
        proposed_filename: &str,
        content: &[u8],
        _mapping: &ReplacementMapping,
    ) -> DedupDecision {
        let digest = sha256(content);
        if let Some(existing) = self.seen.get(&digest) {
            self.pending = None;
            return DedupDecision::Reuse(existing.clone());
        }
        self.seen.insert(digest, proposed_filename.to_string());
        self.pending = Some(digest);
        DedupDecision::Fresh(proposed_filename.to_string())
    }

    fn confirm(&mut self, final_filename: &str) {
        if let Some(digest) = self.pending.take() {
            self.seen.insert(digest, final_filename.to_string());
        }
    }
}

/// Names every file after its content digest, keeping the original extension.
///
/// Identical content therefore always lands on the same name; a name that is
/// already present in the mapping is reused instead of written again.
#[derive(Debug, Default, Clone, Copy)]
pub struct NameHashDeduplicator;

impl Deduplicator for NameHashDeduplicator {
    fn deduplicate(
        &mut self,
        _reference: &str,
        proposed_filename: &str,
        content: &[u8],
        mapping: &ReplacementMapping,
    ) -> DedupDecision {
        let digest = sha256_hex(content);
        let name = match proposed_filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => format!("{digest}.{ext}"),
            _ => digest,
        };

        let already_stored = mapping
            .document_paths()
            .any(|path| path.rsplit('/').next() == Some(name.as_str()));
        if already_stored {
            DedupDecision::Reuse(name)
        } else {
            DedupDecision::Fresh(name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeduplicationVariant {
    #[default]
    Disabled,
    ContentHash,
    NameHash,
}

impl DeduplicationVariant {
    /// Fresh per-run deduplicator state, or `None` when disabled.
    pub fn build(self) -> Option<Box<dyn Deduplicator>> {
        match self {
            DeduplicationVariant::Disabled => None,
            DeduplicationVariant::ContentHash => Some(Box::new(ContentHashDeduplicator::new())),
            DeduplicationVariant::NameHash => Some(Box::new(NameHashDeduplicator)),
        }
    }
}
