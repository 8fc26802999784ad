//! Localizer core: pure rules for turning document image references into local files.
//!
//! Nothing in this crate touches the network or the filesystem; the engine
//! crate drives these pieces and performs the I/O.
mod config;
mod dedup;
mod digest;
mod disposition;
mod filename;
mod mapping;
mod mime;
mod outcome;
mod reference;
mod resolve;

pub use config::{timeout_from_secs, LocalizerConfig};
pub use dedup::{
    ContentHashDeduplicator, DedupDecision, DeduplicationVariant, Deduplicator,
    NameHashDeduplicator,
};
pub use digest::sha256_hex;
pub use disposition::parse_content_disposition_filename;
pub use filename::{
    derive_remote_filename, local_filename, normalize_filename, slugify, MAX_STEM_LEN,
};
pub use mapping::{join_document_path, ReplacementMapping};
pub use mime::MimeTable;
pub use outcome::{ReferenceOutcome, SkipReason};
pub use reference::{classify_reference, join_base_url, ReferenceKind, REMOTE_SCHEMES};
pub use resolve::{PathResolver, ResolvedPath};
