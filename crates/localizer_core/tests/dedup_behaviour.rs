use localizer_core::{
    sha256_hex, ContentHashDeduplicator, DedupDecision, DeduplicationVariant, Deduplicator,
    NameHashDeduplicator, ReplacementMapping,
};
use pretty_assertions::assert_eq;

#[test]
fn content_hash_reuses_first_filename_for_identical_bytes() {
    let mut dedup = ContentHashDeduplicator::new();
    let mapping = ReplacementMapping::new();

    let first = dedup.deduplicate("http://a.com/x.png", "x.png", b"same", &mapping);
    assert_eq!(first, DedupDecision::Fresh("x.png".to_string()));

    let second = dedup.deduplicate("http://b.com/y.png", "y.png", b"same", &mapping);
    assert_eq!(second, DedupDecision::Reuse("x.png".to_string()));
    assert!(second.is_reuse());
}

#[test]
fn content_hash_keeps_distinct_content_apart() {
    let mut dedup = ContentHashDeduplicator::new();
    let mapping = ReplacementMapping::new();

    dedup.deduplicate("a", "x.png", b"one", &mapping);
    let other = dedup.deduplicate("b", "x.png", b"two", &mapping);
    assert_eq!(other, DedupDecision::Fresh("x.png".to_string()));
}

#[test]
fn name_hash_names_file_after_content() {
    let mut dedup = NameHashDeduplicator;
    let mapping = ReplacementMapping::new();

    let decision = dedup.deduplicate("a", "photo.jpg", b"bytes", &mapping);
    assert_eq!(decision.filename(), format!("{}.jpg", sha256_hex(b"bytes")));
    assert!(!decision.is_reuse());

    let bare = dedup.deduplicate("b", "photo", b"bytes", &mapping);
    assert_eq!(bare.filename(), sha256_hex(b"bytes"));
}

#[test]
fn name_hash_reuses_name_already_in_mapping() {
    let mut dedup = NameHashDeduplicator;
    let mut mapping = ReplacementMapping::new();
    let name = format!("{}.png", sha256_hex(b"pixels"));
    mapping.insert("http://a.com/x.png", format!("images/{name}"));

    let decision = dedup.deduplicate("http://b.com/y.png", "y.png", b"pixels", &mapping);
    assert_eq!(decision, DedupDecision::Reuse(name));
}

#[test]
fn variants_build_fresh_state() {
    assert!(DeduplicationVariant::Disabled.build().is_none());
    assert!(DeduplicationVariant::ContentHash.build().is_some());
    assert!(DeduplicationVariant::NameHash.build().is_some());
    assert_eq!(DeduplicationVariant::default(), DeduplicationVariant::Disabled);
}

#[test]
fn confirmed_rename_becomes_canonical_filename() {
    let mut dedup = ContentHashDeduplicator::new();
    let mapping = ReplacementMapping::new();

    dedup.deduplicate("b", "x.png", b"second", &mapping);
    dedup.confirm("abc_x.png");

    let again = dedup.deduplicate("c", "x.png", b"second", &mapping);
    assert_eq!(again, DedupDecision::Reuse("abc_x.png".to_string()));
}
