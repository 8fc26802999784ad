use localizer_core::{ReferenceOutcome, ReplacementMapping, SkipReason};

#[test]
fn mapping_serializes_as_ordered_object() {
    let mut mapping = ReplacementMapping::new();
    mapping.insert("http://z.com/b.png", "images/b.png");
    mapping.insert("http://a.com/a.png", "images/a.png");

    let json = serde_json::to_string(&mapping).unwrap();
    assert_eq!(
        json,
        r#"{"http://z.com/b.png":"images/b.png","http://a.com/a.png":"images/a.png"}"#
    );
}

#[test]
fn entries_iterate_in_insertion_order() {
    let mut mapping = ReplacementMapping::new();
    mapping.insert("b", "images/b.png");
    mapping.insert("a", "images/a.png");
    let refs: Vec<_> = mapping.iter().map(|(r, _)| r).collect();
    assert_eq!(refs, vec!["b", "a"]);
    assert_eq!(
        mapping.into_entries(),
        vec![
            ("b".to_string(), "images/b.png".to_string()),
            ("a".to_string(), "images/a.png".to_string()),
        ]
    );
}

#[test]
fn outcomes_render_for_reports() {
    let mapped = ReferenceOutcome::Mapped {
        document_path: "images/a.png".to_string(),
        written: true,
    };
    assert_eq!(mapped.to_string(), "saved as images/a.png");
    assert_eq!(mapped.document_path(), Some("images/a.png"));

    let skipped = ReferenceOutcome::Skipped(SkipReason::SkipList);
    assert_eq!(skipped.to_string(), "skipped (skip list)");
    assert_eq!(skipped.document_path(), None);
}
