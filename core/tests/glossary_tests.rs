mod common;

use plainly_core::{annotate, Document, GlossaryEntry, GlossarySnapshot};

fn glossary() -> GlossarySnapshot {
    GlossarySnapshot::legal_defaults().overlay(vec![
        GlossaryEntry::new("Lessee", "the tenant"),
        GlossaryEntry::new("Lessor", "the landlord"),
        GlossaryEntry::new("hold harmless", "not blame or charge someone"),
        GlossaryEntry::new("harmless", "causing no harm"),
        GlossaryEntry::new("governing law", "which state's rules apply"),
        GlossaryEntry::new("law", "rules"),
    ])
}

#[test]
fn spans_are_sorted_disjoint_and_match_their_terms() {
    let text = Document::new(common::CONTRACT).normalized().to_string();
    let spans = annotate(&text, &glossary());
    assert!(spans.len() > 10);

    for pair in spans.windows(2) {
        assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
    for span in &spans {
        assert_eq!(text[span.start..span.end].to_lowercase(), span.term.key);
        assert_eq!(text[span.start..span.end], span.text);
    }
}

#[test]
fn longer_terms_shadow_their_parts() {
    let text = "The Lessee shall hold harmless the Lessor under the GOVERNING LAW.";
    let spans = annotate(text, &glossary());
    let keys: Vec<&str> = spans.iter().map(|s| s.term.key.as_str()).collect();
    assert_eq!(keys, vec!["lessee", "hold harmless", "lessor", "governing law"]);
}

#[test]
fn caller_entries_override_defaults() {
    let g = GlossarySnapshot::legal_defaults().overlay(vec![GlossaryEntry::new("Tort", "a wrong you can sue over")]);
    let spans = annotate("A tort claim.", &g);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].term.definition, "a wrong you can sue over");
}

#[test]
fn entries_deserialize_from_common_shapes() {
    let raw = r#"[
        {"term": "escrow", "definition": "money held by a third party"},
        {"term": "easement", "explanation": "a right to use someone else's land", "category": "property"},
        {"term": "", "definition": "nothing"},
        {"definition": "no term at all"}
    ]"#;
    let entries: Vec<GlossaryEntry> = serde_json::from_str(raw).unwrap();
    let g = GlossarySnapshot::from_entries(entries);
    assert_eq!(g.len(), 2);
    assert_eq!(g.get("easement").unwrap().category.as_deref(), Some("property"));
}
