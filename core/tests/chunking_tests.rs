mod common;

use plainly_core::chunker::Chunker;
use plainly_core::config::Limits;
use plainly_core::{chunk, Document, PipelineError};

fn corpus() -> Vec<&'static str> {
    vec![
        common::CONTRACT,
        "One sentence only.",
        "no terminal punctuation at all just words flowing on and on without end",
        "Short. Short. Short.\n\n\nNew paragraph!   Spaces   everywhere?\r\nYes.",
        "See Sec. 4 of the Agreement, cf. Art. 2, and e.g. Schedule B. Then stop.",
        "\u{feff}Zero\u{200b}width and\u{00a0}odd spaces. Done.",
    ]
}

#[test]
fn chunks_partition_the_normalized_text() {
    for text in corpus() {
        let doc = Document::new(text);
        for max in [1, 3, 7, 25, 300] {
            let chunks = chunk(&doc, max).unwrap();
            let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
            assert_eq!(joined, doc.normalized(), "max={max}");

            let mut cursor = 0;
            for (i, c) in chunks.iter().enumerate() {
                assert_eq!(c.index, i);
                assert_eq!(c.start, cursor);
                assert_eq!(&doc.normalized()[c.range()], c.text);
                assert!(c.token_count <= max, "chunk {i} has {} tokens (max {max})", c.token_count);
                assert!(c.token_count > 0);
                cursor = c.end;
            }
            assert_eq!(cursor, doc.normalized().len());
        }
    }
}

#[test]
fn sentences_are_not_split_when_they_fit() {
    let doc = Document::new(common::CONTRACT);
    let chunks = chunk(&doc, 300).unwrap();
    for c in &chunks[..chunks.len() - 1] {
        let body = c.body();
        assert!(body.ends_with('.') || body.ends_with('"') || body.ends_with("AGREEMENT"), "{body:?}");
    }
}

#[test]
fn ceiling_is_enforced_before_chunking() {
    let limits = Limits { max_document_chars: 100, max_chunk_tokens: 50 };
    let err = Chunker::from_limits(&limits).chunk(&Document::new(common::CONTRACT)).unwrap_err();
    match err {
        PipelineError::InputTooLarge { chars, limit } => {
            assert_eq!(limit, 100);
            assert!(chars > 100);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn whitespace_only_input_has_no_chunks() {
    assert!(chunk(&Document::new(" \t\r\n\n "), 10).unwrap().is_empty());
}
