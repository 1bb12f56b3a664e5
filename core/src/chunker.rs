use crate::config::Limits;
use crate::document::{Chunk, Document};
use crate::error::PipelineError;
use crate::text::{count_tokens, sentence_spans, token_spans};
use std::ops::Range;

/// Splits normalized documents into sentence-aligned chunks.
#[derive(Debug, Clone)]
pub struct Chunker {
    max_chunk_tokens: usize,
    max_document_chars: usize,
}

impl Chunker {
    pub fn new(max_chunk_tokens: usize) -> Self {
        Self { max_chunk_tokens: max_chunk_tokens.max(1), max_document_chars: Limits::default().max_document_chars }
    }

    pub fn from_limits(limits: &Limits) -> Self {
        Self::new(limits.max_chunk_tokens).with_ceiling(limits.max_document_chars)
    }

    pub fn with_ceiling(mut self, max_document_chars: usize) -> Self {
        self.max_document_chars = max_document_chars;
        self
    }

    pub fn check_size(&self, document: &Document) -> Result<(), PipelineError> {
        if document.char_len() > self.max_document_chars {
            return Err(PipelineError::InputTooLarge { chars: document.char_len(), limit: self.max_document_chars });
        }
        Ok(())
    }

    /// Chunk the document's normalized text. A blank document has no chunks.
    pub fn chunk(&self, document: &Document) -> Result<Vec<Chunk>, PipelineError> {
        self.check_size(document)?;
        let text = document.normalized();
        let chunks: Vec<Chunk> = split_ranges(text, self.max_chunk_tokens)
            .into_iter()
            .enumerate()
            .map(|(i, r)| Chunk::new(i, r, text))
            .collect();
        tracing::debug!(chunks = chunks.len(), tokens = document.token_len(), "chunked document");
        Ok(chunks)
    }
}

/// Chunk `document` with the default size ceiling.
pub fn chunk(document: &Document, max_chunk_tokens: usize) -> Result<Vec<Chunk>, PipelineError> {
    Chunker::new(max_chunk_tokens).chunk(document)
}

/// Pack sentences greedily into ranges of at most `max_tokens` tokens.
/// The ranges partition `text`.
pub fn split_ranges(text: &str, max_tokens: usize) -> Vec<Range<usize>> {
    let max_tokens = max_tokens.max(1);
    let mut out = Vec::new();
    let mut current: Option<Range<usize>> = None;
    let mut current_tokens = 0usize;

    for sentence in sentence_spans(text) {
        let n = count_tokens(&text[sentence.clone()]);
        if n > max_tokens {
            if let Some(r) = current.take() {
                out.push(r);
            }
            current_tokens = 0;
            out.extend(hard_split(text, sentence, max_tokens));
            continue;
        }
        match current.as_mut() {
            Some(r) if current_tokens + n <= max_tokens => {
                r.end = sentence.end;
                current_tokens += n;
            }
            _ => {
                if let Some(r) = current.replace(sentence) {
                    out.push(r);
                }
                current_tokens = n;
            }
        }
    }
    if let Some(r) = current {
        out.push(r);
    }
    out
}

/// Cut an over-long sentence every `max_tokens` tokens. Each piece keeps the
/// whitespace after its last token.
fn hard_split(text: &str, range: Range<usize>, max_tokens: usize) -> Vec<Range<usize>> {
    let starts: Vec<usize> = token_spans(&text[range.clone()]).map(|t| range.start + t.start).collect();
    let mut pieces = Vec::new();
    let mut piece_start = range.start;
    for &cut in starts.iter().skip(max_tokens).step_by(max_tokens) {
        pieces.push(piece_start..cut);
        piece_start = cut;
    }
    pieces.push(piece_start..range.end);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(chunks: &[Chunk]) -> String {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn short_document_is_one_chunk() {
        let doc = Document::new("The tenant pays rent. The landlord fixes the roof.");
        let chunks = chunk(&doc, 50).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].range(), 0..doc.normalized().len());
    }

    #[test]
    fn sentences_are_not_split_when_avoidable() {
        let doc = Document::new("One two three. Four five six. Seven eight nine.");
        let chunks = chunk(&doc, 6).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "One two three. Four five six. ");
        assert_eq!(chunks[1].text, "Seven eight nine.");
    }

    #[test]
    fn long_sentence_is_hard_split_on_tokens() {
        let doc = Document::new("a b c d e f g h i j");
        let chunks = chunk(&doc, 4).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a b c d ", "e f g h ", "i j"]);
        assert!(chunks.iter().all(|c| c.token_count <= 4));
    }

    #[test]
    fn blank_document_has_no_chunks() {
        let doc = Document::new(" \n\t ");
        assert!(chunk(&doc, 10).unwrap().is_empty());
    }

    #[test]
    fn ceiling_rejects_large_documents() {
        let doc = Document::new("x".repeat(101));
        let err = Chunker::new(10).with_ceiling(100).chunk(&doc).unwrap_err();
        assert_eq!(err, PipelineError::InputTooLarge { chars: 101, limit: 100 });
    }

    #[test]
    fn offsets_index_normalized_text() {
        let doc = Document::new("Alpha beta.\r\n\r\n\r\nGamma delta epsilon.");
        let chunks = chunk(&doc, 2).unwrap();
        for c in &chunks {
            assert_eq!(&doc.normalized()[c.range()], c.text);
        }
        assert_eq!(joined(&chunks), doc.normalized());
    }
}
