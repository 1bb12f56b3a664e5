use crate::text::{count_tokens, normalize};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// An immutable input document.
///
/// The normalized form is computed once at construction; every offset the
/// pipeline reports refers to it.
#[derive(Debug, Clone)]
pub struct Document {
    source: Option<String>,
    raw: String,
    normalized: String,
    char_len: usize,
    token_len: usize,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let raw = text.into();
        let normalized = normalize(&raw);
        let char_len = normalized.chars().count();
        let token_len = count_tokens(&normalized);
        Self { source: None, raw, normalized, char_len, token_len }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source(&self) -> Option<&str> { self.source.as_deref() }
    pub fn raw(&self) -> &str { &self.raw }
    pub fn normalized(&self) -> &str { &self.normalized }
    /// Length of the normalized text in characters.
    pub fn char_len(&self) -> usize { self.char_len }
    pub fn token_len(&self) -> usize { self.token_len }
    pub fn is_blank(&self) -> bool { self.normalized.is_empty() }
}

/// A contiguous slice of a document's normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    /// Byte offset of the first character in the normalized text.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    pub text: String,
    pub token_count: usize,
}

impl Chunk {
    pub fn new(index: usize, range: Range<usize>, source: &str) -> Self {
        let text = source[range.clone()].to_string();
        let token_count = count_tokens(&text);
        Self { index, start: range.start, end: range.end, text, token_count }
    }

    pub fn range(&self) -> Range<usize> { self.start..self.end }

    /// The chunk without its trailing whitespace.
    pub fn body(&self) -> &str { self.text.trim_end() }

    /// Whitespace separating this chunk from the next one.
    pub fn trailing_whitespace(&self) -> &str { &self.text[self.body().len()..] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_normalizes_once() {
        let doc = Document::new("  Lessee   shall\r\npay rent. ").with_source("lease.txt");
        assert_eq!(doc.normalized(), "Lessee shall\npay rent.");
        assert_eq!(doc.token_len(), 4);
        assert_eq!(doc.char_len(), 22);
        assert_eq!(doc.source(), Some("lease.txt"));
        assert!(!doc.is_blank());
    }

    #[test]
    fn chunk_splits_trailing_whitespace() {
        let src = "First clause.\n\nSecond clause.";
        let c = Chunk::new(0, 0..15, src);
        assert_eq!(c.body(), "First clause.");
        assert_eq!(c.trailing_whitespace(), "\n\n");
        assert_eq!(c.token_count, 2);
    }
}
