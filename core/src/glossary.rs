//! Legal-term glossary snapshots and span annotation.
//!
//! A [`GlossarySnapshot`] is immutable: callers share it behind an `Arc` for
//! the length of a request and build a new one to apply edits.

use crate::legal_terms::DEFAULT_TERMS;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    /// Lowercase, single-spaced form used for matching.
    pub key: String,
    pub display: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A glossary record as supplied by the outside world; fields may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default, alias = "explanation", alias = "simplified_explanation")]
    pub definition: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl GlossaryEntry {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self { term: Some(term.into()), definition: Some(definition.into()), category: None }
    }

    fn into_term(self) -> Option<GlossaryTerm> {
        let display = self.term?.split_whitespace().collect::<Vec<_>>().join(" ");
        let definition = self.definition?.trim().to_string();
        if display.is_empty() || definition.is_empty() {
            return None;
        }
        Some(GlossaryTerm {
            key: display.to_lowercase(),
            display,
            definition,
            category: self.category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GlossaryFile {
    Entries(Vec<GlossaryEntry>),
    Map(BTreeMap<String, String>),
}

/// Parse glossary JSON: either a list of entries or a `{term: definition}`
/// object.
pub fn entries_from_json(raw: &str) -> Result<Vec<GlossaryEntry>, serde_json::Error> {
    Ok(match serde_json::from_str(raw)? {
        GlossaryFile::Entries(entries) => entries,
        GlossaryFile::Map(map) => map.into_iter().map(|(t, d)| GlossaryEntry::new(t, d)).collect(),
    })
}

/// A matched glossary term in some text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedSpan {
    /// Byte offset into the annotated text.
    pub start: usize,
    pub end: usize,
    /// The text as it appears at `start..end`.
    pub text: String,
    pub term: GlossaryTerm,
}

#[derive(Debug, Clone, Default)]
pub struct GlossarySnapshot {
    terms: Vec<GlossaryTerm>,
    matchers: Vec<Regex>,
}

impl GlossarySnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from raw entries. Entries without a term or definition are
    /// skipped with a warning; a later entry replaces an earlier one with
    /// the same key.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = GlossaryEntry>,
    {
        let mut by_key = BTreeMap::new();
        for (i, entry) in entries.into_iter().enumerate() {
            match entry.clone().into_term() {
                Some(term) => {
                    by_key.insert(term.key.clone(), term);
                }
                None => tracing::warn!(index = i, term = ?entry.term, "skipping malformed glossary entry"),
            }
        }
        Self::from_terms(by_key.into_values())
    }

    pub fn from_terms<I>(terms: I) -> Self
    where
        I: IntoIterator<Item = GlossaryTerm>,
    {
        let mut snapshot = Self::default();
        for term in terms {
            match Regex::new(&term_pattern(&term.key)) {
                Ok(re) => {
                    snapshot.terms.push(term);
                    snapshot.matchers.push(re);
                }
                Err(e) => tracing::warn!(term = %term.key, error = %e, "glossary term cannot be matched"),
            }
        }
        snapshot
    }

    /// The built-in legal dictionary.
    pub fn legal_defaults() -> Self {
        Self::from_entries(DEFAULT_TERMS.iter().map(|(t, d)| GlossaryEntry::new(*t, *d)))
    }

    /// A new snapshot with `entries` added on top of this one's terms.
    pub fn overlay<I>(&self, entries: I) -> Self
    where
        I: IntoIterator<Item = GlossaryEntry>,
    {
        let current = self.terms.iter().map(|t| GlossaryEntry {
            term: Some(t.display.clone()),
            definition: Some(t.definition.clone()),
            category: t.category.clone(),
        });
        Self::from_entries(current.chain(entries))
    }

    /// A new snapshot without the term whose key matches `term`.
    pub fn without(&self, term: &str) -> Self {
        let key = term.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        Self::from_terms(self.terms.iter().filter(|t| t.key != key).cloned())
    }

    pub fn len(&self) -> usize { self.terms.len() }
    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
    pub fn terms(&self) -> &[GlossaryTerm] { &self.terms }

    pub fn get(&self, term: &str) -> Option<&GlossaryTerm> {
        let key = term.to_lowercase();
        self.terms.iter().find(|t| t.key == key)
    }

    /// Find every term in `text`. Overlapping matches resolve to the longest
    /// one, then the earliest. Output is sorted by start and never overlaps.
    pub fn annotate(&self, text: &str) -> Vec<AnnotatedSpan> {
        let mut candidates: Vec<(usize, usize, usize)> = Vec::new();
        for (idx, re) in self.matchers.iter().enumerate() {
            candidates.extend(re.find_iter(text).map(|m| (m.start(), m.end(), idx)));
        }
        candidates.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)).then(a.0.cmp(&b.0)).then(a.2.cmp(&b.2)));

        let mut accepted: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
        for (start, end, idx) in candidates {
            let clashes = accepted.range(..end).next_back().map_or(false, |(_, (prev_end, _))| *prev_end > start);
            if !clashes {
                accepted.insert(start, (end, idx));
            }
        }

        accepted
            .into_iter()
            .map(|(start, (end, idx))| AnnotatedSpan {
                start,
                end,
                text: text[start..end].to_string(),
                term: self.terms[idx].clone(),
            })
            .collect()
    }
}

/// Free-function form of [`GlossarySnapshot::annotate`].
pub fn annotate(text: &str, glossary: &GlossarySnapshot) -> Vec<AnnotatedSpan> {
    glossary.annotate(text)
}

fn term_pattern(key: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if key.chars().next().map_or(false, is_word) { r"\b" } else { "" };
    let trail = if key.chars().last().map_or(false, is_word) { r"\b" } else { "" };
    let body = key.split_whitespace().map(regex::escape).collect::<Vec<_>>().join(r"\s+");
    format!("(?i){lead}{body}{trail}")
}

/// Render `text` as HTML with each span wrapped in a tooltip element.
/// Spans must be sorted and non-overlapping; others are ignored.
pub fn render_highlighted(text: &str, spans: &[AnnotatedSpan]) -> String {
    let mut out = String::with_capacity(text.len() + spans.len() * 64);
    let mut cursor = 0usize;
    for span in spans {
        if span.start < cursor || span.end > text.len() || span.start >= span.end {
            continue;
        }
        out.push_str(&html_escape::encode_text(&text[cursor..span.start]));
        out.push_str(r#"<span class="legal-term" title=""#);
        out.push_str(&html_escape::encode_double_quoted_attribute(&span.term.definition));
        out.push_str(r#"">"#);
        out.push_str(&html_escape::encode_text(&text[span.start..span.end]));
        out.push_str("</span>");
        cursor = span.end;
    }
    out.push_str(&html_escape::encode_text(&text[cursor..]));
    out
}
