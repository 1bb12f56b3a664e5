use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_'’]*").expect("valid regex");
    static ref TOKEN: Regex = Regex::new(r"\S+").expect("valid regex");
    static ref BOUNDARY: Regex =
        Regex::new(r#"[.!?]+["'”’)\]]*\s+|\n\s*\n\s*"#).expect("valid regex");
    static ref ABBREVIATIONS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "art","co","corp","cf","dept","dr","e.g","eg","esq","et al","etc","fig","i.e","ie","inc",
            "jr","llc","ltd","mr","mrs","ms","no","nos","p","para","pp","prof","re","sec","sr","st",
            "u.k","u.s","v","viz","vol","vs",
        ];
        words.iter().copied().collect()
    };
}

/// Normalize raw input: NFKC, LF line endings, single spaces, no trailing
/// spaces, at most one blank line between paragraphs, trimmed.
///
/// All offsets reported by the pipeline refer to the string returned here.
pub fn normalize(raw: &str) -> String {
    let mut unified = String::with_capacity(raw.len());
    let mut chars = raw.nfkc().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    unified.push('\n');
                }
            }
            '\n' => unified.push('\n'),
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => {}
            c if c.is_whitespace() => unified.push(' '),
            c if c.is_control() => {}
            c => unified.push(c),
        }
    }

    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0usize;
    for line in unified.split('\n') {
        let collapsed = line.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        blank_run = 0;
        out.push_str(&collapsed);
    }
    out
}

/// Number of whitespace-delimited tokens.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Byte ranges of whitespace-delimited tokens.
pub fn token_spans(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    TOKEN.find_iter(text).map(|m| m.range())
}

/// Words as counted by the readability formulas: a letter or digit
/// followed by letters, digits, underscores or apostrophes.
pub fn words(text: &str) -> impl Iterator<Item = &str> + '_ {
    WORD.find_iter(text).map(|m| m.as_str())
}

/// Split `text` into sentence ranges that cover it completely.
///
/// Each range owns the whitespace that follows its sentence, so the ranges
/// concatenate back to the input. Paragraph breaks always end a sentence.
pub fn sentence_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    for m in BOUNDARY.find_iter(text) {
        let terminated = m.as_str().starts_with(['.', '!', '?']);
        if terminated && !ends_sentence(text, m.start(), m.end()) {
            continue;
        }
        spans.push(start..m.end());
        start = m.end();
    }
    if start < text.len() {
        spans.push(start..text.len());
    }
    spans
}

fn ends_sentence(text: &str, term_start: usize, boundary_end: usize) -> bool {
    // Only a lone period can belong to an abbreviation.
    let terminator = &text[term_start..boundary_end];
    if !terminator.starts_with('.') || terminator.starts_with("..") {
        return true;
    }
    if let Some(next) = text[boundary_end..].chars().next() {
        if next.is_lowercase() {
            return false;
        }
    }

    let before = &text[..term_start];
    let word_start = before
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let word = before[word_start..].trim_start_matches(|c: char| !c.is_alphanumeric());
    if word.is_empty() {
        return true;
    }
    let lower = word.to_lowercase();
    if ABBREVIATIONS.contains(lower.as_str()) {
        return false;
    }
    if word.chars().count() == 1 && word.chars().all(char::is_alphabetic) {
        return false;
    }
    // List markers such as "1." at the start of a line.
    let at_line_start = word_start == 0 || before[..word_start].ends_with('\n');
    if at_line_start && word.len() <= 3 && word.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    true
}
