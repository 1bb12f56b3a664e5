//! Readability scoring.
//!
//! Six fixed formulas, all computed from the same counts:
//!
//! | metric                       | formula                                              |
//! |------------------------------|------------------------------------------------------|
//! | Flesch–Kincaid grade         | 0.39·W/S + 11.8·Sy/W − 15.59                         |
//! | Flesch reading ease          | 206.835 − 1.015·W/S − 84.6·Sy/W                      |
//! | Gunning fog                  | 0.4·(W/S + 100·C/W)                                  |
//! | SMOG                         | 1.0430·√(P·30/S) + 3.1291                            |
//! | Automated Readability Index  | 4.71·L/W + 0.5·W/S − 21.43                           |
//! | Coleman–Liau                 | 0.0588·(100·L/W) − 0.296·(100·S/W) − 15.8            |
//!
//! W words, S sentences, Sy syllables, L letters and digits, P words of three
//! or more syllables, C the same excluding words that only reach three
//! syllables through an -es/-ed/-ing suffix. Scores are rounded to two
//! decimals. Text with no words or no sentences scores zero everywhere.

use crate::text::{sentence_spans, words};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityReport {
    pub flesch_kincaid_grade: f64,
    pub flesch_reading_ease: f64,
    pub gunning_fog: f64,
    pub smog_index: f64,
    pub automated_readability_index: f64,
    pub coleman_liau_index: f64,
    pub word_count: usize,
    pub sentence_count: usize,
    pub syllable_count: usize,
    pub letter_count: usize,
    pub polysyllable_count: usize,
    pub complex_word_count: usize,
}

impl ReadabilityReport {
    pub fn is_empty(&self) -> bool {
        self.word_count == 0 || self.sentence_count == 0
    }

    pub fn grade_interpretation(&self) -> &'static str {
        if self.is_empty() {
            return "Text too short to analyze";
        }
        interpret_grade(self.flesch_kincaid_grade)
    }

    pub fn ease_interpretation(&self) -> &'static str {
        if self.is_empty() {
            return "Text too short to analyze";
        }
        interpret_ease(self.flesch_reading_ease)
    }

    /// Grade-level change from `before` to `self`; negative means easier.
    pub fn grade_delta(&self, before: &ReadabilityReport) -> f64 {
        round2(self.flesch_kincaid_grade - before.flesch_kincaid_grade)
    }
}

/// Score `text`. Pure and deterministic.
pub fn analyze(text: &str) -> ReadabilityReport {
    let sentence_count = sentence_spans(text)
        .into_iter()
        .filter(|r| words(&text[r.clone()]).next().is_some())
        .count();

    let mut report = ReadabilityReport { sentence_count, ..Default::default() };
    for word in words(text) {
        let syllables = count_syllables(word);
        report.word_count += 1;
        report.syllable_count += syllables;
        report.letter_count += word.chars().filter(|c| c.is_alphanumeric()).count();
        if syllables >= 3 {
            report.polysyllable_count += 1;
            if is_complex(word) {
                report.complex_word_count += 1;
            }
        }
    }
    if report.is_empty() {
        return ReadabilityReport { word_count: report.word_count, sentence_count, ..Default::default() };
    }

    let w = report.word_count as f64;
    let s = sentence_count as f64;
    let words_per_sentence = w / s;
    let syllables_per_word = report.syllable_count as f64 / w;
    let letters_per_word = report.letter_count as f64 / w;

    report.flesch_kincaid_grade = round2(0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59);
    report.flesch_reading_ease = round2(206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word);
    report.gunning_fog = round2(0.4 * (words_per_sentence + 100.0 * report.complex_word_count as f64 / w));
    report.smog_index = round2(1.0430 * (report.polysyllable_count as f64 * 30.0 / s).sqrt() + 3.1291);
    report.automated_readability_index = round2(4.71 * letters_per_word + 0.5 * words_per_sentence - 21.43);
    report.coleman_liau_index = round2(0.0588 * (100.0 * letters_per_word) - 0.296 * (100.0 * s / w) - 15.8);
    report
}

/// Vowel-group syllable estimate with a silent trailing "e".
pub fn count_syllables(word: &str) -> usize {
    let lower = word.to_lowercase();
    if lower.chars().all(|c| c.is_ascii_digit()) {
        return 1;
    }
    let mut count = 0usize;
    let mut prev_vowel = false;
    for c in lower.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    if count > 1 && lower.ends_with('e') && !lower.ends_with("le") && !lower.ends_with("ee") {
        count -= 1;
    }
    count.max(1)
}

fn is_complex(word: &str) -> bool {
    let lower = word.to_lowercase();
    for suffix in ["es", "ed", "ing"] {
        if let Some(stem) = lower.strip_suffix(suffix) {
            return count_syllables(stem) >= 3;
        }
    }
    true
}

pub fn interpret_grade(grade: f64) -> &'static str {
    match grade {
        g if g < 6.0 => "Very Easy (Elementary School)",
        g if g < 9.0 => "Easy (Middle School)",
        g if g < 12.0 => "Fairly Easy (High School)",
        g if g < 14.0 => "Standard (College Freshman)",
        g if g < 16.0 => "Fairly Difficult (College)",
        g if g < 18.0 => "Difficult (College Graduate)",
        _ => "Very Difficult (Professional/Academic)",
    }
}

pub fn interpret_ease(score: f64) -> &'static str {
    match score {
        s if s >= 90.0 => "Very Easy (5th grade)",
        s if s >= 80.0 => "Easy (6th grade)",
        s if s >= 70.0 => "Fairly Easy (7th grade)",
        s if s >= 60.0 => "Standard (8th-9th grade)",
        s if s >= 50.0 => "Fairly Difficult (10th-12th grade)",
        s if s >= 30.0 => "Difficult (College)",
        _ => "Very Difficult (College Graduate)",
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
