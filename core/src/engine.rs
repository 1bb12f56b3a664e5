//! Chunk-by-chunk rewriting with a per-chunk retry policy.
//!
//! Each chunk moves `Pending -> Generating -> {Succeeded, Failed}`. A failed
//! primary attempt is retried once with the level's reduced config; a failed
//! retry leaves the original chunk text in place. The document as a whole
//! never fails because of one chunk.

use crate::config::EngineSettings;
use crate::document::Chunk;
use crate::error::GenerationError;
use crate::generation::{invoke_limited, GenerationConfig, TextGenerator};
use crate::level::{LevelProfiles, SimplificationLevel};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;

const SPECIAL_TOKENS: &[&str] = &["<unk>", "<pad>", "</s>", "<s>", "<|endoftext|>"];

/// Which config a generation attempt used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attempt {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "attempt")]
pub enum ChunkState {
    Pending,
    Generating(Attempt),
    Succeeded,
    Failed,
}

/// Ways a model answer can be unusable even though the call returned.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degeneracy {
    #[error("empty output")]
    Empty,
    #[error("output too short ({output_chars} of {input_chars} characters)")]
    Truncated { output_chars: usize, input_chars: usize },
    #[error("output repeats the prompt")]
    PromptEcho,
    #[error("output contains special tokens")]
    SpecialTokens,
    #[error("output is one word repeated")]
    Repetition,
}

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum FailureReason {
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("model timed out after {0} ms")]
    Timeout(u64),
    #[error("generation error: {0}")]
    Error(String),
    #[error("degenerate output: {0}")]
    Degenerate(Degeneracy),
}

impl From<GenerationError> for FailureReason {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::ModelUnavailable(msg) => FailureReason::Unavailable(msg),
            GenerationError::ModelTimeout(d) => FailureReason::Timeout(d.as_millis() as u64),
            GenerationError::Failed(msg) => FailureReason::Error(msg),
        }
    }
}

/// Result of a single generation attempt on one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    Succeeded(String),
    Failed(FailureReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Use this text for the chunk.
    Accept(String),
    /// Try again with the fallback config.
    Retry(FailureReason),
    /// Give up and keep the original chunk text.
    Substitute(FailureReason),
}

/// The retry policy: one fallback attempt, then substitution.
pub fn resolve(attempt: Attempt, outcome: ChunkOutcome) -> Resolution {
    match (attempt, outcome) {
        (_, ChunkOutcome::Succeeded(text)) => Resolution::Accept(text),
        (Attempt::Primary, ChunkOutcome::Failed(reason)) => Resolution::Retry(reason),
        (Attempt::Fallback, ChunkOutcome::Failed(reason)) => Resolution::Substitute(reason),
    }
}

/// What happened to one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkReport {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub state: ChunkState,
    pub attempts: u8,
    pub used_fallback: bool,
    /// Every failed attempt, in order.
    pub failures: Vec<FailureReason>,
    pub elapsed_ms: u64,
}

impl ChunkReport {
    fn pending(chunk: &Chunk) -> Self {
        Self {
            index: chunk.index,
            start: chunk.start,
            end: chunk.end,
            state: ChunkState::Pending,
            attempts: 0,
            used_fallback: false,
            failures: Vec::new(),
            elapsed_ms: 0,
        }
    }

    pub fn failed(&self) -> bool {
        self.state == ChunkState::Failed
    }

    pub fn last_failure(&self) -> Option<&FailureReason> {
        self.failures.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedDocument {
    pub text: String,
    pub chunks: Vec<ChunkReport>,
}

impl SimplifiedDocument {
    /// Indices of chunks that kept their original text.
    pub fn failed_chunks(&self) -> Vec<usize> {
        self.chunks.iter().filter(|c| c.failed()).map(|c| c.index).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.chunks.iter().all(|c| !c.failed())
    }
}

/// Rejects model output that returned fine but is unusable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputGuard {
    pub min_output_ratio: f64,
    pub min_checked_chars: usize,
}

impl OutputGuard {
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self { min_output_ratio: settings.min_output_ratio, min_checked_chars: settings.min_checked_chars }
    }

    /// Returns the trimmed output when it passes every check.
    pub fn check(&self, input: &str, config: &GenerationConfig, output: &str) -> Result<String, Degeneracy> {
        let out = output.trim();
        if out.is_empty() {
            return Err(Degeneracy::Empty);
        }
        if SPECIAL_TOKENS.iter().any(|t| out.contains(t)) {
            return Err(Degeneracy::SpecialTokens);
        }
        if is_echo(out, input, config) {
            return Err(Degeneracy::PromptEcho);
        }
        if is_single_word_loop(out) {
            return Err(Degeneracy::Repetition);
        }

        let input_chars = input.trim().chars().count();
        let output_chars = out.chars().count();
        if input_chars >= self.min_checked_chars && (output_chars as f64) < self.min_output_ratio * input_chars as f64 {
            return Err(Degeneracy::Truncated { output_chars, input_chars });
        }
        Ok(out.to_string())
    }
}

fn is_echo(out: &str, input: &str, config: &GenerationConfig) -> bool {
    let instruction = config.instruction.trim();
    if instruction.is_empty() {
        return false;
    }
    let prompt = config.render_prompt(input);
    out == prompt.trim() || out.starts_with(instruction) || out.trim_end_matches(':') == instruction.trim_end_matches(':')
}

fn is_single_word_loop(out: &str) -> bool {
    let words: Vec<String> = out
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    if words.len() < 4 {
        return false;
    }
    let distinct: HashSet<&str> = words.iter().map(String::as_str).collect();
    distinct.len() == 1
}

/// Rewrites chunks at a chosen level.
///
/// Clones share the concurrency limit, so one engine bounds every request
/// that goes through it.
#[derive(Clone)]
pub struct SimplificationEngine {
    generator: Arc<dyn TextGenerator>,
    profiles: Arc<LevelProfiles>,
    guard: OutputGuard,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl SimplificationEngine {
    pub fn new(generator: Arc<dyn TextGenerator>, profiles: LevelProfiles, settings: &EngineSettings) -> Self {
        Self {
            generator,
            profiles: Arc::new(profiles),
            guard: OutputGuard::from_settings(settings),
            timeout: Duration::from_millis(settings.timeout_ms),
            permits: Arc::new(Semaphore::new(settings.max_concurrency.max(1))),
        }
    }

    pub fn profiles(&self) -> &LevelProfiles {
        &self.profiles
    }

    /// Rewrite every chunk and stitch the results back together in chunk
    /// order. Chunks run concurrently up to the configured limit.
    pub async fn simplify(&self, chunks: &[Chunk], level: SimplificationLevel) -> SimplifiedDocument {
        let started = Instant::now();
        let results = join_all(chunks.iter().map(|c| self.simplify_chunk(c, level))).await;

        let mut text = String::new();
        let mut reports = Vec::with_capacity(chunks.len());
        for (segment, report) in results {
            text.push_str(&segment);
            reports.push(report);
        }

        let doc = SimplifiedDocument { text, chunks: reports };
        let failed = doc.failed_chunks();
        tracing::info!(
            level = %level,
            chunks = chunks.len(),
            failed = failed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "simplification finished"
        );
        doc
    }

    /// Returns the text that replaces `chunk` (trailing whitespace included)
    /// and its report.
    pub async fn simplify_chunk(&self, chunk: &Chunk, level: SimplificationLevel) -> (String, ChunkReport) {
        let started = Instant::now();
        let mut report = ChunkReport::pending(chunk);
        if chunk.body().is_empty() {
            report.state = ChunkState::Succeeded;
            return (chunk.text.clone(), report);
        }

        let mut attempt = Attempt::Primary;
        loop {
            report.state = ChunkState::Generating(attempt);
            report.attempts += 1;
            tracing::debug!(chunk = chunk.index, ?attempt, "generating");

            let config = match attempt {
                Attempt::Primary => self.profiles.config(level),
                Attempt::Fallback => self.profiles.fallback(level),
            };
            let outcome = self.attempt(chunk, config).await;

            match resolve(attempt, outcome) {
                Resolution::Accept(body) => {
                    report.state = ChunkState::Succeeded;
                    report.used_fallback = attempt == Attempt::Fallback;
                    report.elapsed_ms = started.elapsed().as_millis() as u64;
                    tracing::debug!(chunk = chunk.index, ?attempt, elapsed_ms = report.elapsed_ms, "chunk succeeded");
                    return (format!("{}{}", body, chunk.trailing_whitespace()), report);
                }
                Resolution::Retry(reason) => {
                    tracing::warn!(chunk = chunk.index, %reason, "primary attempt failed, retrying with fallback");
                    report.failures.push(reason);
                    attempt = Attempt::Fallback;
                }
                Resolution::Substitute(reason) => {
                    tracing::warn!(chunk = chunk.index, %reason, "fallback failed, keeping original text");
                    report.failures.push(reason);
                    report.state = ChunkState::Failed;
                    report.elapsed_ms = started.elapsed().as_millis() as u64;
                    return (chunk.text.clone(), report);
                }
            }
        }
    }

    async fn attempt(&self, chunk: &Chunk, config: &GenerationConfig) -> ChunkOutcome {
        let input = chunk.body();
        let prompt = config.render_prompt(input);
        let result =
            invoke_limited(self.permits.clone(), self.generator.clone(), prompt, config.clone(), self.timeout).await;
        match result {
            Ok(output) => match self.guard.check(input, config, &output) {
                Ok(body) => ChunkOutcome::Succeeded(body),
                Err(d) => ChunkOutcome::Failed(FailureReason::Degenerate(d)),
            },
            Err(e) => ChunkOutcome::Failed(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::chunk;
    use crate::document::Document;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers with a closure of (input text, config), optionally after a delay
    /// derived from the input.
    struct Scripted<F> {
        respond: F,
        calls: AtomicUsize,
    }

    impl<F> Scripted<F>
    where
        F: Fn(&str, &GenerationConfig) -> (u64, Result<String, GenerationError>) + Send + Sync,
    {
        fn new(respond: F) -> Arc<Self> {
            Arc::new(Self { respond, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl<F> TextGenerator for Scripted<F>
    where
        F: Fn(&str, &GenerationConfig) -> (u64, Result<String, GenerationError>) + Send + Sync,
    {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let input = prompt.rsplit("\n\n").next().unwrap_or(prompt);
            let (delay, result) = (self.respond)(input, config);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            result
        }
    }

    fn settings() -> EngineSettings {
        EngineSettings { timeout_ms: 500, ..EngineSettings::default() }
    }

    fn chunks_of(text: &str, max: usize) -> Vec<Chunk> {
        chunk(&Document::new(text), max).unwrap()
    }

    #[test]
    fn resolve_policy() {
        let ok = ChunkOutcome::Succeeded("x".into());
        let bad = ChunkOutcome::Failed(FailureReason::Timeout(10));
        assert_eq!(resolve(Attempt::Primary, ok.clone()), Resolution::Accept("x".into()));
        assert_eq!(resolve(Attempt::Fallback, ok), Resolution::Accept("x".into()));
        assert_eq!(resolve(Attempt::Primary, bad.clone()), Resolution::Retry(FailureReason::Timeout(10)));
        assert_eq!(resolve(Attempt::Fallback, bad), Resolution::Substitute(FailureReason::Timeout(10)));
    }

    #[test]
    fn guard_rejects_degenerate_output() {
        let guard = OutputGuard { min_output_ratio: 0.15, min_checked_chars: 40 };
        let cfg = GenerationConfig::rewrite("Simplify:", 64, 0.0);
        let input = "The Lessee shall remit payment in full no later than the first day of each month.";

        assert_eq!(guard.check(input, &cfg, "  \n"), Err(Degeneracy::Empty));
        assert_eq!(guard.check(input, &cfg, "Pay <unk> rent"), Err(Degeneracy::SpecialTokens));
        assert_eq!(guard.check(input, &cfg, &cfg.render_prompt(input)), Err(Degeneracy::PromptEcho));
        assert_eq!(guard.check(input, &cfg, "Simplify:"), Err(Degeneracy::PromptEcho));
        assert_eq!(guard.check(input, &cfg, "rent rent rent Rent rent."), Err(Degeneracy::Repetition));
        assert!(matches!(guard.check(input, &cfg, "Pay."), Err(Degeneracy::Truncated { .. })));
        assert_eq!(
            guard.check(input, &cfg, " Pay your rent in full by the 1st of each month. "),
            Ok("Pay your rent in full by the 1st of each month.".to_string())
        );
        // Short inputs are not held to the length ratio.
        assert_eq!(guard.check("Rent is due.", &cfg, "Pay."), Ok("Pay.".to_string()));
    }

    #[tokio::test]
    async fn reassembles_in_chunk_order() {
        // Later chunks finish first.
        let model = Scripted::new(|input: &str, _: &GenerationConfig| {
            let n: u64 = input.split_whitespace().nth(1).and_then(|w| w.trim_end_matches('.').parse().ok()).unwrap_or(0);
            (60 - n * 10, Ok(input.to_uppercase()))
        });
        let engine = SimplificationEngine::new(model.clone(), LevelProfiles::default(), &settings());
        let chunks = chunks_of("Clause 1. Clause 2.\n\nClause 3. Clause 4. Clause 5.", 2);
        assert!(chunks.len() >= 3);

        let doc = engine.simplify(&chunks, SimplificationLevel::Basic).await;
        assert_eq!(doc.text, "CLAUSE 1. CLAUSE 2.\n\nCLAUSE 3. CLAUSE 4. CLAUSE 5.");
        assert!(doc.is_complete());
        assert_eq!(doc.chunks.iter().map(|c| c.index).collect::<Vec<_>>(), (0..chunks.len()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn retries_with_fallback_config() {
        let model = Scripted::new(|input: &str, cfg: &GenerationConfig| {
            if cfg.num_beams > 1 {
                (0, Err(GenerationError::Failed("beam search exploded".into())))
            } else {
                (0, Ok(format!("plain: {input}")))
            }
        });
        let engine = SimplificationEngine::new(model.clone(), LevelProfiles::default(), &settings());
        let chunks = chunks_of("The tenant shall pay.", 50);

        let doc = engine.simplify(&chunks, SimplificationLevel::Intermediate).await;
        assert_eq!(doc.text, "plain: The tenant shall pay.");
        let report = &doc.chunks[0];
        assert_eq!(report.state, ChunkState::Succeeded);
        assert_eq!(report.attempts, 2);
        assert!(report.used_fallback);
        assert_eq!(report.failures, vec![FailureReason::Error("beam search exploded".into())]);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_chunks_keep_original_text() {
        let model = Scripted::new(|input: &str, _: &GenerationConfig| {
            if input.contains("Second") {
                (0, Err(GenerationError::ModelUnavailable("down".into())))
            } else {
                (0, Ok("Short one.".into()))
            }
        });
        let engine = SimplificationEngine::new(model, LevelProfiles::default(), &settings());
        let chunks = chunks_of("First part here.\n\nSecond part here.", 3);
        assert_eq!(chunks.len(), 2);

        let doc = engine.simplify(&chunks, SimplificationLevel::Advanced).await;
        assert_eq!(doc.text, "Short one.\n\nSecond part here.");
        assert_eq!(doc.failed_chunks(), vec![1]);
        assert_eq!(doc.chunks[1].state, ChunkState::Failed);
        assert_eq!(doc.chunks[1].attempts, 2);
    }

    #[tokio::test]
    async fn timeouts_count_as_failures() {
        let model = Scripted::new(|input: &str, _: &GenerationConfig| (5_000, Ok(input.to_string())));
        let engine = SimplificationEngine::new(model, LevelProfiles::default(), &EngineSettings { timeout_ms: 20, ..settings() });
        let chunks = chunks_of("Nothing will come back in time.", 50);

        let doc = engine.simplify(&chunks, SimplificationLevel::Basic).await;
        assert_eq!(doc.text, "Nothing will come back in time.");
        assert_eq!(doc.chunks[0].last_failure(), Some(&FailureReason::Timeout(20)));
    }

    #[tokio::test]
    async fn no_chunks_no_calls() {
        let model = Scripted::new(|_: &str, _: &GenerationConfig| (0, Ok("x".into())));
        let engine = SimplificationEngine::new(model.clone(), LevelProfiles::default(), &settings());
        let doc = engine.simplify(&[], SimplificationLevel::Basic).await;
        assert!(doc.text.is_empty() && doc.chunks.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }
}
