use crate::chunker::Chunker;
use crate::config::Settings;
use crate::document::Document;
use crate::engine::{ChunkReport, SimplificationEngine};
use crate::error::PipelineError;
use crate::glossary::{render_highlighted, AnnotatedSpan, GlossarySnapshot};
use crate::level::{LevelProfiles, SimplificationLevel};
use crate::readability::{analyze, ReadabilityReport};
use crate::registry::{ModelKind, ModelRegistry};
use crate::summarizer::{StageStatus, Summarizer, SummaryOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Simplification,
    Summarization,
    Annotation,
    Readability,
}

/// A sub-stage that did not fully succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk: Option<usize>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Complete,
    PartialFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplificationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub level: SimplificationLevel,
    pub status: ResultStatus,
    pub original_text: String,
    pub simplified_text: String,
    pub summary: String,
    pub summary_status: StageStatus,
    pub original_readability: ReadabilityReport,
    pub simplified_readability: ReadabilityReport,
    /// Glossary matches over `simplified_text`.
    pub annotations: Vec<AnnotatedSpan>,
    pub failures: Vec<StageFailure>,
    pub chunk_count: usize,
    pub chunks: Vec<ChunkReport>,
    pub processing_time_secs: f64,
    pub completed_at: String,
}

impl SimplificationResult {
    pub fn is_complete(&self) -> bool {
        self.status == ResultStatus::Complete
    }

    /// Indices of chunks that kept their original text.
    pub fn failed_chunks(&self) -> Vec<usize> {
        self.failures.iter().filter_map(|f| f.chunk).collect()
    }

    /// Positive when the simplified text reads at a lower grade.
    pub fn grade_improvement(&self) -> f64 {
        -self.simplified_readability.grade_delta(&self.original_readability)
    }

    pub fn highlighted_html(&self) -> String {
        render_highlighted(&self.simplified_text, &self.annotations)
    }
}

/// Runs a document through every stage and assembles the result.
#[derive(Clone)]
pub struct Orchestrator {
    chunker: Chunker,
    engine: SimplificationEngine,
    summarizer: Summarizer,
}

impl Orchestrator {
    pub fn new(registry: &ModelRegistry, settings: &Settings) -> Self {
        let engine = SimplificationEngine::new(
            registry.get(ModelKind::Simplifier),
            LevelProfiles::from_settings(&settings.levels),
            &settings.engine,
        );
        let summarizer =
            Summarizer::new(registry.get(ModelKind::Summarizer), settings.summarizer.clone(), &settings.engine);
        Self::from_parts(Chunker::from_limits(&settings.limits), engine, summarizer)
    }

    pub fn from_parts(chunker: Chunker, engine: SimplificationEngine, summarizer: Summarizer) -> Self {
        Self { chunker, engine, summarizer }
    }

    /// Resolve an optional level selector. Absent means the default level;
    /// present but empty or unknown is rejected.
    pub fn parse_level(selector: Option<&str>) -> Result<SimplificationLevel, PipelineError> {
        match selector {
            None => Ok(SimplificationLevel::default()),
            Some(s) => s.parse(),
        }
    }

    /// Fails only on input that is rejected up front; every later problem is
    /// folded into the result's status and failure list.
    pub async fn run(
        &self,
        document: &Document,
        level: SimplificationLevel,
        glossary: Arc<GlossarySnapshot>,
    ) -> Result<SimplificationResult, PipelineError> {
        let started = Instant::now();
        let chunks = self.chunker.chunk(document)?;
        tracing::info!(
            source = document.source().unwrap_or("-"),
            level = %level,
            chars = document.char_len(),
            chunks = chunks.len(),
            "pipeline started"
        );

        let (simplified, summary) =
            tokio::join!(self.engine.simplify(&chunks, level), self.summarizer.summarize(document));

        let mut failures: Vec<StageFailure> = simplified
            .chunks
            .iter()
            .filter(|c| c.failed())
            .map(|c| StageFailure {
                stage: Stage::Simplification,
                chunk: Some(c.index),
                reason: c.last_failure().map(|r| r.to_string()).unwrap_or_default(),
            })
            .collect();
        if let Some(f) = summary_failure(&summary) {
            failures.push(f);
        }

        let (annotations, original_readability, simplified_readability) =
            analyze_texts(document.normalized(), &simplified.text, glossary, &mut failures).await;

        let status = if failures.is_empty() { ResultStatus::Complete } else { ResultStatus::PartialFailure };
        let elapsed = started.elapsed();
        tracing::info!(
            source = document.source().unwrap_or("-"),
            ?status,
            failures = failures.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "pipeline finished"
        );

        Ok(SimplificationResult {
            source: document.source().map(str::to_string),
            level,
            status,
            original_text: document.normalized().to_string(),
            simplified_text: simplified.text,
            summary: summary.text,
            summary_status: summary.status,
            original_readability,
            simplified_readability,
            annotations,
            failures,
            chunk_count: chunks.len(),
            chunks: simplified.chunks,
            processing_time_secs: elapsed.as_secs_f64(),
            completed_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
        })
    }
}

fn summary_failure(summary: &SummaryOutcome) -> Option<StageFailure> {
    let reason = summary.failure.as_ref().map(|r| r.to_string());
    match summary.status {
        StageStatus::Succeeded => None,
        StageStatus::Degraded => Some(StageFailure {
            stage: Stage::Summarization,
            chunk: None,
            reason: reason.unwrap_or_else(|| format!("{} of {} sections failed", summary.failed_sections, summary.sections)),
        }),
        StageStatus::Failed => Some(StageFailure {
            stage: Stage::Summarization,
            chunk: None,
            reason: reason.unwrap_or_else(|| "summary unavailable".to_string()),
        }),
    }
}

/// Glossary annotation and both readability reports, run side by side on
/// the blocking pool. A stage that panics leaves an empty value behind.
async fn analyze_texts(
    original: &str,
    simplified: &str,
    glossary: Arc<GlossarySnapshot>,
    failures: &mut Vec<StageFailure>,
) -> (Vec<AnnotatedSpan>, ReadabilityReport, ReadabilityReport) {
    let annotate_text = simplified.to_string();
    let simplified_text = simplified.to_string();
    let original_text = original.to_string();

    let (spans, before, after) = tokio::join!(
        tokio::task::spawn_blocking(move || glossary.annotate(&annotate_text)),
        tokio::task::spawn_blocking(move || analyze(&original_text)),
        tokio::task::spawn_blocking(move || analyze(&simplified_text)),
    );

    let spans = joined(spans, Stage::Annotation, "annotation", failures);
    let before = joined(before, Stage::Readability, "original readability", failures);
    let after = joined(after, Stage::Readability, "simplified readability", failures);
    (spans, before, after)
}

fn joined<T: Default>(
    result: Result<T, tokio::task::JoinError>,
    stage: Stage,
    what: &str,
    failures: &mut Vec<StageFailure>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(?stage, error = %e, "{what} task failed");
            failures.push(StageFailure { stage, chunk: None, reason: format!("{what}: {e}") });
            T::default()
        }
    }
}
