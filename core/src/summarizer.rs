//! Hierarchical abstractive summaries.
//!
//! Text that fits the section limit is summarized in one pass. Longer text
//! is split into sections, each section is summarized, and the joined
//! section summaries are fed back in until they fit (or the depth limit is
//! reached).

use crate::chunker::split_ranges;
use crate::config::{EngineSettings, SummarizerSettings};
use crate::document::Document;
use crate::engine::{FailureReason, OutputGuard};
use crate::generation::{invoke_limited, GenerationConfig, TextGenerator};
use crate::text::{count_tokens, token_spans};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    /// Built from the sections that survived.
    Degraded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOutcome {
    /// Empty when the stage failed outright.
    pub text: String,
    pub status: StageStatus,
    pub sections: usize,
    pub failed_sections: usize,
    /// Section rounds run before the final pass.
    pub depth: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
}

impl SummaryOutcome {
    fn empty(status: StageStatus) -> Self {
        Self { text: String::new(), status, sections: 0, failed_sections: 0, depth: 0, failure: None }
    }
}

#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    settings: SummarizerSettings,
    guard: OutputGuard,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: SummarizerSettings, engine: &EngineSettings) -> Self {
        Self {
            generator,
            settings,
            // Summaries are short on purpose, so no length ratio here.
            guard: OutputGuard { min_output_ratio: 0.0, min_checked_chars: usize::MAX },
            timeout: Duration::from_millis(engine.timeout_ms),
            permits: Arc::new(Semaphore::new(engine.max_concurrency.max(1))),
        }
    }

    pub async fn summarize(&self, document: &Document) -> SummaryOutcome {
        self.summarize_text(document.normalized()).await
    }

    pub async fn summarize_text(&self, text: &str) -> SummaryOutcome {
        if text.trim().is_empty() {
            return SummaryOutcome::empty(StageStatus::Succeeded);
        }
        let started = Instant::now();
        let limit = self.settings.section_tokens.max(1);
        let mut current = text.to_string();
        let mut outcome = SummaryOutcome::empty(StageStatus::Succeeded);

        while count_tokens(&current) > limit && outcome.depth < self.settings.max_depth {
            let ranges = split_ranges(&current, limit);
            let calls = ranges.iter().map(|r| self.generate(current[r.clone()].trim(), &self.settings.section));
            let results = join_all(calls).await;

            let mut survivors = Vec::with_capacity(results.len());
            for result in results {
                outcome.sections += 1;
                match result {
                    Ok(summary) => survivors.push(summary),
                    Err(reason) => {
                        tracing::warn!(depth = outcome.depth, %reason, "section summary failed");
                        outcome.failed_sections += 1;
                        outcome.failure = Some(reason);
                    }
                }
            }
            if survivors.is_empty() {
                tracing::warn!(sections = outcome.sections, "every section summary failed");
                return SummaryOutcome { status: StageStatus::Failed, ..outcome };
            }
            current = survivors.join(" ");
            outcome.depth += 1;
            tracing::debug!(depth = outcome.depth, tokens = count_tokens(&current), "section round finished");
        }

        if count_tokens(&current) > limit {
            tracing::warn!(max_depth = self.settings.max_depth, "summary input still over limit, truncating");
            current = truncate_tokens(&current, limit).to_string();
        }

        match self.generate(&current, &self.settings.final_pass).await {
            Ok(summary) => {
                outcome.text = summary;
                if outcome.failed_sections > 0 {
                    outcome.status = StageStatus::Degraded;
                }
            }
            Err(reason) if outcome.depth > 0 => {
                // The joined section summaries still say something useful.
                tracing::warn!(%reason, "final summary failed, keeping section summaries");
                outcome.text = current;
                outcome.status = StageStatus::Degraded;
                outcome.failure = Some(reason);
            }
            Err(reason) => {
                tracing::warn!(%reason, "summary failed");
                outcome.status = StageStatus::Failed;
                outcome.failure = Some(reason);
            }
        }
        tracing::info!(
            status = ?outcome.status,
            sections = outcome.sections,
            depth = outcome.depth,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "summary finished"
        );
        outcome
    }

    async fn generate(&self, input: &str, config: &GenerationConfig) -> Result<String, FailureReason> {
        let prompt = config.render_prompt(input);
        let output =
            invoke_limited(self.permits.clone(), self.generator.clone(), prompt, config.clone(), self.timeout).await?;
        self.guard.check(input, config, &output).map_err(FailureReason::Degenerate)
    }
}

fn truncate_tokens(text: &str, max_tokens: usize) -> &str {
    match token_spans(text).nth(max_tokens.saturating_sub(1)) {
        Some(last) => &text[..last.end],
        None => text,
    }
}
