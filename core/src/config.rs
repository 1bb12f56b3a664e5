//! Runtime settings for the pipeline.
//!
//! Settings come from an optional JSON file, then `PLAINLY_*` environment
//! variables, then whatever the binary's command line overrides on top.
//! Every field has a default so an empty file (or no file) is valid.

use crate::error::ConfigError;
use crate::generation::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub limits: Limits,
    pub engine: EngineSettings,
    pub summarizer: SummarizerSettings,
    pub levels: LevelSettings,
    pub models: ModelSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Hard ceiling on normalized document length, in characters.
    pub max_document_chars: usize,
    /// Upper bound on words per simplification chunk.
    pub max_chunk_tokens: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_document_chars: 200_000, max_chunk_tokens: 300 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Per-call timeout for every generative request.
    pub timeout_ms: u64,
    /// Maximum number of model calls in flight across all requests.
    pub max_concurrency: usize,
    /// Outputs shorter than this fraction of their input are rejected.
    pub min_output_ratio: f64,
    /// Inputs below this many characters skip the truncation check.
    pub min_checked_chars: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { timeout_ms: 60_000, max_concurrency: 4, min_output_ratio: 0.15, min_checked_chars: 40 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerSettings {
    /// Input limit of the summarization model, in words.
    pub section_tokens: usize,
    /// How many times a concatenation of summaries may be re-summarized.
    pub max_depth: usize,
    pub section: GenerationConfig,
    pub final_pass: GenerationConfig,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            section_tokens: 600,
            max_depth: 3,
            section: GenerationConfig::summary(100, 30),
            final_pass: GenerationConfig::summary(200, 50),
        }
    }
}

/// Optional replacements for the built-in per-level generation configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    pub basic: Option<GenerationConfig>,
    pub intermediate: Option<GenerationConfig>,
    pub advanced: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub simplifier: BackendSettings,
    pub summarizer: BackendSettings,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            simplifier: BackendSettings::new("google/flan-t5-small"),
            summarizer: BackendSettings::new("facebook/bart-large-cnn"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL of the text-generation endpoint.
    pub endpoint: String,
    pub model: String,
    /// Bearer token sent with every request, if set.
    pub api_token: Option<String>,
    /// When false, calls to this backend are serialized.
    pub thread_safe: bool,
    pub request_timeout_ms: u64,
}

impl BackendSettings {
    fn new(model: &str) -> Self {
        Self {
            endpoint: "http://127.0.0.1:8081".to_string(),
            model: model.to_string(),
            api_token: None,
            thread_safe: true,
            request_timeout_ms: 120_000,
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self::new("")
    }
}

impl Settings {
    /// Read settings from `path` (if any) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        settings.apply_overrides(|var| std::env::var(var).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: display.clone(), source })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path: display, source })
    }

    /// Apply `PLAINLY_*` overrides using `lookup` to resolve variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "PLAINLY_MAX_DOCUMENT_CHARS")? {
            self.limits.max_document_chars = v;
        }
        if let Some(v) = parse_var(&lookup, "PLAINLY_MAX_CHUNK_TOKENS")? {
            self.limits.max_chunk_tokens = v;
        }
        if let Some(v) = parse_var(&lookup, "PLAINLY_TIMEOUT_MS")? {
            self.engine.timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "PLAINLY_MAX_CONCURRENCY")? {
            self.engine.max_concurrency = v;
        }
        if let Some(url) = lookup("PLAINLY_SIMPLIFIER_URL") {
            self.models.simplifier.endpoint = url;
        }
        if let Some(url) = lookup("PLAINLY_SUMMARIZER_URL") {
            self.models.summarizer.endpoint = url;
        }
        if let Some(token) = lookup("PLAINLY_API_TOKEN") {
            self.models.simplifier.api_token = Some(token.clone());
            self.models.summarizer.api_token = Some(token);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_chunk_tokens == 0 {
            return Err(ConfigError::Invalid("limits.max_chunk_tokens must be positive".into()));
        }
        if self.summarizer.section_tokens == 0 {
            return Err(ConfigError::Invalid("summarizer.section_tokens must be positive".into()));
        }
        if self.engine.max_concurrency == 0 {
            return Err(ConfigError::Invalid("engine.max_concurrency must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.engine.min_output_ratio) {
            return Err(ConfigError::Invalid("engine.min_output_ratio must be in [0, 1)".into()));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
        None => Ok(None),
    }
}
