use std::time::Duration;
use thiserror::Error;

/// Errors that reject a request before any pipeline stage runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("document is too large: {chars} characters (limit {limit})")]
    InputTooLarge { chars: usize, limit: usize },

    #[error("invalid simplification level: {0:?}")]
    InvalidLevel(String),
}

/// Failure of a single call into a text generation backend.
///
/// These never reach the caller of the pipeline; they are folded into
/// the per-chunk retry policy and surface only as a partial-failure status.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("model call timed out after {0:?}")]
    ModelTimeout(Duration),

    #[error("generation failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("invalid settings: {0}")]
    Invalid(String),
}
