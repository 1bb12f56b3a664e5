pub mod chunker;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod generation;
pub mod glossary;
pub mod http_backend;
pub mod legal_terms;
pub mod level;
pub mod pipeline;
pub mod readability;
pub mod registry;
pub mod summarizer;
pub mod text;

pub use chunker::chunk;
pub use config::Settings;
pub use document::{Chunk, Document};
pub use engine::{ChunkReport, ChunkState, FailureReason, SimplificationEngine, SimplifiedDocument};
pub use error::{ConfigError, GenerationError, PipelineError};
pub use generation::{GenerationConfig, TextGenerator};
pub use glossary::{annotate, entries_from_json, render_highlighted, AnnotatedSpan, GlossaryEntry, GlossarySnapshot, GlossaryTerm};
pub use level::{LevelProfiles, SimplificationLevel};
pub use pipeline::{Orchestrator, ResultStatus, SimplificationResult, Stage, StageFailure};
pub use readability::{analyze, ReadabilityReport};
pub use registry::{ModelKind, ModelRegistry};
pub use summarizer::{StageStatus, Summarizer, SummaryOutcome};
