use crate::config::ModelSettings;
use crate::error::GenerationError;
use crate::generation::{SerializedGenerator, TextGenerator};
use crate::http_backend::HttpGenerator;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Simplifier,
    Summarizer,
}

/// Process-wide set of loaded models.
///
/// Built once at startup and handed to the orchestrator; every request
/// shares the same instances. Backends that are not thread-safe are wrapped
/// so their calls are serialized.
#[derive(Clone)]
pub struct ModelRegistry {
    simplifier: Arc<dyn TextGenerator>,
    summarizer: Arc<dyn TextGenerator>,
}

impl ModelRegistry {
    pub fn new(simplifier: Arc<dyn TextGenerator>, summarizer: Arc<dyn TextGenerator>) -> Self {
        Self { simplifier: guard(simplifier), summarizer: guard(summarizer) }
    }

    pub fn from_settings(settings: &ModelSettings) -> Result<Self, GenerationError> {
        let simplifier = Arc::new(HttpGenerator::new(&settings.simplifier)?);
        let summarizer = Arc::new(HttpGenerator::new(&settings.summarizer)?);
        tracing::info!(simplifier = %simplifier.url(), summarizer = %summarizer.url(), "model registry ready");
        Ok(Self::new(simplifier, summarizer))
    }

    pub fn get(&self, kind: ModelKind) -> Arc<dyn TextGenerator> {
        match kind {
            ModelKind::Simplifier => self.simplifier.clone(),
            ModelKind::Summarizer => self.summarizer.clone(),
        }
    }

    /// Probe both backends and log the ones that do not answer.
    pub async fn warm_up(&self) -> bool {
        let mut ready = true;
        for kind in [ModelKind::Simplifier, ModelKind::Summarizer] {
            let model = self.get(kind);
            if !model.is_available().await {
                tracing::warn!(?kind, model = model.name(), "model backend not reachable");
                ready = false;
            }
        }
        ready
    }
}

fn guard(generator: Arc<dyn TextGenerator>) -> Arc<dyn TextGenerator> {
    if generator.is_thread_safe() {
        generator
    } else {
        Arc::new(SerializedGenerator::new(generator))
    }
}
