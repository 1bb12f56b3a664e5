//! The text generation boundary.
//!
//! The pipeline only knows [`TextGenerator`]; concrete backends live
//! elsewhere ([`crate::http_backend`], test mocks).

use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// Decoding parameters plus the instruction placed before the input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Prepended to the input; empty for models that take raw text.
    pub instruction: String,
    pub max_new_tokens: usize,
    pub min_new_tokens: Option<usize>,
    pub temperature: f32,
    pub num_beams: usize,
    pub top_p: f32,
    pub length_penalty: Option<f32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            instruction: String::new(),
            max_new_tokens: 512,
            min_new_tokens: None,
            temperature: 0.0,
            num_beams: 4,
            top_p: 0.9,
            length_penalty: None,
        }
    }
}

impl GenerationConfig {
    pub fn rewrite(instruction: &str, max_new_tokens: usize, temperature: f32) -> Self {
        Self { instruction: instruction.to_string(), max_new_tokens, temperature, ..Self::default() }
    }

    pub fn summary(max_new_tokens: usize, min_new_tokens: usize) -> Self {
        Self {
            max_new_tokens,
            min_new_tokens: Some(min_new_tokens),
            length_penalty: Some(2.0),
            ..Self::default()
        }
    }

    /// Greedy single-beam variant used when the primary attempt fails.
    pub fn reduced(&self) -> Self {
        Self { temperature: 0.0, num_beams: 1, top_p: 1.0, length_penalty: None, ..self.clone() }
    }

    pub fn do_sample(&self) -> bool {
        self.temperature > 0.0
    }

    pub fn render_prompt(&self, text: &str) -> String {
        if self.instruction.is_empty() {
            text.to_string()
        } else {
            format!("{}\n\n{}", self.instruction, text)
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Whether concurrent `generate` calls are safe on one instance.
    fn is_thread_safe(&self) -> bool {
        true
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, GenerationError>;

    /// `generate` bounded by `timeout`. Backends that queue callers start
    /// the clock once the call is actually running.
    async fn generate_within(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        timeout: Duration,
    ) -> Result<String, GenerationError> {
        with_deadline(timeout, self.generate(prompt, config)).await
    }
}

async fn with_deadline<F>(timeout: Duration, call: F) -> Result<String, GenerationError>
where
    F: std::future::Future<Output = Result<String, GenerationError>>,
{
    tokio::time::timeout(timeout, call).await.unwrap_or(Err(GenerationError::ModelTimeout(timeout)))
}

/// Funnels every call to the wrapped generator through one async lock.
pub struct SerializedGenerator {
    inner: Arc<dyn TextGenerator>,
    gate: Mutex<()>,
}

impl SerializedGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>) -> Self {
        Self { inner, gate: Mutex::new(()) }
    }
}

#[async_trait]
impl TextGenerator for SerializedGenerator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, GenerationError> {
        let _turn = self.gate.lock().await;
        self.inner.generate(prompt, config).await
    }

    async fn generate_within(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        timeout: Duration,
    ) -> Result<String, GenerationError> {
        // Waiting for our turn does not count against the deadline.
        let _turn = self.gate.lock().await;
        self.inner.generate_within(prompt, config, timeout).await
    }
}

/// Run one generation on its own task with a deadline.
///
/// The call is detached from the caller: if the awaiting future is dropped
/// the model call still runs to completion and its output is thrown away.
pub async fn invoke(
    generator: Arc<dyn TextGenerator>,
    prompt: String,
    config: GenerationConfig,
    timeout: Duration,
) -> Result<String, GenerationError> {
    spawn_call(generator, prompt, config, timeout, None).await
}

/// Like [`invoke`], but waits for a slot in `limit` first. The slot stays
/// taken until the model call finishes, even if the caller goes away.
pub async fn invoke_limited(
    limit: Arc<Semaphore>,
    generator: Arc<dyn TextGenerator>,
    prompt: String,
    config: GenerationConfig,
    timeout: Duration,
) -> Result<String, GenerationError> {
    let permit = limit
        .acquire_owned()
        .await
        .map_err(|_| GenerationError::ModelUnavailable("generation pool is closed".into()))?;
    spawn_call(generator, prompt, config, timeout, Some(permit)).await
}

async fn spawn_call(
    generator: Arc<dyn TextGenerator>,
    prompt: String,
    config: GenerationConfig,
    timeout: Duration,
    permit: Option<OwnedSemaphorePermit>,
) -> Result<String, GenerationError> {
    let handle = tokio::spawn(async move {
        let _permit = permit;
        generator.generate_within(&prompt, &config, timeout).await
    });
    match handle.await {
        Ok(result) => result,
        Err(e) => Err(GenerationError::Failed(format!("generation task aborted: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Slow {
        active: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl TextGenerator for Slow {
        fn name(&self) -> &str { "slow" }
        fn is_thread_safe(&self) -> bool { false }

        async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String, GenerationError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(prompt.to_uppercase())
        }
    }

    fn slow(delay_ms: u64) -> Arc<Slow> {
        Arc::new(Slow { active: AtomicUsize::new(0), peak: AtomicUsize::new(0), delay: Duration::from_millis(delay_ms) })
    }

    #[test]
    fn prompt_rendering() {
        let cfg = GenerationConfig::rewrite("Say it plainly:", 64, 0.5);
        assert_eq!(cfg.render_prompt("Lessee shall pay."), "Say it plainly:\n\nLessee shall pay.");
        assert_eq!(GenerationConfig::summary(100, 30).render_prompt("abc"), "abc");
    }

    #[test]
    fn reduced_config_is_greedy() {
        let cfg = GenerationConfig::rewrite("x", 64, 0.7).reduced();
        assert_eq!(cfg.num_beams, 1);
        assert!(!cfg.do_sample());
        assert_eq!(cfg.instruction, "x");
        assert_eq!(cfg.max_new_tokens, 64);
    }

    #[tokio::test]
    async fn invoke_times_out() {
        let g: Arc<dyn TextGenerator> = slow(200);
        let err = invoke(g, "x".into(), GenerationConfig::default(), Duration::from_millis(10)).await.unwrap_err();
        assert_eq!(err, GenerationError::ModelTimeout(Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn serialized_generator_never_overlaps() {
        let raw = slow(20);
        let g: Arc<dyn TextGenerator> = Arc::new(SerializedGenerator::new(raw.clone()));
        let calls = (0..4).map(|i| invoke(g.clone(), format!("p{i}"), GenerationConfig::default(), Duration::from_secs(5)));
        let out = futures::future::join_all(calls).await;
        assert!(out.iter().all(|r| r.is_ok()));
        assert_eq!(raw.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn queued_calls_get_a_full_deadline() {
        let raw = slow(100);
        let g: Arc<dyn TextGenerator> = Arc::new(SerializedGenerator::new(raw.clone()));
        let calls = (0..4).map(|i| invoke(g.clone(), format!("p{i}"), GenerationConfig::default(), Duration::from_millis(250)));
        let out = futures::future::join_all(calls).await;
        assert_eq!(out, vec![Ok("P0".to_string()), Ok("P1".to_string()), Ok("P2".to_string()), Ok("P3".to_string())]);
        assert_eq!(raw.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn serialized_calls_still_time_out() {
        let g: Arc<dyn TextGenerator> = Arc::new(SerializedGenerator::new(slow(200)));
        let err = invoke(g, "x".into(), GenerationConfig::default(), Duration::from_millis(10)).await.unwrap_err();
        assert_eq!(err, GenerationError::ModelTimeout(Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn limited_invocations_respect_the_pool() {
        let raw = slow(20);
        let limit = Arc::new(Semaphore::new(2));
        let calls = (0..6).map(|i| {
            let g: Arc<dyn TextGenerator> = raw.clone();
            invoke_limited(limit.clone(), g, format!("p{i}"), GenerationConfig::default(), Duration::from_secs(5))
        });
        let out = futures::future::join_all(calls).await;
        assert_eq!(out[3].as_deref(), Ok("P3"));
        assert!(raw.peak.load(Ordering::SeqCst) <= 2);
    }
}
