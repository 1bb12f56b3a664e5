#![allow(dead_code)]

use async_trait::async_trait;
use plainly_core::{GenerationConfig, GenerationError, TextGenerator};
use std::sync::atomic::{AtomicUsize, Ordering};

/// The chunk text a prompt was built from.
pub fn input_of<'a>(prompt: &'a str, config: &GenerationConfig) -> &'a str {
    prompt.strip_prefix(config.instruction.as_str()).map(str::trim_start).unwrap_or(prompt)
}

/// Keeps the first `max_new_tokens / 8` words of its input, so a smaller
/// budget always means a shorter answer.
pub struct BudgetMock;

#[async_trait]
impl TextGenerator for BudgetMock {
    fn name(&self) -> &str {
        "budget"
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, GenerationError> {
        let keep = (config.max_new_tokens / 8).max(1);
        Ok(input_of(prompt, config).split_whitespace().take(keep).collect::<Vec<_>>().join(" "))
    }
}

/// Always answers with the same text.
pub struct FixedRewrite(pub &'static str);

#[async_trait]
impl TextGenerator for FixedRewrite {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String, GenerationError> {
        Ok(self.0.to_string())
    }
}

/// Fails every call and counts them.
#[derive(Default)]
pub struct AlwaysFails {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for AlwaysFails {
    fn name(&self) -> &str {
        "always-fails"
    }

    async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::Failed("mocked failure".into()))
    }
}

pub const CONTRACT: &str = include_str!("../fixtures/contract.txt");
