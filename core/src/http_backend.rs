//! Hugging Face style text-generation endpoint.
//!
//! Request: `{"inputs": prompt, "parameters": {...}}`.
//! Response: `[{"generated_text": "..."}]` or `{"generated_text": "..."}`.

use crate::config::BackendSettings;
use crate::error::GenerationError;
use crate::generation::{GenerationConfig, TextGenerator};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct HttpGenerator {
    client: Client,
    url: String,
    model: String,
    api_token: Option<String>,
    thread_safe: bool,
    timeout: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Parameters {
    max_new_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_new_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    do_sample: bool,
    num_beams: usize,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    length_penalty: Option<f32>,
    return_full_text: bool,
}

#[derive(Deserialize)]
struct Generated {
    generated_text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Batch(Vec<Generated>),
    Single(Generated),
}

impl HttpGenerator {
    pub fn new(settings: &BackendSettings) -> Result<Self, GenerationError> {
        let timeout = Duration::from_millis(settings.request_timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::ModelUnavailable(format!("http client: {e}")))?;
        let url = format!("{}/models/{}", settings.endpoint.trim_end_matches('/'), settings.model);
        Ok(Self {
            client,
            url,
            model: settings.model.clone(),
            api_token: settings.api_token.clone(),
            thread_safe: settings.thread_safe,
            timeout,
        })
    }

    pub fn url(&self) -> &str { &self.url }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

fn parameters(config: &GenerationConfig) -> Parameters {
    Parameters {
        max_new_tokens: config.max_new_tokens,
        min_new_tokens: config.min_new_tokens,
        temperature: config.do_sample().then_some(config.temperature),
        do_sample: config.do_sample(),
        num_beams: config.num_beams,
        top_p: config.top_p,
        length_penalty: config.length_penalty,
        return_full_text: false,
    }
}

fn map_send_error(e: reqwest::Error, timeout: Duration) -> GenerationError {
    if e.is_timeout() {
        GenerationError::ModelTimeout(timeout)
    } else if e.is_connect() {
        GenerationError::ModelUnavailable(e.to_string())
    } else {
        GenerationError::Failed(e.to_string())
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    fn name(&self) -> &str { &self.model }

    fn is_thread_safe(&self) -> bool { self.thread_safe }

    async fn is_available(&self) -> bool {
        match self.request(self.client.get(&self.url)).send().await {
            Ok(resp) => resp.status() != StatusCode::SERVICE_UNAVAILABLE && !resp.status().is_server_error(),
            Err(_) => false,
        }
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, GenerationError> {
        let body = GenerateRequest { inputs: prompt, parameters: parameters(config) };
        let resp = self.request(self.client.post(&self.url)).json(&body).send().await.map_err(|e| map_send_error(e, self.timeout))?;

        let status = resp.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(GenerationError::ModelUnavailable(format!("{} is loading or overloaded", self.model)));
        }
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Failed(format!("{status}: {}", detail.chars().take(200).collect::<String>())));
        }

        let parsed: GenerateResponse = resp.json().await.map_err(|e| GenerationError::Failed(format!("bad response: {e}")))?;
        let text = match parsed {
            GenerateResponse::Batch(mut items) if !items.is_empty() => items.swap_remove(0).generated_text,
            GenerateResponse::Batch(_) => return Err(GenerationError::Failed("empty response".into())),
            GenerateResponse::Single(item) => item.generated_text,
        };
        Ok(text.trim().to_string())
    }
}
