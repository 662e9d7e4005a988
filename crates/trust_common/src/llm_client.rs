//! Generator abstraction.
//!
//! Provides a generic interface for producing text from a role prompt plus
//! user content. Ships a blocking Ollama implementation and a scripted fake
//! for tests.

use crate::config::{ModelConfig, OllamaConfig};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Generator errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Generator returned empty response")]
    EmptyResponse,
}

impl LlmError {
    /// Timeouts are reported separately from every other failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Timeout(_))
    }
}

/// Text-completion capability: a role prompt and user content in, text out.
pub trait Generator: Send + Sync {
    fn generate(&self, role_prompt: &str, user_content: &str) -> Result<String, LlmError>;

    /// Model name used for logging.
    fn model(&self) -> &str;
}

/// Ollama chat request
#[derive(Debug, Clone, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
    keep_alive: &'a str,
}

/// Sampling options forwarded to the model
#[derive(Debug, Clone, Serialize)]
struct OllamaOptions {
    temperature: f64,
    num_ctx: u32,
    num_predict: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

/// Blocking client for one Ollama model.
pub struct OllamaClient {
    endpoint: String,
    model: ModelConfig,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

impl OllamaClient {
    pub fn new(ollama: &OllamaConfig, model: ModelConfig) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(ollama.timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: ollama.endpoint.trim_end_matches('/').to_string(),
            model,
            timeout_secs: ollama.timeout_secs,
            client,
        })
    }

    fn build_request<'a>(&'a self, role_prompt: &str, user_content: &str) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model: &self.model.model,
            messages: vec![
                OllamaMessage {
                    role: "system".to_string(),
                    content: role_prompt.to_string(),
                },
                OllamaMessage {
                    role: "user".to_string(),
                    content: user_content.to_string(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.model.temperature,
                num_ctx: self.model.num_ctx,
                num_predict: self.model.num_predict,
            },
            keep_alive: &self.model.keep_alive,
        }
    }
}

impl Generator for OllamaClient {
    fn generate(&self, role_prompt: &str, user_content: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.endpoint);
        let request = self.build_request(role_prompt, user_content);

        info!("[>]  LLM CALL [{}] (keep_alive: {})", self.model.model, self.model.keep_alive);
        debug!("[U]  USER CONTENT ({} chars)", user_content.len());

        let response = self.client.post(&url).json(&request).send().map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout_secs)
            } else {
                LlmError::HttpError(format!("Request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            warn!("[-]  Ollama error {}: {}", status, body);
            return Err(LlmError::HttpError(format!("HTTP {} from Ollama: {}", status, body)));
        }

        let chat: OllamaChatResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout_secs)
            } else {
                LlmError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
            }
        })?;

        info!("[<]  LLM RESPONSE ({} chars)", chat.message.content.len());
        Ok(chat.message.content)
    }

    fn model(&self) -> &str {
        &self.model.model
    }
}

/// One call observed by a [`FakeGenerator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub role_prompt: String,
    pub user_content: String,
}

/// Fake generator for testing
pub struct FakeGenerator {
    responses: Mutex<Vec<Result<String, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeGenerator {
    /// Create a fake with pre-defined responses, consumed in order.
    /// The last response repeats once the others are used up.
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a fake that answers every call with `text`
    pub fn always(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// Create a fake that always fails with `error`
    pub fn always_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Create a fake returning each text once, in order
    pub fn sequence(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Generator for FakeGenerator {
    fn generate(&self, role_prompt: &str, user_content: &str) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                role_prompt: role_prompt.to_string(),
                user_content: user_content.to_string(),
            });
        }

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| LlmError::HttpError("fake generator poisoned".to_string()))?;

        match responses.len() {
            0 => Err(LlmError::EmptyResponse),
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }

    fn model(&self) -> &str {
        "fake"
    }
}
