//! Text generation port
//!
//! Defines the interface for the external text-generation backend.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during text generation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Backend returned an empty completion")]
    EmptyResponse,

    #[error("timeout")]
    Timeout,
}

/// Options of a single completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// Hard deadline for the call; the caller stops waiting after it
    pub timeout: Duration,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            system_prompt: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Text-generation backend
///
/// Implementations (adapters) live in the infrastructure layer. They should
/// honour `options.timeout`, but callers go through [`complete_with_deadline`]
/// so a misbehaving backend can never hold a request past its deadline.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, GenerationError>;
}

/// Run a completion bounded by `options.timeout`
pub async fn complete_with_deadline(
    generator: &dyn TextGenerator,
    prompt: &str,
    options: &CompletionOptions,
) -> Result<String, GenerationError> {
    let text = tokio::time::timeout(options.timeout, generator.complete(prompt, options))
        .await
        .map_err(|_| GenerationError::Timeout)??;
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}
