//! OpenAI-compatible chat completions over HTTP

use crate::config::FileGenerationConfig;
use async_trait::async_trait;
use insight_application::{CompletionOptions, GenerationError, TextGenerator};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

pub struct HttpTextGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpTextGenerator {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    pub fn from_config(config: &FileGenerationConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            config.resolve_api_key(),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &str, options: &CompletionOptions) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &options.system_prompt {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

fn extract_content(response: &Value) -> Result<String, GenerationError> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            GenerationError::RequestFailed("response has no choices[0].message.content".to_string())
        })?;
    if content.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(content.to_string())
}

fn map_error(error: reqwest::Error) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Timeout
    } else if error.is_connect() {
        GenerationError::Unavailable(error.to_string())
    } else {
        GenerationError::RequestFailed(error.to_string())
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, GenerationError> {
        let mut request = self
            .client
            .post(self.endpoint())
            .timeout(options.timeout)
            .json(&self.request_body(prompt, options));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(model = %self.model, prompt_len = prompt.len(), "sending completion request");
        let response = request.send().await.map_err(map_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::RequestFailed(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body: Value = response.json().await.map_err(map_error)?;
        extract_content(&body)
    }
}
