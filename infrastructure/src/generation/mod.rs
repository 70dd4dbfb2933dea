//! Text generation adapters
//!
//! [`build_generator`] picks the backend named by `[generation] provider`.

#[cfg(feature = "http-generation")]
mod http;

#[cfg(feature = "http-generation")]
pub use http::HttpTextGenerator;

use crate::config::FileGenerationConfig;
use async_trait::async_trait;
use insight_application::{CompletionOptions, GenerationError, TextGenerator};
use std::sync::Arc;
use tracing::warn;

/// Backend used when text generation is disabled.
///
/// Every call fails with [`GenerationError::Unavailable`], which makes the
/// specialists fall back to their local analysis.
pub struct OfflineGenerator {
    reason: String,
}

impl OfflineGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for OfflineGenerator {
    fn name(&self) -> &str {
        "offline"
    }

    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable(self.reason.clone()))
    }
}

/// Build the configured text generator
pub fn build_generator(config: &FileGenerationConfig) -> Arc<dyn TextGenerator> {
    if config.is_disabled() {
        return Arc::new(OfflineGenerator::new("text generation is disabled"));
    }

    #[cfg(feature = "http-generation")]
    {
        if config.provider.eq_ignore_ascii_case(crate::config::PROVIDER_OPENAI) {
            return Arc::new(HttpTextGenerator::from_config(config));
        }
    }

    warn!(
        provider = %config.provider,
        "text generation provider is not available, answering from local analysis"
    );
    Arc::new(OfflineGenerator::new(format!(
        "provider '{}' is not available",
        config.provider
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_disabled_generation_is_offline() {
        let generator = build_generator(&FileGenerationConfig::default());
        assert_eq!(generator.name(), "offline");

        let err = generator
            .complete("prompt", &CompletionOptions::new(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(_)));
    }

    #[test]
    fn test_unknown_provider_is_offline() {
        let config = FileGenerationConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        assert_eq!(build_generator(&config).name(), "offline");
    }
}
