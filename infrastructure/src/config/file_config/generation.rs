//! Text generation backend from TOML (`[generation]` section)
//!
//! ```toml
//! [generation]
//! provider = "openai"
//! base_url = "http://localhost:11434/v1"
//! model = "llama3.1"
//! api_key_env = "OPENAI_API_KEY"
//! temperature = 0.2
//! max_tokens = 600
//! ```
//!
//! `provider = "none"` (the default) disables text generation: every
//! specialist then answers from its static knowledge and the loaded data.

use insight_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

pub const PROVIDER_NONE: &str = "none";
pub const PROVIDER_OPENAI: &str = "openai";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGenerationConfig {
    /// `none` or `openai` (any OpenAI-compatible chat completions endpoint)
    pub provider: String,
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Direct API key (not recommended, use the environment variable instead)
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for FileGenerationConfig {
    fn default() -> Self {
        Self {
            provider: PROVIDER_NONE.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl FileGenerationConfig {
    pub fn is_disabled(&self) -> bool {
        self.provider.eq_ignore_ascii_case(PROVIDER_NONE)
    }

    /// The direct key if set, otherwise the value of `api_key_env`
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }

    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let provider = self.provider.to_lowercase();

        if provider != PROVIDER_NONE && provider != PROVIDER_OPENAI {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::UnknownProvider,
                format!(
                    "generation.provider: unknown value '{}' (valid: none, openai)",
                    self.provider
                ),
            ));
        } else if provider == PROVIDER_OPENAI && !cfg!(feature = "http-generation") {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::UnknownProvider,
                "generation.provider: 'openai' requires the http-generation feature, text generation is disabled",
            ));
        }

        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange,
                format!("generation.temperature: {} is outside [0, 2]", temperature),
            ));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disabled() {
        let config = FileGenerationConfig::default();
        assert!(config.is_disabled());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let config = FileGenerationConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
        assert_eq!(issues[0].code, ConfigIssueCode::UnknownProvider);
    }

    #[test]
    fn test_direct_key_wins() {
        let config = FileGenerationConfig {
            api_key: Some("sk-test".to_string()),
            api_key_env: "INSIGHT_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-test"));

        let blank = FileGenerationConfig {
            api_key: Some("  ".to_string()),
            api_key_env: "INSIGHT_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..Default::default()
        };
        assert!(blank.resolve_api_key().is_none());
    }

    #[test]
    fn test_deserialize_section() {
        let toml_str = r#"
[generation]
provider = "openai"
model = "llama3.1"
temperature = 0.2
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.generation.is_disabled());
        assert_eq!(config.generation.model, "llama3.1");
        assert_eq!(config.generation.temperature, Some(0.2));
        assert_eq!(config.generation.max_tokens, None);
    }
}
