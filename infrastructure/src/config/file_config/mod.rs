//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod agents;
mod generation;
mod orchestration;
mod output;
mod sources;

pub use agents::{FileAgentConfig, apply_overrides};
pub use generation::{FileGenerationConfig, PROVIDER_NONE, PROVIDER_OPENAI};
pub use orchestration::FileOrchestrationConfig;
pub use output::FileOutputConfig;
pub use sources::{FileDataConfig, FileLoggingConfig};

use insight_application::InsightConfig;
use insight_domain::{
    ConfigIssue, ConfigIssueCode, CriticConfig, Pipeline, PipelineCatalog, PipelineStep,
    StageName, builtin_catalog,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Upper bound for `[critic] future_horizon_days` (about a century)
const MAX_FUTURE_HORIZON_DAYS: i64 = 36_500;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {}", join_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Custom pipeline from TOML (`[pipelines.<name>]` sections)
///
/// ```toml
/// [pipelines.quick]
/// description = "Parse and answer, no data"
/// steps = [
///     { stage = "query_parsing", method = "parse" },
///     { stage = "response_generation", method = "generate", params = { style = "detailed" } },
/// ]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    pub description: String,
    pub steps: Vec<PipelineStep>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub orchestration: FileOrchestrationConfig,
    /// Penalties and thresholds of the cross-validation checks
    pub critic: CriticConfig,
    /// Per-specialist overrides, keyed by domain tag
    pub agents: BTreeMap<String, FileAgentConfig>,
    /// Custom pipelines; a name shared with a built-in replaces it
    pub pipelines: BTreeMap<String, FilePipelineConfig>,
    pub generation: FileGenerationConfig,
    pub data: FileDataConfig,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.orchestration.validate());
        issues.extend(agents::validate(&self.agents));
        issues.extend(self.generation.validate());
        issues.extend(self.validate_pipelines());
        issues.extend(self.validate_critic());

        let catalog = self.pipeline_catalog();
        if !catalog.contains(&self.orchestration.default_pipeline) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::UnknownPipeline,
                format!(
                    "orchestration.default_pipeline: unknown pipeline '{}' (available: {})",
                    self.orchestration.default_pipeline,
                    catalog.names().join(", ")
                ),
            ));
        }

        issues
    }

    fn validate_pipelines(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (name, pipeline) in &self.pipelines {
            if pipeline.steps.is_empty() {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::OutOfRange,
                    format!("pipelines.{}: has no steps", name),
                ));
            }
            for step in &pipeline.steps {
                if let StageName::Custom(stage) = &step.stage {
                    issues.push(ConfigIssue::warning(
                        ConfigIssueCode::UnknownStage,
                        format!(
                            "pipelines.{}: stage '{}' is not available, the step will be skipped",
                            name, stage
                        ),
                    ));
                }
            }
        }
        issues
    }

    fn validate_critic(&self) -> Vec<ConfigIssue> {
        let critic = &self.critic;
        let mut issues: Vec<ConfigIssue> = [
            ("temporal_penalty", critic.temporal_penalty),
            ("availability_penalty", critic.availability_penalty),
            ("contradiction_penalty", critic.contradiction_penalty),
            ("numeric_penalty", critic.numeric_penalty),
            ("rule_penalty", critic.rule_penalty),
            ("numeric_spread", critic.numeric_spread),
        ]
        .into_iter()
        .filter(|(_, value)| !(0.0..=1.0).contains(value))
        .map(|(field, value)| {
            ConfigIssue::warning(
                ConfigIssueCode::OutOfRange,
                format!("critic.{}: {} is outside [0, 1]", field, value),
            )
        })
        .collect();

        if !(1..=MAX_FUTURE_HORIZON_DAYS).contains(&critic.future_horizon_days) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange,
                format!(
                    "critic.future_horizon_days: {} is outside [1, {}]",
                    critic.future_horizon_days, MAX_FUTURE_HORIZON_DAYS
                ),
            ));
        }
        issues
    }

    /// Built-in pipelines plus the `[pipelines.*]` sections
    pub fn pipeline_catalog(&self) -> PipelineCatalog {
        let mut catalog = PipelineCatalog::builtin();
        for (name, config) in &self.pipelines {
            catalog.register(
                Pipeline::new(name.clone(), config.steps.clone())
                    .with_description(config.description.clone()),
            );
        }
        catalog
    }

    /// Convert into the application configuration.
    ///
    /// Fails with every error-level issue; warnings are left to the caller.
    pub fn to_insight_config(&self) -> Result<InsightConfig, ConfigError> {
        let errors: Vec<ConfigIssue> = self
            .validate()
            .into_iter()
            .filter(ConfigIssue::is_error)
            .collect();
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }

        let params = self
            .orchestration
            .to_params()
            .with_temperature(self.generation.temperature)
            .with_max_tokens(self.generation.max_tokens);

        Ok(InsightConfig::default()
            .with_orchestration(params)
            .with_critic(self.critic.clone())
            .with_knowledge(apply_overrides(builtin_catalog(), &self.agents))
            .with_pipelines(self.pipeline_catalog()))
    }
}
