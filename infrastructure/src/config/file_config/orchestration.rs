//! Orchestration configuration from TOML (`[orchestration]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [orchestration]
//! agent_timeout_secs = 30
//! completion_timeout_secs = 20
//! outer_deadline_secs = 45
//! min_relevance = 0.1
//! default_pipeline = "semantic"
//! max_concurrent_agents = 4
//! run_max_age_secs = 86400
//! ```

use insight_application::OrchestrationParams;
use insight_domain::pipeline::catalog::STANDARD;
use insight_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestrationConfig {
    /// Budget of one specialist, pipeline included
    pub agent_timeout_secs: u64,
    /// Budget of one text-generation call
    pub completion_timeout_secs: u64,
    /// Budget of the whole dispatch
    pub outer_deadline_secs: u64,
    /// Agents run when their relevance is strictly above this
    pub min_relevance: f64,
    pub default_pipeline: String,
    pub max_concurrent_agents: usize,
    /// Finished pipeline runs older than this are collected
    pub run_max_age_secs: u64,
}

impl Default for FileOrchestrationConfig {
    fn default() -> Self {
        Self {
            agent_timeout_secs: 30,
            completion_timeout_secs: 20,
            outer_deadline_secs: 45,
            min_relevance: 0.0,
            default_pipeline: STANDARD.to_string(),
            max_concurrent_agents: 4,
            run_max_age_secs: 24 * 60 * 60,
        }
    }
}

impl FileOrchestrationConfig {
    pub fn to_params(&self) -> OrchestrationParams {
        OrchestrationParams::default()
            .with_agent_timeout(Duration::from_secs(self.agent_timeout_secs))
            .with_completion_timeout(Duration::from_secs(self.completion_timeout_secs))
            .with_outer_deadline(Duration::from_secs(self.outer_deadline_secs))
            .with_min_relevance(self.min_relevance)
            .with_default_pipeline(self.default_pipeline.clone())
            .with_max_concurrent_agents(self.max_concurrent_agents)
            .with_run_max_age(Duration::from_secs(self.run_max_age_secs))
    }

    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for (field, value) in [
            ("agent_timeout_secs", self.agent_timeout_secs),
            ("completion_timeout_secs", self.completion_timeout_secs),
            ("outer_deadline_secs", self.outer_deadline_secs),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::OutOfRange,
                    format!("orchestration.{}: cannot be 0", field),
                ));
            }
        }

        if self.completion_timeout_secs > self.agent_timeout_secs {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvertedTimeouts,
                format!(
                    "orchestration.completion_timeout_secs ({}) exceeds agent_timeout_secs ({}); completions will be cut at the agent deadline",
                    self.completion_timeout_secs, self.agent_timeout_secs
                ),
            ));
        }
        if self.agent_timeout_secs > self.outer_deadline_secs {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvertedTimeouts,
                format!(
                    "orchestration.agent_timeout_secs ({}) exceeds outer_deadline_secs ({}); slow agents will be interrupted by the outer deadline",
                    self.agent_timeout_secs, self.outer_deadline_secs
                ),
            ));
        }

        if !(0.0..=1.0).contains(&self.min_relevance) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange,
                format!(
                    "orchestration.min_relevance: {} is outside [0, 1]",
                    self.min_relevance
                ),
            ));
        }

        issues
    }
}
