//! Orchestration parameters: deadlines, concurrency and thresholds.
//!
//! [`OrchestrationParams`] groups the static parameters that control one
//! analysis in [`AnalyzeUseCase`](crate::use_cases::analyze::AnalyzeUseCase).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Analysis control parameters.
///
/// | Parameter | Bounds |
/// |-----------|--------|
/// | `agent_timeout` | one specialist, including its pipeline |
/// | `completion_timeout` | one text-generation call (never past the agent deadline) |
/// | `outer_deadline` | the whole dispatch join |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationParams {
    pub agent_timeout: Duration,
    pub completion_timeout: Duration,
    pub outer_deadline: Duration,
    /// Agents are invoked when their relevance is strictly above this
    pub min_relevance: f64,
    /// Pipeline run by each specialist
    pub default_pipeline: String,
    /// Finished runs older than this are collected before each pipeline run
    pub run_max_age: Duration,
    pub max_concurrent_agents: usize,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for OrchestrationParams {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_secs(30),
            completion_timeout: Duration::from_secs(20),
            outer_deadline: Duration::from_secs(45),
            min_relevance: 0.0,
            default_pipeline: insight_domain::pipeline::catalog::STANDARD.to_string(),
            run_max_age: Duration::from_secs(24 * 60 * 60),
            max_concurrent_agents: 4,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl OrchestrationParams {
    // ==================== Builder Methods ====================

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    pub fn with_outer_deadline(mut self, deadline: Duration) -> Self {
        self.outer_deadline = deadline;
        self
    }

    pub fn with_min_relevance(mut self, threshold: f64) -> Self {
        self.min_relevance = threshold;
        self
    }

    pub fn with_default_pipeline(mut self, name: impl Into<String>) -> Self {
        self.default_pipeline = name.into();
        self
    }

    pub fn with_run_max_age(mut self, age: Duration) -> Self {
        self.run_max_age = age;
        self
    }

    pub fn with_max_concurrent_agents(mut self, max: usize) -> Self {
        self.max_concurrent_agents = max.max(1);
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

    /// Completion budget given the time left on the agent deadline
    pub fn completion_budget(&self, remaining: Option<Duration>) -> Duration {
        match remaining {
            Some(remaining) => self.completion_timeout.min(remaining),
            None => self.completion_timeout,
        }
    }
}
