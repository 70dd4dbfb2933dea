//! Agent response value object

use super::domain_tag::DomainTag;
use crate::core::error::OrchestrationError;
use crate::core::score::{clamp_unit, deserialize_unit};
use crate::pipeline::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candidate answer produced by exactly one specialist for one query.
///
/// Immutable once built. `relevance` and `confidence` are clamped to `[0, 1]`
/// by every constructor and on deserialization, so the fields are private.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    agent_tag: DomainTag,
    #[serde(deserialize_with = "deserialize_unit")]
    relevance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(deserialize_with = "deserialize_unit")]
    confidence: f64,
    timestamp: DateTime<Utc>,
    reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Structured data the answer was built from
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    /// Whether the answer came from local analysis instead of text generation
    #[serde(default)]
    degraded: bool,
    /// Pipeline run that produced the answer, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run_id: Option<RunId>,
}

impl AgentResponse {
    /// A successful answer
    pub fn answer(
        agent_tag: DomainTag,
        relevance: f64,
        text: impl Into<String>,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            agent_tag,
            relevance: clamp_unit(relevance),
            text: Some(text.into()),
            confidence: clamp_unit(confidence),
            timestamp: Utc::now(),
            reasoning: reasoning.into(),
            error: None,
            data: None,
            degraded: false,
            run_id: None,
        }
    }

    /// A failed invocation: confidence is always 0
    pub fn failure(agent_tag: DomainTag, relevance: f64, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            agent_tag,
            relevance: clamp_unit(relevance),
            text: None,
            confidence: 0.0,
            timestamp: Utc::now(),
            reasoning: format!("Agent invocation failed: {}", error),
            error: Some(error),
            data: None,
            degraded: false,
            run_id: None,
        }
    }

    /// Build the failure response for an orchestration error.
    ///
    /// Timeouts keep the bare `"timeout"` marker in `error`.
    pub fn from_error(agent_tag: DomainTag, relevance: f64, error: &OrchestrationError) -> Self {
        match error {
            OrchestrationError::Timeout => Self::timeout(agent_tag, relevance),
            OrchestrationError::AgentInvocation { message, .. } => {
                Self::failure(agent_tag, relevance, message.clone())
            }
            other => Self::failure(agent_tag, relevance, other.to_string()),
        }
    }

    /// Deadline exceeded
    pub fn timeout(agent_tag: DomainTag, relevance: f64) -> Self {
        let mut response = Self::failure(agent_tag, relevance, "timeout");
        response.reasoning = "Agent did not answer before its deadline".to_string();
        response
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_run_id(mut self, run_id: Option<RunId>) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn degraded(mut self) -> Self {
        self.degraded = true;
        self
    }

    pub fn agent_tag(&self) -> &DomainTag {
        &self.agent_tag
    }

    pub fn relevance(&self) -> f64 {
        self.relevance
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_timeout(&self) -> bool {
        self.error.as_deref() == Some("timeout")
    }

    /// Text that the critic can cross-check (present and non-blank)
    pub fn usable_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.trim().is_empty() && self.error.is_none())
    }

    /// Ranking key used to pick the best answer
    pub fn rank(&self) -> f64 {
        self.confidence * 0.6 + self.relevance * 0.4
    }
}
