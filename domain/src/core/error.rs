//! Domain error types

use thiserror::Error;

/// Orchestration error taxonomy.
///
/// Every variant is recoverable at a smaller scope than the whole request:
/// agent errors become failed [`AgentResponse`](crate::AgentResponse)s, stage
/// errors become failed step results, and validation input errors become a
/// neutral validation result. None of them reach the caller of `analyze`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestrationError {
    #[error("Agent '{agent}' failed: {message}")]
    AgentInvocation { agent: String, message: String },

    #[error("Stage '{stage}' failed: {message}")]
    PipelineStage { stage: String, message: String },

    #[error("Integration unavailable: {0}")]
    IntegrationUnavailable(String),

    #[error("Cross-validation needs at least {required} answers, got {actual}")]
    ValidationInput { required: usize, actual: usize },

    #[error("timeout")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,
}

impl OrchestrationError {
    pub fn agent(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AgentInvocation {
            agent: agent.into(),
            message: message.into(),
        }
    }

    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PipelineStage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Check if this error represents a deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, OrchestrationError::Timeout)
    }

    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrchestrationError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_is_bare() {
        // Agent responses carry this string verbatim as their error field
        assert_eq!(OrchestrationError::Timeout.to_string(), "timeout");
    }

    #[test]
    fn test_agent_error_display() {
        let error = OrchestrationError::agent("orders", "connection refused");
        assert_eq!(error.to_string(), "Agent 'orders' failed: connection refused");
    }

    #[test]
    fn test_predicates() {
        assert!(OrchestrationError::Timeout.is_timeout());
        assert!(OrchestrationError::Cancelled.is_cancelled());
        assert!(!OrchestrationError::stage("query_parsing", "boom").is_timeout());
        assert!(
            !OrchestrationError::IntegrationUnavailable("x".to_string()).is_cancelled()
        );
    }

    #[test]
    fn test_validation_input_display() {
        let error = OrchestrationError::ValidationInput {
            required: 2,
            actual: 1,
        };
        assert_eq!(
            error.to_string(),
            "Cross-validation needs at least 2 answers, got 1"
        );
    }
}
