//! Orchestration phases

use serde::{Deserialize, Serialize};

/// Phase of one `analyze` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationPhase {
    /// Relevant specialists answer concurrently
    Dispatch,
    /// Derived metrics are computed over the loaded data
    Enrichment,
    /// The critic cross-checks the answers
    Validation,
}

impl OrchestrationPhase {
    pub fn all() -> [OrchestrationPhase; 3] {
        [
            OrchestrationPhase::Dispatch,
            OrchestrationPhase::Enrichment,
            OrchestrationPhase::Validation,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestrationPhase::Dispatch => "dispatch",
            OrchestrationPhase::Enrichment => "enrichment",
            OrchestrationPhase::Validation => "validation",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrchestrationPhase::Dispatch => "Agent Dispatch",
            OrchestrationPhase::Enrichment => "Enrichment",
            OrchestrationPhase::Validation => "Cross-Validation",
        }
    }
}

impl std::fmt::Display for OrchestrationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
