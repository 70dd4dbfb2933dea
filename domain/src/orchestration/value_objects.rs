//! Orchestration value objects: the result of `analyze` and the disagreement
//! report returned when the answers do not agree.

use crate::agent::{AgentResponse, DomainTag};
use crate::core::score::{clamp_unit, round2};
use crate::core::string::excerpt;
use crate::enrichment::EnrichmentReport;
use crate::pipeline::RunId;
use crate::validation::ValidationResult;
use serde::Serialize;

/// Length of the per-candidate excerpt in a disagreement report
const EXCERPT_LEN: usize = 160;

/// Confidence of the final answer.
///
/// A cross-validated answer keeps half of its own confidence unconditionally
/// and earns the other half through the validation score.
pub fn combined_confidence(agent_confidence: f64, validation: &ValidationResult) -> f64 {
    let confidence = if validation.cross_validated() {
        agent_confidence * (0.5 + 0.5 * validation.validation_score())
    } else {
        agent_confidence
    };
    round2(clamp_unit(confidence))
}

/// One candidate answer as shown in a disagreement report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub agent_tag: DomainTag,
    pub confidence: f64,
    pub excerpt: String,
}

/// Explicit report returned instead of a single answer when validation fails
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisagreementReport {
    pub validation_score: f64,
    pub inconsistencies: Vec<String>,
    pub candidates: Vec<CandidateSummary>,
}

impl DisagreementReport {
    pub fn new(validation: &ValidationResult, responses: &[AgentResponse]) -> Self {
        let mut candidates: Vec<CandidateSummary> = responses
            .iter()
            .filter_map(|r| {
                r.usable_text().map(|text| CandidateSummary {
                    agent_tag: r.agent_tag().clone(),
                    confidence: r.confidence(),
                    excerpt: excerpt(text, EXCERPT_LEN),
                })
            })
            .collect();
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        Self {
            validation_score: validation.validation_score(),
            inconsistencies: validation
                .inconsistencies()
                .iter()
                .map(|i| i.to_string())
                .collect(),
            candidates,
        }
    }

    /// Plain-text rendering used as the response body
    pub fn render(&self) -> String {
        let mut out = format!(
            "The specialist answers disagree (validation score {:.2}).\n",
            self.validation_score
        );
        if !self.inconsistencies.is_empty() {
            out.push_str("\nInconsistencies:\n");
            for issue in &self.inconsistencies {
                out.push_str(&format!("- {}\n", issue));
            }
        }
        out.push_str("\nCandidate answers:\n");
        for candidate in &self.candidates {
            out.push_str(&format!(
                "- {} ({:.0}%): {}\n",
                candidate.agent_tag,
                candidate.confidence * 100.0,
                candidate.excerpt
            ));
        }
        out
    }
}

/// Result of one `analyze` call.
///
/// Always well-formed: when every agent fails, `response` explains why and
/// `confidence` is 0.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub query: String,
    pub response: String,
    pub confidence: f64,
    pub reasoning: String,
    pub validation: ValidationResult,
    pub agent_responses: Vec<AgentResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_agent: Option<DomainTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disagreement: Option<DisagreementReport>,
    pub enrichment: EnrichmentReport,
    pub run_ids: Vec<RunId>,
    pub duration_ms: u64,
}

impl AnalysisResult {
    pub fn successful_responses(&self) -> impl Iterator<Item = &AgentResponse> {
        self.agent_responses.iter().filter(|r| r.is_success())
    }

    pub fn failed_responses(&self) -> impl Iterator<Item = &AgentResponse> {
        self.agent_responses.iter().filter(|r| !r.is_success())
    }

    pub fn is_approved(&self) -> bool {
        self.validation.approved()
    }

    /// Whether the answer came from local analysis only
    pub fn is_degraded(&self) -> bool {
        self.selected_agent
            .as_ref()
            .and_then(|tag| self.agent_responses.iter().find(|r| r.agent_tag() == tag))
            .is_some_and(|r| r.is_degraded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Critic, ValidationResult};

    #[test]
    fn test_combined_confidence() {
        let single = ValidationResult::single_source(1);
        assert_eq!(combined_confidence(0.8, &single), 0.8);

        let responses = vec![
            AgentResponse::answer(DomainTag::Orders, 0.9, "Revenue was $10,000.", 0.8, ""),
            AgentResponse::answer(DomainTag::Finance, 0.9, "Revenue was $2,000.", 0.8, ""),
        ];
        let validation = Critic::default().validate(&responses);
        assert!(validation.cross_validated());
        let combined = combined_confidence(0.8, &validation);
        assert!(combined < 0.8);
        assert!(combined >= 0.4);
    }

    #[test]
    fn test_disagreement_report() {
        let responses = vec![
            AgentResponse::answer(DomainTag::Orders, 0.9, "Revenue was $10,000. More text.", 0.6, ""),
            AgentResponse::answer(DomainTag::Finance, 0.9, "Revenue was $2,000.", 0.9, ""),
            AgentResponse::failure(DomainTag::Shipments, 0.2, "boom"),
        ];
        let validation = Critic::default().validate(&responses);
        let report = DisagreementReport::new(&validation, &responses);

        assert_eq!(report.candidates.len(), 2);
        assert_eq!(report.candidates[0].agent_tag, DomainTag::Finance);
        assert_eq!(report.candidates[1].excerpt, "Revenue was $10,000.");
        assert_eq!(report.inconsistencies.len(), 1);

        let text = report.render();
        assert!(text.contains("disagree"));
        assert!(text.contains("- orders (60%): Revenue was $10,000."));
    }
}
