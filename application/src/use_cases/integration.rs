//! Integration manager
//!
//! Bridges a specialist and the processing pipeline: builds the pipeline
//! input from the specialist's context, runs the configured pipeline and
//! normalizes whatever comes out into an [`IntegrationPayload`].

use crate::processing::envelope;
use crate::processing::{ChainOptions, ProcessorCoordinator};
use insight_domain::pipeline::UNAVAILABLE_KEY;
use insight_domain::{DomainKnowledge, RelevanceScore, RunId, RunStatus};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Context a specialist hands to the integration manager
#[derive(Debug, Clone, Copy)]
pub struct EnrichedContext<'a> {
    pub knowledge: &'a DomainKnowledge,
    pub relevance: &'a RelevanceScore,
}

/// Response-shaped result of one pipeline run.
///
/// Errors are carried in `error`; [`IntegrationManager::process`] never
/// fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrationPayload {
    pub text: Option<String>,
    pub confidence_hint: Option<f64>,
    pub reasoning: Option<String>,
    pub data: Option<Value>,
    pub filters: Option<Value>,
    pub intelligence: Option<Value>,
    pub assessment: Option<Value>,
    /// Stages served by the fallback stage
    pub unavailable: Vec<String>,
    pub run_id: Option<RunId>,
    /// Why the pipeline was stopped early, if it was
    pub stopped: Option<String>,
    pub error: Option<String>,
    /// The run failed on a step that hit its deadline
    pub timed_out: bool,
}

impl IntegrationPayload {
    pub fn error(run_id: Option<RunId>, message: impl Into<String>) -> Self {
        Self {
            run_id,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the answer text can be used as-is
    pub fn has_generated_text(&self) -> bool {
        !self.is_error()
            && self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
            && !self.unavailable.iter().any(|s| s == "response_generation")
    }
}

pub struct IntegrationManager {
    coordinator: Arc<ProcessorCoordinator>,
    pipeline: String,
}

impl IntegrationManager {
    pub fn new(coordinator: Arc<ProcessorCoordinator>, pipeline: impl Into<String>) -> Self {
        Self {
            coordinator,
            pipeline: pipeline.into(),
        }
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn coordinator(&self) -> &Arc<ProcessorCoordinator> {
        &self.coordinator
    }

    /// Run the configured pipeline for one specialist
    #[instrument(skip_all, fields(domain = %context.knowledge.tag, pipeline = %self.pipeline))]
    pub async fn process(
        &self,
        query: &str,
        context: &EnrichedContext<'_>,
        options: &ChainOptions,
    ) -> IntegrationPayload {
        let knowledge = match serde_json::to_value(context.knowledge) {
            Ok(value) => value,
            Err(e) => return IntegrationPayload::error(None, format!("invalid knowledge: {}", e)),
        };
        let input = json!({
            "query": query,
            "domain": context.knowledge.tag.as_str(),
            "knowledge": knowledge,
            "relevance": context.relevance.score,
            "matched_keywords": context.relevance.matched,
        });

        let run = match self
            .coordinator
            .run_pipeline(&self.pipeline, input, options)
            .await
        {
            Ok(run) => run,
            Err(e) => {
                warn!("Pipeline unavailable: {}", e);
                return IntegrationPayload::error(None, e.to_string());
            }
        };

        let output = run.final_output().cloned().unwrap_or(Value::Null);
        let string = |key: &str| envelope::str_field(&output, key).map(str::to_string);
        let value = |key: &str| envelope::field(&output, key).cloned();

        let stopped = run
            .steps()
            .iter()
            .any(|s| s.stop_chain)
            .then(|| string(envelope::STOPPED).unwrap_or_else(|| "stopped".to_string()));
        let unavailable = output
            .get(UNAVAILABLE_KEY)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let error = (run.status() == RunStatus::Failed)
            .then(|| run.failure().unwrap_or("pipeline failed").to_string());

        debug!(
            run_id = %run.run_id(),
            status = %run.status(),
            has_text = output.get(envelope::RESPONSE).is_some(),
            "Pipeline result normalized"
        );

        IntegrationPayload {
            text: string(envelope::RESPONSE),
            confidence_hint: output.get(envelope::CONFIDENCE_HINT).and_then(Value::as_f64),
            reasoning: string(envelope::REASONING),
            data: value(envelope::DATA),
            filters: value(envelope::FILTERS),
            intelligence: value(envelope::INTELLIGENCE),
            assessment: value(envelope::ASSESSMENT),
            unavailable,
            run_id: Some(run.run_id().clone()),
            stopped,
            timed_out: error.is_some() && run.ended_in_timeout(),
            error,
        }
    }
}
