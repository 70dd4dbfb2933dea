//! Analyze use case
//!
//! Orchestrates one business question: dispatch to the relevant specialists,
//! enrich their data, cross-validate their answers and pick the result.

use crate::ports::event_logger::{EventLogger, NoEventLogger, OrchestrationEvent};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::dispatch::Dispatcher;
use chrono::NaiveDate;
use insight_domain::orchestration::combined_confidence;
use insight_domain::{
    AgentResponse, AnalysisResult, Critic, DisagreementReport, EnrichmentReport, Enricher,
    OrchestrationPhase, Query, QueryContext, ValidationResult,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Input for the Analyze use case
#[derive(Debug, Clone)]
pub struct AnalyzeInput {
    pub query: Query,
    pub cancellation: CancellationToken,
    /// Reference date; today when not set
    pub today: Option<NaiveDate>,
}

impl AnalyzeInput {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            cancellation: CancellationToken::new(),
            today: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }
}

/// Use case answering one business question
pub struct AnalyzeUseCase {
    dispatcher: Dispatcher,
    critic: Critic,
    enricher: Enricher,
    event_logger: Arc<dyn EventLogger>,
}

impl AnalyzeUseCase {
    pub fn new(dispatcher: Dispatcher, critic: Critic) -> Self {
        Self {
            dispatcher,
            critic,
            enricher: Enricher::default(),
            event_logger: Arc::new(NoEventLogger),
        }
    }

    pub fn with_enricher(mut self, enricher: Enricher) -> Self {
        self.enricher = enricher;
        self
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn EventLogger>) -> Self {
        self.event_logger = logger;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Answer `query` with no progress reporting
    pub async fn analyze(&self, query: &str, context: QueryContext) -> AnalysisResult {
        self.execute(AnalyzeInput::new(Query::with_context(query, context)))
            .await
    }

    pub async fn execute(&self, input: AnalyzeInput) -> AnalysisResult {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks.
    ///
    /// Always returns a well-formed result: when no agent produced usable
    /// text the response explains why and the confidence is 0.
    #[instrument(skip_all, fields(query = %input.query.text()))]
    pub async fn execute_with_progress(
        &self,
        input: AnalyzeInput,
        progress: &dyn ProgressNotifier,
    ) -> AnalysisResult {
        let started = Instant::now();
        let today = input
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let query = input.query.text();

        // Phase 1: Dispatch
        let plan = self.dispatcher.plan(query);
        let selected: Vec<_> = plan
            .iter()
            .map(|(agent, relevance)| (agent.tag().clone(), relevance.score))
            .collect();
        info!("Dispatching to {} agents", plan.len());
        progress.on_phase_start(&OrchestrationPhase::Dispatch, plan.len());
        progress.on_agents_selected(&selected);
        let responses = self
            .dispatcher
            .dispatch(query, &plan, today, &input.cancellation, progress)
            .await;
        progress.on_phase_complete(&OrchestrationPhase::Dispatch);
        self.log_dispatch(query, &responses);

        // Phase 2: Enrichment
        let enrichment = self.phase_enrichment(&responses, progress);

        // Phase 3: Validation
        progress.on_phase_start(&OrchestrationPhase::Validation, 1);
        let validation = self.critic.validate_at(&responses, today);
        progress.on_phase_complete(&OrchestrationPhase::Validation);
        self.event_logger.log(OrchestrationEvent::new(
            "validation",
            json!({
                "score": validation.validation_score(),
                "approved": validation.approved(),
                "cross_validated": validation.cross_validated(),
                "inconsistencies": validation.inconsistencies().len(),
            }),
        ));

        let mut result = Self::select(query, responses, validation, enrichment);
        result.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            confidence = result.confidence,
            approved = result.is_approved(),
            "Analysis finished in {}ms",
            result.duration_ms
        );
        self.event_logger.log(OrchestrationEvent::new(
            "analysis",
            json!({
                "query": result.query,
                "selected_agent": result.selected_agent,
                "confidence": result.confidence,
                "approved": result.is_approved(),
                "disagreement": result.disagreement.is_some(),
                "run_ids": result.run_ids,
                "duration_ms": result.duration_ms,
            }),
        ));
        result
    }

    /// Phase 2: derived metrics over each agent's data, prefixed by agent tag
    fn phase_enrichment(
        &self,
        responses: &[AgentResponse],
        progress: &dyn ProgressNotifier,
    ) -> EnrichmentReport {
        let with_data: Vec<_> = responses
            .iter()
            .filter_map(|r| r.data().map(|data| (r.agent_tag(), data)))
            .collect();
        progress.on_phase_start(&OrchestrationPhase::Enrichment, with_data.len());

        let mut report = EnrichmentReport::default();
        for (tag, data) in with_data {
            let derived = self.enricher.enrich(data);
            debug!(
                "Enriched {} data: {} trends, {} comparisons, {} metrics",
                tag,
                derived.trends.len(),
                derived.comparisons.len(),
                derived.metrics.len()
            );
            report.merge_prefixed(tag.as_str(), derived);
        }

        progress.on_phase_complete(&OrchestrationPhase::Enrichment);
        report
    }

    /// Pick the final answer
    fn select(
        query: &str,
        responses: Vec<AgentResponse>,
        validation: ValidationResult,
        enrichment: EnrichmentReport,
    ) -> AnalysisResult {
        let run_ids = responses
            .iter()
            .filter_map(|r| r.run_id().cloned())
            .collect();
        let best = responses
            .iter()
            .filter(|r| r.usable_text().is_some())
            .max_by(|a, b| a.rank().total_cmp(&b.rank()));

        let (response, confidence, reasoning, selected_agent, disagreement) = match best {
            None => {
                let failures: Vec<String> = responses
                    .iter()
                    .map(|r| {
                        format!(
                            "{}: {}",
                            r.agent_tag(),
                            r.error().unwrap_or("no answer text")
                        )
                    })
                    .collect();
                (
                    "No specialist could answer the question.".to_string(),
                    0.0,
                    format!("Every agent failed or timed out ({})", failures.join("; ")),
                    None,
                    None,
                )
            }
            Some(best) if validation.approved() => {
                let mut reasoning = best.reasoning().to_string();
                if validation.cross_validated() {
                    reasoning.push_str(&format!(
                        ". Cross-validated against {} answers (score {:.2})",
                        validation.sources(),
                        validation.validation_score()
                    ));
                }
                let highlights = enrichment.highlights();
                if !highlights.is_empty() {
                    reasoning.push_str(&format!(". Derived: {}", highlights.join("; ")));
                }
                (
                    best.usable_text().unwrap_or_default().to_string(),
                    combined_confidence(best.confidence(), &validation),
                    reasoning,
                    Some(best.agent_tag().clone()),
                    None,
                )
            }
            Some(best) => {
                let report = DisagreementReport::new(&validation, &responses);
                (
                    report.render(),
                    combined_confidence(best.confidence(), &validation),
                    format!(
                        "Specialist answers disagree (validation score {:.2}); returning the candidates instead of a single answer",
                        validation.validation_score()
                    ),
                    Some(best.agent_tag().clone()),
                    Some(report),
                )
            }
        };

        AnalysisResult {
            query: query.to_string(),
            response,
            confidence,
            reasoning,
            validation,
            agent_responses: responses,
            selected_agent,
            disagreement,
            enrichment,
            run_ids,
            duration_ms: 0,
        }
    }

    fn log_dispatch(&self, query: &str, responses: &[AgentResponse]) {
        let agents: Vec<_> = responses
            .iter()
            .map(|r| {
                json!({
                    "agent": r.agent_tag(),
                    "relevance": r.relevance(),
                    "confidence": r.confidence(),
                    "success": r.is_success(),
                    "degraded": r.is_degraded(),
                    "error": r.error(),
                })
            })
            .collect();
        self.event_logger.log(OrchestrationEvent::new(
            "dispatch",
            json!({ "query": query, "agents": agents }),
        ));
    }
}
