//! Specialist agents: one per business area, plus the basic agent that
//! answers when no specialist is relevant.

use crate::processing::ChainOptions;
use crate::use_cases::integration::{EnrichedContext, IntegrationManager, IntegrationPayload};
use async_trait::async_trait;
use chrono::NaiveDate;
use insight_domain::core::score::round2;
use insight_domain::{
    AgentResponse, DomainKnowledge, DomainTag, KeywordTable, OrchestrationError, PromptTemplate,
    RelevanceScore,
};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Confidence ceiling of an answer built without text generation
const DEGRADED_CONFIDENCE: f64 = 0.35;
/// Confidence of the reply to a question the pipeline could not act on
const STOPPED_CONFIDENCE: f64 = 0.1;
/// Confidence of the basic agent's catalog answer
const BASIC_CONFIDENCE: f64 = 0.2;

/// Deadline and cancellation of one agent invocation
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub deadline: Instant,
    pub cancellation: CancellationToken,
    pub today: NaiveDate,
}

/// A business-area specialist
#[async_trait]
pub trait SpecialistAgent: Send + Sync {
    fn tag(&self) -> &DomainTag;

    fn knowledge(&self) -> &DomainKnowledge;

    /// Relevance of a query for this specialist
    fn relevance(&self, query: &str) -> RelevanceScore {
        self.knowledge().relevance(query)
    }

    async fn respond(
        &self,
        query: &str,
        relevance: &RelevanceScore,
        ctx: &InvocationContext,
    ) -> Result<AgentResponse, OrchestrationError>;
}

/// Specialist backed by the integration manager
pub struct DomainSpecialist {
    knowledge: DomainKnowledge,
    integration: Arc<IntegrationManager>,
}

impl DomainSpecialist {
    pub fn new(knowledge: DomainKnowledge, integration: Arc<IntegrationManager>) -> Self {
        Self {
            knowledge,
            integration,
        }
    }

    /// Answer from static facts and whatever data was loaded
    fn local_answer(
        &self,
        query: &str,
        relevance: &RelevanceScore,
        payload: IntegrationPayload,
    ) -> AgentResponse {
        let text = PromptTemplate::local_analysis(&self.knowledge, query, payload.data.as_ref());
        let cause = payload
            .error
            .unwrap_or_else(|| "response generation unavailable".to_string());
        let confidence = round2(DEGRADED_CONFIDENCE * (0.5 + 0.5 * relevance.score));

        let mut response = AgentResponse::answer(
            self.knowledge.tag.clone(),
            relevance.score,
            text,
            confidence,
            format!("Local analysis from static knowledge ({})", cause),
        )
        .with_run_id(payload.run_id)
        .degraded();
        if let Some(data) = payload.data {
            response = response.with_data(data);
        }
        response
    }
}

#[async_trait]
impl SpecialistAgent for DomainSpecialist {
    fn tag(&self) -> &DomainTag {
        &self.knowledge.tag
    }

    fn knowledge(&self) -> &DomainKnowledge {
        &self.knowledge
    }

    async fn respond(
        &self,
        query: &str,
        relevance: &RelevanceScore,
        ctx: &InvocationContext,
    ) -> Result<AgentResponse, OrchestrationError> {
        if ctx.cancellation.is_cancelled() {
            return Err(OrchestrationError::Cancelled);
        }

        let options = ChainOptions::default()
            .with_deadline(Some(ctx.deadline))
            .with_cancellation(ctx.cancellation.clone())
            .with_today(ctx.today);
        let context = EnrichedContext {
            knowledge: &self.knowledge,
            relevance,
        };
        let payload = self.integration.process(query, &context, &options).await;

        if ctx.cancellation.is_cancelled() {
            return Err(OrchestrationError::Cancelled);
        }
        if payload.timed_out || (payload.is_error() && Instant::now() >= ctx.deadline) {
            return Err(OrchestrationError::Timeout);
        }

        let tag = self.knowledge.tag.clone();
        if let Some(reason) = &payload.stopped
            && payload.text.is_none()
        {
            debug!(agent = %tag, "Pipeline stopped early");
            return Ok(AgentResponse::answer(
                tag,
                relevance.score,
                format!(
                    "The {} specialist could not act on this question: {}.",
                    self.knowledge.display_name.to_lowercase(),
                    reason
                ),
                STOPPED_CONFIDENCE,
                "Query parsing stopped the pipeline",
            )
            .with_run_id(payload.run_id));
        }

        if !payload.has_generated_text() {
            debug!(agent = %tag, "Falling back to local analysis");
            return Ok(self.local_answer(query, relevance, payload));
        }

        let hint = payload.confidence_hint.unwrap_or(0.5);
        let confidence = round2(hint * (0.6 + 0.4 * relevance.score));
        let reasoning = payload
            .reasoning
            .clone()
            .unwrap_or_else(|| "Generated answer".to_string());
        let mut response = AgentResponse::answer(
            tag,
            relevance.score,
            payload.text.unwrap_or_default(),
            confidence,
            reasoning,
        )
        .with_run_id(payload.run_id);
        if let Some(data) = payload.data {
            response = response.with_data(data);
        }
        Ok(response)
    }
}

/// Fallback agent for questions no specialist is relevant to.
///
/// Answers from the domain catalog alone, without any pipeline or text
/// generation.
pub struct BasicAgent {
    knowledge: DomainKnowledge,
    catalog: Vec<DomainKnowledge>,
}

impl BasicAgent {
    pub fn new(catalog: Vec<DomainKnowledge>) -> Self {
        let knowledge = DomainKnowledge::new(
            DomainTag::General,
            "General",
            KeywordTable::new(Vec::<(String, f64)>::new(), 1.0),
        )
        .with_description("Answers questions that match no business area");
        Self { knowledge, catalog }
    }
}

#[async_trait]
impl SpecialistAgent for BasicAgent {
    fn tag(&self) -> &DomainTag {
        &self.knowledge.tag
    }

    fn knowledge(&self) -> &DomainKnowledge {
        &self.knowledge
    }

    async fn respond(
        &self,
        query: &str,
        relevance: &RelevanceScore,
        _ctx: &InvocationContext,
    ) -> Result<AgentResponse, OrchestrationError> {
        Ok(AgentResponse::answer(
            DomainTag::General,
            relevance.score,
            PromptTemplate::basic_analysis(query, &self.catalog),
            BASIC_CONFIDENCE,
            "No specialist matched the question; answered from the domain catalog",
        )
        .degraded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestrationParams;
    use crate::ports::text_generator::TextGenerator;
    use crate::processing::{ProcessorCoordinator, ProcessorRegistry};
    use crate::test_support::{FailingGenerator, MapProvider, ScriptedGenerator, today};
    use insight_domain::{PipelineCatalog, builtin_catalog, builtin_knowledge};
    use serde_json::json;
    use std::time::Duration;

    fn specialist(generator: Arc<dyn TextGenerator>) -> DomainSpecialist {
        specialist_with(generator, &OrchestrationParams::default())
    }

    fn specialist_with(
        generator: Arc<dyn TextGenerator>,
        params: &OrchestrationParams,
    ) -> DomainSpecialist {
        let provider = Arc::new(
            MapProvider::new().with(DomainTag::Orders, json!({"order_count": 42})),
        );
        let registry = ProcessorRegistry::with_defaults(provider, generator, params);
        let coordinator = Arc::new(ProcessorCoordinator::new(registry, PipelineCatalog::builtin()));
        DomainSpecialist::new(
            builtin_knowledge(&DomainTag::Orders).unwrap(),
            Arc::new(IntegrationManager::new(coordinator, "standard")),
        )
    }

    fn ctx() -> InvocationContext {
        InvocationContext {
            deadline: Instant::now() + Duration::from_secs(5),
            cancellation: CancellationToken::new(),
            today: today(),
        }
    }

    #[tokio::test]
    async fn test_generated_answer() {
        let agent = specialist(Arc::new(ScriptedGenerator::new("There were 42 orders.")));
        let query = "How many orders were placed?";
        let relevance = agent.relevance(query);
        let response = agent.respond(query, &relevance, &ctx()).await.unwrap();

        assert!(response.is_success());
        assert!(!response.is_degraded());
        assert_eq!(response.text(), Some("There were 42 orders."));
        assert!(response.confidence() > 0.0);
        assert!(response.run_id().is_some());
        assert_eq!(response.data().unwrap()["order_count"], 42);
    }

    #[tokio::test]
    async fn test_generation_failure_degrades_to_local_analysis() {
        let agent = specialist(Arc::new(FailingGenerator));
        let query = "How many orders were placed?";
        let relevance = agent.relevance(query);
        let response = agent.respond(query, &relevance, &ctx()).await.unwrap();

        assert!(response.is_success());
        assert!(response.is_degraded());
        assert!(response.text().unwrap().contains("order_count: 42"));
        assert!(response.confidence() <= DEGRADED_CONFIDENCE);
        assert!(response.reasoning().contains("backend down"));
    }

    #[tokio::test]
    async fn test_cancelled_invocation() {
        let agent = specialist(Arc::new(ScriptedGenerator::new("x")));
        let ctx = ctx();
        ctx.cancellation.cancel();
        let err = agent
            .respond("orders", &RelevanceScore::zero(), &ctx)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_expired_deadline_is_a_timeout() {
        let agent = specialist(Arc::new(
            ScriptedGenerator::new("late").with_delay(Duration::from_secs(5)),
        ));
        let ctx = InvocationContext {
            deadline: Instant::now() + Duration::from_millis(30),
            ..ctx()
        };
        let err = agent
            .respond("How many orders?", &RelevanceScore::zero(), &ctx)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_completion_timeout_is_a_timeout() {
        let params = OrchestrationParams::default()
            .with_completion_timeout(Duration::from_millis(50))
            .with_agent_timeout(Duration::from_secs(5));
        let agent = specialist_with(
            Arc::new(ScriptedGenerator::new("late").with_delay(Duration::from_secs(2))),
            &params,
        );
        let query = "How many orders were placed?";
        let relevance = agent.relevance(query);

        let started = Instant::now();
        let err = agent.respond(query, &relevance, &ctx()).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_basic_agent_lists_catalog() {
        let agent = BasicAgent::new(builtin_catalog());
        let response = agent
            .respond("what's the weather", &RelevanceScore::zero(), &ctx())
            .await
            .unwrap();
        assert_eq!(response.agent_tag(), &DomainTag::General);
        assert!(response.text().unwrap().contains("did not match"));
        assert!(response.is_degraded());
        assert_eq!(response.confidence(), BASIC_CONFIDENCE);
    }
}
