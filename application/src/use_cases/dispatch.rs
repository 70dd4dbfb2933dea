//! Agent registry and concurrent dispatch.

use crate::config::{InsightConfig, OrchestrationParams};
use crate::ports::progress::ProgressNotifier;
use crate::use_cases::integration::IntegrationManager;
use crate::use_cases::specialist::{BasicAgent, DomainSpecialist, InvocationContext, SpecialistAgent};
use chrono::NaiveDate;
use insight_domain::{AgentResponse, DomainTag, OrchestrationError, RelevanceScore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// An agent chosen for a query, with its relevance
pub type Selection = (Arc<dyn SpecialistAgent>, RelevanceScore);

/// The specialists known to the orchestrator, plus the basic agent
pub struct AgentRegistry {
    agents: BTreeMap<DomainTag, Arc<dyn SpecialistAgent>>,
    basic: Arc<dyn SpecialistAgent>,
}

impl AgentRegistry {
    pub fn new(basic: Arc<dyn SpecialistAgent>) -> Self {
        Self {
            agents: BTreeMap::new(),
            basic,
        }
    }

    /// One [`DomainSpecialist`] per configured domain
    pub fn from_config(config: &InsightConfig, integration: Arc<IntegrationManager>) -> Self {
        let mut registry = Self::new(Arc::new(BasicAgent::new(config.knowledge.clone())));
        for knowledge in &config.knowledge {
            registry.register(Arc::new(DomainSpecialist::new(
                knowledge.clone(),
                Arc::clone(&integration),
            )));
        }
        registry
    }

    /// Register a specialist, replacing any with the same tag
    pub fn register(&mut self, agent: Arc<dyn SpecialistAgent>) {
        self.agents.insert(agent.tag().clone(), agent);
    }

    pub fn get(&self, tag: &DomainTag) -> Option<&Arc<dyn SpecialistAgent>> {
        self.agents.get(tag)
    }

    pub fn tags(&self) -> Vec<&DomainTag> {
        self.agents.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn basic(&self) -> &Arc<dyn SpecialistAgent> {
        &self.basic
    }

    /// Specialists whose relevance is strictly above `threshold`, most
    /// relevant first
    pub fn select(&self, query: &str, threshold: f64) -> Vec<Selection> {
        let mut selected: Vec<Selection> = self
            .agents
            .values()
            .map(|agent| (Arc::clone(agent), agent.relevance(query)))
            .filter(|(_, relevance)| relevance.exceeds(threshold))
            .collect();
        selected.sort_by(|a, b| b.1.score.total_cmp(&a.1.score));
        selected
    }
}

/// Runs the selected agents concurrently under per-agent and overall
/// deadlines
pub struct Dispatcher {
    registry: Arc<AgentRegistry>,
    params: OrchestrationParams,
}

impl Dispatcher {
    pub fn new(registry: Arc<AgentRegistry>, params: OrchestrationParams) -> Self {
        Self { registry, params }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn params(&self) -> &OrchestrationParams {
        &self.params
    }

    /// Agents to invoke for a query; the basic agent when none is relevant
    pub fn plan(&self, query: &str) -> Vec<Selection> {
        let selected = self.registry.select(query, self.params.min_relevance);
        if selected.is_empty() {
            info!("No specialist above threshold, using basic agent");
            return vec![(Arc::clone(self.registry.basic()), RelevanceScore::zero())];
        }
        selected
    }

    /// Invoke every planned agent and collect one response per agent, in
    /// plan order.
    ///
    /// Never fails: errors, timeouts and panics become failure responses.
    /// Agents still running at the outer deadline or on cancellation are
    /// aborted.
    #[instrument(skip_all, fields(agents = plan.len()))]
    pub async fn dispatch(
        &self,
        query: &str,
        plan: &[Selection],
        today: NaiveDate,
        cancellation: &CancellationToken,
        progress: &dyn ProgressNotifier,
    ) -> Vec<AgentResponse> {
        let semaphore = Arc::new(Semaphore::new(self.params.max_concurrent_agents.max(1)));
        let agent_timeout = self.params.agent_timeout;
        let mut join_set = JoinSet::new();

        for (index, (agent, relevance)) in plan.iter().enumerate() {
            let agent = Arc::clone(agent);
            let relevance = relevance.clone();
            let semaphore = Arc::clone(&semaphore);
            let cancellation = cancellation.clone();
            let query = query.to_string();

            join_set.spawn(async move {
                let tag = agent.tag().clone();
                let response = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        let ctx = InvocationContext {
                            deadline: Instant::now() + agent_timeout,
                            cancellation,
                            today,
                        };
                        match tokio::time::timeout(
                            agent_timeout,
                            agent.respond(&query, &relevance, &ctx),
                        )
                        .await
                        {
                            Ok(Ok(response)) => response,
                            Ok(Err(e)) => AgentResponse::from_error(tag, relevance.score, &e),
                            Err(_) => AgentResponse::timeout(tag, relevance.score),
                        }
                    }
                    Err(_) => AgentResponse::failure(tag, relevance.score, "dispatcher closed"),
                };
                (index, response)
            });
        }

        let mut slots: Vec<Option<AgentResponse>> = vec![None; plan.len()];
        let mut interrupted: Option<OrchestrationError> = None;
        let outer = tokio::time::sleep(self.params.outer_deadline);
        tokio::pin!(outer);

        loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    warn!("Dispatch cancelled, aborting {} agents", join_set.len());
                    interrupted = Some(OrchestrationError::Cancelled);
                    join_set.abort_all();
                    break;
                }
                _ = &mut outer => {
                    warn!("Outer deadline reached, aborting {} agents", join_set.len());
                    interrupted = Some(OrchestrationError::Timeout);
                    join_set.abort_all();
                    break;
                }
                joined = join_set.join_next() => match joined {
                    None => break,
                    Some(Ok((index, response))) => {
                        if response.is_success() {
                            info!("Agent {} answered", response.agent_tag());
                        } else {
                            warn!(
                                "Agent {} failed: {}",
                                response.agent_tag(),
                                response.error().unwrap_or_default()
                            );
                        }
                        progress.on_agent_complete(response.agent_tag(), response.is_success());
                        slots[index] = Some(response);
                    }
                    Some(Err(e)) => warn!("Agent task failed: {}", e),
                },
            }
        }

        // Aborted tasks close their pipeline runs as they are dropped
        while let Some(joined) = join_set.join_next().await {
            if let Ok((index, response)) = joined {
                progress.on_agent_complete(response.agent_tag(), response.is_success());
                slots[index] = Some(response);
            }
        }

        slots
            .into_iter()
            .zip(plan)
            .map(|(slot, (agent, relevance))| match slot {
                Some(response) => response,
                None => {
                    let tag = agent.tag().clone();
                    let response = match &interrupted {
                        Some(error) => AgentResponse::from_error(tag, relevance.score, error),
                        None => AgentResponse::failure(tag, relevance.score, "agent task panicked"),
                    };
                    progress.on_agent_complete(response.agent_tag(), false);
                    response
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::NoProgress;
    use crate::test_support::today;
    use async_trait::async_trait;
    use insight_domain::{DomainKnowledge, KeywordTable, builtin_catalog};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    enum Behavior {
        Answer(&'static str),
        Fail,
        Sleep(Duration),
        Panic,
    }

    struct StubAgent {
        knowledge: DomainKnowledge,
        behavior: Behavior,
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl StubAgent {
        fn new(tag: DomainTag, keyword: &str, behavior: Behavior) -> Self {
            Self {
                knowledge: DomainKnowledge::new(
                    tag.clone(),
                    tag.to_string(),
                    KeywordTable::new([(keyword, 2.0)], 2.0),
                ),
                behavior,
                running: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl SpecialistAgent for StubAgent {
        fn tag(&self) -> &DomainTag {
            &self.knowledge.tag
        }

        fn knowledge(&self) -> &DomainKnowledge {
            &self.knowledge
        }

        async fn respond(
            &self,
            _query: &str,
            relevance: &RelevanceScore,
            _ctx: &InvocationContext,
        ) -> Result<AgentResponse, OrchestrationError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let result = match &self.behavior {
                Behavior::Answer(text) => Ok(AgentResponse::answer(
                    self.knowledge.tag.clone(),
                    relevance.score,
                    *text,
                    0.8,
                    "stub",
                )),
                Behavior::Fail => Err(OrchestrationError::agent(self.knowledge.tag.as_str(), "boom")),
                Behavior::Sleep(duration) => {
                    tokio::time::sleep(*duration).await;
                    Ok(AgentResponse::answer(
                        self.knowledge.tag.clone(),
                        relevance.score,
                        "late",
                        0.8,
                        "stub",
                    ))
                }
                Behavior::Panic => panic!("agent panicked"),
            };
            self.running.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn registry(agents: Vec<StubAgent>) -> Arc<AgentRegistry> {
        let mut registry = AgentRegistry::new(Arc::new(BasicAgent::new(builtin_catalog())));
        for agent in agents {
            registry.register(Arc::new(agent));
        }
        Arc::new(registry)
    }

    async fn run(dispatcher: &Dispatcher, query: &str) -> Vec<AgentResponse> {
        let plan = dispatcher.plan(query);
        dispatcher
            .dispatch(query, &plan, today(), &CancellationToken::new(), &NoProgress)
            .await
    }

    #[test]
    fn test_select_strictly_above_threshold() {
        let registry = registry(vec![
            StubAgent::new(DomainTag::Orders, "order", Behavior::Answer("a")),
            StubAgent::new(DomainTag::Finance, "revenue", Behavior::Answer("b")),
        ]);
        let selected = registry.select("orders and revenue", 0.0);
        assert_eq!(selected.len(), 2);

        let selected = registry.select("orders only", 0.0);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].0.tag(), &DomainTag::Orders);

        assert!(registry.select("orders only", 1.0).is_empty());
    }

    #[test]
    fn test_select_orders_by_relevance() {
        let mut registry = AgentRegistry::new(Arc::new(BasicAgent::new(builtin_catalog())));
        for knowledge in builtin_catalog() {
            registry.register(Arc::new(StubAgent {
                knowledge,
                behavior: Behavior::Answer("x"),
                running: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
            }));
        }
        let selected = registry.select("late shipments and in-transit shipment tracking", 0.0);
        assert!(!selected.is_empty());
        assert_eq!(selected[0].0.tag(), &DomainTag::Shipments);
        assert!(selected.windows(2).all(|w| w[0].1.score >= w[1].1.score));
    }

    #[tokio::test]
    async fn test_no_match_uses_basic_agent() {
        let dispatcher = Dispatcher::new(
            registry(vec![StubAgent::new(DomainTag::Orders, "order", Behavior::Answer("a"))]),
            OrchestrationParams::default(),
        );
        let responses = run(&dispatcher, "what's the weather like").await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].agent_tag(), &DomainTag::General);
        assert!(responses[0].is_success());
    }

    #[tokio::test]
    async fn test_failure_is_captured() {
        let dispatcher = Dispatcher::new(
            registry(vec![
                StubAgent::new(DomainTag::Orders, "order", Behavior::Answer("42 orders")),
                StubAgent::new(DomainTag::Finance, "order", Behavior::Fail),
            ]),
            OrchestrationParams::default(),
        );
        let responses = run(&dispatcher, "order totals").await;
        assert_eq!(responses.len(), 2);
        let failed = responses.iter().find(|r| !r.is_success()).unwrap();
        assert_eq!(failed.agent_tag(), &DomainTag::Finance);
        assert_eq!(failed.error(), Some("boom"));
        assert_eq!(failed.confidence(), 0.0);
    }

    #[tokio::test]
    async fn test_agent_timeout() {
        let params = OrchestrationParams::default()
            .with_agent_timeout(Duration::from_millis(50))
            .with_outer_deadline(Duration::from_secs(5));
        let dispatcher = Dispatcher::new(
            registry(vec![
                StubAgent::new(DomainTag::Orders, "order", Behavior::Answer("42 orders")),
                StubAgent::new(DomainTag::Deliveries, "order", Behavior::Sleep(Duration::from_secs(10))),
            ]),
            params,
        );
        let started = std::time::Instant::now();
        let responses = run(&dispatcher, "order status").await;

        assert!(started.elapsed() < Duration::from_secs(2));
        let late = responses
            .iter()
            .find(|r| r.agent_tag() == &DomainTag::Deliveries)
            .unwrap();
        assert!(late.is_timeout());
        assert_eq!(late.confidence(), 0.0);
        assert!(responses.iter().any(|r| r.is_success()));
    }

    #[tokio::test]
    async fn test_outer_deadline_aborts_all() {
        let params = OrchestrationParams::default()
            .with_agent_timeout(Duration::from_secs(10))
            .with_outer_deadline(Duration::from_millis(50));
        let dispatcher = Dispatcher::new(
            registry(vec![StubAgent::new(
                DomainTag::Orders,
                "order",
                Behavior::Sleep(Duration::from_secs(10)),
            )]),
            params,
        );
        let started = std::time::Instant::now();
        let responses = run(&dispatcher, "orders").await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(responses.len(), 1);
        assert!(responses[0].is_timeout());
    }

    #[tokio::test]
    async fn test_cancellation_reports_every_agent() {
        let dispatcher = Dispatcher::new(
            registry(vec![StubAgent::new(
                DomainTag::Orders,
                "order",
                Behavior::Sleep(Duration::from_secs(10)),
            )]),
            OrchestrationParams::default(),
        );
        let token = CancellationToken::new();
        let plan = dispatcher.plan("orders");
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });
        let responses = dispatcher
            .dispatch("orders", &plan, today(), &token, &NoProgress)
            .await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].error(), Some("Operation cancelled"));
    }

    #[tokio::test]
    async fn test_panicking_agent_still_reported() {
        let dispatcher = Dispatcher::new(
            registry(vec![
                StubAgent::new(DomainTag::Orders, "order", Behavior::Panic),
                StubAgent::new(DomainTag::Finance, "order", Behavior::Answer("ok")),
            ]),
            OrchestrationParams::default(),
        );
        let responses = run(&dispatcher, "orders").await;
        assert_eq!(responses.len(), 2);
        let panicked = responses
            .iter()
            .find(|r| r.agent_tag() == &DomainTag::Orders)
            .unwrap();
        assert_eq!(panicked.error(), Some("agent task panicked"));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let agents = DomainTag::builtin()
            .into_iter()
            .map(|tag| StubAgent {
                knowledge: DomainKnowledge::new(
                    tag.clone(),
                    tag.to_string(),
                    KeywordTable::new([("report", 1.0)], 1.0),
                ),
                behavior: Behavior::Sleep(Duration::from_millis(30)),
                running: Arc::clone(&running),
                peak: Arc::clone(&peak),
            })
            .collect();
        let dispatcher = Dispatcher::new(
            registry(agents),
            OrchestrationParams::default().with_max_concurrent_agents(2),
        );
        let responses = run(&dispatcher, "weekly report").await;
        assert_eq!(responses.len(), 6);
        assert!(responses.iter().all(|r| r.is_success()));
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
