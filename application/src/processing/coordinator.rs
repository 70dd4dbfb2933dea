//! Processor coordinator
//!
//! Executes step chains, parallel steps and named pipelines against the
//! [`ProcessorRegistry`], and keeps the registry of pipeline runs. The run
//! map is the only shared mutable state of the orchestrator.

use super::adapters;
use super::registry::ProcessorRegistry;
use super::stage::{ProcessingStage, StageArgs, StageContext, StageError};
use chrono::{DateTime, NaiveDate, Utc};
use insight_domain::{
    OrchestrationError, PipelineCatalog, PipelineRun, PipelineStep, RunId, StageOutput, StepResult,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// How a chain is executed
#[derive(Debug, Clone)]
pub struct ChainOptions {
    /// Name of the pipeline the steps come from
    pub pipeline: Option<String>,
    /// Deadline for the whole chain
    pub deadline: Option<Instant>,
    pub cancellation: CancellationToken,
    /// Reference date for relative filters and recency scoring
    pub today: NaiveDate,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            pipeline: None,
            deadline: None,
            cancellation: CancellationToken::new(),
            today: chrono::Local::now().date_naive(),
        }
    }
}

impl ChainOptions {
    pub fn with_pipeline(mut self, name: impl Into<String>) -> Self {
        self.pipeline = Some(name.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Some(Instant::now() + timeout))
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

pub struct ProcessorCoordinator {
    registry: ProcessorRegistry,
    catalog: PipelineCatalog,
    runs: Mutex<HashMap<RunId, PipelineRun>>,
    max_run_age: Duration,
}

impl ProcessorCoordinator {
    pub fn new(registry: ProcessorRegistry, catalog: PipelineCatalog) -> Self {
        Self {
            registry,
            catalog,
            runs: Mutex::new(HashMap::new()),
            max_run_age: Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Age after which finished runs are collected by [`run_pipeline`](Self::run_pipeline)
    pub fn with_max_run_age(mut self, max_age: Duration) -> Self {
        self.max_run_age = max_age;
        self
    }

    pub fn catalog(&self) -> &PipelineCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Run `steps` in order, threading each output into the next step.
    ///
    /// A failed step is recorded and the chain continues with the previous
    /// input; timeouts and cancellation end the chain. A step returning
    /// `stop_chain` ends it successfully. The run is finished and stored
    /// before it is returned. If the returned future is dropped before
    /// that, the stored run is marked failed.
    #[instrument(skip_all, fields(steps = steps.len(), pipeline = options.pipeline.as_deref()))]
    pub async fn execute_chain(
        &self,
        steps: &[PipelineStep],
        input: Value,
        options: &ChainOptions,
    ) -> PipelineRun {
        let mut run = PipelineRun::start(options.pipeline.clone());
        self.store(&run);
        let mut guard = RunGuard {
            runs: &self.runs,
            run_id: run.run_id().clone(),
            finished: false,
        };
        let mut current = input;

        for (index, step) in steps.iter().enumerate() {
            let ctx = Self::context(run.run_id().clone(), index, options);
            let stage = self.registry.resolve(&step.stage);
            let registered = self.registry.contains(&step.stage);

            let started_at = Utc::now();
            let clock = std::time::Instant::now();
            let outcome = Self::run_step(stage.as_ref(), registered, step, &current, &ctx).await;
            let duration_ms = clock.elapsed().as_millis() as u64;

            let (result, halt) = match outcome {
                Ok(output) => {
                    if output.stop_chain {
                        debug!(run_id = %run.run_id(), step = %step.label(), "Step stopped the chain");
                    }
                    let halt = output.stop_chain;
                    current = output.value.clone();
                    (
                        StepResult::success(index, step, output, started_at, duration_ms),
                        halt,
                    )
                }
                Err(e) => {
                    warn!(run_id = %run.run_id(), step = %step.label(), "Step failed: {}", e);
                    let halt = e.is_terminal();
                    (
                        failed_step(index, step, &e, started_at, duration_ms),
                        halt,
                    )
                }
            };

            if let Err(e) = run.record_step(result) {
                warn!("{}", e);
                break;
            }
            self.store(&run);
            if halt {
                break;
            }
        }

        if let Err(e) = run.finish() {
            warn!("{}", e);
        }
        self.store(&run);
        guard.finished = true;
        info!(
            run_id = %run.run_id(),
            status = %run.status(),
            steps = run.steps().len(),
            "Chain finished"
        );
        run
    }

    /// Run independent steps concurrently on the same input.
    ///
    /// Returns exactly one result per configuration, in configuration order,
    /// even when a stage task panics.
    #[instrument(skip_all, fields(steps = configs.len()))]
    pub async fn execute_parallel(
        &self,
        configs: &[PipelineStep],
        input: Value,
        options: &ChainOptions,
    ) -> Vec<StepResult> {
        let run_id = RunId::new();
        let handles: Vec<_> = configs
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let stage = self.registry.resolve(&step.stage);
                let registered = self.registry.contains(&step.stage);
                let ctx = Self::context(run_id.clone(), index, options);
                let step = step.clone();
                let input = input.clone();

                tokio::spawn(async move {
                    let started_at = Utc::now();
                    let clock = std::time::Instant::now();
                    let outcome =
                        Self::run_step(stage.as_ref(), registered, &step, &input, &ctx).await;
                    let duration_ms = clock.elapsed().as_millis() as u64;
                    match outcome {
                        Ok(output) => {
                            StepResult::success(index, &step, output, started_at, duration_ms)
                        }
                        Err(e) => failed_step(index, &step, &e, started_at, duration_ms),
                    }
                })
            })
            .collect();

        futures::future::join_all(handles)
            .await
            .into_iter()
            .zip(configs)
            .enumerate()
            .map(|(index, (joined, step))| match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!(step = %step.label(), "Stage task failed: {}", e);
                    StepResult::failure(index, step, format!("stage task failed: {}", e), Utc::now(), 0)
                }
            })
            .collect()
    }

    /// Resolve a named pipeline and execute it.
    ///
    /// Finished runs older than the configured maximum age are collected
    /// first.
    #[instrument(skip(self, input, options))]
    pub async fn run_pipeline(
        &self,
        name: &str,
        input: Value,
        options: &ChainOptions,
    ) -> Result<PipelineRun, OrchestrationError> {
        let removed = self.cleanup_completed(self.max_run_age);
        if removed > 0 {
            debug!(removed, "Collected finished runs");
        }

        let pipeline = self.catalog.get(name).ok_or_else(|| {
            OrchestrationError::IntegrationUnavailable(format!("unknown pipeline '{}'", name))
        })?;
        let options = options.clone().with_pipeline(name);
        Ok(self.execute_chain(&pipeline.steps, input, &options).await)
    }

    pub fn get_run(&self, run_id: &RunId) -> Option<PipelineRun> {
        self.runs().get(run_id).cloned()
    }

    /// All known runs, oldest first
    pub fn list_runs(&self) -> Vec<PipelineRun> {
        let mut runs: Vec<PipelineRun> = self.runs().values().cloned().collect();
        runs.sort_by_key(|run| run.started_at());
        runs
    }

    /// Remove finished runs that completed more than `max_age` ago.
    ///
    /// Returns the number of runs removed; running runs are never removed.
    pub fn cleanup_completed(&self, max_age: Duration) -> usize {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut runs = self.runs();
        let before = runs.len();
        runs.retain(|_, run| !run.finished_before(cutoff));
        before - runs.len()
    }

    fn context(run_id: RunId, step_index: usize, options: &ChainOptions) -> StageContext {
        StageContext {
            run_id,
            step_index,
            deadline: options.deadline,
            cancellation: options.cancellation.clone(),
            today: options.today,
        }
    }

    async fn run_step(
        stage: &dyn ProcessingStage,
        registered: bool,
        step: &PipelineStep,
        input: &Value,
        ctx: &StageContext,
    ) -> Result<StageOutput, StageError> {
        if ctx.cancellation.is_cancelled() {
            return Err(StageError::Cancelled);
        }
        if ctx.remaining().is_some_and(|r| r.is_zero()) {
            return Err(StageError::Timeout);
        }

        // The fallback stage takes the input as-is
        let named = if registered {
            adapters::adapt(step, input)?
        } else {
            Map::new()
        };
        let args = StageArgs::new(input.clone())
            .with_named(named)
            .with_params(step.params.clone());

        let call = async {
            match ctx.remaining() {
                Some(remaining) => tokio::time::timeout(remaining, stage.invoke(&step.method, args, ctx))
                    .await
                    .unwrap_or(Err(StageError::Timeout)),
                None => stage.invoke(&step.method, args, ctx).await,
            }
        };

        tokio::select! {
            biased;
            _ = ctx.cancellation.cancelled() => Err(StageError::Cancelled),
            result = call => result,
        }
    }

    fn runs(&self) -> MutexGuard<'_, HashMap<RunId, PipelineRun>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, run: &PipelineRun) {
        self.runs().insert(run.run_id().clone(), run.clone());
    }
}

/// Fails the stored run when a chain is dropped before it finished
struct RunGuard<'a> {
    runs: &'a Mutex<HashMap<RunId, PipelineRun>>,
    run_id: RunId,
    finished: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(run) = runs.get_mut(&self.run_id)
            && !run.status().is_finished()
            && run.fail("aborted before completion").is_ok()
        {
            warn!(run_id = %self.run_id, "Chain dropped while running");
        }
    }
}

fn failed_step(
    index: usize,
    step: &PipelineStep,
    error: &StageError,
    started_at: DateTime<Utc>,
    duration_ms: u64,
) -> StepResult {
    let result = StepResult::failure(index, step, error.to_string(), started_at, duration_ms);
    if error.is_timeout() {
        result.mark_timed_out()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestrationParams;
    use crate::test_support::{MapProvider, ScriptedGenerator, today};
    use async_trait::async_trait;
    use insight_domain::{DomainTag, RunStatus, StageName, builtin_knowledge};
    use serde_json::json;
    use std::sync::Arc;

    /// Appends the step index to `trail`
    struct Marker;

    #[async_trait]
    impl ProcessingStage for Marker {
        fn name(&self) -> StageName {
            StageName::Custom("marker".to_string())
        }

        fn methods(&self) -> &'static [&'static str] {
            &["mark", "stop", "fail", "sleep", "panic"]
        }

        async fn invoke(
            &self,
            method: &str,
            args: StageArgs,
            ctx: &StageContext,
        ) -> Result<StageOutput, StageError> {
            let mut trail = args
                .input
                .get("trail")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            trail.push(json!(ctx.step_index));
            let out = json!({ "trail": trail });
            match method {
                "mark" => Ok(StageOutput::new(out)),
                "stop" => Ok(StageOutput::stop(out)),
                "fail" => Err(StageError::Failed("boom".to_string())),
                "sleep" => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(StageOutput::new(out))
                }
                "panic" => panic!("stage panicked"),
                other => Err(self.unknown_method(other)),
            }
        }
    }

    fn marker(method: &str) -> PipelineStep {
        PipelineStep::new(StageName::Custom("marker".to_string()), method)
    }

    fn coordinator() -> ProcessorCoordinator {
        let mut registry = ProcessorRegistry::new();
        registry.register(Arc::new(Marker));
        ProcessorCoordinator::new(registry, PipelineCatalog::builtin())
    }

    fn options() -> ChainOptions {
        ChainOptions::default().with_today(today())
    }

    #[tokio::test]
    async fn test_chain_threads_outputs() {
        let coordinator = coordinator();
        let steps = vec![marker("mark"), marker("mark"), marker("mark")];
        let run = coordinator
            .execute_chain(&steps, json!({}), &options())
            .await;

        assert_eq!(run.status(), RunStatus::Completed);
        assert_eq!(run.steps().len(), 3);
        assert_eq!(run.final_output().unwrap()["trail"], json!([0, 1, 2]));
        assert!(run.completed_at().is_some());
    }

    #[tokio::test]
    async fn test_stop_chain_short_circuits() {
        let coordinator = coordinator();
        let steps = vec![
            marker("mark"),
            marker("stop"),
            marker("mark"),
            marker("mark"),
        ];
        let run = coordinator
            .execute_chain(&steps, json!({}), &options())
            .await;

        assert_eq!(run.steps().len(), 2);
        assert!(run.steps()[1].stop_chain);
        assert_eq!(run.status(), RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_deterministic_chain_is_idempotent() {
        let coordinator = coordinator();
        let steps = vec![marker("mark"), marker("fail"), marker("mark")];
        let first = coordinator
            .execute_chain(&steps, json!({"trail": [9]}), &options())
            .await;
        let second = coordinator
            .execute_chain(&steps, json!({"trail": [9]}), &options())
            .await;

        assert_ne!(first.run_id(), second.run_id());
        assert_eq!(first.final_output(), second.final_output());
        assert_eq!(first.status(), second.status());
        let outputs = |run: &PipelineRun| {
            run.steps()
                .iter()
                .map(|s| (s.success, s.output.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(outputs(&first), outputs(&second));
    }

    #[tokio::test]
    async fn test_failed_step_passes_previous_input_on() {
        let coordinator = coordinator();
        let steps = vec![marker("mark"), marker("fail"), marker("mark")];
        let run = coordinator
            .execute_chain(&steps, json!({}), &options())
            .await;

        assert_eq!(run.status(), RunStatus::Completed);
        assert!(!run.steps()[1].success);
        assert_eq!(run.steps()[1].error.as_deref(), Some("boom"));
        assert_eq!(run.final_output().unwrap()["trail"], json!([0, 2]));
    }

    #[tokio::test]
    async fn test_failed_last_step_fails_run() {
        let coordinator = coordinator();
        let run = coordinator
            .execute_chain(&[marker("mark"), marker("fail")], json!({}), &options())
            .await;
        assert_eq!(run.status(), RunStatus::Failed);
        assert!(run.failure().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_missing_stage_uses_fallback() {
        let coordinator = coordinator();
        let steps = vec![
            marker("mark"),
            PipelineStep::new(StageName::Custom("sentiment".to_string()), "analyze"),
        ];
        let run = coordinator
            .execute_chain(&steps, json!({}), &options())
            .await;

        assert_eq!(run.status(), RunStatus::Completed);
        let last = &run.steps()[1];
        assert!(last.success);
        assert!(last.fallback);
        assert_eq!(last.output["unavailable"], json!(["sentiment"]));
        assert_eq!(last.output["trail"], json!([0]));
    }

    #[tokio::test]
    async fn test_empty_chain_completes() {
        let coordinator = coordinator();
        let run = coordinator.execute_chain(&[], json!({}), &options()).await;
        assert_eq!(run.status(), RunStatus::Completed);
        assert!(run.steps().is_empty());
    }

    #[tokio::test]
    async fn test_deadline_ends_chain() {
        let coordinator = coordinator();
        let steps = vec![marker("sleep"), marker("mark")];
        let options = options().with_timeout(Duration::from_millis(30));
        let run = coordinator.execute_chain(&steps, json!({}), &options).await;

        assert_eq!(run.steps().len(), 1);
        assert_eq!(run.steps()[0].error.as_deref(), Some("timeout"));
        assert_eq!(run.status(), RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_cancellation_ends_chain() {
        let coordinator = coordinator();
        let token = CancellationToken::new();
        token.cancel();
        let options = options().with_cancellation(token);
        let run = coordinator
            .execute_chain(&[marker("mark"), marker("mark")], json!({}), &options)
            .await;

        assert_eq!(run.steps().len(), 1);
        assert_eq!(run.steps()[0].error.as_deref(), Some("Operation cancelled"));
        assert_eq!(run.status(), RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_parallel_returns_one_result_per_config() {
        let coordinator = coordinator();
        let configs = vec![
            marker("mark"),
            marker("fail"),
            marker("panic"),
            PipelineStep::new(StageName::Custom("missing".to_string()), "x"),
        ];
        let results = coordinator
            .execute_parallel(&configs, json!({}), &options())
            .await;

        assert_eq!(results.len(), configs.len());
        assert!(results[0].success);
        assert_eq!(results[0].output["trail"], json!([0]));
        assert!(!results[1].success);
        assert!(!results[2].success);
        assert!(results[2].error.as_deref().unwrap().contains("stage task failed"));
        assert!(results[3].fallback);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.index, i);
        }
    }

    fn standard_coordinator() -> ProcessorCoordinator {
        let provider = Arc::new(
            MapProvider::new().with(DomainTag::Orders, json!({"order_count": 42})),
        );
        let generator = Arc::new(ScriptedGenerator::new("There were 42 orders."));
        let registry =
            ProcessorRegistry::with_defaults(provider, generator, &OrchestrationParams::default());
        ProcessorCoordinator::new(registry, PipelineCatalog::builtin())
    }

    fn orders_input(query: &str) -> Value {
        let knowledge = builtin_knowledge(&DomainTag::Orders).unwrap();
        json!({
            "query": query,
            "domain": "orders",
            "knowledge": knowledge,
            "matched_keywords": ["order"],
        })
    }

    #[tokio::test]
    async fn test_standard_pipeline_then_cleanup() {
        let coordinator = standard_coordinator();
        let run = coordinator
            .run_pipeline("standard", orders_input("How many orders this week?"), &options())
            .await
            .unwrap();

        assert_eq!(run.status(), RunStatus::Completed);
        assert_eq!(run.pipeline(), Some("standard"));
        let output = run.final_output().unwrap();
        assert_eq!(output["response"], "There were 42 orders.");
        assert_eq!(output["data"]["order_count"], 42);
        assert!(coordinator.get_run(run.run_id()).is_some());

        assert_eq!(coordinator.cleanup_completed(Duration::ZERO), 1);
        assert!(coordinator.get_run(run.run_id()).is_none());
        assert!(coordinator.list_runs().is_empty());
    }

    #[tokio::test]
    async fn test_advanced_pipeline_scores_and_assesses() {
        let coordinator = standard_coordinator();
        let run = coordinator
            .run_pipeline("advanced", orders_input("How many orders?"), &options())
            .await
            .unwrap();

        assert_eq!(run.steps().len(), 5);
        assert!(run.steps().iter().all(|s| s.success));
        let output = run.final_output().unwrap();
        assert!(output["intelligence"]["overall"].is_number());
        assert!(output["assessment"]["overall"].is_number());
    }

    #[tokio::test]
    async fn test_unanswerable_query_stops_standard_pipeline() {
        let coordinator = standard_coordinator();
        let run = coordinator
            .run_pipeline("standard", orders_input("is it?"), &options())
            .await
            .unwrap();
        assert_eq!(run.steps().len(), 1);
        assert_eq!(run.status(), RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_unknown_pipeline_is_unavailable() {
        let coordinator = standard_coordinator();
        let err = coordinator
            .run_pipeline("nonexistent", json!({}), &options())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::IntegrationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_dropped_chain_fails_its_run() {
        let coordinator = coordinator();
        let steps = vec![marker("mark"), marker("sleep"), marker("mark")];
        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            coordinator.execute_chain(&steps, json!({}), &options()),
        )
        .await;
        assert!(outcome.is_err());

        let runs = coordinator.list_runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status(), RunStatus::Failed);
        assert_eq!(runs[0].failure(), Some("aborted before completion"));
        assert_eq!(runs[0].steps().len(), 1);

        assert_eq!(coordinator.cleanup_completed(Duration::ZERO), 1);
        assert!(coordinator.list_runs().is_empty());
    }

    #[tokio::test]
    async fn test_completion_timeout_marks_step() {
        let generator = Arc::new(
            ScriptedGenerator::new("late").with_delay(Duration::from_secs(5)),
        );
        let params = OrchestrationParams::default()
            .with_completion_timeout(Duration::from_millis(30));
        let provider = Arc::new(
            MapProvider::new().with(DomainTag::Orders, json!({"order_count": 42})),
        );
        let registry = ProcessorRegistry::with_defaults(provider, generator, &params);
        let coordinator = ProcessorCoordinator::new(registry, PipelineCatalog::builtin());
        let deadline = Instant::now() + Duration::from_secs(5);

        let run = coordinator
            .run_pipeline(
                "standard",
                orders_input("How many orders this month?"),
                &options().with_deadline(Some(deadline)),
            )
            .await
            .unwrap();
        assert_eq!(run.status(), RunStatus::Failed);
        assert!(run.ended_in_timeout());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_runs() {
        let coordinator = coordinator();
        let run = coordinator
            .execute_chain(&[marker("mark")], json!({}), &options())
            .await;
        assert_eq!(coordinator.cleanup_completed(Duration::from_secs(3600)), 0);
        assert!(coordinator.get_run(run.run_id()).is_some());
        assert_eq!(coordinator.list_runs().len(), 1);
    }
}
