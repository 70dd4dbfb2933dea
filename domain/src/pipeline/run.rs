//! Pipeline run entity and step results

use super::stage::{StageName, StageOutput};
use super::step::PipelineStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Identifier of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a run: `Running` → `Completed` | `Failed`, never reopened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Running, RunStatus::Completed) | (RunStatus::Running, RunStatus::Failed)
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Rejected run mutation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunTransitionError {
    #[error("Run {run_id} cannot move from {from} to {to}")]
    InvalidTransition {
        run_id: String,
        from: RunStatus,
        to: RunStatus,
    },

    #[error("Run {0} is finished; no more steps can be recorded")]
    Finished(String),
}

/// Outcome of one executed step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub stage: StageName,
    pub method: String,
    pub success: bool,
    pub output: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub stop_chain: bool,
    /// Served by the fallback stage
    pub fallback: bool,
    /// The step ran out of time
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl StepResult {
    pub fn success(
        index: usize,
        step: &PipelineStep,
        output: StageOutput,
        started_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        Self {
            index,
            stage: step.stage.clone(),
            method: step.method.clone(),
            success: true,
            output: output.value,
            error: None,
            stop_chain: output.stop_chain,
            fallback: output.fallback,
            timed_out: false,
            started_at,
            duration_ms,
        }
    }

    pub fn failure(
        index: usize,
        step: &PipelineStep,
        error: impl Into<String>,
        started_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        Self {
            index,
            stage: step.stage.clone(),
            method: step.method.clone(),
            success: false,
            output: Value::Null,
            error: Some(error.into()),
            stop_chain: false,
            fallback: false,
            timed_out: false,
            started_at,
            duration_ms,
        }
    }

    /// Mark a failed step as having hit its deadline
    pub fn mark_timed_out(mut self) -> Self {
        self.timed_out = true;
        self
    }
}

/// Mutable execution record of one chain (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    run_id: RunId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pipeline: Option<String>,
    steps: Vec<StepResult>,
    status: RunStatus,
    started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
}

impl PipelineRun {
    pub fn start(pipeline: Option<String>) -> Self {
        Self {
            run_id: RunId::new(),
            pipeline,
            steps: Vec::new(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            failure: None,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn pipeline(&self) -> Option<&str> {
        self.pipeline.as_deref()
    }

    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Append a step result; only allowed while running
    pub fn record_step(&mut self, step: StepResult) -> Result<(), RunTransitionError> {
        if self.status.is_finished() {
            return Err(RunTransitionError::Finished(self.run_id.to_string()));
        }
        self.steps.push(step);
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), RunTransitionError> {
        self.transition(RunStatus::Completed)
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), RunTransitionError> {
        self.transition(RunStatus::Failed)?;
        self.failure = Some(reason.into());
        Ok(())
    }

    /// Finish according to the recorded steps.
    ///
    /// The run fails when its last executed step failed (no usable final
    /// payload); it completes otherwise, including for an empty chain.
    pub fn finish(&mut self) -> Result<(), RunTransitionError> {
        match self.steps.last() {
            Some(last) if !last.success => {
                let reason = format!(
                    "step {} ({}.{}) failed: {}",
                    last.index,
                    last.stage,
                    last.method,
                    last.error.as_deref().unwrap_or("unknown error")
                );
                self.fail(reason)
            }
            _ => self.complete(),
        }
    }

    fn transition(&mut self, next: RunStatus) -> Result<(), RunTransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(RunTransitionError::InvalidTransition {
                run_id: self.run_id.to_string(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Output of the last successful step
    pub fn final_output(&self) -> Option<&Value> {
        self.steps
            .iter()
            .rev()
            .find(|s| s.success)
            .map(|s| &s.output)
    }

    /// Whether the run ended on a step that hit its deadline
    pub fn ended_in_timeout(&self) -> bool {
        self.steps.last().is_some_and(|s| !s.success && s.timed_out)
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| !s.success)
    }

    /// Whether the run finished before `cutoff`
    pub fn finished_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.status.is_finished() && self.completed_at.is_some_and(|at| at <= cutoff)
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.steps.iter().map(|s| s.duration_ms).sum()
    }
}
