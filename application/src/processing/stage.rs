//! Processing stage capability trait and its call context.

use crate::ports::data_provider::DataProviderError;
use crate::ports::text_generator::GenerationError;
use async_trait::async_trait;
use chrono::NaiveDate;
use insight_domain::{RunId, StageName, StageOutput};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Errors a stage method can report for one step
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Stage '{stage}' has no method '{method}'")]
    UnknownMethod { stage: String, method: String },

    #[error("Missing argument '{argument}' for {stage}.{method}")]
    MissingArgument {
        stage: String,
        method: String,
        argument: &'static str,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Data(#[from] DataProviderError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("timeout")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

impl StageError {
    /// Deadline expiry, of the chain or of a completion call
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            StageError::Timeout | StageError::Generation(GenerationError::Timeout)
        )
    }

    /// Errors after which the rest of the chain is not attempted
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StageError::Timeout
                | StageError::Cancelled
                | StageError::Generation(GenerationError::Timeout)
        )
    }
}

/// Per-step context handed to every stage invocation
#[derive(Debug, Clone)]
pub struct StageContext {
    pub run_id: RunId,
    pub step_index: usize,
    /// Deadline of the whole chain
    pub deadline: Option<Instant>,
    pub cancellation: CancellationToken,
    /// Reference date for relative filters and recency
    pub today: NaiveDate,
}

impl StageContext {
    /// Time left before the chain deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// `budget` shortened to the chain deadline
    pub fn bounded(&self, budget: Duration) -> Duration {
        self.remaining().map_or(budget, |remaining| budget.min(remaining))
    }
}

/// Arguments of one stage call
#[derive(Debug, Clone)]
pub struct StageArgs {
    /// Previous step's output
    pub input: Value,
    /// Named arguments extracted by the argument adapter
    pub named: Map<String, Value>,
    /// Step parameters from the pipeline definition
    pub params: Map<String, Value>,
}

impl StageArgs {
    pub fn new(input: Value) -> Self {
        Self {
            input,
            named: Map::new(),
            params: Map::new(),
        }
    }

    pub fn with_named(mut self, named: Map<String, Value>) -> Self {
        self.named = named;
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.named.get(name).filter(|v| !v.is_null())
    }

    pub fn flag(&self, name: &str) -> bool {
        self.params.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }
}

/// A named processing capability with one or more methods
#[async_trait]
pub trait ProcessingStage: Send + Sync {
    fn name(&self) -> StageName;

    fn methods(&self) -> &'static [&'static str];

    async fn invoke(
        &self,
        method: &str,
        args: StageArgs,
        ctx: &StageContext,
    ) -> Result<StageOutput, StageError>;

    fn unknown_method(&self, method: &str) -> StageError {
        StageError::UnknownMethod {
            stage: self.name().to_string(),
            method: method.to_string(),
        }
    }
}
