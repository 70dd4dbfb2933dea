//! Stand-in for stages with no registered implementation.

use crate::processing::stage::{ProcessingStage, StageArgs, StageContext, StageError};
use async_trait::async_trait;
use insight_domain::{StageName, StageOutput};
use tracing::warn;

/// Answers every method with an "unavailable" marker instead of failing
pub struct FallbackStage {
    stage: StageName,
}

impl FallbackStage {
    pub fn new(stage: StageName) -> Self {
        Self { stage }
    }
}

#[async_trait]
impl ProcessingStage for FallbackStage {
    fn name(&self) -> StageName {
        self.stage.clone()
    }

    fn methods(&self) -> &'static [&'static str] {
        &[]
    }

    async fn invoke(
        &self,
        method: &str,
        args: StageArgs,
        ctx: &StageContext,
    ) -> Result<StageOutput, StageError> {
        warn!(
            run_id = %ctx.run_id,
            stage = %self.stage,
            method,
            "Stage not registered, using fallback"
        );
        Ok(StageOutput::unavailable(&self.stage, args.input))
    }
}
