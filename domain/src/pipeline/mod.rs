//! Pipeline model: stages, steps, named pipelines and runs.

pub mod catalog;
pub mod run;
pub mod stage;
pub mod step;

pub use catalog::PipelineCatalog;
pub use run::{PipelineRun, RunId, RunStatus, RunTransitionError, StepResult};
pub use stage::{StageName, StageOutput, UNAVAILABLE_KEY};
pub use step::{Pipeline, PipelineStep};
