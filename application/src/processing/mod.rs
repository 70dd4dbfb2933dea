//! Processing pipeline: stages, their registry and the coordinator that
//! executes step chains.

pub mod adapters;
pub mod coordinator;
pub mod envelope;
pub mod registry;
pub mod stage;
pub mod stages;

pub use coordinator::{ChainOptions, ProcessorCoordinator};
pub use registry::ProcessorRegistry;
pub use stage::{ProcessingStage, StageArgs, StageContext, StageError};
