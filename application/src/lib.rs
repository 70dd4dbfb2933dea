//! Application layer for insight-quorum
//!
//! This crate contains use cases, the processing pipeline, port definitions
//! and application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod processing;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{InsightConfig, OrchestrationParams};
pub use ports::{
    data_provider::{DataProvider, DataProviderError, NoDataProvider},
    event_logger::{EventLogger, NoEventLogger, OrchestrationEvent},
    progress::{NoProgress, ProgressNotifier},
    text_generator::{CompletionOptions, GenerationError, TextGenerator},
};
pub use processing::{
    ChainOptions, ProcessingStage, ProcessorCoordinator, ProcessorRegistry, StageError,
};
pub use use_cases::analyze::{AnalyzeInput, AnalyzeUseCase};
pub use use_cases::dispatch::{AgentRegistry, Dispatcher};
pub use use_cases::integration::{EnrichedContext, IntegrationManager, IntegrationPayload};
pub use use_cases::specialist::{BasicAgent, DomainSpecialist, InvocationContext, SpecialistAgent};
