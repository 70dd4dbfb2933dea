//! Orchestration domain: phases and the analysis result.

pub mod entities;
pub mod value_objects;

pub use entities::OrchestrationPhase;
pub use value_objects::{AnalysisResult, CandidateSummary, DisagreementReport, combined_confidence};
