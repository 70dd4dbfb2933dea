//! Domain layer for insight-quorum
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns, and no
//! I/O: everything here is a pure function over its inputs.
//!
//! # Core Concepts
//!
//! ## Specialists
//!
//! Each business area (orders, shipments, finance, ...) is described by a
//! [`DomainKnowledge`]: a weighted keyword table used to score the relevance
//! of a query, static facts, key metrics and a prompt template.
//!
//! ## Pipelines
//!
//! A [`Pipeline`] is a named sequence of [`PipelineStep`]s. Executing one
//! produces a [`PipelineRun`] whose status only moves forward.
//!
//! ## Cross-validation
//!
//! The [`Critic`] checks the candidate answers of all specialists against
//! each other and produces a [`ValidationResult`].

pub mod agent;
pub mod config;
pub mod core;
pub mod enrichment;
pub mod orchestration;
pub mod pipeline;
pub mod prompt;
pub mod validation;

// Re-export commonly used types
pub use agent::{
    AgentResponse, DomainKnowledge, DomainTag, KeywordTable, RelevanceScore, WeightedKeyword,
    builtin_catalog, builtin_knowledge,
};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{
    error::OrchestrationError,
    filters::{DateRange, QueryFilters, QueryIntent},
    query::{Query, QueryContext},
};
pub use enrichment::{EnrichmentReport, Enricher, IntelligenceScore, ResponseAssessment};
pub use orchestration::{AnalysisResult, DisagreementReport, OrchestrationPhase};
pub use pipeline::{
    Pipeline, PipelineCatalog, PipelineRun, PipelineStep, RunId, RunStatus, RunTransitionError,
    StageName, StageOutput, StepResult,
};
pub use prompt::PromptTemplate;
pub use validation::{
    APPROVAL_THRESHOLD, Critic, CriticConfig, Inconsistency, ValidationCategory, ValidationResult,
};
