//! Post-processing of loaded data: derived metrics and context scoring.

pub mod context_score;
pub mod enricher;

pub use context_score::{IntelligenceScore, ResponseAssessment, assess_response, score_context};
pub use enricher::{
    Comparison, DERIVED_KEY, EnrichmentReport, Enricher, Trend, TrendDirection, find_number,
};
