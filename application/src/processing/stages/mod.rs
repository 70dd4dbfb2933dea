//! Built-in processing stages

pub mod context_loading;
pub mod fallback;
pub mod intelligence_scoring;
pub mod query_parsing;
pub mod response_generation;

pub use context_loading::ContextLoadingStage;
pub use fallback::FallbackStage;
pub use intelligence_scoring::IntelligenceScoringStage;
pub use query_parsing::QueryParsingStage;
pub use response_generation::ResponseGenerationStage;

#[cfg(test)]
pub(crate) fn test_context() -> crate::processing::stage::StageContext {
    crate::processing::stage::StageContext {
        run_id: insight_domain::RunId::from("test-run"),
        step_index: 0,
        deadline: None,
        cancellation: tokio_util::sync::CancellationToken::new(),
        today: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    }
}
