//! Application-level configuration.
//!
//! - [`OrchestrationParams`]: deadlines, concurrency, thresholds
//! - [`InsightConfig`]: container handed to the use cases at wiring time

pub mod insight_config;
pub mod orchestration_params;

pub use insight_config::InsightConfig;
pub use orchestration_params::OrchestrationParams;
