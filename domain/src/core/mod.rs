//! Core domain concepts shared across all subdomains.
//!
//! - [`query::Query`] : the immutable business question and its context
//! - [`error::OrchestrationError`] : the orchestration error taxonomy
//! - [`filters::QueryFilters`] : criteria extracted from the question text
//! - [`score`] : helpers for values that live in `[0, 1]`

pub mod error;
pub mod filters;
pub mod query;
pub mod score;
pub mod string;
