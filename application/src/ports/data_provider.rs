//! Data provider port
//!
//! The orchestrator never queries storage itself. It hands the filters
//! extracted from the question to a data provider and receives already-shaped
//! domain data (counts, aggregates, records) back.

use async_trait::async_trait;
use insight_domain::{DomainTag, QueryFilters};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while fetching domain data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataProviderError {
    #[error("No data source for domain '{0}'")]
    UnknownDomain(String),

    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid filters: {0}")]
    InvalidFilters(String),
}

/// Source of structured business data
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn fetch(
        &self,
        domain: &DomainTag,
        filters: &QueryFilters,
    ) -> Result<Value, DataProviderError>;
}

/// Provider with no data at all: every domain is unknown
pub struct NoDataProvider;

#[async_trait]
impl DataProvider for NoDataProvider {
    async fn fetch(
        &self,
        domain: &DomainTag,
        _filters: &QueryFilters,
    ) -> Result<Value, DataProviderError> {
        Err(DataProviderError::UnknownDomain(domain.to_string()))
    }
}
