//! In-memory data provider

use super::filter;
use async_trait::async_trait;
use insight_application::{DataProvider, DataProviderError};
use insight_domain::{DomainTag, QueryFilters};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Serves fixed payloads per domain, filtered by the query filters
#[derive(Debug, Clone, Default)]
pub struct StaticDataProvider {
    payloads: HashMap<DomainTag, Value>,
}

impl StaticDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: DomainTag, payload: Value) -> Self {
        self.insert(tag, payload);
        self
    }

    pub fn insert(&mut self, tag: DomainTag, payload: Value) {
        self.payloads.insert(tag, payload);
    }

    pub fn domains(&self) -> Vec<&DomainTag> {
        let mut tags: Vec<&DomainTag> = self.payloads.keys().collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

#[async_trait]
impl DataProvider for StaticDataProvider {
    async fn fetch(
        &self,
        domain: &DomainTag,
        filters: &QueryFilters,
    ) -> Result<Value, DataProviderError> {
        let payload = self
            .payloads
            .get(domain)
            .ok_or_else(|| DataProviderError::UnknownDomain(domain.to_string()))?;
        debug!(domain = %domain, "serving static payload");
        Ok(filter::apply(payload, filters))
    }
}
