//! `context_loading` stage: fetches domain data through the data provider.

use super::query_parsing::filters_from;
use crate::ports::data_provider::DataProvider;
use crate::processing::envelope;
use crate::processing::stage::{ProcessingStage, StageArgs, StageContext, StageError};
use async_trait::async_trait;
use insight_domain::{DomainTag, StageName, StageOutput};
use std::sync::Arc;
use tracing::debug;

pub struct ContextLoadingStage {
    provider: Arc<dyn DataProvider>,
}

impl ContextLoadingStage {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self { provider }
    }

    async fn load(&self, args: &StageArgs, ctx: &StageContext) -> Result<StageOutput, StageError> {
        let domain: DomainTag = args
            .arg(envelope::DOMAIN)
            .and_then(|v| v.as_str())
            .ok_or_else(|| StageError::InvalidInput("domain must be a string".to_string()))?
            .parse()
            .map_err(|_| StageError::InvalidInput("unparsable domain".to_string()))?;
        let filters = filters_from(args.arg(envelope::FILTERS));

        let fetch = self.provider.fetch(&domain, &filters);
        let data = match ctx.remaining() {
            Some(remaining) => tokio::time::timeout(remaining, fetch)
                .await
                .map_err(|_| StageError::Timeout)??,
            None => fetch.await?,
        };

        debug!(run_id = %ctx.run_id, domain = %domain, "Loaded domain data");
        Ok(StageOutput::new(envelope::extend(
            &args.input,
            [(envelope::DATA, data)],
        )))
    }
}

#[async_trait]
impl ProcessingStage for ContextLoadingStage {
    fn name(&self) -> StageName {
        StageName::ContextLoading
    }

    fn methods(&self) -> &'static [&'static str] {
        &["load"]
    }

    async fn invoke(
        &self,
        method: &str,
        args: StageArgs,
        ctx: &StageContext,
    ) -> Result<StageOutput, StageError> {
        match method {
            "load" => self.load(&args, ctx).await,
            other => Err(self.unknown_method(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::data_provider::{DataProviderError, NoDataProvider};
    use crate::processing::stages::test_context;
    use insight_domain::QueryFilters;
    use serde_json::{Map, Value, json};
    use std::time::Duration;

    struct OrdersOnly;

    #[async_trait]
    impl DataProvider for OrdersOnly {
        async fn fetch(
            &self,
            domain: &DomainTag,
            filters: &QueryFilters,
        ) -> Result<Value, DataProviderError> {
            match domain {
                DomainTag::Orders => Ok(json!({"order_count": 42, "statuses": filters.statuses})),
                other => Err(DataProviderError::UnknownDomain(other.to_string())),
            }
        }
    }

    struct Slow;

    #[async_trait]
    impl DataProvider for Slow {
        async fn fetch(
            &self,
            _domain: &DomainTag,
            _filters: &QueryFilters,
        ) -> Result<Value, DataProviderError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Value::Null)
        }
    }

    fn args(domain: &str) -> StageArgs {
        let input = json!({"query": "q", "domain": domain, "filters": {"statuses": ["pending"], "intent": "count", "terms": []}});
        let mut named = Map::new();
        named.insert("domain".to_string(), json!(domain));
        named.insert("filters".to_string(), input["filters"].clone());
        StageArgs::new(input).with_named(named)
    }

    #[tokio::test]
    async fn test_load_attaches_data() {
        let stage = ContextLoadingStage::new(Arc::new(OrdersOnly));
        let out = stage.invoke("load", args("orders"), &test_context()).await.unwrap();
        assert_eq!(out.value["data"]["order_count"], 42);
        assert_eq!(out.value["data"]["statuses"], json!(["pending"]));
        assert_eq!(out.value["query"], "q");
    }

    #[tokio::test]
    async fn test_provider_error_is_reported() {
        let stage = ContextLoadingStage::new(Arc::new(NoDataProvider));
        let err = stage
            .invoke("load", args("finance"), &test_context())
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Data(DataProviderError::UnknownDomain(_))));
    }

    #[tokio::test]
    async fn test_load_respects_deadline() {
        let stage = ContextLoadingStage::new(Arc::new(Slow));
        let mut ctx = test_context();
        ctx.deadline = Some(tokio::time::Instant::now() + Duration::from_millis(20));
        let err = stage.invoke("load", args("orders"), &ctx).await.unwrap_err();
        assert!(matches!(err, StageError::Timeout));
    }
}
