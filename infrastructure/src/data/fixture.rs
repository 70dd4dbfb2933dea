//! Data provider backed by a JSON fixture file.
//!
//! The file maps domain tags to payloads:
//!
//! ```json
//! {
//!   "orders": { "total_orders": 120, "orders": [ { "id": "ORD-1", "status": "pending" } ] },
//!   "finance": { "revenue": 10500 }
//! }
//! ```

use super::StaticDataProvider;
use async_trait::async_trait;
use insight_application::{DataProvider, DataProviderError};
use insight_domain::{DomainTag, QueryFilters};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("cannot read fixture {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid fixture {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid fixture {0}: top level must be an object keyed by domain")]
    NotAnObject(PathBuf),
}

/// Fixture file loaded once into memory
#[derive(Debug, Clone)]
pub struct FixtureDataProvider {
    inner: StaticDataProvider,
    path: PathBuf,
}

impl FixtureDataProvider {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path).map_err(|source| FixtureError::Read {
            path: path.clone(),
            source,
        })?;
        let document: Value = serde_json::from_str(&text).map_err(|source| FixtureError::Parse {
            path: path.clone(),
            source,
        })?;
        let Value::Object(domains) = document else {
            return Err(FixtureError::NotAnObject(path));
        };

        let mut inner = StaticDataProvider::new();
        for (name, payload) in domains {
            // `FromStr` for DomainTag is infallible; unknown names become custom tags
            if let Ok(tag) = name.parse::<DomainTag>() {
                inner.insert(tag, payload);
            }
        }
        info!(path = %path.display(), domains = inner.len(), "loaded data fixture");

        Ok(Self { inner, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn domains(&self) -> Vec<&DomainTag> {
        self.inner.domains()
    }
}

#[async_trait]
impl DataProvider for FixtureDataProvider {
    async fn fetch(
        &self,
        domain: &DomainTag,
        filters: &QueryFilters,
    ) -> Result<Value, DataProviderError> {
        self.inner.fetch(domain, filters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_load_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("business.json");
        fs::write(
            &path,
            r#"{
                "orders": {"total_orders": 120},
                "Finance": {"revenue": 10500},
                "returns": {"count": 3}
            }"#,
        )
        .unwrap();

        let provider = FixtureDataProvider::load(&path).unwrap();
        assert_eq!(provider.domains().len(), 3);

        let orders = provider
            .fetch(&DomainTag::Orders, &QueryFilters::default())
            .await
            .unwrap();
        assert_eq!(orders["total_orders"], 120);

        let finance = provider
            .fetch(&DomainTag::Finance, &QueryFilters::default())
            .await
            .unwrap();
        assert_eq!(finance["revenue"], 10500);

        assert!(
            provider
                .fetch(&DomainTag::Shipments, &QueryFilters::default())
                .await
                .is_err()
        );
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = FixtureDataProvider::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(FixtureError::Read { .. })));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            FixtureDataProvider::load(&broken),
            Err(FixtureError::Parse { .. })
        ));

        let list = dir.path().join("list.json");
        fs::write(&list, "[1, 2]").unwrap();
        assert!(matches!(
            FixtureDataProvider::load(&list),
            Err(FixtureError::NotAnObject(_))
        ));
    }
}
