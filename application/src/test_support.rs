//! Deterministic port implementations shared by the unit tests.

use crate::ports::data_provider::{DataProvider, DataProviderError};
use crate::ports::text_generator::{CompletionOptions, GenerationError, TextGenerator};
use async_trait::async_trait;
use chrono::NaiveDate;
use insight_domain::{DomainTag, QueryFilters};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Answers with a fixed text per domain, found by the domain's display name
/// in the prompt
pub struct ScriptedGenerator {
    answers: Vec<(String, String)>,
    default: String,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            answers: Vec::new(),
            default: default.into(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer `text` when the prompt mentions `marker`
    pub fn answer(mut self, marker: impl Into<String>, text: impl Into<String>) -> Self {
        self.answers.push((marker.into(), text.into()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let text = self
            .answers
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map(|(_, text)| text.clone())
            .unwrap_or_else(|| self.default.clone());
        Ok(text)
    }
}

pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable("backend down".to_string()))
    }
}

/// In-memory data per domain
#[derive(Default)]
pub struct MapProvider {
    data: HashMap<DomainTag, Value>,
}

impl MapProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: DomainTag, data: Value) -> Self {
        self.data.insert(tag, data);
        self
    }
}

#[async_trait]
impl DataProvider for MapProvider {
    async fn fetch(
        &self,
        domain: &DomainTag,
        _filters: &QueryFilters,
    ) -> Result<Value, DataProviderError> {
        self.data
            .get(domain)
            .cloned()
            .ok_or_else(|| DataProviderError::UnknownDomain(domain.to_string()))
    }
}
