//! Processor registry: stage name → stage implementation.

use super::stage::ProcessingStage;
use super::stages::{
    ContextLoadingStage, FallbackStage, IntelligenceScoringStage, QueryParsingStage,
    ResponseGenerationStage,
};
use crate::config::OrchestrationParams;
use crate::ports::data_provider::DataProvider;
use crate::ports::text_generator::TextGenerator;
use insight_domain::StageName;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only after wiring; resolution never fails.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    stages: HashMap<StageName, Arc<dyn ProcessingStage>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the four built-in stages
    pub fn with_defaults(
        provider: Arc<dyn DataProvider>,
        generator: Arc<dyn TextGenerator>,
        params: &OrchestrationParams,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(QueryParsingStage));
        registry.register(Arc::new(ContextLoadingStage::new(provider)));
        registry.register(Arc::new(ResponseGenerationStage::new(generator, params)));
        registry.register(Arc::new(IntelligenceScoringStage));
        registry
    }

    /// Register a stage under its own name, replacing any previous one
    pub fn register(&mut self, stage: Arc<dyn ProcessingStage>) {
        self.stages.insert(stage.name(), stage);
    }

    pub fn without(mut self, name: &StageName) -> Self {
        self.stages.remove(name);
        self
    }

    pub fn contains(&self, name: &StageName) -> bool {
        self.stages.contains_key(name)
    }

    /// Stage for `name`, or a [`FallbackStage`] when none is registered
    pub fn resolve(&self, name: &StageName) -> Arc<dyn ProcessingStage> {
        match self.stages.get(name) {
            Some(stage) => Arc::clone(stage),
            None => Arc::new(FallbackStage::new(name.clone())),
        }
    }

    pub fn names(&self) -> Vec<StageName> {
        let mut names: Vec<StageName> = self.stages.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("stages", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_registered_and_missing() {
        let mut registry = ProcessorRegistry::new();
        registry.register(Arc::new(QueryParsingStage));

        assert!(registry.contains(&StageName::QueryParsing));
        assert_eq!(registry.resolve(&StageName::QueryParsing).methods(), &["parse"]);

        let fallback = registry.resolve(&StageName::Custom("sentiment".to_string()));
        assert_eq!(fallback.name().as_str(), "sentiment");
        assert!(fallback.methods().is_empty());
    }

    #[test]
    fn test_without_removes_stage() {
        let mut registry = ProcessorRegistry::new();
        registry.register(Arc::new(QueryParsingStage));
        registry.register(Arc::new(IntelligenceScoringStage));
        let registry = registry.without(&StageName::IntelligenceScoring);
        assert_eq!(registry.names(), vec![StageName::QueryParsing]);
    }
}
