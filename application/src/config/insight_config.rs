//! Configuration container for one orchestrator instance.
//!
//! [`InsightConfig`] groups everything the binary parsed from files and
//! flags: orchestration parameters, critic tuning, the specialist catalog
//! (with any keyword-weight overrides already applied) and the pipelines.

use crate::config::OrchestrationParams;
use insight_domain::{CriticConfig, DomainKnowledge, DomainTag, PipelineCatalog, builtin_catalog};

#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub orchestration: OrchestrationParams,
    pub critic: CriticConfig,
    /// Enabled specialists
    pub knowledge: Vec<DomainKnowledge>,
    pub pipelines: PipelineCatalog,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            orchestration: OrchestrationParams::default(),
            critic: CriticConfig::default(),
            knowledge: builtin_catalog(),
            pipelines: PipelineCatalog::builtin(),
        }
    }
}

impl InsightConfig {
    pub fn with_orchestration(mut self, params: OrchestrationParams) -> Self {
        self.orchestration = params;
        self
    }

    pub fn with_critic(mut self, critic: CriticConfig) -> Self {
        self.critic = critic;
        self
    }

    pub fn with_knowledge(mut self, knowledge: Vec<DomainKnowledge>) -> Self {
        self.knowledge = knowledge;
        self
    }

    pub fn with_pipelines(mut self, pipelines: PipelineCatalog) -> Self {
        self.pipelines = pipelines;
        self
    }

    pub fn knowledge_for(&self, tag: &DomainTag) -> Option<&DomainKnowledge> {
        self.knowledge.iter().find(|k| &k.tag == tag)
    }

    /// Whether the configured default pipeline exists
    pub fn has_default_pipeline(&self) -> bool {
        self.pipelines.contains(&self.orchestration.default_pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_consistent() {
        let config = InsightConfig::default();
        assert!(config.has_default_pipeline());
        assert!(config.knowledge_for(&DomainTag::Orders).is_some());
        assert!(config.knowledge_for(&DomainTag::General).is_none());
    }

    #[test]
    fn test_unknown_default_pipeline() {
        let config = InsightConfig::default().with_orchestration(
            OrchestrationParams::default().with_default_pipeline("missing"),
        );
        assert!(!config.has_default_pipeline());
    }
}
