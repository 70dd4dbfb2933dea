//! Named, pre-registered pipelines

use super::stage::StageName;
use super::step::{Pipeline, PipelineStep};
use serde_json::json;
use std::collections::BTreeMap;

pub const STANDARD: &str = "standard";
pub const SEMANTIC: &str = "semantic";
pub const ADVANCED: &str = "advanced";

/// Registry of named pipeline templates.
///
/// Read-only after construction; `register` replaces a template with the same
/// name so configuration can override the built-ins.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineCatalog {
    pipelines: BTreeMap<String, Pipeline>,
}

impl PipelineCatalog {
    pub fn empty() -> Self {
        Self {
            pipelines: BTreeMap::new(),
        }
    }

    /// Catalog with the `standard`, `semantic` and `advanced` pipelines
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.register(standard());
        catalog.register(semantic());
        catalog.register(advanced());
        catalog
    }

    pub fn register(&mut self, pipeline: Pipeline) -> Option<Pipeline> {
        self.pipelines.insert(pipeline.name.clone(), pipeline)
    }

    pub fn get(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pipelines.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.pipelines.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pipeline> {
        self.pipelines.values()
    }
}

impl Default for PipelineCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn parse() -> PipelineStep {
    PipelineStep::new(StageName::QueryParsing, "parse")
}

fn load() -> PipelineStep {
    PipelineStep::new(StageName::ContextLoading, "load")
}

fn generate() -> PipelineStep {
    PipelineStep::new(StageName::ResponseGeneration, "generate")
}

fn standard() -> Pipeline {
    Pipeline::new(STANDARD, vec![parse(), load(), generate()])
        .with_description("Parse the query, load domain data, generate an answer")
}

fn semantic() -> Pipeline {
    Pipeline::new(
        SEMANTIC,
        vec![
            parse().with_param("semantic", json!(true)),
            load(),
            PipelineStep::new(StageName::IntelligenceScoring, "score"),
            generate(),
        ],
    )
    .with_description("Standard pipeline with keyword expansion and context scoring")
}

fn advanced() -> Pipeline {
    Pipeline::new(
        ADVANCED,
        vec![
            parse().with_param("semantic", json!(true)),
            load(),
            PipelineStep::new(StageName::IntelligenceScoring, "score"),
            generate().with_param("style", json!("detailed")),
            PipelineStep::new(StageName::IntelligenceScoring, "assess_response"),
        ],
    )
    .with_description("Semantic pipeline with a detailed answer and a response assessment")
}
