//! Declarative pipeline steps and named pipelines

use super::stage::StageName;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One stage invocation: `{stage_name, method_name, params}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStep {
    pub stage: StageName,
    pub method: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl PipelineStep {
    pub fn new(stage: StageName, method: impl Into<String>) -> Self {
        Self {
            stage,
            method: method.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// `stage.method` label for logs
    pub fn label(&self) -> String {
        format!("{}.{}", self.stage, self.method)
    }
}

/// A named, reusable sequence of steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<PipelineStep>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, steps: Vec<PipelineStep>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            steps,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Distinct stages referenced by this pipeline
    pub fn stages(&self) -> Vec<&StageName> {
        let mut stages: Vec<&StageName> = Vec::new();
        for step in &self.steps {
            if !stages.contains(&&step.stage) {
                stages.push(&step.stage);
            }
        }
        stages
    }
}
