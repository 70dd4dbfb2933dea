//! Argument adapters: which named arguments each stage method takes out of
//! the structured input.
//!
//! Methods not listed here receive the previous output as-is.

use super::envelope;
use super::stage::StageError;
use insight_domain::{PipelineStep, StageName};
use serde_json::{Map, Value};

/// One named argument of a stage method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub required: bool,
}

const fn required(name: &'static str) -> ArgSpec {
    ArgSpec {
        name,
        required: true,
    }
}

const fn optional(name: &'static str) -> ArgSpec {
    ArgSpec {
        name,
        required: false,
    }
}

const LOAD: &[ArgSpec] = &[required(envelope::DOMAIN), optional(envelope::FILTERS)];
const GENERATE: &[ArgSpec] = &[
    required(envelope::QUERY),
    optional(envelope::KNOWLEDGE),
    optional(envelope::DATA),
    optional(envelope::FILTERS),
    optional(envelope::INTELLIGENCE),
];
const SCORE: &[ArgSpec] = &[
    required(envelope::KNOWLEDGE),
    optional(envelope::DATA),
    optional(envelope::MATCHED_KEYWORDS),
];
const ASSESS_RESPONSE: &[ArgSpec] = &[required(envelope::RESPONSE), required(envelope::KNOWLEDGE)];

/// Named arguments of `stage.method`, `None` when it takes the whole input
pub fn arguments_of(stage: &StageName, method: &str) -> Option<&'static [ArgSpec]> {
    match (stage, method) {
        (StageName::ContextLoading, "load") => Some(LOAD),
        (StageName::ResponseGeneration, "generate") => Some(GENERATE),
        (StageName::IntelligenceScoring, "score") => Some(SCORE),
        (StageName::IntelligenceScoring, "assess_response") => Some(ASSESS_RESPONSE),
        _ => None,
    }
}

/// Extract the named arguments of a step from its input
pub fn adapt(step: &PipelineStep, input: &Value) -> Result<Map<String, Value>, StageError> {
    let Some(params) = arguments_of(&step.stage, &step.method) else {
        return Ok(Map::new());
    };

    let mut named = Map::new();
    for param in params {
        match envelope::field(input, param.name) {
            Some(value) => {
                named.insert(param.name.to_string(), value.clone());
            }
            None if param.required => {
                return Err(StageError::MissingArgument {
                    stage: step.stage.to_string(),
                    method: step.method.clone(),
                    argument: param.name,
                });
            }
            None => {}
        }
    }
    Ok(named)
}
