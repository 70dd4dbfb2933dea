//! Processing stage names and stage output

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Name of a processing stage registered in the processor registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageName {
    ContextLoading,
    QueryParsing,
    ResponseGeneration,
    IntelligenceScoring,
    Custom(String),
}

impl StageName {
    pub fn as_str(&self) -> &str {
        match self {
            StageName::ContextLoading => "context_loading",
            StageName::QueryParsing => "query_parsing",
            StageName::ResponseGeneration => "response_generation",
            StageName::IntelligenceScoring => "intelligence_scoring",
            StageName::Custom(s) => s,
        }
    }

    pub fn builtin() -> Vec<StageName> {
        vec![
            StageName::ContextLoading,
            StageName::QueryParsing,
            StageName::ResponseGeneration,
            StageName::IntelligenceScoring,
        ]
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StageName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.replace('-', "_").as_str() {
            "context_loading" | "context" => StageName::ContextLoading,
            "query_parsing" | "parser" => StageName::QueryParsing,
            "response_generation" | "generation" => StageName::ResponseGeneration,
            "intelligence_scoring" | "scoring" => StageName::IntelligenceScoring,
            other => StageName::Custom(other.to_string()),
        })
    }
}

impl Serialize for StageName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StageName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or(StageName::Custom(s)))
    }
}

/// Key under which the fallback stage records unavailable stages
pub const UNAVAILABLE_KEY: &str = "unavailable";

/// Value returned by a stage invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    pub value: Value,
    /// Short-circuit the remaining steps of the chain
    #[serde(default)]
    pub stop_chain: bool,
    /// Produced by the fallback stage instead of a real implementation
    #[serde(default)]
    pub fallback: bool,
}

impl StageOutput {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            stop_chain: false,
            fallback: false,
        }
    }

    pub fn stop(value: Value) -> Self {
        Self {
            value,
            stop_chain: true,
            fallback: false,
        }
    }

    /// Structured "unavailable" marker for a missing stage.
    ///
    /// The input is threaded through unchanged when it is an object, with the
    /// stage name appended to its `unavailable` list.
    pub fn unavailable(stage: &StageName, input: Value) -> Self {
        let value = match input {
            Value::Object(mut map) => {
                let entry = map
                    .entry(UNAVAILABLE_KEY.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(list) = entry {
                    list.push(Value::String(stage.to_string()));
                }
                Value::Object(map)
            }
            other => serde_json::json!({
                "input": other,
                UNAVAILABLE_KEY: [stage.to_string()],
            }),
        };
        Self {
            value,
            stop_chain: false,
            fallback: true,
        }
    }
}
