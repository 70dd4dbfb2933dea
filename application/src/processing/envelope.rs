//! Keys of the structured payload threaded through a pipeline.
//!
//! A chain starts from an object built by the integration manager and every
//! built-in stage returns that object with its own fields added, so later
//! steps can pick what they need through the argument adapters.

use serde_json::{Map, Value};

pub const QUERY: &str = "query";
pub const DOMAIN: &str = "domain";
pub const KNOWLEDGE: &str = "knowledge";
pub const RELEVANCE: &str = "relevance";
pub const MATCHED_KEYWORDS: &str = "matched_keywords";
pub const FILTERS: &str = "filters";
pub const DATA: &str = "data";
pub const INTELLIGENCE: &str = "intelligence";
pub const RESPONSE: &str = "response";
pub const CONFIDENCE_HINT: &str = "confidence_hint";
pub const REASONING: &str = "reasoning";
pub const ASSESSMENT: &str = "assessment";
pub const STOPPED: &str = "stopped";

/// Copy of `input` with `fields` inserted.
///
/// A non-object input is kept under `input`.
pub fn extend(input: &Value, fields: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    let mut map = match input {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("input".to_string(), other.clone());
            map
        }
    };
    for (key, value) in fields {
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}

/// Non-null field of an object payload
pub fn field<'a>(input: &'a Value, key: &str) -> Option<&'a Value> {
    input.get(key).filter(|v| !v.is_null())
}

pub fn str_field<'a>(input: &'a Value, key: &str) -> Option<&'a str> {
    input.get(key).and_then(Value::as_str)
}
