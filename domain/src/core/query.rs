//! Query value object

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request-scoped context attached to a [`Query`].
///
/// Carries the caller identity, the session, and any prior-turn metadata the
/// surrounding application wants agents to see.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Free-form metadata (prior turns, locale, tenant, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Build a context from `key=value` pairs.
    ///
    /// `user_id` and `session_id` are lifted into their dedicated fields;
    /// everything else lands in `metadata` as a string.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut context = Self::default();
        for (key, value) in pairs {
            match key {
                "user_id" | "user" => context.user_id = Some(value.to_string()),
                "session_id" | "session" => context.session_id = Some(value.to_string()),
                other => {
                    context
                        .metadata
                        .insert(other.to_string(), serde_json::Value::String(value.to_string()));
                }
            }
        }
        context
    }
}

/// A natural-language business question (Value Object)
///
/// Created once per request and never mutated. Empty text is allowed: it
/// simply matches no specialist and is answered by the basic agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    text: String,
    #[serde(default)]
    context: QueryContext,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: QueryContext::default(),
        }
    }

    pub fn with_context(text: impl Into<String>, context: QueryContext) -> Self {
        Self {
            text: text.into(),
            context,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    /// Lower-cased text used for keyword matching
    pub fn normalized(&self) -> String {
        self.text.to_lowercase()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Query::new(s)
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Query::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_creation() {
        let q = Query::new("How many orders shipped last week?");
        assert_eq!(q.text(), "How many orders shipped last week?");
        assert!(q.context().user_id.is_none());
        assert!(!q.is_blank());
    }

    #[test]
    fn test_blank_query_is_allowed() {
        assert!(Query::new("   ").is_blank());
    }

    #[test]
    fn test_context_from_pairs() {
        let context =
            QueryContext::from_pairs([("user_id", "u-7"), ("session", "s-1"), ("locale", "en")]);
        assert_eq!(context.user_id.as_deref(), Some("u-7"));
        assert_eq!(context.session_id.as_deref(), Some("s-1"));
        assert_eq!(context.metadata["locale"], "en");
    }

    #[test]
    fn test_normalized_lowercases() {
        let q: Query = "Revenue THIS Month".into();
        assert_eq!(q.normalized(), "revenue this month");
    }
}
