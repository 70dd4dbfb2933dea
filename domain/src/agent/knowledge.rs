//! Domain knowledge and keyword-based relevance scoring.
//!
//! Each specialist owns a [`KeywordTable`]: a list of `{keyword: weight}`
//! entries plus a normalization constant. The relevance of a query is
//!
//! ```text
//! min(Σ weights of matched keywords / normalization, 1.0)
//! ```
//!
//! Keywords may be phrases ("on time"). Matching is case-insensitive and
//! respects word boundaries, with a plural tolerance of a trailing `s`/`es`.
//! Weights and normalization constants are tunable configuration; the
//! built-in values in [`catalog`](super::catalog) are only defaults.

use super::domain_tag::DomainTag;
use crate::core::score::clamp_unit;
use serde::{Deserialize, Serialize};

/// A single weighted keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedKeyword {
    pub keyword: String,
    pub weight: f64,
}

/// Weighted keyword table for one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTable {
    entries: Vec<WeightedKeyword>,
    normalization: f64,
}

/// Result of scoring a query against a [`KeywordTable`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceScore {
    /// Clamped score in `[0, 1]`
    pub score: f64,
    /// Keywords that matched, in table order
    pub matched: Vec<String>,
}

impl RelevanceScore {
    pub fn zero() -> Self {
        Self {
            score: 0.0,
            matched: Vec::new(),
        }
    }

    pub fn exceeds(&self, threshold: f64) -> bool {
        self.score > threshold
    }
}

impl KeywordTable {
    /// Build a table from `(keyword, weight)` pairs.
    ///
    /// A non-positive normalization is replaced by 1.0 so scores stay finite.
    pub fn new<K: Into<String>>(
        entries: impl IntoIterator<Item = (K, f64)>,
        normalization: f64,
    ) -> Self {
        let entries = entries
            .into_iter()
            .map(|(keyword, weight)| WeightedKeyword {
                keyword: normalize_text(&keyword.into()),
                weight: weight.max(0.0),
            })
            .filter(|e| !e.keyword.is_empty())
            .collect();
        Self {
            entries,
            normalization: if normalization > 0.0 {
                normalization
            } else {
                1.0
            },
        }
    }

    pub fn entries(&self) -> &[WeightedKeyword] {
        &self.entries
    }

    pub fn normalization(&self) -> f64 {
        self.normalization
    }

    pub fn keywords(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.keyword.as_str()).collect()
    }

    /// Insert or replace the weight of a keyword
    pub fn set_weight(&mut self, keyword: &str, weight: f64) {
        let keyword = normalize_text(keyword);
        if keyword.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|e| e.keyword == keyword) {
            Some(entry) => entry.weight = weight.max(0.0),
            None => self.entries.push(WeightedKeyword {
                keyword,
                weight: weight.max(0.0),
            }),
        }
    }

    pub fn set_normalization(&mut self, normalization: f64) {
        if normalization > 0.0 {
            self.normalization = normalization;
        }
    }

    /// Score a piece of text
    pub fn score(&self, text: &str) -> RelevanceScore {
        let padded = format!(" {} ", normalize_text(text));
        let mut total = 0.0;
        let mut matched = Vec::new();

        for entry in &self.entries {
            if contains_term(&padded, &entry.keyword) {
                total += entry.weight;
                matched.push(entry.keyword.clone());
            }
        }

        RelevanceScore {
            score: clamp_unit(total / self.normalization),
            matched,
        }
    }

    /// Count how many distinct keywords occur in `text`
    pub fn coverage(&self, text: &str) -> usize {
        let padded = format!(" {} ", normalize_text(text));
        self.entries
            .iter()
            .filter(|e| contains_term(&padded, &e.keyword))
            .count()
    }
}

/// Lowercase, replace punctuation with spaces, collapse whitespace
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_term(padded: &str, term: &str) -> bool {
    padded.contains(&format!(" {} ", term))
        || padded.contains(&format!(" {}s ", term))
        || padded.contains(&format!(" {}es ", term))
}

/// Everything a specialist knows about its business area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainKnowledge {
    pub tag: DomainTag,
    pub display_name: String,
    pub description: String,
    pub keywords: KeywordTable,
    /// Prompt template with `{domain}`, `{query}`, `{facts}`, `{data}` placeholders
    pub prompt_template: String,
    /// Static facts used for local (no text generation) analysis
    pub facts: Vec<String>,
    /// Metrics this domain usually reports
    pub key_metrics: Vec<String>,
}

impl DomainKnowledge {
    pub fn new(tag: DomainTag, display_name: impl Into<String>, keywords: KeywordTable) -> Self {
        Self {
            tag,
            display_name: display_name.into(),
            description: String::new(),
            keywords,
            prompt_template: crate::prompt::PromptTemplate::default_agent_template().to_string(),
            facts: Vec::new(),
            key_metrics: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    pub fn with_facts<S: Into<String>>(mut self, facts: impl IntoIterator<Item = S>) -> Self {
        self.facts = facts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_key_metrics<S: Into<String>>(
        mut self,
        metrics: impl IntoIterator<Item = S>,
    ) -> Self {
        self.key_metrics = metrics.into_iter().map(Into::into).collect();
        self
    }

    /// Relevance of a query text for this domain
    pub fn relevance(&self, text: &str) -> RelevanceScore {
        self.keywords.score(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> KeywordTable {
        KeywordTable::new(
            [("shipment", 3.0), ("tracking", 2.0), ("on time", 1.0)],
            5.0,
        )
    }

    #[test]
    fn test_score_sums_matched_weights() {
        let score = table().score("Where is the tracking for my shipment?");
        assert!((score.score - 1.0).abs() < 1e-9);
        assert_eq!(score.matched, vec!["shipment", "tracking"]);
    }

    #[test]
    fn test_score_is_capped_at_one() {
        let score = table().score("shipment tracking on time shipment");
        assert_eq!(score.score, 1.0);
    }

    #[test]
    fn test_partial_match_is_normalized() {
        let score = table().score("Were deliveries on-time?");
        assert!((score.score - 0.2).abs() < 1e-9);
        assert_eq!(score.matched, vec!["on time"]);
    }

    #[test]
    fn test_plural_tolerance() {
        assert_eq!(table().score("list shipments").matched, vec!["shipment"]);
    }

    #[test]
    fn test_word_boundaries() {
        // "transhipment" must not match "shipment"
        assert_eq!(table().score("transhipment costs").score, 0.0);
    }

    #[test]
    fn test_no_match_is_zero() {
        let score = table().score("What is the weather?");
        assert_eq!(score, RelevanceScore::zero());
        assert!(!score.exceeds(0.0));
    }

    #[test]
    fn test_set_weight_and_normalization() {
        let mut t = table();
        t.set_weight("carrier", 5.0);
        t.set_weight("tracking", 0.0);
        t.set_normalization(10.0);
        let score = t.score("carrier tracking");
        assert!((score.score - 0.5).abs() < 1e-9);
        t.set_normalization(-1.0);
        assert_eq!(t.normalization(), 10.0);
    }

    #[test]
    fn test_invalid_normalization_defaults_to_one() {
        let t = KeywordTable::new([("x", 0.5)], 0.0);
        assert_eq!(t.normalization(), 1.0);
    }

    #[test]
    fn test_coverage() {
        assert_eq!(table().coverage("shipment is on time"), 2);
    }
}
