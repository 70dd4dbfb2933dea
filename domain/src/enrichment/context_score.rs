//! Intelligence scoring: how good is the loaded context, and how good is the
//! generated answer.

use crate::agent::knowledge::KeywordTable;
use crate::core::score::{clamp_unit, round2};
use crate::validation::extract::{ExtractedFigures, extract_dates};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const COMPLETENESS_WEIGHT: f64 = 0.35;
const VOLUME_WEIGHT: f64 = 0.25;
const COVERAGE_WEIGHT: f64 = 0.2;
const RECENCY_WEIGHT: f64 = 0.2;

/// Record count at which the volume component saturates
const VOLUME_SATURATION: f64 = 100.0;
/// Days after which data counts as stale
const STALE_AFTER_DAYS: f64 = 365.0;
const FRESH_WITHIN_DAYS: f64 = 7.0;

/// Quality of the context loaded for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceScore {
    /// Share of the domain's key metrics present in the data
    pub completeness: f64,
    /// Amount of data, log-scaled
    pub volume: f64,
    /// How well the query hits the domain vocabulary
    pub keyword_coverage: f64,
    /// Freshness of the newest date in the data (0.5 when undated)
    pub recency: f64,
    pub overall: f64,
}

impl IntelligenceScore {
    pub fn empty() -> Self {
        Self {
            completeness: 0.0,
            volume: 0.0,
            keyword_coverage: 0.0,
            recency: 0.0,
            overall: 0.0,
        }
    }
}

/// Score the loaded data for a domain
pub fn score_context(
    data: &Value,
    key_metrics: &[String],
    matched_keywords: usize,
    today: NaiveDate,
) -> IntelligenceScore {
    if data.is_null() {
        return IntelligenceScore::empty();
    }

    let completeness = if key_metrics.is_empty() {
        1.0
    } else {
        let present = key_metrics
            .iter()
            .filter(|m| contains_key(data, m))
            .count();
        present as f64 / key_metrics.len() as f64
    };

    let records = count_leaves(data) as f64;
    let volume = clamp_unit((1.0 + records).ln() / (1.0 + VOLUME_SATURATION).ln());

    let keyword_coverage = clamp_unit(matched_keywords as f64 / 3.0);

    let recency = match newest_date(data) {
        Some(date) => {
            let age = (today - date).num_days().max(0) as f64;
            if age <= FRESH_WITHIN_DAYS {
                1.0
            } else {
                clamp_unit(1.0 - (age - FRESH_WITHIN_DAYS) / (STALE_AFTER_DAYS - FRESH_WITHIN_DAYS))
            }
        }
        None => 0.5,
    };

    let overall = completeness * COMPLETENESS_WEIGHT
        + volume * VOLUME_WEIGHT
        + keyword_coverage * COVERAGE_WEIGHT
        + recency * RECENCY_WEIGHT;

    IntelligenceScore {
        completeness: round2(completeness),
        volume: round2(volume),
        keyword_coverage: round2(keyword_coverage),
        recency: round2(recency),
        overall: round2(clamp_unit(overall)),
    }
}

fn contains_key(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| k == key || contains_key(v, key)),
        Value::Array(items) => items.iter().any(|v| contains_key(v, key)),
        _ => false,
    }
}

/// Number of scalar leaves; an empty payload has none
fn count_leaves(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.values().map(count_leaves).sum(),
        Value::Array(items) => items.iter().map(count_leaves).sum(),
        Value::Null => 0,
        _ => 1,
    }
}

fn newest_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => extract_dates(s).into_iter().max(),
        Value::Object(map) => map.values().filter_map(newest_date).max(),
        Value::Array(items) => items.iter().filter_map(newest_date).max(),
        _ => None,
    }
}

/// Assessment of a generated answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseAssessment {
    /// Concrete figures and dates in the text
    pub specificity: f64,
    /// Share of domain vocabulary the answer uses
    pub coverage: f64,
    /// Penalises empty and rambling answers
    pub length: f64,
    pub overall: f64,
}

pub fn assess_response(text: &str, keywords: &KeywordTable) -> ResponseAssessment {
    let words = text.split_whitespace().count();
    if words == 0 {
        return ResponseAssessment {
            specificity: 0.0,
            coverage: 0.0,
            length: 0.0,
            overall: 0.0,
        };
    }

    let figures = ExtractedFigures::from_text(text);
    let mut specificity = 0.0;
    if !figures.currency.is_empty() || !figures.counts.is_empty() {
        specificity += 0.5;
    }
    if !figures.percentages.is_empty() {
        specificity += 0.25;
    }
    if !figures.dates.is_empty() {
        specificity += 0.25;
    }
    if specificity == 0.0 && text.chars().any(|c| c.is_ascii_digit()) {
        specificity = 0.25;
    }

    let coverage = clamp_unit(keywords.coverage(text) as f64 / 2.0);

    let length = match words {
        0..=3 => 0.4,
        4..=200 => 1.0,
        201..=400 => 0.7,
        _ => 0.4,
    };

    let overall = (specificity + coverage + length) / 3.0;
    ResponseAssessment {
        specificity: round2(specificity),
        coverage: round2(coverage),
        length,
        overall: round2(clamp_unit(overall)),
    }
}
